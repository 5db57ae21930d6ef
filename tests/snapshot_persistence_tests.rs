//! Round trips through the codec and the durable writer.

use chathistory::{
    DurableWriter, HistoryError, HistoryStore, SnapshotDocument, decode, encode,
};
use std::collections::BTreeMap;
use std::fs;

fn populated_store() -> HistoryStore {
    let mut store = HistoryStore::with_capacity_limit(100);
    for i in 0..150 {
        store.append("twitch:forsen", &format!("line {i}"));
    }
    for message in ["hi", "bye", "hi", "ünïcödé ✓", "  spaced  "] {
        store.append("kick:xqc", message);
    }
    store
}

#[test]
fn test_round_trip_reproduces_every_log() {
    let store = populated_store();
    let bytes = encode(&store.to_document()).unwrap();

    let mut restored = HistoryStore::with_capacity_limit(100);
    restored.load(decode(&bytes).unwrap());

    assert_eq!(restored.channels(), store.channels());
    for channel in store.channels() {
        assert_eq!(restored.get_all(&channel), store.get_all(&channel));
    }
}

#[test]
fn test_round_trip_through_disk() {
    let temp = tempfile::tempdir().expect("temp dir");
    let writer = DurableWriter::new(temp.path().join("misc").join("chat-history.json"));
    let store = populated_store();

    writer.commit(&encode(&store.to_document()).unwrap()).unwrap();
    let bytes = writer.load().unwrap().expect("snapshot present");

    let document = decode(&bytes).unwrap();
    assert_eq!(document.channels["kick:xqc"].len(), 5);
    assert_eq!(document.channels["twitch:forsen"].len(), 100);
    assert_eq!(document.channels["twitch:forsen"][0], "line 50");
}

#[test]
fn test_load_applies_capacity_to_oversized_files() {
    let mut channels = BTreeMap::new();
    channels.insert(
        "c".to_string(),
        (0..20).map(|i| format!("m{i}")).collect::<Vec<_>>(),
    );
    let bytes = encode(&SnapshotDocument::new(channels)).unwrap();

    let mut store = HistoryStore::with_capacity_limit(5);
    store.load(decode(&bytes).unwrap());
    assert_eq!(store.get_all("c"), vec!["m15", "m16", "m17", "m18", "m19"]);
}

#[test]
fn test_hand_written_file_is_accepted() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = temp.path().join("chat-history.json");
    fs::write(
        &path,
        r#"{"version":1,"channels":{"twitch:pajlada":["first","second",""]}}"#,
    )
    .unwrap();

    let bytes = DurableWriter::new(&path).load().unwrap().unwrap();
    let document = decode(&bytes).unwrap();
    assert_eq!(document.channels["twitch:pajlada"], vec!["first", "second"]);
    assert_eq!(document.saved_at, None);
}

#[test]
fn test_future_version_is_rejected() {
    let bytes = br#"{"version":2,"channels":{"c":["x"]}}"#;
    assert!(matches!(
        decode(bytes),
        Err(HistoryError::UnsupportedVersion { found: 2, .. })
    ));
}
