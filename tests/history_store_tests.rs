//! Behavioural tests for the in-memory history store.

use chathistory::{AppendOutcome, HistorySource, HistoryStore, MAX_HISTORY_PER_CHANNEL};

#[test]
fn test_capacity_bound_holds_at_default_limit() {
    let mut store = HistoryStore::new();
    for i in 0..=MAX_HISTORY_PER_CHANNEL {
        store.append("twitch:pajlada", &format!("message {i}"));
    }

    let messages = store.get_messages("twitch:pajlada");
    assert_eq!(messages.len(), MAX_HISTORY_PER_CHANNEL);
    assert_eq!(messages.first().map(String::as_str), Some("message 1"));
    assert_eq!(
        messages.last().cloned(),
        Some(format!("message {}", MAX_HISTORY_PER_CHANNEL))
    );
}

#[test]
fn test_duplicate_rules() {
    let mut store = HistoryStore::new();
    store.append("c", "gg");
    store.append("c", "gg");
    assert_eq!(store.get_messages("c"), vec!["gg"]);

    store.append("c", "wp");
    store.append("c", "gg");
    assert_eq!(store.get_messages("c"), vec!["gg", "wp", "gg"]);
}

#[test]
fn test_blank_input_leaves_store_unchanged() {
    let mut store = HistoryStore::new();
    store.append("c", "first");

    for (channel, message) in [("", "x"), ("   ", "x"), ("c", ""), ("c", "   ")] {
        assert_eq!(store.append(channel, message), AppendOutcome::Rejected);
    }
    assert_eq!(store.len("c"), 1);
    assert_eq!(store.total_messages(), 1);
}

#[test]
fn test_filter_keeps_newest_copy_in_chronological_position() {
    let mut store = HistoryStore::new();
    for message in ["hi", "bye", "hi"] {
        store.append("c", message);
    }
    assert_eq!(store.get_filtered("c", "hi"), vec!["hi"]);

    let mut store = HistoryStore::new();
    for message in ["!vote 1", "lol", "!vote 2", "LOL", "!vote 1", "brb"] {
        store.append("c", message);
    }
    assert_eq!(store.get_filtered("c", "!VOTE"), vec!["!vote 2", "!vote 1"]);
    assert_eq!(store.get_filtered("c", "lol"), vec!["lol", "LOL"]);
}

#[test]
fn test_empty_filter_equals_full_log() {
    let mut store = HistoryStore::new();
    for message in ["a", "b", "a", "a", "c"] {
        store.append("c", message);
    }
    assert_eq!(store.get_filtered("c", ""), store.get_messages("c"));
    assert_eq!(store.get_messages("c"), vec!["a", "b", "a", "c"]);
}

#[test]
fn test_channels_are_isolated() {
    let mut store = HistoryStore::new();
    store.append("twitch:a", "one");
    store.append("twitch:b", "one");
    store.append("twitch:b", "two");

    assert_eq!(store.get_messages("twitch:a"), vec!["one"]);
    assert_eq!(store.get_messages("twitch:b"), vec!["one", "two"]);
    assert_eq!(store.channels(), vec!["twitch:a", "twitch:b"]);
}
