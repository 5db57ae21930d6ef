use anyhow::{Context, Result, anyhow};
use chathistory::{
    AppendOutcome, DurableWriter, HistoryStore, MAX_HISTORY_PER_CHANNEL, SNAPSHOT_FORMAT_VERSION,
    SnapshotDocument, decode, encode,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "history-tool")]
#[command(about = "Inspect and edit chat history snapshot files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a snapshot and print a summary
    Check {
        #[arg(long)]
        file: PathBuf,
    },
    /// List channels and their entry counts
    Channels {
        #[arg(long)]
        file: PathBuf,
    },
    /// Print one channel's history, optionally filtered
    Show {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        channel: String,
        #[arg(long)]
        search: Option<String>,
    },
    /// Append a message and write the snapshot back
    Append {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        channel: String,
        #[arg(long)]
        message: String,
        #[arg(long, default_value_t = MAX_HISTORY_PER_CHANNEL)]
        max_per_channel: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check { file } => check(&file),
        Command::Channels { file } => channels(&file),
        Command::Show {
            file,
            channel,
            search,
        } => show(&file, &channel, search.as_deref().unwrap_or("")),
        Command::Append {
            file,
            channel,
            message,
            max_per_channel,
        } => append(&file, &channel, &message, max_per_channel),
    }
}

fn read_document(file: &Path) -> Result<Option<SnapshotDocument>> {
    let bytes = DurableWriter::new(file)
        .load()
        .with_context(|| format!("Failed to read snapshot '{}'", file.display()))?;
    match bytes {
        Some(bytes) => {
            let document = decode(&bytes)
                .with_context(|| format!("Rejected snapshot '{}'", file.display()))?;
            Ok(Some(document))
        }
        None => Ok(None),
    }
}

fn require_document(file: &Path) -> Result<SnapshotDocument> {
    read_document(file)?.ok_or_else(|| anyhow!("Snapshot '{}' does not exist", file.display()))
}

fn load_store(file: &Path, max_per_channel: usize) -> Result<HistoryStore> {
    let mut store = HistoryStore::with_capacity_limit(max_per_channel);
    if let Some(document) = read_document(file)? {
        store.load(document);
    }
    Ok(store)
}

fn check(file: &Path) -> Result<()> {
    let document = require_document(file)?;
    let saved_at = document
        .saved_at
        .map(|stamp| stamp.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());

    println!("Snapshot: {}", file.display());
    println!("  version:  {}", SNAPSHOT_FORMAT_VERSION);
    println!("  saved at: {}", saved_at);
    println!("  channels: {}", document.channel_count());
    println!("  messages: {}", document.message_count());

    let oversized: Vec<_> = document
        .channels
        .iter()
        .filter(|(_, entries)| entries.len() > MAX_HISTORY_PER_CHANNEL)
        .map(|(key, entries)| format!("{} ({})", key, entries.len()))
        .collect();
    if !oversized.is_empty() {
        println!(
            "  {} channel(s) exceed {} entries and will be trimmed on load: {}",
            oversized.len(),
            MAX_HISTORY_PER_CHANNEL,
            oversized.join(", ")
        );
    }
    Ok(())
}

fn channels(file: &Path) -> Result<()> {
    let store = load_store(file, MAX_HISTORY_PER_CHANNEL)?;
    for channel in store.channels() {
        println!("{}\t{}", store.len(&channel), channel);
    }
    Ok(())
}

fn show(file: &Path, channel: &str, search: &str) -> Result<()> {
    let store = load_store(file, MAX_HISTORY_PER_CHANNEL)?;
    for message in store.get_filtered(channel, search) {
        println!("{}", message);
    }
    Ok(())
}

fn append(file: &Path, channel: &str, message: &str, max_per_channel: usize) -> Result<()> {
    let mut store = load_store(file, max_per_channel)?;
    match store.append(channel, message) {
        AppendOutcome::Appended { evicted } => {
            let bytes = encode(&store.to_document())?;
            DurableWriter::new(file)
                .commit(&bytes)
                .with_context(|| format!("Failed to write snapshot '{}'", file.display()))?;
            println!(
                "Appended to '{}' ({}/{} entries, {} evicted)",
                channel,
                store.len(channel),
                store.capacity(),
                evicted
            );
            Ok(())
        }
        AppendOutcome::DuplicateSkipped => {
            println!("Message repeats the newest entry in '{}'; nothing written", channel);
            Ok(())
        }
        AppendOutcome::Rejected => Err(anyhow!("Channel and message must not be blank")),
    }
}
