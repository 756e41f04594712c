//! Append-only claim journal
//!
//! Optional durability collaborator. In-memory state is authoritative:
//! appends flow through a single writer task and a failed write is logged,
//! never rolled back into or blocking the claim path. Replaying the file at
//! startup rebuilds the grid exactly (first record per coordinate wins,
//! rename entries re-apply the name back-fill).

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::grid::ClaimRecord;

/// One line of the journal file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum JournalEntry {
    /// An accepted claim, stored with the full record layout.
    Claim(ClaimRecord),

    /// A rename back-fill for every record owned by `owner`.
    #[serde(rename_all = "camelCase")]
    Rename { owner: Uuid, name: String },
}

/// Cheap handle for appending entries from request handlers.
#[derive(Clone)]
pub struct JournalHandle {
    tx: mpsc::UnboundedSender<JournalEntry>,
}

impl JournalHandle {
    /// Queue an entry for the writer task. A closed writer means durability
    /// is gone for this process; the in-memory claim stays valid either way.
    pub fn append(&self, entry: JournalEntry) {
        let _ = self.tx.send(entry);
    }
}

/// Read and parse the journal; a missing file is an empty journal.
/// Unreadable lines are skipped rather than failing the whole replay.
pub async fn load(path: &Path) -> io::Result<Vec<JournalEntry>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut entries = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<JournalEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(line = lineno + 1, error = %e, "skipping unreadable journal line"),
        }
    }
    Ok(entries)
}

/// Spawn the single writer task that owns the journal file and hand back an
/// append handle.
pub fn spawn_writer(path: PathBuf) -> JournalHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<JournalEntry>();

    tokio::spawn(async move {
        let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "journal disabled, could not open file");
                return;
            }
        };
        info!(path = %path.display(), "claim journal attached");

        while let Some(entry) = rx.recv().await {
            let mut line = match serde_json::to_string(&entry) {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "unserializable journal entry, skipping");
                    continue;
                }
            };
            line.push('\n');
            if let Err(e) = file.write_all(line.as_bytes()).await {
                warn!(path = %path.display(), error = %e, "journal append failed");
            }
        }
    });

    JournalHandle { tx }
}
