//! Application state shared across sessions and routes

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::grid::{ClaimRecord, GridStore};
use crate::identity::IdentityRegistry;
use crate::store::journal::{self, JournalEntry, JournalHandle};
use crate::ws::SessionHub;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub grid: Arc<GridStore>,
    pub registry: Arc<IdentityRegistry>,
    pub hub: Arc<SessionHub>,
    pub journal: Option<JournalHandle>,
}

impl AppState {
    /// Build state with no persistence attached.
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        Self {
            grid: Arc::new(GridStore::new(config.grid_size)),
            registry: Arc::new(IdentityRegistry::new()),
            hub: Arc::new(SessionHub::new()),
            journal: None,
            config,
        }
    }

    /// Build state and, when a journal path is configured, replay it into
    /// the grid and attach the writer.
    pub async fn bootstrap(config: Config) -> anyhow::Result<Self> {
        let mut state = Self::new(config);

        if let Some(path) = state.config.journal_path.clone() {
            let entries = journal::load(&path)
                .await
                .with_context(|| format!("failed to read claim journal {}", path.display()))?;

            let mut restored = 0usize;
            for entry in entries {
                match entry {
                    JournalEntry::Claim(record) => {
                        if state.grid.restore_record(record) {
                            restored += 1;
                        }
                    }
                    JournalEntry::Rename { owner, name } => {
                        state.grid.rename_owner(owner, &name);
                    }
                }
            }
            info!(restored, path = %path.display(), "claim journal replayed");

            state.journal = Some(journal::spawn_writer(path));
        }

        Ok(state)
    }

    /// Best-effort journal append for an accepted claim.
    pub fn journal_claim(&self, record: &ClaimRecord) {
        if let Some(journal) = &self.journal {
            journal.append(JournalEntry::Claim(record.clone()));
        }
    }

    /// Best-effort journal append for a rename back-fill.
    pub fn journal_rename(&self, owner: Uuid, name: &str) {
        if let Some(journal) = &self.journal {
            journal.append(JournalEntry::Rename {
                owner,
                name: name.to_string(),
            });
        }
    }
}
