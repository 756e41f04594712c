//! Registry of connected identities

pub mod palette;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

/// Display names are trimmed and truncated to this many characters.
pub const MAX_NAME_LEN: usize = 20;

/// An ephemeral per-connection participant. Created at connect, destroyed at
/// disconnect; claim records keep their own copies of name and color, so a
/// departed identity's claims stay valid.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub claim_count: u32,
    pub joined_at: DateTime<Utc>,
}

/// Result of a successful rename, carrying what broadcasts need.
#[derive(Debug, Clone)]
pub struct RenameOutcome {
    pub old_name: String,
    pub identity: Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RenameError {
    /// The trimmed name is empty; identity state is unchanged.
    #[error("display name is empty after trimming")]
    EmptyName,

    /// The identity already disconnected. Only reachable in a rename /
    /// disconnect race.
    #[error("identity is no longer connected")]
    UnknownIdentity,
}

/// Live set of connected identities. Mutations are serialized per identity
/// by the map's shard locking; the color pool has its own small lock.
pub struct IdentityRegistry {
    identities: DashMap<Uuid, Identity>,
    colors_in_use: Mutex<HashSet<String>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self {
            identities: DashMap::new(),
            colors_in_use: Mutex::new(HashSet::new()),
        }
    }

    /// Allocate a fresh identity with a generated name and a palette color
    /// not currently in use when one is available.
    pub fn register(&self) -> Identity {
        let mut rng = rand::thread_rng();

        let names_in_use: HashSet<String> = self
            .identities
            .iter()
            .map(|entry| entry.value().name.clone())
            .collect();
        let name = palette::generate_name(&mut rng, &names_in_use);

        let color = {
            let mut in_use = self.colors_in_use.lock();
            let color = palette::pick_color(&mut rng, &in_use);
            in_use.insert(color.clone());
            color
        };

        let identity = Identity {
            id: Uuid::new_v4(),
            name,
            color,
            claim_count: 0,
            joined_at: Utc::now(),
        };
        self.identities.insert(identity.id, identity.clone());
        identity
    }

    /// Remove an identity and release its color back to the pool. Returns
    /// `None` when already removed, which makes disconnects idempotent.
    pub fn unregister(&self, id: Uuid) -> Option<Identity> {
        let (_, identity) = self.identities.remove(&id)?;
        self.colors_in_use.lock().remove(&identity.color);
        Some(identity)
    }

    pub fn get(&self, id: Uuid) -> Option<Identity> {
        self.identities.get(&id).map(|entry| entry.value().clone())
    }

    /// Trim, bound, and apply a new display name.
    pub fn rename(&self, id: Uuid, raw: &str) -> Result<RenameOutcome, RenameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RenameError::EmptyName);
        }
        let new_name: String = trimmed.chars().take(MAX_NAME_LEN).collect();

        let mut entry = self
            .identities
            .get_mut(&id)
            .ok_or(RenameError::UnknownIdentity)?;
        let old_name = std::mem::replace(&mut entry.name, new_name);
        Ok(RenameOutcome {
            old_name,
            identity: entry.clone(),
        })
    }

    /// Bump the running claim tally; a no-op once the identity disconnected.
    pub fn increment_claim_count(&self, id: Uuid) {
        if let Some(mut entry) = self.identities.get_mut(&id) {
            entry.claim_count += 1;
        }
    }

    pub fn list(&self) -> Vec<Identity> {
        self.identities
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn connected_count(&self) -> usize {
        self.identities.len()
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
