//! Derived statistics over the grid and the live identity set

use std::collections::{hash_map, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grid::GridStore;
use crate::identity::IdentityRegistry;

pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    pub color: String,
    pub blocks_owned: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedUser {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub blocks_owned: u32,
}

/// The `/api/stats` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_blocks: u32,
    pub total_claimed: u32,
    pub total_unclaimed: u32,
    pub unique_owners: u32,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub connected_users: u32,
    pub users: Vec<ConnectedUser>,
}

struct OwnerTally {
    name: String,
    color: String,
    count: u32,
    first_claim: DateTime<Utc>,
}

/// Pure function of grid + registry state at call time; safe to run
/// concurrently with mutations and may reflect any instant between call and
/// return.
///
/// The leaderboard is derived from claim records grouped by owner id, so an
/// owner keeps their standing after disconnecting. Ties are broken by the
/// earliest first claim, a stable insertion-compatible order.
pub fn compute_stats(grid: &GridStore, registry: &IdentityRegistry) -> StatsSnapshot {
    let mut tallies: HashMap<Uuid, OwnerTally> = HashMap::new();
    for record in grid.snapshot() {
        match tallies.entry(record.owner) {
            hash_map::Entry::Occupied(mut entry) => {
                let tally = entry.get_mut();
                tally.count += 1;
                if record.claimed_at < tally.first_claim {
                    tally.first_claim = record.claimed_at;
                    tally.name = record.owner_name;
                    tally.color = record.owner_color;
                }
            }
            hash_map::Entry::Vacant(entry) => {
                entry.insert(OwnerTally {
                    name: record.owner_name,
                    color: record.owner_color,
                    count: 1,
                    first_claim: record.claimed_at,
                });
            }
        }
    }

    let unique_owners = tallies.len() as u32;
    let mut owners: Vec<OwnerTally> = tallies.into_values().collect();
    owners.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.first_claim.cmp(&b.first_claim))
    });

    let leaderboard = owners
        .into_iter()
        .take(LEADERBOARD_SIZE)
        .map(|tally| LeaderboardEntry {
            name: tally.name,
            color: tally.color,
            blocks_owned: tally.count,
        })
        .collect();

    let users: Vec<ConnectedUser> = registry
        .list()
        .into_iter()
        .map(|identity| ConnectedUser {
            id: identity.id,
            name: identity.name,
            color: identity.color,
            blocks_owned: identity.claim_count,
        })
        .collect();

    let grid_stats = grid.stats();
    StatsSnapshot {
        total_blocks: grid_stats.total_cells,
        total_claimed: grid_stats.total_claimed,
        total_unclaimed: grid_stats.total_unclaimed,
        unique_owners,
        connected_users: users.len() as u32,
        leaderboard,
        users,
    }
}
