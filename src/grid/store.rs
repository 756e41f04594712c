//! Authoritative claim store and race arbitration

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use super::{CellCoord, ClaimError, ClaimRecord, GridStats};

/// The authoritative mapping from cell coordinate to claim record.
///
/// All mutation is serialized per coordinate by the map's shard locking;
/// unrelated claims proceed in parallel and no global grid lock exists.
pub struct GridStore {
    grid_size: u16,
    cells: DashMap<CellCoord, ClaimRecord>,
}

impl GridStore {
    pub fn new(grid_size: u16) -> Self {
        Self {
            grid_size,
            cells: DashMap::new(),
        }
    }

    pub fn grid_size(&self) -> u16 {
        self.grid_size
    }

    /// Atomically claim `coord` for `owner`. Exactly one caller wins a cell
    /// for the lifetime of the process; losers receive the winning record.
    ///
    /// Bounds are re-validated here even though the gateway checks them
    /// first; the store never trusts a coordinate it did not verify.
    pub fn try_claim(
        &self,
        coord: CellCoord,
        owner: Uuid,
        owner_name: &str,
        owner_color: &str,
    ) -> Result<ClaimRecord, ClaimError> {
        if !coord.in_bounds(self.grid_size) {
            return Err(ClaimError::InvalidCoordinate {
                x: coord.x,
                y: coord.y,
                grid_size: self.grid_size,
            });
        }

        // Entry holds the shard lock across the check and the insert, which
        // is what makes the claim a single check-and-set.
        match self.cells.entry(coord) {
            Entry::Occupied(existing) => Err(ClaimError::AlreadyClaimed(existing.get().clone())),
            Entry::Vacant(slot) => {
                let record = ClaimRecord {
                    coord,
                    owner,
                    owner_name: owner_name.to_string(),
                    owner_color: owner_color.to_string(),
                    claimed_at: Utc::now(),
                };
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    pub fn get(&self, coord: &CellCoord) -> Option<ClaimRecord> {
        self.cells.get(coord).map(|entry| entry.value().clone())
    }

    /// Clone out every claim record. Claims are insert-only and each record
    /// read is atomic, so the result is a valid point-in-time view without
    /// blocking writers.
    pub fn snapshot(&self) -> Vec<ClaimRecord> {
        self.cells
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Back-fill `owner_name` on every record owned by `owner`. Atomic per
    /// record, not across the whole set. Returns how many records changed.
    pub fn rename_owner(&self, owner: Uuid, new_name: &str) -> usize {
        let mut updated = 0;
        for mut cell in self.cells.iter_mut() {
            if cell.owner == owner {
                cell.owner_name = new_name.to_string();
                updated += 1;
            }
        }
        updated
    }

    /// Replay hook for the persistence collaborator: insert a record only if
    /// its cell is free and in bounds (first record per coordinate wins).
    pub fn restore_record(&self, record: ClaimRecord) -> bool {
        if !record.coord.in_bounds(self.grid_size) {
            return false;
        }
        match self.cells.entry(record.coord) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn claimed_count(&self) -> usize {
        self.cells.len()
    }

    pub fn stats(&self) -> GridStats {
        let total_cells = u32::from(self.grid_size) * u32::from(self.grid_size);
        let total_claimed = self.cells.len() as u32;
        GridStats {
            total_cells,
            total_claimed,
            total_unclaimed: total_cells.saturating_sub(total_claimed),
        }
    }
}
