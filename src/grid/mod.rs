//! Grid domain types and the authoritative claim store

pub mod store;

pub use store::GridStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default grid dimension; the board is `grid_size * grid_size` cells.
pub const DEFAULT_GRID_SIZE: u16 = 50;

/// Position of one cell on the grid. Used directly as the map key; the
/// `"x-y"` string form exists only at the wire-serialization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: u16,
    pub y: u16,
}

impl CellCoord {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Validate raw client-supplied coordinates. Clients send plain JSON
    /// numbers, so non-integers, negatives and out-of-range values all have
    /// to be rejected here rather than at parse time.
    pub fn from_raw(x: f64, y: f64, grid_size: u16) -> Option<Self> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        if x.fract() != 0.0 || y.fract() != 0.0 {
            return None;
        }
        if x < 0.0 || y < 0.0 || x >= f64::from(grid_size) || y >= f64::from(grid_size) {
            return None;
        }
        Some(Self {
            x: x as u16,
            y: y as u16,
        })
    }

    pub fn in_bounds(&self, grid_size: u16) -> bool {
        self.x < grid_size && self.y < grid_size
    }
}

/// Who claimed a cell, and when. Permanent for the life of the process.
///
/// Immutable once created except for `owner_name`, which is updated in place
/// when the owning identity renames. The `GridStore` is the sole owner; every
/// other component works with clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    #[serde(flatten)]
    pub coord: CellCoord,
    pub owner: Uuid,
    pub owner_name: String,
    pub owner_color: String,
    pub claimed_at: DateTime<Utc>,
}

/// Claim arbitration outcomes that are not a win.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClaimError {
    /// Coordinate outside `[0, grid_size)` on either axis. Reported to the
    /// requester only, never broadcast.
    #[error("coordinate ({x}, {y}) is outside the {grid_size}x{grid_size} grid")]
    InvalidCoordinate { x: u16, y: u16, grid_size: u16 },

    /// Race lost; carries the winning record so the loser can see the
    /// current owner. An expected outcome, not a system error.
    #[error("cell ({}, {}) already claimed by {}", .0.coord.x, .0.coord.y, .0.owner_name)]
    AlreadyClaimed(ClaimRecord),
}

/// Claim counts derived from the store.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GridStats {
    pub total_cells: u32,
    pub total_claimed: u32,
    pub total_unclaimed: u32,
}
