//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grid::{CellCoord, ClaimRecord, GridStore};
use crate::identity::Identity;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMsg {
    /// Attempt to claim one cell. Coordinates arrive as raw JSON numbers;
    /// integer-ness and range are validated server-side.
    Claim { x: f64, y: f64 },

    /// Change this identity's display name
    Rename { name: String },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMsg {
    /// The connecting session's own identity, sent once before anything else
    IdentityAssigned { identity: IdentityDescriptor },

    /// Full claimed-grid state, unicast on connect and served over /api/grid
    GridSnapshot(GridSnapshotPayload),

    /// A cell was won; broadcast to every session including the claimant
    #[serde(rename_all = "camelCase")]
    ClaimAccepted {
        x: u16,
        y: u16,
        owner: Uuid,
        owner_name: String,
        owner_color: String,
        claimed_at: DateTime<Utc>,
    },

    /// A claim attempt failed; unicast to the requester, never broadcast.
    /// Coordinates are echoed back as received.
    #[serde(rename_all = "camelCase")]
    ClaimRejected {
        x: f64,
        y: f64,
        reason: RejectReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_owner: Option<OwnerInfo>,
    },

    /// A new identity connected; sent to every OTHER session
    #[serde(rename_all = "camelCase")]
    IdentityJoined {
        id: Uuid,
        name: String,
        color: String,
        connected_count: u32,
    },

    /// An identity disconnected; sent to every remaining session
    #[serde(rename_all = "camelCase")]
    IdentityLeft {
        id: Uuid,
        name: String,
        connected_count: u32,
    },

    /// An identity changed its display name; historical claim records are
    /// already back-filled when this goes out
    #[serde(rename_all = "camelCase")]
    IdentityRenamed {
        id: Uuid,
        old_name: String,
        new_name: String,
        color: String,
    },

    /// Request-level failure surface (bad message, empty rename)
    Error { code: String, message: String },
}

/// Why a claim attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    InvalidCoordinate,
    AlreadyClaimed,
}

/// Public info about a cell's current owner, shown to losing claimants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerInfo {
    pub name: String,
    pub color: String,
    pub claimed_at: DateTime<Utc>,
}

/// An identity's public descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDescriptor {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub blocks_owned: u32,
}

impl From<&Identity> for IdentityDescriptor {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name.clone(),
            color: identity.color.clone(),
            blocks_owned: identity.claim_count,
        }
    }
}

/// One claimed cell in the snapshot payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimCell {
    pub owner: Uuid,
    pub owner_name: String,
    pub owner_color: String,
    pub claimed_at: DateTime<Utc>,
}

/// Full grid state keyed by `"x-y"`. The string key is a wire concession for
/// JSON object maps; the core never uses it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSnapshotPayload {
    pub grid_size: u16,
    pub claims: HashMap<String, ClaimCell>,
}

impl GridSnapshotPayload {
    pub fn from_store(grid: &GridStore) -> Self {
        let claims = grid
            .snapshot()
            .into_iter()
            .map(|record| {
                (
                    cell_key(record.coord),
                    ClaimCell {
                        owner: record.owner,
                        owner_name: record.owner_name,
                        owner_color: record.owner_color,
                        claimed_at: record.claimed_at,
                    },
                )
            })
            .collect();
        Self {
            grid_size: grid.grid_size(),
            claims,
        }
    }
}

/// Wire key for one cell in the snapshot map.
pub fn cell_key(coord: CellCoord) -> String {
    format!("{}-{}", coord.x, coord.y)
}

impl ServerMsg {
    pub fn claim_accepted(record: &ClaimRecord) -> Self {
        Self::ClaimAccepted {
            x: record.coord.x,
            y: record.coord.y,
            owner: record.owner,
            owner_name: record.owner_name.clone(),
            owner_color: record.owner_color.clone(),
            claimed_at: record.claimed_at,
        }
    }

    pub fn claim_rejected_invalid(x: f64, y: f64) -> Self {
        Self::ClaimRejected {
            x,
            y,
            reason: RejectReason::InvalidCoordinate,
            current_owner: None,
        }
    }

    pub fn claim_rejected_taken(x: f64, y: f64, winner: &ClaimRecord) -> Self {
        Self::ClaimRejected {
            x,
            y,
            reason: RejectReason::AlreadyClaimed,
            current_owner: Some(OwnerInfo {
                name: winner.owner_name.clone(),
                color: winner.owner_color.clone(),
                claimed_at: winner.claimed_at,
            }),
        }
    }
}
