//! WebSocket session gateway
//!
//! One session per connection, moving through Connecting -> Active -> Closed.
//! The gateway owns no game state: claims and renames go to the shared
//! stores, results come back out through the hub.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::grid::{CellCoord, ClaimError};
use crate::identity::{Identity, RenameError};
use crate::ws::protocol::{ClientMsg, GridSnapshotPayload, IdentityDescriptor, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Run one session over an upgraded socket until either side goes away.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (identity, mut outbound) = connect_session(&state);
    let identity_id = identity.id;
    info!(identity_id = %identity_id, name = %identity.name, "session active");

    let (mut ws_sink, mut ws_stream) = socket.split();

    loop {
        tokio::select! {
            queued = outbound.recv() => {
                match queued {
                    Some(msg) => {
                        if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                            debug!(identity_id = %identity_id, error = %e, "WebSocket send failed");
                            break;
                        }
                    }
                    // The hub dropped this session (stalled or closed out).
                    None => break,
                }
            }
            incoming = ws_stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMsg>(&text) {
                        Ok(msg) => process_client_msg(&state, identity_id, msg),
                        Err(e) => {
                            warn!(identity_id = %identity_id, error = %e, "failed to parse client message");
                            state.hub.send_to(
                                identity_id,
                                ServerMsg::Error {
                                    code: "bad_message".to_string(),
                                    message: e.to_string(),
                                },
                            );
                        }
                    },
                    Some(Ok(Message::Binary(_))) => {
                        warn!(identity_id = %identity_id, "received binary message, ignoring");
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        info!(identity_id = %identity_id, "client initiated close");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(identity_id = %identity_id, error = %e, "WebSocket error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    let _ = ws_sink.close().await;
    disconnect_session(&state, identity_id);
    info!(identity_id = %identity_id, "session closed");
}

/// Transition a fresh connection into Active: allocate an identity, sync the
/// new session, and announce it to everyone else.
pub fn connect_session(state: &AppState) -> (Identity, mpsc::Receiver<ServerMsg>) {
    let identity = state.registry.register();
    let outbound = state.hub.register(identity.id);

    state.hub.send_to(
        identity.id,
        ServerMsg::IdentityAssigned {
            identity: IdentityDescriptor::from(&identity),
        },
    );
    state.hub.send_to(
        identity.id,
        ServerMsg::GridSnapshot(GridSnapshotPayload::from_store(&state.grid)),
    );

    let joined = ServerMsg::IdentityJoined {
        id: identity.id,
        name: identity.name.clone(),
        color: identity.color.clone(),
        connected_count: state.registry.connected_count() as u32,
    };
    broadcast_except(state, identity.id, joined);

    (identity, outbound)
}

/// Transition into Closed. Idempotent: a second call for the same identity
/// is a no-op, so racing cleanup paths cannot double-announce a departure.
pub fn disconnect_session(state: &AppState, identity_id: Uuid) {
    state.hub.unregister(identity_id);
    let Some(identity) = state.registry.unregister(identity_id) else {
        return;
    };
    info!(identity_id = %identity_id, name = %identity.name, "identity left");
    broadcast_all(
        state,
        ServerMsg::IdentityLeft {
            id: identity.id,
            name: identity.name,
            connected_count: state.registry.connected_count() as u32,
        },
    );
}

/// Dispatch one parsed client message.
pub fn process_client_msg(state: &AppState, identity_id: Uuid, msg: ClientMsg) {
    match msg {
        ClientMsg::Claim { x, y } => handle_claim(state, identity_id, x, y),
        ClientMsg::Rename { name } => handle_rename(state, identity_id, &name),
    }
}

/// Validate and arbitrate one claim attempt. Wins are broadcast to every
/// session including the requester; rejections go to the requester only.
pub fn handle_claim(state: &AppState, identity_id: Uuid, x: f64, y: f64) {
    let Some(coord) = CellCoord::from_raw(x, y, state.grid.grid_size()) else {
        state
            .hub
            .send_to(identity_id, ServerMsg::claim_rejected_invalid(x, y));
        return;
    };

    // Identity gone means the session is mid-disconnect; nothing to do.
    let Some(identity) = state.registry.get(identity_id) else {
        return;
    };

    match state
        .grid
        .try_claim(coord, identity_id, &identity.name, &identity.color)
    {
        Ok(record) => {
            state.registry.increment_claim_count(identity_id);
            state.journal_claim(&record);
            info!(identity_id = %identity_id, x = coord.x, y = coord.y, "cell claimed");
            broadcast_all(state, ServerMsg::claim_accepted(&record));
        }
        Err(ClaimError::AlreadyClaimed(winner)) => {
            state
                .hub
                .send_to(identity_id, ServerMsg::claim_rejected_taken(x, y, &winner));
        }
        Err(ClaimError::InvalidCoordinate { .. }) => {
            state
                .hub
                .send_to(identity_id, ServerMsg::claim_rejected_invalid(x, y));
        }
    }
}

/// Apply a rename: registry first, then back-fill historical claim records,
/// then broadcast. An empty name is reported to the requester only.
pub fn handle_rename(state: &AppState, identity_id: Uuid, raw: &str) {
    match state.registry.rename(identity_id, raw) {
        Ok(outcome) => {
            let updated = state.grid.rename_owner(identity_id, &outcome.identity.name);
            state.journal_rename(identity_id, &outcome.identity.name);
            info!(
                identity_id = %identity_id,
                old_name = %outcome.old_name,
                new_name = %outcome.identity.name,
                updated_cells = updated,
                "identity renamed"
            );
            broadcast_all(
                state,
                ServerMsg::IdentityRenamed {
                    id: identity_id,
                    old_name: outcome.old_name,
                    new_name: outcome.identity.name,
                    color: outcome.identity.color,
                },
            );
        }
        Err(RenameError::EmptyName) => {
            state.hub.send_to(
                identity_id,
                ServerMsg::Error {
                    code: "empty_name".to_string(),
                    message: "display name cannot be empty".to_string(),
                },
            );
        }
        // Rename racing a disconnect; the departure already handles cleanup.
        Err(RenameError::UnknownIdentity) => {}
    }
}

/// Fan out to every active session; recipients the hub had to drop get their
/// own Closed transition here, so a dead transport heals itself.
pub fn broadcast_all(state: &AppState, msg: ServerMsg) {
    for dropped in state.hub.broadcast(&msg) {
        disconnect_session(state, dropped);
    }
}

/// Fan out to every active session except `skip`.
pub fn broadcast_except(state: &AppState, skip: Uuid, msg: ServerMsg) {
    for dropped in state.hub.broadcast_except(skip, &msg) {
        disconnect_session(state, dropped);
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
