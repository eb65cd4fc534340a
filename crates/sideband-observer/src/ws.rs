//! `WebSocket` push adapter.
//!
//! Each connection runs two duties for its lifetime:
//!
//! - a **writer task** that forwards frames from the client's channel
//!   to the socket -- broadcasts from the loop and direct replies share
//!   this one ordered path, and
//! - a **read loop** that resolves each inbound command line through
//!   the hub and queues the reply for that client only.
//!
//! On any read failure, write failure, or peer close, both duties end
//! and the client is unregistered. Unregistration is idempotent with
//! the broadcast loop's own failure-triggered removal, whichever comes
//! first.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use sideband_hub::ClientHandle;

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// serving the push protocol.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_push(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_push(socket, state))
}

/// Handle one push connection's lifecycle: register, serve until
/// disconnect, unregister.
async fn handle_push(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let (handle, mut rx) = ClientHandle::connected();
    let id = handle.id();

    state.hub.clients().register(handle.clone());
    debug!(client = %id, "push client connected");

    // Writer duty: drain the client channel into the socket. Ends when
    // the channel closes (unregistered everywhere) or a write fails.
    let mut writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.to_string().into())).await.is_err() {
                debug!(client = %id, "push client write failed");
                break;
            }
        }
    });

    // Read duty: resolve inbound command lines until the peer goes away.
    loop {
        tokio::select! {
            // Writer ended first: the socket is unusable, stop reading.
            _ = &mut writer => break,

            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(line))) => {
                    let reply = state.hub.resolve(&line);
                    debug!(client = %id, command = %line.trim(), kind = %reply.kind, "push command");
                    match serde_json::to_string(&reply) {
                        Ok(json) => {
                            if handle.send(Arc::from(json.as_str())).is_err() {
                                break;
                            }
                        }
                        Err(error) => {
                            warn!(client = %id, %error, "failed to serialize push reply");
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!(client = %id, "push client closed connection");
                    break;
                }
                // Ping/pong and binary frames carry no commands.
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    // A transport error is not a clean close; say so
                    // instead of swallowing it.
                    warn!(client = %id, %error, "push client protocol error");
                    break;
                }
            },
        }
    }

    state.hub.clients().unregister(id);
    writer.abort();
    debug!(client = %id, "push client disconnected");
}
