//! WebSocket side of the relay.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use tracing::{debug, warn};

use super::{ClientFrame, Relay};

/// Drive one client connection until either side closes it.
///
/// Client frames register subscriptions; relay events are written back as
/// JSON text frames. Anything that fails to parse is logged and ignored.
pub async fn handle_socket(mut socket: WebSocket, relay: Arc<Relay>) {
    let (connection, mut events) = relay.open_connection();
    let connection_id = connection.id();
    debug!(connection_id, "relay connection opened");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientFrame>(text.as_str()) {
                            Ok(ClientFrame::Subscribe { session_id }) => {
                                relay.subscribe(session_id, connection.clone()).await;
                            }
                            Err(e) => {
                                debug!(connection_id, error = %e, "ignoring malformed frame");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(connection_id, error = %e, "relay connection error");
                        break;
                    }
                }
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                match serde_json::to_string(&event) {
                    Ok(json) => {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(connection_id, error = %e, "failed to encode relay event"),
                }
            }
        }
    }

    relay.remove_connection(connection_id).await;
    debug!(connection_id, "relay connection closed");
}
