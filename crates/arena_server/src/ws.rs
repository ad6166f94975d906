//! WebSocket transport.
//!
//! One task per socket: inbound text frames are parsed as
//! [`ClientMessage`] and handed to the gateway; everything the gateway
//! addresses to this connection is written back as JSON.

use crate::app::AppState;
use crate::gateway::GatewayHandle;
use crate::protocol::{ClientMessage, ServerMessage};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, instrument, warn};

/// Upgrades `GET /ws` to a game connection.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let gateway = state.gateway().clone();
    ws.on_upgrade(move |socket| handle_socket(socket, gateway))
}

#[instrument(skip_all)]
async fn handle_socket(socket: WebSocket, gateway: GatewayHandle) {
    let (conn, mut outbound) = match gateway.connect() {
        Ok(registered) => registered,
        Err(e) => {
            warn!(error = %e, "Rejecting socket");
            return;
        }
    };
    info!(conn = %conn, "Socket opened");

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            Some(message) = outbound.recv() => {
                match serde_json::to_string(&message) {
                    Ok(json) => {
                        if sink.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(conn = %conn, error = %e, "Failed to encode message"),
                }
            }
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(text.as_str()) {
                            Ok(message) => {
                                if gateway.send(conn, message).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                debug!(conn = %conn, error = %e, "Unparseable frame");
                                let reply = ServerMessage::error(format!("Invalid message: {}", e));
                                let Ok(json) = serde_json::to_string(&reply) else {
                                    continue;
                                };
                                if sink.send(Message::Text(json.into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(conn = %conn, error = %e, "Socket error");
                        break;
                    }
                }
            }
        }
    }

    if let Err(e) = gateway.disconnect(conn) {
        warn!(conn = %conn, error = %e, "Could not report disconnect");
    }
    info!(conn = %conn, "Socket closed");
}
