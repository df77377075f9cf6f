//! services/api/src/web/ws_handler.rs
//!
//! The WebSocket side of a tab session. It forwards every render of the tab to
//! the page and applies the page's filter changes.

use crate::error::{error_response, HandlerError};
use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    state::{AppState, TabSession},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use uuid::Uuid;

type WsSender = SplitSink<WebSocket, Message>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, HandlerError> {
    let session = app_state
        .session(id)
        .await
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, format!("Session {} not found", id)))?;
    session.touch();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, session)))
}

async fn handle_socket(socket: WebSocket, session: Arc<TabSession>) {
    info!(session_id = %session.id, "WebSocket attached");
    session.attach_socket();

    let (mut sender, mut receiver) = socket.split();
    // Subscribe before the first render so nothing emitted in between is lost.
    let mut events = session.events.subscribe();

    // --- 1. Initialization Phase ---
    let init = ServerMessage::SessionInitialized { session_id: session.id };
    let first_view = ServerMessage::DashboardUpdated {
        view: session.view().await,
    };
    if send_message(&mut sender, &init).await.is_err() || send_message(&mut sender, &first_view).await.is_err() {
        error!(session_id = %session.id, "Failed to send the initial dashboard.");
        session.detach_socket();
        return;
    }

    // --- 2. Main Message Loop ---
    loop {
        tokio::select! {
            _ = session.cancellation_token.cancelled() => {
                info!(session_id = %session.id, "Tab closed, detaching socket.");
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            event = events.recv() => match event {
                Ok(message) => {
                    if send_message(&mut sender, &message).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(session_id = %session.id, skipped, "Socket fell behind, sending a fresh view.");
                    let view = ServerMessage::DashboardUpdated { view: session.view().await };
                    if send_message(&mut sender, &view).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => handle_text_message(text.as_str(), &session).await,
                Some(Ok(Message::Close(_))) => {
                    info!("Client sent close message.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket receive failed: {}", e);
                    break;
                }
                None => {
                    info!("Client disconnected.");
                    break;
                }
            },
        }
    }

    // --- 3. Cleanup ---
    // The tab stays open; the idle sweep closes it if nobody comes back.
    session.detach_socket();
    info!(session_id = %session.id, "WebSocket connection closed.");
}

async fn send_message(sender: &mut WsSender, message: &ServerMessage) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await
}

/// Helper function to handle the logic for different `ClientMessage` variants.
async fn handle_text_message(text: &str, session: &TabSession) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::SetFilter { filter }) => {
            {
                let mut state = session.state.lock().await;
                state.filter = filter;
            }
            session.render().await;
        }
        Ok(ClientMessage::Refresh) => session.render().await,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            session.emit(ServerMessage::Error {
                message: format!("Unrecognized message: {}", e),
            });
        }
    }
}
