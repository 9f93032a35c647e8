//! WebSocket endpoint for streaming translation.
//!
//! Frames alternate between metadata (text) and audio (binary); the
//! [`Session`] decides what each one means. Replies for a frame are sent
//! before the next frame is read, which keeps acks ahead of their chunk's
//! subtitles and keeps chunks in arrival order per connection.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info};

use crate::protocol::ServerMessage;
use crate::server::AppState;
use crate::session::Session;

/// Upgrade handler for `GET /ws/translate`.
pub async fn ws_handler(
    State(state): State<AppState>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let mut session = Session::new(state.pool.clone());
    info!("client connected");

    'conn: while let Some(message) = receiver.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "websocket receive error");
                break;
            }
        };

        match message {
            Message::Text(text) => {
                let reply = session.on_metadata(&text);
                if send_reply(&mut sender, &reply).await.is_err() {
                    break;
                }
            }
            Message::Binary(data) => {
                for reply in session.on_audio(data.to_vec()).await {
                    if send_reply(&mut sender, &reply).await.is_err() {
                        break 'conn;
                    }
                }
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    info!(elapsed = session.elapsed(), "client disconnected");
}

/// Serialize and send one reply frame.
///
/// A serialization failure is logged and skipped; only a transport failure
/// is returned, and that means the connection is gone.
async fn send_reply(
    sender: &mut SplitSink<WebSocket, Message>,
    reply: &ServerMessage,
) -> Result<(), axum::Error> {
    let payload = match reply.to_json() {
        Ok(payload) => payload,
        Err(e) => {
            error!(error = %e, "failed to serialize reply");
            return Ok(());
        }
    };
    sender.send(Message::Text(payload.into())).await
}
