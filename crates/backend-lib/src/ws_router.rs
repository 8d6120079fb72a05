// ============================
// crates/backend-lib/src/ws_router.rs
// ============================
//! WebSocket router and per-connection loop.
//!
//! Each connection gets an outbound mpsc channel; a forwarder task drains
//! it onto the socket so the relay never awaits a slow client. Inbound
//! frames are parsed as [`ClientEvent`]s and dispatched to the shared
//! [`Relay`]; malformed frames are logged and skipped.
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use hopalong_common::{ClientEvent, ServerEvent};
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::metrics as keys;
use crate::relay::CONNECTION_BUFFER;
use crate::store::Store;
use crate::AppState;

pub fn create_router<S: Store>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler::<S>))
        .with_state(state)
}

pub async fn ws_handler<S: Store>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    counter!(keys::WS_CONNECTION).increment(1);
    gauge!(keys::WS_ACTIVE).increment(1.0);
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection<S: Store>(socket: WebSocket, state: Arc<AppState<S>>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(CONNECTION_BUFFER);

    let conn_id = Uuid::new_v4();
    // The user this connection announced itself as, once known.
    let mut announced: Option<String> = None;

    // Forwarder: serialize outbound events onto the socket.
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(json) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                let event = match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::debug!(%conn_id, error = %err, "ignoring malformed frame");
                        continue;
                    },
                };
                match event {
                    ClientEvent::UserJoin { user_id } => {
                        state.relay.announce(conn_id, &user_id, tx.clone());
                        announced = Some(user_id);
                    },
                    ClientEvent::TripJoin { trip_id } => {
                        state.relay.join_room(
                            &trip_id,
                            conn_id,
                            announced.as_deref(),
                            tx.clone(),
                        );
                    },
                    ClientEvent::TripLeave { trip_id } => {
                        state.relay.leave_room(&trip_id, conn_id, announced.as_deref());
                    },
                    ClientEvent::MessageSend { trip_id, message } => {
                        state.relay.broadcast_chat(&trip_id, message);
                    },
                    ClientEvent::TypingStart {
                        trip_id,
                        user_id,
                        user_name,
                    } => {
                        state.relay.broadcast_typing(
                            &trip_id,
                            conn_id,
                            ServerEvent::UserTyping { user_id, user_name },
                        );
                    },
                    ClientEvent::TypingStop { trip_id, user_id } => {
                        state.relay.broadcast_typing(
                            &trip_id,
                            conn_id,
                            ServerEvent::UserStoppedTyping { user_id },
                        );
                    },
                    ClientEvent::RequestNew {
                        organizer_id,
                        request,
                    } => {
                        state
                            .relay
                            .notify_user(&organizer_id, ServerEvent::RequestNotification(request));
                    },
                    ClientEvent::RequestResponse { user_id, response } => {
                        state
                            .relay
                            .notify_user(&user_id, ServerEvent::RequestStatusUpdate(response));
                    },
                }
            },
            Message::Close(_) => break,
            // Pings are answered by axum; binary frames are not part of
            // the protocol.
            _ => {},
        }
    }

    state.relay.disconnect(conn_id, announced.as_deref());
    gauge!(keys::WS_ACTIVE).decrement(1.0);
    send_task.abort();
}
