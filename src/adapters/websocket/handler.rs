//! WebSocket gateway for realtime subscriptions.
//!
//! Connection lifecycle:
//! 1. Upgrade to WebSocket
//! 2. Open a subscription session (no rooms joined) and send `connected`
//! 3. Forward broker deliveries and apply join/leave requests until either
//!    side goes away
//! 4. Drop the session, which removes every membership

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Json, Router,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use serde::Serialize;

use crate::domain::foundation::Timestamp;

use super::messages::{
    ClientMessage, ConnectedMessage, LaggedMessage, Membership, PongMessage, ServerMessage,
    TopicMessage,
};
use super::rooms::EventBroker;
use super::session::{Delivery, SubscriptionSession};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub broker: Arc<EventBroker>,
}

impl WebSocketState {
    pub fn new(broker: Arc<EventBroker>) -> Self {
        Self { broker }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// What woke the connection loop.
enum Step {
    Delivery(Option<Delivery>),
    Inbound(Option<Result<Message, axum::Error>>),
}

async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();
    let mut session = state.broker.connect();
    let client_id = session.client_id();

    let connected = ServerMessage::Connected(ConnectedMessage {
        client_id: client_id.to_string(),
        timestamp: Timestamp::now().to_rfc3339(),
    });
    if let Err(e) = send_json(&mut sender, &connected).await {
        tracing::debug!(client_id = %client_id, "Failed to send connected message: {}", e);
        return;
    }

    loop {
        let step = tokio::select! {
            delivery = session.recv() => Step::Delivery(delivery),
            inbound = receiver.next() => Step::Inbound(inbound),
        };

        let outcome = match step {
            Step::Delivery(Some(Delivery::Event(event))) => {
                send_json(&mut sender, event.as_ref()).await
            }
            Step::Delivery(Some(Delivery::Lagged(missed))) => {
                tracing::warn!(client_id = %client_id, missed, "Client lagging, events dropped");
                send_json(&mut sender, &ServerMessage::Lagged(LaggedMessage { missed })).await
            }
            Step::Delivery(None) => break,
            Step::Inbound(Some(Ok(Message::Text(text)))) => {
                let reply = handle_client_message(&session, &text);
                send_json(&mut sender, &reply).await
            }
            Step::Inbound(Some(Ok(Message::Binary(_)))) => {
                tracing::warn!(client_id = %client_id, "Received unsupported binary message");
                let reply = ServerMessage::error("UNSUPPORTED", "binary frames are not supported");
                send_json(&mut sender, &reply).await
            }
            // Protocol ping/pong frames are answered by axum.
            Step::Inbound(Some(Ok(Message::Ping(_)))) | Step::Inbound(Some(Ok(Message::Pong(_)))) => {
                Ok(())
            }
            Step::Inbound(Some(Ok(Message::Close(_)))) | Step::Inbound(None) => {
                tracing::debug!(client_id = %client_id, "Client closed connection");
                break;
            }
            Step::Inbound(Some(Err(e))) => {
                tracing::debug!(client_id = %client_id, "Receive error: {}", e);
                break;
            }
        };

        if let Err(e) = outcome {
            tracing::debug!(client_id = %client_id, "Send error, closing connection: {}", e);
            break;
        }
    }

    session.close();
}

/// Applies one client request to the session and builds the reply.
pub fn handle_client_message(session: &SubscriptionSession, text: &str) -> ServerMessage {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => return ServerMessage::error("BAD_REQUEST", format!("invalid message: {}", e)),
    };

    match message.membership() {
        Ok(Some(Membership::Join(topic))) => {
            let changed = session.join(topic.clone());
            ServerMessage::Joined(TopicMessage {
                topic: topic.to_string(),
                changed,
            })
        }
        Ok(Some(Membership::Leave(topic))) => {
            let changed = session.leave(&topic);
            ServerMessage::Left(TopicMessage {
                topic: topic.to_string(),
                changed,
            })
        }
        Ok(None) => ServerMessage::Pong(PongMessage {
            timestamp: Timestamp::now().to_rfc3339(),
        }),
        Err(e) => ServerMessage::error("VALIDATION_FAILED", e.to_string()),
    }
}

async fn send_json<T: Serialize>(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &T,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    sessions: usize,
}

async fn health(State(state): State<WebSocketState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.broker.session_count(),
    })
}

/// Router exposing `GET /ws` and `GET /health`.
pub fn websocket_router() -> Router<WebSocketState> {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
}
