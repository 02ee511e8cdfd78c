// Live subscription endpoint (WebSocket)
//
// Dashboards connect to /ws?websiteId=<uuid> and receive every event
// ingested for that website while they stay connected. Only this upgrade
// path exists; a connection without a usable websiteId is accepted and then
// immediately closed with a policy-violation code.
//
// Connection lifecycle: Connecting -> Open (subscribed) -> Closed
// (unsubscribed). Close and transport error both land in the same cleanup;
// errors are logged, never retried — the dashboard reconnects on its own.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::registry::TopicRegistry;

/// App state for the live subscription route
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TopicRegistry>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    #[serde(rename = "websiteId")]
    website_id: Option<String>,
}

async fn websocket_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    // Parsed before the upgrade so the close decision is already made
    let website_id = query
        .website_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw).ok());

    ws.on_upgrade(move |socket| async move {
        match website_id {
            Some(website_id) => handle_socket(state.registry, website_id, socket).await,
            None => reject_socket(socket).await,
        }
    })
}

/// Accept-then-close for connections without a usable website id. The
/// connection is never registered in any topic.
async fn reject_socket(mut socket: WebSocket) {
    tracing::debug!("live subscription without websiteId rejected");
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: close_code::POLICY,
            reason: "websiteId query parameter required".into(),
        })))
        .await;
}

async fn handle_socket(registry: Arc<TopicRegistry>, website_id: Uuid, socket: WebSocket) {
    let (key, mut frames) = registry.subscribe(website_id).await;
    tracing::info!(%website_id, "live subscriber connected");

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            frame = frames.recv() => {
                match frame {
                    Some(text) => {
                        if sink.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    // Registry side went away; nothing more will arrive
                    None => break,
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = sink.send(Message::Pong(payload)).await;
                    }
                    // No client->server frames are defined after connect
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::warn!(%website_id, %err, "live subscriber transport error");
                        break;
                    }
                }
            }
        }
    }

    registry.unsubscribe(key).await;
    tracing::info!(%website_id, "live subscriber disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_query_parses_optional_id() {
        let query: WsQuery = serde_json::from_str(r#"{"websiteId": "not-a-uuid"}"#).unwrap();
        assert!(query
            .website_id
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .is_none());

        let query: WsQuery = serde_json::from_str(r#"{}"#).unwrap();
        assert!(query.website_id.is_none());
    }
}
