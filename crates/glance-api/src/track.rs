// Ingestion endpoint
//
// POST /api/track is the unauthenticated endpoint trackers send payloads to.
// Pipeline per request: validate -> resolve website -> enrich (ip, geo,
// user agent) -> persist -> broadcast -> ack. Persistence failure
// short-circuits the broadcast; tracking calls are at-most-once and are
// never retried.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use glance_core::{GeoResolver, LiveMessage, TrackPayload, UserAgentParser};
use glance_storage::{Database, NewEvent, NewPageView};

use crate::error::ApiError;
use crate::registry::TopicRegistry;

/// App state for the ingestion route
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub registry: Arc<TopicRegistry>,
    pub ua_parser: Arc<dyn UserAgentParser>,
    pub geo: Arc<dyn GeoResolver>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/track", post(track))
        .with_state(state)
}

/// Acknowledgment returned to the tracker
#[derive(Debug, Serialize, ToSchema)]
pub struct TrackResponse {
    pub success: bool,
}

/// POST /api/track - Ingest a page view or custom event
#[utoipa::path(
    post,
    path = "/api/track",
    request_body = TrackPayload,
    responses(
        (status = 200, description = "Payload persisted and broadcast", body = TrackResponse),
        (status = 400, description = "Missing path or unresolvable website"),
        (status = 500, description = "Persistence failure; nothing was broadcast")
    ),
    tag = "tracking"
)]
pub async fn track(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<TrackPayload>,
) -> Result<Json<TrackResponse>, ApiError> {
    payload.validate()?;

    let website_id = resolve_website(&state, &payload).await?;

    // Enrichment degrades, it never rejects
    let ip = client_ip(&headers, peer);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let client = state
        .ua_parser
        .parse(user_agent.as_deref().unwrap_or_default());
    let country = ip
        .parse::<std::net::IpAddr>()
        .ok()
        .and_then(|addr| state.geo.country(addr));

    if payload.is_event() {
        state
            .db
            .insert_event(NewEvent::from_payload(website_id, &payload))
            .await?;
    } else {
        state
            .db
            .insert_page_view(NewPageView::from_payload(
                website_id,
                &payload,
                &client,
                user_agent,
                Some(ip),
                country,
            ))
            .await?;
    }

    // Only durably accepted events are broadcast
    let delivered = state
        .registry
        .publish(website_id, &LiveMessage::for_payload(&payload))
        .await;
    tracing::debug!(%website_id, path = %payload.path, delivered, "payload ingested");

    Ok(Json(TrackResponse { success: true }))
}

/// Resolve the target website: an explicit id wins, else the domain is
/// looked up and created on first sight. Neither resolvable is a client
/// error.
async fn resolve_website(state: &AppState, payload: &TrackPayload) -> Result<Uuid, ApiError> {
    if let Some(id) = payload.website_id {
        return Ok(id);
    }
    match payload.domain.as_deref().map(str::trim) {
        Some(domain) if !domain.is_empty() => {
            let website = state.db.resolve_or_create_website(domain).await?;
            Ok(website.id)
        }
        _ => Err(ApiError::bad_request("websiteId or domain is required")),
    }
}

/// Client IP with fixed header precedence: the first hop of x-forwarded-for,
/// then x-real-ip, then the transport-level peer address. First match wins.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
    {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }
    peer.ip().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "192.0.2.10:54321".parse().unwrap()
    }

    #[test]
    fn test_forwarded_for_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "198.51.100.4".parse().unwrap());
        assert_eq!(client_ip(&headers, peer()), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_used_when_no_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.4".parse().unwrap());
        assert_eq!(client_ip(&headers, peer()), "198.51.100.4");
    }

    #[test]
    fn test_peer_address_is_the_fallback() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, peer()), "192.0.2.10");
    }

    #[test]
    fn test_empty_forwarded_for_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "".parse().unwrap());
        assert_eq!(client_ip(&headers, peer()), "192.0.2.10");
    }
}
