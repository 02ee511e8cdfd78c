// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, Utc};
use glance_core::{ClientInfo, TrackPayload};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// Website models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct WebsiteRow {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    pub created_at: DateTime<Utc>,
}

/// Website row joined with its traffic counters, for dashboard listings
#[derive(Debug, Clone, FromRow)]
pub struct WebsiteStatsRow {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    pub created_at: DateTime<Utc>,
    pub total_views: i64,
    pub unique_sessions: i64,
}

#[derive(Debug, Clone)]
pub struct CreateWebsite {
    pub name: String,
    pub domain: String,
}

// ============================================
// Page view models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct PageViewRow {
    pub id: Uuid,
    pub website_id: Uuid,
    pub session_id: Option<String>,
    pub path: String,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device_type: Option<String>,
    pub duration: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for a page view: the validated payload plus everything
/// enrichment derived server-side.
#[derive(Debug, Clone, Default)]
pub struct NewPageView {
    pub website_id: Uuid,
    pub session_id: Option<String>,
    pub path: String,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub browser: String,
    pub os: String,
    pub device_type: String,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub viewport_width: Option<i32>,
    pub viewport_height: Option<i32>,
    pub color_depth: Option<i32>,
    pub pixel_ratio: Option<f64>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub timezone_offset: Option<i32>,
    pub connection_type: Option<String>,
    pub downlink: Option<f64>,
    pub rtt: Option<i32>,
    pub load_time: Option<i64>,
    pub dom_content_loaded: Option<i64>,
    pub first_paint: Option<f64>,
    pub first_contentful_paint: Option<f64>,
    pub duration: Option<i64>,
}

impl NewPageView {
    /// Flatten a validated payload and its enrichment into insert columns
    pub fn from_payload(
        website_id: Uuid,
        payload: &TrackPayload,
        client: &ClientInfo,
        user_agent: Option<String>,
        ip_address: Option<String>,
        country: Option<String>,
    ) -> Self {
        let connection = payload.connection.as_ref();
        let performance = payload.performance.as_ref();
        Self {
            website_id,
            session_id: payload.session_id.clone(),
            path: payload.path.clone(),
            referrer: payload.referrer.clone(),
            user_agent,
            ip_address,
            country,
            browser: client.browser.clone(),
            os: client.os.clone(),
            device_type: client.device_type.clone(),
            screen_width: payload.screen_width,
            screen_height: payload.screen_height,
            viewport_width: payload.viewport_width,
            viewport_height: payload.viewport_height,
            color_depth: payload.color_depth,
            pixel_ratio: payload.pixel_ratio,
            language: payload.language.clone(),
            timezone: payload.timezone.clone(),
            timezone_offset: payload.timezone_offset,
            connection_type: connection.and_then(|c| c.effective_type.clone()),
            downlink: connection.and_then(|c| c.downlink),
            rtt: connection.and_then(|c| c.rtt),
            load_time: performance.and_then(|p| p.load_time),
            dom_content_loaded: performance.and_then(|p| p.dom_content_loaded),
            first_paint: performance.and_then(|p| p.first_paint),
            first_contentful_paint: performance.and_then(|p| p.first_contentful_paint),
            duration: payload.duration,
        }
    }
}

// ============================================
// Custom event models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub website_id: Uuid,
    pub session_id: Option<String>,
    pub event_name: String,
    pub event_data: Option<serde_json::Value>,
    pub path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub website_id: Uuid,
    pub session_id: Option<String>,
    pub event_name: String,
    pub event_data: Option<serde_json::Value>,
    pub path: Option<String>,
}

impl NewEvent {
    /// Build the insert shape for a custom-event payload.
    ///
    /// Callers must only use this for payloads where `event_name` is present;
    /// a payload without one falls back to an empty name rather than panic.
    pub fn from_payload(website_id: Uuid, payload: &TrackPayload) -> Self {
        Self {
            website_id,
            session_id: payload.session_id.clone(),
            event_name: payload.event_name.clone().unwrap_or_default(),
            event_data: payload.event_data.clone(),
            path: Some(payload.path.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_core::{ConnectionInfo, PerformanceInfo};
    use serde_json::json;

    #[test]
    fn test_page_view_flattens_nested_metrics() {
        let payload = TrackPayload {
            path: "/features".to_string(),
            session_id: Some("gl_x_1".to_string()),
            duration: Some(12),
            connection: Some(ConnectionInfo {
                effective_type: Some("4g".to_string()),
                downlink: Some(9.5),
                rtt: Some(40),
                save_data: None,
            }),
            performance: Some(PerformanceInfo {
                load_time: Some(710),
                dom_content_loaded: Some(300),
                first_paint: Some(120.5),
                first_contentful_paint: None,
            }),
            ..Default::default()
        };
        let client = ClientInfo::default();
        let website_id = Uuid::new_v4();

        let row = NewPageView::from_payload(
            website_id,
            &payload,
            &client,
            Some("agent".to_string()),
            Some("203.0.113.7".to_string()),
            Some("DE".to_string()),
        );

        assert_eq!(row.website_id, website_id);
        assert_eq!(row.path, "/features");
        assert_eq!(row.connection_type.as_deref(), Some("4g"));
        assert_eq!(row.rtt, Some(40));
        assert_eq!(row.load_time, Some(710));
        assert_eq!(row.first_contentful_paint, None);
        assert_eq!(row.country.as_deref(), Some("DE"));
        assert_eq!(row.browser, "Unknown");
        assert_eq!(row.duration, Some(12));
    }

    #[test]
    fn test_event_keeps_name_data_and_path() {
        let payload = TrackPayload {
            path: "/blog".to_string(),
            event_name: Some("file_download".to_string()),
            event_data: Some(json!({"extension": "pdf"})),
            ..Default::default()
        };
        let row = NewEvent::from_payload(Uuid::new_v4(), &payload);
        assert_eq!(row.event_name, "file_download");
        assert_eq!(row.event_data, Some(json!({"extension": "pdf"})));
        assert_eq!(row.path.as_deref(), Some("/blog"));
    }
}
