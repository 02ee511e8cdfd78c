// Tracking payload wire types
//
// This is the body of POST /api/track exactly as a tracker sends it.
// All fields are camelCase on the wire. Only `path` is mandatory; every
// client-side metric is optional so a minimal beacon still ingests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::{Result, TrackError};

/// Network connection snapshot reported by the client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    /// Effective connection type ("4g", "3g", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_type: Option<String>,
    /// Estimated bandwidth in Mbps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downlink: Option<f64>,
    /// Round-trip time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt: Option<i32>,
    /// Whether the client asked for reduced data usage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_data: Option<bool>,
}

/// Page load performance snapshot reported by the client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInfo {
    /// Full load time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_time: Option<i64>,
    /// DOMContentLoaded in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dom_content_loaded: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_paint: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_contentful_paint: Option<f64>,
}

/// A single tracked interaction: a page view or a custom event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TrackPayload {
    /// Target website, when the embedding site knows its id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_id: Option<Uuid>,
    /// Hostname the tracker runs on; used to resolve the website when no id is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Path of the tracked view, including the query string
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// Idle-bounded correlation key minted by the tracker, not a credential
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Client-side timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_width: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_height: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport_width: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport_height: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_depth: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_ratio: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone_offset: Option<i32>,

    /// Dwell time of the just-ended view, in whole seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,

    /// Present on custom events only; its absence makes this a page view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_data: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceInfo>,
}

/// The two persistence branches a payload can take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    PageView,
    CustomEvent,
}

impl TrackPayload {
    /// Validate the payload. `path` is the only hard requirement.
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(TrackError::invalid("path is required"));
        }
        Ok(())
    }

    /// Which persistence branch this payload takes. Decided solely by
    /// event_name so the branches are mutually exclusive.
    pub fn kind(&self) -> PayloadKind {
        match self.event_name {
            Some(_) => PayloadKind::CustomEvent,
            None => PayloadKind::PageView,
        }
    }

    pub fn is_event(&self) -> bool {
        self.kind() == PayloadKind::CustomEvent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_path_rejected() {
        let payload = TrackPayload::default();
        assert!(payload.validate().is_err());

        let payload = TrackPayload {
            path: "   ".to_string(),
            ..Default::default()
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_minimal_page_view_accepted() {
        let payload = TrackPayload {
            path: "/".to_string(),
            ..Default::default()
        };
        assert!(payload.validate().is_ok());
        assert_eq!(payload.kind(), PayloadKind::PageView);
    }

    #[test]
    fn test_event_name_switches_branch() {
        let payload = TrackPayload {
            path: "/pricing".to_string(),
            event_name: Some("scroll_depth".to_string()),
            event_data: Some(json!({"depth": 50})),
            ..Default::default()
        };
        assert_eq!(payload.kind(), PayloadKind::CustomEvent);
        assert!(payload.is_event());
    }

    #[test]
    fn test_wire_fields_are_camel_case() {
        let json = r#"{
            "domain": "example.com",
            "path": "/",
            "sessionId": "gl_abc123_1700000000000",
            "screenWidth": 1920,
            "viewportHeight": 900,
            "pixelRatio": 2.0,
            "timezoneOffset": -120,
            "connection": {"effectiveType": "4g", "downlink": 10.0, "rtt": 50},
            "performance": {"loadTime": 812, "domContentLoaded": 420}
        }"#;
        let payload: TrackPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.session_id.as_deref(), Some("gl_abc123_1700000000000"));
        assert_eq!(payload.screen_width, Some(1920));
        assert_eq!(payload.viewport_height, Some(900));
        assert_eq!(payload.timezone_offset, Some(-120));
        let conn = payload.connection.unwrap();
        assert_eq!(conn.effective_type.as_deref(), Some("4g"));
        assert_eq!(conn.rtt, Some(50));
        let perf = payload.performance.unwrap();
        assert_eq!(perf.load_time, Some(812));
        assert_eq!(perf.dom_content_loaded, Some(420));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        // Older or newer trackers may send extra fields; ingestion must not reject them
        let json = r#"{"path": "/", "languages": "en-US,en", "futureField": 1}"#;
        let payload: TrackPayload = serde_json::from_str(json).unwrap();
        assert!(payload.validate().is_ok());
    }
}
