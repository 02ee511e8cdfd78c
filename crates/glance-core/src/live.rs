// Live wire frames pushed to dashboard subscribers
//
// Frames are JSON text with a lowercase "type" discriminator:
//   {"type":"connected","websiteId":...}   once, on subscribe
//   {"type":"pageview","data":{...}}       per ingested page view
//   {"type":"event","data":{...}}          per ingested custom event
//
// The data field carries the original validated payload untransformed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::payload::TrackPayload;

/// A server-to-client frame on the live subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LiveMessage {
    /// Acknowledgment sent to a subscriber right after it is registered
    Connected {
        #[serde(rename = "websiteId")]
        website_id: Uuid,
    },
    /// A page view was ingested for the subscriber's website
    Pageview { data: TrackPayload },
    /// A custom event was ingested for the subscriber's website
    Event { data: TrackPayload },
}

impl LiveMessage {
    /// Build the broadcast frame for an ingested payload
    pub fn for_payload(payload: &TrackPayload) -> Self {
        if payload.is_event() {
            LiveMessage::Event {
                data: payload.clone(),
            }
        } else {
            LiveMessage::Pageview {
                data: payload.clone(),
            }
        }
    }

    /// Serialize to the text frame sent over the wire
    pub fn to_frame(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
