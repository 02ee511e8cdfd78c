// Fire-and-forget payload delivery
//
// The transport contract: deliver never blocks the caller, never returns an
// error, and a payload handed over must survive page teardown (the HTTP
// implementation hands the request to a detached task immediately).

use std::sync::{Arc, Mutex};

use glance_core::TrackPayload;

/// Delivers payloads to the ingestion endpoint, best effort
pub trait Transport: Send + Sync {
    /// Hand off a payload. Failures are swallowed; tracking must never
    /// interrupt the host page.
    fn deliver(&self, payload: TrackPayload);
}

/// HTTP POST transport backed by reqwest
///
/// Requires a tokio runtime; each delivery is a detached task so the call
/// returns before any network I/O happens.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl Transport for HttpTransport {
    fn deliver(&self, payload: TrackPayload) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        tokio::spawn(async move {
            if let Err(err) = client.post(&endpoint).json(&payload).send().await {
                // Silently drop; analytics must not surface errors
                tracing::debug!(%err, "tracking delivery failed");
            }
        });
    }
}

/// Captures payloads in memory for assertions
#[derive(Debug, Default, Clone)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<TrackPayload>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in order
    pub fn sent(&self) -> Vec<TrackPayload> {
        self.sent.lock().expect("transport poisoned").clone()
    }

    pub fn clear(&self) {
        self.sent.lock().expect("transport poisoned").clear();
    }
}

impl Transport for RecordingTransport {
    fn deliver(&self, payload: TrackPayload) {
        self.sent.lock().expect("transport poisoned").push(payload);
    }
}
