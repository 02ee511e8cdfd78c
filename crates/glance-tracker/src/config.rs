// Tracker configuration
//
// All tunables are explicit construction-time values; nothing is read from
// globals or ambient attributes.

use std::time::Duration;

use uuid::Uuid;

/// Idle window after which a stored session id is superseded
pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(30 * 60);
/// Interval between heartbeat ticks
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Configuration for a tracker instance
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Ingestion endpoint URL (e.g. "https://analytics.example.com/api/track")
    pub endpoint: String,

    /// Website id to stamp on every payload, when the embedder knows it.
    /// When None, the server resolves the website from the domain.
    pub website_id: Option<Uuid>,

    /// How long a session id stays valid without activity
    pub session_duration: Duration,

    /// How often the heartbeat fires while the page is visible
    pub heartbeat_interval: Duration,

    /// Honor the visitor's do-not-track signal by doing nothing at all
    pub respect_do_not_track: bool,
}

impl TrackerConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            website_id: None,
            session_duration: DEFAULT_SESSION_DURATION,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            respect_do_not_track: true,
        }
    }

    pub fn with_website_id(mut self, website_id: Uuid) -> Self {
        self.website_id = Some(website_id);
        self
    }

    pub fn with_session_duration(mut self, duration: Duration) -> Self {
        self.session_duration = duration;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }
}

/// Builder for TrackerConfig with fluent API
pub struct TrackerConfigBuilder {
    config: TrackerConfig,
}

impl TrackerConfigBuilder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            config: TrackerConfig::new(endpoint),
        }
    }

    pub fn website_id(mut self, website_id: Uuid) -> Self {
        self.config.website_id = Some(website_id);
        self
    }

    pub fn session_duration(mut self, duration: Duration) -> Self {
        self.config.session_duration = duration;
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    pub fn respect_do_not_track(mut self, respect: bool) -> Self {
        self.config.respect_do_not_track = respect;
        self
    }

    pub fn build(self) -> TrackerConfig {
        self.config
    }
}
