// Environment probe
//
// Everything the tracker reads from the page at send time: path, referrer,
// domain, screen and viewport geometry, connection and performance snapshots,
// locale, and the do-not-track signal.

use glance_core::{ConnectionInfo, PerformanceInfo};

/// Screen and viewport geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenSnapshot {
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub viewport_width: Option<i32>,
    pub viewport_height: Option<i32>,
    pub color_depth: Option<i32>,
    pub pixel_ratio: Option<f64>,
}

/// Language and timezone of the visitor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocaleSnapshot {
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub timezone_offset: Option<i32>,
}

/// Read-only view of the hosting page
pub trait EnvironmentProbe: Send + Sync {
    /// Current path including the query string
    fn path(&self) -> String;
    fn referrer(&self) -> Option<String>;
    /// Hostname the tracker runs on
    fn domain(&self) -> Option<String>;
    fn screen(&self) -> ScreenSnapshot;
    fn connection(&self) -> Option<ConnectionInfo>;
    fn performance(&self) -> Option<PerformanceInfo>;
    fn locale(&self) -> LocaleSnapshot;
    /// Whether the visitor signalled do-not-track
    fn do_not_track(&self) -> bool;
}

/// Probe with fixed values, for tests and headless embedders
#[derive(Debug, Clone, Default)]
pub struct FixedProbe {
    pub path: String,
    pub referrer: Option<String>,
    pub domain: Option<String>,
    pub screen: ScreenSnapshot,
    pub connection: Option<ConnectionInfo>,
    pub performance: Option<PerformanceInfo>,
    pub locale: LocaleSnapshot,
    pub do_not_track: bool,
}

impl FixedProbe {
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_do_not_track(mut self, dnt: bool) -> Self {
        self.do_not_track = dnt;
        self
    }
}

impl EnvironmentProbe for FixedProbe {
    fn path(&self) -> String {
        self.path.clone()
    }

    fn referrer(&self) -> Option<String> {
        self.referrer.clone()
    }

    fn domain(&self) -> Option<String> {
        self.domain.clone()
    }

    fn screen(&self) -> ScreenSnapshot {
        self.screen.clone()
    }

    fn connection(&self) -> Option<ConnectionInfo> {
        self.connection.clone()
    }

    fn performance(&self) -> Option<PerformanceInfo> {
        self.performance.clone()
    }

    fn locale(&self) -> LocaleSnapshot {
        self.locale.clone()
    }

    fn do_not_track(&self) -> bool {
        self.do_not_track
    }
}
