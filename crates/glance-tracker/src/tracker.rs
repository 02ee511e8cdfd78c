// Tracker state machine
//
// One Tracker per browsing tab. It owns view timing, visibility transitions,
// heartbeat scheduling, scroll depth, and the auto-tracking hooks, and turns
// all of them into fire-and-forget payload deliveries.
//
// State transitions:
//   Visible -> Hidden   flush a page view for the just-ended view, stop the
//                       heartbeat
//   Hidden  -> Visible  restart the elapsed-time clock and the heartbeat
//
// Pause/resume is orthogonal to visibility: pausing cancels the heartbeat
// task, resuming restarts it without duplicating timers.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use glance_core::TrackPayload;

use crate::auto;
use crate::clock::Clock;
use crate::config::TrackerConfig;
use crate::navigation::NavigationObserver;
use crate::probe::EnvironmentProbe;
use crate::scroll::ScrollDepth;
use crate::session::{SessionManager, SessionStore};
use crate::transport::Transport;

/// Page visibility as the tracker sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

struct TrackerState {
    visibility: Visibility,
    view_start: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    paused: bool,
    scroll: ScrollDepth,
    heartbeat: Option<JoinHandle<()>>,
}

struct TrackerInner {
    config: TrackerConfig,
    enabled: bool,
    clock: Arc<dyn Clock>,
    sessions: SessionManager,
    transport: Arc<dyn Transport>,
    probe: Arc<dyn EnvironmentProbe>,
    state: Mutex<TrackerState>,
}

/// Per-tab session tracker
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<TrackerInner>,
}

impl Tracker {
    pub fn new(
        config: TrackerConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn SessionStore>,
        transport: Arc<dyn Transport>,
        probe: Arc<dyn EnvironmentProbe>,
    ) -> Self {
        // Opt-out: a do-not-track signal disables the tracker entirely
        let enabled = !(config.respect_do_not_track && probe.do_not_track());
        if !enabled {
            tracing::debug!("do-not-track signal present, tracker disabled");
        }

        let now = clock.now();
        let sessions = SessionManager::new(clock.clone(), store, config.session_duration);
        Self {
            inner: Arc::new(TrackerInner {
                config,
                enabled,
                clock,
                sessions,
                transport,
                probe,
                state: Mutex::new(TrackerState {
                    visibility: Visibility::Visible,
                    view_start: now,
                    last_activity: now,
                    paused: false,
                    scroll: ScrollDepth::new(),
                    heartbeat: None,
                }),
            }),
        }
    }

    /// Whether this tracker will ever send anything
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled
    }

    /// Begin tracking: emit the initial page view and start the heartbeat
    pub fn start(&self) {
        if !self.inner.enabled {
            return;
        }
        self.record_page_view();
        self.start_heartbeat();
    }

    /// Bind to a navigation source; every route change flushes a page view
    pub fn observe_navigation(&self, observer: &dyn NavigationObserver) {
        if !self.inner.enabled {
            return;
        }
        let tracker = self.clone();
        observer.on_route_change(Arc::new(move |_path| {
            tracker.record_page_view();
        }));
    }

    // ============================================
    // Core operations
    // ============================================

    /// Flush a page view for the current view and restart its clock
    pub fn record_page_view(&self) {
        if !self.active() {
            return;
        }
        let now = self.inner.clock.now();
        let duration = {
            let mut state = self.inner.state.lock().expect("tracker poisoned");
            let elapsed = elapsed_seconds(state.view_start, now);
            state.view_start = now;
            state.last_activity = now;
            elapsed
        };

        let mut payload = self.base_payload(true);
        payload.referrer = self.inner.probe.referrer();
        payload.duration = Some(duration);
        self.inner.transport.deliver(payload);
        self.inner.sessions.touch();
    }

    /// Send a named custom event. Does not reset the view clock.
    pub fn record_event(&self, name: impl Into<String>, data: serde_json::Value) {
        if !self.active() {
            return;
        }
        let now = self.inner.clock.now();
        {
            let mut state = self.inner.state.lock().expect("tracker poisoned");
            state.last_activity = now;
        }

        let mut payload = self.base_payload(true);
        payload.event_name = Some(name.into());
        payload.event_data = Some(data);
        self.inner.transport.deliver(payload);
        self.inner.sessions.touch();
    }

    /// One heartbeat interval elapsed. Suppressed for abandoned tabs:
    /// no payload when the user has been inactive for two intervals.
    pub fn heartbeat_tick(&self) {
        if !self.active() {
            return;
        }
        let now = self.inner.clock.now();
        let duration = {
            let state = self.inner.state.lock().expect("tracker poisoned");
            if state.visibility == Visibility::Hidden {
                return;
            }
            let idle = (now - state.last_activity).num_milliseconds();
            let window = 2 * self.inner.config.heartbeat_interval.as_millis() as i64;
            if idle > window {
                return;
            }
            elapsed_seconds(state.view_start, now)
        };

        // Heartbeats skip the performance snapshot; it only describes the
        // initial load
        let mut payload = self.base_payload(false);
        payload.event_name = Some("heartbeat".to_string());
        payload.duration = Some(duration);
        self.inner.transport.deliver(payload);
    }

    /// A user interaction happened (click/scroll/keypress/mousemove/touch)
    pub fn activity(&self) {
        if !self.inner.enabled {
            return;
        }
        let now = self.inner.clock.now();
        self.inner
            .state
            .lock()
            .expect("tracker poisoned")
            .last_activity = now;
        self.inner.sessions.touch();
    }

    // ============================================
    // Auto-tracking hooks
    // ============================================

    /// Feed a scroll position in percent of the document height
    pub fn scroll(&self, percent: u8) {
        if !self.active() {
            return;
        }
        self.activity();
        let crossed = {
            let now = self.inner.clock.now();
            let mut state = self.inner.state.lock().expect("tracker poisoned");
            state.scroll.observe(percent, now)
        };
        for depth in crossed {
            self.record_event("scroll_depth", json!({ "depth": depth }));
        }
    }

    /// A link was clicked. External links and file downloads each produce
    /// a one-shot event; a download of an external file produces both.
    pub fn link_clicked(&self, href: &str, text: &str) {
        if !self.active() {
            return;
        }
        let page_host = self.inner.probe.domain().unwrap_or_default();
        if let Some(event) = auto::external_link(href, text, &page_host) {
            self.record_event(event.name(), event.data());
        }
        if let Some(event) = auto::file_download(href) {
            self.record_event(event.name(), event.data());
        }
    }

    /// A form was submitted
    pub fn form_submitted(&self, action: Option<&str>, method: Option<&str>) {
        if !self.active() {
            return;
        }
        let path = self.inner.probe.path();
        let event = auto::form_submit(action, method, &path);
        self.record_event(event.name(), event.data());
    }

    // ============================================
    // Lifecycle
    // ============================================

    /// Page visibility changed. Entering hidden flushes the current view and
    /// stops the heartbeat; returning restarts both clocks.
    pub fn visibility_changed(&self, hidden: bool) {
        if !self.inner.enabled {
            return;
        }
        if hidden {
            {
                let mut state = self.inner.state.lock().expect("tracker poisoned");
                if state.visibility == Visibility::Hidden {
                    return;
                }
                state.visibility = Visibility::Hidden;
            }
            self.record_page_view();
            self.stop_heartbeat();
        } else {
            let now = self.inner.clock.now();
            {
                let mut state = self.inner.state.lock().expect("tracker poisoned");
                if state.visibility == Visibility::Visible {
                    return;
                }
                state.visibility = Visibility::Visible;
                state.view_start = now;
            }
            self.start_heartbeat();
        }
    }

    /// Stop tracking at runtime; nothing is sent until resume
    pub fn pause(&self) {
        self.inner.state.lock().expect("tracker poisoned").paused = true;
        self.stop_heartbeat();
    }

    /// Resume tracking; restarts the heartbeat without duplicating timers
    pub fn resume(&self) {
        if !self.inner.enabled {
            return;
        }
        self.inner.state.lock().expect("tracker poisoned").paused = false;
        self.start_heartbeat();
    }

    // ============================================
    // Internals
    // ============================================

    fn active(&self) -> bool {
        self.inner.enabled && !self.inner.state.lock().expect("tracker poisoned").paused
    }

    fn base_payload(&self, include_performance: bool) -> TrackPayload {
        let probe = &self.inner.probe;
        let screen = probe.screen();
        let locale = probe.locale();
        TrackPayload {
            website_id: self.inner.config.website_id,
            domain: probe.domain(),
            path: probe.path(),
            session_id: Some(self.inner.sessions.current_id()),
            timestamp: Some(self.inner.clock.now()),
            screen_width: screen.screen_width,
            screen_height: screen.screen_height,
            viewport_width: screen.viewport_width,
            viewport_height: screen.viewport_height,
            color_depth: screen.color_depth,
            pixel_ratio: screen.pixel_ratio,
            language: locale.language,
            timezone: locale.timezone,
            timezone_offset: locale.timezone_offset,
            connection: probe.connection(),
            performance: if include_performance {
                probe.performance()
            } else {
                None
            },
            ..Default::default()
        }
    }

    fn start_heartbeat(&self) {
        let mut state = self.inner.state.lock().expect("tracker poisoned");
        if state.heartbeat.is_some() {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        let interval = self.inner.config.heartbeat_interval;
        state.heartbeat = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of a tokio interval completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                Tracker { inner }.heartbeat_tick();
            }
        }));
    }

    fn stop_heartbeat(&self) {
        let handle = self
            .inner
            .state
            .lock()
            .expect("tracker poisoned")
            .heartbeat
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

/// Whole seconds between two instants, rounded to nearest
fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    ((to - from).num_milliseconds() as f64 / 1000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::TrackerConfigBuilder;
    use crate::navigation::HistoryObserver;
    use crate::probe::FixedProbe;
    use crate::session::MemoryStore;
    use crate::transport::RecordingTransport;
    use chrono::Duration as ChronoDuration;
    use std::time::Duration;

    struct Harness {
        tracker: Tracker,
        clock: ManualClock,
        transport: RecordingTransport,
    }

    fn harness(probe: FixedProbe) -> Harness {
        let clock = ManualClock::default();
        let transport = RecordingTransport::new();
        let config = TrackerConfigBuilder::new("http://localhost:3000/api/track")
            .heartbeat_interval(Duration::from_secs(15))
            .build();
        let tracker = Tracker::new(
            config,
            Arc::new(clock.clone()),
            Arc::new(MemoryStore::new()),
            Arc::new(transport.clone()),
            Arc::new(probe),
        );
        Harness {
            tracker,
            clock,
            transport,
        }
    }

    #[test]
    fn test_page_view_resets_view_clock() {
        let h = harness(FixedProbe::at("/").with_domain("example.com"));

        h.clock.advance(ChronoDuration::seconds(90));
        h.tracker.record_page_view();
        h.clock.advance(ChronoDuration::seconds(30));
        h.tracker.record_page_view();

        let sent = h.transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].duration, Some(90));
        assert_eq!(sent[1].duration, Some(30));
        assert_eq!(sent[0].path, "/");
        assert_eq!(sent[0].domain.as_deref(), Some("example.com"));
        assert!(sent[0].session_id.is_some());
        assert!(sent[0].event_name.is_none());
    }

    #[test]
    fn test_custom_event_keeps_view_clock() {
        let h = harness(FixedProbe::at("/pricing"));

        h.clock.advance(ChronoDuration::seconds(20));
        h.tracker.record_event("signup_click", json!({"plan": "pro"}));
        h.clock.advance(ChronoDuration::seconds(20));
        h.tracker.record_page_view();

        let sent = h.transport.sent();
        assert_eq!(sent[0].event_name.as_deref(), Some("signup_click"));
        assert_eq!(sent[0].duration, None);
        // The event did not reset the view clock
        assert_eq!(sent[1].duration, Some(40));
    }

    #[test]
    fn test_heartbeat_suppressed_when_idle() {
        let h = harness(FixedProbe::at("/"));

        // Inactive for more than two intervals: suppressed
        h.clock.advance(ChronoDuration::seconds(31));
        h.tracker.heartbeat_tick();
        assert!(h.transport.sent().is_empty());

        // Activity makes the next tick fire again
        h.tracker.activity();
        h.clock.advance(ChronoDuration::seconds(15));
        h.tracker.heartbeat_tick();
        let sent = h.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event_name.as_deref(), Some("heartbeat"));
        assert_eq!(sent[0].duration, Some(46));
    }

    #[tokio::test]
    async fn test_hidden_flushes_and_silences() {
        let h = harness(FixedProbe::at("/article"));

        h.clock.advance(ChronoDuration::seconds(12));
        h.tracker.visibility_changed(true);

        // Entering hidden flushed the just-ended view
        let sent = h.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].duration, Some(12));

        // While hidden the heartbeat emits nothing
        h.tracker.heartbeat_tick();
        assert_eq!(h.transport.sent().len(), 1);

        // Returning restarts the elapsed-time clock
        h.clock.advance(ChronoDuration::seconds(600));
        h.tracker.visibility_changed(false);
        h.clock.advance(ChronoDuration::seconds(5));
        h.tracker.record_page_view();
        let sent = h.transport.sent();
        assert_eq!(sent.last().unwrap().duration, Some(5));
    }

    #[tokio::test]
    async fn test_pause_and_resume() {
        let h = harness(FixedProbe::at("/"));

        h.tracker.pause();
        h.tracker.record_page_view();
        h.tracker.record_event("ignored", json!({}));
        h.tracker.heartbeat_tick();
        assert!(h.transport.sent().is_empty());

        h.tracker.resume();
        h.tracker.record_page_view();
        assert_eq!(h.transport.sent().len(), 1);
    }

    #[test]
    fn test_do_not_track_disables_everything() {
        let h = harness(FixedProbe::at("/").with_do_not_track(true));

        assert!(!h.tracker.is_enabled());
        h.tracker.start();
        h.tracker.record_page_view();
        h.tracker.record_event("anything", json!({}));
        h.tracker.scroll(80);
        assert!(h.transport.sent().is_empty());
    }

    #[test]
    fn test_scroll_thresholds_fire_once_per_lifetime() {
        let h = harness(FixedProbe::at("/long-read"));

        h.tracker.scroll(30);
        h.clock.advance(ChronoDuration::seconds(2));
        h.tracker.scroll(10);
        h.clock.advance(ChronoDuration::seconds(2));
        h.tracker.scroll(30); // re-crossing 25 must not re-fire
        h.clock.advance(ChronoDuration::seconds(2));
        h.tracker.scroll(95);

        let depths: Vec<i64> = h
            .transport
            .sent()
            .iter()
            .filter(|p| p.event_name.as_deref() == Some("scroll_depth"))
            .map(|p| p.event_data.as_ref().unwrap()["depth"].as_i64().unwrap())
            .collect();
        assert_eq!(depths, vec![25, 50, 75, 90]);
    }

    #[test]
    fn test_link_click_classification() {
        let h = harness(FixedProbe::at("/downloads").with_domain("example.com"));

        h.tracker.link_clicked("https://example.com/about", "About us");
        assert!(h.transport.sent().is_empty());

        h.tracker
            .link_clicked("https://cdn.example.net/manual.pdf", "Manual");
        let names: Vec<String> = h
            .transport
            .sent()
            .iter()
            .filter_map(|p| p.event_name.clone())
            .collect();
        // An external file download produces both events
        assert_eq!(names, vec!["external_link_click", "file_download"]);
    }

    #[test]
    fn test_form_submit_event() {
        let h = harness(FixedProbe::at("/signup"));
        h.tracker.form_submitted(None, Some("post"));

        let sent = h.transport.sent();
        assert_eq!(sent[0].event_name.as_deref(), Some("form_submit"));
        assert_eq!(sent[0].event_data.as_ref().unwrap()["action"], "/signup");
        assert_eq!(sent[0].event_data.as_ref().unwrap()["method"], "POST");
    }

    #[tokio::test]
    async fn test_route_change_flushes_page_view() {
        let h = harness(FixedProbe::at("/").with_domain("example.com"));
        let observer = HistoryObserver::new("/");

        h.tracker.observe_navigation(&observer);
        observer.push("/next");
        tokio::task::yield_now().await;

        let sent = h.transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].event_name.is_none());
    }

    #[tokio::test]
    async fn test_start_emits_initial_page_view_and_heartbeat_task() {
        let h = harness(FixedProbe::at("/"));
        h.tracker.start();
        assert_eq!(h.transport.sent().len(), 1);

        // Stopping twice must not panic and resume must not duplicate tasks
        h.tracker.pause();
        h.tracker.pause();
        h.tracker.resume();
        h.tracker.resume();
    }
}
