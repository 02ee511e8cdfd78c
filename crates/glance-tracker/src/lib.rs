// Session Tracker
//
// A host-agnostic implementation of the client-side tracking protocol:
// decide what to send and when, while never blocking or surfacing errors
// to the page that embeds it.
//
// Key design decisions:
// - Every environment touchpoint sits behind a trait: Clock (time),
//   SessionStore (tab-scoped storage), Transport (fire-and-forget delivery),
//   NavigationObserver (route changes), EnvironmentProbe (page snapshots).
//   In-memory implementations make the whole protocol unit-testable.
// - Session identity is an idle-bounded correlation key, minted fresh once
//   the stored session exceeds the expiry window, never explicitly destroyed.
// - The heartbeat runs on a cancelable tokio task and is suppressed when the
//   user has been inactive for two intervals.
// - Scroll depth keeps a monotonic high-water mark; each threshold fires at
//   most once per tracker lifetime.
// - Delivery failures are swallowed; tracking must never interrupt the host.

pub mod auto;
pub mod clock;
pub mod config;
pub mod navigation;
pub mod probe;
pub mod scroll;
pub mod session;
pub mod tracker;
pub mod transport;

// Re-exports for convenience
pub use auto::AutoEvent;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{TrackerConfig, TrackerConfigBuilder};
pub use navigation::{HistoryObserver, NavigationObserver, RouteListener};
pub use probe::{EnvironmentProbe, FixedProbe, LocaleSnapshot, ScreenSnapshot};
pub use scroll::ScrollDepth;
pub use session::{MemoryStore, SessionManager, SessionStore};
pub use tracker::{Tracker, Visibility};
pub use transport::{HttpTransport, RecordingTransport, Transport};
