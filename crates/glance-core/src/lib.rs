// Core Tracking Abstractions
//
// This crate holds the pieces of the pipeline that both the ingestion API and
// the session tracker agree on:
//
// - TrackPayload: the wire shape a tracker sends and the server validates
// - LiveMessage: the frames pushed to live dashboard subscribers
// - Enrichment seams: user-agent parsing and IP geolocation behind traits,
//   with concrete woothee / maxminddb implementations
//
// Key design decisions:
// - Enrichment never fails a request: unknowns degrade to "Unknown"/"desktop"
//   and an unresolvable country is simply None
// - Payload kind (page-view vs custom event) is decided solely by the
//   presence of event_name; the two branches are mutually exclusive

pub mod enrich;
pub mod error;
pub mod live;
pub mod payload;

// Re-exports for convenience
pub use enrich::{ClientInfo, GeoResolver, MaxmindGeo, NoopGeo, UserAgentParser, WootheeParser};
pub use error::{Result, TrackError};
pub use live::LiveMessage;
pub use payload::{ConnectionInfo, PayloadKind, PerformanceInfo, TrackPayload};
