// Postgres storage layer with sqlx
//
// This crate persists enriched tracking records and owns website identity:
// - Websites are resolved by id, or upserted by domain on first sight
// - Page views and custom events are immutable append-only rows

pub mod models;
pub mod repositories;

pub use models::*;
pub use repositories::Database;
