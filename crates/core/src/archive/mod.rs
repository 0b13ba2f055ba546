//! SQLite-backed versioned snapshot archive.
//!
//! Two ordered tables, both clustered on their key so the substrate gives
//! ordered forward range scans:
//!
//! - `snapshots`, keyed by `(url, fetched_at_rev_ts)`: reverse-timestamp
//!   encoding makes ascending key order descending fetch-time order
//! - `redirects`, keyed by `url`: the single-hop resolution overlay
//!
//! Async access via tokio-rusqlite, WAL mode, versioned schema migrations.

pub mod connection;
pub mod keys;
pub mod migrations;
pub mod redirects;
pub mod snapshots;

pub use crate::Error;

pub use connection::ArchiveDb;
pub use redirects::RedirectRecord;
pub use snapshots::{SnapshotContent, SnapshotMeta, SnapshotRecord};
