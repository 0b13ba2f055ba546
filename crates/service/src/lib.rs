//! Snapshot service orchestration for pagevault.
//!
//! Exposes the operations the outer surfaces call: take a snapshot, read
//! metadata or content by url (latest or exact timestamp), list history.

pub mod service;

pub use service::{PUBLIC_CONTENT_KEY, SnapshotService, content_key_for};
