//! Core types and storage for pagevault.
//!
//! This crate provides:
//! - The versioned snapshot store and redirect table over SQLite
//! - Reverse-timestamp key encoding
//! - Unified error types
//! - Configuration structures

pub mod archive;
pub mod config;
pub mod error;

pub use archive::{ArchiveDb, RedirectRecord, SnapshotContent, SnapshotMeta, SnapshotRecord};
pub use config::AppConfig;
pub use error::Error;
