//! Fetch collaborator for pagevault.
//!
//! This crate provides the HTTP fetch pipeline and the HTML metadata
//! extraction that together produce the page records the snapshot service
//! ingests.

pub mod extract;
pub mod fetch;

pub use extract::{PageMeta, page_meta};
pub use fetch::{FetchClient, FetchConfig, FetchResponse, FetchedPage, canonicalize};
