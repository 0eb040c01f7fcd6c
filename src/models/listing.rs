//! Represents one row of the `/recent` listing.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::bytes_to_mb;

/// Read-only projection of a stored object, rebuilt on every request.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ListingEntry {
    /// Storage key of the object.
    pub filename: String,

    pub size_bytes: u64,

    /// Seconds since the Unix epoch, with sub-second precision.
    pub modified_time: f64,

    pub size_mb: f64,

    /// Where a client can fetch the object.
    pub url: String,
}

impl ListingEntry {
    pub fn new(key: String, size_bytes: u64, modified: DateTime<Utc>, url: String) -> Self {
        Self {
            filename: key,
            size_bytes,
            modified_time: modified.timestamp_micros() as f64 / 1_000_000.0,
            size_mb: bytes_to_mb(size_bytes),
            url,
        }
    }
}

/// Body of `GET /recent`.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RecentImages {
    pub images: Vec<ListingEntry>,
}
