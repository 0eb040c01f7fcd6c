//! Data shapes for uploads and listings.
//!
//! Domain records (`UploadedObject`) stay in native units; the response types
//! carry the exact JSON the HTTP surface returns.

pub mod listing;
pub mod object;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Size in mebibytes, as reported by the JSON responses.
pub fn bytes_to_mb(size_bytes: u64) -> f64 {
    size_bytes as f64 / BYTES_PER_MB
}
