//! Upload validation. Pure predicate over the declared media type and the
//! client-supplied filename.

use thiserror::Error;

pub const ALLOWED_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".gif"];

/// Why an upload was turned away. The `Display` text is what the client sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Only image files are allowed.")]
    InvalidMediaType,
    #[error("File extension not allowed. Only .png, .jpg, .jpeg, .gif are allowed.")]
    InvalidExtension,
}

/// Accept only `image/*` uploads whose filename carries an allowed extension.
///
/// The media type is checked first, so a file failing both checks reports
/// `InvalidMediaType`.
pub fn validate(content_type: &str, filename: &str) -> Result<(), Rejection> {
    if !content_type.starts_with("image/") {
        return Err(Rejection::InvalidMediaType);
    }

    let lowered = filename.to_lowercase();
    if !ALLOWED_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext)) {
        return Err(Rejection::InvalidExtension);
    }

    Ok(())
}
