//! Storage key generation.

use uuid::Uuid;

/// Extension of the final path component, dot included, case preserved.
/// Names whose only dot is the leading one (`.png`) have no extension.
pub fn extension(filename: &str) -> &str {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match base.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < base.len() => &base[idx..],
        _ => "",
    }
}

/// 32 random hex characters followed by the original extension.
///
/// Uniqueness rests on the randomness of the identifier; there is no
/// collision check.
pub fn generate_key(original_name: &str) -> String {
    format!("{}{}", Uuid::new_v4().simple(), extension(original_name))
}
