//! Filename sanitization.

use md5::{Digest, Md5};

use crate::error::{Error, Result};

/// Number of hex characters of the content hash appended by [`hashed_stem`].
const HASH_SUFFIX_LEN: usize = 8;

/// Strip the final extension from a filename.
///
/// A leading dot (as in `.pdf`) is not treated as an extension separator.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}

/// Map a filename stem onto `[A-Za-z0-9_.-]`, replacing everything else with `_`.
///
/// Deterministic and idempotent. Distinct inputs may map to the same output.
pub fn sanitize(stem: &str) -> Result<String> {
    if stem.is_empty() {
        return Err(Error::InvalidName("Filename cannot be empty".to_string()));
    }

    Ok(stem
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '_' | '.' | '-' => c,
            _ => '_',
        })
        .collect())
}

/// Sanitize a user supplied filename after dropping its extension.
pub fn sanitized_stem(original: &str) -> Result<String> {
    sanitize(strip_extension(original))
}

/// Append a short content hash to a sanitized stem.
///
/// Given `"report"` and some bytes, produces `"report_1a2b3c4d"`.
pub fn hashed_stem(stem: &str, content: &[u8]) -> String {
    let digest = Md5::digest(content);
    let hex = format!("{:x}", digest);
    format!("{}_{}", stem, &hex[..HASH_SUFFIX_LEN])
}

/// Whether a declared filename carries the given extension (ASCII case-insensitive).
pub fn has_extension(name: &str, extension: &str) -> bool {
    match name.rfind('.') {
        Some(pos) if pos > 0 => name[pos + 1..].eq_ignore_ascii_case(extension),
        _ => false,
    }
}
