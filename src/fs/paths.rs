//! Staging directory management.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Build the path of a staged file.
///
/// `stem` must already be sanitized; the result always lives directly inside
/// `staging_dir`.
pub fn staged_path(staging_dir: &Path, stem: &str, extension: &str) -> Result<PathBuf> {
    if stem.is_empty() || stem.contains(['/', '\\', '\0']) {
        return Err(Error::InvalidName(format!(
            "Refusing to stage unsanitized name: '{}'",
            stem
        )));
    }

    let path = staging_dir.join(format!("{}.{}", stem, extension));
    debug_assert_eq!(path.parent(), Some(staging_dir));
    Ok(path)
}

/// Remove a staged file.
pub async fn remove_staged(path: &Path) -> Result<()> {
    tokio::fs::remove_file(path)
        .await
        .map_err(|source| Error::Cleanup {
            path: path.display().to_string(),
            source,
        })
}

/// Whether a file exists and has content.
pub async fn is_non_empty_file(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}
