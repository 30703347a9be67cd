//! Filesystem module.
//!
//! Provides:
//! - Filename sanitization
//! - Staging directory and staged file management

pub mod naming;
pub mod paths;

pub use naming::{has_extension, hashed_stem, sanitize, sanitized_stem, strip_extension};
pub use paths::{ensure_dir, is_non_empty_file, remove_staged, staged_path};
