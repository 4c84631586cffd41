/// Error types for locscout.
///
/// Only a few of these ever reach the caller of a scan. Per-file problems
/// (unreadable files, files no candidate encoding can decode) are logged and
/// recovered where they happen, so a broken mod file costs its own records and
/// nothing else:
///
/// ```rust,ignore
/// match pipeline::scan_and_store(&config, &mut store) {
///     Ok(summary) => println!("{} records", summary.count),
///     Err(ScanError::DiscoveryFailed { path, .. }) => // misconfigured root,
///     Err(e) => // other errors
/// }
/// ```
///
/// `DiscoveryFailed` is separate from an empty scan: a root that
/// does not exist is a configuration problem, a root with no `.int` files is
/// just an empty mod set.
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for scan and store operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while scanning, parsing or storing abilities
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Cannot scan {path}: {reason}")]
    DiscoveryFailed { path: PathBuf, reason: String },
    #[error("No candidate encoding could decode {path}")]
    EncodingExhausted { path: PathBuf },
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Database error: {0}")]
    Persistence(#[from] rusqlite::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Canonicalize the path and strip UNC prefixes so that
/// comparisons on Windows are consistent.
pub fn unify_path(original: &Path) -> PathBuf {
    let canonical = original
        .canonicalize()
        .unwrap_or_else(|_| original.to_path_buf());
    strip_unc_prefix(&canonical)
}

/// Strips the Windows UNC prefix (\\?\) from a path if present
fn strip_unc_prefix(p: &Path) -> PathBuf {
    let s = p.display().to_string();
    if let Some(stripped) = s.strip_prefix(r"\\?\") {
        PathBuf::from(stripped)
    } else {
        p.to_path_buf()
    }
}

impl ScanError {
    pub fn discovery_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DiscoveryFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn encoding_exhausted(path: impl Into<PathBuf>) -> Self {
        Self::EncodingExhausted { path: path.into() }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Maps an IO error from opening `path` onto the more specific variants
    pub fn from_io(path: &Path, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(e),
        }
    }
}
