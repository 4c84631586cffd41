use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::{unify_path, ScanError, ScanResult};
use crate::filters::{should_include_file, FileSelector};

/// Recursively lists the files under `root` that `selector` picks, sorted by path.
///
/// A missing or unreadable root is an error; a root with nothing to scan is an
/// empty list.
pub fn discover(
    root: &Path,
    selector: &FileSelector,
    ignore_patterns: &[String],
) -> ScanResult<Vec<PathBuf>> {
    let metadata = std::fs::metadata(root)
        .map_err(|e| ScanError::discovery_failed(root, e.to_string()))?;
    if !metadata.is_dir() {
        return Err(ScanError::discovery_failed(root, "not a directory"));
    }
    std::fs::read_dir(root).map_err(|e| ScanError::discovery_failed(root, e.to_string()))?;

    let root = unify_path(root);
    debug!("Discovering {:?} under {}", selector, root.display());

    // Mod folders are rarely repositories, and a stray .gitignore must not hide localization.
    // Dot-files and dot-directories are walked like everything else.
    let mut walker = WalkBuilder::new(&root);
    walker
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .follow_links(false);

    let mut files: Vec<PathBuf> = walker
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| should_include_file(entry.path(), selector, ignore_patterns))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    debug!("Found {} files to scan", files.len());
    Ok(files)
}
