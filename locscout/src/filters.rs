/// File selection for discovery.
///
/// Mods ship their localization as `Localization/XComGame.int` (or another
/// `.int` file per package), so a selector either names the file exactly or
/// picks everything with a given extension. Both comparisons ignore case;
/// Windows-authored mods are inconsistent about it.
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extension used by XCOM 2 English localization files
pub const DEFAULT_EXTENSION: &str = "int";

/// Which files discovery hands to the parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "value")]
pub enum FileSelector {
    /// Exact file name, e.g. `XComGame.int`
    FileName(String),
    /// File extension without the dot, e.g. `int`
    Extension(String),
}

impl Default for FileSelector {
    fn default() -> Self {
        FileSelector::Extension(DEFAULT_EXTENSION.to_string())
    }
}

impl FileSelector {
    /// Whether `path` is selected
    pub fn matches(&self, path: &Path) -> bool {
        match self {
            FileSelector::FileName(name) => path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.eq_ignore_ascii_case(name)),
            FileSelector::Extension(ext) => has_extension(path, ext),
        }
    }
}

/// Checks the extension case-insensitively; a leading dot in `ext` is ignored
pub fn has_extension(path: &Path, ext: &str) -> bool {
    let wanted = ext.trim_start_matches('.');
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
}

/// Checks if a file should be ignored based on ignore patterns
pub fn should_ignore(path: &Path, ignore_patterns: &[String]) -> bool {
    let normalized_path = path.to_string_lossy().replace('\\', "/");

    ignore_patterns.iter().any(|pattern| match Pattern::new(pattern) {
        Ok(p) => p.matches(&normalized_path),
        Err(_) => false,
    })
}

/// Determines if a file should be scanned
pub fn should_include_file(path: &Path, selector: &FileSelector, ignore_patterns: &[String]) -> bool {
    selector.matches(path) && !should_ignore(path, ignore_patterns)
}
