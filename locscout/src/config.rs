use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::encoding::{TextEncoding, DEFAULT_ENCODINGS};
use crate::filters::FileSelector;
use crate::store::SearchCase;

/// Database file used when nothing else is configured
pub const DEFAULT_DB_PATH: &str = "xcom2_mods.db";

/// Configuration for scanning and storing abilities.
///
/// # Configuration Locations
///
/// Sources are layered, later ones overriding earlier ones:
/// 1. Global `$CONFIG_DIR/locscout/config.yaml`
/// 2. Local `.locscout.yaml` in the current directory
/// 3. Custom config file specified via `--config` flag (must exist)
///
/// Command-line flags are applied last through [`ScanConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// # Directory holding the mods to scan
/// root_path: "C:/Program Files (x86)/Steam/steamapps/workshop/content/268500"
///
/// # Which files to parse: by extension or by exact file name
/// selector:
///   mode: extension
///   value: int
///
/// # Glob patterns to skip
/// ignore_patterns:
///   - "**/Backup/**"
///
/// # SQLite database receiving the merged records
/// db_path: "xcom2_mods.db"
///
/// # Encodings to try, in order
/// encodings: [utf-8-sig, utf-16, cp1252, latin-1]
///
/// # Substring search case handling (insensitive, sensitive)
/// search_case: insensitive
///
/// # Thread count (default: CPU cores)
/// thread_count: 4
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Root directory to scan
    pub root_path: PathBuf,

    /// Which files are localization files
    pub selector: FileSelector,

    /// Patterns to ignore (glob syntax)
    pub ignore_patterns: Vec<String>,

    /// Candidate encodings in priority order
    pub encodings: Vec<TextEncoding>,

    /// Number of worker threads for parsing
    /// Defaults to number of CPU cores if not specified
    pub thread_count: NonZeroUsize,

    /// SQLite database path
    pub db_path: PathBuf,

    /// How `list` matches its search term
    pub search_case: SearchCase,

    /// Show a progress bar while scanning
    pub show_progress: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("."),
            selector: FileSelector::default(),
            ignore_patterns: Vec::new(),
            encodings: DEFAULT_ENCODINGS.to_vec(),
            thread_count: default_thread_count(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            search_case: SearchCase::default(),
            show_progress: false,
            log_level: default_log_level(),
        }
    }
}

/// Values given on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_path: Option<PathBuf>,
    pub selector: Option<FileSelector>,
    pub ignore_patterns: Vec<String>,
    pub thread_count: Option<NonZeroUsize>,
    pub db_path: Option<PathBuf>,
    pub search_case: Option<SearchCase>,
    pub show_progress: bool,
    pub log_level: Option<String>,
}

impl ScanConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let default_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("locscout/config.yaml")),
            // Local config
            Some(PathBuf::from(".locscout.yaml")),
        ];

        for path in default_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file has to exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Applies command-line values on top of the loaded configuration
    pub fn merge_with_cli(mut self, cli: ConfigOverrides) -> Self {
        if let Some(root_path) = cli.root_path {
            self.root_path = root_path;
        }
        if let Some(selector) = cli.selector {
            self.selector = selector;
        }
        if !cli.ignore_patterns.is_empty() {
            self.ignore_patterns = cli.ignore_patterns;
        }
        if let Some(thread_count) = cli.thread_count {
            self.thread_count = thread_count;
        }
        if let Some(db_path) = cli.db_path {
            self.db_path = db_path;
        }
        if let Some(search_case) = cli.search_case {
            self.search_case = search_case;
        }
        if cli.show_progress {
            self.show_progress = true;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }
}
