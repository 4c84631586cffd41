/// Record and result types produced by a scan.
///
/// An [`AbilityRecord`] is one `[<Name> X2AbilityTemplate]` block. Every text
/// field is independent: a record parsed from one file may only carry a help
/// text, while the friendly name it will be merged with came from another
/// file entirely. Empty strings and the `"Unknown"` friendly name mean "not
/// observed", which is what lets the store merge partial records without
/// erasing data (see [`crate::store::merge_record`]).
///
/// Ownership is simple: each worker builds its own `Vec<AbilityRecord>` and
/// hands it back by value inside a [`FileResult`]; nothing is shared while the
/// files are being parsed.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Placeholder friendly name for a template whose `LocFriendlyName` has not
/// been seen yet
pub const UNKNOWN_FRIENDLY_NAME: &str = "Unknown";

/// A single ability definition, either freshly parsed or loaded from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityRecord {
    /// Template identifier from the block header, unique across the store
    pub template_name: String,
    /// `LocFriendlyName`, or [`UNKNOWN_FRIENDLY_NAME`]
    pub friendly_name: String,
    /// `LocLongDescription`
    pub description: String,
    /// `LocHelpText`
    pub help_text: String,
    /// `LocPromotionPopupText`
    pub promotion_text: String,
    /// `LocFlyoverText`
    pub flyover_text: String,
    /// The last file that contributed to this record
    pub source_file: PathBuf,
}

impl AbilityRecord {
    /// Creates a record with default values, as produced by a bare header
    pub fn new(template_name: impl Into<String>, source_file: impl Into<PathBuf>) -> Self {
        Self {
            template_name: template_name.into(),
            friendly_name: UNKNOWN_FRIENDLY_NAME.to_string(),
            description: String::new(),
            help_text: String::new(),
            promotion_text: String::new(),
            flyover_text: String::new(),
            source_file: source_file.into(),
        }
    }
}

/// A friendly name counts as data only if it is neither empty nor the sentinel
pub fn is_valid_friendly_name(name: &str) -> bool {
    !name.is_empty() && name != UNKNOWN_FRIENDLY_NAME
}

/// Records parsed from a single file
#[derive(Debug, Clone)]
pub struct FileResult {
    /// The path to the file
    pub path: PathBuf,
    /// Records in the order their headers appear in the file
    pub records: Vec<AbilityRecord>,
    /// False when the file could not be read or decoded at all
    pub decoded: bool,
}

impl FileResult {
    /// A file that contributed nothing because it could not be read
    pub fn failed(path: PathBuf) -> Self {
        Self {
            path,
            records: Vec::new(),
            decoded: false,
        }
    }
}

/// The complete output of a scan
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    /// All records, in file discovery order then header order
    pub records: Vec<AbilityRecord>,
    /// Total number of files handed to the parser
    pub files_scanned: usize,
    /// Files that yielded at least one record
    pub files_with_records: usize,
    /// Files that could not be read or decoded
    pub files_failed: usize,
}

impl ScanOutput {
    /// Creates a new empty scan output
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends a file's records and updates statistics
    pub fn add_file_result(&mut self, file_result: FileResult) {
        self.files_scanned += 1;
        if !file_result.decoded {
            self.files_failed += 1;
        }
        if !file_result.records.is_empty() {
            self.files_with_records += 1;
        }
        self.records.extend(file_result.records);
    }
}
