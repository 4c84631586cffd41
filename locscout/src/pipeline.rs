use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info};

use crate::config::ScanConfig;
use crate::encoding::EncodingReader;
use crate::errors::ScanResult;
use crate::parser;
use crate::results::AbilityRecord;
use crate::scan;
use crate::store::{AbilityStore, StoredAbility};

/// Outcome of a scan-and-store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Success,
    Error,
}

/// What `scan` reports back to its caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub status: ScanStatus,
    /// Records handed to the store
    pub count: usize,
    pub files_scanned: usize,
    pub files_failed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanSummary {
    pub fn is_success(&self) -> bool {
        self.status == ScanStatus::Success
    }
}

/// Scans `config.root_path` and merges every record found into `store`.
///
/// Fails only if the root cannot be walked. A store failure rolls the batch
/// back and is reported through [`ScanStatus::Error`].
pub fn scan_and_store(config: &ScanConfig, store: &mut AbilityStore) -> ScanResult<ScanSummary> {
    let output = scan::scan(config)?;
    let count = output.records.len();

    let (status, error) = match store.upsert(&output.records) {
        Ok(_) => {
            info!("Stored {} records from {}", count, config.root_path.display());
            (ScanStatus::Success, None)
        }
        Err(e) => {
            error!("Failed to store {} records: {}", count, e);
            (ScanStatus::Error, Some(e.to_string()))
        }
    };

    Ok(ScanSummary {
        status,
        count,
        files_scanned: output.files_scanned,
        files_failed: output.files_failed,
        error,
    })
}

/// Returns stored records matching `search`, or all of them
pub fn list(store: &AbilityStore, search: Option<&str>) -> ScanResult<Vec<StoredAbility>> {
    store.query(search)
}

/// Parses a single file without touching the store.
///
/// Unlike a scan, read and decode failures are returned to the caller.
pub fn parse_file(config: &ScanConfig, path: &Path) -> ScanResult<Vec<AbilityRecord>> {
    let decoded = EncodingReader::new(config.encodings.clone()).read_file(path)?;
    Ok(parser::parse(&decoded.lines, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_scan_and_store_reports_count() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("XComGame.int"),
            "[A X2AbilityTemplate]\n+LocFriendlyName=\"Alpha\"\n[B X2AbilityTemplate]\n",
        )
        .unwrap();

        let config = ScanConfig {
            root_path: dir.path().to_path_buf(),
            ..ScanConfig::default()
        };
        let mut store = AbilityStore::open_in_memory().unwrap();

        let summary = scan_and_store(&config, &mut store).unwrap();
        assert!(summary.is_success());
        assert_eq!(summary.count, 2);
        assert_eq!(summary.files_scanned, 1);
        assert_eq!(list(&store, None).unwrap().len(), 2);
        assert_eq!(list(&store, Some("alpha")).unwrap().len(), 1);
    }

    #[test]
    fn test_summary_json_shape() {
        let summary = ScanSummary {
            status: ScanStatus::Success,
            count: 3,
            files_scanned: 2,
            files_failed: 0,
            error: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["count"], 3);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_parse_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("XComGame.int");
        fs::write(&path, "[A X2AbilityTemplate]\n").unwrap();

        let records = parse_file(&ScanConfig::default(), &path).unwrap();
        assert_eq!(records.len(), 1);

        let missing = parse_file(&ScanConfig::default(), &dir.path().join("gone.int"));
        assert!(matches!(missing, Err(crate::errors::ScanError::FileNotFound(_))));
    }
}
