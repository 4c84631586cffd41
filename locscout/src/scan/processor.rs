use std::path::Path;
use tracing::trace;

use crate::encoding::EncodingReader;
use crate::metrics::ScanMetrics;
use crate::parser;
use crate::results::FileResult;

/// Turns one file into its records.
///
/// Each call reads, decodes and parses a single file and owns everything it
/// builds; the only shared state is the atomic metrics. A file that cannot be
/// read or decoded yields an empty, failed [`FileResult`] instead of an error.
#[derive(Debug, Clone, Default)]
pub struct FileProcessor {
    reader: EncodingReader,
    metrics: ScanMetrics,
}

impl FileProcessor {
    /// Creates a new FileProcessor using the given encoding reader
    pub fn new(reader: EncodingReader) -> Self {
        Self {
            reader,
            metrics: ScanMetrics::new(),
        }
    }

    /// Gets the current scan metrics
    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Processes a file and returns the records found in it
    pub fn process_file(&self, path: &Path) -> FileResult {
        trace!("Processing file: {}", path.display());

        if let Ok(metadata) = path.metadata() {
            self.metrics.record_file_read(metadata.len());
        }

        match self.reader.read_or_skip(path) {
            Some(decoded) => {
                self.metrics.record_encoding(decoded.encoding);
                let records = parser::parse(&decoded.lines, path);
                self.metrics.record_records(records.len());
                FileResult {
                    path: path.to_path_buf(),
                    records,
                    decoded: true,
                }
            }
            None => {
                self.metrics.record_failure();
                FileResult::failed(path.to_path_buf())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::TextEncoding;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_process_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("XComGame.int");
        fs::write(
            &path,
            "[A X2AbilityTemplate]\n+LocFriendlyName=\"Alpha\"\n[B X2AbilityTemplate]\n",
        )
        .unwrap();

        let processor = FileProcessor::default();
        let result = processor.process_file(&path);

        assert!(result.decoded);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].friendly_name, "Alpha");
        assert_eq!(result.records[0].source_file, path);

        let stats = processor.metrics().get_stats();
        assert_eq!(stats.utf8_files, 1);
        assert_eq!(stats.buffered_files, 1);
        assert_eq!(stats.records_parsed, 2);
    }

    #[test]
    fn test_undecodable_file_yields_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Broken.int");
        fs::write(&path, b"\xFF\xFE\xFD").unwrap();

        let processor = FileProcessor::new(EncodingReader::new(vec![TextEncoding::Utf8Sig]));
        let result = processor.process_file(&path);

        assert!(!result.decoded);
        assert!(result.records.is_empty());
        assert_eq!(processor.metrics().get_stats().failed_files, 1);
    }

    #[test]
    fn test_missing_file_yields_nothing() {
        let dir = tempdir().unwrap();
        let processor = FileProcessor::default();
        let result = processor.process_file(&dir.path().join("gone.int"));
        assert!(!result.decoded);
        assert!(result.records.is_empty());
    }
}
