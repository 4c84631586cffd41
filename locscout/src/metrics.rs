use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::encoding::{TextEncoding, LARGE_FILE_THRESHOLD};

/// Counters shared by the scan workers.
///
/// Only atomics are shared; they never influence which records a file yields.
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    // Read strategy
    buffered_files: Arc<AtomicU64>,
    mmap_files: Arc<AtomicU64>,

    // Accepted encodings
    utf8_files: Arc<AtomicU64>,
    utf16_files: Arc<AtomicU64>,
    cp1252_files: Arc<AtomicU64>,
    latin1_files: Arc<AtomicU64>,

    // Failures and output
    failed_files: Arc<AtomicU64>,
    records_parsed: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new ScanMetrics instance
    pub fn new() -> Self {
        Self {
            buffered_files: Arc::new(AtomicU64::new(0)),
            mmap_files: Arc::new(AtomicU64::new(0)),
            utf8_files: Arc::new(AtomicU64::new(0)),
            utf16_files: Arc::new(AtomicU64::new(0)),
            cp1252_files: Arc::new(AtomicU64::new(0)),
            latin1_files: Arc::new(AtomicU64::new(0)),
            failed_files: Arc::new(AtomicU64::new(0)),
            records_parsed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records which read strategy a file of `size` bytes gets
    pub fn record_file_read(&self, size: u64) {
        if size >= LARGE_FILE_THRESHOLD {
            self.mmap_files.fetch_add(1, Ordering::Relaxed);
        } else {
            self.buffered_files.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records the encoding a file was decoded with
    pub fn record_encoding(&self, encoding: TextEncoding) {
        let counter = match encoding {
            TextEncoding::Utf8Sig => &self.utf8_files,
            TextEncoding::Utf16 => &self.utf16_files,
            TextEncoding::Windows1252 => &self.cp1252_files,
            TextEncoding::Latin1 => &self.latin1_files,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file that could not be read or decoded
    pub fn record_failure(&self) {
        self.failed_files.fetch_add(1, Ordering::Relaxed);
    }

    /// Records records parsed from one file
    pub fn record_records(&self, count: usize) {
        let total = self
            .records_parsed
            .fetch_add(count as u64, Ordering::Relaxed)
            + count as u64;
        debug!("Parsed {} records, total: {}", count, total);
    }

    /// Gets current statistics
    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            buffered_files: self.buffered_files.load(Ordering::Relaxed),
            mmap_files: self.mmap_files.load(Ordering::Relaxed),
            utf8_files: self.utf8_files.load(Ordering::Relaxed),
            utf16_files: self.utf16_files.load(Ordering::Relaxed),
            cp1252_files: self.cp1252_files.load(Ordering::Relaxed),
            latin1_files: self.latin1_files.load(Ordering::Relaxed),
            failed_files: self.failed_files.load(Ordering::Relaxed),
            records_parsed: self.records_parsed.load(Ordering::Relaxed),
        }
    }

    /// Logs current statistics
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Files read (buffered/mmap): {}/{}\n\
             Encodings (utf-8/utf-16/cp1252/latin-1): {}/{}/{}/{}\n\
             Failed files: {}\n\
             Records parsed: {}",
            stats.buffered_files,
            stats.mmap_files,
            stats.utf8_files,
            stats.utf16_files,
            stats.cp1252_files,
            stats.latin1_files,
            stats.failed_files,
            stats.records_parsed
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`ScanMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub buffered_files: u64,
    pub mmap_files: u64,
    pub utf8_files: u64,
    pub utf16_files: u64,
    pub cp1252_files: u64,
    pub latin1_files: u64,
    pub failed_files: u64,
    pub records_parsed: u64,
}
