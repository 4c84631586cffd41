/// Parallel scan of a mod directory.
///
/// Every discovered file is an independent unit of work: a pure
/// `path -> records` function ([`FileProcessor::process_file`]) run on a rayon
/// pool. Workers share nothing mutable except metrics counters, and the
/// indexed `par_iter().map().collect()` returns results in discovery order,
/// so the merge that follows sees the same sequence on every run.
///
/// ```rust,ignore
/// let output = locscout::scan::scan(&config)?;
/// store.upsert(&output.records)?;
/// ```
///
/// A file that cannot be read or decoded contributes no records and is
/// counted in [`crate::results::ScanOutput::files_failed`]. Only a root that
/// cannot be walked fails the scan.
pub mod engine;
pub mod processor;

pub use engine::{scan, scan_files, scan_with_progress};
pub use processor::FileProcessor;
