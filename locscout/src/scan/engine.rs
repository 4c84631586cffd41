use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

use super::processor::FileProcessor;
use crate::config::ScanConfig;
use crate::discovery::discover;
use crate::encoding::EncodingReader;
use crate::errors::{ScanError, ScanResult};
use crate::results::{FileResult, ScanOutput};

/// Discovers and parses every localization file under `config.root_path`
pub fn scan(config: &ScanConfig) -> ScanResult<ScanOutput> {
    scan_inner(config, config.show_progress)
}

/// Like [`scan`], drawing a progress bar on stderr while files are parsed
pub fn scan_with_progress(config: &ScanConfig) -> ScanResult<ScanOutput> {
    scan_inner(config, true)
}

fn scan_inner(config: &ScanConfig, show_progress: bool) -> ScanResult<ScanOutput> {
    info!("Starting scan of {}", config.root_path.display());

    let files = discover(
        &config.root_path,
        &config.selector,
        &config.ignore_patterns,
    )?;
    info!("Found {} localization files", files.len());

    let processor = FileProcessor::new(EncodingReader::new(config.encodings.clone()));
    let progress = show_progress.then(|| new_progress_bar(files.len() as u64));

    let result = scan_files(
        &files,
        &processor,
        config.thread_count.get(),
        progress.as_ref(),
    )?;

    if let Some(progress) = progress {
        progress.finish_and_clear();
    }
    processor.metrics().log_stats();

    info!(
        "Scan complete. Found {} records in {} of {} files ({} unreadable)",
        result.records.len(),
        result.files_with_records,
        result.files_scanned,
        result.files_failed
    );

    Ok(result)
}

/// Parses `files` on a pool of `thread_count` workers.
///
/// Records come back in the order of `files`, whatever order the workers
/// finish in.
pub fn scan_files(
    files: &[PathBuf],
    processor: &FileProcessor,
    thread_count: usize,
    progress: Option<&ProgressBar>,
) -> ScanResult<ScanOutput> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .map_err(|e| ScanError::config_error(format!("Failed to start worker pool: {}", e)))?;
    debug!("Parsing {} files on {} threads", files.len(), thread_count);

    let file_results: Vec<FileResult> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let result = processor.process_file(path);
                if let Some(progress) = progress {
                    progress.inc(1);
                }
                result
            })
            .collect()
    });

    let mut output = ScanOutput::new();
    for file_result in file_results {
        output.add_file_result(file_result);
    }
    Ok(output)
}

fn new_progress_bar(len: u64) -> ProgressBar {
    let progress = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files")
    {
        progress.set_style(style.progress_chars("=>-"));
    }
    progress
}
