//! Parallel batch analysis using rayon
//!
//! Each file is imported and analyzed independently; results come back in
//! input order. The progress bar is the only state shared between workers.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::analysis::{ActivityAnalyzer, ActivityReport};
use crate::error::{Result, TrackLabError};
use crate::import::ImportManager;

/// Configuration for batch runs
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Worker threads (None for one per CPU)
    pub threads: Option<usize>,
    /// Show progress bar while analyzing
    pub show_progress: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            threads: None,
            show_progress: true,
        }
    }
}

/// Outcome for a single file
#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub file_path: PathBuf,
    pub report: Option<ActivityReport>,
    pub error: Option<String>,
    pub duration_ms: u128,
}

impl FileAnalysis {
    pub fn is_success(&self) -> bool {
        self.report.is_some()
    }
}

/// Summary of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    /// Meters across all analyzed traces
    pub total_distance: f64,
    /// Moving seconds across all analyzed traces
    pub total_moving_time: f64,
    pub total_duration_ms: u128,
    pub results: Vec<FileAnalysis>,
}

impl BatchSummary {
    fn from_results(results: Vec<FileAnalysis>, total_duration_ms: u128) -> Self {
        let reports: Vec<&ActivityReport> =
            results.iter().filter_map(|r| r.report.as_ref()).collect();

        Self {
            total_files: results.len(),
            successful_files: reports.len(),
            failed_files: results.len() - reports.len(),
            total_distance: reports.iter().map(|r| r.trace.summary.total_distance).sum(),
            total_moving_time: reports.iter().map(|r| r.trace.summary.moving_time).sum(),
            total_duration_ms,
            results,
        }
    }

    /// Files that failed, with their error messages
    pub fn errors(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.results
            .iter()
            .filter_map(|r| r.error.as_deref().map(|e| (r.file_path.as_path(), e)))
    }

    /// Successful reports in input order
    pub fn reports(&self) -> impl Iterator<Item = &ActivityReport> {
        self.results.iter().filter_map(|r| r.report.as_ref())
    }

    /// Get throughput (files per second)
    pub fn throughput_files_per_sec(&self) -> f64 {
        if self.total_duration_ms == 0 {
            return 0.0;
        }
        (self.successful_files as f64 / self.total_duration_ms as f64) * 1000.0
    }

    /// Check if every file was analyzed
    pub fn is_fully_successful(&self) -> bool {
        self.failed_files == 0
    }

    /// Get human-readable summary
    pub fn to_string_pretty(&self) -> String {
        format!(
            "Batch Analysis Summary\n  \
             Total Files: {}\n  \
             Successful: {}\n  \
             Failed: {}\n  \
             Total Distance: {:.2} km\n  \
             Total Moving Time: {:.1} min\n  \
             Total Time: {:.2}s\n  \
             Throughput: {:.2} files/sec",
            self.total_files,
            self.successful_files,
            self.failed_files,
            self.total_distance / 1000.0,
            self.total_moving_time / 60.0,
            self.total_duration_ms as f64 / 1000.0,
            self.throughput_files_per_sec()
        )
    }
}

/// Analyzes many activity files in parallel
pub struct BatchAnalyzer {
    config: BatchConfig,
    analyzer: ActivityAnalyzer,
    manager: ImportManager,
}

impl BatchAnalyzer {
    pub fn new(analyzer: ActivityAnalyzer, config: BatchConfig) -> Self {
        Self {
            config,
            analyzer,
            manager: ImportManager::new(),
        }
    }

    /// Analyze every importable file in a directory
    pub fn analyze_directory(&self, dir_path: &Path) -> Result<BatchSummary> {
        debug!(dir = %dir_path.display(), "Scanning directory for activity files");
        let files = self.manager.collect_importable_files(dir_path)?;

        if files.is_empty() {
            warn!(dir = %dir_path.display(), "No activity files found");
        } else {
            info!(count = files.len(), "Found activity files");
        }

        self.analyze_files(&files)
    }

    /// Analyze the given files, on a dedicated pool when a thread count is set
    pub fn analyze_files(&self, file_paths: &[PathBuf]) -> Result<BatchSummary> {
        let start_time = Instant::now();
        let progress = self.progress_bar(file_paths.len());

        let results = match self.config.threads {
            Some(num_threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .map_err(|e| {
                        TrackLabError::Internal(format!("Failed to create thread pool: {}", e))
                    })?;
                pool.install(|| self.process_files(file_paths, progress.as_ref()))
            }
            None => self.process_files(file_paths, progress.as_ref()),
        };

        if let Some(pb) = progress {
            pb.finish_with_message("Complete");
        }

        let summary = BatchSummary::from_results(results, start_time.elapsed().as_millis());
        info!(
            total = summary.total_files,
            successful = summary.successful_files,
            failed = summary.failed_files,
            "Batch analysis finished"
        );

        Ok(summary)
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.config.show_progress {
            return None;
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }

    fn process_files(&self, file_paths: &[PathBuf], progress: Option<&ProgressBar>) -> Vec<FileAnalysis> {
        file_paths
            .par_iter()
            .map(|file_path| {
                let file_start = Instant::now();
                let outcome = self.analyzer.analyze_file(&self.manager, file_path);
                let duration_ms = file_start.elapsed().as_millis();

                if let Some(pb) = progress {
                    pb.set_message(
                        file_path
                            .file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_default(),
                    );
                    pb.inc(1);
                }

                match outcome {
                    Ok(report) => FileAnalysis {
                        file_path: file_path.clone(),
                        report: Some(report),
                        error: None,
                        duration_ms,
                    },
                    Err(e) => {
                        warn!(file = %file_path.display(), error = %e, "Analysis failed");
                        FileAnalysis {
                            file_path: file_path.clone(),
                            report: None,
                            error: Some(e.user_message()),
                            duration_ms,
                        }
                    }
                }
            })
            .collect()
    }
}
