// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch runs: find the books in a folder, process them one at a time, and
// collect what worked and what did not.
//
// A failing book never stops the batch. Its error is humanised and recorded
// and the next book starts from a clean slate.

use std::path::{Path, PathBuf};

use bookslice_core::ProcessingConfig;
use bookslice_core::error::{BookSliceError, Result};
use bookslice_core::human_errors::humanize_error;
use bookslice_core::sanitize::sanitize_name;
use bookslice_core::types::DocumentReport;
use serde::Serialize;
use tracing::{error, info};

/// Folder created next to the input books when no output root is given.
pub const OUTPUT_DIR_NAME: &str = "processed_books";

/// Default output root for books found in `dir`.
pub fn default_output_root(dir: &Path) -> PathBuf {
    dir.join(OUTPUT_DIR_NAME)
}

/// Whether `path` names a book this tool should pick up: a `.pdf` file (any
/// case) that is not an editor lock file (`~$...`).
pub fn is_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    is_pdf && !name.starts_with("~$")
}

/// Books directly inside `dir`, sorted by name.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut books = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_candidate(&path) {
            books.push(path);
        }
    }
    books.sort();
    Ok(books)
}

/// Output folder for one book: the sanitised file stem under `output_root`.
pub fn book_folder(output_root: &Path, file: &Path, config: &ProcessingConfig) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_root.join(sanitize_name(
        &stem,
        config.output.max_name_length,
        config.output.space_filler,
    ))
}

/// A book the batch had to give up on.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub file: PathBuf,
    pub message: String,
    pub suggestion: String,
}

/// Outcome of a batch run.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub processed: Vec<DocumentReport>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    /// Record the outcome of one book.
    pub fn record(&mut self, file: &Path, outcome: Result<DocumentReport>) {
        match outcome {
            Ok(report) => {
                info!(
                    file = %file.display(),
                    bitmaps = report.bitmap_count(),
                    failed_pages = report.failures.len(),
                    "Book processed"
                );
                self.processed.push(report);
            }
            Err(err) => self.record_failure(file, &err),
        }
    }

    fn record_failure(&mut self, file: &Path, err: &BookSliceError) {
        error!(
            file = %file.display(),
            error = %err,
            document_level = err.is_document_level(),
            "Book failed"
        );
        let human = humanize_error(err);
        self.failed.push(BatchFailure {
            file: file.to_path_buf(),
            message: human.message,
            suggestion: human.suggestion,
        });
    }

    /// Pages that failed across every processed book.
    pub fn failed_pages(&self) -> usize {
        self.processed.iter().map(|r| r.failures.len()).sum()
    }

    /// True when every book and every page went through.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.processed.iter().all(DocumentReport::is_clean)
    }
}

/// Run `process` over `files` in order, one book at a time.
pub fn run_batch<F>(files: &[PathBuf], mut process: F) -> BatchReport
where
    F: FnMut(&Path) -> Result<DocumentReport>,
{
    let mut report = BatchReport::default();
    for (i, file) in files.iter().enumerate() {
        info!(file = %file.display(), index = i + 1, total = files.len(), "Processing book");
        report.record(file, process(file));
    }
    report
}
