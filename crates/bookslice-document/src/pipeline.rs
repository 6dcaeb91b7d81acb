// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-document pipeline: segment once, then transform pages into their
// chapter folders, collecting per-page failures into a report.

use std::path::Path;

use bookslice_core::config::ProcessingConfig;
use bookslice_core::error::{BookSliceError, Result};
use bookslice_core::types::{
    ChapterTree, DocumentReport, PageArtifactSet, PageFailure, PageIndex, is_reserved_folder,
};
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::output::paths::PathAllocator;
use crate::output::transform::PageTransformer;
use crate::segment::chapters::ChapterSegmenter;
use crate::segment::heading::numbers_in;
use crate::source::DocumentSource;

type PageOutcome = std::result::Result<PageArtifactSet, PageFailure>;

/// Segment `doc` and write every page (or the test-mode prefix) under
/// `book_dir`.
///
/// Only invalid settings or an unwritable book directory fail the call;
/// page failures are listed in the report.
#[instrument(skip_all, fields(book = %book_dir.display()))]
pub fn process_document<D: DocumentSource + ?Sized>(
    doc: &D,
    book_dir: &Path,
    config: &ProcessingConfig,
) -> Result<DocumentReport> {
    config.validate()?;
    let page_count = doc.page_count();
    let tree = ChapterSegmenter::new(config).segment(doc);
    let mut report = start_report(book_dir, page_count, &tree, config)?;

    let allocator = PathAllocator::new(book_dir, &tree, config.output.max_path_length);
    let transformer = PageTransformer::new(config);
    let outcomes: Vec<PageOutcome> = (0..report.pages_attempted)
        .map(|page| run_page(doc, page, &allocator, &transformer))
        .collect();

    finish_report(&mut report, outcomes);
    Ok(report)
}

/// Like [`process_document`], with pages spread over `config.workers`
/// threads.
///
/// Handles are never shared between threads. `open` runs once for
/// segmentation and then once per batch of pages rayon hands to a worker,
/// so it may be called more often than there are workers.
#[instrument(skip_all, fields(book = %book_dir.display(), workers = config.workers))]
pub fn process_document_parallel<D, F>(
    open: F,
    book_dir: &Path,
    config: &ProcessingConfig,
) -> Result<DocumentReport>
where
    D: DocumentSource,
    F: Fn() -> Result<D> + Sync,
{
    config.validate()?;

    // Segmentation needs the whole document before any page is written.
    let (page_count, tree) = {
        let doc = open()?;
        (doc.page_count(), ChapterSegmenter::new(config).segment(&doc))
    };
    let mut report = start_report(book_dir, page_count, &tree, config)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|err| BookSliceError::Config(format!("worker pool: {err}")))?;

    let allocator = PathAllocator::new(book_dir, &tree, config.output.max_path_length);
    let transformer = PageTransformer::new(config);
    let outcomes: Vec<PageOutcome> = pool.install(|| {
        (0..report.pages_attempted)
            .into_par_iter()
            .map_init(&open, |handle, page| match handle {
                Ok(doc) => run_page(&*doc, page, &allocator, &transformer),
                Err(err) => Err(PageFailure {
                    page,
                    reason: format!("document could not be opened by worker: {err}"),
                }),
            })
            .collect()
    });

    finish_report(&mut report, outcomes);
    Ok(report)
}

/// Write only the chapter whose folder name carries `chapter_number`.
///
/// The first non-reserved leaf with a digit run equal to the number wins.
/// Test mode does not cap a single chapter.
#[instrument(skip(doc, book_dir, config), fields(book = %book_dir.display()))]
pub fn process_chapter<D: DocumentSource + ?Sized>(
    doc: &D,
    book_dir: &Path,
    chapter_number: u32,
    config: &ProcessingConfig,
) -> Result<DocumentReport> {
    config.validate()?;
    let page_count = doc.page_count();
    let tree = ChapterSegmenter::new(config).segment(doc);

    let leaf = tree
        .leaves()
        .into_iter()
        .find(|leaf| {
            !is_reserved_folder(&leaf.range.name)
                && numbers_in(&leaf.range.name).any(|n| n == u64::from(chapter_number))
        })
        .ok_or(BookSliceError::ChapterNotFound(chapter_number))?;

    let pages = leaf.range.pages(page_count);
    info!(
        chapter = %leaf.range.name,
        first = pages.start,
        count = pages.len(),
        "Processing chapter"
    );

    let allocator = PathAllocator::new(book_dir, &tree, config.output.max_path_length);
    let folder = allocator.leaf_folder(&leaf)?;
    let transformer = PageTransformer::new(config);

    let mut report = DocumentReport::new(book_title(book_dir), page_count);
    report.chapter_count = 1;
    report.pages_attempted = pages.len();
    let outcomes: Vec<PageOutcome> = pages
        .map(|page| {
            transformer
                .process_page(doc, page, &folder)
                .map_err(|err| page_failure(page, err))
        })
        .collect();

    finish_report(&mut report, outcomes);
    Ok(report)
}

fn book_title(book_dir: &Path) -> String {
    book_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| book_dir.display().to_string())
}

fn start_report(
    book_dir: &Path,
    page_count: usize,
    tree: &ChapterTree,
    config: &ProcessingConfig,
) -> Result<DocumentReport> {
    std::fs::create_dir_all(book_dir)?;

    let mut report = DocumentReport::new(book_title(book_dir), page_count);
    report.chapter_count = tree.leaves().iter().filter(|l| !l.range.is_empty()).count();
    report.pages_attempted = config.page_limit(page_count);

    info!(
        pages = page_count,
        attempted = report.pages_attempted,
        chapters = report.chapter_count,
        test_mode = config.test_mode,
        "Processing document"
    );
    Ok(report)
}

fn run_page<D: DocumentSource + ?Sized>(
    doc: &D,
    page: PageIndex,
    allocator: &PathAllocator<'_>,
    transformer: &PageTransformer<'_>,
) -> PageOutcome {
    allocator
        .folder_for(page)
        .and_then(|folder| transformer.process_page(doc, page, &folder))
        .map_err(|err| page_failure(page, err))
}

fn page_failure(page: PageIndex, err: BookSliceError) -> PageFailure {
    warn!(page, %err, "Page failed; skipping");
    PageFailure {
        page,
        reason: err.to_string(),
    }
}

fn finish_report(report: &mut DocumentReport, outcomes: Vec<PageOutcome>) {
    for outcome in outcomes {
        match outcome {
            Ok(artifacts) => report.pages.push(artifacts),
            Err(failure) => report.failures.push(failure),
        }
    }
    report.finish();
    info!(
        bitmaps = report.bitmap_count(),
        failures = report.failures.len(),
        "Document finished"
    );
}
