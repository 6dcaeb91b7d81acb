// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-text run summaries for the terminal.

use std::io::{self, Write};

use bookslice_core::types::DocumentReport;

use super::batch::BatchReport;

/// One line per book, then the failures with their suggestions.
pub fn write_batch_summary(out: &mut impl Write, report: &BatchReport) -> io::Result<()> {
    for document in &report.processed {
        write_document_summary(out, document)?;
    }
    for failure in &report.failed {
        writeln!(out, "✗ {}: {}", failure.file.display(), failure.message)?;
        writeln!(out, "    {}", failure.suggestion)?;
    }
    writeln!(
        out,
        "{} book(s) processed, {} failed, {} page(s) skipped",
        report.processed.len(),
        report.failed.len(),
        report.failed_pages()
    )
}

pub fn write_document_summary(out: &mut impl Write, report: &DocumentReport) -> io::Result<()> {
    let mark = if report.is_clean() { '✓' } else { '!' };
    writeln!(
        out,
        "{mark} {}: {} of {} page(s), {} chapter(s), {} bitmap(s)",
        report.title,
        report.pages.len(),
        report.pages_attempted,
        report.chapter_count,
        report.bitmap_count()
    )?;
    for failure in &report.failures {
        writeln!(out, "    page {}: {}", failure.page + 1, failure.reason)?;
    }
    Ok(())
}
