// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Runner: owns the pdfium binding and turns CLI/menu requests into pipeline
// calls on real PDF files.

use std::path::{Path, PathBuf};

use bookslice_core::ProcessingConfig;
use bookslice_core::error::Result;
use bookslice_core::types::{ChapterTree, DocumentReport};
use bookslice_document::{ChapterSegmenter, PdfRenderer, process_chapter, process_document};
use tracing::info;

use super::batch::{BatchReport, book_folder, list_documents, run_batch};
use super::menu::MenuActions;

pub struct Runner {
    renderer: PdfRenderer,
    output_root: PathBuf,
}

impl Runner {
    /// Bind pdfium once for the whole run.
    pub fn new(output_root: PathBuf) -> Result<Self> {
        let renderer = PdfRenderer::bind()?;
        info!(output = %output_root.display(), "Runner ready");
        Ok(Self {
            renderer,
            output_root,
        })
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Process every book in `dir`. Only an unreadable folder fails the call.
    pub fn process_all(&self, dir: &Path, config: &ProcessingConfig) -> Result<BatchReport> {
        config.validate()?;
        let files = list_documents(dir)?;
        info!(dir = %dir.display(), books = files.len(), "Batch started");
        Ok(run_batch(&files, |file| self.process_file(file, config)))
    }

    /// Process one whole book.
    pub fn process_file(&self, file: &Path, config: &ProcessingConfig) -> Result<DocumentReport> {
        let book = self.renderer.open(file)?;
        process_document(&book, &book_folder(&self.output_root, file, config), config)
    }

    /// Process only chapter `number` of `file`.
    pub fn process_chapter(
        &self,
        file: &Path,
        number: u32,
        config: &ProcessingConfig,
    ) -> Result<DocumentReport> {
        let book = self.renderer.open(file)?;
        process_chapter(&book, &book_folder(&self.output_root, file, config), number, config)
    }

    /// Chapter tree of `file` without writing anything.
    pub fn segment(&self, file: &Path, config: &ProcessingConfig) -> Result<ChapterTree> {
        config.validate()?;
        let book = self.renderer.open(file)?;
        Ok(ChapterSegmenter::new(config).segment(&book))
    }
}

/// A runner bound to the folder the interactive menu works in.
pub struct BookFolder<'a> {
    pub runner: &'a Runner,
    pub dir: &'a Path,
}

impl MenuActions for BookFolder<'_> {
    fn list_books(&self) -> Result<Vec<PathBuf>> {
        list_documents(self.dir)
    }

    fn process_all(&self, config: &ProcessingConfig) -> Result<BatchReport> {
        self.runner.process_all(self.dir, config)
    }

    fn process_chapter(
        &self,
        file: &Path,
        number: u32,
        config: &ProcessingConfig,
    ) -> Result<DocumentReport> {
        self.runner.process_chapter(file, number, config)
    }
}
