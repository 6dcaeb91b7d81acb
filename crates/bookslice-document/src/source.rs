// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document access abstraction.
//
// The segmentation engine and the page pipeline only ever talk to a
// `DocumentSource`. `PdfBook` implements it over lopdf + pdfium; the
// in-memory implementation below scripts a document for tests and benches.

use std::collections::{HashMap, HashSet};

use bookslice_core::error::{BookSliceError, Result};
use bookslice_core::types::{OutlineEntry, PageIndex, TextSpan};
use image::{DynamicImage, Rgb, RgbImage};

/// Read access to one open document.
///
/// Implementations are not assumed to be safe for concurrent rendering; the
/// parallel pipeline opens one handle per worker. Closing is `Drop`.
pub trait DocumentSource {
    /// Number of pages, `N`.
    fn page_count(&self) -> usize;

    /// Structured table of contents in document order (possibly empty).
    fn outline_entries(&self) -> Result<Vec<OutlineEntry>>;

    /// Text spans of one page in emission (reading) order.
    fn page_text_spans(&self, page: PageIndex) -> Result<Vec<TextSpan>>;

    /// Rasterise one page at `dpi`.
    fn render_page(&self, page: PageIndex, dpi: u32) -> Result<DynamicImage>;

    /// Plain text of one page. Defaults to the span texts, one per line.
    fn page_text(&self, page: PageIndex) -> Result<String> {
        let spans = self.page_text_spans(page)?;
        Ok(spans
            .iter()
            .map(|span| span.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

impl<D: DocumentSource + ?Sized> DocumentSource for &D {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn outline_entries(&self) -> Result<Vec<OutlineEntry>> {
        (**self).outline_entries()
    }

    fn page_text_spans(&self, page: PageIndex) -> Result<Vec<TextSpan>> {
        (**self).page_text_spans(page)
    }

    fn render_page(&self, page: PageIndex, dpi: u32) -> Result<DynamicImage> {
        (**self).render_page(page, dpi)
    }

    fn page_text(&self, page: PageIndex) -> Result<String> {
        (**self).page_text(page)
    }
}

/// A scripted document held entirely in memory.
///
/// Pages without an explicit raster render as a blank white page of
/// `page_size`; pages listed in `failing_pages` fail to render.
#[derive(Debug, Clone)]
pub struct InMemoryDocument {
    page_count: usize,
    outline: Vec<OutlineEntry>,
    spans: HashMap<PageIndex, Vec<TextSpan>>,
    rasters: HashMap<PageIndex, DynamicImage>,
    default_raster: Option<DynamicImage>,
    failing_pages: HashSet<PageIndex>,
    page_size: (u32, u32),
}

impl InMemoryDocument {
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            outline: Vec::new(),
            spans: HashMap::new(),
            rasters: HashMap::new(),
            default_raster: None,
            failing_pages: HashSet::new(),
            page_size: (200, 300),
        }
    }

    pub fn with_outline(mut self, outline: Vec<OutlineEntry>) -> Self {
        self.outline = outline;
        self
    }

    pub fn with_spans(mut self, page: PageIndex, spans: Vec<TextSpan>) -> Self {
        self.spans.insert(page, spans);
        self
    }

    pub fn with_raster(mut self, page: PageIndex, raster: DynamicImage) -> Self {
        self.rasters.insert(page, raster);
        self
    }

    /// Raster used for every page without its own.
    pub fn with_default_raster(mut self, raster: DynamicImage) -> Self {
        self.default_raster = Some(raster);
        self
    }

    pub fn with_render_failure(mut self, page: PageIndex) -> Self {
        self.failing_pages.insert(page);
        self
    }

    pub fn with_page_size(mut self, width: u32, height: u32) -> Self {
        self.page_size = (width, height);
        self
    }

    fn check_page(&self, page: PageIndex) -> Result<()> {
        if page >= self.page_count {
            return Err(BookSliceError::page(
                page,
                format!("out of range (document has {} pages)", self.page_count),
            ));
        }
        Ok(())
    }
}

impl DocumentSource for InMemoryDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn outline_entries(&self) -> Result<Vec<OutlineEntry>> {
        Ok(self.outline.clone())
    }

    fn page_text_spans(&self, page: PageIndex) -> Result<Vec<TextSpan>> {
        self.check_page(page)?;
        Ok(self.spans.get(&page).cloned().unwrap_or_default())
    }

    fn render_page(&self, page: PageIndex, _dpi: u32) -> Result<DynamicImage> {
        self.check_page(page)?;
        if self.failing_pages.contains(&page) {
            return Err(BookSliceError::page(page, "scripted render failure"));
        }
        if let Some(raster) = self.rasters.get(&page).or(self.default_raster.as_ref()) {
            return Ok(raster.clone());
        }
        let (width, height) = self.page_size;
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([255, 255, 255]),
        )))
    }
}
