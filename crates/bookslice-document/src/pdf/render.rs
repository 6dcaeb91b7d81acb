// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterisation and text runs through pdfium, combined with the lopdf
// structure reader into a `DocumentSource`.

use std::path::{Path, PathBuf};

use bookslice_core::error::{BookSliceError, Result};
use bookslice_core::types::{OutlineEntry, PageIndex, TextSpan};
use image::{DynamicImage, Rgb, RgbImage};
use pdfium_render::prelude::*;
use tracing::{debug, info, instrument};

use crate::pdf::reader::PdfReader;
use crate::source::DocumentSource;

/// Environment variable naming an explicit pdfium shared library.
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_DYNAMIC_LIB_PATH";

/// PDF points per inch; pdfium renders one pixel per point at scale 1.0.
const POINTS_PER_INCH: f32 = 72.0;

/// Owns the pdfium bindings. Documents opened through it borrow it.
pub struct PdfRenderer {
    pdfium: Pdfium,
}

impl PdfRenderer {
    /// Bind to pdfium: `$PDFIUM_DYNAMIC_LIB_PATH` if set, then the working
    /// directory, then the system library.
    pub fn bind() -> Result<Self> {
        if let Ok(path) = std::env::var(PDFIUM_LIB_ENV) {
            return Self::bind_to(Path::new(&path));
        }

        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| {
                BookSliceError::Renderer(format!(
                    "pdfium library not found ({err}); install it or place {} next to the executable",
                    Pdfium::pdfium_platform_library_name().to_string_lossy()
                ))
            })?;

        info!("Bound pdfium");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Bind to the pdfium library at `path`.
    pub fn bind_to(path: &Path) -> Result<Self> {
        let bindings = Pdfium::bind_to_library(path).map_err(|err| {
            BookSliceError::Renderer(format!(
                "failed to load pdfium from {}: {err}",
                path.display()
            ))
        })?;
        info!(path = %path.display(), "Bound pdfium");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Open a book for segmentation and rendering.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(&self, path: impl AsRef<Path>) -> Result<PdfBook<'_>> {
        let path = path.as_ref();
        let label = path.display().to_string();

        // lopdf first: it classifies broken and encrypted files without
        // touching the renderer.
        let reader = PdfReader::open(path)?;

        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|err| classify_pdfium_error(&label, err))?;

        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| label.clone());

        debug!(pages = reader.page_count(), %title, "Book opened");
        Ok(PdfBook {
            reader,
            document,
            title,
            path: path.to_path_buf(),
        })
    }
}

/// One open PDF book: lopdf for structure, pdfium for pixels and text.
pub struct PdfBook<'a> {
    reader: PdfReader,
    document: PdfDocument<'a>,
    title: String,
    path: PathBuf,
}

impl PdfBook<'_> {
    /// File stem of the source, used as the book's folder name.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn page(&self, page: PageIndex) -> Result<PdfPage<'_>> {
        let index = PdfPageIndex::try_from(page)
            .map_err(|_| BookSliceError::page(page, "page index exceeds renderer range"))?;
        self.document
            .pages()
            .get(index)
            .map_err(|err| BookSliceError::page(page, err))
    }
}

impl DocumentSource for PdfBook<'_> {
    fn page_count(&self) -> usize {
        self.reader.page_count()
    }

    fn outline_entries(&self) -> Result<Vec<OutlineEntry>> {
        Ok(self.reader.outline_entries())
    }

    fn page_text_spans(&self, page: PageIndex) -> Result<Vec<TextSpan>> {
        let pdf_page = self.page(page)?;
        let page_height = pdf_page.height().value;
        let mut spans = Vec::new();

        for object in pdf_page.objects().iter() {
            let Some(text_object) = object.as_text_object() else {
                continue;
            };
            let text = text_object.text();
            if text.is_empty() {
                continue;
            }
            let (x, y) = match text_object.bounds() {
                Ok(bounds) => top_left(page_height, bounds.left().value, bounds.top().value),
                Err(err) => {
                    debug!(%err, "Text bounds unavailable");
                    (0.0, 0.0)
                }
            };
            let font = text_object.font();
            spans.push(
                TextSpan::new(text, text_object.scaled_font_size().value, is_bold_font(&font))
                    .at(x, y),
            );
        }

        Ok(spans)
    }

    fn render_page(&self, page: PageIndex, dpi: u32) -> Result<DynamicImage> {
        let pdf_page = self.page(page)?;
        let config = PdfRenderConfig::new()
            .scale_page_by_factor(dpi as f32 / POINTS_PER_INCH)
            .render_form_data(false)
            .set_reverse_byte_order(false)
            .set_format(PdfBitmapFormat::BGRA);

        let bitmap = pdf_page
            .render_with_config(&config)
            .map_err(|err| BookSliceError::page(page, err))?;

        let width = bitmap.width().max(0) as u32;
        let height = bitmap.height().max(0) as u32;
        let raw = bitmap.as_raw_bytes();
        Ok(DynamicImage::ImageRgb8(bgra_to_rgb(&raw, width, height)))
    }

    fn page_text(&self, page: PageIndex) -> Result<String> {
        let pdf_page = self.page(page)?;
        let text = pdf_page
            .text()
            .map_err(|err| BookSliceError::page(page, err))?;
        Ok(text.all())
    }
}

/// Flip a PDF top edge (y grows upwards) into a distance from the page top.
fn top_left(page_height: f32, left: f32, top: f32) -> (f32, f32) {
    (left, (page_height - top).max(0.0))
}

fn is_bold_font(font: &PdfFont) -> bool {
    if font.name().to_lowercase().contains("bold") {
        return true;
    }
    match font.weight() {
        Ok(PdfFontWeight::Weight700Bold | PdfFontWeight::Weight800 | PdfFontWeight::Weight900) => {
            true
        }
        Ok(PdfFontWeight::Custom(weight)) => weight >= 700,
        Ok(_) => false,
        Err(err) => {
            debug!(%err, "Font weight unavailable");
            false
        }
    }
}

/// Map a pdfium load failure onto the document-level error taxonomy.
fn classify_pdfium_error(source: &str, err: PdfiumError) -> BookSliceError {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            BookSliceError::EncryptedDocument(source.to_string())
        }
        other => BookSliceError::InvalidDocument(format!("{source}: {other}")),
    }
}

/// Convert a BGRA pdfium buffer (rows may be padded) into RGB, compositing
/// transparent pixels onto white.
fn bgra_to_rgb(raw: &[u8], width: u32, height: u32) -> RgbImage {
    let stride = if height == 0 {
        0
    } else {
        raw.len() / height as usize
    };

    RgbImage::from_fn(width, height, |x, y| {
        let idx = y as usize * stride + x as usize * 4;
        let channel = |offset: usize| raw.get(idx + offset).copied().unwrap_or(255);
        let alpha = channel(3) as u32;
        let over_white = |value: u8| ((value as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([over_white(channel(2)), over_white(channel(1)), over_white(channel(0))])
    })
}
