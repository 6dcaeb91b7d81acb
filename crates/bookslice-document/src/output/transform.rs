// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page transformer: one page in, zero to two half-page bitmaps (and an
// optional text file) out.

use std::path::{Path, PathBuf};

use bookslice_core::config::ProcessingConfig;
use bookslice_core::error::{BookSliceError, Result};
use bookslice_core::sanitize::{artifact_path, bitmap_file_name};
use bookslice_core::types::{PageArtifactSet, PageIndex, Side};
use image::DynamicImage;
use tracing::{debug, instrument};

use crate::output::text::write_page_text;
use crate::raster::ImageProcessor;
use crate::source::DocumentSource;

/// Turns rendered pages into device bitmaps according to one configuration.
#[derive(Debug, Clone, Copy)]
pub struct PageTransformer<'c> {
    config: &'c ProcessingConfig,
}

impl<'c> PageTransformer<'c> {
    pub fn new(config: &'c ProcessingConfig) -> Self {
        Self { config }
    }

    /// Render `page` from `doc` and write its artifacts into `folder`.
    #[instrument(skip(self, doc, folder), fields(folder = %folder.display()))]
    pub fn process_page<D: DocumentSource + ?Sized>(
        &self,
        doc: &D,
        page: PageIndex,
        folder: &Path,
    ) -> Result<PageArtifactSet> {
        let output = &self.config.output;
        let mut artifacts = PageArtifactSet::new(page);

        if output.write_bitmaps {
            let raster = doc.render_page(page, self.config.transform.dpi)?;
            artifacts.bitmaps = self.transform_raster(raster, page, folder)?;
        }

        if output.write_text {
            let text = doc.page_text(page)?;
            artifacts.text = write_page_text(folder, page, &text, output.max_path_length)?;
        }

        debug!(
            bitmaps = artifacts.bitmaps.len(),
            text = artifacts.text.is_some(),
            "Page written"
        );
        Ok(artifacts)
    }

    /// Grayscale, auto-contrast and crop a raster, then split it into its
    /// top and bottom halves.
    pub fn halves(&self, raster: DynamicImage) -> (ImageProcessor, ImageProcessor) {
        let t = &self.config.transform;
        ImageProcessor::from_dynamic(raster)
            .autocontrast(t.autocontrast_cutoff)
            .crop_whitespace(t.content_threshold, t.crop_margin_ratio, t.min_crop_size)
            .split(t.top_split_end, t.bottom_split_start)
    }

    /// Write the non-blank halves of `raster` as dithered, rotated bitmaps.
    ///
    /// A file name that would push the path past `max_path_length` fails the
    /// page before anything is written.
    pub fn transform_raster(
        &self,
        raster: DynamicImage,
        page: PageIndex,
        folder: &Path,
    ) -> Result<Vec<PathBuf>> {
        let t = &self.config.transform;
        let max_len = self.config.output.max_path_length;
        let (top, bottom) = self.halves(raster);
        let mut written = Vec::with_capacity(2);

        for (side, half) in [(Side::Top, top), (Side::Bottom, bottom)] {
            let name = bitmap_file_name(page, side);
            let path = artifact_path(folder, &name, max_len).ok_or_else(|| {
                BookSliceError::page(
                    page,
                    format!("{name} under {} exceeds {max_len} characters", folder.display()),
                )
            })?;
            if half.is_blank(t.blank_threshold) {
                debug!(page, ?side, "Blank half skipped");
                continue;
            }
            half.dither().rotate_ccw(t.rotate_degrees).save_bmp(&path)?;
            written.push(path);
        }

        Ok(written)
    }
}
