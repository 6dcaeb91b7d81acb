// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grayscale page processor: auto-contrast, four-edge whitespace crop,
// overlapping split, blank detection, dithering, rotation, BMP output.
// Operates on in-memory images using the `image` crate.

use std::path::Path;

use bookslice_core::error::{BookSliceError, Result};
use image::imageops::{self, BiLevel};
use image::{DynamicImage, GrayImage, ImageFormat};
use tracing::{debug, instrument, trace};

/// Image processing pipeline operating on a single grayscale page raster.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`,
/// so a page reads as one chain:
///
/// ```ignore
/// let (top, bottom) = ImageProcessor::from_dynamic(raster)
///     .autocontrast(5.0)
///     .crop_whitespace(220, 0.03, 50)
///     .split(0.55, 0.45);
/// ```
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    /// The current working image, always single-channel.
    image: GrayImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap a decoded raster, converting it to grayscale.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            image: image.into_luma8(),
        }
    }

    /// Wrap an image that is already grayscale.
    pub fn from_gray(image: GrayImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying grayscale buffer.
    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }

    /// Consume the processor and return the grayscale buffer.
    pub fn into_gray(self) -> GrayImage {
        self.image
    }

    /// Darkest pixel value. An image with no pixels reports white.
    pub fn min_intensity(&self) -> u8 {
        self.image.pixels().map(|p| p.0[0]).min().unwrap_or(u8::MAX)
    }

    /// Whether no pixel is darker than `threshold`.
    pub fn is_blank(&self, threshold: u8) -> bool {
        self.min_intensity() >= threshold
    }

    // -- Transformations (consume self, return new Self) ----------------------

    /// Stretch the histogram so the darkest and lightest `cutoff_percent`
    /// of pixels saturate to 0 and 255.
    ///
    /// An image whose remaining histogram spans a single value is returned
    /// unchanged.
    #[instrument(skip(self))]
    pub fn autocontrast(self, cutoff_percent: f32) -> Self {
        let mut histogram = [0u64; 256];
        for pixel in self.image.pixels() {
            histogram[pixel.0[0] as usize] += 1;
        }

        let total: u64 = histogram.iter().sum();
        let cut = (total as f64 * cutoff_percent as f64 / 100.0) as u64;
        clip_tail(&mut histogram, cut, 0..256);
        clip_tail(&mut histogram, cut, (0..256).rev());

        let lo = histogram.iter().position(|&count| count > 0);
        let hi = histogram.iter().rposition(|&count| count > 0);
        let (lo, hi) = match (lo, hi) {
            (Some(lo), Some(hi)) if hi > lo => (lo, hi),
            _ => {
                trace!("Histogram too narrow to stretch");
                return self;
            }
        };

        let mut lut = [0u8; 256];
        for (value, slot) in lut.iter_mut().enumerate() {
            *slot = match value {
                v if v <= lo => 0,
                v if v >= hi => 255,
                v => ((v - lo) * 255 / (hi - lo)) as u8,
            };
        }
        debug!(lo, hi, "Auto-contrast stretch");

        let mut image = self.image;
        for pixel in image.pixels_mut() {
            pixel.0[0] = lut[usize::from(pixel.0[0])];
        }
        Self { image }
    }

    /// Remove uniform margins from all four edges.
    ///
    /// Row and column minimum projections are scanned inward from a
    /// protective margin (`margin_ratio` of the shorter side); the first
    /// value below `threshold` is an edge, widened back out by the margin.
    /// When no content is found, or the crop would be smaller than
    /// `min_size` in either dimension, the image is returned unchanged.
    #[instrument(skip(self), fields(width = self.width(), height = self.height()))]
    pub fn crop_whitespace(self, threshold: u8, margin_ratio: f32, min_size: u32) -> Self {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return self;
        }

        let mut row_min = vec![u8::MAX; height as usize];
        let mut col_min = vec![u8::MAX; width as usize];
        for (x, y, pixel) in self.image.enumerate_pixels() {
            let value = pixel.0[0];
            row_min[y as usize] = row_min[y as usize].min(value);
            col_min[x as usize] = col_min[x as usize].min(value);
        }

        let margin = (width.min(height) as f32 * margin_ratio) as usize;
        let edges = (
            find_edge(row_min.iter().copied(), margin, threshold),
            find_edge(row_min.iter().rev().copied(), margin, threshold),
            find_edge(col_min.iter().copied(), margin, threshold),
            find_edge(col_min.iter().rev().copied(), margin, threshold),
        );
        let (Some(top), Some(from_bottom), Some(left), Some(from_right)) = edges else {
            debug!("No content found; keeping page uncropped");
            return self;
        };

        let bottom = (height as usize).saturating_sub(from_bottom);
        let right = (width as usize).saturating_sub(from_right);
        if right <= left || bottom <= top {
            return self;
        }
        let crop_w = (right - left) as u32;
        let crop_h = (bottom - top) as u32;
        if crop_w < min_size || crop_h < min_size {
            debug!(crop_w, crop_h, min_size, "Crop too small; keeping page uncropped");
            return self;
        }

        debug!(left, top, crop_w, crop_h, "Cropping whitespace");
        self.crop(left as u32, top as u32, crop_w, crop_h)
    }

    /// Crop a rectangular region, clamped to the image bounds.
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let (img_w, img_h) = self.image.dimensions();
        let safe_x = x.min(img_w);
        let safe_y = y.min(img_h);
        let safe_w = width.min(img_w - safe_x);
        let safe_h = height.min(img_h - safe_y);

        let cropped = imageops::crop_imm(&self.image, safe_x, safe_y, safe_w, safe_h).to_image();
        Self { image: cropped }
    }

    /// Cut the page into an overlapping top and bottom half, both full width.
    ///
    /// The top half spans rows `[0, top_end * H)` and the bottom half spans
    /// rows `[bottom_start * H, H)`.
    pub fn split(self, top_end: f32, bottom_start: f32) -> (Self, Self) {
        let (width, height) = self.image.dimensions();
        let top_rows = ((height as f32 * top_end) as u32).min(height);
        let bottom_from = ((height as f32 * bottom_start) as u32).min(height);

        let top = self.clone().crop(0, 0, width, top_rows);
        let bottom = self.crop(0, bottom_from, width, height - bottom_from);
        (top, bottom)
    }

    /// Reduce to pure black and white with Floyd-Steinberg error diffusion.
    pub fn dither(mut self) -> Self {
        imageops::dither(&mut self.image, &BiLevel);
        self
    }

    /// Rotate counter-clockwise by a multiple of 90 degrees.
    pub fn rotate_ccw(self, degrees: u32) -> Self {
        let image = match degrees % 360 {
            90 => imageops::rotate270(&self.image),
            180 => imageops::rotate180(&self.image),
            270 => imageops::rotate90(&self.image),
            _ => return self,
        };
        Self { image }
    }

    // -- Output ---------------------------------------------------------------

    /// Write the image as an uncompressed BMP.
    pub fn save_bmp(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image
            .save_with_format(path.as_ref(), ImageFormat::Bmp)
            .map_err(|err| {
                BookSliceError::Image(format!(
                    "failed to save bitmap to {}: {}",
                    path.as_ref().display(),
                    err
                ))
            })
    }
}

/// Remove `cut` pixels from one end of a histogram, walking `order`.
fn clip_tail(histogram: &mut [u64; 256], mut cut: u64, order: impl Iterator<Item = usize>) {
    for index in order {
        if cut == 0 {
            break;
        }
        let take = cut.min(histogram[index]);
        histogram[index] -= take;
        cut -= take;
    }
}

/// Position of the first content value inside the protective margin,
/// moved back out by the margin.
fn find_edge(projection: impl ExactSizeIterator<Item = u8>, margin: usize, threshold: u8) -> Option<usize> {
    let len = projection.len();
    projection
        .enumerate()
        .take(len.saturating_sub(margin))
        .skip(margin)
        .find(|&(_, value)| value < threshold)
        .map(|(index, _)| index.saturating_sub(margin))
}
