// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing configuration. One immutable value per run, threaded explicitly
// into segmentation, path allocation, and page transforms.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BookSliceError, Result};

/// Complete settings for one processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Only process the first `test_page_limit` pages of each document.
    pub test_mode: bool,
    /// Page cap applied when `test_mode` is on.
    pub test_page_limit: usize,
    /// Worker threads for page transforms (1 = sequential).
    pub workers: usize,
    pub segmentation: SegmentationConfig,
    pub transform: TransformConfig,
    pub output: OutputConfig,
}

/// Chapter detection and grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Minimum font size (points) for a span to count as a heading.
    pub heading_font_size: f32,
    /// Heading text must be strictly longer than this many characters.
    pub heading_min_chars: usize,
    /// Skip the page after a detected heading before resuming the scan.
    pub skip_page_after_heading: bool,
    /// Maximum chapters per part folder; more chapters than this triggers grouping.
    pub part_size: usize,
}

/// Page rasterisation and bitmap production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Rasterisation resolution.
    pub dpi: u32,
    /// Percentage of darkest and lightest pixels clipped by auto-contrast.
    pub autocontrast_cutoff: f32,
    /// Projection values below this count as content when cropping.
    pub content_threshold: u8,
    /// Protective crop margin as a fraction of the shorter raster side.
    pub crop_margin_ratio: f32,
    /// Crops narrower or shorter than this (pixels) are discarded.
    pub min_crop_size: u32,
    /// The top half spans rows `[0, top_split_end * H)`.
    pub top_split_end: f32,
    /// The bottom half spans rows `[bottom_split_start * H, H)`.
    pub bottom_split_start: f32,
    /// Halves whose darkest pixel is at or above this are blank.
    pub blank_threshold: u8,
    /// Counter-clockwise rotation applied before writing (multiple of 90).
    pub rotate_degrees: u32,
}

/// Filesystem output rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Full artifact paths longer than this are truncated.
    pub max_path_length: usize,
    /// Folder names are cut to this many characters.
    pub max_name_length: usize,
    /// Replacement for spaces in folder names.
    pub space_filler: char,
    /// Write dithered half-page bitmaps.
    pub write_bitmaps: bool,
    /// Write a Windows-1252 plain-text file per page.
    pub write_text: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            test_mode: false,
            test_page_limit: 10,
            workers: 1,
            segmentation: SegmentationConfig::default(),
            transform: TransformConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            heading_font_size: 20.0,
            heading_min_chars: 3,
            skip_page_after_heading: true,
            part_size: 100,
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            dpi: 144,
            autocontrast_cutoff: 5.0,
            content_threshold: 220,
            crop_margin_ratio: 0.03,
            min_crop_size: 50,
            top_split_end: 0.55,
            bottom_split_start: 0.45,
            blank_threshold: 240,
            rotate_degrees: 270,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_path_length: 200,
            max_name_length: 50,
            space_filler: '_',
            write_bitmaps: true,
            write_text: false,
        }
    }
}

impl ProcessingConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Persist the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Number of pages to process for a document of `page_count` pages.
    pub fn page_limit(&self, page_count: usize) -> usize {
        if self.test_mode {
            page_count.min(self.test_page_limit)
        } else {
            page_count
        }
    }

    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(BookSliceError::Config("workers must be at least 1".into()));
        }
        if self.test_mode && self.test_page_limit == 0 {
            return Err(BookSliceError::Config(
                "test_page_limit must be positive in test mode".into(),
            ));
        }
        if self.segmentation.part_size == 0 {
            return Err(BookSliceError::Config("part_size must be positive".into()));
        }

        let t = &self.transform;
        if t.dpi == 0 {
            return Err(BookSliceError::Config("dpi must be positive".into()));
        }
        if !(0.0..50.0).contains(&t.autocontrast_cutoff) {
            return Err(BookSliceError::Config(format!(
                "autocontrast_cutoff {} outside [0, 50)",
                t.autocontrast_cutoff
            )));
        }
        if !(0.0..0.5).contains(&t.crop_margin_ratio) {
            return Err(BookSliceError::Config(format!(
                "crop_margin_ratio {} outside [0, 0.5)",
                t.crop_margin_ratio
            )));
        }
        let in_unit = |v: f32| v > 0.0 && v <= 1.0;
        if !in_unit(t.top_split_end) || !(0.0..1.0).contains(&t.bottom_split_start) {
            return Err(BookSliceError::Config(
                "split fractions must lie within the page".into(),
            ));
        }
        if t.bottom_split_start > t.top_split_end {
            return Err(BookSliceError::Config(format!(
                "bottom half starts at {} but top half ends at {}; halves would leave a gap",
                t.bottom_split_start, t.top_split_end
            )));
        }
        if t.rotate_degrees % 90 != 0 {
            return Err(BookSliceError::Config(format!(
                "rotation must be a multiple of 90, got {}",
                t.rotate_degrees
            )));
        }

        let o = &self.output;
        if o.max_name_length == 0 {
            return Err(BookSliceError::Config("max_name_length must be positive".into()));
        }
        // Room for at least "0001a.bmp".
        if o.max_path_length < 16 {
            return Err(BookSliceError::Config(format!(
                "max_path_length {} is too short for any artifact",
                o.max_path_length
            )));
        }
        if !o.write_bitmaps && !o.write_text {
            return Err(BookSliceError::Config(
                "at least one of write_bitmaps / write_text must be enabled".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ProcessingConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn page_limit_only_applies_in_test_mode() {
        let mut config = ProcessingConfig::default();
        assert_eq!(config.page_limit(250), 250);

        config.test_mode = true;
        assert_eq!(config.page_limit(250), 10);
        assert_eq!(config.page_limit(4), 4);
    }

    #[test]
    fn overlapping_split_is_required() {
        let mut config = ProcessingConfig::default();
        config.transform.top_split_end = 0.4;
        config.transform.bottom_split_start = 0.6;
        assert!(matches!(config.validate(), Err(BookSliceError::Config(_))));
    }

    #[test]
    fn rotation_must_be_right_angle() {
        let mut config = ProcessingConfig::default();
        config.transform.rotate_degrees = 45;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ProcessingConfig =
            serde_json::from_str(r#"{ "test_mode": true, "transform": { "dpi": 96 } }"#)
                .expect("parse");
        assert!(config.test_mode);
        assert_eq!(config.transform.dpi, 96);
        assert_eq!(config.transform.blank_threshold, 240);
        assert_eq!(config.output.max_path_length, 200);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bookslice.json");

        let mut config = ProcessingConfig::default();
        config.output.write_text = true;
        config.save(&path).expect("save");

        let loaded = ProcessingConfig::load(&path).expect("load");
        assert_eq!(loaded, config);
    }
}
