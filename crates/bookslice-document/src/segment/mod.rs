// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Segmentation module: heading detection and chapter range trees.

pub mod chapters;
pub mod heading;

pub use chapters::ChapterSegmenter;
pub use heading::HeadingDetector;
