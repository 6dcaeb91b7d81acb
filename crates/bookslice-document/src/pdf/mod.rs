// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: structure via lopdf, rasters and text runs via pdfium.

pub mod reader;
pub mod render;

pub use reader::PdfReader;
pub use render::{PdfBook, PdfRenderer};
