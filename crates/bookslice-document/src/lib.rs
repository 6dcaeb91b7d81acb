// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bookslice-document: document processing for the Bookslice chapter splitter.
//
// Provides document access (lopdf structure reading, pdfium rasterisation),
// chapter segmentation (outline-driven or heading heuristics), output folder
// allocation, and the page pipeline (crop, split, dither, rotate, write).

pub mod output;
pub mod pdf;
pub mod pipeline;
pub mod raster;
pub mod segment;
pub mod source;

// Re-export the primary structs so callers can use `bookslice_document::PdfBook` etc.
pub use output::paths::PathAllocator;
pub use output::transform::PageTransformer;
pub use pdf::reader::PdfReader;
pub use pdf::render::{PdfBook, PdfRenderer};
pub use pipeline::{process_chapter, process_document, process_document_parallel};
pub use raster::processor::ImageProcessor;
pub use segment::chapters::ChapterSegmenter;
pub use segment::heading::HeadingDetector;
pub use source::{DocumentSource, InMemoryDocument};
