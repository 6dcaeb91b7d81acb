// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF structure reader. Opens and validates files, counts pages, and reads the outline
// using the `lopdf` crate.

use std::path::Path;

use bookslice_core::error::{BookSliceError, Result};
use bookslice_core::types::OutlineEntry;
use lopdf::Document;
use tracing::{debug, info, instrument};

/// Reads the structure of an existing PDF file.
///
/// Wraps `lopdf::Document`. Opening is where document-level failures are
/// classified: a file that needs a password is `EncryptedDocument`, anything
/// else that does not parse is `InvalidDocument`.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref)
            .map_err(|err| classify_load_error(&path_ref.display().to_string(), err))?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document =
            Document::load_mem(data).map_err(|err| classify_load_error("<memory>", err))?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// The document's bookmarks in document order.
    ///
    /// A document without an outline (or with one lopdf cannot resolve)
    /// yields an empty list; chapter detection then falls back to headings.
    pub fn outline_entries(&self) -> Vec<OutlineEntry> {
        let toc = match self.document.get_toc() {
            Ok(toc) => toc,
            Err(err) => {
                debug!(%err, "No usable outline");
                return Vec::new();
            }
        };

        if !toc.errors.is_empty() {
            debug!(errors = toc.errors.len(), "Outline had unresolved entries");
        }

        toc.toc
            .into_iter()
            .map(|entry| {
                OutlineEntry::new(
                    entry.level as u32,
                    entry.title.trim().to_string(),
                    entry.page as u32,
                )
            })
            .collect()
    }
}

/// Map a lopdf load failure onto the document-level error taxonomy.
fn classify_load_error(source: &str, err: lopdf::Error) -> BookSliceError {
    match err {
        lopdf::Error::Decryption(_) => BookSliceError::EncryptedDocument(source.to_string()),
        other => BookSliceError::InvalidDocument(format!("{source}: {other}")),
    }
}
