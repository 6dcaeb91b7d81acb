// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Bookslice.

use thiserror::Error;

use crate::types::PageIndex;

/// Top-level error type for all Bookslice operations.
#[derive(Debug, Error)]
pub enum BookSliceError {
    // -- Document-level (abort one input) --
    #[error("not a valid document: {0}")]
    InvalidDocument(String),

    #[error("document is password-protected: {0}")]
    EncryptedDocument(String),

    // -- Page-level (skip one page) --
    #[error("page {page} failed: {reason}")]
    PageRender { page: PageIndex, reason: String },

    // -- Chapter selection --
    #[error("chapter {0} not found in the chapter tree")]
    ChapterNotFound(u32),

    // -- Collaborators --
    #[error("renderer error: {0}")]
    Renderer(String),

    #[error("image processing failed: {0}")]
    Image(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BookSliceError {
    /// Wrap any collaborator failure as a failure of one page.
    pub fn page(page: PageIndex, reason: impl std::fmt::Display) -> Self {
        Self::PageRender {
            page,
            reason: reason.to_string(),
        }
    }

    /// Whether this error aborts the whole document rather than one page.
    pub fn is_document_level(&self) -> bool {
        matches!(
            self,
            Self::InvalidDocument(_) | Self::EncryptedDocument(_) | Self::Renderer(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BookSliceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_errors_name_the_page() {
        let err = BookSliceError::page(3, "bad stream");
        assert_eq!(err.to_string(), "page 3 failed: bad stream");
        assert!(!err.is_document_level());
    }

    #[test]
    fn unreadable_documents_abort_the_document() {
        assert!(BookSliceError::InvalidDocument("x.pdf".into()).is_document_level());
        assert!(BookSliceError::EncryptedDocument("x.pdf".into()).is_document_level());
        assert!(!BookSliceError::ChapterNotFound(2).is_document_level());
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(BookSliceError::from(io), BookSliceError::Io(_)));
    }
}
