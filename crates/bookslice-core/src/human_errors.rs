// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command-line summary.
//
// Every technical error is mapped to a plain sentence with a suggestion, and
// tagged with whether it stops the whole book or only one page.

use crate::error::BookSliceError;

/// How much of the run an error affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The whole book was skipped.
    Document,
    /// One page was skipped; the rest of the book was written.
    Page,
    /// Nothing was processed (bad settings, bad request).
    Request,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub scope: Scope,
}

/// Convert a `BookSliceError` into a message a reader can act on.
pub fn humanize_error(err: &BookSliceError) -> HumanError {
    match err {
        BookSliceError::InvalidDocument(_) => HumanError {
            message: "Not a valid PDF file.".into(),
            suggestion: "Check that the file opens in a PDF viewer; it may be truncated or another format renamed to .pdf.".into(),
            scope: Scope::Document,
        },
        BookSliceError::EncryptedDocument(_) => HumanError {
            message: "Password-protected PDF.".into(),
            suggestion: "Remove the password with your PDF viewer's export option, then try again.".into(),
            scope: Scope::Document,
        },
        BookSliceError::Renderer(detail) => HumanError {
            message: "The PDF renderer could not be started.".into(),
            suggestion: format!(
                "Install the pdfium library or point PDFIUM_DYNAMIC_LIB_PATH at it ({detail})."
            ),
            scope: Scope::Document,
        },
        BookSliceError::PageRender { page, reason } => HumanError {
            message: format!("Page {} could not be converted.", page + 1),
            suggestion: format!("The page was skipped; the rest of the book was written ({reason})."),
            scope: Scope::Page,
        },
        BookSliceError::Image(detail) => HumanError {
            message: "A page image could not be processed.".into(),
            suggestion: format!("The page was skipped ({detail})."),
            scope: Scope::Page,
        },
        BookSliceError::ChapterNotFound(number) => HumanError {
            message: format!("Chapter {number} is not in this book."),
            suggestion: "Run `bookslice segment <FILE>` to list the chapters that were detected.".into(),
            scope: Scope::Request,
        },
        BookSliceError::Config(detail) => HumanError {
            message: "The settings are not usable.".into(),
            suggestion: detail.clone(),
            scope: Scope::Request,
        },
        BookSliceError::Io(io) => HumanError {
            message: "A file could not be read or written.".into(),
            suggestion: format!("Check free space and folder permissions ({io})."),
            scope: Scope::Document,
        },
        BookSliceError::Serialization(detail) => HumanError {
            message: "The settings file is not valid JSON.".into(),
            suggestion: detail.to_string(),
            scope: Scope::Request,
        },
    }
}
