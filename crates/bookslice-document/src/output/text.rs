// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-text page export in Windows-1252 with CRLF line endings.

use std::path::{Path, PathBuf};

use bookslice_core::error::{BookSliceError, Result};
use bookslice_core::sanitize::{artifact_path, text_file_name};
use bookslice_core::types::PageIndex;
use encoding_rs::{EncoderResult, WINDOWS_1252};
use tracing::debug;

/// Trimmed, non-empty lines joined by CRLF.
pub fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// Encode to Windows-1252, dropping characters it cannot represent.
pub fn encode_cp1252(text: &str) -> Vec<u8> {
    let mut encoder = WINDOWS_1252.new_encoder();
    let mut out = Vec::with_capacity(text.len());
    let mut buffer = [0u8; 1024];
    let mut input = text;

    loop {
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(input, &mut buffer, true);
        out.extend_from_slice(&buffer[..written]);
        input = &input[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(ch) => debug!(?ch, "Dropping unmappable character"),
        }
    }
    out
}

/// Write `NNNN.txt` for `page` into `folder`. Pages without text write
/// nothing and return `None`.
pub fn write_page_text(
    folder: &Path,
    page: PageIndex,
    text: &str,
    max_path_length: usize,
) -> Result<Option<PathBuf>> {
    let normalized = normalize_lines(text);
    if normalized.is_empty() {
        return Ok(None);
    }

    let name = text_file_name(page);
    let path = artifact_path(folder, &name, max_path_length).ok_or_else(|| {
        BookSliceError::page(
            page,
            format!("{name} under {} exceeds {max_path_length} characters", folder.display()),
        )
    })?;
    std::fs::write(&path, encode_cp1252(&normalized))?;
    Ok(Some(path))
}
