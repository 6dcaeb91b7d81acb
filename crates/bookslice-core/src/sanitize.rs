// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folder/file naming rules for the output tree.

use std::path::{Path, PathBuf};

use crate::types::{PageIndex, Side};

/// Characters that never appear in a folder name. Path separators, shell and
/// Windows-reserved punctuation, parentheses, and the ellipsis glyph that
/// table-of-contents titles often carry.
pub const NAME_BLACKLIST: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|', '(', ')', '…'];

/// Name used when sanitizing leaves nothing behind.
pub const FALLBACK_NAME: &str = "untitled";

/// Extension of the bitmap artifacts.
pub const BITMAP_EXTENSION: &str = "bmp";

/// Extension of the plain-text artifacts.
pub const TEXT_EXTENSION: &str = "txt";

/// Reduce arbitrary text to a safe folder name.
///
/// Blacklisted and control characters are removed, every whitespace run
/// becomes one `filler`, and the result is cut to `max_len` characters.
/// Trailing dots and fillers are stripped because some filesystems refuse
/// them.
pub fn sanitize_name(text: &str, max_len: usize, filler: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.trim().chars() {
        if NAME_BLACKLIST.contains(&ch) || (ch.is_control() && !ch.is_whitespace()) {
            continue;
        }
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(filler);
        }
        pending_space = false;
        out.push(ch);
    }

    let mut cut: String = out.chars().take(max_len).collect();
    while cut.ends_with('.') || cut.ends_with(filler) {
        cut.pop();
    }

    if cut.is_empty() {
        FALLBACK_NAME.chars().take(max_len.max(1)).collect()
    } else {
        cut
    }
}

/// `NNNN<a|b>.bmp` for the 1-based page number.
pub fn bitmap_file_name(page: PageIndex, side: Side) -> String {
    format!("{:04}{}.{BITMAP_EXTENSION}", page + 1, side.suffix())
}

/// `NNNN.txt` for the 1-based page number.
pub fn text_file_name(page: PageIndex) -> String {
    format!("{:04}.{TEXT_EXTENSION}", page + 1)
}

/// Room kept after a chapter folder for the longest artifact name
/// (`NNNNNa.bmp`).
pub const ARTIFACT_NAME_RESERVE: usize = 10;

/// Join `segments` under `base` so that a file name of `reserve` characters
/// still fits within `max_len`.
///
/// Over-long paths lose characters from the deepest segment first, and every
/// segment keeps at least one character. `base` is never cut. Returns `None`
/// when no shortening fits.
pub fn fit_folder(
    base: &Path,
    segments: &[&str],
    reserve: usize,
    max_len: usize,
) -> Option<PathBuf> {
    let fixed = base.to_string_lossy().chars().count() + segments.len() + 1 + reserve;
    let mut lengths: Vec<usize> = segments.iter().map(|s| s.chars().count()).collect();
    let mut over = (fixed + lengths.iter().sum::<usize>()).saturating_sub(max_len);

    for len in lengths.iter_mut().rev() {
        if over == 0 {
            break;
        }
        let cut = over.min(len.saturating_sub(1));
        *len -= cut;
        over -= cut;
    }
    if over > 0 {
        return None;
    }

    let mut folder = base.to_path_buf();
    for (segment, len) in segments.iter().zip(lengths) {
        let kept: String = segment.chars().take(len).collect();
        let trimmed = kept.trim_end_matches('.');
        folder.push(if trimmed.is_empty() { kept.as_str() } else { trimmed });
    }
    Some(folder)
}

/// `folder/file_name`, or `None` when that path is longer than `max_len`
/// characters. The file name is never shortened.
pub fn artifact_path(folder: &Path, file_name: &str, max_len: usize) -> Option<PathBuf> {
    let path = folder.join(file_name);
    (path.to_string_lossy().chars().count() <= max_len).then_some(path)
}
