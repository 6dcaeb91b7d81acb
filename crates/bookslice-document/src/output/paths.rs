// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-to-folder resolution over a chapter tree.

use std::path::{Path, PathBuf};

use bookslice_core::error::{BookSliceError, Result};
use bookslice_core::sanitize::{ARTIFACT_NAME_RESERVE, fit_folder};
use bookslice_core::types::{COVER_FOLDER, ChapterTree, LeafRef, PageIndex};
use tracing::{debug, trace};

/// Maps pages to their chapter folder under one book directory.
///
/// Folders are created on first use; creating an existing folder is not an
/// error, so workers may race on the same chapter. Folder names are
/// shortened when `base/folder/NNNNNa.bmp` would exceed `max_path_length`.
#[derive(Debug, Clone, Copy)]
pub struct PathAllocator<'a> {
    base: &'a Path,
    tree: &'a ChapterTree,
    max_path_length: usize,
}

impl<'a> PathAllocator<'a> {
    pub fn new(base: &'a Path, tree: &'a ChapterTree, max_path_length: usize) -> Self {
        Self {
            base,
            tree,
            max_path_length,
        }
    }

    /// Folder for `page` without touching the filesystem. Pages no leaf
    /// claims go to the cover folder.
    pub fn folder_path(&self, page: PageIndex) -> Result<PathBuf> {
        let segments = match self.tree.locate(page) {
            Some(leaf) => leaf.folder_segments(),
            None => {
                trace!(page, "No chapter claims page; using cover folder");
                vec![COVER_FOLDER]
            }
        };
        self.fit(&segments)
            .ok_or_else(|| BookSliceError::page(page, self.too_deep()))
    }

    /// Folder for `page`, created if missing.
    pub fn folder_for(&self, page: PageIndex) -> Result<PathBuf> {
        let folder = self.folder_path(page)?;
        ensure_dir(&folder)?;
        Ok(folder)
    }

    /// Folder for a known leaf, created if missing.
    pub fn leaf_folder(&self, leaf: &LeafRef<'_>) -> Result<PathBuf> {
        let folder = self
            .fit(&leaf.folder_segments())
            .ok_or_else(|| BookSliceError::Config(self.too_deep()))?;
        ensure_dir(&folder)?;
        Ok(folder)
    }

    fn fit(&self, segments: &[&str]) -> Option<PathBuf> {
        fit_folder(self.base, segments, ARTIFACT_NAME_RESERVE, self.max_path_length)
    }

    fn too_deep(&self) -> String {
        format!(
            "book folder {} leaves no room for chapter files within {} characters",
            self.base.display(),
            self.max_path_length
        )
    }
}

fn ensure_dir(folder: &Path) -> Result<()> {
    if !folder.is_dir() {
        debug!(folder = %folder.display(), "Creating chapter folder");
    }
    std::fs::create_dir_all(folder)?;
    Ok(())
}
