// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Bookslice chapter splitter.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Zero-based page number, `0 <= page < page_count`.
pub type PageIndex = usize;

/// Folder for front matter and for pages no chapter claims.
pub const COVER_FOLDER: &str = "0000_cover";

/// Folder for unnumbered material after the last numbered chapter.
pub const BACK_FOLDER: &str = "9999_back";

/// Whether `name` is one of the reserved front/back matter folders.
pub fn is_reserved_folder(name: &str) -> bool {
    name == COVER_FOLDER || name == BACK_FOLDER
}

/// One item of a document's structured table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Nesting depth; 1 is the top level.
    pub level: u32,
    pub title: String,
    /// 1-based page the entry points at.
    pub target_page: u32,
}

impl OutlineEntry {
    pub fn new(level: u32, title: impl Into<String>, target_page: u32) -> Self {
        Self {
            level,
            title: title.into(),
            target_page,
        }
    }

    /// Only top-level entries denote chapters.
    pub fn is_chapter_level(&self) -> bool {
        self.level == 1
    }
}

/// A run of text on a page, in the order the document emits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    /// Rendered size in points.
    pub font_size: f32,
    pub bold: bool,
    /// Top-left corner in points, measured from the page's top-left.
    pub position: (f32, f32),
}

impl TextSpan {
    pub fn new(text: impl Into<String>, font_size: f32, bold: bool) -> Self {
        Self {
            text: text.into(),
            font_size,
            bold,
            position: (0.0, 0.0),
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = (x, y);
        self
    }
}

/// An inferred chapter-opening heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingCandidate {
    pub page: PageIndex,
    /// Heading text after chapter-number normalisation.
    pub text: String,
    pub font_size: f32,
    pub bold: bool,
}

/// A contiguous, inclusive page interval assigned to one chapter.
///
/// `end` is signed so that the empty document can be represented as
/// `[0, -1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRange {
    pub name: String,
    pub start: i64,
    pub end: i64,
}

impl ChapterRange {
    pub fn new(name: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    pub fn contains(&self, page: PageIndex) -> bool {
        let page = page as i64;
        self.start <= page && page <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Number of pages covered.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start + 1) as usize
        }
    }

    /// The covered pages as an iterator range, clipped to `page_count`.
    pub fn pages(&self, page_count: usize) -> std::ops::Range<PageIndex> {
        if self.is_empty() || self.start >= page_count as i64 {
            return 0..0;
        }
        let start = self.start.max(0) as usize;
        let end = (self.end as usize + 1).min(page_count);
        start..end
    }
}

/// A node of the chapter tree: a leaf range or a part grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChapterNode {
    Leaf(ChapterRange),
    Part(IndexMap<String, ChapterNode>),
}

/// A leaf located in the tree, with its enclosing part (if any).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafRef<'a> {
    pub part: Option<&'a str>,
    pub range: &'a ChapterRange,
}

impl<'a> LeafRef<'a> {
    /// Folder path segments relative to the book directory.
    pub fn folder_segments(&self) -> Vec<&'a str> {
        let name = self.range.name.as_str();
        match self.part {
            Some(part) => vec![part, name],
            None => vec![name],
        }
    }
}

/// Ordered mapping `name -> ChapterNode`; the segmentation engine's output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterTree {
    entries: IndexMap<String, ChapterNode>,
}

impl ChapterTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// The whole document as a single cover range `[0, N-1]`.
    pub fn single_cover(page_count: usize) -> Self {
        let mut tree = Self::new();
        tree.insert_leaf(ChapterRange::new(COVER_FOLDER, 0, page_count as i64 - 1));
        tree
    }

    /// Insert a leaf under its own name at the top level.
    pub fn insert_leaf(&mut self, range: ChapterRange) {
        self.entries
            .insert(range.name.clone(), ChapterNode::Leaf(range));
    }

    /// Insert a part grouping at the top level.
    pub fn insert_part(&mut self, name: impl Into<String>, children: IndexMap<String, ChapterNode>) {
        self.entries.insert(name.into(), ChapterNode::Part(children));
    }

    pub fn get(&self, name: &str) -> Option<&ChapterNode> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ChapterNode)> {
        self.entries.iter()
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every leaf in tree order, flattened through part nodes.
    pub fn leaves(&self) -> Vec<LeafRef<'_>> {
        let mut out = Vec::new();
        for (name, node) in &self.entries {
            match node {
                ChapterNode::Leaf(range) => out.push(LeafRef { part: None, range }),
                ChapterNode::Part(children) => {
                    for child in children.values() {
                        if let ChapterNode::Leaf(range) = child {
                            out.push(LeafRef {
                                part: Some(name.as_str()),
                                range,
                            });
                        }
                    }
                }
            }
        }
        out
    }

    /// Number of part nodes at the top level.
    pub fn part_count(&self) -> usize {
        self.entries
            .values()
            .filter(|node| matches!(node, ChapterNode::Part(_)))
            .count()
    }

    /// The leaf whose range contains `page`, searching parts first-match in order.
    pub fn locate(&self, page: PageIndex) -> Option<LeafRef<'_>> {
        self.leaves().into_iter().find(|leaf| leaf.range.contains(page))
    }
}

impl fmt::Display for ChapterTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, node) in &self.entries {
            match node {
                ChapterNode::Leaf(range) => {
                    writeln!(f, "{name} [{}, {}]", range.start, range.end)?;
                }
                ChapterNode::Part(children) => {
                    writeln!(f, "{name}/")?;
                    for (child_name, child) in children {
                        if let ChapterNode::Leaf(range) = child {
                            writeln!(f, "  {child_name} [{}, {}]", range.start, range.end)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Which half of a page a bitmap holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Top,
    Bottom,
}

impl Side {
    /// Filename suffix placed after the page number.
    pub fn suffix(&self) -> char {
        match self {
            Self::Top => 'a',
            Self::Bottom => 'b',
        }
    }
}

/// Files written for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageArtifactSet {
    pub page: PageIndex,
    /// Zero, one, or two half-page bitmaps.
    pub bitmaps: Vec<PathBuf>,
    /// Plain-text export, when enabled and the page has text.
    pub text: Option<PathBuf>,
}

impl PageArtifactSet {
    pub fn new(page: PageIndex) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty() && self.text.is_none()
    }
}

/// A page that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFailure {
    pub page: PageIndex,
    pub reason: String,
}

/// Outcome of processing one document (or one chapter of it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub title: String,
    pub page_count: usize,
    /// Leaf chapters found by segmentation.
    pub chapter_count: usize,
    /// Pages the pipeline attempted (after any test-mode cap).
    pub pages_attempted: usize,
    pub pages: Vec<PageArtifactSet>,
    pub failures: Vec<PageFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DocumentReport {
    pub fn new(title: impl Into<String>, page_count: usize) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            page_count,
            chapter_count: 0,
            pages_attempted: 0,
            pages: Vec::new(),
            failures: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    /// Total bitmap files written.
    pub fn bitmap_count(&self) -> usize {
        self.pages.iter().map(|p| p.bitmaps.len()).sum()
    }

    /// Every artifact path written, in page order.
    pub fn artifact_paths(&self) -> Vec<&PathBuf> {
        self.pages
            .iter()
            .flat_map(|p| p.bitmaps.iter().chain(p.text.iter()))
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn finish(&mut self) {
        self.pages.sort_by_key(|p| p.page);
        self.failures.sort_by_key(|f| f.page);
        self.finished_at = Utc::now();
    }
}
