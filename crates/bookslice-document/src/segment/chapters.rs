// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Chapter segmentation: outline entries or detected headings become an
// ordered chapter range tree with cover/back matter and part grouping.

use std::collections::HashSet;

use bookslice_core::config::{ProcessingConfig, SegmentationConfig};
use bookslice_core::sanitize::sanitize_name;
use bookslice_core::types::{
    BACK_FOLDER, COVER_FOLDER, ChapterNode, ChapterRange, ChapterTree, HeadingCandidate,
    OutlineEntry,
};
use indexmap::IndexMap;
use tracing::{debug, info, instrument, warn};

use crate::segment::heading::{HeadingDetector, has_number, normalize_chapter_numbers};
use crate::source::DocumentSource;

/// One titled stretch of pages before classification.
#[derive(Debug, Clone)]
struct Section {
    title: String,
    start: i64,
    end: i64,
}

/// A `(start, end)` pair under construction.
type Span = (i64, i64);

/// Builds the chapter tree for one document.
#[derive(Debug, Clone)]
pub struct ChapterSegmenter {
    segmentation: SegmentationConfig,
    max_name_length: usize,
    space_filler: char,
}

impl ChapterSegmenter {
    pub fn new(config: &ProcessingConfig) -> Self {
        Self {
            segmentation: config.segmentation.clone(),
            max_name_length: config.output.max_name_length,
            space_filler: config.output.space_filler,
        }
    }

    /// Segment `doc`: from its outline when it has top-level entries,
    /// otherwise from headings detected page by page.
    #[instrument(skip_all, fields(pages = doc.page_count()))]
    pub fn segment<D: DocumentSource + ?Sized>(&self, doc: &D) -> ChapterTree {
        let page_count = doc.page_count();
        if page_count == 0 {
            debug!("Empty document");
            return ChapterTree::single_cover(0);
        }

        let outline = doc.outline_entries().unwrap_or_else(|err| {
            warn!(%err, "Outline unreadable; falling back to headings");
            Vec::new()
        });

        let tree = if outline.iter().any(OutlineEntry::is_chapter_level) {
            info!(entries = outline.len(), "Segmenting from outline");
            self.from_outline(&outline, page_count)
        } else {
            let detector = HeadingDetector::from_config(&self.segmentation);
            let headings = detector.scan(doc, self.segmentation.skip_page_after_heading);
            info!(headings = headings.len(), "Segmenting from detected headings");
            self.from_headings(&headings, page_count)
        };

        debug!(leaves = tree.leaves().len(), parts = tree.part_count(), "Chapter tree built");
        tree
    }

    /// Chapter tree from outline entries (1-based targets).
    ///
    /// The page before an entry's target closes the previous range, so an
    /// entry targeting page `t` opens at index `t - 1` and the range before
    /// it ends at `t - 2`.
    pub fn from_outline(&self, entries: &[OutlineEntry], page_count: usize) -> ChapterTree {
        let mut accepted: Vec<(String, i64)> = Vec::new();
        for entry in entries.iter().filter(|e| e.is_chapter_level()) {
            let target = i64::from(entry.target_page);
            if let Some((_, previous)) = accepted.last()
                && target < *previous
            {
                warn!(title = %entry.title, target, "Outline entry points backwards; ignored");
                continue;
            }
            accepted.push((normalize_chapter_numbers(&entry.title), target));
        }

        let Some((_, first_target)) = accepted.first() else {
            return ChapterTree::single_cover(page_count);
        };
        let last_page = page_count as i64 - 1;
        let lead = (0, first_target - 2);

        let sections = accepted
            .iter()
            .enumerate()
            .map(|(index, (title, target))| Section {
                title: title.clone(),
                start: target - 1,
                end: accepted
                    .get(index + 1)
                    .map_or(last_page, |(_, next)| next - 2),
            })
            .collect();

        self.build(Some(lead), sections, page_count)
    }

    /// Chapter tree from detected headings (0-based, already page-exact).
    pub fn from_headings(&self, headings: &[HeadingCandidate], page_count: usize) -> ChapterTree {
        let Some(first) = headings.first() else {
            return ChapterTree::single_cover(page_count);
        };
        let last_page = page_count as i64 - 1;
        let lead = (0, first.page as i64 - 1);

        let sections = headings
            .iter()
            .enumerate()
            .map(|(index, heading)| Section {
                title: heading.text.clone(),
                start: heading.page as i64,
                end: headings
                    .get(index + 1)
                    .map_or(last_page, |next| next.page as i64 - 1),
            })
            .collect();

        self.build(Some(lead), sections, page_count)
    }

    /// Classify sections and assemble the tree.
    fn build(&self, lead: Option<Span>, sections: Vec<Section>, page_count: usize) -> ChapterTree {
        let last_page = page_count as i64 - 1;
        let clamp = |(start, end): Span| -> Option<Span> {
            let (start, end) = (start.max(0), end.min(last_page));
            (start <= end).then_some((start, end))
        };

        let mut cover = lead.and_then(clamp);
        let sections: Vec<Section> = sections
            .into_iter()
            .filter_map(|section| {
                let clamped = clamp((section.start, section.end));
                if clamped.is_none() {
                    debug!(
                        title = %section.title,
                        start = section.start,
                        end = section.end,
                        "Empty range dropped"
                    );
                }
                clamped.map(|(start, end)| Section { start, end, ..section })
            })
            .collect();

        let numbered_titles = sections.iter().any(|s| has_number(&s.title));
        let mut chapters: Vec<Section> = Vec::new();
        let mut back: Option<Span> = None;

        if numbered_titles {
            // Unnumbered sections before the first chapter extend the cover.
            // Later ones are held until the next chapter folds them into its
            // predecessor; whatever is still held at the end is back matter.
            let mut pending: Option<Span> = None;
            for section in sections {
                if has_number(&section.title) {
                    if let (Some((_, end)), Some(previous)) = (pending.take(), chapters.last_mut()) {
                        previous.end = end;
                    }
                    chapters.push(section);
                } else if chapters.is_empty() {
                    cover = Some(extend(cover, section.start, section.end));
                } else {
                    pending = Some(extend(pending, section.start, section.end));
                }
            }
            back = pending;
        } else {
            chapters = sections;
        }

        if chapters.is_empty() && cover.is_none() && back.is_none() {
            return ChapterTree::single_cover(page_count);
        }

        let mut used: HashSet<String> =
            [COVER_FOLDER.to_string(), BACK_FOLDER.to_string()].into_iter().collect();
        let leaves: Vec<ChapterRange> = chapters
            .into_iter()
            .map(|section| {
                let base = sanitize_name(&section.title, self.max_name_length, self.space_filler);
                let name = unique_name(base, &mut used, self.max_name_length);
                ChapterRange::new(name, section.start, section.end)
            })
            .collect();

        let cover = cover.map(|(start, end)| ChapterRange::new(COVER_FOLDER, start, end));
        let back = back.map(|(start, end)| ChapterRange::new(BACK_FOLDER, start, end));
        self.assemble(cover, leaves, back)
    }

    /// Lay out cover, chapters and back, grouping into parts when the
    /// chapter count exceeds the part size.
    fn assemble(
        &self,
        cover: Option<ChapterRange>,
        chapters: Vec<ChapterRange>,
        back: Option<ChapterRange>,
    ) -> ChapterTree {
        let mut tree = ChapterTree::new();
        let part_size = self.segmentation.part_size.max(1);

        if chapters.len() <= part_size {
            cover.into_iter()
                .chain(chapters)
                .chain(back)
                .for_each(|leaf| tree.insert_leaf(leaf));
            return tree;
        }

        let part_total = chapters.len().div_ceil(part_size);
        info!(chapters = chapters.len(), parts = part_total, "Grouping chapters into parts");

        let mut cover = cover;
        let mut back = back;
        let mut remaining = chapters.into_iter();
        for part_index in 0..part_total {
            let mut children: IndexMap<String, ChapterNode> = IndexMap::new();
            let mut add = |leaf: ChapterRange| {
                children.insert(leaf.name.clone(), ChapterNode::Leaf(leaf));
            };

            if part_index == 0
                && let Some(leaf) = cover.take()
            {
                add(leaf);
            }
            remaining.by_ref().take(part_size).for_each(&mut add);
            if part_index + 1 == part_total
                && let Some(leaf) = back.take()
            {
                add(leaf);
            }

            tree.insert_part(format!("part-{:03}", part_index + 1), children);
        }
        tree
    }
}

fn extend(span: Option<Span>, start: i64, end: i64) -> Span {
    match span {
        Some((existing, _)) => (existing, end),
        None => (start, end),
    }
}

/// `base`, or `base_2`, `base_3`, ... when taken. `base` is shortened so
/// the suffixed name stays within `max_len` characters.
fn unique_name(base: String, used: &mut HashSet<String>, max_len: usize) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut suffix = 2;
    loop {
        let tail = format!("_{suffix}");
        let room = max_len.saturating_sub(tail.chars().count());
        let stem: String = base.chars().take(room).collect();
        let candidate = format!("{stem}{tail}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}
