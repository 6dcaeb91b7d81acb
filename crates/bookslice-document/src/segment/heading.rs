// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Chapter-opening heading detection over page text spans.

use std::sync::LazyLock;

use bookslice_core::config::SegmentationConfig;
use bookslice_core::types::{HeadingCandidate, PageIndex, TextSpan};
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::source::DocumentSource;

/// A chapter keyword followed by a number: "Chapter 7", "ch.12", "CH 3".
static CHAPTER_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:chapter|ch)\.?\s*(\d+)\b").expect("chapter pattern is valid")
});

static DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit pattern is valid"));

/// Rewrite every "chapter N" reference to the canonical `ch NNNN`.
///
/// The rest of the text is preserved.
pub fn normalize_chapter_numbers(text: &str) -> String {
    CHAPTER_NUMBER_RE
        .replace_all(text, |caps: &regex::Captures<'_>| match caps[1].parse::<u64>() {
            Ok(number) => format!("ch {number:04}"),
            Err(_) => caps[0].to_string(),
        })
        .into_owned()
}

/// Whether `text` carries any digit run.
pub fn has_number(text: &str) -> bool {
    DIGITS_RE.is_match(text)
}

/// Numeric values of every digit run in `text`, in order.
pub fn numbers_in(text: &str) -> impl Iterator<Item = u64> + '_ {
    DIGITS_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u64>().ok())
}

/// Judges whether a page opens a chapter.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingDetector {
    /// Minimum font size in points.
    min_font_size: f32,
    /// Trimmed text must be strictly longer than this.
    min_chars: usize,
}

impl HeadingDetector {
    pub fn new(min_font_size: f32, min_chars: usize) -> Self {
        Self {
            min_font_size,
            min_chars,
        }
    }

    pub fn from_config(config: &SegmentationConfig) -> Self {
        Self::new(config.heading_font_size, config.heading_min_chars)
    }

    fn qualifies(&self, span: &TextSpan) -> bool {
        span.bold
            && span.font_size >= self.min_font_size
            && span.text.trim().chars().count() > self.min_chars
    }

    /// Inspect one page's spans in reading order.
    ///
    /// The first qualifying span is the candidate; it is accepted only when
    /// it is also the first span on the page carrying any text, so large
    /// bold pull-quotes further down do not count.
    pub fn detect(&self, page: PageIndex, spans: &[TextSpan]) -> Option<HeadingCandidate> {
        let candidate = spans.iter().position(|span| self.qualifies(span))?;
        let first_text = spans.iter().position(|span| !span.text.trim().is_empty())?;
        if candidate != first_text {
            debug!(page, "Large bold text is not at the top of the page");
            return None;
        }

        let span = &spans[candidate];
        Some(HeadingCandidate {
            page,
            text: normalize_chapter_numbers(span.text.trim()),
            font_size: span.font_size,
            bold: span.bold,
        })
    }

    /// Scan every page of `doc` in order and collect chapter openers.
    ///
    /// With `skip_next`, the page after an accepted heading is not examined.
    /// A page whose text cannot be read is skipped with a warning.
    #[instrument(skip_all, fields(pages = doc.page_count()))]
    pub fn scan<D: DocumentSource + ?Sized>(&self, doc: &D, skip_next: bool) -> Vec<HeadingCandidate> {
        let page_count = doc.page_count();
        let mut headings = Vec::new();
        let mut page = 0;

        while page < page_count {
            let spans = match doc.page_text_spans(page) {
                Ok(spans) => spans,
                Err(err) => {
                    warn!(page, %err, "Could not read page text; skipping");
                    page += 1;
                    continue;
                }
            };

            if let Some(heading) = self.detect(page, &spans) {
                debug!(page, text = %heading.text, "Chapter heading");
                headings.push(heading);
                if skip_next {
                    page += 1;
                }
            }
            page += 1;
        }

        headings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryDocument;

    fn detector() -> HeadingDetector {
        HeadingDetector::new(20.0, 3)
    }

    #[test]
    fn normalizes_chapter_numbers() {
        assert_eq!(normalize_chapter_numbers("Chapter 7: The Storm"), "ch 0007: The Storm");
        assert_eq!(normalize_chapter_numbers("CH.12"), "ch 0012");
        assert_eq!(normalize_chapter_numbers("chapter12 and Chapter 3"), "ch 0012 and ch 0003");
        assert_eq!(normalize_chapter_numbers("Epilogue"), "Epilogue");
        // "ch" inside a word is not a keyword.
        assert_eq!(normalize_chapter_numbers("Munich 1972"), "Munich 1972");
    }

    #[test]
    fn numbers_are_found() {
        assert!(has_number("ch 0007"));
        assert!(!has_number("Prologue"));
        assert_eq!(numbers_in("Part 2, ch 0017").collect::<Vec<_>>(), vec![2, 17]);
    }

    #[test]
    fn accepts_top_of_page_heading() {
        let spans = vec![
            TextSpan::new("Chapter 1", 24.0, true),
            TextSpan::new("It was a dark and stormy night.", 11.0, false),
        ];
        let heading = detector().detect(4, &spans).expect("heading");
        assert_eq!(heading.page, 4);
        assert_eq!(heading.text, "ch 0001");
        assert!(heading.bold);
    }

    #[test]
    fn rejects_mid_page_large_bold_text() {
        let spans = vec![
            TextSpan::new("body text first", 11.0, false).at(72.0, 90.0),
            TextSpan::new("A Pull Quote", 28.0, true).at(72.0, 400.0),
        ];
        assert!(detector().detect(0, &spans).is_none());
    }

    #[test]
    fn whitespace_spans_do_not_count_as_first() {
        let spans = vec![
            TextSpan::new("   ", 11.0, false),
            TextSpan::new("Chapter 2", 24.0, true),
        ];
        assert!(detector().detect(0, &spans).is_some());
    }

    #[test]
    fn requires_size_bold_and_length() {
        let d = detector();
        assert!(d.detect(0, &[TextSpan::new("Chapter 1", 19.5, true)]).is_none());
        assert!(d.detect(0, &[TextSpan::new("Chapter 1", 24.0, false)]).is_none());
        // Page numbers and short running heads are too short.
        assert!(d.detect(0, &[TextSpan::new("123", 24.0, true)]).is_none());
        assert!(d.detect(0, &[TextSpan::new("Four", 24.0, true)]).is_some());
        assert!(d.detect(0, &[]).is_none());
    }

    #[test]
    fn scan_skips_the_page_after_a_heading() {
        let doc = InMemoryDocument::new(6)
            .with_spans(0, vec![TextSpan::new("Chapter 1", 24.0, true)])
            .with_spans(1, vec![TextSpan::new("A Subheading", 24.0, true)])
            .with_spans(3, vec![TextSpan::new("Chapter 2", 24.0, true)]);

        let pages: Vec<PageIndex> = detector().scan(&doc, true).iter().map(|h| h.page).collect();
        assert_eq!(pages, vec![0, 3]);

        let pages: Vec<PageIndex> = detector().scan(&doc, false).iter().map(|h| h.page).collect();
        assert_eq!(pages, vec![0, 1, 3]);
    }
}
