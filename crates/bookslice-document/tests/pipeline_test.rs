// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end pipeline tests over scripted in-memory documents.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use bookslice_core::config::ProcessingConfig;
use bookslice_core::error::BookSliceError;
use bookslice_core::types::{BACK_FOLDER, COVER_FOLDER, DocumentReport, OutlineEntry, TextSpan};
use bookslice_document::{
    ChapterSegmenter, InMemoryDocument, process_chapter, process_document,
    process_document_parallel,
};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use regex::Regex;

/// A page with a line of "text" near the top and another near the bottom.
fn text_page() -> DynamicImage {
    let mut image = GrayImage::from_pixel(200, 300, Luma([255]));
    draw_filled_rect_mut(&mut image, Rect::at(20, 40).of_size(160, 10), Luma([0]));
    draw_filled_rect_mut(&mut image, Rect::at(20, 240).of_size(160, 10), Luma([0]));
    DynamicImage::ImageLuma8(image)
}

fn outline(items: &[(&str, u32)]) -> Vec<OutlineEntry> {
    items
        .iter()
        .map(|(title, page)| OutlineEntry::new(1, *title, *page))
        .collect()
}

/// Artifact paths relative to the book directory, as strings.
fn relative_artifacts(report: &DocumentReport, book_dir: &Path) -> BTreeSet<String> {
    report
        .artifact_paths()
        .into_iter()
        .filter_map(|path| path.strip_prefix(book_dir).ok())
        .map(|path| path.to_string_lossy().replace('\\', "/"))
        .collect()
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return found;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            found.extend(files_under(&path));
        } else {
            found.push(path);
        }
    }
    found
}

#[test]
fn outline_scenario_segments_with_boundary_convention() {
    let doc = InMemoryDocument::new(120).with_outline(outline(&[("One", 5), ("Two", 40), ("Three", 81)]));
    let tree = ChapterSegmenter::new(&ProcessingConfig::default()).segment(&doc);

    let ranges: Vec<(String, i64, i64)> = tree
        .leaves()
        .iter()
        .map(|leaf| (leaf.range.name.clone(), leaf.range.start, leaf.range.end))
        .collect();
    assert_eq!(
        ranges,
        vec![
            (COVER_FOLDER.to_string(), 0, 3),
            ("One".to_string(), 4, 38),
            ("Two".to_string(), 39, 79),
            ("Three".to_string(), 80, 119),
        ]
    );
}

#[test]
fn headingless_document_goes_to_cover() {
    let dir = tempfile::tempdir().expect("tempdir");
    let book_dir = dir.path().join("book");
    let doc = InMemoryDocument::new(3)
        .with_default_raster(text_page())
        .with_spans(0, vec![TextSpan::new("small body text", 11.0, false)]);

    let report = process_document(&doc, &book_dir, &ProcessingConfig::default()).expect("process");

    assert_eq!(report.chapter_count, 1);
    assert!(report.bitmap_count() <= 6);
    assert_eq!(report.bitmap_count(), 6);
    assert!(report.is_clean());
    for path in report.artifact_paths() {
        assert!(path.starts_with(book_dir.join(COVER_FOLDER)));
        assert!(path.is_file());
    }
}

#[test]
fn artifact_names_follow_page_pattern_and_are_unique() {
    let dir = tempfile::tempdir().expect("tempdir");
    let book_dir = dir.path().join("book");
    let doc = InMemoryDocument::new(12)
        .with_outline(outline(&[("Chapter 1", 2), ("Chapter 2", 7)]))
        .with_default_raster(text_page());

    let report = process_document(&doc, &book_dir, &ProcessingConfig::default()).expect("process");

    let pattern = Regex::new(r"^\d{4}[ab]\.bmp$").expect("pattern");
    let names: Vec<String> = report
        .artifact_paths()
        .iter()
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    assert_eq!(names.len(), 24);
    assert!(names.iter().all(|name| pattern.is_match(name)));

    let unique: BTreeSet<&PathBuf> = report.artifact_paths().into_iter().collect();
    assert_eq!(unique.len(), names.len());

    let artifacts = relative_artifacts(&report, &book_dir);
    assert!(artifacts.contains(&format!("{COVER_FOLDER}/0001a.bmp")));
    assert!(artifacts.contains("ch_0001/0002a.bmp"));
    assert!(artifacts.contains("ch_0001/0006b.bmp"));
    assert!(artifacts.contains("ch_0002/0007a.bmp"));
    assert!(artifacts.contains("ch_0002/0012b.bmp"));
}

#[test]
fn tight_path_budget_shortens_folders_not_file_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    let book_dir = dir.path().join("book");
    let alpha = format!("Alpha {}", "a".repeat(60));
    let beta = format!("Beta {}", "b".repeat(60));
    let doc = InMemoryDocument::new(6)
        .with_outline(outline(&[(&alpha, 2), (&beta, 4)]))
        .with_default_raster(text_page());
    let mut config = ProcessingConfig::default();
    let budget = book_dir.to_string_lossy().chars().count() + 24;
    config.output.max_path_length = budget;

    let report = process_document(&doc, &book_dir, &config).expect("process");

    assert!(report.is_clean());
    assert_eq!(report.bitmap_count(), 12);
    assert_eq!(files_under(&book_dir).len(), 12);

    let pattern = Regex::new(r"^\d{4}[ab]\.bmp$").expect("pattern");
    let mut folders = BTreeSet::new();
    for path in report.artifact_paths() {
        assert!(path.to_string_lossy().chars().count() <= budget);
        let relative = path.strip_prefix(&book_dir).expect("inside book folder");
        let parts: Vec<String> = relative
            .iter()
            .map(|part| part.to_string_lossy().into_owned())
            .collect();
        assert_eq!(parts.len(), 2);
        assert!(pattern.is_match(&parts[1]));
        folders.insert(parts[0].clone());
    }
    let expected: BTreeSet<String> = [COVER_FOLDER, "Alpha_aaaaaa", "Beta_bbbbbbb"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(folders, expected);
}

#[test]
fn test_mode_caps_pages() {
    let dir = tempfile::tempdir().expect("tempdir");
    let book_dir = dir.path().join("book");
    let doc = InMemoryDocument::new(25).with_default_raster(text_page());
    let config = ProcessingConfig {
        test_mode: true,
        ..ProcessingConfig::default()
    };

    let report = process_document(&doc, &book_dir, &config).expect("process");

    assert_eq!(report.page_count, 25);
    assert_eq!(report.pages_attempted, 10);
    assert_eq!(report.pages.len(), 10);
    assert_eq!(files_under(&book_dir).len(), 20);
}

#[test]
fn blank_pages_produce_no_bitmaps() {
    let dir = tempfile::tempdir().expect("tempdir");
    let book_dir = dir.path().join("book");
    let doc = InMemoryDocument::new(2).with_raster(0, text_page());

    let report = process_document(&doc, &book_dir, &ProcessingConfig::default()).expect("process");

    assert_eq!(report.bitmap_count(), 2);
    assert!(report.pages[1].bitmaps.is_empty());
}

#[test]
fn one_failing_page_does_not_stop_the_book() {
    let dir = tempfile::tempdir().expect("tempdir");
    let book_dir = dir.path().join("book");
    let doc = InMemoryDocument::new(3)
        .with_default_raster(text_page())
        .with_render_failure(1);

    let report = process_document(&doc, &book_dir, &ProcessingConfig::default()).expect("process");

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].page, 1);
    assert!(report.failures[0].reason.contains("page 1"));
    let written: Vec<usize> = report.pages.iter().map(|p| p.page).collect();
    assert_eq!(written, vec![0, 2]);
    assert_eq!(report.bitmap_count(), 4);
}

#[test]
fn empty_document_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let book_dir = dir.path().join("book");
    let report =
        process_document(&InMemoryDocument::new(0), &book_dir, &ProcessingConfig::default())
            .expect("process");

    assert_eq!(report.pages_attempted, 0);
    assert!(report.artifact_paths().is_empty());
    assert!(report.is_clean());
    assert!(files_under(&book_dir).is_empty());
}

#[test]
fn chapter_selection_writes_only_that_chapter() {
    let dir = tempfile::tempdir().expect("tempdir");
    let book_dir = dir.path().join("book");
    let doc = InMemoryDocument::new(8)
        .with_outline(outline(&[("Chapter 1", 2), ("Chapter 2", 5)]))
        .with_default_raster(text_page());

    let report = process_chapter(&doc, &book_dir, 2, &ProcessingConfig::default()).expect("chapter");

    // Chapter 2 opens at index 4 and runs to the last page.
    let pages: Vec<usize> = report.pages.iter().map(|p| p.page).collect();
    assert_eq!(pages, vec![4, 5, 6, 7]);
    let artifacts = relative_artifacts(&report, &book_dir);
    assert!(artifacts.iter().all(|path| path.starts_with("ch_0002/")));
    assert!(artifacts.contains("ch_0002/0005a.bmp"));
    assert_eq!(files_under(&book_dir).len(), 8);
}

#[test]
fn chapter_number_matches_numerically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = InMemoryDocument::new(6)
        .with_outline(outline(&[("Chapter 7", 1), ("Chapter 17", 4)]))
        .with_default_raster(text_page());

    let report =
        process_chapter(&doc, dir.path(), 7, &ProcessingConfig::default()).expect("chapter");
    let pages: Vec<usize> = report.pages.iter().map(|p| p.page).collect();
    assert_eq!(pages, vec![0, 1, 2]);
}

#[test]
fn missing_chapter_is_reported_and_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let book_dir = dir.path().join("book");
    let doc = InMemoryDocument::new(8)
        .with_outline(outline(&[("Chapter 1", 2), ("Chapter 2", 5)]))
        .with_default_raster(text_page());

    let result = process_chapter(&doc, &book_dir, 9, &ProcessingConfig::default());

    assert!(matches!(result, Err(BookSliceError::ChapterNotFound(9))));
    assert!(files_under(&book_dir).is_empty());
}

#[test]
fn reserved_folders_are_never_chapter_matches() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = InMemoryDocument::new(10)
        .with_outline(outline(&[("Preface", 1), ("Chapter 1", 3), ("Index", 8)]))
        .with_default_raster(text_page());

    // "0000_cover" and "9999_back" carry digits but are not chapters.
    let result = process_chapter(&doc, dir.path(), 9999, &ProcessingConfig::default());
    assert!(matches!(result, Err(BookSliceError::ChapterNotFound(9999))));

    let tree = ChapterSegmenter::new(&ProcessingConfig::default()).segment(&doc);
    assert!(tree.get(BACK_FOLDER).is_some());
}

#[test]
fn parallel_run_matches_sequential_run() {
    let doc = InMemoryDocument::new(9)
        .with_outline(outline(&[("Chapter 1", 3), ("Chapter 2", 6)]))
        .with_default_raster(text_page())
        .with_render_failure(4);

    let sequential_dir = tempfile::tempdir().expect("tempdir");
    let sequential_book = sequential_dir.path().join("book");
    let sequential =
        process_document(&doc, &sequential_book, &ProcessingConfig::default()).expect("sequential");

    let parallel_dir = tempfile::tempdir().expect("tempdir");
    let parallel_book = parallel_dir.path().join("book");
    let config = ProcessingConfig {
        workers: 3,
        ..ProcessingConfig::default()
    };
    let parallel =
        process_document_parallel(|| Ok(doc.clone()), &parallel_book, &config).expect("parallel");

    assert_eq!(
        relative_artifacts(&sequential, &sequential_book),
        relative_artifacts(&parallel, &parallel_book)
    );
    assert_eq!(sequential.failures, parallel.failures);
    let pages: Vec<usize> = parallel.pages.iter().map(|p| p.page).collect();
    assert_eq!(pages, vec![0, 1, 2, 3, 5, 6, 7, 8]);
}

#[test]
fn long_chapter_lists_are_written_into_parts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let book_dir = dir.path().join("book");
    let entries: Vec<OutlineEntry> = (1..=120)
        .map(|n| OutlineEntry::new(1, format!("Chapter {n}"), n + 1))
        .collect();
    let doc = InMemoryDocument::new(121)
        .with_outline(entries)
        .with_default_raster(text_page());
    let config = ProcessingConfig {
        test_mode: true,
        test_page_limit: 3,
        ..ProcessingConfig::default()
    };

    let report = process_document(&doc, &book_dir, &config).expect("process");

    let artifacts = relative_artifacts(&report, &book_dir);
    assert!(artifacts.contains(&format!("part-001/{COVER_FOLDER}/0001a.bmp")));
    assert!(artifacts.contains("part-001/ch_0001/0002a.bmp"));
    assert!(artifacts.contains("part-001/ch_0002/0003b.bmp"));
    assert_eq!(report.chapter_count, 121);
}

#[test]
fn text_export_writes_cp1252_pages() {
    let dir = tempfile::tempdir().expect("tempdir");
    let book_dir = dir.path().join("book");
    let doc = InMemoryDocument::new(2)
        .with_default_raster(text_page())
        .with_spans(0, vec![TextSpan::new("Café au lait", 11.0, false)]);
    let mut config = ProcessingConfig::default();
    config.output.write_text = true;

    let report = process_document(&doc, &book_dir, &config).expect("process");

    let text = report.pages[0].text.as_ref().expect("page 1 has text");
    assert!(text.ends_with("0001.txt"));
    assert_eq!(std::fs::read(text).expect("read"), b"Caf\xe9 au lait".to_vec());
    assert!(report.pages[1].text.is_none());
    assert_eq!(report.bitmap_count(), 4);
}

#[test]
fn invalid_configuration_is_rejected_before_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let book_dir = dir.path().join("book");
    let mut config = ProcessingConfig::default();
    config.transform.rotate_degrees = 45;

    let result = process_document(&InMemoryDocument::new(2), &book_dir, &config);

    assert!(matches!(result, Err(BookSliceError::Config(_))));
    assert!(!book_dir.exists());
}
