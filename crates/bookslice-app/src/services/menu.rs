// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Interactive menu: toggle test mode, process every book, process a single
// chapter, exit. Reads from any `BufRead` so a scripted session can drive it.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use bookslice_core::ProcessingConfig;
use bookslice_core::error::Result;
use bookslice_core::human_errors::humanize_error;
use bookslice_core::types::DocumentReport;

use super::batch::BatchReport;
use super::summary::{write_batch_summary, write_document_summary};

/// What the menu can ask the rest of the program to do.
pub trait MenuActions {
    fn list_books(&self) -> Result<Vec<PathBuf>>;
    fn process_all(&self, config: &ProcessingConfig) -> Result<BatchReport>;
    fn process_chapter(
        &self,
        file: &Path,
        number: u32,
        config: &ProcessingConfig,
    ) -> Result<DocumentReport>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ToggleTestMode,
    ProcessAll,
    ProcessChapter,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::ToggleTestMode),
            "2" => Some(Self::ProcessAll),
            "3" => Some(Self::ProcessChapter),
            "4" => Some(Self::Exit),
            _ => None,
        }
    }
}

pub struct Menu<R, W> {
    input: R,
    output: W,
    config: ProcessingConfig,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W, config: ProcessingConfig) -> Self {
        Self {
            input,
            output,
            config,
        }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Loop until the user exits or input ends.
    pub fn run<A: MenuActions>(&mut self, actions: &A) -> io::Result<()> {
        loop {
            self.show()?;
            let Some(line) = self.prompt("Select option (1-4): ")? else {
                break;
            };
            match MenuChoice::parse(&line) {
                Some(MenuChoice::ToggleTestMode) => {
                    self.config.test_mode = !self.config.test_mode;
                    writeln!(
                        self.output,
                        "Test mode {} (first {} pages per book)",
                        on_off(self.config.test_mode),
                        self.config.test_page_limit
                    )?;
                }
                Some(MenuChoice::ProcessAll) => self.process_all(actions)?,
                Some(MenuChoice::ProcessChapter) => self.process_chapter(actions)?,
                Some(MenuChoice::Exit) => {
                    writeln!(self.output, "\nExiting...")?;
                    break;
                }
                None => writeln!(self.output, "Invalid option, enter 1-4.")?,
            }
        }
        Ok(())
    }

    fn show(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n=== Bookslice ===")?;
        writeln!(
            self.output,
            "1. Toggle Test Mode (Currently: {})",
            on_off(self.config.test_mode)
        )?;
        writeln!(self.output, "2. Process All Books")?;
        writeln!(self.output, "3. Process Specific Chapter")?;
        writeln!(self.output, "4. Exit")
    }

    /// Print `label` and read one trimmed line; `None` at end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn process_all<A: MenuActions>(&mut self, actions: &A) -> io::Result<()> {
        match actions.process_all(&self.config) {
            Ok(report) => write_batch_summary(&mut self.output, &report),
            Err(err) => self.report_error(&err),
        }
    }

    fn process_chapter<A: MenuActions>(&mut self, actions: &A) -> io::Result<()> {
        let books = match actions.list_books() {
            Ok(books) => books,
            Err(err) => return self.report_error(&err),
        };
        if books.is_empty() {
            return writeln!(self.output, "No books found in this folder!");
        }

        writeln!(self.output, "\nAvailable books:")?;
        for (i, book) in books.iter().enumerate() {
            let name = book.file_name().unwrap_or(book.as_os_str());
            writeln!(self.output, "{}. {}", i + 1, name.to_string_lossy())?;
        }

        let Some(choice) = self.prompt("Select book (number): ")? else {
            return Ok(());
        };
        let Some(book) = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| books.get(i))
        else {
            return writeln!(self.output, "Invalid selection!");
        };

        let Some(number) = self.prompt("Enter chapter number to process: ")? else {
            return Ok(());
        };
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return writeln!(self.output, "Chapter number must be digits only!");
        }
        let Ok(number) = number.parse::<u32>() else {
            return writeln!(self.output, "Chapter number is too large!");
        };

        writeln!(
            self.output,
            "\nProcessing chapter {number} from {}",
            book.display()
        )?;
        match actions.process_chapter(book, number, &self.config) {
            Ok(report) => write_document_summary(&mut self.output, &report),
            Err(err) => self.report_error(&err),
        }
    }

    fn report_error(&mut self, err: &bookslice_core::BookSliceError) -> io::Result<()> {
        let human = humanize_error(err);
        writeln!(self.output, "✗ Failed: {}", human.message)?;
        writeln!(self.output, "    {}", human.suggestion)
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "ON" } else { "OFF" }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use bookslice_core::BookSliceError;

    use super::*;

    /// Records what the menu asked for.
    #[derive(Default)]
    struct Recorder {
        books: Vec<PathBuf>,
        batches: RefCell<Vec<bool>>,
        chapters: RefCell<Vec<(PathBuf, u32, bool)>>,
    }

    impl MenuActions for Recorder {
        fn list_books(&self) -> Result<Vec<PathBuf>> {
            Ok(self.books.clone())
        }

        fn process_all(&self, config: &ProcessingConfig) -> Result<BatchReport> {
            self.batches.borrow_mut().push(config.test_mode);
            Ok(BatchReport::default())
        }

        fn process_chapter(
            &self,
            file: &Path,
            number: u32,
            config: &ProcessingConfig,
        ) -> Result<DocumentReport> {
            self.chapters
                .borrow_mut()
                .push((file.to_path_buf(), number, config.test_mode));
            if number == 99 {
                return Err(BookSliceError::ChapterNotFound(number));
            }
            Ok(DocumentReport::new("book", 10))
        }
    }

    fn session(script: &str, actions: &Recorder) -> (String, ProcessingConfig) {
        let mut out = Vec::new();
        let mut menu = Menu::new(script.as_bytes(), &mut out, ProcessingConfig::default());
        menu.run(actions).expect("menu run");
        let config = menu.config().clone();
        drop(menu);
        (String::from_utf8(out).expect("utf8"), config)
    }

    #[test]
    fn parses_menu_choices() {
        assert_eq!(MenuChoice::parse(" 1 "), Some(MenuChoice::ToggleTestMode));
        assert_eq!(MenuChoice::parse("4"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("5"), None);
        assert_eq!(MenuChoice::parse(""), None);
    }

    #[test]
    fn toggling_test_mode_applies_to_later_runs() {
        let actions = Recorder::default();
        let (text, config) = session("2\n1\n2\n4\n", &actions);

        assert_eq!(*actions.batches.borrow(), vec![false, true]);
        assert!(config.test_mode);
        assert!(text.contains("Test mode ON (first 10 pages per book)"));
        assert!(text.contains("1. Toggle Test Mode (Currently: ON)"));
        assert!(text.ends_with("\nExiting...\n"));
    }

    #[test]
    fn end_of_input_leaves_the_loop() {
        let actions = Recorder::default();
        let (text, _) = session("9\n", &actions);
        assert!(text.contains("Invalid option, enter 1-4."));
        assert!(!text.contains("Exiting"));
    }

    #[test]
    fn chapter_flow_picks_book_and_number() {
        let actions = Recorder {
            books: vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")],
            ..Recorder::default()
        };
        let (text, _) = session("3\n2\n7\n4\n", &actions);

        assert_eq!(
            *actions.chapters.borrow(),
            vec![(PathBuf::from("b.pdf"), 7, false)]
        );
        assert!(text.contains("1. a.pdf\n2. b.pdf\n"));
        assert!(text.contains("Processing chapter 7 from b.pdf"));
    }

    #[test]
    fn chapter_flow_rejects_bad_input() {
        let actions = Recorder {
            books: vec![PathBuf::from("a.pdf")],
            ..Recorder::default()
        };
        let (text, _) = session("3\n5\n3\n1\nseven\n4\n", &actions);

        assert!(actions.chapters.borrow().is_empty());
        assert!(text.contains("Invalid selection!"));
        assert!(text.contains("Chapter number must be digits only!"));
    }

    #[test]
    fn missing_chapter_is_reported_humanely() {
        let actions = Recorder {
            books: vec![PathBuf::from("a.pdf")],
            ..Recorder::default()
        };
        let (text, _) = session("3\n1\n99\n4\n", &actions);
        assert!(text.contains("✗ Failed: Chapter 99 is not in this book."));
    }

    #[test]
    fn empty_folder_has_no_chapters_to_pick() {
        let actions = Recorder::default();
        let (text, _) = session("3\n4\n", &actions);
        assert!(text.contains("No books found in this folder!"));
    }
}
