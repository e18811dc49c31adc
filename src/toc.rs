//! Table of contents detection and parsing.
//!
//! A printed table of contents is recognized in two steps:
//!
//! 1. **Window selection**: pages carrying a TOC marker ("TABLE OF CONTENTS",
//!    "Table of Contents") are always kept; other pages are kept while the
//!    window holds fewer than `toc_window_pages` pages.
//! 2. **Isolation and structuring**: window pages containing a dot leader
//!    (`......`) are concatenated, everything up to the marker is dropped,
//!    and each remaining line becomes either a section heading (it contains
//!    the word "section" in any case) or a chapter of the open section.
//!
//! Each entry is named by the text before its first `.`, so
//! `"SECTION A.......1"` yields `"SECTION A"`.

use crate::config::ExtractionConfig;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping from section name to its chapter names.
///
/// Sections keep the order in which they appear in the table of contents,
/// as do the chapters within each section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TocStructure {
    sections: IndexMap<String, Vec<String>>,
}

impl TocStructure {
    /// Create an empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a section, or re-open it if the name was already seen.
    ///
    /// Returns `true` when the section is new.
    pub fn open_section(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.sections.contains_key(&name) {
            return false;
        }
        self.sections.insert(name, Vec::new());
        true
    }

    /// Append a chapter to an existing section.
    ///
    /// Returns `false` when the section does not exist.
    pub fn push_chapter(&mut self, section: &str, chapter: impl Into<String>) -> bool {
        match self.sections.get_mut(section) {
            Some(chapters) => {
                chapters.push(chapter.into());
                true
            },
            None => false,
        }
    }

    /// Iterate sections and their chapters in TOC order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.sections
            .iter()
            .map(|(name, chapters)| (name.as_str(), chapters.as_slice()))
    }

    /// Section names in TOC order.
    pub fn section_names(&self) -> Vec<&str> {
        self.sections.keys().map(String::as_str).collect()
    }

    /// Chapters of one section.
    pub fn chapters(&self, section: &str) -> Option<&[String]> {
        self.sections.get(section).map(Vec::as_slice)
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether no section was found.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total number of chapters over all sections.
    pub fn chapter_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }
}

/// The pages scanned for the literal TOC listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocWindow<'a> {
    pages: Vec<(usize, &'a str)>,
}

impl<'a> TocWindow<'a> {
    /// Zero-based page indices in the window, in document order.
    pub fn page_indices(&self) -> Vec<usize> {
        self.pages.iter().map(|(index, _)| *index).collect()
    }

    /// Page texts in the window, in document order.
    pub fn pages(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.pages.iter().map(|(_, text)| *text)
    }

    /// Number of pages in the window.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Locates and parses the printed table of contents.
#[derive(Debug, Clone, Default)]
pub struct TocParser {
    config: ExtractionConfig,
}

impl TocParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom settings.
    pub fn with_config(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// The parser's configuration.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Whether a page is a TOC page (carries a marker).
    pub fn is_toc_page(&self, page: &str) -> bool {
        self.config.is_toc_page(page)
    }

    /// Collect the TOC window from the document's pages.
    ///
    /// Marker pages are always included. A non-marker page is included only
    /// while the window holds fewer than `toc_window_pages` pages.
    pub fn select_window<'a, S: AsRef<str>>(&self, pages: &'a [S]) -> TocWindow<'a> {
        let cap = self.config.toc_window_pages;
        let mut window = Vec::new();

        for (index, page) in pages.iter().enumerate() {
            let text = page.as_ref();
            if self.is_toc_page(text) || window.len() < cap {
                window.push((index, text));
            }
        }

        TocWindow { pages: window }
    }

    /// Extract the raw TOC body from the window.
    ///
    /// Pages containing a dot leader are joined with newlines; the text is cut
    /// after the first occurrence of the highest-priority marker present.
    /// Returns an empty string when no window page has a dot leader.
    pub fn find_toc_text(&self, window: &TocWindow<'_>) -> String {
        let leader = self.config.dot_leader();
        let toc_pages: Vec<&str> = window.pages().filter(|page| page.contains(&leader)).collect();

        if toc_pages.is_empty() {
            return String::new();
        }
        log::debug!("Found dot leaders on {} window page(s)", toc_pages.len());

        let text = toc_pages.join("\n");
        for marker in &self.config.toc_markers {
            if let Some(pos) = text.find(marker.as_str()) {
                return text[pos + marker.len()..].to_string();
            }
        }
        text
    }

    /// Parse raw TOC text into sections and chapters.
    ///
    /// Chapter lines seen before any section are skipped with a warning, as
    /// are lines whose name (text before the first `.`) is empty.
    pub fn parse(&self, toc_text: &str) -> TocStructure {
        let keyword = self.config.section_keyword.to_lowercase();
        let mut toc = TocStructure::new();
        let mut current: Option<String> = None;

        for (line_no, line) in toc_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
        {
            let name = entry_name(line);
            if name.is_empty() {
                log::warn!("Skipping TOC line {} with no name: {:?}", line_no + 1, line);
                continue;
            }

            if line.to_lowercase().contains(&keyword) {
                if !toc.open_section(name) {
                    log::warn!("Section {:?} listed twice; appending to the first", name);
                }
                log::debug!("Section: {}", name);
                current = Some(name.to_string());
                continue;
            }

            match &current {
                Some(section) => {
                    log::debug!("Chapter: {} (in {})", name, section);
                    toc.push_chapter(section, name);
                },
                None => {
                    log::warn!("Skipping chapter {:?}: no section declared before it", name);
                },
            }
        }

        toc
    }

    /// Select the window, isolate the TOC text and parse it.
    pub fn extract<S: AsRef<str>>(&self, pages: &[S]) -> TocStructure {
        let window = self.select_window(pages);
        let toc_text = self.find_toc_text(&window);
        if toc_text.trim().is_empty() {
            log::warn!("Could not find a table of contents");
            return TocStructure::new();
        }
        self.parse(&toc_text)
    }
}

/// Parse raw TOC text with the default settings.
pub fn parse_toc(toc_text: &str) -> TocStructure {
    TocParser::new().parse(toc_text)
}

/// Name of a TOC entry: the trimmed text before its first `.`.
pub fn entry_name(line: &str) -> &str {
    line.split('.').next().unwrap_or_default().trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_entry_name() {
        assert_eq!(entry_name("SECTION A.......1"), "SECTION A");
        assert_eq!(entry_name("  Chapter One ...... 2"), "Chapter One");
        assert_eq!(entry_name("No dots here"), "No dots here");
        assert_eq!(entry_name("......3"), "");
    }

    #[test]
    fn test_window_caps_non_marker_pages() {
        let parser = TocParser::new();
        let doc = pages(&["p0", "p1", "p2", "p3", "p4", "p5", "Table of Contents", "p7"]);
        let window = parser.select_window(&doc);
        assert_eq!(window.page_indices(), vec![0, 1, 2, 3, 4, 6]);
    }

    #[test]
    fn test_window_includes_every_marker_page() {
        let parser = TocParser::with_config(ExtractionConfig::new().with_toc_window_pages(1));
        let doc = pages(&["TABLE OF CONTENTS", "body", "Table of Contents (cont.)", "more"]);
        let window = parser.select_window(&doc);
        assert_eq!(window.page_indices(), vec![0, 2]);
    }

    #[test]
    fn test_find_toc_text_strips_before_marker() {
        let parser = TocParser::new();
        let doc = pages(&[
            "Cover",
            "Preface",
            "Front matter\nTable of Contents\nSECTION 1......1\nIntro......2",
            "Body",
            "More body",
        ]);
        let window = parser.select_window(&doc);
        let text = parser.find_toc_text(&window);
        assert_eq!(text, "\nSECTION 1......1\nIntro......2");
    }

    #[test]
    fn test_find_toc_text_without_leaders_is_empty() {
        let parser = TocParser::new();
        let doc = pages(&["TABLE OF CONTENTS\nSECTION 1.....1"]);
        let window = parser.select_window(&doc);
        assert_eq!(parser.find_toc_text(&window), "");
    }

    #[test]
    fn test_uppercase_marker_takes_priority() {
        let parser = TocParser::new();
        let doc = pages(&["Table of Contents\nx......1\nTABLE OF CONTENTS\ny......2"]);
        let window = parser.select_window(&doc);
        assert_eq!(parser.find_toc_text(&window), "\ny......2");
    }

    #[test]
    fn test_parse_sections_and_chapters() {
        let parser = TocParser::new();
        let toc = parser.parse(
            "\nSECTION 1 General......1\nScope......2\nTerms......3\n\nSection 2 Rules......4\nLimits......5\n",
        );
        assert_eq!(toc.section_names(), vec!["SECTION 1 General", "Section 2 Rules"]);
        assert_eq!(toc.chapters("SECTION 1 General").unwrap(), ["Scope", "Terms"]);
        assert_eq!(toc.chapters("Section 2 Rules").unwrap(), ["Limits"]);
        assert_eq!(toc.chapter_count(), 3);
    }

    #[test]
    fn test_orphan_chapter_is_skipped() {
        let parser = TocParser::new();
        let toc = parser.parse("Foreword......i\nSECTION A......1\nChapter One......2");
        assert_eq!(toc.section_names(), vec!["SECTION A"]);
        assert_eq!(toc.chapters("SECTION A").unwrap(), ["Chapter One"]);
    }

    #[test]
    fn test_repeated_section_reopens_existing() {
        let parser = TocParser::new();
        let toc = parser.parse("SECTION A......1\nOne......2\nSECTION A......3\nTwo......4");
        assert_eq!(toc.len(), 1);
        assert_eq!(toc.chapters("SECTION A").unwrap(), ["One", "Two"]);
    }

    #[test]
    fn test_keyword_matches_any_case() {
        let parser = TocParser::new();
        let toc = parser.parse("subsection overview......1\nDetails......2");
        assert_eq!(toc.section_names(), vec!["subsection overview"]);
    }

    #[test]
    fn test_extract_without_toc_is_empty() {
        let parser = TocParser::new();
        let doc = pages(&["Just a letter", "with two pages"]);
        assert!(parser.extract(&doc).is_empty());
    }

    #[test]
    fn test_structure_serializes_as_ordered_map() {
        let mut toc = TocStructure::new();
        toc.open_section("Z first");
        toc.push_chapter("Z first", "b");
        toc.open_section("A second");
        let json = serde_json::to_string(&toc).unwrap();
        assert_eq!(json, r#"{"Z first":["b"],"A second":[]}"#);
        let back: TocStructure = serde_json::from_str(&json).unwrap();
        assert_eq!(back, toc);
    }
}
