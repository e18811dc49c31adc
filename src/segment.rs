//! Carving the body text into sections and chapters.
//!
//! For every section the span runs from its heading to the next section's
//! heading (or the end of the text). Chapters are then located inside their
//! section's span only, each ending at the next chapter of the same section,
//! else at the next section's heading, else at the end of the section span.
//!
//! Headings are matched literally and case-insensitively, with one
//! exception: a section's own name is used as a raw regular expression when
//! locating the start of that section. A name containing regex
//! metacharacters can therefore match unexpected text; a name that is not a
//! valid pattern at all falls back to literal matching.

use crate::boundary::{self, EndBoundary};
use crate::content::{ChapterNode, ContentTree, SectionNode};
use crate::error::Error;
use crate::tables;
use crate::toc::TocStructure;

/// Segment `body_text` according to the table of contents.
pub fn segment(toc: &TocStructure, body_text: &str) -> ContentTree {
    let sections: Vec<(&str, &[String])> = toc.iter().collect();
    let mut tree = ContentTree::new();

    for (i, (section_name, chapters)) in sections.iter().enumerate() {
        let next_section = sections.get(i + 1).map(|(name, _)| *name);
        let section_text = section_span(body_text, section_name, next_section);

        if section_text.is_empty() {
            log::warn!("Section {:?} not found in body text", section_name);
        }

        let mut node = SectionNode {
            text: section_text,
            ..Default::default()
        };

        for (j, chapter_name) in chapters.iter().enumerate() {
            let next = chapters.get(j + 1).map(String::as_str).or(next_section);
            let chapter_text = chapter_span(&node.text, chapter_name, next);
            if chapter_text.is_empty() {
                log::warn!(
                    "Chapter {:?} not found in section {:?}",
                    chapter_name,
                    section_name
                );
            }

            let tables = tables::find_tables(&chapter_text);
            node.chapters.insert(
                chapter_name.clone(),
                ChapterNode {
                    text: chapter_text,
                    tables,
                    summary: None,
                },
            );
        }

        log::debug!(
            "Section {:?}: {} chars, {} chapter(s)",
            section_name,
            node.text.len(),
            node.chapters.len()
        );
        tree.insert_section(*section_name, node);
    }

    tree
}

/// Span of one section; its own name is a raw pattern, the next one literal.
fn section_span(body_text: &str, name: &str, next_section: Option<&str>) -> String {
    let end = next_section.map(boundary::literal);
    let end = EndBoundary::from_option(end.as_deref());

    match boundary::locate(body_text, name, end) {
        Ok(span) => span,
        Err(Error::InvalidPattern { reason, .. }) => {
            log::warn!(
                "Section name {:?} is not a valid pattern ({}); matching it literally",
                name,
                reason
            );
            literal_span(body_text, name, end)
        },
        Err(e) => {
            log::warn!("Could not locate section {:?}: {}", name, e);
            String::new()
        },
    }
}

/// Span of one chapter within its section; both names are literal.
fn chapter_span(section_text: &str, name: &str, next: Option<&str>) -> String {
    let end = next.map(boundary::literal);
    literal_span(section_text, name, EndBoundary::from_option(end.as_deref()))
}

fn literal_span(text: &str, name: &str, end: EndBoundary<'_>) -> String {
    // Escaped patterns always compile.
    boundary::locate(text, &boundary::literal(name), end).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toc(entries: &[(&str, &[&str])]) -> TocStructure {
        let mut toc = TocStructure::new();
        for (section, chapters) in entries {
            toc.open_section(*section);
            for chapter in *chapters {
                toc.push_chapter(section, *chapter);
            }
        }
        toc
    }

    #[test]
    fn test_section_ends_before_next_section() {
        let toc = toc(&[("SECTION 1", &[]), ("SECTION 2", &[])]);
        let tree = segment(&toc, "preamble SECTION 1 intro text SECTION 2 outro text");
        assert_eq!(tree.section("SECTION 1").unwrap().text, "intro text");
        assert_eq!(tree.section("SECTION 2").unwrap().text, "outro text");
    }

    #[test]
    fn test_chapters_split_section_span() {
        let toc = toc(&[("SECTION A", &["Chapter One", "Chapter Two"]), ("SECTION B", &["Last"])]);
        let body = "SECTION A\nChapter One\nfirst body\nChapter Two\nsecond body\n\
                    SECTION B\nLast\nfinal body";
        let tree = segment(&toc, body);
        assert_eq!(tree.chapter("SECTION A", "Chapter One").unwrap().text, "first body");
        assert_eq!(tree.chapter("SECTION A", "Chapter Two").unwrap().text, "second body");
        assert_eq!(tree.chapter("SECTION B", "Last").unwrap().text, "final body");
    }

    #[test]
    fn test_missing_section_is_empty() {
        let toc = toc(&[("SECTION X", &["Ghost"])]);
        let tree = segment(&toc, "nothing relevant here");
        let section = tree.section("SECTION X").unwrap();
        assert_eq!(section.text, "");
        assert_eq!(section.chapters["Ghost"].text, "");
        assert!(section.chapters["Ghost"].tables.is_none());
    }

    #[test]
    fn test_chapter_names_are_literal() {
        let toc = toc(&[("SECTION 1", &["1.1 (a)", "1.2 (b)"])]);
        let tree = segment(&toc, "SECTION 1 1.1 (a) alpha 1.2 (b) beta");
        assert_eq!(tree.chapter("SECTION 1", "1.1 (a)").unwrap().text, "alpha");
        assert_eq!(tree.chapter("SECTION 1", "1.2 (b)").unwrap().text, "beta");
    }

    #[test]
    fn test_section_start_is_a_raw_pattern() {
        // "SECTION 1.2" as a pattern also matches "SECTION 1x2".
        let toc = toc(&[("SECTION 1.2", &[])]);
        let tree = segment(&toc, "SECTION 1x2 matched loosely");
        assert_eq!(tree.section("SECTION 1.2").unwrap().text, "matched loosely");
    }

    #[test]
    fn test_invalid_section_pattern_falls_back_to_literal() {
        let toc = toc(&[("SECTION (draft", &[])]);
        let tree = segment(&toc, "SECTION (draft body");
        assert_eq!(tree.section("SECTION (draft").unwrap().text, "body");
    }

    #[test]
    fn test_tables_attach_to_chapters_only() {
        let toc = toc(&[("SECTION T", &["Rates"])]);
        let body = "SECTION T\n+---+---+\n| K | V |\n| a | 1 |\n+---+---+\nRates\n\
                    +---+---+\n| K | V |\n| b | 2 |\n+---+---+\n";
        let tree = segment(&toc, body);
        let tables = tree.chapter("SECTION T", "Rates").unwrap().tables.as_ref().unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0][0]["K"], "b");
    }

    #[test]
    fn test_empty_toc_yields_empty_tree() {
        assert!(segment(&TocStructure::new(), "any text").is_empty());
    }
}
