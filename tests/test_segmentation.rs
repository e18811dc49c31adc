//! Tests for carving body text into sections and chapters.

use pdf_sectioner::segment::segment;
use pdf_sectioner::{parse_toc, TocStructure};

fn toc_from(listing: &str) -> TocStructure {
    parse_toc(listing)
}

#[test]
fn test_section_text_ends_before_next_section() {
    let toc = toc_from("SECTION 1......1\nSECTION 2......2");
    let tree = segment(&toc, "cover SECTION 1 intro words SECTION 2 outro words");
    assert_eq!(tree.section("SECTION 1").unwrap().text, "intro words");
    assert_eq!(tree.section("SECTION 2").unwrap().text, "outro words");
}

#[test]
fn test_last_chapter_runs_to_section_end() {
    let toc = toc_from(
        "SECTION A......1\nBackground......2\nMethod......3\nSECTION B......4\nResults......5",
    );
    let body = "\
SECTION A
Background
Why this matters.
Method
How it was done.
SECTION B
Results
What came out.";
    let tree = segment(&toc, body);

    assert_eq!(tree.chapter("SECTION A", "Background").unwrap().text, "Why this matters.");
    assert_eq!(tree.chapter("SECTION A", "Method").unwrap().text, "How it was done.");
    assert_eq!(tree.chapter("SECTION B", "Results").unwrap().text, "What came out.");
    assert!(tree
        .section("SECTION A")
        .unwrap()
        .text
        .ends_with("How it was done."));
}

#[test]
fn test_tree_follows_toc_order() {
    let toc = toc_from("SECTION Z......1\nSECTION Y......2\nSECTION X......3");
    let tree = segment(&toc, "SECTION Z z SECTION Y y SECTION X x");
    let names: Vec<&str> = tree.sections().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["SECTION Z", "SECTION Y", "SECTION X"]);
}

#[test]
fn test_chapter_missing_from_body_is_empty() {
    let toc = toc_from("SECTION A......1\nPresent......2\nAbsent......3");
    let tree = segment(&toc, "SECTION A Present here it is");
    let section = tree.section("SECTION A").unwrap();
    assert_eq!(section.chapters["Present"].text, "here it is");
    assert_eq!(section.chapters["Absent"].text, "");
    assert_eq!(section.chapters.len(), 2);
}

#[test]
fn test_chapter_tables_recognized() {
    let toc = toc_from("SECTION Data......1\nFigures......2");
    let body = "SECTION Data\nFigures\nSee below.\n+-----+-----+\n| Qty | Sum |\n| 2   | 40  |\n+-----+-----+\n";
    let tree = segment(&toc, body);
    let chapter = tree.chapter("SECTION Data", "Figures").unwrap();
    let tables = chapter.tables.as_ref().unwrap();
    assert_eq!(tables[0][0]["Qty"], "2");
    assert_eq!(tables[0][0]["Sum"], "40");
}

#[test]
fn test_chapter_without_tables_has_none() {
    let toc = toc_from("SECTION Data......1\nProse......2");
    let tree = segment(&toc, "SECTION Data Prose just words");
    assert!(tree.chapter("SECTION Data", "Prose").unwrap().tables.is_none());
}
