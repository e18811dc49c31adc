//! Per-document extraction: pages in, TOC structure and content tree out.
//!
//! ```text
//! page texts
//!     ↓
//! text variants (full text, body text) + TOC window
//!     ↓
//! [TocParser] → TocStructure   → toc_{id}.json
//!     ↓
//! [segment]   → ContentTree    → content_{id}.json
//! ```

use crate::config::ExtractionConfig;
use crate::content::ContentTree;
use crate::error::Result;
use crate::output::{self, OutputPaths};
use crate::segment;
use crate::source::PageSource;
use crate::toc::{TocParser, TocStructure};
use std::path::Path;

/// The text views derived from a document's pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextVariants {
    /// All pages joined with newlines, TOC pages included
    pub full_text: String,
    /// All pages except marker pages, joined with newlines
    pub body_text: String,
    /// Zero-based indices of pages carrying a TOC marker
    pub toc_pages: Vec<usize>,
    /// Zero-based indices of the pages in the TOC window
    pub toc_window: Vec<usize>,
}

/// What extraction produced for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Section name to chapter names
    pub toc: TocStructure,
    /// Extracted sections and chapters
    pub content: ContentTree,
}

/// Derive a document id from its file name with the extension dropped.
///
/// Inner dots are kept, so `report.2023.pdf` and `report.2024.pdf` stay
/// distinct.
pub fn document_id(path: &Path) -> String {
    match path.file_stem().map(|stem| stem.to_string_lossy()) {
        Some(stem) if !stem.is_empty() => stem.into_owned(),
        _ => "document".to_string(),
    }
}

/// Owns one document's pages and everything derived from them.
#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    id: String,
    pages: Vec<String>,
    parser: TocParser,
    variants: TextVariants,
    toc: TocStructure,
    content: ContentTree,
}

impl DocumentExtractor {
    /// Load a PDF through `source`, naming the document after its file.
    pub fn open(
        path: impl AsRef<Path>,
        source: &dyn PageSource,
        config: ExtractionConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let pages = source.page_texts(path)?;
        Ok(Self::from_pages(document_id(path), pages, config))
    }

    /// Build an extractor from already extracted page texts.
    pub fn from_pages(id: impl Into<String>, pages: Vec<String>, config: ExtractionConfig) -> Self {
        let parser = TocParser::with_config(config);
        let variants = compute_variants(&parser, &pages);
        let id = id.into();
        log::info!(
            "Document {}: {} page(s), {} TOC page(s)",
            id,
            pages.len(),
            variants.toc_pages.len()
        );
        Self {
            id,
            pages,
            parser,
            variants,
            toc: TocStructure::new(),
            content: ContentTree::new(),
        }
    }

    /// Document identifier used in output file names and embedding ids.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Page texts in page order.
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// Derived text variants.
    pub fn variants(&self) -> &TextVariants {
        &self.variants
    }

    /// All pages joined, TOC pages included.
    pub fn full_text(&self) -> &str {
        &self.variants.full_text
    }

    /// All pages joined, TOC marker pages excluded.
    pub fn body_text(&self) -> &str {
        &self.variants.body_text
    }

    /// The TOC structure parsed so far.
    pub fn toc(&self) -> &TocStructure {
        &self.toc
    }

    /// The content tree extracted so far.
    pub fn content(&self) -> &ContentTree {
        &self.content
    }

    /// Locate and parse the table of contents.
    pub fn extract_toc(&mut self) -> &TocStructure {
        let window = self.parser.select_window(&self.pages);
        let toc_text = self.parser.find_toc_text(&window);
        self.toc = if toc_text.trim().is_empty() {
            log::warn!("Document {}: could not find a table of contents", self.id);
            TocStructure::new()
        } else {
            self.parser.parse(&toc_text)
        };
        log::info!(
            "Document {}: {} section(s), {} chapter(s) in TOC",
            self.id,
            self.toc.len(),
            self.toc.chapter_count()
        );
        &self.toc
    }

    /// Segment the body text according to the parsed TOC.
    pub fn extract_content(&mut self) -> &ContentTree {
        self.content = segment::segment(&self.toc, &self.variants.body_text);
        &self.content
    }

    /// Run TOC parsing and segmentation without writing anything.
    pub fn extract(&mut self) -> ExtractionResult {
        self.extract_toc();
        self.extract_content();
        self.result()
    }

    /// Run the full sequence, writing the TOC snapshot before segmenting and
    /// the content snapshot after.
    pub fn process(&mut self, paths: &OutputPaths) -> Result<ExtractionResult> {
        self.extract_toc();
        output::write_toc(&paths.toc, &self.toc)?;
        self.extract_content();
        output::write_content(&paths.content, &self.content)?;
        log::info!("Document {}: wrote {}", self.id, paths.content.display());
        Ok(self.result())
    }

    fn result(&self) -> ExtractionResult {
        ExtractionResult {
            toc: self.toc.clone(),
            content: self.content.clone(),
        }
    }
}

fn compute_variants(parser: &TocParser, pages: &[String]) -> TextVariants {
    let toc_pages: Vec<usize> = pages
        .iter()
        .enumerate()
        .filter(|(_, page)| parser.is_toc_page(page))
        .map(|(index, _)| index)
        .collect();

    let body_text = pages
        .iter()
        .enumerate()
        .filter(|(index, _)| !toc_pages.contains(index))
        .map(|(_, page)| page.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    TextVariants {
        full_text: pages.join("\n"),
        body_text,
        toc_pages,
        toc_window: parser.select_window(pages).page_indices(),
    }
}
