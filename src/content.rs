//! The content tree: sections, their chapters, and per-node summaries.
//!
//! Serialized, the tree is the content file written for each document:
//!
//! ```text
//! {
//!   "SECTION A": {
//!     "text": "...",
//!     "chapters": {
//!       "Chapter One": { "text": "...", "tables": null, "summary": "..." }
//!     },
//!     "summary": "..."
//!   }
//! }
//! ```
//!
//! `summary` is absent until the summarization pass has run.

use crate::tables::TableRecord;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Outcome of summarizing one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSummary {
    /// The summary text returned by the summarizer
    Available(String),
    /// Summarization or storage failed after all retries
    Unavailable {
        /// Last error seen for this node
        #[serde(rename = "unavailable")]
        reason: String,
    },
}

impl NodeSummary {
    /// The summary text, if one was produced.
    pub fn text(&self) -> Option<&str> {
        match self {
            NodeSummary::Available(text) => Some(text),
            NodeSummary::Unavailable { .. } => None,
        }
    }

    /// Whether a summary was produced.
    pub fn is_available(&self) -> bool {
        matches!(self, NodeSummary::Available(_))
    }
}

/// A chapter's extracted content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterNode {
    /// Text between this chapter's heading and the next boundary
    pub text: String,
    /// Tables recognized in the chapter text; `None` when there are none
    #[serde(default)]
    pub tables: Option<Vec<TableRecord>>,
    /// Summary, once the summarization pass has run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<NodeSummary>,
}

/// A section's extracted content and its chapters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionNode {
    /// Text between this section's heading and the next section
    pub text: String,
    /// Chapters in TOC order
    #[serde(default)]
    pub chapters: IndexMap<String, ChapterNode>,
    /// Summary, once the summarization pass has run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<NodeSummary>,
}

/// A borrowed view of either kind of node.
#[derive(Debug, Clone, Copy)]
pub enum ContentNode<'a> {
    /// A section node
    Section(&'a SectionNode),
    /// A chapter node
    Chapter(&'a ChapterNode),
}

impl<'a> ContentNode<'a> {
    /// The node's extracted text.
    pub fn text(&self) -> &'a str {
        match self {
            ContentNode::Section(section) => &section.text,
            ContentNode::Chapter(chapter) => &chapter.text,
        }
    }

    /// The node's summary, if the pass has run.
    pub fn summary(&self) -> Option<&'a NodeSummary> {
        match self {
            ContentNode::Section(section) => section.summary.as_ref(),
            ContentNode::Chapter(chapter) => chapter.summary.as_ref(),
        }
    }
}

/// Names from the root down to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath {
    /// Section name
    pub section: String,
    /// Chapter name, for chapter nodes
    pub chapter: Option<String>,
}

impl NodePath {
    /// Path of a section node.
    pub fn section(name: impl Into<String>) -> Self {
        Self {
            section: name.into(),
            chapter: None,
        }
    }

    /// Path of a chapter node.
    pub fn chapter(section: impl Into<String>, chapter: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            chapter: Some(chapter.into()),
        }
    }

    /// Path components from the root.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.section.as_str()).chain(self.chapter.as_deref())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.chapter {
            Some(chapter) => write!(f, "{} > {}", self.section, chapter),
            None => write!(f, "{}", self.section),
        }
    }
}

/// Sections in TOC order, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentTree {
    sections: IndexMap<String, SectionNode>,
}

impl ContentTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a section.
    pub fn insert_section(&mut self, name: impl Into<String>, section: SectionNode) {
        self.sections.insert(name.into(), section);
    }

    /// Look up a section by name.
    pub fn section(&self, name: &str) -> Option<&SectionNode> {
        self.sections.get(name)
    }

    /// Look up a chapter by section and chapter name.
    pub fn chapter(&self, section: &str, chapter: &str) -> Option<&ChapterNode> {
        self.sections.get(section)?.chapters.get(chapter)
    }

    /// Iterate sections in TOC order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &SectionNode)> {
        self.sections.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the tree has no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Every node in pre-order: each section, then its chapters.
    pub fn nodes(&self) -> Vec<(NodePath, ContentNode<'_>)> {
        let mut nodes = Vec::new();
        for (name, section) in &self.sections {
            nodes.push((NodePath::section(name), ContentNode::Section(section)));
            for (chapter_name, chapter) in &section.chapters {
                nodes.push((NodePath::chapter(name, chapter_name), ContentNode::Chapter(chapter)));
            }
        }
        nodes
    }

    /// Build a new tree with summaries attached.
    ///
    /// Nodes missing from `summaries` keep whatever summary they had.
    pub fn with_summaries(&self, summaries: &HashMap<NodePath, NodeSummary>) -> ContentTree {
        let mut tree = self.clone();
        for (name, section) in tree.sections.iter_mut() {
            if let Some(summary) = summaries.get(&NodePath::section(name.as_str())) {
                section.summary = Some(summary.clone());
            }
            for (chapter_name, chapter) in section.chapters.iter_mut() {
                let path = NodePath::chapter(name.as_str(), chapter_name.as_str());
                if let Some(summary) = summaries.get(&path) {
                    chapter.summary = Some(summary.clone());
                }
            }
        }
        tree
    }
}
