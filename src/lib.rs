#![allow(clippy::type_complexity)]
#![cfg_attr(test, allow(dead_code))]

//! # PDF Sectioner
//!
//! Splits long PDF documents into the sections and chapters their printed
//! table of contents announces, recognizes ASCII-art tables inside chapters,
//! and optionally summarizes and embeds every node into a vector store.
//!
//! ## Pipeline
//!
//! ```text
//! PDF ──[source]──▶ page texts ──[toc]──▶ TocStructure ──▶ toc_{id}.json
//!                       │
//!                       └──[segment + tables]──▶ ContentTree ──▶ content_{id}.json
//!                                                    │
//!                        [pipeline: summarize → embed → upsert]
//!                                                    │
//!                                                    ▼
//!                                       ContentTree with summaries
//! ```
//!
//! Heuristic misses (no TOC, a heading that never appears in the body, a
//! malformed table) degrade to partial results and are reported through the
//! `log` facade. External service failures are retried and then recorded per
//! node; they never abort a document.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pdf_sectioner::{DocumentExtractor, ExtractionConfig, LopdfSource, OutputPaths};
//!
//! # fn main() -> pdf_sectioner::Result<()> {
//! let mut doc = DocumentExtractor::open("report.pdf", &LopdfSource::new(), ExtractionConfig::default())?;
//! let paths = OutputPaths::for_document("output", doc.id());
//! let result = doc.process(&paths)?;
//! for (section, chapters) in result.toc.iter() {
//!     println!("{} ({} chapters)", section, chapters.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

/// Extraction, summarization and service settings
pub mod config;

// Text heuristics
pub mod boundary;
pub mod tables;
pub mod toc;

// Content model and segmentation
pub mod content;
pub mod segment;

// Documents and persistence
pub mod document;
pub mod output;
pub mod source;

// Summarization
pub mod pipeline;
pub mod services;

// Folder orchestration
pub mod batch;

pub use batch::{BatchReport, BatchRunner, DocumentReport};
pub use config::{ExtractionConfig, RetryPolicy, ServiceConfig, SummarizerBackend, SummaryConfig};
pub use content::{ChapterNode, ContentNode, ContentTree, NodePath, NodeSummary, SectionNode};
pub use document::{DocumentExtractor, ExtractionResult, TextVariants};
pub use error::{Error, Result};
pub use output::OutputPaths;
pub use pipeline::{EmbeddingId, PipelineReport, SummaryPipeline};
pub use services::{Embedder, Services, Summarizer, VectorRecord, VectorStore};
pub use source::{LopdfSource, PageSource};
pub use tables::{find_tables, TableRecord, TableRow};
pub use toc::{parse_toc, TocParser, TocStructure, TocWindow};
