//! Folder-level orchestration: every PDF in a directory, one after another.

use crate::config::{ExtractionConfig, SummaryConfig};
use crate::document::{document_id, DocumentExtractor};
use crate::error::{Error, Result};
use crate::output::{self, OutputPaths};
use crate::pipeline::{PipelineReport, SummaryPipeline};
use crate::services::Services;
use crate::source::{LopdfSource, PageSource};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    /// Document id (file stem, suffixed when another file in the batch had it)
    pub id: String,
    /// Where its output went
    pub paths: OutputPaths,
    /// Sections found in the TOC
    pub sections: usize,
    /// Chapters found in the TOC
    pub chapters: usize,
    /// Summarization outcome, when the pass ran
    pub summary: Option<PipelineReport>,
}

/// Outcome of a whole batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Documents processed successfully, in file-name order
    pub documents: Vec<DocumentReport>,
    /// Documents that failed, with the error
    pub failures: Vec<(PathBuf, Error)>,
}

impl BatchReport {
    /// Whether every document was processed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs extraction (and optionally summarization) over a folder of PDFs.
pub struct BatchRunner<'s> {
    input_dir: PathBuf,
    output_dir: PathBuf,
    extraction: ExtractionConfig,
    source: Box<dyn PageSource>,
    summaries: Option<(&'s Services, SummaryConfig)>,
}

impl<'s> BatchRunner<'s> {
    /// Create a runner reading `input_dir` and writing into `output_dir`.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            extraction: ExtractionConfig::default(),
            source: Box::new(LopdfSource::new()),
            summaries: None,
        }
    }

    /// Use custom extraction settings.
    pub fn with_extraction(mut self, config: ExtractionConfig) -> Self {
        self.extraction = config;
        self
    }

    /// Use a different page text backend.
    pub fn with_source(mut self, source: Box<dyn PageSource>) -> Self {
        self.source = source;
        self
    }

    /// Run the summarization pass after extraction.
    pub fn with_summaries(mut self, services: &'s Services, config: SummaryConfig) -> Self {
        self.summaries = Some((services, config));
        self
    }

    /// PDF files in the input directory, sorted by path.
    ///
    /// The `.pdf` extension is matched case-insensitively.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.input_dir)? {
            let path = entry?.path();
            let is_pdf = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false);
            if is_pdf && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Process every discovered document.
    ///
    /// Setup failures (unreadable input directory, vector index setup) abort
    /// the batch. A failing document is logged and recorded; the rest still
    /// run.
    pub fn run(&self) -> Result<BatchReport> {
        let files = self.discover()?;
        log::info!(
            "Found {} PDF file(s) in {}",
            files.len(),
            self.input_dir.display()
        );

        if let Some((services, config)) = &self.summaries {
            services.setup(&config.retry)?;
        }

        let mut report = BatchReport::default();
        let mut taken = HashSet::new();
        for path in files {
            let id = claim_id(document_id(&path), &mut taken);
            match self.process_as(&path, id) {
                Ok(document) => report.documents.push(document),
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    report.failures.push((path, e));
                },
            }
        }
        log::info!(
            "Batch finished: {} processed, {} failed",
            report.documents.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Extract one document, persist it and, if enabled, summarize it.
    pub fn process_document(&self, path: &Path) -> Result<DocumentReport> {
        self.process_as(path, document_id(path))
    }

    fn process_as(&self, path: &Path, id: String) -> Result<DocumentReport> {
        let pages = self.source.page_texts(path)?;
        let mut extractor = DocumentExtractor::from_pages(id, pages, self.extraction.clone());
        let paths = OutputPaths::for_document(&self.output_dir, extractor.id());
        let extracted = extractor.process(&paths)?;

        let summary = match &self.summaries {
            Some((services, config)) => {
                let content = output::read_content(&paths.content)?;
                let pipeline = SummaryPipeline::new(services, config.clone());
                let (summarized, pipeline_report) = pipeline.run(extractor.id(), &content);
                output::write_content(&paths.content, &summarized)?;
                Some(pipeline_report)
            },
            None => None,
        };

        Ok(DocumentReport {
            id: extractor.id().to_string(),
            paths,
            sections: extracted.toc.len(),
            chapters: extracted.toc.chapter_count(),
            summary,
        })
    }
}

/// Reserve `base` as a document id, appending `-2`, `-3`, ... while it is taken.
fn claim_id(base: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if taken.insert(candidate.clone()) {
            log::warn!("Document id {:?} already used in this batch; using {:?}", base, candidate);
            return candidate;
        }
        n += 1;
    }
}
