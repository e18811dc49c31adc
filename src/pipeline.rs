//! Summarization and embedding pass over a content tree.
//!
//! Every node is visited once, in pre-order (a section before its chapters).
//! For each node the pipeline
//!
//! 1. asks the summarizer for a summary of the configured prompt plus the
//!    node's text,
//! 2. embeds the summary,
//! 3. upserts the vector under an [`EmbeddingId`] derived from the node path.
//!
//! Each node's outcome is independent: a failure is recorded on that node as
//! [`NodeSummary::Unavailable`] and in the [`PipelineReport`], and the walk
//! carries on with the next node.

use crate::config::SummaryConfig;
use crate::content::{ContentTree, NodePath, NodeSummary};
use crate::error::{Error, Result};
use crate::services::{call_with_retry, Services, VectorRecord};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Primary key of a summary vector in the store.
///
/// Rendered as `{doc}/{section}[/{chapter}]/summary/{batch}`. `%` and `/`
/// inside a component are percent-escaped, so two different node paths never
/// produce the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmbeddingId(String);

impl EmbeddingId {
    /// Id for the node at `path` of document `doc_id`.
    pub fn new(doc_id: &str, path: &NodePath, batch_index: usize) -> Self {
        let mut id = escape_component(doc_id).into_owned();
        for component in path.components() {
            id.push('/');
            id.push_str(&escape_component(component));
        }
        id.push_str(&format!("/summary/{}", batch_index));
        EmbeddingId(id)
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmbeddingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape_component(component: &str) -> Cow<'_, str> {
    if !component.contains(['%', '/']) {
        return Cow::Borrowed(component);
    }
    let mut escaped = String::with_capacity(component.len() + 4);
    for ch in component.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            _ => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}

/// Outcome counts of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Nodes visited
    pub nodes: usize,
    /// Nodes that ended with a stored summary
    pub summarized: usize,
    /// Nodes that failed, with the last error message, in pre-order
    pub failures: Vec<(NodePath, String)>,
}

impl PipelineReport {
    /// Whether every node was summarized and stored.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of failed nodes.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Runs the summarization pass against injected service clients.
pub struct SummaryPipeline<'s> {
    services: &'s Services,
    config: SummaryConfig,
}

impl<'s> SummaryPipeline<'s> {
    /// Create a pipeline over `services`.
    pub fn new(services: &'s Services, config: SummaryConfig) -> Self {
        Self { services, config }
    }

    /// The active settings.
    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    /// Summarize every node of `tree`.
    ///
    /// Returns a new tree with a summary on every node, plus a report. The
    /// input tree is left untouched.
    pub fn run(&self, doc_id: &str, tree: &ContentTree) -> (ContentTree, PipelineReport) {
        let jobs: Vec<(NodePath, &str)> = tree
            .nodes()
            .into_iter()
            .map(|(path, node)| (path, node.text()))
            .collect();

        log::info!(
            "Document {}: summarizing {} node(s) with {} worker(s)",
            doc_id,
            jobs.len(),
            self.config.workers.min(jobs.len()).max(1)
        );

        let outcomes = if self.config.workers > 1 && jobs.len() > 1 {
            self.run_pooled(doc_id, &jobs)
        } else {
            jobs.iter()
                .map(|(path, text)| self.outcome(doc_id, path, text))
                .collect()
        };

        let mut report = PipelineReport {
            nodes: jobs.len(),
            ..Default::default()
        };
        let mut summaries = HashMap::with_capacity(jobs.len());
        for ((path, _), outcome) in jobs.into_iter().zip(outcomes) {
            match &outcome {
                NodeSummary::Available(_) => report.summarized += 1,
                NodeSummary::Unavailable { reason } => {
                    report.failures.push((path.clone(), reason.clone()));
                },
            }
            summaries.insert(path, outcome);
        }

        log::info!(
            "Document {}: {} of {} node(s) summarized",
            doc_id,
            report.summarized,
            report.nodes
        );
        (tree.with_summaries(&summaries), report)
    }

    /// Summarize, embed and store one node.
    ///
    /// Returns the summary text once the vector has been stored.
    pub fn summarize_node(&self, doc_id: &str, path: &NodePath, text: &str) -> Result<String> {
        let retry = &self.config.retry;
        let prompt = format!("{}{}", self.config.prompt, text);

        let summary = call_with_retry(retry, &format!("summarize {}", path), || {
            self.services.summarizer.summarize(&prompt)
        })?;

        let values = call_with_retry(retry, &format!("embed {}", path), || {
            self.services.embedder.embed(&summary)
        })?;
        let expected = self.services.store.dimension();
        if values.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                found: values.len(),
            });
        }

        let id = EmbeddingId::new(doc_id, path, self.config.batch_index);
        let record = VectorRecord::new(id.as_str(), values, summary.as_str());
        call_with_retry(retry, &format!("upsert {}", id), || {
            self.services.store.upsert(&record)
        })?;
        log::debug!("Stored summary of {} as {}", path, id);
        Ok(summary)
    }

    fn outcome(&self, doc_id: &str, path: &NodePath, text: &str) -> NodeSummary {
        match self.summarize_node(doc_id, path, text) {
            Ok(summary) => NodeSummary::Available(summary),
            Err(e) => {
                log::warn!("Document {}: no summary for {}: {}", doc_id, path, e);
                NodeSummary::Unavailable {
                    reason: e.to_string(),
                }
            },
        }
    }

    /// Dispatch jobs in pre-order to a bounded set of scoped workers.
    fn run_pooled(&self, doc_id: &str, jobs: &[(NodePath, &str)]) -> Vec<NodeSummary> {
        let counter = AtomicUsize::new(0);
        let next = &counter;
        let worker_count = self.config.workers.min(jobs.len());
        let mut slots: Vec<Option<NodeSummary>> = vec![None; jobs.len()];

        thread::scope(|scope| {
            let handles: Vec<_> = (0..worker_count)
                .map(|_| {
                    scope.spawn(move || {
                        let mut done = Vec::new();
                        loop {
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some((path, text)) = jobs.get(index) else {
                                break;
                            };
                            done.push((index, self.outcome(doc_id, path, text)));
                        }
                        done
                    })
                })
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(done) => {
                        for (index, outcome) in done {
                            slots[index] = Some(outcome);
                        }
                    },
                    Err(_) => log::warn!("Document {}: a summary worker panicked", doc_id),
                }
            }
        });

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| NodeSummary::Unavailable {
                    reason: "summary worker panicked".to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::content::{ChapterNode, SectionNode};
    use crate::services::{Embedder, InMemoryVectorStore, Summarizer};
    use std::sync::Arc;

    struct EchoSummarizer;

    impl Summarizer for EchoSummarizer {
        fn summarize(&self, prompt: &str) -> Result<String> {
            Ok(format!("summary of [{}]", prompt))
        }
    }

    struct LengthEmbedder(usize);

    impl Embedder for LengthEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32; self.0])
        }
    }

    fn tree() -> ContentTree {
        let mut section = SectionNode {
            text: "alpha".to_string(),
            ..Default::default()
        };
        section.chapters.insert(
            "One".to_string(),
            ChapterNode {
                text: "beta".to_string(),
                ..Default::default()
            },
        );
        let mut tree = ContentTree::new();
        tree.insert_section("SECTION A", section);
        tree
    }

    fn services(embed_dim: usize, store: Arc<InMemoryVectorStore>) -> Services {
        Services::new(
            Box::new(EchoSummarizer),
            Box::new(LengthEmbedder(embed_dim)),
            Box::new(store),
        )
    }

    #[test]
    fn test_embedding_id_layout() {
        let section = EmbeddingId::new("report", &NodePath::section("SECTION A"), 0);
        let chapter = EmbeddingId::new("report", &NodePath::chapter("SECTION A", "One"), 2);
        assert_eq!(section.as_str(), "report/SECTION A/summary/0");
        assert_eq!(chapter.to_string(), "report/SECTION A/One/summary/2");
    }

    #[test]
    fn test_embedding_id_escapes_separators() {
        let nested = EmbeddingId::new("d", &NodePath::chapter("A", "B"), 0);
        let slashed = EmbeddingId::new("d", &NodePath::section("A/B"), 0);
        assert_ne!(nested, slashed);
        assert_eq!(slashed.as_str(), "d/A%2FB/summary/0");
        assert_eq!(
            EmbeddingId::new("d", &NodePath::section("100%"), 0).as_str(),
            "d/100%25/summary/0"
        );
    }

    #[test]
    fn test_run_summarizes_every_node() {
        let store = Arc::new(InMemoryVectorStore::new(4));
        let services = services(4, store.clone());
        let pipeline = SummaryPipeline::new(&services, SummaryConfig::default());

        let (summarized, report) = pipeline.run("doc", &tree());
        assert!(report.is_complete());
        assert_eq!(report.nodes, 2);
        assert_eq!(report.summarized, 2);

        let section = summarized.section("SECTION A").unwrap();
        assert_eq!(
            section.summary.as_ref().and_then(|s| s.text()),
            Some("summary of [summarize the text in 150 words: alpha]")
        );
        let record = store.get("doc/SECTION A/One/summary/0").unwrap();
        assert_eq!(
            record.metadata.text,
            "summary of [summarize the text in 150 words: beta]"
        );
    }

    #[test]
    fn test_dimension_mismatch_marks_node_unavailable() {
        let store = Arc::new(InMemoryVectorStore::new(4));
        let services = services(3, store.clone());
        let config = SummaryConfig::default().with_retry(RetryPolicy::none());
        let (summarized, report) = SummaryPipeline::new(&services, config).run("doc", &tree());

        assert_eq!(report.failed(), 2);
        assert!(store.is_empty());
        let chapter = summarized.chapter("SECTION A", "One").unwrap();
        match chapter.summary.as_ref() {
            Some(NodeSummary::Unavailable { reason }) => assert!(reason.contains("dimension")),
            other => panic!("unexpected summary: {:?}", other),
        }
    }

    #[test]
    fn test_pooled_run_matches_sequential() {
        let store = Arc::new(InMemoryVectorStore::new(2));
        let services = services(2, store.clone());
        let sequential = SummaryPipeline::new(&services, SummaryConfig::default());
        let pooled = SummaryPipeline::new(&services, SummaryConfig::default().with_workers(4));

        let (a, _) = sequential.run("doc", &tree());
        let (b, report) = pooled.run("doc", &tree());
        assert_eq!(a, b);
        assert_eq!(report.summarized, 2);
        assert_eq!(store.len(), 2);
    }
}
