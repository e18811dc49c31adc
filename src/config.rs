//! Configuration for extraction, summarization and the external services.
//!
//! Nothing here changes the segmentation algorithm itself; these structs only
//! carry the heuristics' constants, the summarization policy and the
//! endpoints/credentials of the external collaborators.

use std::time::Duration;

/// Marker strings that flag a page as a table-of-contents page.
///
/// Checked as literal, case-sensitive alternatives.
pub const DEFAULT_TOC_MARKERS: [&str; 2] = ["TABLE OF CONTENTS", "Table of Contents"];

/// Default summarization instruction, prepended to each node's text.
pub const DEFAULT_SUMMARY_PROMPT: &str = "summarize the text in 150 words: ";

/// Settings for the TOC parser and content segmenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Literal markers identifying TOC pages, in lookup priority order
    pub toc_markers: Vec<String>,
    /// Maximum number of pages collected into the TOC window (default: 5)
    pub toc_window_pages: usize,
    /// Minimum run of '.' that counts as a dot leader (default: 6)
    pub min_dot_leader: usize,
    /// Keyword that turns a TOC line into a section heading (default: "section")
    pub section_keyword: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            toc_markers: DEFAULT_TOC_MARKERS.iter().map(|m| m.to_string()).collect(),
            toc_window_pages: 5,
            min_dot_leader: 6,
            section_keyword: "section".to_string(),
        }
    }
}

impl ExtractionConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the TOC marker strings.
    pub fn with_toc_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.toc_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the TOC window cap.
    pub fn with_toc_window_pages(mut self, pages: usize) -> Self {
        self.toc_window_pages = pages;
        self
    }

    /// Set the minimum dot-leader length. Values below 1 are raised to 1.
    pub fn with_min_dot_leader(mut self, dots: usize) -> Self {
        self.min_dot_leader = dots.max(1);
        self
    }

    /// Set the section keyword.
    pub fn with_section_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.section_keyword = keyword.into();
        self
    }

    /// The dot-leader needle, e.g. `"......"` for the default of six.
    pub fn dot_leader(&self) -> String {
        ".".repeat(self.min_dot_leader.max(1))
    }

    /// Whether a page carries one of the TOC markers.
    pub fn is_toc_page(&self, page: &str) -> bool {
        self.toc_markers.iter().any(|marker| page.contains(marker.as_str()))
    }
}

/// Bounded retry with exponential backoff for external service calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (minimum 1)
    pub max_attempts: usize,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Set the attempt budget.
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(16) as u32;
        self.base_delay
            .checked_mul(1u32 << shift)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Settings for the summarization/embedding pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryConfig {
    /// Instruction sent ahead of each node's text
    pub prompt: String,
    /// Document-batch index, the last component of every embedding id
    pub batch_index: usize,
    /// Worker threads per document (1 = sequential)
    pub workers: usize,
    /// Retry policy applied to every summarize/embed/upsert call
    pub retry: RetryPolicy,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_SUMMARY_PROMPT.to_string(),
            batch_index: 0,
            workers: 1,
            retry: RetryPolicy::default(),
        }
    }
}

impl SummaryConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the instruction prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the document-batch index.
    pub fn with_batch_index(mut self, index: usize) -> Self {
        self.batch_index = index;
        self
    }

    /// Set the worker count. Values below 1 are raised to 1.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Which backend produces summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummarizerBackend {
    /// Google Gemini `generateContent`
    #[default]
    Gemini,
    /// Any OpenAI-compatible chat completions endpoint
    OpenAi,
}

/// Endpoints, models and credentials of the external services.
///
/// Populated from command-line flags or environment variables; there are no
/// built-in credentials.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Summarizer backend
    pub summarizer: SummarizerBackend,
    /// API key for the summarizer
    pub summarizer_api_key: String,
    /// Summarizer model name
    pub summarizer_model: String,
    /// Base URL of the summarizer API
    pub summarizer_base_url: String,
    /// API key for the embeddings endpoint
    pub embedding_api_key: String,
    /// Base URL of the OpenAI-compatible embeddings API
    pub embedding_base_url: String,
    /// Embedding model name
    pub embedding_model: String,
    /// API key for the vector store
    pub vector_api_key: String,
    /// Vector store control-plane URL
    pub vector_control_url: String,
    /// Logical collection the vectors go to
    pub index_name: String,
    /// Vector dimension of the index
    pub dimension: usize,
    /// Similarity metric of the index
    pub metric: String,
    /// Cloud provider for serverless index creation
    pub cloud: String,
    /// Region for serverless index creation
    pub region: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            summarizer: SummarizerBackend::default(),
            summarizer_api_key: String::new(),
            summarizer_model: "gemini-1.5-flash".to_string(),
            summarizer_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            embedding_api_key: String::new(),
            embedding_base_url: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            vector_api_key: String::new(),
            vector_control_url: "https://api.pinecone.io".to_string(),
            index_name: "pdf-sections".to_string(),
            dimension: 384,
            metric: "cosine".to_string(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_config_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.toc_markers, vec!["TABLE OF CONTENTS", "Table of Contents"]);
        assert_eq!(config.toc_window_pages, 5);
        assert_eq!(config.dot_leader(), "......");
        assert_eq!(config.section_keyword, "section");
    }

    #[test]
    fn test_toc_page_markers_are_case_sensitive() {
        let config = ExtractionConfig::default();
        assert!(config.is_toc_page("intro\nTABLE OF CONTENTS\n"));
        assert!(config.is_toc_page("Table of Contents"));
        assert!(!config.is_toc_page("table of contents"));
        assert!(!config.is_toc_page("Table Of Contents"));
    }

    #[test]
    fn test_extraction_config_builder() {
        let config = ExtractionConfig::new()
            .with_toc_markers(["CONTENTS"])
            .with_toc_window_pages(3)
            .with_min_dot_leader(0)
            .with_section_keyword("part");
        assert_eq!(config.toc_markers, vec!["CONTENTS"]);
        assert_eq!(config.toc_window_pages, 3);
        assert_eq!(config.min_dot_leader, 1);
        assert_eq!(config.section_keyword, "part");
    }

    #[test]
    fn test_retry_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(3), Duration::from_millis(2000));
        assert_eq!(policy.backoff(10), Duration::from_secs(8));
        assert_eq!(RetryPolicy::none().backoff(4), Duration::ZERO);
    }

    #[test]
    fn test_summary_config_builder() {
        let config = SummaryConfig::new()
            .with_prompt("tl;dr: ")
            .with_batch_index(7)
            .with_workers(0)
            .with_retry(RetryPolicy::none());
        assert_eq!(config.prompt, "tl;dr: ");
        assert_eq!(config.batch_index, 7);
        assert_eq!(config.workers, 1);
        assert_eq!(config.retry.max_attempts, 1);
    }
}
