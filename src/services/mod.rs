//! External collaborators: summarizer, embedding model and vector store.
//!
//! Each service sits behind a small trait so a different backend can be
//! substituted without touching the pipeline:
//!
//! - [`Summarizer`]: prompt in, summary text out
//! - [`Embedder`]: text in, fixed-dimension vector out
//! - [`VectorStore`]: upsert of `(id, vector, {text})` into one logical index
//!
//! All three are treated as rate-limited, possibly blocking network services.
//! Calls go through [`call_with_retry`], which retries transient failures
//! with exponential backoff.

mod gemini;
mod http;
mod memory;
mod openai;
mod pinecone;

pub use gemini::GeminiSummarizer;
pub use memory::InMemoryVectorStore;
pub use openai::{OpenAiEmbedder, OpenAiSummarizer};
pub use pinecone::PineconeStore;

use crate::config::{RetryPolicy, ServiceConfig, SummarizerBackend};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;

/// Produces a summary for a prompt.
pub trait Summarizer: Send + Sync {
    /// Send `prompt` (instruction plus text) and return the model's answer.
    fn summarize(&self, prompt: &str) -> Result<String>;
}

/// Turns text into an embedding vector.
pub trait Embedder: Send + Sync {
    /// Embed one text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Metadata stored next to each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    /// The text that was embedded
    pub text: String,
}

/// One vector to store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Primary key in the store
    pub id: String,
    /// Embedding values
    pub values: Vec<f32>,
    /// Attached metadata
    pub metadata: VectorMetadata,
}

impl VectorRecord {
    /// Build a record for `text` embedded as `values`.
    pub fn new(id: impl Into<String>, values: Vec<f32>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values,
            metadata: VectorMetadata { text: text.into() },
        }
    }
}

/// A vector collection with a fixed dimension.
pub trait VectorStore: Send + Sync {
    /// Dimension every stored vector must have.
    fn dimension(&self) -> usize;

    /// Make sure the index exists, creating it when missing.
    ///
    /// Called once during setup, before the first upsert.
    fn ensure_index(&self) -> Result<()> {
        Ok(())
    }

    /// Insert or replace one record.
    fn upsert(&self, record: &VectorRecord) -> Result<()>;
}

impl<T: VectorStore + ?Sized> VectorStore for Arc<T> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn ensure_index(&self) -> Result<()> {
        (**self).ensure_index()
    }

    fn upsert(&self, record: &VectorRecord) -> Result<()> {
        (**self).upsert(record)
    }
}

/// The service clients used by the summarization pass.
///
/// Constructed once by the caller and passed by reference into the pipeline.
pub struct Services {
    /// Summary backend
    pub summarizer: Box<dyn Summarizer>,
    /// Embedding backend
    pub embedder: Box<dyn Embedder>,
    /// Vector store
    pub store: Box<dyn VectorStore>,
}

impl Services {
    /// Bundle already constructed clients.
    pub fn new(
        summarizer: Box<dyn Summarizer>,
        embedder: Box<dyn Embedder>,
        store: Box<dyn VectorStore>,
    ) -> Self {
        Self {
            summarizer,
            embedder,
            store,
        }
    }

    /// Build the HTTP clients described by `config`.
    ///
    /// No network call is made here; see [`Services::setup`].
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let summarizer: Box<dyn Summarizer> = match config.summarizer {
            SummarizerBackend::Gemini => Box::new(GeminiSummarizer::new(
                &config.summarizer_api_key,
                &config.summarizer_base_url,
                &config.summarizer_model,
                config.timeout,
            )?),
            SummarizerBackend::OpenAi => Box::new(OpenAiSummarizer::new(
                &config.summarizer_api_key,
                &config.summarizer_base_url,
                &config.summarizer_model,
                config.timeout,
            )?),
        };
        let embedder = OpenAiEmbedder::new(
            &config.embedding_api_key,
            &config.embedding_base_url,
            &config.embedding_model,
            Some(config.dimension),
            config.timeout,
        )?;
        let store = PineconeStore::new(config)?;
        Ok(Self::new(summarizer, Box::new(embedder), Box::new(store)))
    }

    /// Explicit setup step: make sure the vector index exists.
    pub fn setup(&self, retry: &RetryPolicy) -> Result<()> {
        call_with_retry(retry, "ensure vector index", || self.store.ensure_index())
    }
}

/// Run `op`, retrying retryable failures according to `policy`.
///
/// Permanent errors and the last transient error are returned unchanged.
pub fn call_with_retry<T>(
    policy: &RetryPolicy,
    what: &str,
    mut op: impl FnMut() -> Result<T>,
) -> Result<T> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.backoff(attempt);
                log::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    what,
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                thread::sleep(delay);
                attempt += 1;
            },
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;
    use std::time::Duration;

    fn unavailable() -> Error {
        Error::ServiceStatus {
            service: "summarizer",
            status: 503,
            body: "busy".to_string(),
        }
    }

    #[test]
    fn test_retry_until_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::default().with_base_delay(Duration::ZERO);
        let result = call_with_retry(&policy, "op", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(unavailable())
            } else {
                Ok(calls.get())
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_retry_gives_up_after_budget() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::none().with_max_attempts(2);
        let result: Result<()> = call_with_retry(&policy, "op", || {
            calls.set(calls.get() + 1);
            Err(unavailable())
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_permanent_error_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = call_with_retry(&RetryPolicy::default(), "op", || {
            calls.set(calls.get() + 1);
            Err(Error::Config("bad key".into()))
        });
        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_vector_record_serializes_metadata() {
        let record = VectorRecord::new("doc/S/summary/0", vec![0.5, 1.0], "summary text");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "doc/S/summary/0");
        assert_eq!(json["metadata"]["text"], "summary text");
    }
}
