//! Error types for the section extractor.
//!
//! This module defines all error types that can occur while extracting page
//! text, segmenting content, persisting output and talking to the external
//! summarization and vector-store services.
//!
//! Heuristic misses (no table of contents, a boundary that cannot be found,
//! a malformed table) are not errors: they are logged and degrade to partial
//! results. Only conditions that stop a whole operation surface as [`Error`].

/// Result type alias for section extractor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during extraction and summarization.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A boundary or table pattern failed to compile
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Pattern as handed to the regex engine
        pattern: String,
        /// Compiler message
        reason: String,
    },

    /// The PDF could not be opened or parsed at all
    #[error("Failed to load PDF {path}: {reason}")]
    PdfLoad {
        /// Path of the document
        path: String,
        /// Reason reported by the PDF backend
        reason: String,
    },

    /// Text could not be extracted from one page
    ///
    /// Logged by page sources; the page degrades to empty text.
    #[error("Failed to extract text from page {page}: {reason}")]
    PageText {
        /// 1-based page number
        page: u32,
        /// Reason reported by the PDF backend
        reason: String,
    },

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP transport error talking to an external service
    #[error("HTTP error calling {service}: {source}")]
    Http {
        /// Service name (summarizer, embedder, vector store)
        service: &'static str,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// External service answered with a non-success status
    #[error("{service} returned {status}: {body}")]
    ServiceStatus {
        /// Service name
        service: &'static str,
        /// HTTP status code
        status: u16,
        /// Response body, or a placeholder when unavailable
        body: String,
    },

    /// External service answered with a payload we could not use
    #[error("Malformed {service} response: {reason}")]
    MalformedResponse {
        /// Service name
        service: &'static str,
        /// What was wrong with the payload
        reason: String,
    },

    /// Embedding vector does not match the configured store dimension
    #[error("Embedding dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Dimension of the vector index
        expected: usize,
        /// Length of the vector produced by the embedder
        found: usize,
    },
}

impl Error {
    /// Build an [`Error::MalformedResponse`] from a message.
    pub fn malformed(service: &'static str, reason: impl Into<String>) -> Self {
        Error::MalformedResponse {
            service,
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call might succeed.
    ///
    /// Transport timeouts and connection failures, rate limiting (429) and
    /// server-side errors (5xx) are transient; everything else is permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            },
            Error::ServiceStatus { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}
