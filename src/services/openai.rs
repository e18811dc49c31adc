//! OpenAI-compatible chat summarizer and embeddings client.

use super::http::{build_client, require, send_json};
use super::{Embedder, Summarizer};
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You summarize sections of long documents faithfully and concisely.";

/// Summarizer that talks to a `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiSummarizer {
    client: Client,
    endpoint: String,
    model: String,
}

impl OpenAiSummarizer {
    /// Build a chat completions client.
    pub fn new(api_key: &str, base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        require("OpenAI", "API key", api_key)?;
        require("OpenAI", "model name", model)?;
        let client = build_client(
            "summarizer",
            timeout,
            Some(("authorization", format!("Bearer {}", api_key.trim()))),
        )?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
        })
    }
}

impl Summarizer for OpenAiSummarizer {
    fn summarize(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };
        let parsed: ChatResponse =
            send_json("summarizer", self.client.post(&self.endpoint).json(&body))?;
        parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|answer| !answer.trim().is_empty())
            .ok_or_else(|| Error::malformed("summarizer", "response has no message content"))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Embedder that talks to an `/embeddings` endpoint.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
}

impl OpenAiEmbedder {
    /// Build an embeddings client.
    ///
    /// `dimensions` is forwarded to models that support shortened vectors.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        dimensions: Option<usize>,
        timeout: Duration,
    ) -> Result<Self> {
        require("embeddings", "API key", api_key)?;
        require("embeddings", "model name", model)?;
        let client = build_client(
            "embedder",
            timeout,
            Some(("authorization", format!("Bearer {}", api_key.trim()))),
        )?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            dimensions,
        })
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: [text],
            dimensions: self.dimensions,
        };
        let parsed: EmbeddingResponse =
            send_json("embedder", self.client.post(&self.endpoint).json(&request))?;
        parsed
            .data
            .into_iter()
            .min_by_key(|entry| entry.index)
            .map(|entry| entry.embedding)
            .ok_or_else(|| Error::malformed("embedder", "response has no embedding"))
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}
