//! Google Gemini summarizer (`models/{model}:generateContent`).

use super::http::{build_client, require, send_json};
use super::Summarizer;
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Summarizer backed by the Gemini REST API.
#[derive(Clone)]
pub struct GeminiSummarizer {
    client: Client,
    endpoint: String,
}

impl GeminiSummarizer {
    /// Build a Gemini client for `model`.
    pub fn new(api_key: &str, base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        require("Gemini", "API key", api_key)?;
        require("Gemini", "model name", model)?;
        let client = build_client(
            "summarizer",
            timeout,
            Some(("x-goog-api-key", api_key.trim().to_string())),
        )?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                model.trim()
            ),
        })
    }
}

impl Summarizer for GeminiSummarizer {
    fn summarize(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        let parsed: GenerateResponse =
            send_json("summarizer", self.client.post(&self.endpoint).json(&body))?;
        parsed.into_text()
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, all parts joined.
    fn into_text(self) -> Result<String> {
        let text = self
            .candidates
            .into_iter()
            .find_map(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(Error::malformed("summarizer", "Gemini response has no text"));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Part one. "},{"text":"Part two."}],"role":"model"}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.into_text().unwrap(), "Part one. Part two.");
    }

    #[test]
    fn test_blocked_response_is_malformed() {
        let raw = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(parsed.into_text(), Err(Error::MalformedResponse { .. })));
    }

    #[test]
    fn test_endpoint_includes_model() {
        let summarizer = GeminiSummarizer::new(
            "key",
            "https://generativelanguage.googleapis.com/v1beta/",
            "gemini-1.5-flash",
            Duration::from_secs(5),
        )
        .unwrap_or_else(|e| panic!("client should build: {}", e));
        assert_eq!(
            summarizer.endpoint,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
