//! External text summarizer: the LLM that turns fetched data plus
//! conversation history into a conversational reply.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

use crate::error::SummarizerError;
use crate::model::{ConversationTurn, Role};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_MODEL: &str = "gemini-2.0-flash";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait Summarizer: Send + Sync + Debug {
    /// Generate a reply for the given ordered history. The last turn is
    /// the prompt being answered.
    async fn generate(&self, turns: &[ConversationTurn]) -> Result<String, SummarizerError>;
}

#[derive(Debug, Clone)]
pub struct GeminiSummarizer {
    api_key: String,
    base_url: String,
    http: Client,
}

impl GeminiSummarizer {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, GEMINI_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build summarizer HTTP client")?;

        Ok(Self { api_key, base_url, http })
    }
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn generate(&self, turns: &[ConversationTurn]) -> Result<String, SummarizerError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, GEMINI_MODEL, self.api_key
        );

        let request = GeminiRequest {
            contents: turns
                .iter()
                .map(|t| GeminiContent {
                    role: role_str(t.role),
                    parts: vec![GeminiPart { text: &t.text }],
                })
                .collect(),
        };

        let res = self.http.post(&url).json(&request).send().await.map_err(|e| {
            SummarizerError { status: None, message: e.to_string() }
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| SummarizerError {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(SummarizerError {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let parsed: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            SummarizerError { status: Some(status.as_u16()), message: e.to_string() }
        })?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text);

        text.ok_or_else(|| SummarizerError {
            status: Some(status.as_u16()),
            message: "response contained no candidate text".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_to_gemini_vocabulary() {
        assert_eq!(role_str(Role::User), "user");
        assert_eq!(role_str(Role::Assistant), "model");
    }

    #[test]
    fn candidate_text_is_extracted() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Sunny with a light breeze."}]}}
            ]
        }"#;

        let parsed: GeminiResponse = serde_json::from_str(body).expect("valid JSON");
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text);

        assert_eq!(text.as_deref(), Some("Sunny with a light breeze."));
    }
}
