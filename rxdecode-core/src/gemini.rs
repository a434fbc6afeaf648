use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{PipelineError, Result};

const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Thin client for the generative-language API. Both the medicine name
/// extraction and the per-medicine info lookup go through here with
/// different prompts.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Point the client at a non-default endpoint (e.g. a local stub).
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Send a single-turn prompt and return the first candidate's text.
    ///
    /// Fails on network errors or non-2xx responses. A well-formed response
    /// that carries no candidates yields an empty string rather than an
    /// error; callers decide what emptiness means for their stage.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "contents": [{
                "parts": [{
                    "text": prompt
                }]
            }]
        });

        let response = self
            .http
            .post(format!("{}?key={}", self.endpoint, self.api_key))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::GenerationFailed(format!(
                "status {}",
                response.status()
            )));
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = body.into_text();
        debug!(chars = text.len(), "generative response received");
        Ok(text)
    }
}

/// Response shape of the generative endpoint. Every level is optional so a
/// sparse or malformed body degrades to an empty string instead of a parse
/// error.
#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> String {
        self.candidates
            .and_then(|mut c| if c.is_empty() { None } else { Some(c.remove(0)) })
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|mut p| if p.is_empty() { None } else { Some(p.remove(0)) })
            .and_then(|p| p.text)
            .unwrap_or_default()
    }
}
