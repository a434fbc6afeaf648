use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::{PipelineError, Result};

const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Extracts raw text from an image. The production implementation calls an
/// OCR vision API; tests substitute mocks at this seam.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, image: &[u8]) -> Result<String>;
}

/// OCR client for the vision API's text-detection feature.
#[derive(Clone)]
pub struct VisionClient {
    http: Client,
    api_key: String,
    endpoint: String,
}

impl VisionClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TextExtractor for VisionClient {
    /// Base64-encode the image and request a single TEXT_DETECTION
    /// annotation. Returns the first annotation's description, or an empty
    /// string when the API found no text. Errors on network failure or a
    /// non-2xx status; the orchestrator treats that as terminal.
    async fn extract_text(&self, image: &[u8]) -> Result<String> {
        let content = STANDARD.encode(image);

        let payload = json!({
            "requests": [{
                "image": {
                    "content": content
                },
                "features": [{
                    "type": "TEXT_DETECTION",
                    "maxResults": 1
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
            return Err(PipelineError::OcrFailed(format!(
                "status {}",
                response.status()
            )));
        }

        let body: AnnotateImagesResponse = response.json().await?;
        let text = body.into_first_description();
        info!(chars = text.len(), "OCR text extracted");
        Ok(text)
    }
}

/// Response shape of the OCR endpoint, fully optional so absent annotations
/// degrade to an empty string.
#[derive(Debug, Default, Deserialize)]
struct AnnotateImagesResponse {
    responses: Option<Vec<AnnotateImageResponse>>,
}

#[derive(Debug, Deserialize)]
struct AnnotateImageResponse {
    #[serde(rename = "textAnnotations")]
    text_annotations: Option<Vec<TextAnnotation>>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    description: Option<String>,
}

impl AnnotateImagesResponse {
    fn into_first_description(self) -> String {
        self.responses
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .and_then(|r| r.text_annotations)
            .and_then(|mut a| if a.is_empty() { None } else { Some(a.remove(0)) })
            .and_then(|a| a.description)
            .unwrap_or_default()
    }
}
