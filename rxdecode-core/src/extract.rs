use async_trait::async_trait;
use tracing::{info, warn};

use crate::gemini::GeminiClient;

/// Sentinel the model is instructed to emit when the text contains no
/// recognizable medicines.
const NO_MEDICINES_SENTINEL: &str = "NO_MEDICINES_FOUND";

/// Cap on how many medicine names a single extraction may yield.
const MAX_MEDICINES: usize = 6;

/// Identifies medicine names in raw prescription text. Never fails outward:
/// request errors collapse to an empty list, which the orchestrator reports
/// as "no medicines identified".
#[async_trait]
pub trait NameExtractor: Send + Sync {
    async fn identify_medicines(&self, text: &str) -> Vec<String>;
}

pub struct GeminiNameExtractor {
    client: GeminiClient,
}

impl GeminiNameExtractor {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NameExtractor for GeminiNameExtractor {
    async fn identify_medicines(&self, text: &str) -> Vec<String> {
        let prompt = build_extraction_prompt(text);

        match self.client.generate(&prompt).await {
            Ok(response) => {
                let medicines = parse_medicine_names(&response);
                info!(count = medicines.len(), "identified medicines");
                medicines
            }
            Err(e) => {
                warn!("medicine identification request failed: {}", e);
                Vec::new()
            }
        }
    }
}

fn build_extraction_prompt(text: &str) -> String {
    format!(
        "Analyze the following prescription text and identify ONLY the medicine names. \
        Extract medicine names that appear to be actual pharmaceutical drugs or medications. \
        Ignore dosage instructions, timings, doctor names, patient information, and other non-medicine text.\n\n\
        Text to analyze:\n\
        \"{}\"\n\n\
        Please respond with ONLY the medicine names, one per line, without any additional text, \
        numbers, or formatting. If no medicines are found, respond with \"{}\".",
        text, NO_MEDICINES_SENTINEL
    )
}

/// Parse the model's newline-delimited name list.
///
/// Lines containing `:`, `mg` or `ml` are discarded as stray dosage or label
/// fragments, and the list is truncated to the first six entries. The
/// sentinel response yields an empty list.
pub fn parse_medicine_names(response: &str) -> Vec<String> {
    if response.trim() == NO_MEDICINES_SENTINEL {
        return Vec::new();
    }

    response
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty() && !line.contains(':') && !line.contains("mg") && !line.contains("ml")
        })
        .take(MAX_MEDICINES)
        .map(String::from)
        .collect()
}
