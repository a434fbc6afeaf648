use async_trait::async_trait;
use tracing::warn;

use crate::gemini::GeminiClient;
use crate::models::MedicineInfo;

// Substituted when a response carries the other fields but omits one.
const USAGE_FALLBACK: &str = "Information not available - consult your healthcare provider";
const DOSAGE_FALLBACK: &str = "Consult your doctor for proper dosage information";
const SIDE_EFFECTS_FALLBACK: &str =
    "Consult your doctor for comprehensive side effects information";
const PRECAUTIONS_FALLBACK: &str = "Take only as prescribed by your healthcare provider";

// Substituted wholesale when the lookup request itself fails.
const UNAVAILABLE_USAGE: &str = "Unable to fetch medicine information";
const UNAVAILABLE_DOSAGE: &str = "Please consult your doctor for proper dosage";
const UNAVAILABLE_SIDE_EFFECTS: &str = "Please consult your doctor for side effects";
const UNAVAILABLE_PRECAUTIONS: &str = "Take only as prescribed by your healthcare provider";

/// Fetches structured information for a single medicine name. This stage
/// never fails outward: any error degrades to a fallback-populated record
/// that preserves the requested name, so one bad lookup cannot blank out
/// the rest of a batch.
#[async_trait]
pub trait InfoFetcher: Send + Sync {
    async fn fetch_info(&self, name: &str) -> MedicineInfo;
}

pub struct GeminiInfoFetcher {
    client: GeminiClient,
}

impl GeminiInfoFetcher {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InfoFetcher for GeminiInfoFetcher {
    async fn fetch_info(&self, name: &str) -> MedicineInfo {
        let prompt = build_info_prompt(name);

        match self.client.generate(&prompt).await {
            Ok(response) => parse_medicine_info(name, &response),
            Err(e) => {
                warn!(medicine = name, "info lookup failed: {}", e);
                unavailable_info(name)
            }
        }
    }
}

fn build_info_prompt(name: &str) -> String {
    format!(
        "Provide medical information for the medicine \"{}\" in the following exact format:\n\n\
        Usage: [What this medicine is used for - be specific about conditions and therapeutic purposes]\n\
        Dosage: [Typical adult dosage with frequency and amount]\n\
        Side Effects: [List common side effects that patients should be aware of]\n\
        Precautions: [Important warnings, contraindications, and safety measures]\n\n\
        Please provide accurate, detailed medical information without using asterisks, bold \
        formatting, or bullet points. Use clear, concise sentences. If the exact medicine is not \
        found, provide information for the closest match or state clearly that the specific \
        medicine information is not available.",
        name
    )
}

/// Strip markdown artifacts the model emits despite instructions: all `*`
/// runs (bold and single) and `#` heading runs with their trailing
/// whitespace. Idempotent.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => {}
            '#' => {
                while chars.peek() == Some(&'#') {
                    chars.next();
                }
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }

    out.trim().to_string()
}

/// Parse a four-field labeled response into a [`MedicineInfo`].
///
/// Field labels are matched case-sensitively as exact prefixes after
/// cleanup; any label the response omits gets its documented fallback
/// string. Pure function, unit-tested against literal fixtures.
pub fn parse_medicine_info(name: &str, response: &str) -> MedicineInfo {
    let mut usage = None;
    let mut dosage = None;
    let mut side_effects = None;
    let mut precautions = None;

    for line in response.lines().filter(|l| !l.trim().is_empty()) {
        let clean_line = clean_text(line.trim());
        if let Some(rest) = clean_line.strip_prefix("Usage:") {
            usage = Some(clean_text(rest.trim()));
        } else if let Some(rest) = clean_line.strip_prefix("Dosage:") {
            dosage = Some(clean_text(rest.trim()));
        } else if let Some(rest) = clean_line.strip_prefix("Side Effects:") {
            side_effects = Some(clean_text(rest.trim()));
        } else if let Some(rest) = clean_line.strip_prefix("Precautions:") {
            precautions = Some(clean_text(rest.trim()));
        }
    }

    MedicineInfo {
        name: name.to_string(),
        usage: usage.unwrap_or_else(|| USAGE_FALLBACK.to_string()),
        dosage: dosage.unwrap_or_else(|| DOSAGE_FALLBACK.to_string()),
        side_effects: side_effects.unwrap_or_else(|| SIDE_EFFECTS_FALLBACK.to_string()),
        precautions: precautions.unwrap_or_else(|| PRECAUTIONS_FALLBACK.to_string()),
    }
}

/// Record returned when the lookup request fails entirely.
pub fn unavailable_info(name: &str) -> MedicineInfo {
    MedicineInfo {
        name: name.to_string(),
        usage: UNAVAILABLE_USAGE.to_string(),
        dosage: UNAVAILABLE_DOSAGE.to_string(),
        side_effects: UNAVAILABLE_SIDE_EFFECTS.to_string(),
        precautions: UNAVAILABLE_PRECAUTIONS.to_string(),
    }
}
