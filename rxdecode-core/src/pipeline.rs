use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::extract::NameExtractor;
use crate::info::InfoFetcher;
use crate::models::MedicineInfo;
use crate::ratelimit::{RateLimiter, UPLOAD_FEATURE, UPLOAD_LIMIT};
use crate::vision::TextExtractor;

const STEP_EXTRACTING: &str = "Extracting text from prescription...";
const STEP_IDENTIFYING: &str = "Identifying medicines from text...";
const STEP_FETCHING: &str = "Fetching medicine information...";
const STEP_COMPLETE: &str = "Complete!";

/// An image selected for processing.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// User-visible outcome of one `process_image` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Validation notice: nothing was selected. No state mutated.
    NoFileSelected,
    /// The upload window is exhausted. No state mutated.
    RateLimited,
    /// OCR failed; terminal for this invocation.
    ProcessingFailed,
    /// Extraction ran but identified no medicines. `extracted_text` stays
    /// populated, `results` stays empty.
    NoMedicinesFound,
    Complete { count: usize },
}

/// Sequences the OCR -> name-extraction -> info-fetch pipeline and owns the
/// processing state the presentation layer reads back.
pub struct UploadProcessor {
    extractor: Arc<dyn TextExtractor>,
    names: Arc<dyn NameExtractor>,
    info: Arc<dyn InfoFetcher>,
    limiter: Arc<RateLimiter>,
    selected_file: Option<SelectedFile>,
    preview: Option<String>,
    is_processing: bool,
    extracted_text: String,
    results: Vec<MedicineInfo>,
    current_step: String,
}

impl UploadProcessor {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        names: Arc<dyn NameExtractor>,
        info: Arc<dyn InfoFetcher>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            extractor,
            names,
            info,
            limiter,
            selected_file: None,
            preview: None,
            is_processing: false,
            extracted_text: String::new(),
            results: Vec::new(),
            current_step: String::new(),
        }
    }

    /// Select a new file, discarding any previous run's output.
    pub fn select_file(&mut self, file: SelectedFile) {
        self.preview = Some(file.name.clone());
        self.selected_file = Some(file);
        self.extracted_text.clear();
        self.results.clear();
    }

    pub fn remove_file(&mut self) {
        self.selected_file = None;
        self.preview = None;
        self.extracted_text.clear();
        self.results.clear();
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn extracted_text(&self) -> &str {
        &self.extracted_text
    }

    pub fn results(&self) -> &[MedicineInfo] {
        &self.results
    }

    pub fn current_step(&self) -> &str {
        &self.current_step
    }

    pub fn take_results(self) -> Vec<MedicineInfo> {
        self.results
    }

    /// Run the full pipeline over the selected file.
    ///
    /// Stages run strictly in sequence; only the per-medicine info lookups
    /// overlap, and those individually never fail (fallback records absorb
    /// errors), so the fan-out always settles with one record per name in
    /// the order the names were identified.
    pub async fn process_image(&mut self) -> UploadOutcome {
        let Some(file) = self.selected_file.clone() else {
            warn!("process_image invoked without a selected file");
            return UploadOutcome::NoFileSelected;
        };

        if !self.limiter.check(UPLOAD_FEATURE, UPLOAD_LIMIT) {
            info!("upload rate limit reached");
            return UploadOutcome::RateLimited;
        }

        self.is_processing = true;
        self.current_step = STEP_EXTRACTING.to_string();

        let text = match self.extractor.extract_text(&file.bytes).await {
            Ok(text) => text,
            Err(e) => {
                error!(file = %file.name, "text extraction failed: {}", e);
                self.is_processing = false;
                self.current_step.clear();
                return UploadOutcome::ProcessingFailed;
            }
        };
        self.extracted_text = text.clone();

        self.current_step = STEP_IDENTIFYING.to_string();
        let medicine_names = self.names.identify_medicines(&text).await;

        if medicine_names.is_empty() {
            info!("no medicines identified in extracted text");
            self.is_processing = false;
            self.current_step.clear();
            return UploadOutcome::NoMedicinesFound;
        }

        self.current_step = STEP_FETCHING.to_string();
        let fetcher = Arc::clone(&self.info);
        let fetches = medicine_names.iter().map(|name| fetcher.fetch_info(name));
        self.results = join_all(fetches).await;

        self.current_step = STEP_COMPLETE.to_string();
        self.is_processing = false;

        info!(count = self.results.len(), "prescription analysis complete");
        UploadOutcome::Complete {
            count: self.results.len(),
        }
    }
}
