use thiserror::Error;

/// Errors surfaced by the pipeline stages that are allowed to fail outward.
///
/// Per-medicine info lookups never produce these: lookup failures are
/// absorbed into fallback records instead (see [`crate::info`]).
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("OCR request failed: {0}")]
    OcrFailed(String),

    #[error("Generative request failed: {0}")]
    GenerationFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
