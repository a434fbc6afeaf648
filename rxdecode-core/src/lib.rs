pub mod error;
pub mod extract;
pub mod gemini;
pub mod info;
pub mod models;
pub mod pipeline;
pub mod ratelimit;
pub mod search;
pub mod vision;

// Re-export commonly used types
pub use error::{PipelineError, Result};
pub use extract::{GeminiNameExtractor, NameExtractor, parse_medicine_names};
pub use gemini::GeminiClient;
pub use info::{GeminiInfoFetcher, InfoFetcher, clean_text, parse_medicine_info};
pub use models::MedicineInfo;
pub use pipeline::{SelectedFile, UploadOutcome, UploadProcessor};
pub use ratelimit::{
    Clock, InMemoryRateLimitStore, RateLimitStore, RateLimiter, SystemClock, SEARCH_FEATURE,
    SEARCH_LIMIT, UPLOAD_FEATURE, UPLOAD_LIMIT,
};
pub use search::{SearchOutcome, SearchProcessor};
pub use vision::{TextExtractor, VisionClient};
