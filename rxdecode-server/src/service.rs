use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use rxdecode_core::{
    GeminiClient, GeminiInfoFetcher, GeminiNameExtractor, InfoFetcher, NameExtractor, RateLimiter,
    SearchOutcome, SearchProcessor, SelectedFile, TextExtractor, UploadOutcome, UploadProcessor,
    VisionClient,
};

use crate::auth;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{SearchRequest, SearchResponse, UploadRequest, UploadResponse};
use crate::store::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub store: UserStore,
    pub extractor: Arc<dyn TextExtractor>,
    pub names: Arc<dyn NameExtractor>,
    pub info: Arc<dyn InfoFetcher>,
    pub limiter: Arc<RateLimiter>,
    pub config: Arc<Config>,
}

pub async fn create_app(config: Config) -> anyhow::Result<Router> {
    let store = UserStore::connect(&config.database_url).await?;
    let gemini = GeminiClient::new(config.gemini_api_key.clone());

    let state = AppState {
        store,
        extractor: Arc::new(VisionClient::new(config.vision_api_key.clone())),
        names: Arc::new(GeminiNameExtractor::new(gemini.clone())),
        info: Arc::new(GeminiInfoFetcher::new(gemini)),
        limiter: Arc::new(RateLimiter::system()),
        config: Arc::new(config),
    };

    build_router(state)
}

fn build_router(state: AppState) -> anyhow::Result<Router> {
    let origin = state
        .config
        .client_origin
        .parse::<HeaderValue>()
        .map_err(|e| anyhow::anyhow!("invalid CLIENT_ORIGIN: {e}"))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    Ok(Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/decode/upload", post(decode_upload))
        .route("/decode/search", post(decode_search))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "RxDecode",
        "version": "1.0.0",
        "description": "Prescription decoding and medicine information lookup",
        "endpoints": {
            "POST /decode/upload": "Decode a prescription image",
            "POST /decode/search": "Look up a medicine by name",
            "POST /auth/register": "Register with email and password",
            "POST /auth/login": "Log in",
            "POST /auth/logout": "Log out",
            "GET /me": "Current user from session cookie",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Run the full upload pipeline over a base64-encoded prescription image.
async fn decode_upload(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    if req.image.trim().is_empty() {
        return Err(ApiError::NoImage);
    }

    let bytes = STANDARD
        .decode(req.image.trim())
        .map_err(|_| ApiError::InvalidImageEncoding)?;
    let name = req.file_name.unwrap_or_else(|| "upload".to_string());

    info!(file = %name, size = bytes.len(), "decoding uploaded prescription");

    let mut processor = UploadProcessor::new(
        state.extractor.clone(),
        state.names.clone(),
        state.info.clone(),
        state.limiter.clone(),
    );
    processor.select_file(SelectedFile { name, bytes });

    match processor.process_image().await {
        UploadOutcome::Complete { .. } => {
            let extracted_text = processor.extracted_text().to_string();
            Ok(Json(UploadResponse {
                extracted_text,
                medicines: processor.take_results(),
            }))
        }
        UploadOutcome::NoFileSelected => Err(ApiError::NoImage),
        UploadOutcome::RateLimited => Err(ApiError::RateLimited),
        UploadOutcome::ProcessingFailed => Err(ApiError::ProcessingFailed),
        UploadOutcome::NoMedicinesFound => Err(ApiError::NoMedicinesFound {
            extracted_text: processor.extracted_text().to_string(),
        }),
    }
}

async fn decode_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let processor = SearchProcessor::new(state.info.clone(), state.limiter.clone());

    match processor.search(&req.query).await {
        SearchOutcome::Found(medicine) => Ok(Json(SearchResponse { medicine })),
        SearchOutcome::EmptyQuery => Err(ApiError::EmptyQuery),
        SearchOutcome::RateLimited => Err(ApiError::RateLimited),
    }
}
