pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::ApiError;
pub use service::{AppState, create_app};
