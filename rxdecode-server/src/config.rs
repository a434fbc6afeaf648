use std::env;

use anyhow::{Context, Result};
use tracing::warn;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_CLIENT_ORIGIN: &str = "http://localhost:5173";
const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Service configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub vision_api_key: String,
    pub gemini_api_key: String,
    pub jwt_secret: String,
    pub client_origin: String,
    /// Mark session cookies `Secure`; enabled when APP_ENV=production.
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("invalid PORT value: {raw}"))?,
            Err(_) => DEFAULT_PORT,
        };

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using development secret");
            DEV_JWT_SECRET.to_string()
        });

        Ok(Self {
            port,
            database_url: require("DATABASE_URL")?,
            vision_api_key: require("VISION_API_KEY")?,
            gemini_api_key: require("GEMINI_API_KEY")?,
            jwt_secret,
            client_origin: env::var("CLIENT_ORIGIN")
                .unwrap_or_else(|_| DEFAULT_CLIENT_ORIGIN.to_string()),
            secure_cookies: env::var("APP_ENV").as_deref() == Ok("production"),
        })
    }
}

fn require(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} environment variable must be set"))
}
