// ===============================
// src/config.rs
// ===============================
use std::env;
use std::time::Duration;

use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Settings {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
    pub poll_seconds: u64,
    pub http_timeout: Duration,
    pub metrics_port: u16,
}

pub fn load() -> Settings {
    // Read .env so the BITUNIX_* keys are available
    let _ = dotenv();

    // Credentials have no sane default; fail fast at startup.
    let api_key = env::var("BITUNIX_API_KEY").expect("BITUNIX_API_KEY missing");
    let api_secret = env::var("BITUNIX_API_SECRET").expect("BITUNIX_API_SECRET missing");

    // A trailing slash would double up when request paths are appended.
    let base_url = env::var("BITUNIX_BASE_URL")
        .unwrap_or_else(|_| "https://fapi.bitunix.com".to_string())
        .trim_end_matches('/')
        .to_string();

    let poll_seconds = env::var("POLL_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3);
    let http_timeout_secs: u64 = env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(15);
    let metrics_port = env::var("METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9898);

    Settings {
        api_key,
        api_secret,
        base_url,
        poll_seconds,
        http_timeout: Duration::from_secs(http_timeout_secs),
        metrics_port,
    }
}
