//! Configuration module for the Text Analyzer API.
//!
//! Handles loading configuration from environment variables and .env files.

use crate::translator::TranslationBackend;
use anyhow::{Context, Result};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Public LanguageTool server used when `LANGUAGETOOL_URL` is not set.
pub const DEFAULT_LANGUAGETOOL_URL: &str = "https://api.languagetool.org";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub host: Ipv4Addr,

    /// Port the HTTP server listens on.
    pub port: u16,

    /// Base URL of the LanguageTool server (without the `/v2/check` path).
    pub languagetool_url: String,

    /// Which translation backend to use (google or libretranslate).
    pub translation_backend: TranslationBackend,

    /// URL of the translation endpoint.
    /// For Google this is the base URL; for LibreTranslate the full `/translate` URL.
    pub translation_api_url: String,

    /// Timeout applied to every outgoing HTTP request.
    pub request_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `HOST`: IPv4 address to bind (default: 127.0.0.1)
    /// - `PORT`: Port to listen on (default: 8000)
    /// - `LANGUAGETOOL_URL`: LanguageTool server (default: https://api.languagetool.org)
    /// - `TRANSLATION_BACKEND`: "google" (default) or "libretranslate"
    /// - `TRANSLATION_API_URL`: Translation endpoint (default depends on backend)
    /// - `REQUEST_TIMEOUT_SECS`: Outgoing request timeout in seconds (default: 30)
    pub fn load() -> Result<Self> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host: Ipv4Addr = std::env::var("HOST")
            .unwrap_or_else(|_| "127.0.0.1".to_string())
            .parse()
            .context("HOST must be a valid IPv4 address")?;

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .context("PORT must be a valid port number")?;

        let languagetool_url = std::env::var("LANGUAGETOOL_URL")
            .unwrap_or_else(|_| DEFAULT_LANGUAGETOOL_URL.to_string());

        // Parse translation backend (default to Google)
        let translation_backend: TranslationBackend = std::env::var("TRANSLATION_BACKEND")
            .map(|s| s.parse().unwrap_or_default())
            .unwrap_or_default();

        let translation_api_url = std::env::var("TRANSLATION_API_URL")
            .unwrap_or_else(|_| translation_backend.default_url().to_string());

        let timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("REQUEST_TIMEOUT_SECS must be a valid positive number")?;

        Ok(Config {
            host,
            port,
            languagetool_url,
            translation_backend,
            translation_api_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
