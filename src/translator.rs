//! Translation client supporting the Google Translate web endpoint and LibreTranslate.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Translation backend to use.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TranslationBackend {
    /// Google Translate via the public `translate_a/single` endpoint.
    #[default]
    Google,
    /// LibreTranslate - open-source translation server.
    LibreTranslate,
}

impl TranslationBackend {
    /// Endpoint used when `TRANSLATION_API_URL` is not configured.
    pub fn default_url(&self) -> &'static str {
        match self {
            TranslationBackend::Google => "https://translate.googleapis.com",
            TranslationBackend::LibreTranslate => "http://localhost:5000/translate",
        }
    }
}

impl FromStr for TranslationBackend {
    type Err = std::convert::Infallible;

    /// Parses the backend from a string.
    ///
    /// Accepts "libretranslate" or "libre" for LibreTranslate, defaults to Google.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "libretranslate" | "libre" => TranslationBackend::LibreTranslate,
            _ => TranslationBackend::Google,
        })
    }
}

/// Translation service client.
///
/// Holds a single pooled HTTP client; cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Translator {
    /// HTTP client for API requests.
    client: reqwest::Client,

    /// Base URL (Google) or full endpoint URL (LibreTranslate).
    api_url: String,

    /// Which backend to use.
    backend: TranslationBackend,
}

/// Request body for LibreTranslate API.
#[derive(Debug, Serialize)]
struct LibreTranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
}

/// Response from LibreTranslate API.
#[derive(Debug, Deserialize)]
struct LibreTranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl Translator {
    /// Creates a new Translator.
    ///
    /// # Arguments
    ///
    /// * `api_url` - Base URL for Google, or the full `/translate` URL for LibreTranslate.
    /// * `backend` - Which translation backend to use.
    /// * `timeout` - Timeout applied to each translation request.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: &str, backend: TranslationBackend, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            backend,
        })
    }

    /// Translates `text` from `source_lang` to `target_lang`.
    ///
    /// # Errors
    ///
    /// Fails when the backend is unreachable, answers with a non-success
    /// status, or returns a body that cannot be parsed into a translation.
    pub async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let translation = match self.backend {
            TranslationBackend::Google => {
                self.translate_with_google(text, source_lang, target_lang)
                    .await
            }
            TranslationBackend::LibreTranslate => {
                self.translate_with_libretranslate(text, source_lang, target_lang)
                    .await
            }
        }?;

        debug!(
            "Translated '{}' ({} -> {}): '{}'",
            text, source_lang, target_lang, translation
        );

        Ok(translation)
    }

    /// Translates text using the Google Translate `translate_a/single` endpoint.
    async fn translate_with_google(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String> {
        let encoded_text = urlencoding::encode(text);
        let url = format!(
            "{}/translate_a/single?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.api_url.trim_end_matches('/'),
            source_lang,
            target_lang,
            encoded_text
        );

        let response = self
            .client
            .get(&url)
            .header(
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            )
            .send()
            .await
            .context("Failed to reach translation service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Google Translate API error: {} - {}", status, body);
            anyhow::bail!("Translation service returned status: {}", status);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse translation response")?;

        parse_google_response(&json)
    }

    /// Translates text using the LibreTranslate API.
    async fn translate_with_libretranslate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String> {
        let request = LibreTranslateRequest {
            q: text,
            source: source_lang,
            target: target_lang,
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to LibreTranslate API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("LibreTranslate API error: {} - {}", status, body);
            anyhow::bail!("LibreTranslate API returned status: {}", status);
        }

        let result: LibreTranslateResponse = response
            .json()
            .await
            .context("Failed to parse LibreTranslate API response")?;

        Ok(result.translated_text)
    }
}

/// Extracts the translated text from a Google `translate_a/single` response.
///
/// Google splits long input into segments under index 0; the translation of
/// each segment sits at `[0][i][0]` and the segments are concatenated.
fn parse_google_response(json: &serde_json::Value) -> Result<String> {
    let segments = json
        .get(0)
        .and_then(|v| v.as_array())
        .context("Invalid translation response format: missing segments")?;

    let translation: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(|v| v.as_str()))
        .collect();

    if translation.is_empty() {
        anyhow::bail!("Empty translation received from Google");
    }

    Ok(translation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_from_str() {
        assert_eq!(
            "libretranslate".parse::<TranslationBackend>().unwrap(),
            TranslationBackend::LibreTranslate
        );
        assert_eq!(
            "LIBRE".parse::<TranslationBackend>().unwrap(),
            TranslationBackend::LibreTranslate
        );
        assert_eq!(
            "google".parse::<TranslationBackend>().unwrap(),
            TranslationBackend::Google
        );
        assert_eq!(
            "something-else".parse::<TranslationBackend>().unwrap(),
            TranslationBackend::Google
        );
    }

    #[test]
    fn test_parse_google_response_concatenates_segments() {
        let json = json!([
            [
                ["Привет. ", "Hello. ", null, null, 1],
                ["Как дела?", "How are you?", null, null, 1]
            ],
            null,
            "en"
        ]);

        let translation = parse_google_response(&json).unwrap();
        assert_eq!(translation, "Привет. Как дела?");
    }

    #[test]
    fn test_parse_google_response_missing_segments() {
        let json = json!({"error": "nope"});
        assert!(parse_google_response(&json).is_err());
    }

    #[test]
    fn test_parse_google_response_empty_translation() {
        let json = json!([[[null, "hello"]], null, "en"]);
        let err = parse_google_response(&json).unwrap_err();
        assert!(err.to_string().contains("Empty translation"));
    }
}
