//! LanguageTool grammar-checking client.
//!
//! Sends text to a LanguageTool server (`POST /v2/check`) and converts the
//! returned matches into [`CheckMatch`] values whose offsets are character
//! indices into the submitted text.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Language all checks run against.
pub const CHECK_LANGUAGE: &str = "en-US";

/// One flagged span reported by the grammar checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckMatch {
    /// Character index where the flagged span starts.
    pub offset: usize,
    /// Length of the flagged span in characters.
    pub error_length: usize,
    /// Rule category, e.g. "grammar", "misspelling", "style", "typographical".
    pub issue_type: String,
    /// Human-readable description of the problem.
    pub message: String,
    /// Candidate fixes, best first. May be empty.
    pub replacements: Vec<String>,
}

/// Response from the LanguageTool `/v2/check` endpoint.
#[derive(Debug, Deserialize)]
struct CheckResponse {
    matches: Vec<LanguageToolMatch>,
}

/// Single match as LanguageTool encodes it. Offsets are UTF-16 code units.
#[derive(Debug, Deserialize)]
struct LanguageToolMatch {
    message: String,
    offset: usize,
    length: usize,
    #[serde(default)]
    replacements: Vec<LanguageToolReplacement>,
    rule: LanguageToolRule,
}

#[derive(Debug, Deserialize)]
struct LanguageToolReplacement {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct LanguageToolRule {
    #[serde(rename = "issueType", default)]
    issue_type: String,
}

/// Client for a LanguageTool HTTP server.
#[derive(Debug, Clone)]
pub struct LanguageToolClient {
    /// HTTP client for API requests.
    client: reqwest::Client,

    /// Server base URL, e.g. `https://api.languagetool.org`.
    base_url: String,
}

impl LanguageToolClient {
    /// Creates a client for the LanguageTool server at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Checks `text` and returns the matches in the order the server reported them.
    ///
    /// # Errors
    ///
    /// Fails when the server is unreachable, answers with a non-success
    /// status, or returns a body that is not a LanguageTool check response.
    pub async fn check(&self, text: &str) -> Result<Vec<CheckMatch>> {
        let url = format!("{}/v2/check", self.base_url);

        debug!("Checking {} characters with LanguageTool", text.chars().count());

        let response = self
            .client
            .post(&url)
            .form(&[("text", text), ("language", CHECK_LANGUAGE)])
            .send()
            .await
            .context("Failed to send request to LanguageTool")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("LanguageTool API error: {} - {}", status, body);
            anyhow::bail!("LanguageTool returned status: {}", status);
        }

        let result: CheckResponse = response
            .json()
            .await
            .context("Failed to parse LanguageTool response")?;

        debug!("LanguageTool reported {} matches", result.matches.len());

        Ok(result
            .matches
            .into_iter()
            .map(|m| convert_match(text, m))
            .collect())
    }
}

/// Converts a wire match into a [`CheckMatch`] with character offsets.
fn convert_match(text: &str, m: LanguageToolMatch) -> CheckMatch {
    let start = utf16_to_char_offset(text, m.offset);
    let end = utf16_to_char_offset(text, m.offset + m.length);

    CheckMatch {
        offset: start,
        error_length: end.saturating_sub(start),
        issue_type: m.rule.issue_type,
        message: m.message,
        replacements: m.replacements.into_iter().map(|r| r.value).collect(),
    }
}

/// Maps a UTF-16 code unit offset to the index of the character it falls in.
///
/// Offsets past the end of the text map to the character count.
fn utf16_to_char_offset(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (index, c) in text.chars().enumerate() {
        units += c.len_utf16();
        if units > utf16_offset {
            return index;
        }
    }
    text.chars().count()
}
