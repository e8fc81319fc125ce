//! Text analysis built on the grammar checker and the translator.
//!
//! [`TextAnalyzer`] owns the two remote clients and derives everything the
//! HTTP endpoints report: corrected text, counts, per-error details and
//! translations of Russian words.

use crate::checker::{CheckMatch, LanguageToolClient};
use crate::translator::Translator;
use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::ops::Range;
use tracing::{debug, warn};

/// Key of the single entry returned when the text has no native words.
pub const NO_NATIVE_WORDS_KEY: &str = "Нет слов на родном языке";

/// Value of the single entry returned when the text has no native words.
pub const NO_NATIVE_WORDS_VALUE: &str = "Перевод не требуется";

/// Prefix of the placeholder stored for a word whose translation failed.
pub const TRANSLATION_ERROR_PREFIX: &str = "Ошибка перевода";

lazy_static! {
    /// Sentence-ending punctuation glued to the next non-space character.
    static ref MISSING_SENTENCE_SPACE: Regex = Regex::new(r"([.!?])(\S)").unwrap();
}

/// Outcome of translating one native word. `Err` carries the failure message.
pub type WordTranslation = std::result::Result<String, String>;

/// Translations of the native words found in a text.
#[derive(Debug, Clone, PartialEq)]
pub enum Translations {
    /// The text contained no native words; nothing was sent to the translator.
    NotRequired,
    /// One entry per distinct word in first-seen order, holding the last outcome.
    Words(Vec<(String, WordTranslation)>),
}

impl Translations {
    /// Records `outcome` for `word`, replacing an earlier outcome in place.
    fn record(entries: &mut Vec<(String, WordTranslation)>, word: &str, outcome: WordTranslation) {
        match entries.iter_mut().find(|(existing, _)| existing == word) {
            Some(entry) => entry.1 = outcome,
            None => entries.push((word.to_string(), outcome)),
        }
    }
}

impl Serialize for Translations {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Translations::NotRequired => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(NO_NATIVE_WORDS_KEY, NO_NATIVE_WORDS_VALUE)?;
                map.end()
            }
            Translations::Words(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (word, outcome) in entries {
                    match outcome {
                        Ok(translation) => map.serialize_entry(word, translation)?,
                        Err(message) => map.serialize_entry(
                            word,
                            &format!("{}: {}", TRANSLATION_ERROR_PREFIX, message),
                        )?,
                    }
                }
                map.end()
            }
        }
    }
}

/// Simplified view of a [`CheckMatch`] for API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    /// Issue category reported by the checker.
    #[serde(rename = "type")]
    pub error_type: String,
    /// The offending substring of the original text.
    pub text: String,
    /// Human-readable description.
    pub message: String,
    /// Suggested replacements, best first.
    pub suggestions: Vec<String>,
}

/// Everything derived from one analysis of a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub corrected_text: String,
    pub error_count: usize,
    pub word_count: usize,
    pub error_details: Vec<ErrorDetail>,
    pub translations: Translations,
}

/// Facade over the grammar checker and translator.
#[derive(Debug, Clone)]
pub struct TextAnalyzer {
    checker: LanguageToolClient,
    translator: Translator,
}

impl TextAnalyzer {
    pub fn new(checker: LanguageToolClient, translator: Translator) -> Self {
        Self {
            checker,
            translator,
        }
    }

    /// Runs the grammar checker on `text` and returns its raw matches.
    pub async fn check(&self, text: &str) -> Result<Vec<CheckMatch>> {
        self.checker
            .check(text)
            .await
            .context("Grammar check failed")
    }

    /// Checks `text` and derives the full [`AnalysisResult`].
    ///
    /// A checker failure fails the whole analysis. Translation failures
    /// never do; they are recorded per word.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        let matches = self.check(text).await?;

        let words = native_words(text);
        debug!(
            "Analysis found {} matches and {} native words",
            matches.len(),
            words.len()
        );
        let translations = self.translate_native_words(&words).await;

        Ok(AnalysisResult {
            corrected_text: apply_corrections(text, &matches),
            error_count: matches.len(),
            word_count: count_words(text),
            error_details: error_details(text, &matches),
            translations,
        })
    }

    /// Translates each word from Russian to English.
    ///
    /// Every word is attempted, duplicates included; a failed word is
    /// recorded as an error and the rest of the batch continues.
    pub async fn translate_native_words(&self, words: &[String]) -> Translations {
        if words.is_empty() {
            return Translations::NotRequired;
        }

        let mut entries = Vec::with_capacity(words.len());
        for word in words {
            let outcome = match self.translator.translate(word, "ru", "en").await {
                Ok(translation) => Ok(translation),
                Err(e) => {
                    warn!("Failed to translate '{}': {:#}", word, e);
                    Err(format!("{:#}", e))
                }
            };
            Translations::record(&mut entries, word, outcome);
        }

        Translations::Words(entries)
    }

    /// Translates the whole text from English to Russian and fixes sentence spacing.
    pub async fn translate_to_russian(&self, text: &str) -> Result<String> {
        let translation = self.translator.translate(text, "en", "ru").await?;
        Ok(space_after_sentence_punctuation(&translation))
    }
}

/// Applies the first replacement of every match to `text`.
///
/// Matches are ordered by offset and spliced from the last to the first, so
/// a splice never shifts the offsets of the matches still to be applied.
/// Matches without replacements are skipped. Offsets are character indices
/// and are clamped to the end of the text.
pub fn apply_corrections(text: &str, matches: &[CheckMatch]) -> String {
    let mut ordered: Vec<&CheckMatch> = matches.iter().collect();
    ordered.sort_by_key(|m| m.offset);

    let mut corrected = text.to_string();
    for m in ordered.into_iter().rev() {
        let Some(replacement) = m.replacements.first() else {
            continue;
        };
        let range = char_span(&corrected, m.offset, m.error_length);
        corrected.replace_range(range, replacement);
    }
    corrected
}

/// Number of whitespace-delimited tokens in `text`.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Tokens containing at least one non-ASCII character, in order, with duplicates.
pub fn native_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|word| !word.is_ascii())
        .map(str::to_string)
        .collect()
}

/// Projects matches into [`ErrorDetail`]s, slicing the flagged text out of `text`.
pub fn error_details(text: &str, matches: &[CheckMatch]) -> Vec<ErrorDetail> {
    matches
        .iter()
        .map(|m| ErrorDetail {
            error_type: m.issue_type.clone(),
            text: text[char_span(text, m.offset, m.error_length)].to_string(),
            message: m.message.clone(),
            suggestions: m.replacements.clone(),
        })
        .collect()
}

/// Inserts a space after `.`, `!` or `?` wherever one is directly followed by
/// a non-whitespace character.
pub fn space_after_sentence_punctuation(text: &str) -> String {
    MISSING_SENTENCE_SPACE.replace_all(text, "$1 $2").into_owned()
}

/// Byte range of `len` characters starting at character `start`, clamped to `s`.
fn char_span(s: &str, start: usize, len: usize) -> Range<usize> {
    let byte_at = |index: usize| {
        s.char_indices()
            .nth(index)
            .map(|(i, _)| i)
            .unwrap_or(s.len())
    };
    byte_at(start)..byte_at(start.saturating_add(len))
}
