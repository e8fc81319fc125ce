//! Text Analyzer API
//!
//! Grammar-checks English text with LanguageTool, translates Russian words to
//! English, and charts the distribution of error categories.

pub mod analysis;
pub mod chart;
pub mod checker;
pub mod config;
pub mod translator;
pub mod web;

pub use analysis::{AnalysisResult, TextAnalyzer};
pub use checker::{CheckMatch, LanguageToolClient};
pub use config::Config;
pub use translator::{TranslationBackend, Translator};
