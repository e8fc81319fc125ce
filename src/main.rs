//! Text Analyzer API server binary.

use anyhow::Result;
use colored::Colorize;
use std::net::SocketAddr;
use std::sync::Arc;
use text_analyzer::web::{self, AppState};
use text_analyzer::{Config, LanguageToolClient, TextAnalyzer, Translator};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging - use RUST_LOG env var, defaulting to info level
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("text_analyzer=info")),
        )
        .init();

    // Load configuration
    let config = Config::load()?;

    info!("Grammar checker: {}", config.languagetool_url);
    info!(
        "Translation backend: {:?} ({})",
        config.translation_backend, config.translation_api_url
    );

    // Create the remote clients once; handlers share them read-only
    let checker = LanguageToolClient::new(&config.languagetool_url, config.request_timeout)?;
    let translator = Translator::new(
        &config.translation_api_url,
        config.translation_backend.clone(),
        config.request_timeout,
    )?;
    let state = Arc::new(AppState {
        analyzer: TextAnalyzer::new(checker, translator),
    });

    let addr = SocketAddr::from((config.host, config.port));
    println!(
        "\n{} {}\n",
        "Text Analyzer API".bright_cyan().bold(),
        format!("http://{}", addr).bright_green()
    );

    web::serve(addr, state).await
}
