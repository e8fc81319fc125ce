//! HTTP API server.
//!
//! Every analysis endpoint takes a JSON body `{"text": "..."}` and runs its
//! own grammar check; sibling endpoints do not share results.
//!
//! # Endpoints
//!
//! - `GET /` — Service banner.
//! - `GET /health` — Liveness check.
//! - `POST /analyze` — The full analysis in one response.
//! - `POST /corrected_text` — Text with the first suggestion of every match applied.
//! - `POST /error_count` — Number of matches.
//! - `POST /word_count` — Whitespace-delimited token count of the input.
//! - `POST /error_details` — Type, text, message and suggestions per match.
//! - `POST /translate_native_words` — Russian→English translation of non-ASCII words.
//! - `POST /error_chart` — PNG bar chart of match categories.
//! - `POST /translate_to_russian` — English→Russian translation of the whole text.

use crate::analysis::{AnalysisResult, ErrorDetail, TextAnalyzer, Translations};
use crate::chart;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Message returned by the chart endpoint when the text has no errors.
pub const NO_ERRORS_MESSAGE: &str = "Ошибок не обнаружено";

/// File name offered for the chart download.
const CHART_FILENAME: &str = "error_chart.png";

/// Shared state for the web server, accessible by all route handlers.
pub struct AppState {
    /// Grammar checker and translator, built once at startup.
    pub analyzer: TextAnalyzer,
}

/// Request body shared by every POST endpoint.
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// Response body for failed requests.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct CorrectedTextResponse {
    corrected_text: String,
}

#[derive(Serialize)]
struct ErrorCountResponse {
    error_count: usize,
}

#[derive(Serialize)]
struct WordCountResponse {
    word_count: usize,
}

#[derive(Serialize)]
struct ErrorDetailsResponse {
    error_details: Vec<ErrorDetail>,
}

#[derive(Serialize)]
struct TranslationsResponse {
    translations: Translations,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RussianTranslationResponse {
    Translated {
        original_text: String,
        translated_text: String,
    },
    Failed {
        error: String,
    },
}

/// Failures that end a request with a non-2xx status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The grammar checker could not be reached or returned garbage.
    #[error("{0:#}")]
    Checker(anyhow::Error),

    /// The chart could not be rendered.
    #[error("{0:#}")]
    Chart(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Checker(_) => StatusCode::BAD_GATEWAY,
            ApiError::Chart(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("Request failed: {}", self);

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Builds the API router around the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    // Configure CORS to allow requests from any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/analyze", post(analyze))
        .route("/corrected_text", post(corrected_text))
        .route("/error_count", post(error_count))
        .route("/word_count", post(word_count))
        .route("/error_details", post(error_details))
        .route("/translate_native_words", post(translate_native_words))
        .route("/error_chart", post(error_chart))
        .route("/translate_to_russian", post(translate_to_russian))
        .layer(cors)
        .with_state(state)
}

/// Binds `addr` and serves the API until the server fails.
pub async fn serve(addr: std::net::SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    use anyhow::Context;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Text Analyzer API listening on http://{}", addr);

    axum::serve(listener, router(state))
        .await
        .context("Server error")
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Text Analyzer API",
    })
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Runs the full analysis pipeline for one request.
async fn run_analysis(state: &AppState, text: &str) -> Result<AnalysisResult, ApiError> {
    state.analyzer.analyze(text).await.map_err(ApiError::Checker)
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TextRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    Ok(Json(run_analysis(&state, &request.text).await?))
}

async fn corrected_text(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TextRequest>,
) -> Result<Json<CorrectedTextResponse>, ApiError> {
    let analysis = run_analysis(&state, &request.text).await?;
    Ok(Json(CorrectedTextResponse {
        corrected_text: analysis.corrected_text,
    }))
}

async fn error_count(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TextRequest>,
) -> Result<Json<ErrorCountResponse>, ApiError> {
    let analysis = run_analysis(&state, &request.text).await?;
    Ok(Json(ErrorCountResponse {
        error_count: analysis.error_count,
    }))
}

async fn word_count(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TextRequest>,
) -> Result<Json<WordCountResponse>, ApiError> {
    let analysis = run_analysis(&state, &request.text).await?;
    Ok(Json(WordCountResponse {
        word_count: analysis.word_count,
    }))
}

async fn error_details(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TextRequest>,
) -> Result<Json<ErrorDetailsResponse>, ApiError> {
    let analysis = run_analysis(&state, &request.text).await?;
    Ok(Json(ErrorDetailsResponse {
        error_details: analysis.error_details,
    }))
}

async fn translate_native_words(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TextRequest>,
) -> Result<Json<TranslationsResponse>, ApiError> {
    let analysis = run_analysis(&state, &request.text).await?;
    Ok(Json(TranslationsResponse {
        translations: analysis.translations,
    }))
}

/// Renders the error chart, or reports that there is nothing to chart.
///
/// Only the grammar check runs here; no translation is attempted.
async fn error_chart(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TextRequest>,
) -> Result<Response, ApiError> {
    let matches = state
        .analyzer
        .check(&request.text)
        .await
        .map_err(ApiError::Checker)?;

    if matches.is_empty() {
        return Ok(Json(MessageResponse {
            message: NO_ERRORS_MESSAGE,
        })
        .into_response());
    }

    let png = tokio::task::spawn_blocking(move || chart::render_error_chart(&matches))
        .await
        .map_err(|e| ApiError::Chart(anyhow::anyhow!("Chart rendering task failed: {}", e)))?
        .map_err(ApiError::Chart)?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", CHART_FILENAME),
            ),
        ],
        png,
    )
        .into_response())
}

/// Translates the whole text to Russian.
///
/// Translation failures are reported in the body with status 200.
async fn translate_to_russian(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TextRequest>,
) -> Json<RussianTranslationResponse> {
    match state.analyzer.translate_to_russian(&request.text).await {
        Ok(translated_text) => Json(RussianTranslationResponse::Translated {
            original_text: request.text,
            translated_text,
        }),
        Err(e) => {
            error!("Translation to Russian failed: {:#}", e);
            Json(RussianTranslationResponse::Failed {
                error: format!("{:#}", e),
            })
        }
    }
}
