//! HTTP server for the WikiQuiz API.
//!
//! Exposes quiz generation, history and retrieval to the frontend, plus a
//! health check and the OpenAPI document.

use crate::config::Config;
use crate::gemini::GeminiCliBackend;
use crate::model::{ApiError, GenerateRequest, HealthResponse, HistoryItem, QuizResponse};
use crate::pipeline::{ErrorClass, PipelineError, QuizPipeline};
use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};
use utoipa::OpenApi;

/// OpenAPI documentation for the WikiQuiz API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "WikiQuiz API",
        version = "0.1.0",
        description = "Generate multiple-choice quizzes from Wikipedia articles with Gemini.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://127.0.0.1:8000", description = "Local development server")
    ),
    paths(generate_quiz, history, get_quiz, health_check),
    components(schemas(
        crate::model::GenerateRequest,
        crate::model::QuizResponse,
        crate::model::Question,
        crate::model::HistoryItem,
        crate::model::HealthResponse,
        crate::model::ApiError,
        crate::model::ApiErrorDetail,
    )),
    tags(
        (name = "Quiz", description = "Quiz generation and retrieval"),
        (name = "Health", description = "Server health and status")
    )
)]
pub struct ApiDoc;

/// Shared application state
pub struct AppState {
    pub pipeline: QuizPipeline,
    pub config: Config,
    gemini_cli: GeminiCliBackend,
}

impl AppState {
    pub fn new(pipeline: QuizPipeline, config: Config) -> Self {
        let gemini_cli = GeminiCliBackend::from_config(&config.model);
        Self {
            pipeline,
            config,
            gemini_cli,
        }
    }
}

/// CORS for the configured frontend origins, with credentials
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    // Wildcards are not allowed together with credentials
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/openapi.json", get(openapi_json))
        .route("/generate_quiz", post(generate_quiz))
        .route("/history", get(history))
        .route("/quiz/:id", get(get_quiz))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// OpenAPI document endpoint
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Scrape an article and generate a quiz for it
#[utoipa::path(
    post,
    path = "/generate_quiz",
    tag = "Quiz",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Generated and stored quiz", body = QuizResponse),
        (status = 400, description = "The URL could not be scraped", body = ApiError),
        (status = 500, description = "Generation or storage failed", body = ApiError)
    )
)]
#[instrument(skip(state, request), fields(url = %request.url))]
async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<QuizResponse>, AppError> {
    let response = state.pipeline.generate_for_url(&request.url).await?;
    Ok(Json(response))
}

/// List stored quizzes, newest first
#[utoipa::path(
    get,
    path = "/history",
    tag = "Quiz",
    responses(
        (status = 200, description = "Stored quizzes", body = [HistoryItem]),
        (status = 500, description = "Storage failed", body = ApiError)
    )
)]
async fn history(State(state): State<Arc<AppState>>) -> Result<Json<Vec<HistoryItem>>, AppError> {
    Ok(Json(state.pipeline.history().await?))
}

/// Fetch one stored quiz
#[utoipa::path(
    get,
    path = "/quiz/{id}",
    tag = "Quiz",
    params(("id" = i64, Path, description = "Quiz id")),
    responses(
        (status = 200, description = "Stored quiz", body = QuizResponse),
        (status = 404, description = "No quiz with that id", body = ApiError)
    )
)]
async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<QuizResponse>, AppError> {
    state
        .pipeline
        .quiz(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Server health status", body = HealthResponse)
    )
)]
#[instrument(skip(state))]
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let gemini_cli_available = state.gemini_cli.check_available().await;
    let database_ok = state.pipeline.store().ping().await;

    Json(HealthResponse {
        status: if database_ok { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        gemini_cli_available,
        database_ok,
    })
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Pipeline(PipelineError),
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        AppError::Pipeline(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::not_found(msg)),
            AppError::Pipeline(e) => {
                let code = match &e {
                    PipelineError::Extract(_) => "scrape_failed",
                    PipelineError::Generate(_) => "generation_failed",
                    PipelineError::Store(_) => "storage_failed",
                    PipelineError::Serialize(_) => "serialization_failed",
                };
                match e.class() {
                    ErrorClass::ClientInput => (
                        StatusCode::BAD_REQUEST,
                        ApiError::invalid_request(e.to_string()).with_code(code),
                    ),
                    ErrorClass::Service => {
                        error!("Request failed: {}", e);
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            ApiError::internal_error(e.to_string()).with_code(code),
                        )
                    }
                }
            }
        };

        (status, Json(error)).into_response()
    }
}

/// Start the HTTP server
pub async fn start_server(state: Arc<AppState>) -> Result<(), std::io::Error> {
    let addr = state.config.server_addr();
    let router = create_router(state);

    info!("Starting WikiQuiz server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
