use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chitalka::{ContentPipeline, Definition, FetchError, PageSource, Processed};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct ProcessRequest {
    pub html: String,
    #[serde(default)]
    pub fetch: bool,
}

#[derive(Serialize)]
pub struct DefinitionResponse {
    pub word: String,
    /// `found`, `not_found` or `error`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub words: usize,
    pub with_definition: usize,
}

pub struct AppState<S> {
    pub pipeline: Arc<ContentPipeline<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self { pipeline: self.pipeline.clone() }
    }
}

pub fn build_app<S: PageSource + 'static>(pipeline: Arc<ContentPipeline<S>>) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/definition/:word", get(definition_handler::<S>))
        .route("/process", post(process_handler::<S>))
        .route("/stats", get(stats_handler::<S>))
        .with_state(AppState { pipeline })
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn definition_handler<S: PageSource + 'static>(
    State(state): State<AppState<S>>,
    Path(word): Path<String>,
) -> (StatusCode, Json<DefinitionResponse>) {
    match state.pipeline.fetcher().fetch_definition(&word, &[]).await {
        Ok(fetched) => match fetched.definition {
            Definition::Html(html) => (
                StatusCode::OK,
                Json(DefinitionResponse { word: fetched.word, status: "found", html: Some(html), error: None }),
            ),
            Definition::NotFound => (
                StatusCode::NOT_FOUND,
                Json(DefinitionResponse { word: fetched.word, status: "not_found", html: None, error: None }),
            ),
        },
        Err(e) => {
            let code = match &e {
                FetchError::EmptyWord => StatusCode::BAD_REQUEST,
                FetchError::Retrieval(_) => StatusCode::BAD_GATEWAY,
                FetchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (code, Json(DefinitionResponse { word, status: "error", html: None, error: Some(e.to_string()) }))
        }
    }
}

pub async fn process_handler<S: PageSource + 'static>(
    State(state): State<AppState<S>>,
    Json(req): Json<ProcessRequest>,
) -> Json<Processed> {
    Json(state.pipeline.process(&req.html, req.fetch).await)
}

pub async fn stats_handler<S: PageSource + 'static>(State(state): State<AppState<S>>) -> Response {
    match state.pipeline.fetcher().cache().get_all() {
        Ok(records) => {
            let with_definition = records.iter().filter(|r| r.is_fetched()).count();
            Json(StatsResponse { words: records.len(), with_definition }).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "stats unavailable");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
