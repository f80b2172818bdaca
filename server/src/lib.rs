use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use search_core::source::{load_documents, tokenize_documents, SourceDocument};
use search_core::tokenizer::{TextProcessor, Tokenizer};
use search_core::{Bm25Params, CoreError, IndexStats, ScoredDocument, SearchEngine};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<ScoredDocument>,
}

#[derive(Serialize)]
pub struct TermResponse {
    pub term: String,
    pub document_frequency: usize,
    pub corpus_term_frequency: u64,
    pub documents: Vec<String>,
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub indexed: usize,
    pub number_of_documents: u32,
}

/// Startup settings, filled from CLI flags and the environment by `main`.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Optional corpus indexed before the server starts accepting queries.
    pub input: Option<PathBuf>,
    pub params: Bm25Params,
    pub tokenizer: TextProcessor,
    pub admin_token: Option<String>,
    /// Comma-separated allowed origins; any origin when unset.
    pub cors_allow_origin: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub tokenizer: TextProcessor,
    pub admin_token: Option<String>,
}

type ApiError = (StatusCode, String);

pub fn build_app(config: ServerConfig) -> Result<Router> {
    let engine = Arc::new(SearchEngine::new(config.params));
    if let Some(input) = &config.input {
        let docs = load_documents(input)?;
        engine.ingest_batch(&tokenize_documents(&docs, &config.tokenizer))?;
        tracing::info!(num_docs = docs.len(), input = %input.display(), "seed corpus indexed");
    }
    let app_state = AppState { engine, tokenizer: config.tokenizer, admin_token: config.admin_token };

    let cors = match &config.cors_allow_origin {
        Some(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/stats", get(stats_handler))
        .route("/term/:term", get(term_handler))
        .route("/index/batch", post(index_batch))
        .route("/index/rebuild", post(index_rebuild))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let q_tokens = state.tokenizer.tokenize(&params.q);
    let k = params.k.clamp(1, 100);
    let top = state.engine.search_top_k(&q_tokens, k).map_err(core_error)?;
    let total_hits = top.total_hits;
    let results = top.results;

    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, total_hits, "search served");
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<IndexStats> {
    Json(state.engine.stats())
}

pub async fn term_handler(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Json<TermResponse>, ApiError> {
    let not_found = || (StatusCode::NOT_FOUND, format!("term '{raw}' is not indexed"));
    let term = state.tokenizer.tokenize(&raw).into_iter().next().ok_or_else(not_found)?;
    let index = state.engine.snapshot();
    let list = index.term(&term).ok_or_else(not_found)?;
    Ok(Json(TermResponse {
        term,
        document_frequency: list.document_frequency(),
        corpus_term_frequency: list.corpus_term_frequency(),
        documents: list.documents().map(str::to_owned).collect(),
    }))
}

// --- Admin endpoints ---
async fn index_batch(State(state): State<AppState>, headers: HeaderMap, Json(docs): Json<Vec<SourceDocument>>) -> Result<Json<IngestResponse>, ApiError> {
    authorize(&state, &headers)?;
    let indexed = docs.len();
    let engine = state.engine.clone();
    let tokenizer = state.tokenizer;
    run_blocking(move || engine.ingest_batch(&tokenize_documents(&docs, &tokenizer))).await?;
    tracing::info!(indexed, "batch indexed");
    Ok(Json(IngestResponse { indexed, number_of_documents: state.engine.stats().number_of_documents }))
}

async fn index_rebuild(State(state): State<AppState>, headers: HeaderMap, Json(docs): Json<Vec<SourceDocument>>) -> Result<Json<IngestResponse>, ApiError> {
    authorize(&state, &headers)?;
    let indexed = docs.len();
    let engine = state.engine.clone();
    let tokenizer = state.tokenizer;
    run_blocking(move || engine.rebuild(&tokenize_documents(&docs, &tokenizer))).await?;
    Ok(Json(IngestResponse { indexed, number_of_documents: state.engine.stats().number_of_documents }))
}

/// Tokenizing and indexing are CPU-bound; keep them off the async workers.
async fn run_blocking<F>(work: F) -> Result<(), ApiError>
where
    F: FnOnce() -> Result<(), CoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("indexing task failed: {e}")))?
        .map_err(core_error)
}

fn core_error(err: CoreError) -> ApiError {
    let status = match err {
        CoreError::EmptyCorpus => StatusCode::SERVICE_UNAVAILABLE,
        CoreError::InvalidDocument(_) | CoreError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
    };
    (status, err.to_string())
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
