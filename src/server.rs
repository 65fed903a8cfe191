use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as AnyhowContext;
use axum::{
    debug_handler,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, signal};

use crate::{
    cli::CliArgs,
    error::{Result, TranslateError},
    feedback::FeedbackStore,
    metrics,
    translate::{Selector, TranslationService},
};

#[derive(Clone)]
pub struct AppState {
    service: Arc<TranslationService>,
    store: Arc<FeedbackStore>,
}

impl AppState {
    pub fn new(service: Arc<TranslationService>, store: Arc<FeedbackStore>) -> Self {
        Self { service, store }
    }
}

pub async fn run_server(
    args: &CliArgs,
    service: TranslationService,
    store: FeedbackStore,
) -> Result<()> {
    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("parsing listen address `{}`", args.listen))?;

    let state = AppState::new(Arc::new(service), Arc::new(store));
    let router = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .context("binding gateway listen address")?;
    println!(
        "Translation gateway listening on http://{}",
        listener.local_addr().unwrap_or(addr)
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(err) = signal::ctrl_c().await {
                tracing::warn!("failed to listen for shutdown signal: {err:?}");
            }
            println!("Shutdown signal received; stopping server");
        })
        .await
        .context("running translation gateway")?;

    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/translate", post(translate))
        .route("/translator", post(translate))
        .route("/screen_translator", post(screen_translate))
        .route("/get_cpu_info", get(get_cpu_info))
        .route("/save_feedback", post(save_feedback))
        .route("/models", get(list_models))
        .with_state(state)
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Wire-level error shape: every failure is `{"error": message}` with either
/// a 400 or a 500 status.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!("internal server error: {message}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<TranslateError> for ApiError {
    fn from(err: TranslateError) -> Self {
        // Inference failures ride the same 400 path as validation failures;
        // clients only ever see `{"error": ...}`.
        if !err.is_client_error() {
            tracing::warn!("translation failed: {err}");
        }
        Self::bad_request(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[derive(Debug, Deserialize)]
struct TranslateRequest {
    text: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Serialize)]
struct TranslateResponse {
    translated_text: String,
    source_language: &'static str,
    target_language: &'static str,
    time: f64,
}

#[derive(Debug, Deserialize)]
struct ScreenTranslateRequest {
    text: Option<String>,
    #[serde(default = "default_source")]
    source: String,
    #[serde(default = "default_target")]
    target: String,
}

fn default_source() -> String {
    "de".to_owned()
}

fn default_target() -> String {
    "en".to_owned()
}

#[derive(Debug, Serialize)]
struct ScreenTranslateResponse {
    text: String,
    source: String,
    target: String,
    time: f64,
}

#[debug_handler]
async fn translate(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TranslateRequest>, JsonRejection>,
) -> ApiResult<Json<TranslateResponse>> {
    let Json(request) = payload?;
    let selector = match &request.model {
        Some(model) => Selector::ById(model),
        None => Selector::Default,
    };

    let translation = state
        .service
        .translate(selector, request.text.as_deref())
        .await?;

    Ok(Json(TranslateResponse {
        translated_text: translation.translated_text,
        source_language: translation.source_lang,
        target_language: translation.target_lang,
        time: translation.time,
    }))
}

async fn screen_translate(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ScreenTranslateRequest>, JsonRejection>,
) -> ApiResult<Json<ScreenTranslateResponse>> {
    let Json(request) = payload?;
    let selector = Selector::ByPair {
        source: &request.source,
        target: &request.target,
    };

    let translation = state
        .service
        .translate(selector, request.text.as_deref())
        .await?;

    Ok(Json(ScreenTranslateResponse {
        text: translation.translated_text,
        source: request.source,
        target: request.target,
        time: translation.time,
    }))
}

async fn get_cpu_info() -> ApiResult<Json<metrics::MetricsSnapshot>> {
    let snapshot = metrics::sample()
        .await
        .map_err(|err| ApiError::internal(format!("{err:#}")))?;
    Ok(Json(snapshot))
}

async fn save_feedback(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(record) = payload?;
    state
        .store
        .append(record)
        .await
        .map_err(|err| ApiError::internal(format!("{err:#}")))?;
    Ok(Json(json!({ "status": "success" })))
}

async fn list_models(State(state): State<AppState>) -> Json<Value> {
    let models: Vec<Value> = state
        .service
        .registry()
        .entries()
        .iter()
        .map(|entry| {
            json!({
                "id": entry.spec.id,
                "description": entry.spec.description,
                "source": entry.spec.source,
                "target": entry.spec.target,
            })
        })
        .collect();

    Json(json!({ "models": models }))
}

async fn index() -> Html<&'static str> {
    Html(include_str!("ui.html"))
}
