//! Parley Gateway: message analysis over HTTP.
//! `POST /analyze`, provider relay routes, `/health`.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parley_core::{
    build_prompt, AgentResponse, AnalysisRequest, Communicator, ModelProvider, ParleyConfig,
    PromptKind, ProviderError, ProviderGateway, TracingSink, UserMessage,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
struct AppState {
    communicator: Arc<Communicator>,
    gateway: ProviderGateway,
}

impl AppState {
    fn new(gateway: ProviderGateway) -> Self {
        let communicator = Communicator::new(gateway.clone()).with_sink(Arc::new(TracingSink));
        Self {
            communicator: Arc::new(communicator),
            gateway,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("[parley] could not load .env: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ParleyConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(target: "parley::gateway", error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };
    if config.openai.resolved_api_key().is_none() || config.meta_llama.resolved_api_key().is_none() {
        tracing::warn!(
            target: "parley::gateway",
            "no API key configured for at least one provider; calls will fail and fall back"
        );
    }

    let state = AppState::new(ProviderGateway::from_config(&config));
    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(target: "parley::gateway", %addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(target: "parley::gateway", %addr, version = parley_core::version(), "parley gateway listening");

    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!(target: "parley::gateway", error = %e, "server error");
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze_handler))
        .route("/api/openai", post(openai_relay))
        .route("/api/metaLlama", post(meta_llama_relay))
        .with_state(state)
        .layer(axum::middleware::from_fn(log_requests))
}

async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        target: "parley::http",
        %method,
        %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

async fn health() -> &'static str {
    "OK"
}

fn error_body(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(json!({ "error": error.into() }))).into_response()
}

/// POST /analyze: validate, run the cascade on its own task, answer with `AgentResponse`.
async fn analyze_handler(
    State(state): State<AppState>,
    body: Result<Json<UserMessage>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Invalid request format",
                    "details": rejection.body_text(),
                })),
            )
                .into_response();
        }
    };

    let request = match AnalysisRequest::try_from(body) {
        Ok(r) => r,
        Err(e) => return error_body(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let model = request.model;

    let communicator = Arc::clone(&state.communicator);
    let task = tokio::spawn(async move { communicator.process(&request).await });

    match task.await {
        Ok(Ok(result)) => Json(AgentResponse::from(result)).into_response(),
        Ok(Err(e)) => error_body(StatusCode::BAD_REQUEST, e.to_string()),
        Err(join_err) => {
            tracing::error!(target: "parley::gateway", %model, error = %join_err, "analysis task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal processing error",
                    "details": join_err.to_string(),
                })),
            )
                .into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Provider relay: one prompt, raw completion back
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RelayRequest {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    state: Option<RelayState>,
    #[serde(default)]
    analysis: Option<Value>,
    #[serde(default)]
    dynamics: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RelayState {
    #[serde(default)]
    context: Option<RelayContext>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayContext {
    #[serde(default)]
    source_culture: Option<String>,
    #[serde(default)]
    target_culture: Option<String>,
    #[serde(default)]
    source_gender: Option<String>,
    #[serde(default)]
    target_gender: Option<String>,
}

async fn openai_relay(
    State(state): State<AppState>,
    body: Result<Json<RelayRequest>, JsonRejection>,
) -> Response {
    relay(&state.gateway, ModelProvider::OpenAi, body).await
}

async fn meta_llama_relay(
    State(state): State<AppState>,
    body: Result<Json<RelayRequest>, JsonRejection>,
) -> Response {
    relay(&state.gateway, ModelProvider::MetaLlama, body).await
}

fn present(v: &Option<String>) -> bool {
    v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

async fn relay(
    gateway: &ProviderGateway,
    provider: ModelProvider,
    body: Result<Json<RelayRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return error_body(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let Some(relay_state) = body.state else {
        return error_body(StatusCode::BAD_REQUEST, "Missing required state.context");
    };
    let Some(ctx) = relay_state.context else {
        return error_body(StatusCode::BAD_REQUEST, "Missing required state.context");
    };
    if !present(&ctx.source_gender) || !present(&ctx.target_gender) {
        return error_body(StatusCode::BAD_REQUEST, "Missing required gender information");
    }

    let kind = body
        .kind
        .as_deref()
        .and_then(PromptKind::parse)
        .unwrap_or(PromptKind::Nuances);
    let request = AnalysisRequest::new(
        relay_state.message.unwrap_or_default(),
        ctx.source_culture.unwrap_or_default(),
        ctx.target_culture.unwrap_or_default(),
        ctx.source_gender.unwrap_or_default(),
        ctx.target_gender.unwrap_or_default(),
        provider,
    );
    let context = match kind {
        PromptKind::Adaptations => body.analysis.as_ref(),
        PromptKind::GenderSuggestions => body.dynamics.as_ref(),
        PromptKind::Nuances | PromptKind::Gender => None,
    };
    let prompt = build_prompt(kind, &request, context);

    match gateway.call(&prompt.system, &prompt.user, provider).await {
        Ok(content) => Json(json!({ "content": content })).into_response(),
        Err(e) => provider_error_response(&e),
    }
}

fn provider_error_response(e: &ProviderError) -> Response {
    match e {
        ProviderError::RateLimited { retry_after_secs } => {
            let minutes = retry_after_secs.div_ceil(60);
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": "Service temporarily unavailable",
                    "retryAfter": retry_after_secs,
                    "message": format!("Please try again in {} minutes", minutes),
                })),
            )
                .into_response();
            if let Ok(v) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, v);
            }
            response
        }
        ProviderError::InternalError(msg) | ProviderError::Transport(msg) => {
            let kind = if e.is_http_status() { "upstream" } else { "transport" };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": e.to_string(),
                    "details": { "type": kind, "message": msg },
                })),
            )
                .into_response()
        }
    }
}
