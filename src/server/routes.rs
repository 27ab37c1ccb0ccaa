use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{MatchedPath, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::HeimdallError;
use crate::gateway::Dispatcher;
use crate::ratelimit::BucketStats;
use crate::telemetry;
use crate::types::{ChatRequest, ChatResponse};

/// Header carrying the caller identity when no API keys are configured.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    api_keys: Arc<HashMap<String, String>>,
    metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            api_keys: Arc::new(HashMap::new()),
            metrics: None,
        }
    }

    /// Identify callers by bearer key instead of `X-User-ID`.
    pub fn with_api_keys(mut self, api_keys: HashMap<String, String>) -> Self {
        self.api_keys = Arc::new(api_keys);
        self
    }

    /// Serve `/metrics` from this handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    fn caller(&self, headers: &HeaderMap) -> Option<String> {
        if self.api_keys.is_empty() {
            return headers
                .get(USER_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);
        }

        let key = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))?;
        self.api_keys.get(key.trim()).cloned()
    }
}

/// Build the router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/usage", get(usage))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(render_metrics))
        .with_state(state)
        .layer(middleware::from_fn(record_http))
        .layer(TraceLayer::new_for_http())
}

/// Count and time every HTTP request, including ones rejected before
/// they reach the dispatcher.
async fn record_http(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;

    metrics::counter!(telemetry::HTTP_REQUESTS_TOTAL,
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => response.status().as_u16().to_string(),
    )
    .increment(1);
    metrics::histogram!(telemetry::HTTP_REQUEST_DURATION_SECONDS,
        "method" => method,
        "path" => path,
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// A dispatch error rendered as `{"error": {"code", "message"}}`.
#[derive(Debug)]
pub struct ApiError(pub HeimdallError);

impl From<HeimdallError> for ApiError {
    fn from(err: HeimdallError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = json!({
            "error": {
                "code": self.0.code(),
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

async fn chat_completions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let caller = state.caller(&headers);

    let request = match body {
        Ok(Json(request)) => request,
        // identity is checked before the body, as in the dispatcher
        Err(_) if caller.is_none() => return Err(HeimdallError::MissingIdentity.into()),
        Err(rejection) => {
            return Err(HeimdallError::MalformedRequest(rejection.body_text()).into());
        }
    };

    let response = state
        .dispatcher
        .dispatch(caller.as_deref(), request)
        .await?;
    Ok(Json(response))
}

async fn usage(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BucketStats>, ApiError> {
    let caller = state
        .caller(&headers)
        .ok_or(HeimdallError::MissingIdentity)?;
    Ok(Json(state.dispatcher.stats(&caller)))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ready",
        "backends": state.dispatcher.registry().names(),
    }))
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
