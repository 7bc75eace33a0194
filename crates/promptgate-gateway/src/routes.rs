//! HTTP routes and handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use promptgate_core::{ChatMessage, Error, Violation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};

use crate::config::GatewayConfig;
use crate::exchange::{ExchangeOutcome, GatewayService};
use crate::runner::RunOrchestrator;
use crate::upstream::ChatRequest;
use promptgate_store::{Case, NewCase, Store};

/// Response header carrying the serialized violation list
pub const VIOLATIONS_HEADER: &str = "x-promptgate-violations";

/// Error-body code identifying a policy block
pub const BLOCKED_CODE: &str = "blocked_by_policy";

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// The gateway exchange path
    pub gateway: Arc<GatewayService>,

    /// Storage collaborator
    pub store: Arc<dyn Store>,

    /// Suite-run orchestrator
    pub orchestrator: RunOrchestrator,

    /// Prometheus metrics handle for rendering (absent in tests)
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Initialize application state from configuration
    pub fn new(
        config: &GatewayConfig,
        store: Arc<dyn Store>,
        metrics_handle: Option<PrometheusHandle>,
    ) -> promptgate_core::Result<Self> {
        let gateway = Arc::new(GatewayService::new(config)?);
        let orchestrator =
            RunOrchestrator::new(store.clone(), gateway.clone(), config.excerpt_limit);

        Ok(Self {
            gateway,
            store,
            orchestrator,
            metrics_handle,
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/suites", post(create_suite))
        .route("/v1/suites/:id/cases", post(create_cases).get(list_cases))
        .route("/v1/runs", post(submit_run))
        .route("/v1/runs/:id", get(get_run).delete(delete_run))
        .route("/v1/runs/:id/cancel", post(cancel_run))
        .route("/v1/runs/:id/results", get(get_results))
        .fallback(fallback)
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics_endpoint(State(state): State<AppState>) -> String {
    match &state.metrics_handle {
        Some(handle) => handle.render(),
        None => String::new(),
    }
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// OpenAI-compatible chat completions request
#[derive(Debug, Deserialize)]
struct ChatCompletionBody {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(default)]
    max_tokens: Option<u32>,
    #[serde(default)]
    temperature: Option<f32>,
}

/// Main chat completions handler
async fn chat_completions(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    body: Result<Json<ChatCompletionBody>, JsonRejection>,
) -> Result<Response, AppError> {
    metrics::counter!("promptgate_requests_total").increment(1);

    let Json(body) = body.map_err(|e| Error::invalid_request(e.body_text()))?;

    if body.messages.is_empty() {
        return Err(AppError::from(Error::invalid_request(
            "messages must not be empty",
        )));
    }

    let request = ChatRequest {
        model: body.model,
        messages: body.messages,
        max_tokens: body.max_tokens,
        temperature: body.temperature,
    };

    let auth = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    match state.gateway.execute(&request, auth).await? {
        ExchangeOutcome::Blocked { violations, .. } => {
            warn!(model = %request.model, "request rejected by policy");
            Ok(blocked_response(&violations))
        }
        ExchangeOutcome::Completed { body, violations, .. } => {
            let mut response = Json(body).into_response();
            attach_violations_header(&mut response, &violations);
            Ok(response)
        }
    }
}

/// 403 response for a policy block, with the first violation surfaced
/// as the primary error and the full list retained
fn blocked_response(violations: &[Violation]) -> Response {
    let message = match violations.first() {
        Some(v) => format!("{}: {}", v.category, v.reason),
        None => "blocked by policy".to_string(),
    };
    let body = json!({
        "error": {
            "code": BLOCKED_CODE,
            "message": message,
            "violations": violations,
        }
    });

    let mut response = (StatusCode::FORBIDDEN, Json(body)).into_response();
    attach_violations_header(&mut response, violations);
    response
}

fn attach_violations_header(response: &mut Response, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    if let Ok(serialized) = serde_json::to_string(violations) {
        if let Ok(value) = HeaderValue::from_str(&serialized) {
            response.headers_mut().insert(VIOLATIONS_HEADER, value);
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateSuiteBody {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

async fn create_suite(
    State(state): State<AppState>,
    Json(body): Json<CreateSuiteBody>,
) -> Result<(StatusCode, Json<promptgate_store::Suite>), AppError> {
    let suite = state
        .store
        .create_suite(&body.name, body.description.as_deref())
        .await?;
    info!(suite_id = %suite.id, "suite created");
    Ok((StatusCode::CREATED, Json(suite)))
}

/// Accepts a single case or a bulk import
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreateCasesBody {
    Bulk { cases: Vec<NewCase> },
    Single(NewCase),
}

async fn create_cases(
    State(state): State<AppState>,
    Path(suite_id): Path<String>,
    Json(body): Json<CreateCasesBody>,
) -> Result<(StatusCode, Json<Vec<Case>>), AppError> {
    let new_cases = match body {
        CreateCasesBody::Bulk { cases } => cases,
        CreateCasesBody::Single(case) => vec![case],
    };

    let mut created = Vec::with_capacity(new_cases.len());
    for case in new_cases {
        created.push(state.store.create_case(&suite_id, case).await?);
    }
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_cases(
    State(state): State<AppState>,
    Path(suite_id): Path<String>,
) -> Result<Json<Vec<Case>>, AppError> {
    if state.store.get_suite(&suite_id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    Ok(Json(state.store.cases_for_suite(&suite_id).await?))
}

#[derive(Debug, Deserialize)]
struct SubmitRunBody {
    suite_id: String,
    model: String,
}

async fn submit_run(
    State(state): State<AppState>,
    Json(body): Json<SubmitRunBody>,
) -> Result<(StatusCode, Json<promptgate_store::Run>), AppError> {
    let run = state
        .orchestrator
        .submit(&body.suite_id, &body.model)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(run)))
}

async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<promptgate_store::Run>, AppError> {
    state
        .store
        .get_run(&run_id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

async fn get_results(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<Vec<promptgate_store::RunResult>>, AppError> {
    if state.store.get_run(&run_id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    Ok(Json(state.store.results_for_run(&run_id).await?))
}

/// Request cooperative cancellation; the orchestrator checks before
/// each case and marks the run failed
async fn cancel_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let run = state
        .store
        .get_run(&run_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if run.is_terminal() {
        return Err(AppError::from(Error::invalid_request(
            "run already reached a terminal state",
        )));
    }

    state.orchestrator.cancel(&run_id);
    Ok(StatusCode::ACCEPTED)
}

async fn delete_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.store.get_run(&run_id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    state.store.delete_run(&run_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    NotFound,
    Core(Error),
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self::Core(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                "resource not found".to_string(),
            ),
            AppError::Core(err) => match err {
                Error::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg),
                Error::Upstream { status, body } => (
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    "upstream_error",
                    body,
                ),
                Error::UpstreamUnreachable(msg) => {
                    (StatusCode::BAD_GATEWAY, "upstream_unreachable", msg)
                }
                Error::Store(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg),
                other => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    other.to_string(),
                ),
            },
        };

        let body = json!({
            "error": {
                "code": code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}
