mod rate_limit;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::{Json, Path as AxumPath, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::body::{Body, Bytes};
use axum::Router;
use bml_agents::{ConciergeAgent, ConciergeConfig};
use bml_core::render::GENERIC_ERROR;
use bml_core::{
    ActionInput, AwaitingInput, BookingSession, EventInput, Language, StartInput, TextInput,
    TranscriptInput,
};
use bml_observability::{AppMetrics, MetricsSnapshot};
use bml_storage::{MemoryStore, StoreStats};
use serde::Serialize;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub use crate::rate_limit::ClientRateLimiter;

const MAX_TEXT_LEN: usize = 2_000;
const MAX_USER_ID_LEN: usize = 128;
const MAX_ACTION_LEN: usize = 128;
const BODY_LIMIT_BYTES: usize = 64 * 1024;

pub type Agent = ConciergeAgent<MemoryStore>;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: String,
    pub api_key: String,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            api_key: "dev-bamboolino-key".to_string(),
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 120,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind = lookup("BML_BIND")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.bind);
        let api_key = lookup("BML_API_KEY")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.api_key);
        let rate_limit_window = lookup("BML_RATE_LIMIT_WINDOW_SECONDS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.rate_limit_window);
        let rate_limit_max = lookup("BML_RATE_LIMIT_MAX")
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|max| *max > 0)
            .unwrap_or(defaults.rate_limit_max);
        let allowed_origins = lookup("BML_ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().trim_end_matches('/').to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.allowed_origins);

        Self {
            bind,
            api_key,
            rate_limit_window,
            rate_limit_max,
            allowed_origins,
        }
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<Agent>,
    pub store: Arc<MemoryStore>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub limiter: ClientRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
}

impl ApiState {
    pub fn new(api: &ApiConfig, concierge: ConciergeConfig) -> Self {
        let metrics = AppMetrics::shared();
        let store = Arc::new(MemoryStore::new());
        let agent = Arc::new(ConciergeAgent::new(
            store.clone(),
            metrics.clone(),
            concierge,
        ));

        Self {
            agent,
            store,
            metrics,
            api_key: api.api_key.clone(),
            limiter: ClientRateLimiter::new(api.rate_limit_window, api.rate_limit_max),
            allowed_origins: Arc::new(api.allowed_origins.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
    store: StoreStats,
    booking_types: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct BookingStatusResponse {
    user_id: String,
    step: &'static str,
    awaiting: AwaitingInput,
    language: Language,
    session: BookingSession,
}

pub async fn build_app() -> Result<Router> {
    let state = ApiState::new(&ApiConfig::from_env(), ConciergeConfig::from_env());
    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/start", post(start))
        .route("/v1/chat", post(chat))
        .route("/v1/action", post(action))
        .route("/v1/booking/event", post(booking_event))
        .route("/v1/booking/:user_id", get(booking_status))
        .route("/v1/transcript", post(transcript))
        .route("/v1/voice/:user_id", post(voice))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

/// Drops abandoned booking sessions on a fixed cadence.
pub fn spawn_session_janitor(agent: Arc<Agent>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match agent.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "expired booking sessions purged"),
                Err(error) => warn!(error = %error, "booking session purge failed"),
            }
        }
    })
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        store: state.store.stats(),
        booking_types: state
            .agent
            .config()
            .enabled_booking_types
            .iter()
            .map(|booking_type| booking_type.as_key())
            .collect(),
    };
    (StatusCode::OK, Json(payload))
}

async fn start(State(state): State<ApiState>, Json(input): Json<StartInput>) -> Response {
    if let Err(response) = validate_user_id(&input.user_id) {
        return response;
    }
    let user_id = input.user_id.clone();
    match state.agent.start(input).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(error) => failure(&state, &user_id, "start_failed", error).await,
    }
}

async fn chat(State(state): State<ApiState>, Json(input): Json<TextInput>) -> Response {
    if let Err(response) = validate_user_id(&input.user_id) {
        return response;
    }
    if let Err(response) = validate_text(&input.text) {
        return response;
    }
    let user_id = input.user_id.clone();
    match state.agent.handle_text(input).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(error) => failure(&state, &user_id, "chat_failed", error).await,
    }
}

async fn action(State(state): State<ApiState>, Json(input): Json<ActionInput>) -> Response {
    if let Err(response) = validate_user_id(&input.user_id) {
        return response;
    }
    if input.action.trim().is_empty() || input.action.len() > MAX_ACTION_LEN {
        return bad_request("invalid_action", "action must be a non-empty callback id");
    }
    let user_id = input.user_id.clone();
    match state.agent.handle_action(input).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(error) => failure(&state, &user_id, "action_failed", error).await,
    }
}

async fn booking_event(State(state): State<ApiState>, Json(input): Json<EventInput>) -> Response {
    if let Err(response) = validate_user_id(&input.user_id) {
        return response;
    }
    let user_id = input.user_id.clone();
    match state.agent.handle_event(input).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(error) => failure(&state, &user_id, "booking_event_failed", error).await,
    }
}

async fn transcript(
    State(state): State<ApiState>,
    Json(input): Json<TranscriptInput>,
) -> Response {
    if let Err(response) = validate_user_id(&input.user_id) {
        return response;
    }
    if let Err(response) = validate_text(&input.text) {
        return response;
    }
    let user_id = input.user_id.clone();
    match state.agent.handle_transcript(input).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(error) => failure(&state, &user_id, "transcript_failed", error).await,
    }
}

/// Raw audio body; transcription happens behind the agent.
async fn voice(
    State(state): State<ApiState>,
    AxumPath(user_id): AxumPath<String>,
    audio: Bytes,
) -> Response {
    if let Err(response) = validate_user_id(&user_id) {
        return response;
    }
    if audio.is_empty() {
        return bad_request("empty_audio", "request body must contain audio bytes");
    }
    match state.agent.handle_voice(&user_id, &audio).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(error) => failure(&state, &user_id, "voice_failed", error).await,
    }
}

async fn booking_status(
    State(state): State<ApiState>,
    AxumPath(user_id): AxumPath<String>,
) -> Response {
    if let Err(response) = validate_user_id(&user_id) {
        return response;
    }
    match state.agent.booking_status(&user_id).await {
        Ok(Some(session)) => (
            StatusCode::OK,
            Json(BookingStatusResponse {
                user_id,
                step: session.step.name(),
                awaiting: session.awaiting(),
                language: session.language,
                session,
            }),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "no_active_booking",
                "message": "no booking in progress for this user"
            })),
        )
            .into_response(),
        Err(error) => failure(&state, &user_id, "booking_status_failed", error).await,
    }
}

#[allow(clippy::result_large_err)]
fn validate_user_id(user_id: &str) -> Result<(), Response> {
    let user_id = user_id.trim();
    if user_id.is_empty() || user_id.len() > MAX_USER_ID_LEN {
        return Err(bad_request(
            "invalid_user_id",
            "user_id must be between 1 and 128 characters",
        ));
    }
    Ok(())
}

#[allow(clippy::result_large_err)]
fn validate_text(text: &str) -> Result<(), Response> {
    if text.len() > MAX_TEXT_LEN {
        return Err(bad_request(
            "text_too_long",
            "text must be at most 2000 bytes",
        ));
    }
    Ok(())
}

fn bad_request(code: &str, message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "error": code,
            "message": message
        })),
    )
        .into_response()
}

/// Logs the cause and answers in the user's stored language, falling back to
/// English when the store is unreachable too.
async fn failure(state: &ApiState, user_id: &str, code: &str, error: anyhow::Error) -> Response {
    let language = state
        .agent
        .stored_language(user_id)
        .await
        .unwrap_or_default();
    internal_error(code, error, language)
}

fn internal_error(code: &str, error: anyhow::Error, language: Language) -> Response {
    error!(error = %error, code, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": code,
            "message": GENERIC_ERROR.get(language)
        })),
    )
        .into_response()
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/health")
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if request.method() == Method::OPTIONS || is_public_endpoint(path.as_str()) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if header_key != state.api_key {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "unauthorized",
                "message": "missing or invalid x-api-key"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let client = client_key(&request);
    if !state.limiter.allow(&client) {
        warn!(client = %client, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this client"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

/// Explicit `x-client-id` wins; otherwise the first forwarded address.
fn client_key(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-client-id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| format!("client:{value}"))
        .unwrap_or_else(|| format!("ip:{}", request_ip(request)))
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .next()
                .unwrap_or("unknown")
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| "local".to_string())
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:3000")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
            header::HeaderName::from_static("x-client-id"),
        ])
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    response
}
