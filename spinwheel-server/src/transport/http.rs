//! HTTP/JSON transport
//!
//! # API Endpoints
//!
//! All operations are `POST` with a JSON body. The participant's phone number
//! may be sent as `identity`, `phone` or `whatsapp`.
//!
//! ## POST /register
//!
//! ```json
//! { "name": "Ana Paula", "phone": "(21) 99999-8888" }
//! ```
//!
//! Response: `{ "success": true, "isNewIdentity": true }`
//!
//! ## POST /spin
//!
//! ```json
//! { "identity": "21999998888" }
//! ```
//!
//! Response: `{ "prize": "COMBO", "targetAngle": 1391.7, "claimedToday": 0 }`
//!
//! ## POST /claim
//!
//! ```json
//! { "identity": "21999998888", "prize": "COMBO" }
//! ```
//!
//! Response: `{ "couponNumber": 7, "couponCode": "TOP-007", "prize": "COMBO" }`
//!
//! ## POST /status
//!
//! Response: `{ "identity": "5521999998888", "spinsUsed": 3, "spinsRemaining": 0,
//! "nextSpinAt": "2024-05-02T22:00:00Z", "claimsToday": 1, "claimsRemaining": 2 }`
//!
//! ## Errors
//!
//! | Status | `error` | Meaning |
//! |--------|---------|---------|
//! | 400 | `invalid_argument` | Malformed body, identity, name or prize |
//! | 429 | `spin_limit_reached` | Spin quota exhausted, see `retryAt` |
//! | 429 | `daily_limit_reached` | Claim quota exhausted, see `retryAt` |
//! | 500 | `store_unavailable` | Store failure, safe to retry |
//! | 500 | `internal_error` | Server misconfiguration |
//!
//! Each operation runs on its own task. A client that disconnects mid-request
//! does not cancel the store writes already under way.
//!
//! ## GET /health
//!
//! Returns "OK" with 200 status.
//!
//! ## GET /metrics
//!
//! Prometheus text format.

use super::Transport;
use crate::error::ServiceError;
use crate::metrics::{Metrics, Operation, Outcome};
use crate::service::WheelService;
use crate::types::{
    ClaimRequest, ClaimResponse, ErrorResponse, IdentityRequest, RegisterRequest,
    RegisterResponse, SpinResponse, StatusResponse,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// HTTP transport implementation
pub struct HttpTransport {
    addr: SocketAddr,
}

impl HttpTransport {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let addr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("Invalid HTTP address {host}:{port}"))?;
        Ok(Self { addr })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn start(self, service: WheelService, metrics: Arc<Metrics>) -> Result<()> {
        let app = router(Arc::new(AppState::new(service, metrics)));

        tracing::info!("HTTP server listening on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

pub struct AppState {
    service: WheelService,
    metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(service: WheelService, metrics: Arc<Metrics>) -> Self {
        AppState { service, metrics }
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(handle_register))
        .route("/spin", post(handle_spin))
        .route("/claim", post(handle_claim))
        .route("/status", post(handle_status))
        .route("/health", get(|| async { "OK" }))
        .route("/metrics", get(handle_metrics))
        .with_state(state)
}

/// A [`ServiceError`] rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(ServiceError::InvalidArgument(rejection.body_text()))
    }
}

impl ApiError {
    fn outcome(&self) -> Outcome {
        match &self.0 {
            ServiceError::InvalidArgument(_) => Outcome::Invalid,
            ServiceError::QuotaExceeded { .. } => Outcome::Denied,
            ServiceError::Store(_) | ServiceError::Internal(_) => Outcome::Failed,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            ServiceError::InvalidArgument(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "invalid_argument".into(),
                    message,
                    retry_at: None,
                },
            ),
            ServiceError::QuotaExceeded { kind, retry_at } => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse {
                    error: kind.code().into(),
                    message: format!("{kind} limit reached"),
                    retry_at: Some(retry_at),
                },
            ),
            // Store details stay in the logs
            ServiceError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "store_unavailable".into(),
                    message: "Temporary failure, please try again".into(),
                    retry_at: None,
                },
            ),
            ServiceError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "internal_error".into(),
                    message: "Internal server error".into(),
                    retry_at: None,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Record the outcome of one operation and log failures at their level
fn finish<T>(
    state: &AppState,
    operation: Operation,
    started: Instant,
    result: std::result::Result<T, ApiError>,
) -> std::result::Result<T, ApiError> {
    let latency_us = started.elapsed().as_micros() as u64;
    let outcome = match &result {
        Ok(_) => Outcome::Granted,
        Err(e) => e.outcome(),
    };
    state.metrics.record(operation, outcome, latency_us);

    if let Err(ApiError(e)) = &result {
        match e {
            ServiceError::Store(_) => tracing::error!(?operation, "Store failure: {}", e),
            ServiceError::Internal(_) => tracing::error!(?operation, "Internal failure: {}", e),
            _ => tracing::warn!(?operation, "Request refused: {}", e),
        }
    }
    result
}

type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;
type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Run one operation to completion on its own task
///
/// Dropping the returned future (client gone) leaves the task running, so a
/// claim never stops between allocating its serial and recording the claim.
async fn detached<T, F>(state: Arc<AppState>, operation: Operation, work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: Future<Output = ApiResult<T>> + Send + 'static,
{
    let started = Instant::now();
    let task_state = state.clone();
    let task = tokio::spawn(async move {
        let result = work.await;
        finish(&task_state, operation, started, result)
    });

    match task.await {
        Ok(result) => result,
        Err(e) => {
            let error = ApiError(ServiceError::Internal(format!("request task failed: {e}")));
            finish(&state, operation, started, Err(error))
        }
    }
}

async fn handle_register(
    State(state): State<Arc<AppState>>,
    body: JsonBody<RegisterRequest>,
) -> ApiResult<RegisterResponse> {
    let task_state = state.clone();
    detached(state, Operation::Register, async move {
        register(&task_state, body).await
    })
    .await
}

async fn register(state: &AppState, body: JsonBody<RegisterRequest>) -> ApiResult<RegisterResponse> {
    let Json(req) = body?;
    let registration = state
        .service
        .register(&req.name, &req.phone, Utc::now())
        .await?;
    if registration.is_new_identity {
        state.metrics.record_new_identity();
    }
    Ok(Json(RegisterResponse::from(registration)))
}

async fn handle_spin(
    State(state): State<Arc<AppState>>,
    body: JsonBody<IdentityRequest>,
) -> ApiResult<SpinResponse> {
    let task_state = state.clone();
    detached(state, Operation::Spin, async move { spin(&task_state, body).await }).await
}

async fn spin(state: &AppState, body: JsonBody<IdentityRequest>) -> ApiResult<SpinResponse> {
    let Json(req) = body?;
    let outcome = state.service.spin(&req.identity, Utc::now()).await?;
    Ok(Json(SpinResponse::from(outcome)))
}

async fn handle_claim(
    State(state): State<Arc<AppState>>,
    body: JsonBody<ClaimRequest>,
) -> ApiResult<ClaimResponse> {
    let task_state = state.clone();
    detached(state, Operation::Claim, async move { claim(&task_state, body).await }).await
}

async fn claim(state: &AppState, body: JsonBody<ClaimRequest>) -> ApiResult<ClaimResponse> {
    let Json(req) = body?;
    let outcome = state
        .service
        .claim(&req.identity, &req.prize, Utc::now())
        .await?;
    state.metrics.record_coupon(outcome.coupon_serial);
    Ok(Json(ClaimResponse::from(outcome)))
}

async fn handle_status(
    State(state): State<Arc<AppState>>,
    body: JsonBody<IdentityRequest>,
) -> ApiResult<StatusResponse> {
    let started = Instant::now();
    let result = status(&state, body).await;
    finish(&state, Operation::Status, started, result)
}

async fn status(state: &AppState, body: JsonBody<IdentityRequest>) -> ApiResult<StatusResponse> {
    let Json(req) = body?;
    let status = state.service.status(&req.identity, Utc::now()).await?;
    Ok(Json(StatusResponse::from(status)))
}

async fn handle_metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.export_prometheus()
}
