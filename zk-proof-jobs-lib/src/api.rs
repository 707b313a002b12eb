//! HTTP surface for the orchestrator.

use crate::error::{Error, Result};
use crate::jobs::JobOrchestrator;
use crate::protocol::{
    ErrorResponse, GenerateRequest, GenerateResponse, HealthResponse, ServiceInfoResponse,
    StatsResponse, StatusResponse, VerifyRequest, VerifyResponse,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Wraps a crate error so it renders as `{error, errorCode}` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::UnsupportedProofType(_)
            | Error::VerificationError(_)
            | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
            error_code: self.0.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

pub fn router(orchestrator: JobOrchestrator) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .route("/api/zk/generate", post(generate))
        .route("/api/zk/status/:job_id", get(status))
        .route("/api/zk/proof/:job_id", get(status))
        .route("/api/zk/verify", post(verify))
        .route("/api/zk/stats", get(stats))
        .with_state(orchestrator)
}

/// Serves the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, orchestrator: JobOrchestrator, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Listening for proof job requests");
    }
    axum::serve(listener, router(orchestrator))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn service_info() -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse::default())
}

async fn health(State(orchestrator): State<JobOrchestrator>) -> Json<HealthResponse> {
    Json(orchestrator.health())
}

async fn generate(
    State(orchestrator): State<JobOrchestrator>,
    body: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<GenerateResponse> {
    let Json(request) = body.map_err(|e| Error::InvalidRequest(e.body_text()))?;
    let record = orchestrator.submit(request)?;
    Ok(Json(GenerateResponse::from(&record)))
}

async fn status(
    State(orchestrator): State<JobOrchestrator>,
    Path(job_id): Path<String>,
) -> ApiResult<StatusResponse> {
    let record = orchestrator.get_status(&job_id)?;
    Ok(Json(StatusResponse::from(&record)))
}

async fn verify(
    State(orchestrator): State<JobOrchestrator>,
    body: std::result::Result<Json<VerifyRequest>, JsonRejection>,
) -> ApiResult<VerifyResponse> {
    let Json(request) = body.map_err(|e| Error::VerificationError(e.body_text()))?;
    Ok(Json(orchestrator.verify(request).await?))
}

async fn stats(State(orchestrator): State<JobOrchestrator>) -> ApiResult<StatsResponse> {
    Ok(Json(orchestrator.stats()?))
}
