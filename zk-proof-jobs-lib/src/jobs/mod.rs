// Job orchestration for proof generation requests.
//
// Submit creates the pending record synchronously and hands the work to a
// background task; the caller then polls status until the job is terminal.
// One task per job, with no pool bound or admission control.

pub mod generate_proof;
pub mod verify_proof;

pub use generate_proof::{ProofJob, run_proof_job};
pub use verify_proof::verify_proof;

use crate::backend::{BackendInfo, ProvingBackend};
use crate::config::ServiceConfig;
use crate::context::ProofJobsContext;
use crate::error::{Error, Result};
use crate::protocol::{GenerateRequest, HealthResponse, StatsResponse, VerifyRequest, VerifyResponse};
use crate::types::{JobRecord, new_job_id};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Entry point for every proof job operation.
#[derive(Clone, Debug)]
pub struct JobOrchestrator {
    ctx: ProofJobsContext,
}

impl JobOrchestrator {
    pub fn new(ctx: ProofJobsContext) -> Self {
        Self { ctx }
    }

    /// Convenience constructor with a fresh registry.
    pub fn with_backend(config: ServiceConfig, backend: Arc<dyn ProvingBackend>) -> Self {
        Self::new(ProofJobsContext::new(config, backend))
    }

    pub fn context(&self) -> &ProofJobsContext {
        &self.ctx
    }

    /// Accepts a generation request and returns the pending record.
    ///
    /// The proof type is validated before anything is created, so an
    /// unsupported type leaves the registry untouched. The record exists by the
    /// time this returns; the backend call runs on a spawned task. Must be
    /// called from within a tokio runtime.
    pub fn submit(&self, request: GenerateRequest) -> Result<JobRecord> {
        let proof_type = request.validate()?;

        let job_id = new_job_id();
        let record = self
            .ctx
            .registry()
            .create(&job_id, proof_type, request.portfolio_id)?;
        info!(%job_id, %proof_type, portfolio_id = ?request.portfolio_id, "Accepted proof job");

        let job = ProofJob {
            job_id,
            proof_type,
            data: request.data,
            portfolio_id: request.portfolio_id,
        };
        tokio::spawn(run_proof_job(self.ctx.clone(), job));

        Ok(record)
    }

    pub fn get_status(&self, job_id: &str) -> Result<JobRecord> {
        debug!(%job_id, "Status lookup");
        self.ctx.registry().get(job_id)
    }

    pub async fn verify(&self, request: VerifyRequest) -> Result<VerifyResponse> {
        verify_proof(&self.ctx, request).await
    }

    pub fn stats(&self) -> Result<StatsResponse> {
        Ok(StatsResponse {
            counts: self.ctx.registry().counts()?,
            accelerated_enabled: self.ctx.acceleration_enabled(),
        })
    }

    pub fn health(&self) -> HealthResponse {
        let info: BackendInfo = self.ctx.backend_info();
        HealthResponse {
            status: "healthy".to_string(),
            backend_available: info.available,
            backend_enabled: info.acceleration_enabled,
            info,
        }
    }

    /// Polls a job until it reaches a terminal state.
    ///
    /// Fails with `Timeout` once `max_polls` reads have not seen a terminal
    /// status, and with `NotFound` for unknown ids.
    pub async fn wait_for(&self, job_id: &str, interval: Duration, max_polls: usize) -> Result<JobRecord> {
        for _ in 0..max_polls {
            let record = self.get_status(job_id)?;
            if record.status().is_terminal() {
                return Ok(record);
            }
            tokio::time::sleep(interval).await;
        }
        Err(Error::Timeout(format!(
            "job {} not finished after {} polls",
            job_id, max_polls
        )))
    }
}
