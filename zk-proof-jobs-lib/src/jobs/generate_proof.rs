// Background worker for a single proof job

use crate::context::ProofJobsContext;
use crate::error::{Error, Result};
use crate::types::{BackendProof, JobId, JobRecord, ProofResult, ProofType, Statement, WitnessPayload};
use crate::witness::ProofPayload;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything the worker needs, captured at submission time.
#[derive(Debug, Clone)]
pub struct ProofJob {
    pub job_id: JobId,
    pub proof_type: ProofType,
    pub data: serde_json::Value,
    pub portfolio_id: Option<u64>,
}

/// Drives one job from pending to a terminal state.
///
/// Never returns an error: every failure after submission is recorded on the
/// job itself and observed through a status read.
pub async fn run_proof_job(ctx: ProofJobsContext, job: ProofJob) {
    let job_id = job.job_id.clone();

    // 1. pending -> generating
    if let Err(e) = ctx.registry().update(&job_id, JobRecord::start) {
        error!(%job_id, error = %e, "Could not start proof job");
        return;
    }
    info!(%job_id, proof_type = %job.proof_type, "Starting proof generation");

    // 2. Encode and prove
    let started = Instant::now();
    let outcome = generate_proof(&ctx, &job).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    // 3. Record the terminal state
    let recorded = match outcome {
        Ok(proof) => {
            let result = ProofResult {
                proof,
                proof_type: job.proof_type,
                accelerated: ctx.acceleration_enabled(),
                duration_ms,
            };
            ctx.registry()
                .update(&job_id, |record| record.complete(result))
                .map(|_| info!(%job_id, duration_ms, "Generated proof successfully."))
        }
        Err(e) => {
            warn!(%job_id, duration_ms, error = %e, "Proof generation failed");
            ctx.registry()
                .update(&job_id, |record| record.fail(e.to_string(), duration_ms))
                .map(|_| ())
        }
    };
    if let Err(e) = recorded {
        error!(%job_id, error = %e, "Could not record proof job outcome");
    }
}

/// Encodes the witness and calls the backend on the blocking pool,
/// bounded by the configured job timeout if any.
async fn generate_proof(ctx: &ProofJobsContext, job: &ProofJob) -> Result<BackendProof> {
    let payload = ProofPayload::from_json(job.proof_type, &job.data);
    let witness = payload.encode();
    debug!(job_id = %job.job_id, witness_len = witness.len(), "Encoded witness");

    let statement = Statement {
        proof_type: job.proof_type,
        portfolio_id: job.portfolio_id,
    };
    let witness_payload = WitnessPayload {
        witness,
        data: job.data.clone(),
    };

    let backend = ctx.backend().clone();
    let task = tokio::task::spawn_blocking(move || {
        backend
            .generate_proof(&statement, &witness_payload)
            .map_err(|e| Error::BackendError(e.to_string()))
    });

    let joined = match ctx.config().job_timeout() {
        Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
            Error::Timeout(format!("proof generation exceeded {}s", limit.as_secs()))
        })?,
        None => task.await,
    };

    joined.map_err(|e| Error::Internal(format!("proof worker aborted: {}", e)))?
}
