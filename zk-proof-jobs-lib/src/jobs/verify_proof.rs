// Stateless proof verification

use crate::context::ProofJobsContext;
use crate::error::{Error, Result};
use crate::protocol::{VerifyRequest, VerifyResponse};
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info};

/// Verifies a caller-supplied proof against public inputs.
///
/// Does not touch the job registry. A malformed proof or any backend error is
/// reported as `VerificationError`; only a clean backend answer yields
/// `valid: false`.
pub async fn verify_proof(ctx: &ProofJobsContext, request: VerifyRequest) -> Result<VerifyResponse> {
    let started = Instant::now();
    let proof = request.normalized_proof()?;
    debug!(
        witness_len = proof.witness.len(),
        public_inputs = request.public_inputs.len(),
        "Verifying proof"
    );

    let backend = ctx.backend().clone();
    let public_inputs = request.public_inputs;
    let valid = tokio::task::spawn_blocking(move || backend.verify_proof(&proof, &public_inputs))
        .await
        .map_err(|e| Error::VerificationError(format!("verifier aborted: {}", e)))?
        .map_err(|e| Error::VerificationError(e.to_string()))?;

    let duration_ms = started.elapsed().as_millis() as u64;
    info!(valid, duration_ms, "Verified proof");

    Ok(VerifyResponse {
        valid,
        verified_at: Utc::now(),
        duration_ms,
        accelerated: ctx.acceleration_enabled(),
    })
}
