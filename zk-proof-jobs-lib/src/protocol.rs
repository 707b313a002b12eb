//! Request and response shapes for the generate / status / verify / stats /
//! health operations.
//!
//! Responses are camelCase. Requests also accept the snake_case spelling of
//! every field.

use crate::backend::BackendInfo;
use crate::error::{Error, Result};
use crate::state::StatusCounts;
use crate::types::{BackendProof, JobId, JobRecord, JobStatus, ProofResult, ProofType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = "zk-proof-jobs";

/// `POST generate`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(alias = "proof_type")]
    pub proof_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, alias = "portfolio_id")]
    pub portfolio_id: Option<u64>,
}

impl GenerateRequest {
    pub fn new(proof_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            proof_type: proof_type.into(),
            data,
            portfolio_id: None,
        }
    }

    pub fn with_portfolio(mut self, portfolio_id: u64) -> Self {
        self.portfolio_id = Some(portfolio_id);
        self
    }

    /// Checks the proof type against the closed set.
    pub fn validate(&self) -> Result<ProofType> {
        self.proof_type.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub timestamp: DateTime<Utc>,
}

impl From<&JobRecord> for GenerateResponse {
    fn from(record: &JobRecord) -> Self {
        Self {
            job_id: record.id().to_string(),
            status: record.status(),
            timestamp: record.created_at(),
        }
    }
}

/// `GET status/{jobId}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub proof_type: ProofType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Submission time.
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl StatusResponse {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl From<&JobRecord> for StatusResponse {
    fn from(record: &JobRecord) -> Self {
        Self {
            job_id: record.id().to_string(),
            status: record.status(),
            proof_type: record.proof_type(),
            proof: record.result().cloned(),
            error: record.error().map(str::to_string),
            timestamp: record.created_at(),
            started_at: record.started_at(),
            completed_at: record.completed_at(),
            failed_at: record.failed_at(),
            duration_ms: record.duration_ms(),
        }
    }
}

/// `POST verify`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub proof: serde_json::Value,
    #[serde(alias = "public_inputs")]
    pub public_inputs: Vec<i64>,
}

impl VerifyRequest {
    pub fn new(proof: serde_json::Value, public_inputs: Vec<i64>) -> Self {
        Self {
            proof,
            public_inputs,
        }
    }

    /// Normalizes the caller's proof into the fixed backend shape.
    ///
    /// Absent fields become empty; extra fields (such as `proofType` on a
    /// proof copied from a status response) are ignored. A proof that is not
    /// an object, or whose fields have the wrong type, is rejected.
    pub fn normalized_proof(&self) -> Result<BackendProof> {
        if !self.proof.is_object() {
            return Err(Error::VerificationError(
                "malformed proof: expected a JSON object".to_string(),
            ));
        }
        serde_json::from_value(self.proof.clone())
            .map_err(|e| Error::VerificationError(format!("malformed proof: {}", e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    pub verified_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub accelerated: bool,
}

/// `GET stats`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub accelerated_enabled: bool,
}

/// `GET health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub backend_available: bool,
    pub backend_enabled: bool,
    pub info: BackendInfo,
}

/// `GET /`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceInfoResponse {
    pub service: String,
    pub status: String,
    pub version: String,
}

impl Default for ServiceInfoResponse {
    fn default() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            status: "operational".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generate_request_accepts_both_spellings() {
        let camel: GenerateRequest = serde_json::from_value(json!({
            "proofType": "risk",
            "data": {"volatility": 1},
            "portfolioId": 4
        }))
        .unwrap();
        let snake: GenerateRequest = serde_json::from_value(json!({
            "proof_type": "risk",
            "data": {"volatility": 1},
            "portfolio_id": 4
        }))
        .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.validate().unwrap(), ProofType::Risk);
    }

    #[test]
    fn unknown_proof_type_fails_validation() {
        let req = GenerateRequest::new("unknown", json!({}));
        assert!(matches!(req.validate(), Err(Error::UnsupportedProofType(_))));
    }

    #[test]
    fn verify_request_normalizes_partial_proofs() {
        let req: VerifyRequest = serde_json::from_value(json!({
            "proof": {"witness": [1, 2, 3], "proofType": "settlement"},
            "public_inputs": [1]
        }))
        .unwrap();
        let proof = req.normalized_proof().unwrap();
        assert_eq!(proof.witness, vec![1, 2, 3]);
        assert!(proof.commitments.is_empty());
        assert!(proof.evaluations.is_empty());
        assert_eq!(proof.fri_proof, json!({}));
        assert_eq!(req.public_inputs, vec![1]);
    }

    #[test]
    fn verify_request_requires_public_inputs() {
        let missing = serde_json::from_value::<VerifyRequest>(json!({"proof": {"witness": [1]}}));
        assert!(missing.is_err());
        let fractional =
            serde_json::from_value::<VerifyRequest>(json!({"proof": {}, "publicInputs": [1.5]}));
        assert!(fractional.is_err());
    }

    #[test]
    fn verify_request_rejects_malformed_proofs() {
        for proof in [json!("abc"), json!([1]), json!({"witness": "nope"})] {
            let req = VerifyRequest::new(proof, vec![]);
            assert!(matches!(
                req.normalized_proof(),
                Err(Error::VerificationError(_))
            ));
        }
    }

    #[test]
    fn stats_response_is_flat() {
        let stats = StatsResponse {
            counts: StatusCounts {
                total: 3,
                pending: 1,
                generating: 0,
                completed: 1,
                failed: 1,
            },
            accelerated_enabled: false,
        };
        assert_eq!(
            serde_json::to_value(stats).unwrap(),
            json!({
                "total": 3,
                "pending": 1,
                "generating": 0,
                "completed": 1,
                "failed": 1,
                "acceleratedEnabled": false
            })
        );
    }

    #[test]
    fn status_response_omits_absent_fields() {
        let record = JobRecord::new("proof_1_ab".to_string(), ProofType::Rebalance, None);
        let value = serde_json::to_value(StatusResponse::from(&record)).unwrap();
        assert_eq!(value["jobId"], "proof_1_ab");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["proofType"], "rebalance");
        assert!(value.get("proof").is_none());
        assert!(value.get("error").is_none());
        assert!(value.get("durationMs").is_none());
    }
}
