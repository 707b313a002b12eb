use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// The kind of statement a proof job attests to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProofType {
    Settlement, // Batch settlement of payments
    Risk,       // Portfolio risk assessment
    Rebalance,  // Allocation change
}

impl ProofType {
    pub const ALL: [ProofType; 3] = [ProofType::Settlement, ProofType::Risk, ProofType::Rebalance];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProofType::Settlement => "settlement",
            ProofType::Risk => "risk",
            ProofType::Rebalance => "rebalance",
        }
    }
}

impl fmt::Display for ProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProofType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "settlement" => Ok(ProofType::Settlement),
            "risk" => Ok(ProofType::Risk),
            "rebalance" => Ok(ProofType::Rebalance),
            _ => Err(Error::UnsupportedProofType(s.to_string())),
        }
    }
}

/// Lifecycle status of a proof job.
///
/// Variants are declared in lifecycle order, so `Ord` reflects progress:
/// a job's observed status never compares lower than a previous observation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Generating,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// The only legal edges are pending -> generating -> {completed, failed}.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Generating)
                | (JobStatus::Generating, JobStatus::Completed)
                | (JobStatus::Generating, JobStatus::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Generating => "generating",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Identifier for a submitted proof job
pub type JobId = String;

/// Allocates a fresh job identifier of the form `proof_<unix-millis>_<16 hex>`.
///
/// The 64 random bits carry the uniqueness; the timestamp only helps humans
/// reading logs.
pub fn new_job_id() -> JobId {
    let nonce: [u8; 8] = rand::random();
    format!("proof_{}_{}", Utc::now().timestamp_millis(), hex::encode(nonce))
}

/// The proof structure exchanged with the backend.
///
/// Every field defaults to empty so that partially specified proofs submitted
/// for verification normalize into this fixed shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendProof {
    pub witness: Vec<i64>,
    pub commitments: Vec<String>,
    pub evaluations: Vec<serde_json::Value>,
    #[serde(alias = "fri_proof")]
    pub fri_proof: serde_json::Value,
}

impl Default for BackendProof {
    fn default() -> Self {
        Self {
            witness: Vec::new(),
            commitments: Vec::new(),
            evaluations: Vec::new(),
            fri_proof: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

// Public claim the witness is meant to satisfy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub proof_type: ProofType,
    pub portfolio_id: Option<u64>,
}

// Encoded witness plus the raw payload it was derived from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WitnessPayload {
    pub witness: Vec<i64>,
    pub data: serde_json::Value,
}

/// Result attached to a completed job: the backend output plus derived metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProofResult {
    #[serde(flatten)]
    pub proof: BackendProof,
    pub proof_type: ProofType,
    pub accelerated: bool,
    pub duration_ms: u64,
}

/// One proof-generation request's lifecycle.
///
/// Fields are only reachable through accessors; the transition methods are the
/// sole mutators and keep `result` and `error` mutually exclusive.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    id: JobId,
    proof_type: ProofType,
    portfolio_id: Option<u64>,
    status: JobStatus,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    result: Option<ProofResult>,
    error: Option<String>,
    duration_ms: Option<u64>,
}

impl JobRecord {
    pub fn new(id: JobId, proof_type: ProofType, portfolio_id: Option<u64>) -> Self {
        Self {
            id,
            proof_type,
            portfolio_id,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result: None,
            error: None,
            duration_ms: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn proof_type(&self) -> ProofType {
        self.proof_type
    }

    pub fn portfolio_id(&self) -> Option<u64> {
        self.portfolio_id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Set when the job completed.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at.filter(|_| self.status == JobStatus::Completed)
    }

    /// Set when the job failed.
    pub fn failed_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at.filter(|_| self.status == JobStatus::Failed)
    }

    pub fn result(&self) -> Option<&ProofResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    /// pending -> generating
    pub fn start(&mut self) -> Result<()> {
        self.transition(JobStatus::Generating)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// generating -> completed
    pub fn complete(&mut self, result: ProofResult) -> Result<()> {
        self.transition(JobStatus::Completed)?;
        self.duration_ms = Some(result.duration_ms);
        self.result = Some(result);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// generating -> failed
    pub fn fail(&mut self, error: impl Into<String>, duration_ms: u64) -> Result<()> {
        self.transition(JobStatus::Failed)?;
        self.duration_ms = Some(duration_ms);
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, next: JobStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
