//! zk-proof-jobs-lib
//! Core library for the asynchronous proof job orchestrator: witness encoding,
//! the job registry, the orchestrator state machine and its HTTP surface.

// Modules
pub mod api;
pub mod backend;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod jobs;
pub mod protocol;
pub mod state;
pub mod types;
pub mod witness;

// Re-exports for convenience
pub use backend::{BackendInfo, BackendResult, HashCommitmentBackend, ProvingBackend};
pub use client::ProofJobsClient;
pub use config::ServiceConfig;
pub use context::ProofJobsContext;
pub use error::{Error, Result};
pub use jobs::JobOrchestrator;
pub use state::{JobRegistry, StatusCounts};
pub use types::{BackendProof, JobId, JobRecord, JobStatus, ProofResult, ProofType, Statement, WitnessPayload};
pub use witness::{ProofPayload, encode_witness};
