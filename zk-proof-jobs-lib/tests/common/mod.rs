#![allow(dead_code)]

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use zk_proof_jobs_lib::{
    BackendInfo, BackendProof, BackendResult, HashCommitmentBackend, JobOrchestrator,
    ProvingBackend, ServiceConfig, Statement, WitnessPayload,
};

pub const POLL: Duration = Duration::from_millis(10);
pub const MAX_POLLS: usize = 1_000;

pub fn orchestrator_with(backend: Arc<dyn ProvingBackend>) -> JobOrchestrator {
    JobOrchestrator::with_backend(ServiceConfig::default(), backend)
}

pub fn hash_orchestrator() -> JobOrchestrator {
    orchestrator_with(Arc::new(HashCommitmentBackend::default()))
}

/// Backend that always errors.
pub struct FailingBackend;

impl ProvingBackend for FailingBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: "failing".to_string(),
            available: false,
            acceleration_enabled: false,
            details: serde_json::json!({}),
        }
    }

    fn generate_proof(&self, _: &Statement, _: &WitnessPayload) -> BackendResult<BackendProof> {
        Err("prover offline".into())
    }

    fn verify_proof(&self, _: &BackendProof, _: &[i64]) -> BackendResult<bool> {
        Err("verifier offline".into())
    }
}

/// Delegates to the hash backend once the gate is opened.
#[derive(Default)]
pub struct GatedBackend {
    inner: HashCommitmentBackend,
    open: Mutex<bool>,
    opened: Condvar,
}

impl GatedBackend {
    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }
}

impl ProvingBackend for GatedBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: "gated".to_string(),
            ..self.inner.info()
        }
    }

    fn generate_proof(&self, statement: &Statement, witness: &WitnessPayload) -> BackendResult<BackendProof> {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
        drop(open);
        self.inner.generate_proof(statement, witness)
    }

    fn verify_proof(&self, proof: &BackendProof, public_inputs: &[i64]) -> BackendResult<bool> {
        self.inner.verify_proof(proof, public_inputs)
    }
}

/// Records every generate call before delegating to the hash backend.
#[derive(Default)]
pub struct RecordingBackend {
    inner: HashCommitmentBackend,
    pub calls: Mutex<Vec<(Statement, WitnessPayload)>>,
}

impl ProvingBackend for RecordingBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            acceleration_enabled: true,
            ..self.inner.info()
        }
    }

    fn generate_proof(&self, statement: &Statement, witness: &WitnessPayload) -> BackendResult<BackendProof> {
        self.calls
            .lock()
            .unwrap()
            .push((statement.clone(), witness.clone()));
        self.inner.generate_proof(statement, witness)
    }

    fn verify_proof(&self, proof: &BackendProof, public_inputs: &[i64]) -> BackendResult<bool> {
        self.inner.verify_proof(proof, public_inputs)
    }
}
