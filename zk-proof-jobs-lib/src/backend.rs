//! Proving backend contract.
//!
//! The backend turns a statement and witness into a proof and checks proofs
//! against public inputs. Its internals are opaque to the orchestrator; any
//! error it returns is translated into the crate's error taxonomy by the caller.

use crate::types::{BackendProof, Statement, WitnessPayload};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

pub type BackendResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Static description of a backend, reported by the health and stats endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackendInfo {
    pub name: String,
    pub available: bool,
    pub acceleration_enabled: bool,
    pub details: serde_json::Value,
}

/// External proving/verification collaborator.
///
/// Calls are blocking and may run for the full duration of the proof
/// computation; the orchestrator drives them from the blocking thread pool.
/// Implementations must be safe to call concurrently from several jobs.
pub trait ProvingBackend: Send + Sync {
    fn info(&self) -> BackendInfo;

    fn generate_proof(
        &self,
        statement: &Statement,
        witness: &WitnessPayload,
    ) -> BackendResult<BackendProof>;

    fn verify_proof(&self, proof: &BackendProof, public_inputs: &[i64]) -> BackendResult<bool>;
}

pub const DEFAULT_CHUNK_SIZE: usize = 4;

/// Reference backend binding the witness with SHA-256 commitments.
///
/// This is not a zero-knowledge proof system: the witness travels in the clear.
/// It exists so the service can run and be exercised without an external prover.
///
/// Layout of a proof:
/// - `commitments[i]`: hex SHA-256 over chunk `i` of the witness (little-endian i64s)
/// - `evaluations[i]`: saturating sum of chunk `i`
/// - `friProof`: `{ root, chunks, statementDigest }`, `root` hashing all commitments
#[derive(Debug, Clone)]
pub struct HashCommitmentBackend {
    chunk_size: usize,
}

impl Default for HashCommitmentBackend {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl HashCommitmentBackend {
    pub const NAME: &'static str = "hash-commitment";

    /// `chunk_size` of zero is treated as one.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn commit_chunk(chunk: &[i64]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"zk-proof-jobs/chunk");
        for value in chunk {
            hasher.update(value.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }

    fn root(commitments: &[String]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"zk-proof-jobs/root");
        for c in commitments {
            hasher.update(c.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    fn chunk_sum(chunk: &[i64]) -> i64 {
        chunk.iter().fold(0i64, |acc, v| acc.saturating_add(*v))
    }
}

impl ProvingBackend for HashCommitmentBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: Self::NAME.to_string(),
            available: true,
            acceleration_enabled: false,
            details: json!({
                "chunkSize": self.chunk_size,
                "hash": "sha256",
                "zeroKnowledge": false,
            }),
        }
    }

    fn generate_proof(
        &self,
        statement: &Statement,
        witness: &WitnessPayload,
    ) -> BackendResult<BackendProof> {
        if witness.witness.is_empty() {
            return Err("cannot commit to an empty witness".into());
        }

        let chunks: Vec<&[i64]> = witness.witness.chunks(self.chunk_size).collect();
        let commitments: Vec<String> = chunks.iter().map(|c| Self::commit_chunk(c)).collect();
        let evaluations = chunks.iter().map(|c| json!(Self::chunk_sum(c))).collect();
        let statement_digest = hex::encode(Sha256::digest(serde_json::to_vec(statement)?));

        Ok(BackendProof {
            witness: witness.witness.clone(),
            fri_proof: json!({
                "root": Self::root(&commitments),
                "chunks": commitments.len(),
                "statementDigest": statement_digest,
            }),
            commitments,
            evaluations,
        })
    }

    fn verify_proof(&self, proof: &BackendProof, public_inputs: &[i64]) -> BackendResult<bool> {
        if proof.witness.is_empty() || !proof.witness.starts_with(public_inputs) {
            return Ok(false);
        }
        let chunks: Vec<&[i64]> = proof.witness.chunks(self.chunk_size).collect();
        if chunks.len() != proof.commitments.len() || chunks.len() != proof.evaluations.len() {
            return Ok(false);
        }

        for ((chunk, commitment), evaluation) in chunks
            .iter()
            .zip(&proof.commitments)
            .zip(&proof.evaluations)
        {
            if Self::commit_chunk(chunk) != *commitment
                || evaluation.as_i64() != Some(Self::chunk_sum(chunk))
            {
                return Ok(false);
            }
        }

        let root = proof.fri_proof.get("root").and_then(|r| r.as_str());
        Ok(root == Some(Self::root(&proof.commitments).as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProofType;

    fn statement() -> Statement {
        Statement {
            proof_type: ProofType::Settlement,
            portfolio_id: Some(1),
        }
    }

    fn payload(witness: Vec<i64>) -> WitnessPayload {
        WitnessPayload {
            witness,
            data: json!({}),
        }
    }

    #[test]
    fn generated_proof_verifies_with_witness_prefix() {
        let backend = HashCommitmentBackend::new(2);
        let proof = backend
            .generate_proof(&statement(), &payload(vec![15, 2, 10, 5, 1]))
            .unwrap();
        assert_eq!(proof.commitments.len(), 3);
        assert_eq!(proof.evaluations, vec![json!(17), json!(15), json!(1)]);

        assert!(backend.verify_proof(&proof, &[15, 2]).unwrap());
        assert!(backend.verify_proof(&proof, &[]).unwrap());
        assert!(!backend.verify_proof(&proof, &[16, 2]).unwrap());
    }

    #[test]
    fn tampered_proofs_are_rejected() {
        let backend = HashCommitmentBackend::default();
        let proof = backend
            .generate_proof(&statement(), &payload(vec![1, 2, 3, 4, 5]))
            .unwrap();

        let mut tampered = proof.clone();
        tampered.witness[4] = 6;
        assert!(!backend.verify_proof(&tampered, &[1]).unwrap());

        let mut no_root = proof.clone();
        no_root.fri_proof = json!({});
        assert!(!backend.verify_proof(&no_root, &[1]).unwrap());

        assert!(!backend.verify_proof(&BackendProof::default(), &[]).unwrap());
    }

    #[test]
    fn empty_witness_is_a_backend_error() {
        let backend = HashCommitmentBackend::default();
        let err = backend
            .generate_proof(&statement(), &payload(Vec::new()))
            .unwrap_err();
        assert!(err.to_string().contains("empty witness"));
    }

    #[test]
    fn zero_chunk_size_is_clamped() {
        assert_eq!(HashCommitmentBackend::new(0).chunk_size(), 1);
    }
}
