use crate::error::{Error, Result};
use crate::types::{JobId, JobRecord, JobStatus, ProofType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// In-memory registry of proof jobs, keyed by job id.
///
/// The registry is the only shared mutable state in the service. Records are
/// stored behind `Arc` and replaced wholesale on every update, so a reader
/// holding a copy never observes a half-written record. Records are never
/// removed; they live as long as the process.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Arc<JobRecord>>>,
}

/// Per-status job counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub generating: usize,
    pub completed: usize,
    pub failed: usize,
}

impl StatusCounts {
    fn record(&mut self, status: JobStatus) {
        self.total += 1;
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Generating => self.generating += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
        }
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new pending record.
    ///
    /// Fails with `DuplicateId` if `id` is already registered; the existing
    /// record is left untouched.
    pub fn create(
        &self,
        id: &str,
        proof_type: ProofType,
        portfolio_id: Option<u64>,
    ) -> Result<JobRecord> {
        let mut jobs = self.jobs.write()?;
        if jobs.contains_key(id) {
            return Err(Error::DuplicateId(id.to_string()));
        }
        let record = JobRecord::new(id.to_string(), proof_type, portfolio_id);
        jobs.insert(id.to_string(), Arc::new(record.clone()));
        debug!(job_id = %id, %proof_type, "Registered pending job");
        Ok(record)
    }

    /// Returns a copy of the record for `id`.
    pub fn get(&self, id: &str) -> Result<JobRecord> {
        let jobs = self.jobs.read()?;
        jobs.get(id)
            .map(|record| record.as_ref().clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Applies `mutator` to a private copy of the record and swaps it in if
    /// the mutator succeeds. On error the stored record is unchanged.
    pub fn update<F>(&self, id: &str, mutator: F) -> Result<JobRecord>
    where
        F: FnOnce(&mut JobRecord) -> Result<()>,
    {
        let mut jobs = self.jobs.write()?;
        let slot = jobs
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let mut next = slot.as_ref().clone();
        mutator(&mut next)?;
        *slot = Arc::new(next.clone());
        debug!(job_id = %id, status = %next.status(), "Updated job");
        Ok(next)
    }

    /// Point-in-time view of every record. Only the `Arc`s are cloned under
    /// the lock; later updates swap in new records and leave these intact.
    pub fn snapshot(&self) -> Result<Vec<Arc<JobRecord>>> {
        Ok(self.jobs.read()?.values().cloned().collect())
    }

    /// Counts records by status over one snapshot, O(number of jobs).
    pub fn counts(&self) -> Result<StatusCounts> {
        let mut counts = StatusCounts::default();
        for record in self.snapshot()? {
            counts.record(record.status());
        }
        Ok(counts)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.jobs.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BackendProof, ProofResult, new_job_id};
    use std::thread;

    #[test]
    fn create_then_get_is_pending() {
        let registry = JobRegistry::new();
        let id = new_job_id();
        registry.create(&id, ProofType::Risk, Some(3)).unwrap();

        let record = registry.get(&id).unwrap();
        assert_eq!(record.id(), id);
        assert_eq!(record.status(), JobStatus::Pending);
        assert_eq!(record.portfolio_id(), Some(3));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let registry = JobRegistry::new();
        registry.create("job-1", ProofType::Risk, None).unwrap();
        registry.update("job-1", JobRecord::start).unwrap();

        let err = registry.create("job-1", ProofType::Settlement, None).unwrap_err();
        assert!(matches!(err, Error::DuplicateId(id) if id == "job-1"));
        // Stored record survives.
        let record = registry.get("job-1").unwrap();
        assert_eq!(record.proof_type(), ProofType::Risk);
        assert_eq!(record.status(), JobStatus::Generating);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let registry = JobRegistry::new();
        assert!(matches!(registry.get("nope"), Err(Error::NotFound(_))));
        assert!(matches!(
            registry.update("nope", JobRecord::start),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn failed_mutation_leaves_record_untouched() {
        let registry = JobRegistry::new();
        registry.create("job", ProofType::Rebalance, None).unwrap();
        let before = registry.get("job").unwrap();

        let err = registry
            .update("job", |record| record.fail("too early", 1))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(registry.get("job").unwrap(), before);
    }

    #[test]
    fn counts_cover_every_record_once() {
        let registry = JobRegistry::new();
        for i in 0..6 {
            registry.create(&format!("job-{i}"), ProofType::Risk, None).unwrap();
        }
        for i in 0..4 {
            registry.update(&format!("job-{i}"), JobRecord::start).unwrap();
        }
        registry
            .update("job-0", |r| {
                r.complete(ProofResult {
                    proof: BackendProof::default(),
                    proof_type: ProofType::Risk,
                    accelerated: false,
                    duration_ms: 1,
                })
            })
            .unwrap();
        registry.update("job-1", |r| r.fail("boom", 1)).unwrap();

        let counts = registry.counts().unwrap();
        assert_eq!(
            counts,
            StatusCounts {
                total: 6,
                pending: 2,
                generating: 2,
                completed: 1,
                failed: 1,
            }
        );
        assert_eq!(registry.snapshot().unwrap().len(), 6);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_updates() {
        let registry = JobRegistry::new();
        registry.create("job", ProofType::Settlement, None).unwrap();
        let snapshot = registry.snapshot().unwrap();

        registry.update("job", JobRecord::start).unwrap();
        registry.create("late", ProofType::Risk, None).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].status(), JobStatus::Pending);
        assert_eq!(registry.counts().unwrap().generating, 1);
        assert_eq!(registry.counts().unwrap().total, 2);
    }

    #[test]
    fn concurrent_creates_are_all_visible() {
        let registry = Arc::new(JobRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    (0..50)
                        .map(|_| {
                            let id = new_job_id();
                            registry.create(&id, ProofType::Settlement, None).unwrap();
                            id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(registry.len().unwrap(), ids.len());
        for id in &ids {
            assert_eq!(registry.get(id).unwrap().id(), id);
        }
    }
}
