use crate::backend::{BackendInfo, ProvingBackend};
use crate::config::ServiceConfig;
use crate::state::JobRegistry;
use std::sync::Arc;

/// Shared handles for the orchestrator and its job workers.
///
/// Built once at startup; clones share the same registry and backend.
#[derive(Clone)]
pub struct ProofJobsContext {
    /// Service configuration
    config: Arc<ServiceConfig>,
    /// Registry of every job submitted during this process lifetime
    registry: Arc<JobRegistry>,
    /// The proving backend all jobs delegate to
    backend: Arc<dyn ProvingBackend>,
}

impl ProofJobsContext {
    /// Create a new context with an empty registry
    pub fn new(config: ServiceConfig, backend: Arc<dyn ProvingBackend>) -> Self {
        Self::with_registry(config, backend, Arc::new(JobRegistry::new()))
    }

    /// Create a context around an existing registry
    pub fn with_registry(
        config: ServiceConfig,
        backend: Arc<dyn ProvingBackend>,
        registry: Arc<JobRegistry>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            backend,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn backend(&self) -> &Arc<dyn ProvingBackend> {
        &self.backend
    }

    pub fn backend_info(&self) -> BackendInfo {
        self.backend.info()
    }

    /// Whether proofs produced through this context are hardware accelerated.
    pub fn acceleration_enabled(&self) -> bool {
        self.backend.info().acceleration_enabled
    }
}

impl std::fmt::Debug for ProofJobsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofJobsContext")
            .field("config", &self.config)
            .field("backend", &self.backend.info().name)
            .finish_non_exhaustive()
    }
}
