use crate::backend::DEFAULT_CHUNK_SIZE;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "ZK_JOBS_CONFIG";
pub const BIND_ADDR_ENV: &str = "ZK_JOBS_BIND_ADDR";
pub const TIMEOUT_SECS_ENV: &str = "ZK_JOBS_TIMEOUT_SECS";
pub const CHUNK_SIZE_ENV: &str = "ZK_JOBS_CHUNK_SIZE";

const DEFAULT_PORT: u16 = 8000;

/// Service configuration, read from TOML and overridden by environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub jobs: JobsConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct JobsConfig {
    /// Upper bound on a single proof generation. `None` lets jobs run unbounded.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Witness elements per commitment for the hash-commitment backend.
    pub chunk_size: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ServiceConfig {
    /// Parses a TOML document. Missing sections and fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: ServiceConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Builds the effective configuration: defaults, then the optional file,
    /// then process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `ZK_JOBS_*` overrides from `lookup`. An empty timeout value
    /// clears the timeout.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(BIND_ADDR_ENV) {
            self.server.bind_addr = addr.trim().parse().map_err(|e| {
                Error::ConfigError(format!("Invalid {}={:?}: {}", BIND_ADDR_ENV, addr, e))
            })?;
        }
        if let Some(secs) = lookup(TIMEOUT_SECS_ENV) {
            let secs = secs.trim();
            self.jobs.timeout_secs = if secs.is_empty() {
                None
            } else {
                Some(secs.parse().map_err(|e| {
                    Error::ConfigError(format!("Invalid {}={:?}: {}", TIMEOUT_SECS_ENV, secs, e))
                })?)
            };
        }
        if let Some(size) = lookup(CHUNK_SIZE_ENV) {
            self.backend.chunk_size = size.trim().parse().map_err(|e| {
                Error::ConfigError(format!("Invalid {}={:?}: {}", CHUNK_SIZE_ENV, size, e))
            })?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend.chunk_size == 0 {
            return Err(Error::ConfigError(
                "backend.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.jobs.timeout_secs == Some(0) {
            return Err(Error::ConfigError(
                "jobs.timeout_secs must be positive; omit it to disable the timeout".to_string(),
            ));
        }
        Ok(())
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        self.jobs.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = ServiceConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.server.bind_addr.port(), 8000);
        assert_eq!(config.job_timeout(), None);
        assert_eq!(config.backend.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn parses_all_sections() {
        let config = ServiceConfig::from_toml_str(
            r#"
            [server]
            bind_addr = "127.0.0.1:9100"

            [jobs]
            timeout_secs = 30

            [backend]
            chunk_size = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(config.job_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.backend.chunk_size, 8);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(matches!(
            ServiceConfig::from_toml_str("[server]\nport = 1\n"),
            Err(Error::TomlError(_))
        ));
        assert!(matches!(
            ServiceConfig::from_toml_str("[backend]\nchunk_size = 0\n"),
            Err(Error::ConfigError(_))
        ));
        assert!(matches!(
            ServiceConfig::from_toml_str("[jobs]\ntimeout_secs = 0\n"),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = ServiceConfig::from_toml_str("[jobs]\ntimeout_secs = 30\n").unwrap();
        config
            .apply_overrides(env(&[
                (BIND_ADDR_ENV, "127.0.0.1:7000"),
                (TIMEOUT_SECS_ENV, ""),
                (CHUNK_SIZE_ENV, "2"),
            ]))
            .unwrap();
        assert_eq!(config.server.bind_addr.port(), 7000);
        assert_eq!(config.job_timeout(), None);
        assert_eq!(config.backend.chunk_size, 2);

        let err = config
            .apply_overrides(env(&[(TIMEOUT_SECS_ENV, "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind_addr = \"127.0.0.1:8123\"").unwrap();

        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.bind_addr.port(), 8123);
        assert!(matches!(
            ServiceConfig::from_file(file.path().with_extension("missing")),
            Err(Error::IoError(_))
        ));
    }
}
