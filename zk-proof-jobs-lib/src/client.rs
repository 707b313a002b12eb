//! HTTP client for the proof job service.
//!
//! Mirrors the server's operations one to one and adds [`ProofJobsClient::wait_for_proof`],
//! the submit-then-poll loop most callers want.

use crate::error::{Error, Result};
use crate::protocol::{
    ErrorResponse, GenerateRequest, GenerateResponse, HealthResponse, StatsResponse,
    StatusResponse, VerifyRequest, VerifyResponse,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_POLLS: usize = 30;

#[derive(Debug, Clone)]
pub struct ProofJobsClient {
    http: Client,
    base_url: Url,
}

impl ProofJobsClient {
    /// `base_url` is the service root, e.g. `http://localhost:8000`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let response = self
            .http
            .post(self.endpoint("api/zk/generate")?)
            .json(request)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn status(&self, job_id: &str) -> Result<StatusResponse> {
        let mut url = self.endpoint("api/zk/status/")?;
        url.path_segments_mut()
            .map_err(|_| Error::ConfigError(format!("base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .push(job_id);
        let response = self.http.get(url).send().await?;
        Self::decode(response).await
    }

    pub async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse> {
        let response = self
            .http
            .post(self.endpoint("api/zk/verify")?)
            .json(request)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        let response = self.http.get(self.endpoint("api/zk/stats")?).send().await?;
        Self::decode(response).await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self.http.get(self.endpoint("health")?).send().await?;
        Self::decode(response).await
    }

    /// Polls `job_id` every `interval` until it is terminal.
    ///
    /// Returns the terminal status (completed or failed alike) or `Timeout`
    /// after `max_polls` non-terminal reads.
    pub async fn wait_for_proof(
        &self,
        job_id: &str,
        interval: Duration,
        max_polls: usize,
    ) -> Result<StatusResponse> {
        for attempt in 1..=max_polls {
            let status = self.status(job_id).await?;
            debug!(%job_id, attempt, status = %status.status, "Polled proof job");
            if status.is_terminal() {
                return Ok(status);
            }
            tokio::time::sleep(interval).await;
        }
        Err(Error::Timeout(format!(
            "job {} not finished after {} polls",
            job_id, max_polls
        )))
    }

    /// Submits a request and waits for its terminal status.
    pub async fn generate_and_wait(
        &self,
        request: &GenerateRequest,
        interval: Duration,
        max_polls: usize,
    ) -> Result<StatusResponse> {
        let accepted = self.generate(request).await?;
        self.wait_for_proof(&accepted.job_id, interval, max_polls)
            .await
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        Err(Error::ApiError {
            status: status.as_u16(),
            message,
        })
    }
}
