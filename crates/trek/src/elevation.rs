//! Elevation correction against a rate-limited external service.
//!
//! Coordinates are submitted in ordered batches. A pass spends requests from
//! a [`QuotaState`] daily budget, throttles between successful batches,
//! retries batches the service rate-limits, and reports an explicit
//! unavailable result instead of partial data on any failure.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use thiserror::Error;

use crate::quota::QuotaState;

/// Wait applied after a rate-limited response without a `Retry-After` header.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("response carried {got} elevations for {sent} coordinates")]
    MissingValues { sent: usize, got: usize },
}

/// One round-trip to the elevation correction service.
#[async_trait]
pub trait CorrectionService {
    /// Returns one corrected elevation per coordinate, in input order.
    async fn correct(&self, coords: &[(f64, f64)]) -> Result<Vec<f64>, ServiceError>;
}

/// Response from the points endpoint.
#[derive(Debug, Deserialize)]
struct PointsResponse {
    results: Vec<PointResult>,
}

#[derive(Debug, Deserialize)]
struct PointResult {
    elevation: f64,
}

/// Client for a GPXZ-style elevation points endpoint.
pub struct GpxzClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GpxzClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: "https://api.gpxz.io/v1/elevation/points".to_string(),
            api_key: api_key.into(),
        }
    }

    /// Sets a custom service endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl CorrectionService for GpxzClient {
    async fn correct(&self, coords: &[(f64, f64)]) -> Result<Vec<f64>, ServiceError> {
        let latlons = coords
            .iter()
            .map(|(lat, lon)| format!("{lat},{lon}"))
            .collect::<Vec<_>>()
            .join("|");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .form(&[("latlons", latlons.as_str())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ServiceError::RateLimited {
                retry_after: retry_after(response.headers()),
            });
        }
        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status().as_u16()));
        }

        let parsed: PointsResponse = response.json().await?;
        if parsed.results.len() != coords.len() {
            return Err(ServiceError::MissingValues {
                sent: coords.len(),
                got: parsed.results.len(),
            });
        }

        Ok(parsed.results.into_iter().map(|r| r.elevation).collect())
    }
}

/// Parses a `Retry-After` header given in whole seconds.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Outcome of one enhancement pass.
///
/// Never carries partial data: any abort discards everything accumulated so
/// far, and the caller falls back to raw elevation for the whole track.
#[derive(Debug, Clone, PartialEq)]
pub enum EnhancementResult {
    /// One corrected elevation per input coordinate, order-preserving.
    Success(Vec<f64>),
    /// Correction unavailable for this pass.
    Unavailable(UnavailableReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// The daily request budget ran out before the pass completed.
    DailyLimitReached,
    /// The service failed in a non-retryable way.
    ServiceError,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::DailyLimitReached => write!(f, "daily request limit reached"),
            UnavailableReason::ServiceError => write!(f, "service error"),
        }
    }
}

/// Runs batched elevation correction through a [`CorrectionService`].
pub struct ElevationEnhancer<S> {
    service: S,
}

impl<S: CorrectionService> ElevationEnhancer<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Corrects elevations for `coords`, spending requests from `quota`.
    ///
    /// Chunks are submitted strictly in order. A rate-limited chunk is
    /// retried until it succeeds or the daily budget runs out; the budget
    /// check is re-evaluated before every attempt, including retries.
    pub async fn enhance(
        &self,
        coords: &[(f64, f64)],
        quota: &mut QuotaState,
        batch_size: usize,
    ) -> EnhancementResult {
        let mut elevations = Vec::with_capacity(coords.len());

        for chunk in partition(coords, batch_size) {
            loop {
                if quota.is_exhausted() {
                    tracing::warn!(
                        requests_today = quota.requests_today(),
                        "daily request limit reached"
                    );
                    return EnhancementResult::Unavailable(UnavailableReason::DailyLimitReached);
                }
                quota.record_request();

                match self.service.correct(chunk).await {
                    Ok(corrected) => {
                        // A mismatched batch would desync every later point.
                        if corrected.len() != chunk.len() {
                            tracing::warn!(
                                sent = chunk.len(),
                                got = corrected.len(),
                                "correction service returned a mismatched batch"
                            );
                            return EnhancementResult::Unavailable(UnavailableReason::ServiceError);
                        }
                        elevations.extend(corrected);
                        tracing::debug!(points = chunk.len(), "chunk corrected");
                        tokio::time::sleep(quota.throttle_interval()).await;
                        break;
                    }
                    Err(ServiceError::RateLimited { retry_after }) => {
                        let wait = retry_after.unwrap_or(DEFAULT_RETRY_AFTER);
                        tracing::debug!(wait_s = wait.as_secs_f64(), "rate limited, retrying chunk");
                        tokio::time::sleep(wait).await;
                    }
                    Err(e) => {
                        tracing::warn!("elevation correction failed: {e}");
                        return EnhancementResult::Unavailable(UnavailableReason::ServiceError);
                    }
                }
            }
        }

        EnhancementResult::Success(elevations)
    }
}

/// Splits `coords` into `len / batch_size + 1` contiguous chunks of
/// near-equal size: the first `len % n_chunks` chunks carry one extra
/// element. Chunks are therefore usually smaller than `batch_size`, and may
/// even be empty when the chunk count exceeds the coordinate count.
fn partition(coords: &[(f64, f64)], batch_size: usize) -> Vec<&[(f64, f64)]> {
    assert!(batch_size >= 1, "batch_size must be at least 1");

    let n_chunks = coords.len() / batch_size + 1;
    let base = coords.len() / n_chunks;
    let extra = coords.len() % n_chunks;

    let mut chunks = Vec::with_capacity(n_chunks);
    let mut start = 0;
    for i in 0..n_chunks {
        let len = if i < extra { base + 1 } else { base };
        chunks.push(&coords[start..start + len]);
        start += len;
    }
    chunks
}
