//! REST job catalog client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use cronfleet_protocols::{
    CatalogError, CatalogSession, Job, JobCatalog, OwnedJobIndex, PartitionDescriptor,
};

use crate::endpoint::Endpoint;

fn request_error(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() || e.is_connect() {
        CatalogError::Unavailable(e.to_string())
    } else {
        CatalogError::Query(e.to_string())
    }
}

/// Job catalog reached over HTTP.
///
/// Endpoints:
/// - `GET {base}/jobs/{code}`: one job, `404` when absent.
/// - `GET {base}/jobs`: every job, used when no backing store is
///   configured for bootstrap.
pub struct RestJobCatalog {
    endpoint: Endpoint,
}

impl RestJobCatalog {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let endpoint = Endpoint::new(base_url, timeout).map_err(CatalogError::Unavailable)?;
        Ok(Self { endpoint })
    }

    pub fn base_url(&self) -> &str {
        self.endpoint.base().as_str()
    }

    /// Fetch a single job. `Ok(None)` on 404.
    pub async fn fetch_job(&self, code: &str) -> Result<Option<Job>, CatalogError> {
        let url = self.endpoint.url(&["jobs", code]);
        debug!("GET {}", url);

        let response = self
            .endpoint
            .client()
            .get(url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Query(format!("HTTP {}: {}", status, body)));
        }

        let job = response
            .json::<Job>()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))?;
        Ok(Some(job))
    }

    /// Fetch every job in the catalog.
    pub async fn list_jobs(&self) -> Result<Vec<Job>, CatalogError> {
        let url = self.endpoint.url(&["jobs"]);
        debug!("GET {}", url);

        let response = self
            .endpoint
            .client()
            .get(url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Query(format!("HTTP {}: {}", status, body)));
        }

        response
            .json::<Vec<Job>>()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))
    }
}

#[async_trait]
impl JobCatalog for RestJobCatalog {
    async fn begin_read(&self) -> Result<Box<dyn CatalogSession>, CatalogError> {
        Ok(Box::new(RestSession {
            catalog: RestJobCatalog {
                endpoint: self.endpoint.clone(),
            },
        }))
    }
}

/// Enumerates the whole catalog and filters client-side.
#[async_trait]
impl OwnedJobIndex for RestJobCatalog {
    async fn owned_job_codes(
        &self,
        partition: PartitionDescriptor,
    ) -> Result<Vec<String>, CatalogError> {
        let jobs = self.list_jobs().await?;
        let total = jobs.len();

        let mut owned: Vec<Job> = jobs.into_iter().filter(|job| partition.owns(job.id)).collect();
        owned.sort_by_key(|job| job.id);

        if owned.is_empty() && total > 0 {
            warn!(
                "None of {} catalog jobs belongs to instance {}",
                total, partition
            );
        }
        Ok(owned.into_iter().map(|job| job.code).collect())
    }
}

/// HTTP is stateless, so a session only scopes lookups.
struct RestSession {
    catalog: RestJobCatalog,
}

#[async_trait]
impl CatalogSession for RestSession {
    async fn find_by_code(&mut self, code: &str) -> Result<Option<Job>, CatalogError> {
        self.catalog.fetch_job(code).await
    }

    async fn rollback(self: Box<Self>) -> Result<(), CatalogError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
