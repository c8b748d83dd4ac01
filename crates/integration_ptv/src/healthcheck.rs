//! Health check service (`/v2/healthcheck`)

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use tracing::{debug, instrument};
use url::form_urlencoded;

use crate::client::ClientCore;
use crate::error::PtvError;
use crate::models::HealthStatus;
use crate::transport::ApiResponse;

const HEALTHCHECK_PATH: &str = "/v2/healthcheck";

/// Timestamp format expected by the API (ISO-8601 with numeric offset)
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Health check capability
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Query the service status, stamped with the current UTC time
    async fn get(&self) -> Result<ApiResponse<HealthStatus>, PtvError>;
}

/// Health check service backed by the PTV client
#[derive(Debug, Clone)]
pub struct HealthCheckService {
    core: Arc<ClientCore>,
}

impl HealthCheckService {
    pub(crate) const fn new(core: Arc<ClientCore>) -> Self {
        Self { core }
    }

    #[cfg(test)]
    pub(crate) const fn core(&self) -> &Arc<ClientCore> {
        &self.core
    }

    /// Query the service status with an explicit request timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response does not decode.
    #[instrument(skip(self))]
    pub async fn get_at(
        &self,
        timestamp: DateTime<Utc>,
    ) -> Result<ApiResponse<HealthStatus>, PtvError> {
        let path = healthcheck_path(timestamp);
        let response = self.core.get_json::<HealthStatus>(&path).await?;
        debug!(status = %response.meta.status, healthy = response.data.all_ok(), "Health check completed");
        Ok(response)
    }
}

#[async_trait]
impl HealthCheck for HealthCheckService {
    async fn get(&self) -> Result<ApiResponse<HealthStatus>, PtvError> {
        self.get_at(Utc::now()).await
    }
}

/// Relative path of a health check stamped with `timestamp`
fn healthcheck_path(timestamp: DateTime<Utc>) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("timestamp", &timestamp.format(TIMESTAMP_FORMAT).to_string())
        .finish();
    format!("{HEALTHCHECK_PATH}?{query}")
}
