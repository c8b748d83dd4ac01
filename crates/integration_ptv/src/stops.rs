//! Stops near me service (`/v2/nearme`)

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::{debug, instrument, warn};

use crate::client::ClientCore;
use crate::error::PtvError;
use crate::models::NearMeResponse;
use crate::transport::ApiResponse;

/// Nearby stops capability
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StopsNearMe: Send + Sync {
    /// Stops closest to the given coordinates, nearest first
    async fn get(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ApiResponse<NearMeResponse>, PtvError>;
}

/// Nearby stops service backed by the PTV client
#[derive(Debug, Clone)]
pub struct StopsNearMeService {
    core: Arc<ClientCore>,
}

impl StopsNearMeService {
    pub(crate) const fn new(core: Arc<ClientCore>) -> Self {
        Self { core }
    }

    #[cfg(test)]
    pub(crate) const fn core(&self) -> &Arc<ClientCore> {
        &self.core
    }
}

#[async_trait]
impl StopsNearMe for StopsNearMeService {
    #[instrument(skip(self))]
    async fn get(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ApiResponse<NearMeResponse>, PtvError> {
        let path = nearme_path(latitude, longitude);
        let response = self.core.get_json::<NearMeResponse>(&path).await?;

        if response.data.is_empty() {
            warn!("No stops found");
        }

        debug!(count = response.data.len(), "Nearby stops found");
        Ok(response)
    }
}

/// Relative path for the stops nearest to a coordinate pair
///
/// `f64`'s `Display` gives the shortest representation without an exponent.
fn nearme_path(latitude: f64, longitude: f64) -> String {
    format!("/v2/nearme/latitude/{latitude}/longitude/{longitude}")
}
