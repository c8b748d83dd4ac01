//! PTV API client
//!
//! [`PtvClient`] owns the credentials and the HTTP transport, and exposes one
//! resource service per endpoint. All services share the same core through an
//! `Arc`; cloning the client is cheap.

use std::io::Write;
use std::sync::Arc;

use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::PtvConfig;
use crate::error::PtvError;
use crate::healthcheck::HealthCheckService;
use crate::request::{RequestBuilder, SignedRequest};
use crate::stops::StopsNearMeService;
use crate::transport::{ApiResponse, HttpExecutor, RequestObserver, ResponseMeta};

/// State shared by the client and its resource services
#[derive(Debug)]
pub(crate) struct ClientCore {
    pub(crate) requests: RequestBuilder,
    pub(crate) executor: HttpExecutor,
}

impl ClientCore {
    /// Build a GET request for `path` and decode the JSON response
    pub(crate) async fn get_json<T>(&self, path: &str) -> Result<ApiResponse<T>, PtvError>
    where
        T: DeserializeOwned,
    {
        let request = self.requests.build::<()>(Method::GET, path, None)?;
        self.executor.execute_json(&request).await
    }
}

/// Client for the PTV timetable API
#[derive(Debug, Clone)]
pub struct PtvClient {
    core: Arc<ClientCore>,
    health_check: HealthCheckService,
    stops_near_me: StopsNearMeService,
}

impl PtvClient {
    /// Create a client with a default HTTP transport
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: PtvConfig) -> Result<Self, PtvError> {
        Self::builder(config).build()
    }

    /// Start building a client with a custom transport or observer
    #[must_use]
    pub fn builder(config: PtvConfig) -> PtvClientBuilder {
        PtvClientBuilder {
            config,
            http_client: None,
            observer: None,
        }
    }

    /// Health check service (`/v2/healthcheck`)
    #[must_use]
    pub const fn health_check(&self) -> &HealthCheckService {
        &self.health_check
    }

    /// Stops near me service (`/v2/nearme`)
    #[must_use]
    pub const fn stops_near_me(&self) -> &StopsNearMeService {
        &self.stops_near_me
    }

    /// Base URL relative paths are resolved against
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.core.requests.base_url()
    }

    /// Developer identifier sent with every request
    #[must_use]
    pub fn developer_id(&self) -> &str {
        self.core.requests.developer_id()
    }

    /// HMAC-SHA1 signature of a path-plus-query string under the security key
    #[must_use]
    pub fn generate_signature(&self, path_and_query: &str) -> String {
        self.core.requests.generate_signature(path_and_query)
    }

    /// Build a signed request for a path relative to the base URL
    ///
    /// # Errors
    ///
    /// Returns [`PtvError::MalformedPath`] or [`PtvError::BodyEncoding`].
    pub fn new_request<B>(
        &self,
        method: Method,
        relative_path: &str,
        body: Option<&B>,
    ) -> Result<SignedRequest, PtvError>
    where
        B: Serialize + ?Sized,
    {
        self.core.requests.build(method, relative_path, body)
    }

    /// Send a request and return only the response metadata
    ///
    /// # Errors
    ///
    /// Returns a transport error if the request could not be completed.
    pub async fn execute(&self, request: &SignedRequest) -> Result<ResponseMeta, PtvError> {
        self.core.executor.execute(request).await
    }

    /// Send a request and decode the JSON response into `T`
    ///
    /// # Errors
    ///
    /// Returns a transport error, or [`PtvError::Decode`] carrying the
    /// response metadata if the body does not decode.
    pub async fn execute_json<T>(&self, request: &SignedRequest) -> Result<ApiResponse<T>, PtvError>
    where
        T: DeserializeOwned,
    {
        self.core.executor.execute_json(request).await
    }

    /// Send a request and copy the raw response body into `sink`
    ///
    /// # Errors
    ///
    /// Returns a transport error if the body cannot be read or written.
    pub async fn execute_raw<W>(
        &self,
        request: &SignedRequest,
        sink: &mut W,
    ) -> Result<ResponseMeta, PtvError>
    where
        W: Write + Send + ?Sized,
    {
        self.core.executor.execute_raw(request, sink).await
    }
}

/// Builder for [`PtvClient`]
pub struct PtvClientBuilder {
    config: PtvConfig,
    http_client: Option<Client>,
    observer: Option<Arc<dyn RequestObserver>>,
}

impl std::fmt::Debug for PtvClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtvClientBuilder")
            .field("config", &self.config)
            .field("http_client", &self.http_client.is_some())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl PtvClientBuilder {
    /// Use an existing HTTP client instead of building one from the config
    ///
    /// The config's `user_agent` is not applied to it. `timeout_secs` still
    /// is, per request, and overrides any total timeout set on the client.
    #[must_use]
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Register a hook called after every completed request
    #[must_use]
    pub fn on_request_completed(mut self, observer: impl RequestObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn build(self) -> Result<PtvClient, PtvError> {
        self.config.validate()?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(self.config.user_agent.clone())
                .build()
                .map_err(|e| PtvError::ConfigurationError(format!("HTTP client: {e}")))?,
        };

        let core = Arc::new(ClientCore {
            requests: RequestBuilder::new(&self.config)?,
            executor: HttpExecutor::new(http_client, self.observer, self.config.timeout_secs),
        });

        debug!(
            base_url = %core.requests.base_url(),
            developer_id = core.requests.developer_id(),
            "PTV client created"
        );

        Ok(PtvClient {
            health_check: HealthCheckService::new(Arc::clone(&core)),
            stops_near_me: StopsNearMeService::new(Arc::clone(&core)),
            core,
        })
    }
}
