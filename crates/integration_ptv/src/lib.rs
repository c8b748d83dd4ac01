//! PTV timetable API client
//!
//! Client for the Public Transport Victoria timetable API
//! (<http://timetableapi.ptv.vic.gov.au>). Every request carries the developer
//! id (`devid`) and an HMAC-SHA1 `signature` over its path and query, computed
//! with the developer's security key.
//!
//! # Architecture
//!
//! [`PtvClient`] owns the configuration and HTTP transport and exposes one
//! resource service per endpoint. Each service implements a small capability
//! trait ([`HealthCheck`], [`StopsNearMe`]) on top of the shared pipeline:
//! [`RequestBuilder`] signs the request, [`HttpExecutor`] sends it and decodes
//! the body into the caller's chosen destination.
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_ptv::{HealthCheck, PtvClient, PtvConfig, StopsNearMe};
//!
//! let client = PtvClient::new(PtvConfig::from_env()?)?;
//!
//! let health = client.health_check().get().await?;
//! assert!(health.data.security_token_ok);
//!
//! let stops = client.stops_near_me().get(-37.8572239, 144.9995594).await?;
//! for entry in stops.data {
//!     println!("{}", entry.result);
//! }
//! ```

mod client;
mod config;
mod error;
mod healthcheck;
mod models;
mod request;
mod signature;
mod stops;
mod transport;

pub use client::{PtvClient, PtvClientBuilder};
pub use config::{ENV_BASE_URL, ENV_DEVELOPER_ID, ENV_SECURITY_KEY, PtvConfig};
pub use error::PtvError;
pub use healthcheck::{HealthCheck, HealthCheckService};
pub use models::{HealthStatus, NearMeResponse, NearMeResult, RouteType, Stop};
pub use request::{DEVID_PARAM, RequestBuilder, SIGNATURE_PARAM, SignedRequest};
pub use signature::sign;
pub use stops::{StopsNearMe, StopsNearMeService};
pub use transport::{ApiResponse, HttpExecutor, RequestObserver, ResponseMeta};

pub use reqwest::Method;
