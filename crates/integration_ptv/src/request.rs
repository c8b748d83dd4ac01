//! Signed request construction
//!
//! Turns a relative resource path into an absolute URL carrying the `devid`
//! and `signature` query parameters, plus an optional JSON body. Nothing in
//! here touches the network.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;
use url::{Position, Url, form_urlencoded};

use crate::config::PtvConfig;
use crate::error::PtvError;
use crate::signature;

/// Query parameter carrying the developer identifier
pub const DEVID_PARAM: &str = "devid";
/// Query parameter carrying the request signature
pub const SIGNATURE_PARAM: &str = "signature";

/// Placeholder origin used to parse relative references
const RELATIVE_ROOT: &str = "http://relative.invalid";
const RELATIVE_HOST: &str = "relative.invalid";

/// An outbound request, ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL including `devid` and `signature`
    pub url: Url,
    /// JSON-encoded request body
    pub body: Option<Vec<u8>>,
}

impl SignedRequest {
    /// Path and query of the request URL
    #[must_use]
    pub fn path_and_query(&self) -> &str {
        &self.url[Position::BeforePath..Position::AfterQuery]
    }

    /// Value of the `signature` query parameter
    #[must_use]
    pub fn signature(&self) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == SIGNATURE_PARAM)
            .map(|(_, value)| value.into_owned())
    }
}

/// Builds signed requests from the client credentials
#[derive(Clone)]
pub struct RequestBuilder {
    base_url: Url,
    developer_id: String,
    security_key: SecretString,
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("base_url", &self.base_url.as_str())
            .field("developer_id", &self.developer_id)
            .field("security_key", &"[REDACTED]")
            .finish()
    }
}

impl RequestBuilder {
    /// Create a request builder from a client configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL is invalid.
    pub fn new(config: &PtvConfig) -> Result<Self, PtvError> {
        Ok(Self {
            base_url: config.parsed_base_url()?,
            developer_id: config.developer_id.clone(),
            security_key: config.security_key.clone(),
        })
    }

    /// Base URL relative paths are resolved against
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Developer identifier sent as `devid`
    #[must_use]
    pub fn developer_id(&self) -> &str {
        &self.developer_id
    }

    /// Sign a path-plus-query string with the security key
    #[must_use]
    pub fn generate_signature(&self, path_and_query: &str) -> String {
        signature::sign(path_and_query, self.security_key.expose_secret().as_bytes())
    }

    /// Build a signed request for a path relative to the base URL
    ///
    /// A missing leading slash is added and a trailing slash removed. Any
    /// `devid` or `signature` already present in the query is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`PtvError::MalformedPath`] if the path cannot be parsed as a
    /// relative reference, or [`PtvError::BodyEncoding`] if the body cannot be
    /// serialized to JSON.
    pub fn build<B>(
        &self,
        method: Method,
        relative_path: &str,
        body: Option<&B>,
    ) -> Result<SignedRequest, PtvError>
    where
        B: Serialize + ?Sized,
    {
        let unsigned = self.unsigned_path_and_query(relative_path)?;
        let signature = self.generate_signature(&unsigned);
        let signed = format!("{unsigned}&{SIGNATURE_PARAM}={signature}");

        let url = self
            .base_url
            .join(&signed)
            .map_err(|e| PtvError::MalformedPath(format!("{relative_path}: {e}")))?;

        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| PtvError::BodyEncoding(e.to_string()))?;

        debug!(%method, path = url.path(), has_body = body.is_some(), "Built signed request");

        Ok(SignedRequest { method, url, body })
    }

    /// Normalize the path and inject `devid`, returning the string to sign
    fn unsigned_path_and_query(&self, relative_path: &str) -> Result<String, PtvError> {
        let normalized = if relative_path.starts_with('/') {
            relative_path.to_string()
        } else {
            format!("/{relative_path}")
        };

        let mut rel = Url::parse(RELATIVE_ROOT)
            .and_then(|root| root.join(&normalized))
            .map_err(|e| PtvError::MalformedPath(format!("{relative_path}: {e}")))?;

        if rel.host_str() != Some(RELATIVE_HOST) || rel.port().is_some() {
            return Err(PtvError::MalformedPath(format!(
                "{relative_path}: not a path relative to the base URL"
            )));
        }

        if let Some(trimmed) = rel
            .path()
            .strip_suffix('/')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
        {
            rel.set_path(&trimmed);
        }
        rel.set_fragment(None);

        let mut params: Vec<(String, String)> = rel
            .query_pairs()
            .filter(|(key, _)| key != DEVID_PARAM && key != SIGNATURE_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        params.push((DEVID_PARAM.to_string(), self.developer_id.clone()));
        // Stable sort keeps the caller's order among repeated keys
        params.sort_by(|a, b| a.0.cmp(&b.0));

        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&params)
            .finish();
        rel.set_query(Some(&query));

        Ok(rel[Position::BeforePath..Position::AfterQuery].to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    const KEY: &str = "7car2d2b-7527-14e1-8975-06cf1059afe0";
    const SIG: &str = "7a98b58785754b6af5fa51899666e767085b8ef4";

    fn builder() -> RequestBuilder {
        RequestBuilder::new(&PtvConfig::new("2", KEY)).unwrap()
    }

    fn get(path: &str) -> SignedRequest {
        builder().build::<()>(Method::GET, path, None).unwrap()
    }

    #[test]
    fn test_query_ordering() {
        let req = get("/v2/healthcheck");
        assert_eq!(req.url.query(), Some(format!("devid=2&signature={SIG}").as_str()));
        assert_eq!(
            req.url.as_str(),
            format!("http://timetableapi.ptv.vic.gov.au/v2/healthcheck?devid=2&signature={SIG}")
        );
        assert_eq!(req.signature().as_deref(), Some(SIG));
        assert!(req.body.is_none());
    }

    #[test]
    fn test_leading_slash_is_added() {
        assert_eq!(get("v2/healthcheck").url, get("/v2/healthcheck").url);
    }

    #[test]
    fn test_trailing_slash_is_stripped() {
        let req = get("/v2/healthcheck/");
        assert_eq!(req.url.path(), "/v2/healthcheck");
        assert_eq!(req.signature().as_deref(), Some(SIG));
    }

    #[test]
    fn test_build_is_idempotent() {
        let body = json!({ "stop": 1071 });
        let first = builder()
            .build(Method::POST, "/v2/search/x", Some(&body))
            .unwrap();
        let second = builder()
            .build(Method::POST, "/v2/search/x", Some(&body))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.url.as_str(), second.url.as_str());
    }

    #[test]
    fn test_signature_covers_devid_and_existing_params() {
        let b = builder();
        let req = b
            .build::<()>(Method::GET, "/v2/healthcheck?timestamp=2026-10-19T01:02:03%2B0000", None)
            .unwrap();
        let unsigned = "/v2/healthcheck?devid=2&timestamp=2026-10-19T01%3A02%3A03%2B0000";
        assert_eq!(
            req.path_and_query(),
            format!("{unsigned}&signature={}", b.generate_signature(unsigned))
        );
    }

    #[test]
    fn test_params_sorted_and_signature_last() {
        let req = get("/v2/x?zeta=1&alpha=2&alpha=1");
        let keys: Vec<String> = req.url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(keys, ["alpha", "alpha", "devid", "zeta", "signature"]);
        let alpha: Vec<String> = req
            .url
            .query_pairs()
            .filter(|(k, _)| k == "alpha")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(alpha, ["2", "1"]);
    }

    #[test]
    fn test_caller_devid_and_signature_are_replaced() {
        let req = get("/v2/healthcheck?devid=99&signature=forged");
        assert_eq!(req.url.query(), Some(format!("devid=2&signature={SIG}").as_str()));
    }

    #[test]
    fn test_resolves_against_base_path() {
        let config = PtvConfig::new("2", KEY).with_base_url("http://localhost:8080/ignored/");
        let req = RequestBuilder::new(&config)
            .unwrap()
            .build::<()>(Method::GET, "v2/healthcheck", None)
            .unwrap();
        assert_eq!(
            req.url.as_str(),
            format!("http://localhost:8080/v2/healthcheck?devid=2&signature={SIG}")
        );
    }

    #[test]
    fn test_fragment_is_dropped() {
        assert_eq!(get("/v2/healthcheck#top").url, get("/v2/healthcheck").url);
    }

    #[test]
    fn test_malformed_path() {
        let err = builder()
            .build::<()>(Method::GET, "//timetableapi.ptv.vic.gov.au:99999/v2", None)
            .unwrap_err();
        assert!(matches!(err, PtvError::MalformedPath(_)));
    }

    #[test]
    fn test_other_host_is_rejected() {
        let err = builder()
            .build::<()>(Method::GET, "//example.com/v2/healthcheck", None)
            .unwrap_err();
        assert!(matches!(err, PtvError::MalformedPath(_)));
    }

    #[test]
    fn test_body_is_json_encoded() {
        let body = json!({ "route_type": 2 });
        let req = builder()
            .build(Method::POST, "/v2/x", Some(&body))
            .unwrap();
        assert_eq!(req.method, Method::POST);
        let decoded: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(decoded["route_type"], 2);
    }

    #[test]
    fn test_body_encoding_error() {
        let mut body = HashMap::new();
        body.insert((1, 2), "tuple keys are not valid JSON object keys");
        let err = builder()
            .build(Method::POST, "/v2/x", Some(&body))
            .unwrap_err();
        assert!(matches!(err, PtvError::BodyEncoding(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug_str = format!("{:?}", builder());
        assert!(!debug_str.contains(KEY));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
