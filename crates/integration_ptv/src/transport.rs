//! Request execution and response decoding
//!
//! Sends a [`SignedRequest`] over `reqwest` and hands the body to one of three
//! destinations chosen by the caller: nothing (metadata only), a typed JSON
//! value, or a raw byte sink. Status codes are reported, never interpreted.

use std::io::Write;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::PtvError;
use crate::request::SignedRequest;

/// Status, headers and final URL of a received response
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// URL the response was received from
    pub url: Url,
}

impl ResponseMeta {
    fn from_response(response: &Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            url: response.url().clone(),
        }
    }

    /// Returns true for 2xx status codes
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// A decoded response body together with its metadata
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// Decoded body
    pub data: T,
    /// Response metadata
    pub meta: ResponseMeta,
}

impl<T> ApiResponse<T> {
    /// HTTP status code of the response
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.meta.status
    }

    /// Discard the metadata and keep the decoded body
    pub fn into_data(self) -> T {
        self.data
    }
}

/// Hook invoked after every completed round trip, before decoding
///
/// Runs synchronously on the calling task. It sees the response metadata
/// only; the body is left untouched for the caller's destination.
pub trait RequestObserver: Send + Sync {
    /// Called once per received response
    fn on_request_completed(&self, request: &SignedRequest, response: &ResponseMeta);
}

impl<F> RequestObserver for F
where
    F: Fn(&SignedRequest, &ResponseMeta) + Send + Sync,
{
    fn on_request_completed(&self, request: &SignedRequest, response: &ResponseMeta) {
        self(request, response);
    }
}

/// Executes signed requests over a shared `reqwest` client
#[derive(Clone)]
pub struct HttpExecutor {
    client: Client,
    observer: Option<Arc<dyn RequestObserver>>,
    timeout_secs: Option<u64>,
}

impl std::fmt::Debug for HttpExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpExecutor")
            .field("client", &self.client)
            .field("observer", &self.observer.is_some())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl HttpExecutor {
    /// Create an executor around an existing HTTP client
    ///
    /// `timeout_secs` is applied to every request, replacing any total timeout
    /// the client was built with, and reported back in [`PtvError::Timeout`].
    #[must_use]
    pub fn new(
        client: Client,
        observer: Option<Arc<dyn RequestObserver>>,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            client,
            observer,
            timeout_secs,
        }
    }

    /// Send the request and return the metadata, discarding the body
    ///
    /// # Errors
    ///
    /// Returns [`PtvError::Transport`] or [`PtvError::Timeout`] on network failure.
    pub async fn execute(&self, request: &SignedRequest) -> Result<ResponseMeta, PtvError> {
        let (_response, meta) = self.send(request).await?;
        Ok(meta)
    }

    /// Send the request and decode the JSON body into `T`
    ///
    /// # Errors
    ///
    /// Returns [`PtvError::Transport`] or [`PtvError::Timeout`] on network
    /// failure, [`PtvError::ResponseBody`] if the body cannot be read, and
    /// [`PtvError::Decode`] if it is not valid JSON for `T`. The last two
    /// carry the response metadata.
    pub async fn execute_json<T>(&self, request: &SignedRequest) -> Result<ApiResponse<T>, PtvError>
    where
        T: DeserializeOwned,
    {
        let (response, meta) = self.send(request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| body_read_error(&e, &meta))?;

        match serde_json::from_slice(&body) {
            Ok(data) => Ok(ApiResponse { data, meta }),
            Err(e) => {
                debug!(status = %meta.status, error = %e, "Response body did not decode");
                Err(PtvError::Decode {
                    message: e.to_string(),
                    meta: Box::new(meta),
                })
            }
        }
    }

    /// Send the request and copy the body verbatim into `sink`
    ///
    /// # Errors
    ///
    /// Returns [`PtvError::Transport`] or [`PtvError::Timeout`] if no response
    /// arrives, [`PtvError::ResponseBody`] if the body cannot be read, and
    /// [`PtvError::Sink`] if the sink rejects it. The last two carry the
    /// response metadata.
    pub async fn execute_raw<W>(
        &self,
        request: &SignedRequest,
        sink: &mut W,
    ) -> Result<ResponseMeta, PtvError>
    where
        W: Write + Send + ?Sized,
    {
        let (mut response, meta) = self.send(request).await?;

        let mut copied = 0usize;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| body_read_error(&e, &meta))?
        {
            sink.write_all(&chunk).map_err(|e| sink_error(&e, &meta))?;
            copied += chunk.len();
        }
        sink.flush().map_err(|e| sink_error(&e, &meta))?;

        debug!(bytes = copied, "Copied raw response body");
        Ok(meta)
    }

    async fn send(&self, request: &SignedRequest) -> Result<(Response, ResponseMeta), PtvError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }
        if let Some(timeout_secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }

        debug!(method = %request.method, url = %request.url, "Sending request");

        let response = builder
            .send()
            .await
            .map_err(|e| PtvError::from_reqwest(&e, self.timeout_secs))?;

        let meta = ResponseMeta::from_response(&response);
        debug!(status = %meta.status, "Received response");

        self.notify(request, &meta);
        Ok((response, meta))
    }

    fn notify(&self, request: &SignedRequest, meta: &ResponseMeta) {
        let Some(observer) = &self.observer else {
            return;
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            observer.on_request_completed(request, meta);
        }));
        if outcome.is_err() {
            warn!(url = %request.url, "Request observer panicked, continuing");
        }
    }
}

fn body_read_error(err: &reqwest::Error, meta: &ResponseMeta) -> PtvError {
    debug!(status = %meta.status, error = %err, "Reading response body failed");
    PtvError::ResponseBody {
        message: err.to_string(),
        meta: Box::new(meta.clone()),
    }
}

fn sink_error(err: &std::io::Error, meta: &ResponseMeta) -> PtvError {
    PtvError::Sink {
        message: err.to_string(),
        meta: Box::new(meta.clone()),
    }
}
