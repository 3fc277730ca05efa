//! Hyper-based HTTP transport.
//!
//! This module provides [`HyperTransport`], the default [`Transport`]
//! implementation using hyper_util's legacy client over plain HTTP.

use std::time::Duration;

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use http_body_util::BodyExt;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use parking_lot::Mutex;
use restfit_core::{EndpointDescriptor, Headers};

use super::Transport;
use super::body::TransportBody;
use crate::ClientError;
use crate::request::{OutboundRequest, check_request, encode_request};
use crate::response::RawResponse;

/// Type alias for the hyper client with a plain HTTP connector.
type HyperClient = Client<HttpConnector, TransportBody>;

/// HTTP transport using hyper_util's legacy client.
///
/// Connections are pooled. Each request may be bounded by a timeout, and
/// any request can be aborted through [`Transport::cancel`].
///
/// # Example
///
/// ```ignore
/// use restfit_client::{RestAdapter, transport::HyperTransport};
///
/// let adapter = RestAdapter::builder("http://httpbin.org")
///     .transport(HyperTransport::builder().timeout(Duration::from_secs(5)).build())
///     .build()?;
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a new transport builder.
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::new()
    }

    /// Create a new transport with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// The per-request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn exchange(&self, url: &str, request: OutboundRequest) -> RawResponse {
        let request = match encode_request(request).await {
            Ok(request) => request,
            Err(ClientError::Network { message, .. }) => return RawResponse::failed(url, message),
            Err(err) => return RawResponse::failed(url, err.to_string()),
        };
        let response = match self.client.request(request).await {
            Ok(response) => response,
            Err(e) => return RawResponse::failed(url, format!("request failed: {e}")),
        };

        let status = response.status();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
            .collect();
        let body = match response.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => return RawResponse::failed(url, format!("failed to read response body: {e}")),
        };

        RawResponse::completed(
            url,
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            headers,
            String::from_utf8_lossy(&body),
        )
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// A request prepared by [`HyperTransport`].
///
/// Holds the checked request until it is sent, and the abort handle used by
/// [`Transport::cancel`]. The body is encoded, and any file part read, only
/// when the request is sent.
pub struct HyperHandle {
    url: String,
    request: Mutex<Option<OutboundRequest>>,
    registration: Mutex<Option<AbortRegistration>>,
    abort: AbortHandle,
}

impl HyperHandle {
    /// The URL this handle will request.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether [`Transport::cancel`] has been called.
    pub fn is_aborted(&self) -> bool {
        self.abort.is_aborted()
    }
}

impl std::fmt::Debug for HyperHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperHandle")
            .field("url", &self.url)
            .field("sent", &self.request.lock().is_none())
            .field("aborted", &self.abort.is_aborted())
            .finish()
    }
}

impl Transport for HyperTransport {
    type Handle = HyperHandle;

    fn build_request(
        &self,
        _descriptor: &EndpointDescriptor,
        request: OutboundRequest,
    ) -> Result<HyperHandle, ClientError> {
        check_request(&request)?;
        let url = request.url().to_string();
        let (abort, registration) = AbortHandle::new_pair();
        Ok(HyperHandle {
            url,
            request: Mutex::new(Some(request)),
            registration: Mutex::new(Some(registration)),
            abort,
        })
    }

    async fn send(&self, handle: &HyperHandle) -> RawResponse {
        let url = handle.url.as_str();
        let (Some(request), Some(registration)) =
            (handle.request.lock().take(), handle.registration.lock().take())
        else {
            return RawResponse::failed(url, "request already sent");
        };

        let exchange = Abortable::new(self.exchange(url, request), registration);
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, exchange).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return RawResponse::failed(url, format!("request timed out after {limit:?}"));
                }
            },
            None => exchange.await,
        };
        outcome.unwrap_or_else(|_| RawResponse::failed(url, "request aborted"))
    }

    fn cancel(&self, handle: &HyperHandle) {
        tracing::debug!(url = %handle.url, "aborting request");
        handle.abort.abort();
    }
}

/// Builder for [`HyperTransport`].
///
/// # Example
///
/// ```ignore
/// use restfit_client::transport::HyperTransportBuilder;
/// use std::time::Duration;
///
/// let transport = HyperTransportBuilder::new()
///     .timeout(Duration::from_secs(30))
///     .pool_idle_timeout(Duration::from_secs(90))
///     .build();
/// ```
#[derive(Debug)]
pub struct HyperTransportBuilder {
    /// Per-request timeout.
    timeout: Option<Duration>,
    /// Connection pool idle timeout.
    pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host.
    pool_max_idle_per_host: usize,
    /// TCP connect timeout.
    connect_timeout: Option<Duration>,
}

impl Default for HyperTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransportBuilder {
    /// Create a new transport builder with default settings.
    pub fn new() -> Self {
        Self {
            timeout: None,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
            connect_timeout: None,
        }
    }

    /// Bound every request, including reading the response body.
    ///
    /// A request that exceeds it ends with a network error.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection pool idle timeout.
    ///
    /// Default: 90 seconds.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Disable connection pool idle timeout.
    pub fn pool_idle_timeout_none(mut self) -> Self {
        self.pool_idle_timeout = None;
        self
    }

    /// Set the maximum number of idle connections per host.
    ///
    /// Default: 32.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Set the TCP connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Build the transport.
    pub fn build(self) -> HyperTransport {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(self.connect_timeout);

        let mut builder = Client::builder(TokioExecutor::new());
        builder.pool_timer(TokioTimer::new());
        if let Some(timeout) = self.pool_idle_timeout {
            builder.pool_idle_timeout(timeout);
        }
        builder.pool_max_idle_per_host(self.pool_max_idle_per_host);

        HyperTransport {
            client: builder.build(connector),
            timeout: self.timeout,
        }
    }
}
