//! HTTP transport layer.
//!
//! A [`Transport`] performs the actual network exchange. The client hands it
//! a materialized [`OutboundRequest`], gets back an opaque handle, sends the
//! handle, and may cancel it from another task at any time. Every exchange
//! ends in a [`RawResponse`]; failures are reported through its `error`
//! field rather than as a `Result`, so the response router sees one shape.
//!
//! [`HyperTransport`] is the default implementation, built on hyper_util's
//! legacy client.
//!
//! # Example
//!
//! ```ignore
//! use restfit_client::transport::HyperTransport;
//! use std::time::Duration;
//!
//! let transport = HyperTransport::builder()
//!     .timeout(Duration::from_secs(10))
//!     .pool_idle_timeout(Duration::from_secs(60))
//!     .build();
//! ```

mod body;
mod hyper;

use std::future::Future;

use restfit_core::EndpointDescriptor;

use crate::ClientError;
use crate::request::OutboundRequest;
use crate::response::RawResponse;

pub use body::TransportBody;
pub use hyper::{HyperHandle, HyperTransport, HyperTransportBuilder};

/// Contract between the client and a network implementation.
pub trait Transport: Send + Sync + 'static {
    /// One prepared exchange.
    type Handle: Send + Sync + 'static;

    /// Prepare a request for sending.
    fn build_request(
        &self,
        descriptor: &EndpointDescriptor,
        request: OutboundRequest,
    ) -> Result<Self::Handle, ClientError>;

    /// Perform the exchange.
    ///
    /// Called at most once per handle.
    fn send(&self, handle: &Self::Handle) -> impl Future<Output = RawResponse> + Send;

    /// Abort the exchange.
    ///
    /// May be called before, during, or after [`send`](Self::send); a send
    /// that has not finished reports a network error.
    fn cancel(&self, handle: &Self::Handle);
}
