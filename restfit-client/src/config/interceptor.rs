//! Interceptors for endpoint calls.
//!
//! Interceptors run after a request has been materialized and before it is
//! handed to the transport, and again once the raw response arrives. Typical
//! uses:
//! - Adding authentication headers
//! - Logging
//! - Rewriting the URL (e.g. pinning a host)
//!
//! # Example
//!
//! ```ignore
//! use restfit_client::{HeaderInterceptor, Interceptor, InterceptContext, RestAdapter};
//!
//! // Simple header interceptor
//! let auth = HeaderInterceptor::new("authorization", "Bearer token123");
//!
//! // Custom interceptor with closure
//! let logging = Interceptor::new(|ctx: &mut InterceptContext<'_>| {
//!     println!("Calling: {} {}", ctx.endpoint, ctx.url);
//!     Ok(())
//! });
//!
//! let adapter = RestAdapter::builder("http://localhost:3000")
//!     .with_interceptor(auth)
//!     .with_interceptor(logging)
//!     .build()?;
//! ```

use restfit_core::{Headers, Verb};

use crate::ClientError;
use crate::response::RawResponse;

/// A materialized request that interceptors can inspect and modify.
#[derive(Debug)]
pub struct InterceptContext<'a> {
    /// The endpoint being called.
    pub endpoint: &'a str,
    pub verb: Verb,
    /// Fully resolved URL (mutable).
    pub url: &'a mut String,
    /// Merged request headers (mutable).
    pub headers: &'a mut Headers,
}

impl<'a> InterceptContext<'a> {
    /// Create a new intercept context.
    pub fn new(endpoint: &'a str, verb: Verb, url: &'a mut String, headers: &'a mut Headers) -> Self {
        Self {
            endpoint,
            verb,
            url,
            headers,
        }
    }
}

/// Trait for intercepting endpoint calls.
///
/// Implementations can modify the URL and headers, log calls, or return an
/// error to abort the call before it is sent.
///
/// # Generic Composition
///
/// Interceptors are composed at compile time using the [`Chain`] combinator.
/// The unit type `()` serves as the base case (no-op interceptor).
///
/// ```ignore
/// use restfit_client::{Chain, HeaderInterceptor};
///
/// let auth = HeaderInterceptor::new("authorization", "Bearer token");
/// let trace = HeaderInterceptor::new("x-trace-id", "123");
/// let chain: Chain<HeaderInterceptor, HeaderInterceptor> = Chain(auth, trace);
/// ```
pub trait Intercept: Send + Sync + 'static {
    /// Called before the request is handed to the transport.
    ///
    /// Returning an error aborts the call; the error is delivered to the
    /// caller instead of a response.
    fn before_request(&self, ctx: &mut InterceptContext<'_>) -> Result<(), ClientError> {
        let _ = ctx;
        Ok(())
    }

    /// Called once the transport has produced a raw response.
    fn after_response(&self, response: &RawResponse) {
        let _ = response;
    }
}

/// The unit type implements `Intercept` as a no-op, serving as the base case
/// for generic interceptor chains.
impl Intercept for () {
    #[inline]
    fn before_request(&self, _ctx: &mut InterceptContext<'_>) -> Result<(), ClientError> {
        Ok(())
    }

    #[inline]
    fn after_response(&self, _response: &RawResponse) {}
}

/// A compile-time chain of two interceptors.
///
/// `Chain<A, B>` applies interceptor `A` first, then `B` for requests.
/// For responses, they are applied in reverse order (`B` then `A`).
#[derive(Clone, Debug)]
pub struct Chain<A, B>(pub A, pub B);

impl<A, B> Intercept for Chain<A, B>
where
    A: Intercept,
    B: Intercept,
{
    #[inline]
    fn before_request(&self, ctx: &mut InterceptContext<'_>) -> Result<(), ClientError> {
        self.0.before_request(ctx)?;
        self.1.before_request(ctx)
    }

    #[inline]
    fn after_response(&self, response: &RawResponse) {
        self.1.after_response(response);
        self.0.after_response(response);
    }
}

/// An interceptor that sets a header on every request.
///
/// Replaces any value the endpoint declared for the same name.
#[derive(Clone, Debug)]
pub struct HeaderInterceptor {
    name: String,
    value: String,
}

impl HeaderInterceptor {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Intercept for HeaderInterceptor {
    fn before_request(&self, ctx: &mut InterceptContext<'_>) -> Result<(), ClientError> {
        ctx.headers.insert(self.name.as_str(), self.value.as_str());
        Ok(())
    }
}

/// A wrapper that adapts a closure to the `Intercept` trait.
///
/// # Example
///
/// ```ignore
/// use restfit_client::{Interceptor, InterceptContext};
///
/// let logging = Interceptor::new(|ctx: &mut InterceptContext<'_>| {
///     println!("Calling: {}", ctx.url);
///     Ok(())
/// });
/// ```
pub struct Interceptor<F> {
    before: F,
}

impl<F> Interceptor<F>
where
    F: Fn(&mut InterceptContext<'_>) -> Result<(), ClientError> + Send + Sync + 'static,
{
    /// Create a new interceptor from a closure.
    pub fn new(before: F) -> Self {
        Self { before }
    }
}

impl<F: Clone> Clone for Interceptor<F> {
    fn clone(&self) -> Self {
        Self {
            before: self.before.clone(),
        }
    }
}

impl<F> std::fmt::Debug for Interceptor<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor").finish()
    }
}

impl<F> Intercept for Interceptor<F>
where
    F: Fn(&mut InterceptContext<'_>) -> Result<(), ClientError> + Send + Sync + 'static,
{
    fn before_request(&self, ctx: &mut InterceptContext<'_>) -> Result<(), ClientError> {
        (self.before)(ctx)
    }
}
