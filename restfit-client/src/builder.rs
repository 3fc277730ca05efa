//! Adapter builder.
//!
//! Provides a fluent API for configuring and building a [`RestAdapter`].

use std::sync::Arc;

use restfit_core::{Converter, JsonConverter};

use crate::adapter::RestAdapter;
use crate::config::{
    Chain, ErrorHandler, IdentityErrorHandler, Intercept, PlaceholderPolicy, RequestOptions,
    UrlEncoding,
};
use crate::error::ClientBuildError;
use crate::scheduler::{DeliveryContext, Inline, TokioContext, WorkContext};
use crate::transport::{HyperTransport, Transport};

/// Builder for creating a [`RestAdapter`].
///
/// # Example
///
/// ```ignore
/// use restfit_client::{HeaderInterceptor, RestAdapter, UrlEncoding};
///
/// let adapter = RestAdapter::builder("http://httpbin.org")
///     .with_interceptor(HeaderInterceptor::new("x-client", "restfit"))
///     .url_encoding(UrlEncoding::Encoded)
///     .build()?;
/// ```
pub struct RestAdapterBuilder<Tr = HyperTransport, I = ()> {
    /// Base URL every path template is appended to.
    base_url: String,
    /// Network implementation.
    transport: Tr,
    /// Body converter for request bodies and responses.
    converter: Arc<dyn Converter>,
    /// Interceptor chain.
    interceptor: I,
    /// Hook applied to every delivered error.
    error_handler: Arc<dyn ErrorHandler>,
    /// Where requests run; defaults to the current Tokio runtime.
    work: Option<Arc<dyn WorkContext>>,
    /// Where results are delivered.
    delivery: Arc<dyn DeliveryContext>,
    /// Materialization options.
    options: RequestOptions,
}

impl<Tr: std::fmt::Debug, I> std::fmt::Debug for RestAdapterBuilder<Tr, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestAdapterBuilder")
            .field("base_url", &self.base_url)
            .field("transport", &self.transport)
            .field("work", &self.work.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl RestAdapterBuilder {
    /// Create a new builder with the given base URL.
    ///
    /// The base URL should include the scheme and host, e.g.
    /// `"http://localhost:3000"`. A trailing slash is removed.
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            transport: HyperTransport::default(),
            converter: Arc::new(JsonConverter::new()),
            interceptor: (),
            error_handler: Arc::new(IdentityErrorHandler),
            work: None,
            delivery: Arc::new(Inline),
            options: RequestOptions::default(),
        }
    }
}

impl<Tr: Transport, I: Intercept> RestAdapterBuilder<Tr, I> {
    /// Use a different transport.
    pub fn transport<T2: Transport>(self, transport: T2) -> RestAdapterBuilder<T2, I> {
        RestAdapterBuilder {
            base_url: self.base_url,
            transport,
            converter: self.converter,
            interceptor: self.interceptor,
            error_handler: self.error_handler,
            work: self.work,
            delivery: self.delivery,
            options: self.options,
        }
    }

    /// Use a different body converter.
    ///
    /// Default: [`JsonConverter`].
    pub fn converter<C: Converter>(mut self, converter: C) -> Self {
        self.converter = Arc::new(converter);
        self
    }

    /// Add an interceptor.
    ///
    /// Interceptors run in the order they are added for requests, and in
    /// reverse order for responses.
    pub fn with_interceptor<N: Intercept>(self, interceptor: N) -> RestAdapterBuilder<Tr, Chain<I, N>> {
        RestAdapterBuilder {
            base_url: self.base_url,
            transport: self.transport,
            converter: self.converter,
            interceptor: Chain(self.interceptor, interceptor),
            error_handler: self.error_handler,
            work: self.work,
            delivery: self.delivery,
            options: self.options,
        }
    }

    /// Rewrite every error before it is delivered.
    pub fn error_handler<H: ErrorHandler>(mut self, handler: H) -> Self {
        self.error_handler = Arc::new(handler);
        self
    }

    /// Run requests on `context`.
    ///
    /// Default: the Tokio runtime `build` is called on.
    pub fn work_on<W: WorkContext>(mut self, context: W) -> Self {
        self.work = Some(Arc::new(context));
        self
    }

    /// Deliver results on `context`.
    ///
    /// Default: [`Inline`], on the task that finished the request.
    pub fn deliver_on<D: DeliveryContext>(mut self, context: D) -> Self {
        self.delivery = Arc::new(context);
        self
    }

    /// Replace all materialization options at once.
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Set how path and query values are encoded.
    pub fn url_encoding(mut self, encoding: UrlEncoding) -> Self {
        self.options = self.options.url_encoding(encoding);
        self
    }

    /// Set how path placeholders without a value are handled.
    pub fn placeholders(mut self, policy: PlaceholderPolicy) -> Self {
        self.options = self.options.placeholders(policy);
        self
    }

    /// Warn when a multipart file is larger than `bytes`.
    pub fn part_size_warning(mut self, bytes: u64) -> Self {
        self.options = self.options.part_size_warning(bytes);
        self
    }

    /// Build the adapter.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError::EmptyBaseUrl`] for a blank base URL, and
    /// [`ClientBuildError::NoRuntime`] when no work context was set and no
    /// Tokio runtime is running.
    pub fn build(self) -> Result<RestAdapter<Tr, I>, ClientBuildError> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientBuildError::EmptyBaseUrl);
        }
        let work = match self.work {
            Some(work) => work,
            None => Arc::new(TokioContext::current()?),
        };
        Ok(RestAdapter::new(
            base_url,
            self.transport,
            self.converter,
            self.interceptor,
            self.error_handler,
            work,
            self.delivery,
            self.options,
        ))
    }
}
