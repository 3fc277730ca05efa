//! The adapter and its services.
//!
//! A [`RestAdapter`] owns everything shared between calls: base URL,
//! transport, converter, interceptors, execution contexts and the descriptor
//! cache. [`RestAdapter::create`] parses a [`ServiceDefinition`] eagerly and
//! returns a [`Service`] whose endpoints can then be called by name.
//!
//! # Call pipeline
//!
//! On the work context, under a `rest.call` span:
//!
//! 1. materialize the descriptor and arguments into a request
//! 2. run the interceptors' `before_request`
//! 3. hand the request to the transport and register its abort as the call's
//!    canceller
//! 4. send, then drop the result if the call was cancelled meanwhile
//! 5. run `after_response`, route the raw response and convert the body
//! 6. pass errors through the error handler and deliver on the delivery
//!    context

use std::sync::Arc;

use restfit_core::{
    Converter, DefinitionError, EndpointDescriptor, ResponseMode, ServiceDefinition,
};
use serde::de::DeserializeOwned;
use tracing::Instrument;

use crate::ClientError;
use crate::args::CallArgs;
use crate::builder::RestAdapterBuilder;
use crate::cache::DescriptorCache;
use crate::config::{ErrorHandler, Intercept, InterceptContext, RequestOptions};
use crate::delivery::{Call, CallState, Callback, Phase, Sink};
use crate::parser::parse_service;
use crate::request::materialize;
use crate::response::route;
use crate::scheduler::{DeliveryContext, WorkContext};
use crate::transport::{HyperTransport, Transport};

/// Entry point: turns service definitions into callable services.
///
/// Cheap to clone; clones share transport, cache and contexts.
///
/// # Example
///
/// ```ignore
/// use restfit_client::{CallArgs, RestAdapter};
/// use restfit_core::{EndpointDefinition, ParamType, ServiceDefinition};
///
/// let adapter = RestAdapter::builder("http://httpbin.org").build()?;
/// let api = adapter.create(
///     &ServiceDefinition::new("HttpBin").endpoint(
///         EndpointDefinition::get("get", "/get")
///             .query("query1", ParamType::Text)
///             .returns_stream(),
///     ),
/// )?;
///
/// let body: String = api.call("get", CallArgs::new().arg("abc")).await?;
/// ```
pub struct RestAdapter<Tr = HyperTransport, I = ()> {
    inner: Arc<AdapterInner<Tr, I>>,
}

struct AdapterInner<Tr, I> {
    base_url: String,
    transport: Tr,
    converter: Arc<dyn Converter>,
    interceptor: I,
    error_handler: Arc<dyn ErrorHandler>,
    work: Arc<dyn WorkContext>,
    delivery: Arc<dyn DeliveryContext>,
    options: RequestOptions,
    cache: DescriptorCache,
}

impl<Tr, I> Clone for RestAdapter<Tr, I> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<Tr: std::fmt::Debug, I> std::fmt::Debug for RestAdapter<Tr, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestAdapter")
            .field("base_url", &self.inner.base_url)
            .field("transport", &self.inner.transport)
            .field("options", &self.inner.options)
            .field("cached_descriptors", &self.inner.cache.len())
            .finish_non_exhaustive()
    }
}

impl RestAdapter {
    /// Create a new builder with the given base URL.
    pub fn builder<S: Into<String>>(base_url: S) -> RestAdapterBuilder {
        RestAdapterBuilder::new(base_url)
    }
}

impl<Tr: Transport, I: Intercept> RestAdapter<Tr, I> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        base_url: String,
        transport: Tr,
        converter: Arc<dyn Converter>,
        interceptor: I,
        error_handler: Arc<dyn ErrorHandler>,
        work: Arc<dyn WorkContext>,
        delivery: Arc<dyn DeliveryContext>,
        options: RequestOptions,
    ) -> Self {
        Self {
            inner: Arc::new(AdapterInner {
                base_url,
                transport,
                converter,
                interceptor,
                error_handler,
                work,
                delivery,
                options,
                cache: DescriptorCache::new(),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn options(&self) -> &RequestOptions {
        &self.inner.options
    }

    pub fn transport(&self) -> &Tr {
        &self.inner.transport
    }

    /// Parsed descriptors of every service created so far.
    pub fn cache(&self) -> &DescriptorCache {
        &self.inner.cache
    }

    /// Parse every endpoint of `definition` and return a callable service.
    ///
    /// # Errors
    ///
    /// Returns the first malformed endpoint's [`DefinitionError`]. Nothing is
    /// cached in that case.
    pub fn create(&self, definition: &ServiceDefinition) -> Result<Service<Tr, I>, DefinitionError> {
        let descriptors = parse_service(definition, self.inner.options.get_placeholders())?;
        tracing::debug!(
            service = %definition.name,
            endpoints = descriptors.len(),
            "service created"
        );
        for descriptor in descriptors {
            self.inner.cache.insert(&definition.name, descriptor);
        }
        Ok(Service {
            adapter: self.clone(),
            name: definition.name.clone(),
        })
    }
}

/// A created service: endpoints callable by name.
pub struct Service<Tr = HyperTransport, I = ()> {
    adapter: RestAdapter<Tr, I>,
    name: String,
}

impl<Tr, I> Clone for Service<Tr, I> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            name: self.name.clone(),
        }
    }
}

impl<Tr, I> std::fmt::Debug for Service<Tr, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service").field("name", &self.name).finish()
    }
}

impl<Tr: Transport, I: Intercept> Service<Tr, I> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parsed descriptor of `endpoint`.
    pub fn descriptor(&self, endpoint: &str) -> Option<Arc<EndpointDescriptor>> {
        self.adapter.inner.cache.get(&self.name, endpoint)
    }

    /// Call a stream-mode endpoint.
    ///
    /// The returned [`Call`] is cold: the request is built and sent only once
    /// it is subscribed or awaited. An unknown endpoint, or one declared for
    /// callback delivery, fails through the call itself.
    pub fn call<T>(&self, endpoint: &str, args: impl Into<CallArgs>) -> Call<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let lookup = self.lookup(endpoint, ResponseMode::Stream);
        let args = args.into();
        let inner = self.adapter.inner.clone();
        Call::new(Box::new(move |state: Arc<CallState>, sink: Sink<T>| match lookup {
            Ok(descriptor) => inner.dispatch(descriptor, args, state, sink),
            Err(err) => inner.deliver(state, sink, Err(err)),
        }))
    }

    /// Call a callback-mode endpoint.
    ///
    /// Exactly one of the callback's functions runs, exactly once, on the
    /// adapter's delivery context.
    pub fn enqueue<T>(&self, endpoint: &str, args: impl Into<CallArgs>, callback: Callback<T>)
    where
        T: DeserializeOwned + Send + 'static,
    {
        let state = CallState::new();
        let sink = callback.into_sink();
        match self.lookup(endpoint, ResponseMode::Callback) {
            Ok(descriptor) => self.adapter.inner.dispatch(descriptor, args.into(), state, sink),
            Err(err) => self.adapter.inner.deliver(state, sink, Err(err)),
        }
    }

    fn lookup(&self, endpoint: &str, mode: ResponseMode) -> Result<Arc<EndpointDescriptor>, ClientError> {
        let descriptor =
            self.descriptor(endpoint)
                .ok_or_else(|| DefinitionError::UnknownEndpoint {
                    service: self.name.clone(),
                    endpoint: endpoint.to_string(),
                })?;
        if descriptor.mode() != mode {
            return Err(DefinitionError::WrongMode {
                endpoint: endpoint.to_string(),
                declared: descriptor.mode().as_str(),
            }
            .into());
        }
        Ok(descriptor)
    }
}

impl<Tr: Transport, I: Intercept> AdapterInner<Tr, I> {
    /// Run the call pipeline on the work context.
    fn dispatch<T>(
        self: &Arc<Self>,
        descriptor: Arc<EndpointDescriptor>,
        args: CallArgs,
        state: Arc<CallState>,
        sink: Sink<T>,
    ) where
        T: DeserializeOwned + Send + 'static,
    {
        let span = tracing::info_span!(
            "rest.call",
            rest.endpoint = %descriptor.name(),
            rest.verb = %descriptor.verb(),
            rest.mode = descriptor.mode().as_str(),
            otel.kind = "client",
        );
        let inner = self.clone();
        let task = async move {
            if let Some(result) = inner.execute::<T>(&descriptor, &args, &state).await {
                inner.deliver(state, sink, result);
            }
        };
        self.work.spawn(Box::pin(task.instrument(span)));
    }

    /// Build, send and route one call.
    ///
    /// Returns `None` when the call was cancelled and nothing may be
    /// delivered.
    async fn execute<T>(
        self: &Arc<Self>,
        descriptor: &EndpointDescriptor,
        args: &CallArgs,
        state: &Arc<CallState>,
    ) -> Option<Result<T, ClientError>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        if state.is_cancelled() {
            return None;
        }

        // 1. Materialize
        let mut request = match materialize(
            descriptor,
            &self.base_url,
            args,
            self.converter.as_ref(),
            &self.options,
        ) {
            Ok(request) => request,
            Err(err) => return Some(Err(err)),
        };

        // 2. Apply interceptor to request
        {
            let mut ctx = InterceptContext::new(
                descriptor.name(),
                descriptor.verb(),
                &mut request.url,
                &mut request.headers,
            );
            if let Err(err) = self.interceptor.before_request(&mut ctx) {
                return Some(Err(err));
            }
        }
        let url = request.url.clone();

        // 3. Prepare and register the abort
        let handle = match self.transport.build_request(descriptor, request) {
            Ok(handle) => Arc::new(handle),
            Err(err) => return Some(Err(err)),
        };
        {
            let inner = self.clone();
            let handle = handle.clone();
            state.install_canceller(Box::new(move || inner.transport.cancel(&handle)));
        }
        if !state.mark_sent() {
            return None;
        }

        // 4. Send
        tracing::debug!(%url, "sending request");
        let raw = self.transport.send(&handle).await;
        if state.is_cancelled() {
            tracing::debug!(%url, "response dropped, call was cancelled");
            return None;
        }
        state.clear_canceller();
        tracing::debug!(%url, status = ?raw.status, error = ?raw.error, "response received");

        // 5. Route
        self.interceptor.after_response(&raw);
        Some(route::<T>(&raw, self.converter.as_ref()).into_result(&url))
    }

    /// Hand the result to the delivery context.
    ///
    /// The sink runs only if the call is still live when the job runs.
    fn deliver<T: Send + 'static>(&self, state: Arc<CallState>, sink: Sink<T>, result: Result<T, ClientError>) {
        let result = result.map_err(|err| {
            tracing::debug!(error = %err, kind = ?err.kind(), "call failed");
            self.error_handler.handle_error(err)
        });
        let phase = if result.is_ok() {
            Phase::Completed
        } else {
            Phase::Errored
        };
        self.delivery.deliver(Box::new(move || {
            if state.finish(phase) {
                sink(result);
            }
        }));
    }
}
