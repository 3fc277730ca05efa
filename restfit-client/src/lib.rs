//! Declarative HTTP client for Rust.
//!
//! Services are declared once as data (verb and path per endpoint, an
//! annotation per parameter) and then called by name with a list of
//! arguments. The adapter turns each call into an HTTP request, sends it on a
//! background context, and hands the result back on the caller's delivery
//! context.
//!
//! ## Features
//!
//! - GET, POST, PUT, PATCH, DELETE and HEAD endpoints
//! - Path, query, query-map, form-field and header parameters
//! - JSON bodies through a pluggable [`Converter`](restfit_core::Converter)
//! - Single-file multipart uploads
//! - Callback delivery, or cold cancellable calls that can be subscribed,
//!   awaited or polled as a stream
//! - Interceptors, error handlers and per-request timeouts
//!
//! ## Example
//!
//! ```ignore
//! use restfit_client::{CallArgs, RestAdapter};
//! use restfit_core::{EndpointDefinition, ParamType, ServiceDefinition};
//!
//! let adapter = RestAdapter::builder("http://httpbin.org").build()?;
//!
//! let api = adapter.create(
//!     &ServiceDefinition::new("HttpBin")
//!         .header("Accept: application/json")
//!         .endpoint(
//!             EndpointDefinition::get("get", "/get")
//!                 .query("query1", ParamType::Text)
//!                 .query("query2", ParamType::Integer)
//!                 .returns_stream(),
//!         ),
//! )?;
//!
//! let echo: Echo = api.call("get", CallArgs::new().arg("abc").arg(123)).await?;
//! ```
//!
//! ## Callback Example
//!
//! ```ignore
//! use restfit_client::{CallArgs, Callback};
//!
//! // Declared with `.callback()` instead of `.returns_stream()`
//! api.enqueue::<Echo>(
//!     "post",
//!     CallArgs::new().arg("abc").arg(123.456),
//!     Callback::new(
//!         |echo| println!("posted: {echo:?}"),
//!         |message| eprintln!("failed: {message}"),
//!     ),
//! );
//! ```
//!
//! ## Cancellation Example
//!
//! ```ignore
//! use restfit_client::FnObserver;
//!
//! let subscription = api
//!     .call::<Echo>("get", args)
//!     .subscribe(FnObserver::new(|echo| println!("{echo:?}"), |err| eprintln!("{err}")));
//!
//! // Aborts the request; no further events are delivered.
//! subscription.dispose();
//! ```

mod adapter;
mod args;
mod builder;
mod cache;
pub mod config;
mod delivery;
mod error;
pub mod parser;
pub mod request;
pub mod response;
pub mod scheduler;
pub mod transport;

pub use adapter::{RestAdapter, Service};
pub use args::{Arg, BodyArg, CallArgs};
pub use builder::RestAdapterBuilder;
pub use cache::DescriptorCache;
pub use config::{
    Chain, ErrorHandler, FnErrorHandler, HeaderInterceptor, IdentityErrorHandler, Intercept,
    InterceptContext, Interceptor, PlaceholderPolicy, RequestOptions, UrlEncoding,
};
pub use delivery::{Call, CallFuture, CallStream, Callback, FnObserver, Observer, Phase, Subscription};
pub use error::{ClientBuildError, ClientError, ErrorKind};
pub use response::{Outcome, RawResponse};
pub use scheduler::{DeliveryContext, Inline, MainQueue, TokioContext, WorkContext};
pub use transport::{HyperTransport, HyperTransportBuilder, Transport};

// Re-export core types
pub use restfit_core::{
    Converter, ConverterExt, DefinitionError, EndpointDefinition, EndpointDescriptor,
    JsonConverter, MultipartBody, ParamType, ServiceDefinition, Verb,
};
