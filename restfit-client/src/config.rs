//! Configuration modules for the client.
//!
//! This module contains adapter-level configuration:
//! - [`RequestOptions`]: URL encoding, placeholder policy, part size warning
//! - [`Intercept`]: Request/response interception
//! - [`ErrorHandler`]: Rewriting errors before delivery

mod error_handler;
mod interceptor;
mod options;

pub use error_handler::{ErrorHandler, FnErrorHandler, IdentityErrorHandler};
pub use interceptor::{Chain, HeaderInterceptor, Intercept, InterceptContext, Interceptor};
pub use options::{PlaceholderPolicy, RequestOptions, UrlEncoding};
