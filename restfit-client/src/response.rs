//! Response routing.
//!
//! A transport reports every exchange as a [`RawResponse`]. [`classify`]
//! sorts it into exactly one [`Outcome`]:
//!
//! - no data received: network error (connection failure, timeout, abort)
//! - status outside 2xx: HTTP error
//! - otherwise: success, converted into the caller's type unless that type
//!   is `String`, which receives the body text untouched
//!
//! A failed conversion becomes a conversion error. No outcome is retried.

use std::any::Any;

use restfit_core::{Converter, ConverterExt, Headers};
use serde::de::DeserializeOwned;

use crate::ClientError;

/// What a transport observed for one exchange.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// The attempted URL.
    pub url: String,
    /// Status code, when a response arrived.
    pub status: Option<u16>,
    /// Reason phrase for `status`.
    pub reason: String,
    pub headers: Headers,
    /// Body text; `None` means no data was received.
    pub body: Option<String>,
    /// Transport error message, when the exchange failed.
    pub error: Option<String>,
}

impl RawResponse {
    /// A completed exchange.
    pub fn completed(
        url: impl Into<String>,
        status: u16,
        reason: impl Into<String>,
        headers: Headers,
        body: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            status: Some(status),
            reason: reason.into(),
            headers,
            body: Some(body.into()),
            error: None,
        }
    }

    /// An exchange that produced no data.
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Whether the exchange should be reported as an error.
    pub fn is_error(&self) -> bool {
        self.body.is_none() || !self.status.is_some_and(|s| (200..300).contains(&s))
    }

    /// Human-readable failure description, `None` on success.
    pub fn error_message(&self) -> Option<String> {
        if self.body.is_none() {
            let message = self.error.as_deref().unwrap_or("service error");
            return Some(format!("{message} url:{}", self.url));
        }
        match self.status {
            Some(status) if (200..300).contains(&status) => None,
            status => Some(format!(
                "error code :{} message : {} url:{}",
                status.unwrap_or_default(),
                self.reason,
                self.url
            )),
        }
    }

    /// Body text of a successful exchange.
    pub fn success_body(&self) -> Option<&str> {
        if self.is_error() {
            None
        } else {
            self.body.as_deref()
        }
    }
}

/// The classified result of one exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T = String> {
    Success(T),
    HttpError {
        status: u16,
        reason: String,
        body: String,
    },
    NetworkError(String),
    ConversionError {
        message: String,
        body: String,
        target: &'static str,
    },
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Convert into the caller-facing result, attaching the attempted URL.
    pub fn into_result(self, url: &str) -> Result<T, ClientError> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::HttpError {
                status,
                reason,
                body,
            } => Err(ClientError::Http {
                status,
                reason,
                body,
                url: url.to_string(),
            }),
            Outcome::NetworkError(message) => Err(ClientError::network(url, message)),
            Outcome::ConversionError {
                message,
                body,
                target,
            } => Err(ClientError::conversion(message, &body, target, url)),
        }
    }
}

/// Classify a raw exchange without converting the body.
pub fn classify(raw: &RawResponse) -> Outcome {
    let Some(body) = &raw.body else {
        let message = raw.error.as_deref().unwrap_or("service error");
        return Outcome::NetworkError(message.to_string());
    };
    match raw.status {
        Some(status) if (200..300).contains(&status) => Outcome::Success(body.clone()),
        status => Outcome::HttpError {
            status: status.unwrap_or_default(),
            reason: raw.reason.clone(),
            body: body.clone(),
        },
    }
}

/// Classify a raw exchange and convert a successful body into `T`.
pub fn route<T>(raw: &RawResponse, converter: &dyn Converter) -> Outcome<T>
where
    T: DeserializeOwned + 'static,
{
    match classify(raw) {
        Outcome::Success(text) => convert(text, converter),
        Outcome::HttpError {
            status,
            reason,
            body,
        } => Outcome::HttpError {
            status,
            reason,
            body,
        },
        Outcome::NetworkError(message) => Outcome::NetworkError(message),
        Outcome::ConversionError {
            message,
            body,
            target,
        } => Outcome::ConversionError {
            message,
            body,
            target,
        },
    }
}

fn convert<T>(text: String, converter: &dyn Converter) -> Outcome<T>
where
    T: DeserializeOwned + 'static,
{
    // Raw text passthrough.
    let mut slot = Some(text);
    if let Some(value) = (&mut slot as &mut dyn Any).downcast_mut::<Option<T>>() {
        if let Some(value) = value.take() {
            return Outcome::Success(value);
        }
    }
    let text = slot.unwrap_or_default();
    match converter.decode::<T>(&text) {
        Ok(value) => Outcome::Success(value),
        Err(e) => Outcome::ConversionError {
            message: e.message().to_string(),
            body: text,
            target: std::any::type_name::<T>(),
        },
    }
}
