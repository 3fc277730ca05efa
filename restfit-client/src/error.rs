//! Client-side error types.
//!
//! [`ClientError`] is the terminal error of a call. Every failure reaches the
//! caller exactly once through the call's delivery channel, never as a panic
//! or a second event.

use restfit_core::DefinitionError;

/// Longest response body excerpt kept on a conversion error.
const BODY_SNIPPET_LEN: usize = 256;

/// Which of the four failure classes an error belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection failure, timeout, or abort.
    Network,
    /// The exchange completed with a non-success status.
    Http,
    /// The response body could not be deserialized.
    Conversion,
    /// The endpoint declaration or the call's arguments are malformed.
    Definition,
}

/// Error delivered to the caller of an endpoint.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The transport could not complete the exchange.
    #[error("{message} url:{url}")]
    Network { url: String, message: String },

    /// The exchange completed but the status was not 2xx.
    #[error("error code :{status} message : {reason} url:{url}")]
    Http {
        status: u16,
        reason: String,
        body: String,
        url: String,
    },

    /// The response body did not convert into the expected type.
    #[error("failed to convert response into {target}: {message} url:{url}")]
    Conversion {
        message: String,
        body: String,
        target: &'static str,
        url: String,
    },

    /// The endpoint or the call's arguments are malformed.
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

impl ClientError {
    /// Create a network error.
    pub fn network<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        ClientError::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a conversion error, keeping a bounded excerpt of the body.
    pub fn conversion<M: Into<String>, U: Into<String>>(
        message: M,
        body: &str,
        target: &'static str,
        url: U,
    ) -> Self {
        ClientError::Conversion {
            message: message.into(),
            body: snippet(body),
            target,
            url: url.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Network { .. } => ErrorKind::Network,
            ClientError::Http { .. } => ErrorKind::Http,
            ClientError::Conversion { .. } => ErrorKind::Conversion,
            ClientError::Definition(_) => ErrorKind::Definition,
        }
    }

    /// The attempted URL, when the request got that far.
    pub fn url(&self) -> Option<&str> {
        match self {
            ClientError::Network { url, .. }
            | ClientError::Http { url, .. }
            | ClientError::Conversion { url, .. } => Some(url),
            ClientError::Definition(_) => None,
        }
    }

    /// HTTP status code (only for the Http variant).
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw (or excerpted) response body, when one was received.
    pub fn body(&self) -> Option<&str> {
        match self {
            ClientError::Http { body, .. } | ClientError::Conversion { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        self.kind() == ErrorKind::Network
    }
}

fn snippet(body: &str) -> String {
    match body.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}

/// Error type for adapter building failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    /// The base URL is blank.
    #[error("base url must not be empty")]
    EmptyBaseUrl,

    /// The default work context needs a Tokio runtime.
    #[error("no Tokio runtime available; build inside a runtime or call work_on()")]
    NoRuntime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display() {
        let err = ClientError::Http {
            status: 404,
            reason: "Not Found".into(),
            body: "{}".into(),
            url: "http://example.test/missing".into(),
        };
        assert_eq!(
            err.to_string(),
            "error code :404 message : Not Found url:http://example.test/missing"
        );
        assert_eq!(err.kind(), ErrorKind::Http);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.body(), Some("{}"));
    }

    #[test]
    fn test_network_error_carries_url() {
        let err = ClientError::network("http://example.test/delay/10", "request timed out");
        assert!(err.is_network());
        assert_eq!(err.url(), Some("http://example.test/delay/10"));
        assert!(err.to_string().contains("http://example.test/delay/10"));
        assert!(err.status().is_none());
    }

    #[test]
    fn test_conversion_body_is_bounded() {
        let body = "x".repeat(1000);
        let err = ClientError::conversion("bad", &body, "Foo", "http://example.test");
        let kept = err.body().unwrap();
        assert!(kept.len() < body.len());
        assert!(kept.ends_with("..."));
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }

    #[test]
    fn test_definition_error_is_transparent() {
        let def = DefinitionError::MissingVerb {
            endpoint: "get".into(),
        };
        let err = ClientError::from(def.clone());
        assert_eq!(err.to_string(), def.to_string());
        assert!(err.url().is_none());
    }
}
