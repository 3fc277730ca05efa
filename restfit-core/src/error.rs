//! Definition and conversion error types.
//!
//! - [`DefinitionError`]: A malformed endpoint declaration, raised when the
//!   declaration is parsed (or when call arguments do not fit the descriptor)
//! - [`ConvertError`]: A body could not be serialized or deserialized

use crate::descriptor::Verb;

/// A malformed endpoint declaration.
///
/// Raised eagerly when a service is parsed. An endpoint that fails to parse is
/// unusable until its declaration is fixed; the error is never retried.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    /// The endpoint carries no HTTP verb annotation.
    #[error("{endpoint}: no HTTP method annotation")]
    MissingVerb { endpoint: String },

    /// The endpoint carries more than one HTTP verb annotation.
    #[error("{endpoint}: conflicting HTTP method annotations ({first} and {second})")]
    ConflictingVerbs {
        endpoint: String,
        first: Verb,
        second: Verb,
    },

    /// The endpoint name is blank or declared twice in one service.
    #[error("{service}: invalid or duplicate endpoint name {endpoint:?}")]
    InvalidEndpointName { service: String, endpoint: String },

    /// A `"Name: Value"` header declaration could not be split.
    #[error("{endpoint}: malformed header declaration {header:?}")]
    MalformedHeader { endpoint: String, header: String },

    /// A parameter has no recognized annotation and is not the callback.
    #[error("{endpoint}: no annotation found on parameter {parameter:?}")]
    UnannotatedParameter { endpoint: String, parameter: String },

    /// A `Part` parameter was declared on a non-multipart endpoint.
    #[error("{endpoint}: [Part] parameters can only be used with multipart encoding")]
    PartWithoutMultipart { endpoint: String },

    /// A `Part` parameter has a type other than file or multipart body.
    #[error("{endpoint}: [Part] parameter {parameter:?} must be a file or a multipart body")]
    InvalidPartType { endpoint: String, parameter: String },

    /// A multipart endpoint must declare exactly one `Part` parameter.
    #[error("{endpoint}: multipart requests must contain exactly one Part parameter, found {count}")]
    PartCount { endpoint: String, count: usize },

    /// A multipart endpoint also declared a raw `Body` parameter.
    #[error("{endpoint}: multipart requests may not contain a Body parameter")]
    MultipartWithBody { endpoint: String },

    /// More than one `Body` parameter.
    #[error("{endpoint}: at most one Body parameter is allowed")]
    MultipleBodies { endpoint: String },

    /// More than one `QueryMap` parameter.
    #[error("{endpoint}: at most one QueryMap parameter is allowed")]
    MultipleQueryMaps { endpoint: String },

    /// `QueryMap` is only honoured on GET endpoints.
    #[error("{endpoint}: QueryMap parameters require GET, found {verb}")]
    QueryMapRequiresGet { endpoint: String, verb: Verb },

    /// Body-bearing parameters on a verb that sends no body.
    #[error("{endpoint}: {verb} requests cannot carry a {role} parameter")]
    BodyNotAllowed {
        endpoint: String,
        verb: Verb,
        role: &'static str,
    },

    /// A `{name}` placeholder in the path has no matching Path parameter.
    #[error("{endpoint}: path placeholder {{{name}}} has no Path parameter")]
    UnboundPlaceholder { endpoint: String, name: String },

    /// A Path parameter names a placeholder the path does not contain.
    #[error("{endpoint}: Path parameter {name:?} does not appear in {path:?}")]
    UnknownPathParameter {
        endpoint: String,
        name: String,
        path: String,
    },

    /// A stream endpoint declared a callback parameter.
    #[error("{endpoint}: stream endpoints may not take a Callback parameter")]
    CallbackOnStream { endpoint: String },

    /// A unit endpoint must take exactly one callback parameter.
    #[error("{endpoint}: callback endpoints must take exactly one Callback parameter, found {count}")]
    CallbackCount { endpoint: String, count: usize },

    /// The callback parameter is followed by other parameters.
    #[error("{endpoint}: the Callback parameter must be the last parameter")]
    CallbackNotLast { endpoint: String },

    /// The endpoint was called through the wrong delivery channel.
    #[error("{endpoint}: endpoint is declared for {declared} delivery")]
    WrongMode {
        endpoint: String,
        declared: &'static str,
    },

    /// No endpoint with this name exists in the service.
    #[error("{service}: unknown endpoint {endpoint:?}")]
    UnknownEndpoint { service: String, endpoint: String },

    /// The call supplied the wrong number of arguments.
    #[error("{endpoint}: expected {expected} arguments, got {actual}")]
    ArgumentCount {
        endpoint: String,
        expected: usize,
        actual: usize,
    },

    /// An argument does not fit the role of its parameter.
    #[error("{endpoint}: argument {index} must be {expected}")]
    ArgumentMismatch {
        endpoint: String,
        index: usize,
        expected: &'static str,
    },

    /// A path placeholder was left unresolved at call time.
    #[error("{endpoint}: path placeholder {{{name}}} was not resolved")]
    UnresolvedPlaceholder { endpoint: String, name: String },

    /// The call produced a request that cannot be put on the wire.
    #[error("invalid request for {url:?}: {reason}")]
    InvalidRequest { url: String, reason: String },
}

/// A body could not be converted to or from its wire text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ConvertError {
    message: String,
}

impl ConvertError {
    /// Create a new conversion error.
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The converter's error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(err: serde_json::Error) -> Self {
        ConvertError::new(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_error_display() {
        let err = DefinitionError::PartCount {
            endpoint: "upload".into(),
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "upload: multipart requests must contain exactly one Part parameter, found 2"
        );

        let err = DefinitionError::UnboundPlaceholder {
            endpoint: "delay".into(),
            name: "seconds".into(),
        };
        assert_eq!(
            err.to_string(),
            "delay: path placeholder {seconds} has no Path parameter"
        );
    }

    #[test]
    fn test_convert_error_from_serde() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = ConvertError::from(err);
        assert!(err.message().contains("expected"));
    }
}
