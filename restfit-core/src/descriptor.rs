//! Parsed endpoint descriptors.
//!
//! An [`EndpointDescriptor`] is produced once per endpoint by the client's
//! parser and is immutable afterwards. It carries everything needed to turn a
//! call's arguments into a request: the verb, the path template, one
//! [`ParamRole`] per argument, the merged static headers, and the delivery
//! [`ResponseMode`].

use std::fmt;

use crate::headers::Headers;

/// HTTP verb of an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl Verb {
    /// The method token used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Head => "HEAD",
        }
    }

    /// Whether requests with this verb may carry a body.
    pub fn allows_body(&self) -> bool {
        matches!(self, Verb::Post | Verb::Put | Verb::Patch)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single call argument is used for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamRole {
    /// Replaces `{name}` in the path template.
    Path(String),
    /// Appended as `name=value` to the query string.
    Query(String),
    /// A map of extra query pairs (GET only).
    QueryMap,
    /// A form field.
    Field(String),
    /// A per-call header.
    Header(String),
    /// The raw body, serialized by the converter.
    Body,
    /// The binary part of a multipart request.
    Part,
}

impl ParamRole {
    /// Short role name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ParamRole::Path(_) => "Path",
            ParamRole::Query(_) => "Query",
            ParamRole::QueryMap => "QueryMap",
            ParamRole::Field(_) => "Field",
            ParamRole::Header(_) => "Header",
            ParamRole::Body => "Body",
            ParamRole::Part => "Part",
        }
    }
}

/// How the result of a call reaches the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseMode {
    /// A success/error callback pair supplied up front.
    Callback,
    /// A cold, cancellable single-value stream.
    Stream,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Callback => "callback",
            ResponseMode::Stream => "stream",
        }
    }
}

/// Parsed metadata for one endpoint.
///
/// Built by the parser from an [`EndpointDefinition`](crate::EndpointDefinition)
/// and never mutated afterwards, so it can be shared freely between
/// concurrent calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointDescriptor {
    name: String,
    verb: Verb,
    path_template: String,
    is_multipart: bool,
    params: Vec<ParamRole>,
    static_headers: Headers,
    mode: ResponseMode,
}

impl EndpointDescriptor {
    /// Assemble a descriptor.
    ///
    /// The parser is responsible for enforcing the structural invariants;
    /// this constructor only stores the parts.
    pub fn new(
        name: impl Into<String>,
        verb: Verb,
        path_template: impl Into<String>,
        is_multipart: bool,
        params: Vec<ParamRole>,
        static_headers: Headers,
        mode: ResponseMode,
    ) -> Self {
        Self {
            name: name.into(),
            verb,
            path_template: path_template.into(),
            is_multipart,
            params,
            static_headers,
            mode,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    pub fn is_multipart(&self) -> bool {
        self.is_multipart
    }

    /// Parameter roles in declaration order, one per call argument.
    pub fn params(&self) -> &[ParamRole] {
        &self.params
    }

    /// Headers declared on the service and the endpoint, method wins.
    pub fn static_headers(&self) -> &Headers {
        &self.static_headers
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    /// Whether a raw body parameter is declared.
    pub fn has_body(&self) -> bool {
        self.params.iter().any(|p| matches!(p, ParamRole::Body))
    }
}

/// Iterate the `{name}` placeholders of a path template, in order.
///
/// Unterminated braces are not placeholders.
pub fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    let mut rest = template;
    std::iter::from_fn(move || {
        loop {
            let open = rest.find('{')?;
            let after = &rest[open + 1..];
            let close = after.find('}')?;
            let name = &after[..close];
            rest = &after[close + 1..];
            if !name.is_empty() && !name.contains('{') {
                return Some(name);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_allows_body() {
        assert!(Verb::Post.allows_body());
        assert!(Verb::Put.allows_body());
        assert!(Verb::Patch.allows_body());
        assert!(!Verb::Get.allows_body());
        assert!(!Verb::Delete.allows_body());
        assert!(!Verb::Head.allows_body());
    }

    #[test]
    fn test_placeholders() {
        let names: Vec<_> = placeholders("/users/{id}/posts/{post}").collect();
        assert_eq!(names, vec!["id", "post"]);

        assert_eq!(placeholders("/plain").count(), 0);
        assert_eq!(placeholders("/open{").count(), 0);
        assert_eq!(placeholders("/empty/{}").count(), 0);
    }

    #[test]
    fn test_descriptor_has_body() {
        let desc = EndpointDescriptor::new(
            "post_body",
            Verb::Post,
            "/post",
            false,
            vec![ParamRole::Body, ParamRole::Header("client".into())],
            Headers::new(),
            ResponseMode::Stream,
        );
        assert!(desc.has_body());
        assert_eq!(desc.params()[1].kind(), "Header");
    }
}
