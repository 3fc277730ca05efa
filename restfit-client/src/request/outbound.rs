use restfit_core::{Headers, MultipartBody, Verb};

/// A request ready to hand to a transport.
///
/// Produced by [`materialize`](super::materialize) for exactly one send
/// attempt. At most one body representation is used on the wire: a
/// serialized body wins over the multipart part and form fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundRequest {
    pub(crate) verb: Verb,
    pub(crate) url: String,
    pub(crate) headers: Headers,
    pub(crate) fields: Vec<(String, String)>,
    pub(crate) multipart: bool,
    pub(crate) part: Option<MultipartBody>,
    pub(crate) body: Option<String>,
    pub(crate) body_content_type: &'static str,
    pub(crate) part_size_warning: u64,
}

impl OutboundRequest {
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Fully resolved URL: base, substituted path, and query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Static headers merged with per-call headers, per-call wins.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Form fields in declaration order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Whether the endpoint is declared multipart.
    pub fn is_multipart(&self) -> bool {
        self.multipart
    }

    pub fn part(&self) -> Option<&MultipartBody> {
        self.part.as_ref()
    }

    /// Serialized body text.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Content type of [`body`](Self::body), as reported by the converter.
    pub fn body_content_type(&self) -> &'static str {
        self.body_content_type
    }

    /// Size above which reading the part's file logs a warning.
    pub fn part_size_warning(&self) -> u64 {
        self.part_size_warning
    }
}
