//! Request materialization options.
//!
//! [`RequestOptions`] controls the parts of request building where more than
//! one behaviour is reasonable: whether path and query values are
//! percent-encoded, what happens to `{name}` placeholders with no argument,
//! and when a multipart file is large enough to log a warning.

use restfit_core::DEFAULT_MAX_FILE_SIZE;

/// How path and query values are written into the URL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UrlEncoding {
    /// Percent-encode everything outside the RFC 3986 unreserved set.
    #[default]
    Encoded,
    /// Write values verbatim, escaping only what a URI cannot hold
    /// (controls, non-ASCII, space, quotes, angle brackets, braces, `\`,
    /// `^`, `|` and the backtick). `&`, `=` and `/` stay literal.
    Raw,
}

/// What to do with a `{name}` placeholder that no Path parameter fills.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaceholderPolicy {
    /// Fail when the service is created.
    #[default]
    Reject,
    /// Leave the literal `{name}` in the URL.
    Keep,
}

/// Options for turning descriptors and arguments into requests.
///
/// # Example
///
/// ```ignore
/// use restfit_client::{PlaceholderPolicy, RequestOptions, UrlEncoding};
///
/// let options = RequestOptions::new()
///     .url_encoding(UrlEncoding::Raw)
///     .placeholders(PlaceholderPolicy::Keep)
///     .part_size_warning(1024 * 1024);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestOptions {
    pub(crate) url_encoding: UrlEncoding,
    pub(crate) placeholders: PlaceholderPolicy,
    pub(crate) part_size_warning: u64,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            url_encoding: UrlEncoding::default(),
            placeholders: PlaceholderPolicy::default(),
            part_size_warning: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url_encoding(mut self, encoding: UrlEncoding) -> Self {
        self.url_encoding = encoding;
        self
    }

    pub fn placeholders(mut self, policy: PlaceholderPolicy) -> Self {
        self.placeholders = policy;
        self
    }

    /// Log a warning when a multipart file is larger than `bytes`.
    ///
    /// The file is still read in full.
    pub fn part_size_warning(mut self, bytes: u64) -> Self {
        self.part_size_warning = bytes;
        self
    }

    pub fn get_url_encoding(&self) -> UrlEncoding {
        self.url_encoding
    }

    pub fn get_placeholders(&self) -> PlaceholderPolicy {
        self.placeholders
    }

    pub fn get_part_size_warning(&self) -> u64 {
        self.part_size_warning
    }
}
