//! Request materialization.
//!
//! Combines a descriptor with live call arguments. The steps run in a fixed
//! order because the query string continues from whatever the path left:
//!
//! 1. base URL + path template
//! 2. `{name}` substitution for Path arguments
//! 3. Query arguments, `?` before the first pair and `&` after
//! 4. QueryMap entries, continuing the same separator state
//! 5. Field arguments into the form field list
//! 6. Body argument through the converter
//! 7. Part argument normalized to a [`MultipartBody`]
//! 8. Header arguments merged over the static headers
//!
//! The result depends only on its inputs.

use std::borrow::Cow;

use percent_encoding::{AsciiSet, CONTROLS, NON_ALPHANUMERIC, utf8_percent_encode};
use restfit_core::{Converter, DefinitionError, EndpointDescriptor, Headers, MultipartBody, ParamRole};

use super::OutboundRequest;
use crate::ClientError;
use crate::args::{Arg, CallArgs};
use crate::config::{PlaceholderPolicy, RequestOptions, UrlEncoding};

/// Everything outside the RFC 3986 unreserved set.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Characters that can never appear literally in a URI. Reserved delimiters
/// such as `&`, `=` and `/` are left alone.
const ILLEGAL: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Build the request for one call.
pub fn materialize(
    descriptor: &EndpointDescriptor,
    base_url: &str,
    args: &CallArgs,
    converter: &dyn Converter,
    options: &RequestOptions,
) -> Result<OutboundRequest, ClientError> {
    let name = descriptor.name();
    let roles = descriptor.params();
    let args = args.as_slice();
    if roles.len() != args.len() {
        return Err(DefinitionError::ArgumentCount {
            endpoint: name.to_string(),
            expected: roles.len(),
            actual: args.len(),
        }
        .into());
    }
    let bound = || roles.iter().zip(args).enumerate();
    let mismatch = |index: usize, expected: &'static str| -> ClientError {
        DefinitionError::ArgumentMismatch {
            endpoint: name.to_string(),
            index,
            expected,
        }
        .into()
    };
    let encoding = options.url_encoding;

    // 1-2. Path
    let mut path = descriptor.path_template().to_string();
    for (index, (role, arg)) in bound() {
        let ParamRole::Path(key) = role else { continue };
        match arg {
            Arg::Value(value) => {
                path = path.replace(&format!("{{{key}}}"), &encode(value, encoding));
            }
            Arg::Null if options.placeholders == PlaceholderPolicy::Keep => {}
            Arg::Null => {
                return Err(DefinitionError::UnresolvedPlaceholder {
                    endpoint: name.to_string(),
                    name: key.clone(),
                }
                .into());
            }
            _ => return Err(mismatch(index, "a scalar value")),
        }
    }
    let mut url = format!("{base_url}{path}");

    // 3. Query
    let mut has_query = url.contains('?');
    for (index, (role, arg)) in bound() {
        let ParamRole::Query(key) = role else { continue };
        match arg {
            Arg::Value(value) => append_query(&mut url, &mut has_query, key, value, encoding),
            Arg::Null => {}
            _ => return Err(mismatch(index, "a scalar value")),
        }
    }

    // 4. QueryMap
    for (index, (role, arg)) in bound() {
        if *role != ParamRole::QueryMap {
            continue;
        }
        match arg {
            Arg::Map(entries) => {
                for (key, value) in entries {
                    append_query(&mut url, &mut has_query, key, value, encoding);
                }
            }
            Arg::Null => {}
            _ => return Err(mismatch(index, "a map")),
        }
    }

    // 5. Fields
    let mut fields = Vec::new();
    for (index, (role, arg)) in bound() {
        let ParamRole::Field(key) = role else { continue };
        match arg {
            Arg::Value(value) => fields.push((key.clone(), value.clone())),
            Arg::Null => {}
            _ => return Err(mismatch(index, "a scalar value")),
        }
    }

    // 6. Body
    let mut body = None;
    for (index, (role, arg)) in bound() {
        if *role != ParamRole::Body {
            continue;
        }
        match arg {
            Arg::Body(value) => {
                let text = value
                    .value()
                    .map_err(|message| ClientError::conversion(message, "", value.type_name(), &url))
                    .and_then(|v| {
                        converter.to_body(v).map_err(|e| {
                            ClientError::conversion(e.message(), "", value.type_name(), &url)
                        })
                    })?;
                body = Some(text);
            }
            Arg::Null => {}
            _ => return Err(mismatch(index, "a body")),
        }
    }

    // 7. Part
    let mut part = None;
    if descriptor.is_multipart() {
        for (index, (role, arg)) in bound() {
            if *role != ParamRole::Part {
                continue;
            }
            match arg {
                Arg::Part(p) => part = Some(p.clone()),
                Arg::File(path) => part = Some(MultipartBody::from_file(path.clone())),
                Arg::Null => {}
                _ => return Err(mismatch(index, "a file or multipart body")),
            }
        }
    }

    // 8. Headers
    let mut call_headers = Headers::new();
    for (index, (role, arg)) in bound() {
        let ParamRole::Header(key) = role else { continue };
        match arg {
            Arg::Value(value) => {
                call_headers.insert(key.as_str(), value.as_str());
            }
            Arg::Null => {}
            _ => return Err(mismatch(index, "a scalar value")),
        }
    }
    let mut headers = descriptor.static_headers().clone();
    headers.merge(&call_headers);

    tracing::debug!(endpoint = name, url = %url, "materialized request");

    Ok(OutboundRequest {
        verb: descriptor.verb(),
        url,
        headers,
        fields,
        multipart: descriptor.is_multipart(),
        part,
        body,
        body_content_type: converter.content_type(),
        part_size_warning: options.part_size_warning,
    })
}

fn encode(value: &str, encoding: UrlEncoding) -> Cow<'_, str> {
    match encoding {
        UrlEncoding::Encoded => utf8_percent_encode(value, COMPONENT).into(),
        UrlEncoding::Raw => utf8_percent_encode(value, ILLEGAL).into(),
    }
}

fn append_query(url: &mut String, has_query: &mut bool, key: &str, value: &str, encoding: UrlEncoding) {
    url.push(if *has_query { '&' } else { '?' });
    *has_query = true;
    url.push_str(&encode(key, encoding));
    url.push('=');
    url.push_str(&encode(value, encoding));
}
