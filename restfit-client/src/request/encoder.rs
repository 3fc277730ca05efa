//! Wire encoding of outbound requests.
//!
//! Turns an [`OutboundRequest`] into an `http::Request<TransportBody>`. The
//! body representation is chosen in this order:
//!
//! 1. a serialized body, sent with the converter's content type
//! 2. `multipart/form-data` for multipart endpoints: the part first, then the
//!    string fields
//! 3. `application/x-www-form-urlencoded` when there are form fields
//! 4. no body

use bytes::{BufMut, Bytes, BytesMut};
use http::{HeaderName, HeaderValue, Method, Request, Uri, header};
use restfit_core::{DefinitionError, MultipartBody, PartSource, Verb};

use super::OutboundRequest;
use crate::ClientError;
use crate::transport::TransportBody;

/// Headers the transport always computes itself.
pub const RESERVED_HEADERS: &[&str] = &["content-length", "host", "date"];

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Check if a header is set by the transport and must not be overridden.
///
/// `content-type` is reserved only when the body is encoded automatically.
pub fn is_reserved_header(name: &str, body_encoded: bool) -> bool {
    RESERVED_HEADERS
        .iter()
        .any(|reserved| name.eq_ignore_ascii_case(reserved))
        || (body_encoded && name.eq_ignore_ascii_case(header::CONTENT_TYPE.as_str()))
}

/// Check that a request can be put on the wire without touching its part.
///
/// Fails with [`DefinitionError::InvalidRequest`] when the URL is not a valid
/// URI or a multipart name or MIME type contains a line break.
pub fn check_request(request: &OutboundRequest) -> Result<(), ClientError> {
    let invalid = |reason: String| {
        ClientError::from(DefinitionError::InvalidRequest {
            url: request.url.clone(),
            reason,
        })
    };
    request
        .url
        .parse::<Uri>()
        .map_err(|e| invalid(format!("invalid uri: {e}")))?;
    if let Some(part) = &request.part {
        for (what, value) in [
            ("field name", part.field()),
            ("file name", part.file_name()),
            ("MIME type", part.mime_type()),
        ] {
            if value.contains(['\r', '\n']) {
                return Err(invalid(format!("multipart {what} contains a line break")));
            }
        }
    }
    Ok(())
}

/// Encode a request for the hyper transport.
///
/// A file-backed part is read on the blocking pool. Reserved headers are
/// dropped with a warning, as are headers whose name or value is not valid
/// HTTP.
pub async fn encode_request(
    request: OutboundRequest,
) -> Result<Request<TransportBody>, ClientError> {
    check_request(&request)?;
    let OutboundRequest {
        verb,
        url,
        headers,
        fields,
        multipart,
        part,
        body,
        body_content_type,
        part_size_warning,
    } = request;

    let (content_type, payload) = if let Some(text) = body {
        (Some(body_content_type.to_string()), Some(Bytes::from(text)))
    } else if multipart {
        let boundary = format!("restfit-{:016x}", rand::random::<u64>());
        let mut buf = BytesMut::new();
        if let Some(part) = &part {
            let data = read_part(part, part_size_warning).await.map_err(|e| {
                ClientError::network(
                    url.as_str(),
                    format!("failed to read multipart file: {e}"),
                )
            })?;
            buf.put_slice(format!("--{boundary}\r\n").as_bytes());
            buf.put_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    escape_quotes(part.field()),
                    escape_quotes(part.file_name())
                )
                .as_bytes(),
            );
            buf.put_slice(format!("Content-Type: {}\r\n\r\n", part.mime_type()).as_bytes());
            buf.put_slice(&data);
            buf.put_slice(b"\r\n");
        }
        for (name, value) in &fields {
            buf.put_slice(format!("--{boundary}\r\n").as_bytes());
            buf.put_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    escape_quotes(name)
                )
                .as_bytes(),
            );
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(format!("--{boundary}--\r\n").as_bytes());
        (
            Some(format!("multipart/form-data; boundary={boundary}")),
            Some(buf.freeze()),
        )
    } else if !fields.is_empty() {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter())
            .finish();
        (Some(FORM_URLENCODED.to_string()), Some(Bytes::from(encoded)))
    } else {
        (None, None)
    };

    let mut builder = Request::builder().method(method(verb)).uri(url.as_str());
    let body_encoded = content_type.is_some();
    for (name, value) in headers.iter() {
        if is_reserved_header(name, body_encoded) {
            tracing::warn!(header = name, url = %url, "ignoring reserved header");
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => builder = builder.header(name, value),
            _ => tracing::warn!(header = name, url = %url, "ignoring invalid header"),
        }
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }

    let body = payload.map_or_else(TransportBody::empty, TransportBody::full);
    builder.body(body).map_err(|e| {
        DefinitionError::InvalidRequest {
            url: url.clone(),
            reason: e.to_string(),
        }
        .into()
    })
}

async fn read_part(part: &MultipartBody, warn_above: u64) -> std::io::Result<Bytes> {
    match part.source() {
        PartSource::Bytes(data) => Ok(data.clone()),
        PartSource::File(_) => {
            let part = part.clone();
            tokio::task::spawn_blocking(move || part.read_bytes(warn_above))
                .await
                .map_err(std::io::Error::other)?
        }
    }
}

fn method(verb: Verb) -> Method {
    match verb {
        Verb::Get => Method::GET,
        Verb::Post => Method::POST,
        Verb::Put => Method::PUT,
        Verb::Patch => Method::PATCH,
        Verb::Delete => Method::DELETE,
        Verb::Head => Method::HEAD,
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('"', "%22")
}
