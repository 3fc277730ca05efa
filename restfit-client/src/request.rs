//! Request building modules.
//!
//! This module contains the request side of a call:
//! - [`OutboundRequest`]: A fully materialized request, owned by one call
//! - [`materialize`]: Descriptor + arguments into an [`OutboundRequest`]
//! - [`check_request`]: Reject a request that cannot go on the wire
//! - [`encode_request`]: [`OutboundRequest`] into an `http::Request`

mod encoder;
mod materialize;
mod outbound;

pub use encoder::{RESERVED_HEADERS, check_request, encode_request, is_reserved_header};
pub use materialize::materialize;
pub use outbound::OutboundRequest;
