//! Request body types for HTTP transport.
//!
//! This module provides [`TransportBody`], the request body type handed to
//! hyper's HTTP client.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame};
use pin_project_lite::pin_project;

pin_project! {
    /// A fully buffered request body.
    ///
    /// Form, multipart and serialized bodies are all assembled before the
    /// request is sent, so a body is either empty or a single chunk.
    #[project = TransportBodyProj]
    pub enum TransportBody {
        /// Empty request body.
        Empty,
        /// Full request body with all data available.
        Full {
            data: Option<Bytes>,
        },
    }
}

impl TransportBody {
    /// Create an empty body.
    pub fn empty() -> Self {
        TransportBody::Empty
    }

    /// Create a body with the given data.
    pub fn full(data: Bytes) -> Self {
        TransportBody::Full { data: Some(data) }
    }
}

impl Body for TransportBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            TransportBodyProj::Empty => Poll::Ready(None),
            TransportBodyProj::Full { data } => Poll::Ready(data.take().map(|d| Ok(Frame::data(d)))),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            TransportBody::Empty => true,
            TransportBody::Full { data } => data.is_none(),
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            TransportBody::Empty => http_body::SizeHint::with_exact(0),
            TransportBody::Full { data } => {
                http_body::SizeHint::with_exact(data.as_ref().map_or(0, |d| d.len() as u64))
            }
        }
    }
}

impl Default for TransportBody {
    fn default() -> Self {
        TransportBody::Empty
    }
}

impl std::fmt::Debug for TransportBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportBody::Empty => write!(f, "TransportBody::Empty"),
            TransportBody::Full { data } => f
                .debug_struct("TransportBody::Full")
                .field("data_len", &data.as_ref().map(|d| d.len()))
                .finish(),
        }
    }
}
