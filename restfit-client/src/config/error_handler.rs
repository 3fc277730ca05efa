//! Error rewriting before delivery.
//!
//! Every error a call produces passes through the adapter's [`ErrorHandler`]
//! exactly once, just before it is delivered. The handler may translate it
//! (for instance into a friendlier network message) but cannot swallow it.

use crate::ClientError;

/// Hook applied to every delivered error.
pub trait ErrorHandler: Send + Sync + 'static {
    fn handle_error(&self, error: ClientError) -> ClientError;
}

/// Delivers errors unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityErrorHandler;

impl ErrorHandler for IdentityErrorHandler {
    #[inline]
    fn handle_error(&self, error: ClientError) -> ClientError {
        error
    }
}

/// A wrapper that adapts a closure to the `ErrorHandler` trait.
pub struct FnErrorHandler<F>(pub F);

impl<F> ErrorHandler for FnErrorHandler<F>
where
    F: Fn(ClientError) -> ClientError + Send + Sync + 'static,
{
    fn handle_error(&self, error: ClientError) -> ClientError {
        (self.0)(error)
    }
}

impl<F> std::fmt::Debug for FnErrorHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnErrorHandler").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let err = ClientError::network("http://example.test", "refused");
        assert_eq!(IdentityErrorHandler.handle_error(err.clone()), err);
    }

    #[test]
    fn test_closure_rewrites() {
        let handler = FnErrorHandler(|err: ClientError| match err {
            ClientError::Network { url, .. } => ClientError::network(url, "offline"),
            other => other,
        });
        let err = handler.handle_error(ClientError::network("http://example.test", "refused"));
        assert_eq!(
            err,
            ClientError::network("http://example.test", "offline")
        );
    }
}
