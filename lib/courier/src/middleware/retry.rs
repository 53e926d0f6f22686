//! Retry policy for `tower::retry::RetryLayer`.

use std::future;

use bytes::Bytes;
use tower::retry::Policy;

use crate::{Error, Request, Response};

/// Retries transient failures of idempotent requests.
///
/// Retried outcomes:
/// - connection errors and timeouts
/// - 5xx server errors
/// - 429 Too Many Requests
///
/// `POST` and `PATCH` are never replayed: the first attempt may have been
/// applied even when its response was lost.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    remaining: u32,
}

impl RetryPolicy {
    /// Allow up to `max_retries` extra attempts per request.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            remaining: max_retries,
        }
    }

    fn should_retry_response(response: &Response<Bytes>) -> bool {
        let status = response.status();
        status >= 500 || status == 429
    }

    fn should_retry_error(error: &Error) -> bool {
        error.is_connection() || error.is_timeout()
    }
}

impl Policy<Request<Bytes>, Response<Bytes>, Error> for RetryPolicy {
    type Future = future::Ready<()>;

    fn retry(
        &mut self,
        req: &mut Request<Bytes>,
        result: &mut Result<Response<Bytes>, Error>,
    ) -> Option<Self::Future> {
        if self.remaining == 0 || !req.method().is_idempotent() {
            return None;
        }

        let should_retry = match result {
            Ok(response) => Self::should_retry_response(response),
            Err(error) => Self::should_retry_error(error),
        };

        if should_retry {
            self.remaining -= 1;
            Some(future::ready(()))
        } else {
            None
        }
    }

    fn clone_request(&mut self, req: &Request<Bytes>) -> Option<Request<Bytes>> {
        req.method().is_idempotent().then(|| req.clone())
    }
}
