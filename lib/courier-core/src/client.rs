//! The transport seam.
//!
//! [`HttpClient`] is the only thing the invoker needs from a transport: send
//! one request, return one buffered response. Implement it for a real HTTP
//! stack or for a scripted test double.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Executes HTTP requests.
///
/// A non-2xx status is a normal [`Response`], not an error; status handling
/// belongs to the caller.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received:
    /// - network errors
    /// - TLS errors
    /// - timeouts
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

impl<C: HttpClient> HttpClient for Arc<C> {
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        C::execute(self, request)
    }
}

impl<C: HttpClient> HttpClient for &C {
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        C::execute(self, request)
    }
}
