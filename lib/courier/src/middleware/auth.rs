//! Authentication header middleware.
//!
//! Services authenticate with either a Keystone-style `X-Auth-Token` header
//! or an OAuth-style `Authorization: Bearer` header. Credentials are a
//! transport concern: descriptors never carry them.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use tower::{Layer, Service};

use crate::{Error, Request, Response, Result};

/// Header layout of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `X-Auth-Token: <token>`.
    Token,
    /// `Authorization: Bearer <token>`.
    Bearer,
}

impl AuthScheme {
    /// Header name carrying the credential.
    #[must_use]
    pub const fn header_name(self) -> &'static str {
        match self {
            Self::Token => "X-Auth-Token",
            Self::Bearer => "Authorization",
        }
    }

    fn header_value(self, token: &str) -> String {
        match self {
            Self::Token => token.to_string(),
            Self::Bearer => format!("Bearer {token}"),
        }
    }
}

/// Layer that adds an authentication header to every request.
///
/// A header already present on the request wins, so a single call can
/// still be made with other credentials.
///
/// # Example
///
/// ```
/// use courier::middleware::{AuthHeaderLayer, AuthScheme};
///
/// let layer = AuthHeaderLayer::new(AuthScheme::Token, "gAAAAABk-token");
/// assert_eq!(layer.scheme(), AuthScheme::Token);
/// ```
#[derive(Debug, Clone)]
pub struct AuthHeaderLayer {
    scheme: AuthScheme,
    value: Arc<str>,
}

impl AuthHeaderLayer {
    /// Create a layer for the given scheme and token.
    pub fn new(scheme: AuthScheme, token: impl Into<String>) -> Self {
        Self {
            scheme,
            value: Arc::from(scheme.header_value(&token.into())),
        }
    }

    /// The scheme this layer applies.
    #[must_use]
    pub const fn scheme(&self) -> AuthScheme {
        self.scheme
    }
}

impl<S> Layer<S> for AuthHeaderLayer {
    type Service = AuthHeader<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthHeader {
            inner,
            scheme: self.scheme,
            value: Arc::clone(&self.value),
        }
    }
}

/// Service that adds an authentication header to requests.
#[derive(Debug, Clone)]
pub struct AuthHeader<S> {
    inner: S,
    scheme: AuthScheme,
    value: Arc<str>,
}

impl<S> Service<Request<Bytes>> for AuthHeader<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Bytes>) -> Self::Future {
        let name = self.scheme.header_name();
        let present = request
            .headers()
            .keys()
            .any(|key| key.eq_ignore_ascii_case(name));
        if !present {
            request
                .headers_mut()
                .insert(name.to_string(), self.value.to_string());
        }

        // The clone has not been polled ready; keep the service that was.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(request).await })
    }
}
