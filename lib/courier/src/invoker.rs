//! Descriptor invocation: bind, execute, then fallback or decode.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use courier_core::{ResolvedRequest, bind, decode};

use crate::{Arguments, Catalog, Decoded, Error, HttpClient, Paged, RequestDescriptor, Result};

/// Runs request descriptors against one service endpoint.
///
/// The invoker holds a transport and a base URL and nothing else: it is cheap
/// to clone and safe to share between tasks.
///
/// # Example
///
/// ```no_run
/// use courier::{ApiInvoker, Arguments, Fallback, FallbackPolicy, HyperClient, RequestDescriptor};
///
/// # async fn run() -> courier::Result<()> {
/// let list_meters = RequestDescriptor::get("list_meters", "/v2/meters")
///     .shape(courier::ResultShape::Sequence)
///     .fallback(Fallback::on_not_found(FallbackPolicy::EmptyList))
///     .build()?;
///
/// let metering = ApiInvoker::new(HyperClient::new(), "https://metering.example.com:8777")?;
/// let meters = metering.invoke(&list_meters, &Arguments::new()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ApiInvoker<C> {
    client: C,
    base_url: Url,
}

impl<C: Clone> Clone for ApiInvoker<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

impl<C> ApiInvoker<C> {
    /// Create an invoker for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL cannot be parsed.
    pub fn new(client: C, base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url.as_ref())?,
        })
    }

    /// Create an invoker with a pre-parsed URL.
    #[must_use]
    pub const fn with_url(client: C, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// The service endpoint.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The transport.
    #[must_use]
    pub const fn inner(&self) -> &C {
        &self.client
    }

    /// Consume the invoker and return the transport.
    #[must_use]
    pub fn into_inner(self) -> C {
        self.client
    }
}

impl<C: HttpClient> ApiInvoker<C> {
    /// Run one operation.
    ///
    /// Argument errors are returned before anything is sent. A failed call
    /// (transport error or non-2xx status) goes through the descriptor's
    /// fallback; a successful one is decoded into the declared shape.
    ///
    /// # Errors
    ///
    /// - argument errors from [`bind`]
    /// - failures the fallback does not cover, unchanged
    /// - decode errors for malformed 2xx bodies
    pub async fn invoke(
        &self,
        descriptor: &RequestDescriptor,
        arguments: &Arguments,
    ) -> Result<Decoded> {
        let resolved = bind(descriptor, arguments)?;
        match self.send(resolved).await {
            Ok(body) => decode(&body, descriptor.selector(), descriptor.shape()),
            Err(err) => recover(descriptor, err),
        }
    }

    /// Run one operation and deserialize the result.
    ///
    /// # Errors
    ///
    /// Same as [`invoke`](Self::invoke), plus [`Error::MalformedResponse`]
    /// when the value does not fit `T`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
        arguments: &Arguments,
    ) -> Result<T> {
        self.invoke(descriptor, arguments).await?.into_typed()
    }

    /// Run the catalog operation called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownOperation`] for an unregistered name, otherwise
    /// the same as [`invoke`](Self::invoke).
    pub async fn invoke_named(
        &self,
        catalog: &Catalog,
        name: &str,
        arguments: &Arguments,
    ) -> Result<Decoded> {
        let descriptor = catalog.get(name)?;
        self.invoke(&descriptor, arguments).await
    }

    /// Send a bound request, keeping only 2xx bodies.
    pub(crate) async fn send(&self, resolved: ResolvedRequest) -> Result<Bytes> {
        let request = resolved.into_request(&self.base_url)?;
        let response = self.client.execute(request).await?;
        Ok(response.error_for_status()?.into_body())
    }
}

impl<C> ApiInvoker<C>
where
    C: HttpClient + Clone + 'static,
{
    /// Lazily list every element of a paginated operation.
    ///
    /// Nothing is sent until the stream is polled; `limit` bounds the page
    /// size, not the number of elements.
    #[must_use]
    pub fn paged(
        &self,
        descriptor: Arc<RequestDescriptor>,
        arguments: Arguments,
        limit: Option<u32>,
    ) -> Paged {
        Paged::new(self.clone(), descriptor, arguments, limit)
    }

    /// [`paged`](Self::paged) for the catalog operation called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownOperation`] for an unregistered name.
    pub fn paged_named(
        &self,
        catalog: &Catalog,
        name: &str,
        arguments: Arguments,
        limit: Option<u32>,
    ) -> Result<Paged> {
        Ok(self.paged(catalog.get(name)?, arguments, limit))
    }
}

/// Apply the descriptor's fallback to a failed call.
pub(crate) fn recover(descriptor: &RequestDescriptor, err: Error) -> Result<Decoded> {
    let fallback = descriptor.fallback();
    match fallback.resolve(&err) {
        Some(substitute) => {
            debug!(
                operation = descriptor.name(),
                status = err.status(),
                policy = %fallback.policy(),
                "failure replaced by fallback"
            );
            Ok(substitute)
        }
        None => Err(err),
    }
}
