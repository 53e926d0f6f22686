//! Lazy paged listings.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::{StreamExt, TryStreamExt, stream};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use courier_core::{PagingState, bind};

use crate::invoker::recover;
use crate::{ApiInvoker, Arguments, HttpClient, RequestDescriptor, Result};

type ElementStream = Pin<Box<dyn Stream<Item = Result<Value>> + Send>>;

/// Every element of a paginated listing, fetched one page at a time.
///
/// The first poll sends the first request; the next page is only requested
/// once the current one has been consumed. A failed follow-up page is yielded
/// as an error and ends the stream, elements already yielded stay valid.
///
/// The descriptor's fallback only covers the first page: a listing that
/// does not exist is empty, a listing that breaks halfway is an error.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use courier::{ApiInvoker, Arguments, HyperClient, Pagination, RequestDescriptor};
///
/// # async fn run() -> courier::Result<()> {
/// let list_volumes = RequestDescriptor::get("list_volumes", "/volumes/detail")
///     .selector("volumes")
///     .paginate(Pagination::next_link("volumes_links"))
///     .build()?;
///
/// let volume = ApiInvoker::new(HyperClient::new(), "https://volume.example.com/v3/tenant")?;
/// let all = volume
///     .paged(Arc::new(list_volumes), Arguments::new(), Some(100))
///     .collect_all()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Paged {
    inner: ElementStream,
}

impl std::fmt::Debug for Paged {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paged").finish_non_exhaustive()
    }
}

struct Cursor<C> {
    invoker: ApiInvoker<C>,
    descriptor: Arc<RequestDescriptor>,
    arguments: Arguments,
    state: PagingState,
    buffer: VecDeque<Value>,
    started: bool,
}

impl<C: HttpClient> Cursor<C> {
    async fn next_element(mut self) -> Option<(Result<Value>, Self)> {
        loop {
            if let Some(element) = self.buffer.pop_front() {
                return Some((Ok(element), self));
            }
            if self.state.is_exhausted() {
                return None;
            }
            match self.fetch_page().await {
                Ok(items) => self.buffer.extend(items),
                Err(err) => {
                    self.state.finish();
                    return Some((Err(err), self));
                }
            }
        }
    }

    async fn fetch_page(&mut self) -> Result<Vec<Value>> {
        let pagination = self.descriptor.pagination();
        let mut resolved = bind(&self.descriptor, &self.arguments)?;
        if let Some(marker) = self.state.marker() {
            resolved.set_query(pagination.marker_query_param(), marker);
        }
        if let Some(limit) = self.state.limit() {
            resolved.set_query(pagination.limit_query_param(), limit.to_string());
        }

        trace!(
            operation = self.descriptor.name(),
            marker = self.state.marker(),
            "fetching page"
        );

        let first = !self.started;
        self.started = true;

        let body = match self.invoker.send(resolved).await {
            Ok(body) => body,
            Err(err) if first => {
                let substitute = recover(&self.descriptor, err)?;
                self.state.finish();
                return Ok(substitute.into_sequence().unwrap_or_default());
            }
            Err(err) => return Err(err),
        };

        let page = pagination.decode_page(&body, self.descriptor.selector(), self.state.limit())?;
        self.state.advance(page.next_marker);
        Ok(page.items)
    }
}

impl Paged {
    pub(crate) fn new<C>(
        invoker: ApiInvoker<C>,
        descriptor: Arc<RequestDescriptor>,
        arguments: Arguments,
        limit: Option<u32>,
    ) -> Self
    where
        C: HttpClient + Clone + 'static,
    {
        let cursor = Cursor {
            invoker,
            descriptor,
            arguments,
            state: PagingState::new(limit),
            buffer: VecDeque::new(),
            started: false,
        };
        Self {
            inner: Box::pin(stream::unfold(cursor, Cursor::next_element)),
        }
    }

    /// Drain the listing into a vector, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first failure; elements fetched before it are dropped.
    pub async fn collect_all(self) -> Result<Vec<Value>> {
        self.try_collect().await
    }

    /// Deserialize each element into `T`.
    pub fn typed<T: DeserializeOwned>(self) -> impl Stream<Item = Result<T>> + Send + Unpin {
        self.map(|element| element.and_then(courier_core::from_value))
    }
}

impl Stream for Paged {
    type Item = Result<Value>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
