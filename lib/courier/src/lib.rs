//! Descriptor-driven HTTP API clients.
//!
//! Each remote operation is a [`RequestDescriptor`] value. An [`ApiInvoker`]
//! binds call-time [`Arguments`] into a request, sends it through an
//! [`HttpClient`], then either decodes the response into the declared
//! [`ResultShape`] or hands the failure to the descriptor's [`Fallback`].
//! Paginated listings come back as a lazy [`Paged`] stream.
//!
//! [`HyperClient`] is the bundled transport: hyper-util, rustls, and tower
//! middleware for logging, retries and authentication.
//!
//! # Example
//!
//! ```no_run
//! use courier::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! struct Meter {
//!     name: String,
//!     unit: String,
//! }
//!
//! # async fn run() -> courier::Result<()> {
//! let list_meters = RequestDescriptor::get("list_meters", "/v2/meters")
//!     .bind(ParameterBinding::query("resource_id").rename("q.value"))
//!     .shape(ResultShape::Sequence)
//!     .fallback(Fallback::on_not_found(FallbackPolicy::EmptyList))
//!     .build()?;
//!
//! let client = HyperClient::builder().with_token_auth("gAAAAABk-token").build();
//! let metering = ApiInvoker::new(client, "https://metering.example.com:8777")?;
//!
//! let args = Arguments::new().with("resource_id", "inst-42");
//! let meters: Vec<Meter> = metering.call(&list_meters, &args).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod connector;
mod invoker;
pub mod middleware;
mod paged;
pub mod prelude;

pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_USER_AGENT};
pub use invoker::ApiInvoker;
pub use paged::Paged;

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use courier_core::{
    Arguments, BodyStrategy, Catalog, CatalogBuilder, ContentType, Decoded, DescriptorBuilder,
    Error, Fallback, FallbackPolicy, HttpClient, LiteralBody, Method, Page, PagingConvention,
    PagingState, Pagination, ParamLocation, ParamValue, ParameterBinding, PathTemplate, Request,
    RequestBuilder, RequestDescriptor, ResolvedRequest, Response, Result, ResultShape,
    StatusMatch, Transform, bind, decode, from_json, from_value, to_json,
};

// Re-export http types for status codes and headers
pub use courier_core::{StatusCode, header};

pub use url;
