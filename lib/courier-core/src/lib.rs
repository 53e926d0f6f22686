//! Core types for the courier API-client runtime.
//!
//! Every remote operation is described by a [`RequestDescriptor`]: method,
//! path template, parameter bindings, body strategy, fallback, response
//! selector and shape, pagination. Descriptors are plain values grouped in a
//! [`Catalog`]; nothing here performs I/O.
//!
//! - [`bind`] resolves call-time [`Arguments`] against a descriptor into a
//!   [`ResolvedRequest`]
//! - [`Fallback`] turns covered failures into substitute values
//! - [`decode`] unwraps the selector field and checks the [`ResultShape`]
//! - [`Pagination`] and [`PagingState`] drive marker-based listings
//! - [`HttpClient`] is the transport seam implemented by the `courier` crate
//!
//! # Example
//!
//! ```
//! use courier_core::{Arguments, Fallback, FallbackPolicy, ParameterBinding, RequestDescriptor, bind};
//!
//! let list_samples = RequestDescriptor::get("list_samples", "/v2/meters/{meter}")
//!     .bind(ParameterBinding::path("meter"))
//!     .bind(ParameterBinding::query("limit"))
//!     .fallback(Fallback::on_not_found(FallbackPolicy::EmptyList))
//!     .shape(courier_core::ResultShape::Sequence)
//!     .build()
//!     .expect("valid descriptor");
//!
//! let args = Arguments::new().with("meter", "cpu_util").with("limit", 10_u32);
//! let request = bind(&list_samples, &args).expect("bound");
//! assert_eq!(request.path(), "/v2/meters/cpu_util");
//! assert_eq!(request.query_value("limit"), Some("10"));
//! ```

mod arguments;
mod binder;
mod binding;
mod body;
mod catalog;
mod client;
mod decoder;
mod descriptor;
mod error;
mod fallback;
mod literal;
mod method;
mod paging;
mod path_template;
pub mod prelude;
mod request;
mod response;

pub use arguments::{Arguments, ParamValue};
pub use binder::{ResolvedRequest, bind};
pub use binding::{ParamLocation, ParameterBinding, Transform};
pub use body::{ContentType, from_json, from_value, to_json};
pub use catalog::{Catalog, CatalogBuilder};
pub use client::HttpClient;
pub use decoder::{Decoded, ResultShape, decode};
pub use descriptor::{BodyStrategy, DescriptorBuilder, RequestDescriptor};
pub use error::{Error, Result};
pub use fallback::{Fallback, FallbackPolicy, StatusMatch};
pub use literal::LiteralBody;
pub use method::Method;
pub use paging::{Page, PagingConvention, PagingState, Pagination};
pub use path_template::PathTemplate;
pub use request::{Request, RequestBuilder};
pub use response::Response;

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
