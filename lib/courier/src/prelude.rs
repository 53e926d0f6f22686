//! Prelude module for convenient imports.
//!
//! ```
//! use courier::prelude::*;
//! ```

pub use crate::{
    ApiInvoker, Arguments, Catalog, ClientConfig, Decoded, Error, Fallback, FallbackPolicy,
    HttpClient, HyperClient, Method, Paged, Pagination, ParamValue, ParameterBinding,
    RequestDescriptor, Result, ResultShape, StatusMatch, Transform,
};
pub use serde::{Deserialize, Serialize};
