//! Prelude module for convenient imports.
//!
//! ```
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    Arguments, Catalog, Decoded, Error, Fallback, FallbackPolicy, HttpClient, Method, Pagination,
    ParamValue, ParameterBinding, RequestDescriptor, Result, ResultShape, StatusMatch, Transform,
};
