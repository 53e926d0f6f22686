//! Parameter bindings: how a logical argument reaches the wire.

use std::fmt;

/// Parameter location in the HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    /// Path parameter (e.g., `/stacks/{id}`)
    Path,
    /// Query parameter (e.g., `?limit=10`)
    Query,
    /// Header parameter
    Header,
    /// A field of the request body
    Body,
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
            Self::Body => write!(f, "body"),
        }
    }
}

/// Rendering applied to a value before it is placed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Transform {
    /// Natural rendering of the value.
    #[default]
    Identity,
    /// Lowercase string, used for enum-like values (`ACTIVE` -> `active`).
    Lowercase,
    /// Timestamps as ISO 8601 (`2024-05-01T10:00:00Z`).
    Iso8601,
    /// Lists joined with commas instead of repeated keys.
    Csv,
}

/// Relates a logical parameter name to its role in the request.
///
/// Held by a [`RequestDescriptor`](crate::RequestDescriptor) and read-only at
/// call time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterBinding {
    name: String,
    key: Option<String>,
    location: ParamLocation,
    transform: Transform,
    required: bool,
}

impl ParameterBinding {
    fn new(name: impl Into<String>, location: ParamLocation) -> Self {
        Self {
            name: name.into(),
            key: None,
            location,
            transform: Transform::Identity,
            required: matches!(location, ParamLocation::Path),
        }
    }

    /// A path placeholder. Always required.
    #[must_use]
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Path)
    }

    /// An optional query parameter.
    #[must_use]
    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Query)
    }

    /// An optional per-call header.
    #[must_use]
    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Header)
    }

    /// An optional body field.
    #[must_use]
    pub fn body(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Body)
    }

    /// Send under a different wire name (query key, header name or body field).
    #[must_use]
    pub fn rename(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Apply a transform to the value.
    #[must_use]
    pub const fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Fail the call when no value is supplied.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Logical name, as used in [`Arguments`](crate::Arguments).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wire name: query key, header name or body field.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }

    /// Where the value goes.
    #[must_use]
    pub const fn location(&self) -> ParamLocation {
        self.location
    }

    /// Rendering applied to the value.
    #[must_use]
    pub const fn transform_kind(&self) -> Transform {
        self.transform
    }

    /// Whether a missing value fails the call.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }
}
