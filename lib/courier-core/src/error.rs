//! Error types for courier.
//!
//! Every failure an operation can surface is one variant of [`Error`]. The
//! variants fall in four families:
//!
//! - configuration: a descriptor or catalog that can never work
//!   ([`Error::InvalidDescriptor`], [`Error::UnknownOperation`], [`Error::InvalidUrl`])
//! - argument: call-time values that cannot be bound
//!   ([`Error::MissingPathParameter`], [`Error::MissingParameter`],
//!   [`Error::UnsupportedParameterType`])
//! - transport: the request was sent (or attempted) and failed
//!   ([`Error::Http`], [`Error::Connection`], [`Error::Tls`], [`Error::Timeout`])
//! - decode: the response could not be turned into the declared shape
//!   ([`Error::MissingSelector`], [`Error::MalformedResponse`])
//!
//! None of them is retried by the core.

use derive_more::{Display, Error, From};

use crate::ParamLocation;

/// Main error type for courier operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// HTTP-level errors (non-2xx status codes not covered by a fallback).
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The transport refused the request as built.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// A request descriptor failed structural validation.
    #[display("invalid descriptor: {_0}")]
    #[from(skip)]
    InvalidDescriptor(#[error(not(source))] String),

    /// No descriptor is registered under the requested operation name.
    #[display("unknown operation: {_0}")]
    #[from(skip)]
    UnknownOperation(#[error(not(source))] String),

    /// A path placeholder had no value at call time.
    #[display("missing path parameter '{name}'")]
    #[from(skip)]
    MissingPathParameter {
        /// Placeholder name.
        #[error(not(source))]
        name: String,
    },

    /// A required query, header or body parameter had no value.
    #[display("missing {location} parameter '{name}'")]
    #[from(skip)]
    MissingParameter {
        /// Parameter name.
        name: String,
        /// Where the parameter was to be sent.
        #[error(not(source))]
        location: ParamLocation,
    },

    /// A value has no rendering for the location or transform it is bound to.
    #[display("parameter '{name}' cannot be rendered from a {kind} value")]
    #[from(skip)]
    UnsupportedParameterType {
        /// Parameter name.
        name: String,
        /// Kind of the offending value (e.g. `list`, `bool`).
        #[error(not(source))]
        kind: &'static str,
    },

    /// The response lacked the field the descriptor unwraps.
    #[display("response has no '{selector}' field")]
    #[from(skip)]
    MissingSelector {
        /// The selector field name.
        #[error(not(source))]
        selector: String,
    },

    /// The response body is not valid JSON or has the wrong shape.
    #[display("malformed response at '{path}': {message}")]
    #[from(skip)]
    MalformedResponse {
        /// JSON path to the error (e.g., "stacks[2].id").
        path: String,
        /// Error message.
        message: String,
    },

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an HTTP error from status code and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: None,
        }
    }

    /// Create an HTTP error with body.
    #[must_use]
    pub fn http_with_body(status: u16, message: impl Into<String>, body: bytes::Bytes) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: Some(body),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an invalid descriptor error.
    #[must_use]
    pub fn invalid_descriptor(message: impl Into<String>) -> Self {
        Self::InvalidDescriptor(message.into())
    }

    /// Create a missing path parameter error.
    #[must_use]
    pub fn missing_path_parameter(name: impl Into<String>) -> Self {
        Self::MissingPathParameter { name: name.into() }
    }

    /// Create a missing parameter error.
    #[must_use]
    pub fn missing_parameter(name: impl Into<String>, location: ParamLocation) -> Self {
        Self::MissingParameter {
            name: name.into(),
            location,
        }
    }

    /// Create an unsupported parameter type error.
    #[must_use]
    pub fn unsupported_parameter_type(name: impl Into<String>, kind: &'static str) -> Self {
        Self::UnsupportedParameterType {
            name: name.into(),
            kind,
        }
    }

    /// Create a missing selector error.
    #[must_use]
    pub fn missing_selector(selector: impl Into<String>) -> Self {
        Self::MissingSelector {
            selector: selector.into(),
        }
    }

    /// Create a malformed response error with path context.
    #[must_use]
    pub fn malformed_response(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` for errors caused by call-time arguments.
    #[must_use]
    pub const fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Self::MissingPathParameter { .. }
                | Self::MissingParameter { .. }
                | Self::UnsupportedParameterType { .. }
        )
    }

    /// Returns `true` for errors in descriptors or catalogs.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDescriptor(_) | Self::UnknownOperation(_) | Self::InvalidUrl(_)
        )
    }

    /// Returns `true` for response decoding errors.
    #[must_use]
    pub const fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::MissingSelector { .. } | Self::MalformedResponse { .. }
        )
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns `true` if this is a 404 Not Found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Try to decode the HTTP error body as JSON.
    ///
    /// Cloud services usually describe failures in the body, e.g.
    /// `{"itemNotFound": {"code": 404, "message": "..."}}`.
    ///
    /// Returns `None` if there is no body or this is not an HTTP error.
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.body().map(|body| crate::from_json(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::http(404, "Not Found");
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");

        let err = Error::Timeout;
        assert_eq!(err.to_string(), "request timeout");

        let err = Error::missing_path_parameter("id");
        assert_eq!(err.to_string(), "missing path parameter 'id'");

        let err = Error::missing_parameter("since", ParamLocation::Query);
        assert_eq!(err.to_string(), "missing query parameter 'since'");

        let err = Error::unsupported_parameter_type("id", "list");
        assert_eq!(
            err.to_string(),
            "parameter 'id' cannot be rendered from a list value"
        );

        let err = Error::missing_selector("stacks");
        assert_eq!(err.to_string(), "response has no 'stacks' field");

        let err = Error::malformed_response("stacks[0].id", "invalid type: integer");
        assert_eq!(
            err.to_string(),
            "malformed response at 'stacks[0].id': invalid type: integer"
        );
    }

    #[test]
    fn error_status() {
        let err = Error::http(404, "Not Found");
        assert_eq!(err.status(), Some(404));
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert!(err.is_not_found());

        let err = Error::http(500, "Internal Server Error");
        assert!(err.is_server_error());
        assert!(!err.is_not_found());

        let err = Error::Timeout;
        assert_eq!(err.status(), None);
        assert!(!err.is_client_error());
    }

    #[test]
    fn error_families() {
        assert!(Error::missing_path_parameter("id").is_argument_error());
        assert!(Error::unsupported_parameter_type("x", "bool").is_argument_error());
        assert!(Error::invalid_descriptor("bad").is_configuration_error());
        assert!(Error::UnknownOperation("nope".into()).is_configuration_error());
        assert!(Error::missing_selector("meters").is_decode_error());
        assert!(!Error::Timeout.is_argument_error());
        assert!(Error::Timeout.is_timeout());
        assert!(Error::connection("refused").is_connection());
    }

    #[test]
    fn error_decode_body() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Fault {
            code: u16,
            message: String,
        }

        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct NotFound {
            #[serde(rename = "itemNotFound")]
            item_not_found: Fault,
        }

        let body = bytes::Bytes::from(r#"{"itemNotFound": {"code": 404, "message": "gone"}}"#);
        let err = Error::http_with_body(404, "Not Found", body);

        let decoded = err
            .decode_body::<NotFound>()
            .expect("should have body")
            .expect("should decode");
        assert_eq!(decoded.item_not_found.code, 404);
        assert_eq!(decoded.item_not_found.message, "gone");

        assert!(Error::http(404, "Not Found").decode_body::<NotFound>().is_none());
        assert!(Error::Timeout.decode_body::<NotFound>().is_none());
    }
}
