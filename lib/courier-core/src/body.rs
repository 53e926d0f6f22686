//! Body serialization utilities.

use bytes::Bytes;

use crate::Result;

/// Well-known media types for request and response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
    /// JSON patch documents (`application/openstack-images-v2.1-json-patch`).
    JsonPatch,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::PlainText => "text/plain",
            Self::OctetStream => "application/octet-stream",
            Self::JsonPatch => "application/openstack-images-v2.1-json-patch",
        }
    }

    /// Returns `true` if a media type string carries JSON.
    #[must_use]
    pub fn is_json(media_type: &str) -> bool {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        essence == "application/json"
            || essence.ends_with("+json")
            || essence.ends_with("json-patch")
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use courier_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Stack { stack_name: String }
///
/// let stack = Stack { stack_name: "web".to_string() };
/// let bytes = to_json(&stack).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"stack_name":"web"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// Uses `serde_path_to_error` so that a failure names the exact field that
/// did not match (e.g. `meters[3].unit`).
///
/// # Errors
///
/// Returns [`crate::Error::MalformedResponse`] if deserialization fails.
///
/// # Example
///
/// ```
/// use courier_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct Meter { name: String }
///
/// let bytes = br#"{"name":"cpu_util"}"#;
/// let meter: Meter = from_json(bytes).expect("deserialize");
/// assert_eq!(meter, Meter { name: "cpu_util".to_string() });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::malformed_response(e.path().to_string(), e.inner().to_string())
    })?;
    // Only whitespace may follow the value.
    deserializer
        .end()
        .map_err(|e| crate::Error::malformed_response(".", e.to_string()))?;
    Ok(value)
}

/// Convert an already parsed JSON value into a typed value, keeping the
/// failing path in the error.
///
/// # Errors
///
/// Returns [`crate::Error::MalformedResponse`] if the value does not match `T`.
pub fn from_value<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_path_to_error::deserialize(value).map_err(|e| {
        crate::Error::malformed_response(e.path().to_string(), e.inner().to_string())
    })
}
