//! Response decoding: unwrap a selector field and check the declared shape.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::Value;

use crate::{Error, Result};

/// The shape a response body is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResultShape {
    /// A single JSON value (usually an object).
    #[default]
    Single,
    /// A JSON array.
    Sequence,
    /// The body bytes, untouched.
    Raw,
    /// A JSON object whose values are all strings (metadata maps).
    StringMap,
    /// Only success matters; the body is ignored.
    Acknowledge,
}

/// The value produced by one call.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A single JSON value; `Null` for empty bodies and null fallbacks.
    Object(Value),
    /// The elements of a listing.
    Sequence(Vec<Value>),
    /// Raw body bytes.
    Raw(Bytes),
    /// A string-to-string map.
    Strings(BTreeMap<String, String>),
    /// Success flag: `true` for an acknowledged call, `false` from a fallback.
    Flag(bool),
}

impl Decoded {
    /// Deserialize into a caller type.
    ///
    /// Sequences deserialize as arrays, flags as booleans, string maps as
    /// objects and raw bytes as a byte array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] with the failing path.
    pub fn into_typed<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        let value = match self {
            Self::Object(value) => value,
            Self::Sequence(items) => Value::Array(items),
            Self::Raw(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
            Self::Strings(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect(),
            ),
            Self::Flag(flag) => Value::Bool(flag),
        };
        crate::from_value(value)
    }

    /// The sequence elements, or `None` for other shapes.
    #[must_use]
    pub fn into_sequence(self) -> Option<Vec<Value>> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// The raw bytes, or `None` for other shapes.
    #[must_use]
    pub fn into_raw(self) -> Option<Bytes> {
        match self {
            Self::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// The flag, or `None` for other shapes.
    #[must_use]
    pub const fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns `true` for a null object or an empty sequence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Object(value) => value.is_null(),
            Self::Sequence(items) => items.is_empty(),
            Self::Raw(bytes) => bytes.is_empty(),
            Self::Strings(map) => map.is_empty(),
            Self::Flag(_) => false,
        }
    }
}

/// Parse a body as JSON, treating an empty body as `null`.
pub(crate) fn parse_body(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    crate::from_json(body)
}

/// Take the `selector` field out of a parsed body.
pub(crate) fn select(value: Value, selector: Option<&str>) -> Result<Value> {
    let Some(selector) = selector else {
        return Ok(value);
    };
    match value {
        Value::Object(mut map) => map
            .remove(selector)
            .ok_or_else(|| Error::missing_selector(selector)),
        _ => Err(Error::missing_selector(selector)),
    }
}

/// Decode a response body into the declared shape.
///
/// With a `selector`, the body must be an object carrying that field, and
/// only the field's value is decoded (`{"stacks": [...]}` -> `[...]`).
///
/// # Errors
///
/// - [`Error::MissingSelector`] if the selector field is absent
/// - [`Error::MalformedResponse`] if the body is not JSON or the value has
///   the wrong kind for `shape`
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use courier_core::{Decoded, ResultShape, decode};
///
/// let body = Bytes::from(r#"{"stacks": [{"id": "a"}]}"#);
/// let decoded = decode(&body, Some("stacks"), ResultShape::Sequence).expect("decode");
/// assert_eq!(decoded, Decoded::Sequence(vec![serde_json::json!({"id": "a"})]));
/// ```
pub fn decode(body: &Bytes, selector: Option<&str>, shape: ResultShape) -> Result<Decoded> {
    match shape {
        ResultShape::Raw => Ok(Decoded::Raw(body.clone())),
        ResultShape::Acknowledge => Ok(Decoded::Flag(true)),
        ResultShape::Single => {
            let value = select(parse_body(body)?, selector)?;
            Ok(Decoded::Object(value))
        }
        ResultShape::Sequence => {
            let value = select(parse_body(body)?, selector)?;
            match value {
                Value::Array(items) => Ok(Decoded::Sequence(items)),
                other => Err(wrong_kind(selector, "an array", &other)),
            }
        }
        ResultShape::StringMap => {
            let map = match select(parse_body(body)?, selector)? {
                Value::Object(map) => map,
                other => return Err(wrong_kind(selector, "an object", &other)),
            };
            map.into_iter()
                .map(|(key, value)| match value {
                    Value::String(s) => Ok((key, s)),
                    other => Err(Error::malformed_response(
                        key,
                        format!("expected a string, found {}", json_kind(&other)),
                    )),
                })
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Decoded::Strings)
        }
    }
}

fn wrong_kind(selector: Option<&str>, expected: &str, found: &Value) -> Error {
    Error::malformed_response(
        selector.unwrap_or("."),
        format!("expected {expected}, found {}", json_kind(found)),
    )
}

pub(crate) const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn trailing_content_is_malformed() {
        let body = Bytes::from(r#"{"stacks": [{"id": "a"}]} <html>oops</html>"#);
        let err = decode(&body, Some("stacks"), ResultShape::Sequence).expect_err("trailing");
        assert!(matches!(err, Error::MalformedResponse { .. }));

        let body = Bytes::from("{\"id\": \"a\"}\n  \n");
        let decoded = decode(&body, None, ResultShape::Single).expect("trailing whitespace");
        assert_eq!(decoded, Decoded::Object(json!({"id": "a"})));
    }

    #[test]
    fn unwraps_selector_into_sequence() {
        let body = Bytes::from(r#"{"meters": [{"name": "cpu"}, {"name": "disk"}], "links": []}"#);
        let decoded = decode(&body, Some("meters"), ResultShape::Sequence).expect("decode");
        assert_eq!(
            decoded,
            Decoded::Sequence(vec![json!({"name": "cpu"}), json!({"name": "disk"})])
        );
    }

    #[test]
    fn decodes_whole_body_without_selector() {
        let body = Bytes::from(r#"[1, 2, 3]"#);
        let decoded = decode(&body, None, ResultShape::Sequence).expect("decode");
        assert_eq!(decoded, Decoded::Sequence(vec![json!(1), json!(2), json!(3)]));

        let body = Bytes::from(r#"{"id": "abc"}"#);
        let decoded = decode(&body, None, ResultShape::Single).expect("decode");
        assert_eq!(decoded, Decoded::Object(json!({"id": "abc"})));
    }

    #[test]
    fn missing_selector_is_an_error() {
        let body = Bytes::from(r#"{"stack": {}}"#);
        let err = decode(&body, Some("stacks"), ResultShape::Sequence).expect_err("missing");
        assert!(matches!(err, Error::MissingSelector { ref selector } if selector == "stacks"));

        let body = Bytes::from(r#"[]"#);
        let err = decode(&body, Some("stacks"), ResultShape::Sequence).expect_err("not object");
        assert!(matches!(err, Error::MissingSelector { .. }));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let body = Bytes::from("<html>502 Bad Gateway</html>");
        let err = decode(&body, Some("stacks"), ResultShape::Sequence).expect_err("malformed");
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[test]
    fn wrong_kind_is_malformed() {
        let body = Bytes::from(r#"{"stacks": {"id": "a"}}"#);
        let err = decode(&body, Some("stacks"), ResultShape::Sequence).expect_err("kind");
        assert_eq!(
            err.to_string(),
            "malformed response at 'stacks': expected an array, found an object"
        );
    }

    #[test]
    fn string_maps() {
        let body = Bytes::from(r#"{"metadata": {"owner": "ops", "tier": "web"}}"#);
        let decoded = decode(&body, Some("metadata"), ResultShape::StringMap).expect("decode");
        let map = match decoded {
            Decoded::Strings(map) => map,
            other => panic!("expected strings, got {other:?}"),
        };
        assert_eq!(map.get("owner").map(String::as_str), Some("ops"));
        assert_eq!(map.len(), 2);

        let body = Bytes::from(r#"{"metadata": {"size": 3}}"#);
        let err = decode(&body, Some("metadata"), ResultShape::StringMap).expect_err("number");
        assert!(err.to_string().contains("'size'"));
    }

    #[test]
    fn raw_and_acknowledge_ignore_content() {
        let body = Bytes::from_static(b"\x00\x01binary");
        assert_eq!(
            decode(&body, None, ResultShape::Raw).expect("raw"),
            Decoded::Raw(body.clone())
        );
        assert_eq!(
            decode(&body, None, ResultShape::Acknowledge).expect("ack"),
            Decoded::Flag(true)
        );
    }

    #[test]
    fn empty_body_is_null() {
        let decoded = decode(&Bytes::new(), None, ResultShape::Single).expect("empty");
        assert_eq!(decoded, Decoded::Object(Value::Null));
        assert!(decoded.is_empty());
    }

    #[test]
    fn into_typed_converts_each_shape() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Meter {
            name: String,
        }

        let meters: Vec<Meter> = Decoded::Sequence(vec![json!({"name": "cpu"})])
            .into_typed()
            .expect("meters");
        assert_eq!(meters, vec![Meter { name: "cpu".into() }]);

        let none: Option<Meter> = Decoded::Object(Value::Null).into_typed().expect("null");
        assert_eq!(none, None);

        let deleted: bool = Decoded::Flag(false).into_typed().expect("flag");
        assert!(!deleted);

        let empty: Vec<Meter> = Decoded::Sequence(Vec::new()).into_typed().expect("empty");
        assert!(empty.is_empty());
    }
}
