//! Call-time argument values.
//!
//! [`Arguments`] is what a caller hands to an operation: named
//! [`ParamValue`]s plus, for structured bodies, an options object.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::{Error, Result, Transform};

/// A single argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Explicitly absent. Treated exactly like a missing argument.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    Str(String),
    /// Point in time, rendered with [`Transform::Iso8601`] or as RFC 3339.
    Timestamp(DateTime<Utc>),
    /// Homogeneous list, e.g. repeated query values.
    List(Vec<ParamValue>),
    /// Arbitrary JSON, only usable as a body field.
    Json(Value),
}

impl ParamValue {
    /// Short name of the value kind, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::List(_) => "list",
            Self::Json(_) => "json",
        }
    }

    /// Returns `true` for [`ParamValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert a JSON value. Arrays become lists, objects stay JSON.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            Value::String(s) => Self::Str(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            object @ Value::Object(_) => Self::Json(object),
        }
    }

    /// Render a scalar as text for a path segment, header or query value.
    ///
    /// `name` is only used to build the error.
    pub fn render(&self, name: &str, transform: Transform) -> Result<String> {
        let unsupported = || Error::unsupported_parameter_type(name, self.kind());
        match (transform, self) {
            (Transform::Csv, Self::List(items)) => items
                .iter()
                .map(|item| item.render(name, Transform::Identity))
                .collect::<Result<Vec<_>>>()
                .map(|parts| parts.join(",")),
            (Transform::Lowercase, Self::Str(s)) => Ok(s.to_lowercase()),
            (Transform::Lowercase, Self::Bool(b)) => Ok(b.to_string()),
            (Transform::Lowercase, _) => Err(unsupported()),
            (Transform::Iso8601, Self::Timestamp(ts)) => Ok(iso8601(ts)),
            (Transform::Iso8601, Self::Str(s)) => Ok(s.clone()),
            (Transform::Iso8601, _) => Err(unsupported()),
            (_, Self::Bool(b)) => Ok(b.to_string()),
            (_, Self::Int(i)) => Ok(i.to_string()),
            (_, Self::Float(f)) => Ok(f.to_string()),
            (_, Self::Str(s)) => Ok(s.clone()),
            (_, Self::Timestamp(ts)) => Ok(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            (_, Self::Null | Self::List(_) | Self::Json(_)) => Err(unsupported()),
        }
    }

    /// Render as query values: lists expand into one value per element
    /// unless the transform joins them.
    pub fn render_all(&self, name: &str, transform: Transform) -> Result<Vec<String>> {
        match (transform, self) {
            (Transform::Csv, _) => self.render(name, transform).map(|v| vec![v]),
            (_, Self::List(items)) => items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| item.render(name, transform))
                .collect(),
            _ => self.render(name, transform).map(|v| vec![v]),
        }
    }

    /// Render as a JSON body field.
    pub fn to_json(&self, name: &str, transform: Transform) -> Result<Value> {
        match (transform, self) {
            (_, Self::Null) => Ok(Value::Null),
            (_, Self::Json(value)) => Ok(value.clone()),
            (Transform::Csv | Transform::Lowercase | Transform::Iso8601, _) => {
                self.render(name, transform).map(Value::String)
            }
            (Transform::Identity, Self::Bool(b)) => Ok(Value::Bool(*b)),
            (Transform::Identity, Self::Int(i)) => Ok(Value::from(*i)),
            (Transform::Identity, Self::Float(f)) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .ok_or_else(|| Error::unsupported_parameter_type(name, self.kind())),
            (Transform::Identity, Self::Str(s)) => Ok(Value::String(s.clone())),
            (Transform::Identity, Self::Timestamp(ts)) => Ok(Value::String(iso8601(ts))),
            (Transform::Identity, Self::List(items)) => items
                .iter()
                .map(|item| item.to_json(name, Transform::Identity))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
        }
    }
}

fn iso8601(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for ParamValue {
            fn from(value: $ty) -> Self {
                Self::Int(i64::from(value))
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Named arguments for one call.
///
/// Values are looked up by the logical name of a
/// [`ParameterBinding`](crate::ParameterBinding). A [`ParamValue::Null`] is
/// the same as not supplying the argument at all.
///
/// # Example
///
/// ```
/// use courier_core::Arguments;
///
/// let args = Arguments::new()
///     .with("name", "s1")
///     .with("id", "abc")
///     .with("limit", Some(20_u32));
/// assert!(args.get("limit").is_some());
/// assert!(args.get("marker").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: BTreeMap<String, ParamValue>,
    body: Option<Map<String, Value>>,
}

impl Arguments {
    /// No arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn a serializable options object into named arguments, one per
    /// top-level field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedParameterType`] if `options` does not
    /// serialize to a JSON object.
    pub fn from_options<T: serde::Serialize>(options: &T) -> Result<Self> {
        let map = to_object("options", options)?;
        let values = map
            .into_iter()
            .map(|(name, value)| (name, ParamValue::from_json(value)))
            .collect();
        Ok(Self { values, body: None })
    }

    /// Add a named value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a named value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Attach the object used by structured bodies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedParameterType`] if `body` does not
    /// serialize to a JSON object.
    pub fn with_body<T: serde::Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(to_object("body", body)?);
        Ok(self)
    }

    /// Merge another set of arguments; `other` wins on name collisions.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.values.extend(other.values);
        if other.body.is_some() {
            self.body = other.body;
        }
        self
    }

    /// The value supplied for `name`, if any and not null.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name).filter(|value| !value.is_null())
    }

    /// The structured body object, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Map<String, Value>> {
        self.body.as_ref()
    }

    /// Names of all supplied values, including nulls.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

fn to_object<T: serde::Serialize>(name: &str, value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::unsupported_parameter_type(
            name,
            ParamValue::from_json(other).kind(),
        )),
    }
}
