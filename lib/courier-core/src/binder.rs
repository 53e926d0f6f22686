//! Parameter binding: descriptor + arguments -> concrete request.

use std::collections::BTreeMap;

use bytes::Bytes;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::de::IgnoredAny;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    Arguments, BodyStrategy, ContentType, Error, LiteralBody, Method, ParamLocation,
    ParameterBinding, Request, RequestDescriptor, Result, Transform,
};

// Everything but unreserved characters and sub-delimiters; `/` is encoded so
// a value never spans two segments.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%')
    .add(b'^')
    .add(b'|')
    .add(b'[')
    .add(b']');

/// A request with every parameter resolved, not yet tied to a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: BTreeMap<String, String>,
    body: Option<Bytes>,
}

impl ResolvedRequest {
    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Resolved, percent-encoded path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query pairs in emission order.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Single query value by key (first occurrence).
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Headers, including `Content-Type` when a body is present.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Serialized body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Content type of the body, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.body.as_ref().and(self.header("Content-Type"))
    }

    /// Replace every occurrence of `key` in the query with a single pair.
    ///
    /// Used to inject paging markers while keeping the original filters.
    pub fn set_query(&mut self, key: &str, value: impl Into<String>) {
        self.query.retain(|(k, _)| k != key);
        self.query.push((key.to_string(), value.into()));
    }

    /// Attach to a base URL.
    ///
    /// The base URL's own path is kept as a prefix, so an endpoint such as
    /// `https://volume.example.com/v3/{project}` works as expected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the joined URL does not parse.
    pub fn into_request(self, base_url: &url::Url) -> Result<Request<Bytes>> {
        let mut url = base_url.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}{}", self.path));
        url.set_query(None);
        url.set_fragment(None);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }

        let mut builder = Request::builder(self.method, url).headers(self.headers);
        if let Some(body) = self.body {
            builder = builder.body(body);
        }
        Ok(builder.build())
    }
}

/// Resolve call-time arguments against a descriptor.
///
/// - path placeholders are replaced with percent-encoded values
/// - query pairs follow binding declaration order, null values are skipped
/// - static headers come first, per-call header bindings override them
/// - the body follows the descriptor's [`BodyStrategy`]
///
/// The result only depends on the inputs: binding the same descriptor and
/// arguments twice gives equal requests.
///
/// # Errors
///
/// - [`Error::MissingPathParameter`] for a placeholder without a value
/// - [`Error::MissingParameter`] for a required binding without a value
/// - [`Error::UnsupportedParameterType`] for a value that cannot be rendered
///   where it is bound
///
/// # Example
///
/// ```
/// use courier_core::{Arguments, ParameterBinding, RequestDescriptor, bind};
///
/// let descriptor = RequestDescriptor::get("get_stack", "/stacks/{name}/{id}")
///     .bind(ParameterBinding::path("name"))
///     .bind(ParameterBinding::path("id"))
///     .build()
///     .expect("valid");
///
/// let args = Arguments::new().with("name", "s1").with("id", "abc");
/// let request = bind(&descriptor, &args).expect("bound");
/// assert_eq!(request.path(), "/stacks/s1/abc");
/// ```
pub fn bind(descriptor: &RequestDescriptor, arguments: &Arguments) -> Result<ResolvedRequest> {
    let path = descriptor.path().render(|name| {
        let value = arguments
            .get(name)
            .ok_or_else(|| Error::missing_path_parameter(name))?;
        let transform = descriptor
            .binding(name)
            .map_or(Transform::Identity, ParameterBinding::transform_kind);
        let rendered = value.render(name, transform)?;
        Ok(utf8_percent_encode(&rendered, PATH_SEGMENT_ENCODE_SET).to_string())
    })?;

    let mut query = Vec::new();
    for binding in descriptor.bindings_at(ParamLocation::Query) {
        let Some(value) = lookup(binding, arguments)? else {
            continue;
        };
        for rendered in value.render_all(binding.name(), binding.transform_kind())? {
            query.push((binding.key().to_string(), rendered));
        }
    }

    let mut headers = BTreeMap::new();
    for (name, value) in descriptor.static_headers() {
        set_header(&mut headers, name, value.clone());
    }
    set_header(&mut headers, "Accept", descriptor.produces().to_string());
    for binding in descriptor.bindings_at(ParamLocation::Header) {
        let Some(value) = lookup(binding, arguments)? else {
            continue;
        };
        let rendered = value.render(binding.name(), binding.transform_kind())?;
        set_header(&mut headers, binding.key(), rendered);
    }

    let body = match descriptor.body() {
        BodyStrategy::None => None,
        BodyStrategy::Literal(literal) => Some((
            render_literal(descriptor, literal, arguments)?,
            literal.content_type().to_string(),
        )),
        BodyStrategy::Structured { root } => Some((
            render_structured(descriptor, root.as_deref(), arguments)?,
            descriptor.consumes().to_string(),
        )),
    };
    let body = body.map(|(bytes, content_type)| {
        set_header(&mut headers, "Content-Type", content_type);
        bytes
    });

    debug!(
        operation = descriptor.name(),
        method = %descriptor.method(),
        path = %path,
        "bound request"
    );

    Ok(ResolvedRequest {
        method: descriptor.method(),
        path,
        query,
        headers,
        body,
    })
}

/// Value for a binding, enforcing `required`.
fn lookup<'a>(
    binding: &ParameterBinding,
    arguments: &'a Arguments,
) -> Result<Option<&'a crate::ParamValue>> {
    match arguments.get(binding.name()) {
        Some(value) => Ok(Some(value)),
        None if binding.is_required() => Err(Error::missing_parameter(
            binding.name(),
            binding.location(),
        )),
        None => Ok(None),
    }
}

fn render_literal(
    descriptor: &RequestDescriptor,
    literal: &LiteralBody,
    arguments: &Arguments,
) -> Result<Bytes> {
    let json = ContentType::is_json(literal.content_type());
    let mut substituted: Vec<(String, &'static str)> = Vec::new();
    let rendered = literal.render(|name| {
        let transform = descriptor
            .binding(name)
            .map_or(Transform::Identity, ParameterBinding::transform_kind);
        let value = arguments
            .get(name)
            .ok_or_else(|| Error::missing_parameter(name, ParamLocation::Body))?;
        let text = value.render(name, transform)?;
        substituted.push((name.to_string(), value.kind()));
        Ok(if json { escape_json(&text) } else { text })
    })?;

    // A value dropped into an unquoted slot must still leave valid JSON.
    if json && serde_json::from_str::<IgnoredAny>(&rendered).is_err() {
        let (name, kind) = substituted
            .iter()
            .find(|(_, kind)| *kind == "string")
            .or_else(|| substituted.first())
            .cloned()
            .unwrap_or_else(|| (descriptor.name().to_string(), "string"));
        return Err(Error::unsupported_parameter_type(name, kind));
    }
    Ok(Bytes::from(rendered))
}

/// Insert a header, replacing any entry whose name differs only in case.
fn set_header(headers: &mut BTreeMap<String, String>, name: &str, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}

/// Escape text for use inside a JSON string literal, without the quotes.
fn escape_json(text: &str) -> String {
    let quoted = Value::String(text.to_string()).to_string();
    quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .map_or_else(|| quoted.clone(), str::to_string)
}

fn render_structured(
    descriptor: &RequestDescriptor,
    root: Option<&str>,
    arguments: &Arguments,
) -> Result<Bytes> {
    let mut object: Map<String, Value> = arguments.body().cloned().unwrap_or_default();

    for binding in descriptor.bindings_at(ParamLocation::Body) {
        let Some(value) = lookup(binding, arguments)? else {
            continue;
        };
        let json = value.to_json(binding.name(), binding.transform_kind())?;
        object.insert(binding.key().to_string(), json);
    }

    object.retain(|_, value| !value.is_null());

    let document = match root {
        Some(root) => {
            let mut wrapper = Map::new();
            wrapper.insert(root.to_string(), Value::Object(object));
            Value::Object(wrapper)
        }
        None => Value::Object(object),
    };
    crate::to_json(&document)
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::ParamValue;

    fn stack_descriptor() -> RequestDescriptor {
        RequestDescriptor::get("get_stack", "/stacks/{name}/{id}")
            .bind(ParameterBinding::path("name"))
            .bind(ParameterBinding::path("id"))
            .build()
            .expect("valid")
    }

    fn body_json(request: &ResolvedRequest) -> Value {
        serde_json::from_slice(request.body().expect("body")).expect("json")
    }

    #[test]
    fn substitutes_path_parameters() {
        let args = Arguments::new().with("name", "s1").with("id", "abc");
        let request = bind(&stack_descriptor(), &args).expect("bound");
        check!(request.path() == "/stacks/s1/abc");
        check!(request.method() == Method::Get);
    }

    #[test]
    fn missing_path_parameter() {
        let args = Arguments::new().with("name", "s1");
        let err = bind(&stack_descriptor(), &args).expect_err("id missing");
        let_assert!(Error::MissingPathParameter { name } = err);
        check!(name == "id");

        let args = Arguments::new().with("name", "s1").with("id", None::<String>);
        let err = bind(&stack_descriptor(), &args).expect_err("id null");
        check!(err.is_argument_error());
    }

    #[test]
    fn path_values_are_percent_encoded() {
        let args = Arguments::new().with("name", "my stack/1").with("id", "a?b");
        let request = bind(&stack_descriptor(), &args).expect("bound");
        check!(request.path() == "/stacks/my%20stack%2F1/a%3Fb");
    }

    #[test]
    fn list_cannot_be_a_path_segment() {
        let args = Arguments::new()
            .with("name", vec!["a", "b"])
            .with("id", "abc");
        let err = bind(&stack_descriptor(), &args).expect_err("list");
        check!(matches!(err, Error::UnsupportedParameterType { kind: "list", .. }));
    }

    #[test]
    fn query_follows_declaration_order_and_skips_nulls() {
        let descriptor = RequestDescriptor::get("list_volumes", "/volumes")
            .bind(ParameterBinding::query("status").transform(Transform::Lowercase))
            .bind(ParameterBinding::query("name"))
            .bind(ParameterBinding::query("sort_key"))
            .bind(ParameterBinding::query("tags"))
            .build()
            .expect("valid");

        let args = Arguments::new()
            .with("tags", vec!["db", "prod"])
            .with("sort_key", "created_at")
            .with("name", None::<String>)
            .with("status", "AVAILABLE");
        let request = bind(&descriptor, &args).expect("bound");

        check!(
            request.query()
                == [
                    ("status".to_string(), "available".to_string()),
                    ("sort_key".to_string(), "created_at".to_string()),
                    ("tags".to_string(), "db".to_string()),
                    ("tags".to_string(), "prod".to_string()),
                ]
        );
    }

    #[test]
    fn query_transforms() {
        let descriptor = RequestDescriptor::get("samples", "/v2/meters/{meter}")
            .bind(ParameterBinding::path("meter"))
            .bind(
                ParameterBinding::query("since")
                    .rename("q.value")
                    .transform(Transform::Iso8601),
            )
            .bind(ParameterBinding::query("fields").transform(Transform::Csv))
            .build()
            .expect("valid");

        let since = Utc
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .single()
            .expect("date");
        let args = Arguments::new()
            .with("meter", "cpu_util")
            .with("since", since)
            .with("fields", vec!["id", "name"]);
        let request = bind(&descriptor, &args).expect("bound");

        check!(request.query_value("q.value") == Some("2024-01-02T03:04:05Z"));
        check!(request.query_value("fields") == Some("id,name"));
    }

    #[test]
    fn required_query_parameter() {
        let descriptor = RequestDescriptor::get("search", "/search")
            .bind(ParameterBinding::query("q").required())
            .build()
            .expect("valid");
        let err = bind(&descriptor, &Arguments::new()).expect_err("missing");
        let_assert!(Error::MissingParameter { name, location } = err);
        check!(name == "q");
        check!(location == ParamLocation::Query);
    }

    #[test]
    fn per_call_headers_override_static_ones() {
        let descriptor = RequestDescriptor::get("list_stacks", "/stacks")
            .header("X-Openstack-Nova-Api-Version", "2.1")
            .header("X-Trace", "static")
            .bind(ParameterBinding::header("trace").rename("X-Trace"))
            .build()
            .expect("valid");

        let request = bind(&descriptor, &Arguments::new()).expect("bound");
        check!(request.header("X-Trace") == Some("static"));
        check!(request.header("Accept") == Some("application/json"));

        let request =
            bind(&descriptor, &Arguments::new().with("trace", "call")).expect("bound");
        check!(request.header("X-Trace") == Some("call"));
        check!(request.header("X-Openstack-Nova-Api-Version") == Some("2.1"));
    }

    #[test]
    fn header_overrides_ignore_case() {
        let descriptor = RequestDescriptor::post("create_stack", "/stacks")
            .header("x-trace", "static")
            .header("accept", "text/plain")
            .header("content-type", "text/plain")
            .bind(ParameterBinding::header("trace").rename("X-Trace"))
            .structured_body()
            .build()
            .expect("valid");
        let args = Arguments::new()
            .with("trace", "call")
            .with_body(&json!({"stack_name": "web"}))
            .expect("object");

        let request = bind(&descriptor, &args).expect("bound");
        let names: Vec<&str> = request.headers().keys().map(String::as_str).collect();
        check!(names == ["Accept", "Content-Type", "X-Trace"]);
        check!(request.header("x-trace") == Some("call"));
        check!(request.header("accept") == Some("application/json"));
        check!(request.content_type() == Some("application/json"));
    }

    #[test]
    fn no_body_strategy_never_emits_a_body() {
        let descriptor = RequestDescriptor::delete("delete_stack", "/stacks/{name}/{id}")
            .bind(ParameterBinding::path("name"))
            .bind(ParameterBinding::path("id"))
            .build()
            .expect("valid");
        let args = Arguments::new()
            .with("name", "s1")
            .with("id", "abc")
            .with("extra", "ignored")
            .with_body(&json!({"stack_name": "s1"}))
            .expect("object");

        let request = bind(&descriptor, &args).expect("bound");
        check!(request.body().is_none());
        check!(request.content_type().is_none());
        check!(request.header("Content-Type").is_none());
    }

    #[test]
    fn structured_body_omits_null_fields() {
        let descriptor = RequestDescriptor::post("create_environment", "/environments")
            .structured_body()
            .build()
            .expect("valid");
        let args = Arguments::new()
            .with_body(&json!({"name": "x", "hotEnvironment": null}))
            .expect("object");

        let request = bind(&descriptor, &args).expect("bound");
        check!(body_json(&request) == json!({"name": "x"}));
        check!(request.content_type() == Some("application/json"));
    }

    #[test]
    fn structured_body_from_options_struct() {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct CreateEnvironment {
            name: String,
            hot_environment: Option<String>,
            default_networks: Option<Value>,
        }

        let descriptor = RequestDescriptor::post("create_environment", "/environments")
            .structured_body()
            .build()
            .expect("valid");
        let args = Arguments::new()
            .with_body(&CreateEnvironment {
                name: "x".into(),
                hot_environment: None,
                default_networks: None,
            })
            .expect("object");
        let request = bind(&descriptor, &args).expect("bound");
        insta::assert_snapshot!(
            String::from_utf8_lossy(request.body().expect("body")),
            @r#"{"name":"x"}"#
        );
    }

    #[test]
    fn structured_body_with_root_and_bindings() {
        let descriptor = RequestDescriptor::post("create_volume", "/volumes")
            .bind(ParameterBinding::body("size").required())
            .bind(ParameterBinding::body("volume_type").rename("volume_type"))
            .bind(ParameterBinding::body("bootable"))
            .structured_body_under("volume")
            .build()
            .expect("valid");
        let args = Arguments::new()
            .with("size", 10_u32)
            .with("bootable", None::<bool>)
            .with_body(&json!({"name": "data", "description": null}))
            .expect("object");

        let request = bind(&descriptor, &args).expect("bound");
        check!(body_json(&request) == json!({"volume": {"name": "data", "size": 10}}));

        let err = bind(&descriptor, &Arguments::new()).expect_err("size required");
        check!(matches!(err, Error::MissingParameter { location: ParamLocation::Body, .. }));
    }

    #[test]
    fn literal_body_substitution() {
        let descriptor = RequestDescriptor::post("signal", "/stacks/{name}/{id}/actions")
            .bind(ParameterBinding::path("name"))
            .bind(ParameterBinding::path("id"))
            .bind(ParameterBinding::body("reason"))
            .literal_body(r#"{"suspend": null, "reason": "${reason}"}"#)
            .build()
            .expect("valid");
        let args = Arguments::new()
            .with("name", "s1")
            .with("id", "abc")
            .with("reason", r#"say "hi""#);

        let request = bind(&descriptor, &args).expect("bound");
        check!(body_json(&request) == json!({"suspend": null, "reason": "say \"hi\""}));

        let err = bind(
            &descriptor,
            &Arguments::new().with("name", "s1").with("id", "abc"),
        )
        .expect_err("reason missing");
        check!(err.is_argument_error());
    }

    #[test]
    fn literal_body_must_stay_valid_json() {
        let descriptor = RequestDescriptor::post("console_output", "/servers/{id}/action")
            .bind(ParameterBinding::path("id"))
            .bind(ParameterBinding::body("length"))
            .literal_body(r#"{"os-getConsoleOutput": {"length": ${length}}}"#)
            .build()
            .expect("valid");

        let args = Arguments::new().with("id", "vm-1").with("length", 50_u32);
        let request = bind(&descriptor, &args).expect("bound");
        check!(body_json(&request) == json!({"os-getConsoleOutput": {"length": 50}}));

        let args = Arguments::new()
            .with("id", "vm-1")
            .with("length", r#"1, "admin": true"#);
        let_assert!(Err(Error::UnsupportedParameterType { name, kind }) = bind(&descriptor, &args));
        check!(name == "length");
        check!(kind == "string");
    }

    #[test]
    fn literal_body_with_plain_text() {
        let descriptor = RequestDescriptor::put("put_object", "/objects/{id}")
            .bind(ParameterBinding::path("id"))
            .bind(ParameterBinding::body("text"))
            .literal_body_as("note: ${text}", "text/plain")
            .build()
            .expect("valid");
        let args = Arguments::new().with("id", "1").with("text", "a \"b\"");
        let request = bind(&descriptor, &args).expect("bound");
        check!(request.body() == Some(&Bytes::from_static(b"note: a \"b\"")));
        check!(request.content_type() == Some("text/plain"));
    }

    #[test]
    fn binding_is_idempotent() {
        let descriptor = RequestDescriptor::post("update", "/stacks/{name}/{id}")
            .bind(ParameterBinding::path("name"))
            .bind(ParameterBinding::path("id"))
            .bind(ParameterBinding::query("dry_run"))
            .bind(ParameterBinding::header("request_id"))
            .bind(ParameterBinding::body("timeout_mins"))
            .structured_body()
            .build()
            .expect("valid");
        let args = Arguments::new()
            .with("name", "s1")
            .with("id", "abc")
            .with("dry_run", true)
            .with("request_id", "req-1")
            .with("timeout_mins", 30_u32)
            .with_body(&json!({"template": {"resources": {}}, "environment": {"a": 1}}))
            .expect("object");

        let first = bind(&descriptor, &args).expect("first");
        let second = bind(&descriptor, &args).expect("second");
        check!(first == second);
        check!(first.body() == second.body());
    }

    #[test]
    fn into_request_keeps_base_path() {
        let args = Arguments::new().with("name", "s1").with("id", "abc");
        let mut resolved = bind(&stack_descriptor(), &args).expect("bound");
        resolved.set_query("marker", "m1");
        resolved.set_query("marker", "m2");

        let base = url::Url::parse("https://heat.example.com/v1/tenant-1/").expect("url");
        let request = resolved.into_request(&base).expect("request");
        check!(
            request.url().as_str()
                == "https://heat.example.com/v1/tenant-1/stacks/s1/abc?marker=m2"
        );
        check!(request.header("Accept") == Some("application/json"));
    }

    #[test]
    fn json_values_are_only_body_fields() {
        let descriptor = RequestDescriptor::get("list", "/volumes")
            .bind(ParameterBinding::query("filter"))
            .build()
            .expect("valid");
        let args = Arguments::new().with("filter", ParamValue::Json(json!({"a": 1})));
        let err = bind(&descriptor, &args).expect_err("object in query");
        check!(matches!(err, Error::UnsupportedParameterType { kind: "json", .. }));
    }
}
