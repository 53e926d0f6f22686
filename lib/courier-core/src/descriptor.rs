//! Request descriptors: immutable descriptions of one remote operation.
//!
//! A descriptor is built once, when a client is defined, and never changes.
//! All structural problems are reported by [`DescriptorBuilder::build`], so a
//! descriptor that exists can always be bound; only call-time arguments can
//! still fail.
//!
//! # Example
//!
//! ```
//! use courier_core::{
//!     Fallback, FallbackPolicy, Pagination, ParameterBinding, RequestDescriptor, ResultShape,
//! };
//!
//! let list_stacks = RequestDescriptor::get("list_stacks", "/stacks")
//!     .bind(ParameterBinding::query("status"))
//!     .selector("stacks")
//!     .shape(ResultShape::Sequence)
//!     .paginate(Pagination::next_link("links"))
//!     .fallback(Fallback::on_not_found(FallbackPolicy::EmptyIterable))
//!     .build()
//!     .expect("valid descriptor");
//!
//! assert_eq!(list_stacks.name(), "list_stacks");
//! assert_eq!(list_stacks.path().as_str(), "/stacks");
//! ```

use std::collections::{BTreeMap, HashSet};

use crate::{
    ContentType, Error, Fallback, LiteralBody, Method, Pagination, ParamLocation,
    ParameterBinding, PathTemplate, Result, ResultShape,
};

/// How the request body is produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum BodyStrategy {
    /// No body, whatever the arguments.
    #[default]
    None,
    /// A fixed skeleton with `${name}` placeholders filled from body bindings.
    Literal(LiteralBody),
    /// A JSON object built from the caller's body object and body bindings,
    /// with null fields omitted.
    Structured {
        /// Wrap the object under this key (`{"stack": {...}}`).
        root: Option<String>,
    },
}

/// Immutable description of one remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    name: String,
    method: Method,
    path: PathTemplate,
    static_headers: BTreeMap<String, String>,
    consumes: String,
    produces: String,
    bindings: Vec<ParameterBinding>,
    body: BodyStrategy,
    fallback: Fallback,
    selector: Option<String>,
    shape: ResultShape,
    pagination: Pagination,
}

impl RequestDescriptor {
    /// Start describing an operation.
    #[must_use]
    pub fn builder(name: impl Into<String>, method: Method, path: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name.into(), method, path.into())
    }

    /// Start describing a GET operation.
    #[must_use]
    pub fn get(name: impl Into<String>, path: impl Into<String>) -> DescriptorBuilder {
        Self::builder(name, Method::Get, path)
    }

    /// Start describing a POST operation.
    #[must_use]
    pub fn post(name: impl Into<String>, path: impl Into<String>) -> DescriptorBuilder {
        Self::builder(name, Method::Post, path)
    }

    /// Start describing a PUT operation.
    #[must_use]
    pub fn put(name: impl Into<String>, path: impl Into<String>) -> DescriptorBuilder {
        Self::builder(name, Method::Put, path)
    }

    /// Start describing a DELETE operation.
    #[must_use]
    pub fn delete(name: impl Into<String>, path: impl Into<String>) -> DescriptorBuilder {
        Self::builder(name, Method::Delete, path)
    }

    /// Operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Path template.
    #[must_use]
    pub const fn path(&self) -> &PathTemplate {
        &self.path
    }

    /// Headers sent with every call.
    #[must_use]
    pub const fn static_headers(&self) -> &BTreeMap<String, String> {
        &self.static_headers
    }

    /// Media type of structured request bodies.
    #[must_use]
    pub fn consumes(&self) -> &str {
        &self.consumes
    }

    /// Media type requested via `Accept`.
    #[must_use]
    pub fn produces(&self) -> &str {
        &self.produces
    }

    /// Parameter bindings in declaration order.
    #[must_use]
    pub fn bindings(&self) -> &[ParameterBinding] {
        &self.bindings
    }

    /// Bindings for one location, in declaration order.
    pub fn bindings_at(&self, location: ParamLocation) -> impl Iterator<Item = &ParameterBinding> {
        self.bindings
            .iter()
            .filter(move |binding| binding.location() == location)
    }

    /// Binding by logical name.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<&ParameterBinding> {
        self.bindings.iter().find(|binding| binding.name() == name)
    }

    /// Body strategy.
    #[must_use]
    pub const fn body(&self) -> &BodyStrategy {
        &self.body
    }

    /// Fallback applied to failed calls.
    #[must_use]
    pub const fn fallback(&self) -> &Fallback {
        &self.fallback
    }

    /// Response field to unwrap.
    #[must_use]
    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    /// Declared response shape.
    #[must_use]
    pub const fn shape(&self) -> ResultShape {
        self.shape
    }

    /// Pagination settings.
    #[must_use]
    pub const fn pagination(&self) -> &Pagination {
        &self.pagination
    }
}

/// Builder for [`RequestDescriptor`].
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    name: String,
    method: Method,
    path: String,
    static_headers: BTreeMap<String, String>,
    consumes: String,
    produces: String,
    bindings: Vec<ParameterBinding>,
    body: BodySpec,
    fallback: Fallback,
    selector: Option<String>,
    shape: ResultShape,
    pagination: Pagination,
}

// Literal templates are parsed in `build` so that parse errors surface there.
#[derive(Debug, Clone)]
enum BodySpec {
    None,
    Literal { template: String, content_type: String },
    Structured { root: Option<String> },
}

impl DescriptorBuilder {
    fn new(name: String, method: Method, path: String) -> Self {
        Self {
            name,
            method,
            path,
            static_headers: BTreeMap::new(),
            consumes: ContentType::Json.as_str().to_string(),
            produces: ContentType::Json.as_str().to_string(),
            bindings: Vec::new(),
            body: BodySpec::None,
            fallback: Fallback::propagate(),
            selector: None,
            shape: ResultShape::Single,
            pagination: Pagination::default(),
        }
    }

    /// Add a header sent with every call.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.static_headers.insert(name.into(), value.into());
        self
    }

    /// Media type of structured bodies (default `application/json`).
    #[must_use]
    pub fn consumes(mut self, media_type: impl Into<String>) -> Self {
        self.consumes = media_type.into();
        self
    }

    /// Media type requested via `Accept` (default `application/json`).
    #[must_use]
    pub fn produces(mut self, media_type: impl Into<String>) -> Self {
        self.produces = media_type.into();
        self
    }

    /// Declare a parameter binding.
    #[must_use]
    pub fn bind(mut self, binding: ParameterBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Send a fixed JSON skeleton with `${name}` placeholders.
    #[must_use]
    pub fn literal_body(self, template: impl Into<String>) -> Self {
        self.literal_body_as(template, ContentType::Json.as_str())
    }

    /// Send a fixed skeleton with an explicit content type.
    #[must_use]
    pub fn literal_body_as(
        mut self,
        template: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        self.body = BodySpec::Literal {
            template: template.into(),
            content_type: content_type.into(),
        };
        self
    }

    /// Send the caller's body object plus body bindings as JSON.
    #[must_use]
    pub fn structured_body(mut self) -> Self {
        self.body = BodySpec::Structured { root: None };
        self
    }

    /// Like [`Self::structured_body`], wrapped under `root`.
    #[must_use]
    pub fn structured_body_under(mut self, root: impl Into<String>) -> Self {
        self.body = BodySpec::Structured {
            root: Some(root.into()),
        };
        self
    }

    /// Fallback for failed calls (default: propagate).
    #[must_use]
    pub fn fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Unwrap this top-level response field before decoding.
    #[must_use]
    pub fn selector(mut self, field: impl Into<String>) -> Self {
        self.selector = Some(field.into());
        self
    }

    /// Declared response shape (default [`ResultShape::Single`]).
    #[must_use]
    pub const fn shape(mut self, shape: ResultShape) -> Self {
        self.shape = shape;
        self
    }

    /// Listing pagination; implies [`ResultShape::Sequence`].
    #[must_use]
    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self.shape = ResultShape::Sequence;
        self
    }

    /// Validate and build the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] if the description is
    /// inconsistent: malformed templates, unbound or unused path
    /// placeholders, duplicate binding names, body bindings without a body,
    /// or a selector on a raw response.
    pub fn build(self) -> Result<RequestDescriptor> {
        let invalid = |message: String| Error::invalid_descriptor(format!("{}: {message}", self.name));

        if self.name.trim().is_empty() {
            return Err(Error::invalid_descriptor("operation name is empty"));
        }

        let path = PathTemplate::parse(&self.path)?;

        let mut seen = HashSet::new();
        for binding in &self.bindings {
            if !seen.insert(binding.name()) {
                return Err(invalid(format!("parameter '{}' is bound twice", binding.name())));
            }
        }

        for placeholder in path.placeholders() {
            let bound = self.bindings.iter().any(|binding| {
                binding.location() == ParamLocation::Path && binding.name() == placeholder
            });
            if !bound {
                return Err(invalid(format!(
                    "placeholder '{{{placeholder}}}' has no path binding"
                )));
            }
        }
        for binding in self
            .bindings
            .iter()
            .filter(|binding| binding.location() == ParamLocation::Path)
        {
            if !path.references(binding.name()) {
                return Err(invalid(format!(
                    "path binding '{}' is not used by '{}'",
                    binding.name(),
                    path
                )));
            }
        }

        let has_body_bindings = self
            .bindings
            .iter()
            .any(|binding| binding.location() == ParamLocation::Body);

        let body = match self.body {
            BodySpec::None => {
                if has_body_bindings {
                    return Err(invalid("body bindings declared without a body".to_string()));
                }
                BodyStrategy::None
            }
            BodySpec::Literal {
                ref template,
                ref content_type,
            } => {
                let literal = LiteralBody::parse(template, content_type.clone())?;
                for placeholder in literal.placeholders() {
                    let bound = self.bindings.iter().any(|binding| {
                        binding.location() == ParamLocation::Body && binding.name() == placeholder
                    });
                    if !bound {
                        return Err(invalid(format!(
                            "body placeholder '${{{placeholder}}}' has no body binding"
                        )));
                    }
                }
                BodyStrategy::Literal(literal)
            }
            BodySpec::Structured { ref root } => BodyStrategy::Structured { root: root.clone() },
        };

        if self.shape == ResultShape::Raw && self.selector.is_some() {
            return Err(invalid("raw responses cannot use a selector".to_string()));
        }
        if self.pagination.is_paged() && self.shape != ResultShape::Sequence {
            return Err(invalid("paginated operations must decode a sequence".to_string()));
        }

        Ok(RequestDescriptor {
            name: self.name,
            method: self.method,
            path,
            static_headers: self.static_headers,
            consumes: self.consumes,
            produces: self.produces,
            bindings: self.bindings,
            body,
            fallback: self.fallback,
            selector: self.selector,
            shape: self.shape,
            pagination: self.pagination,
        })
    }
}
