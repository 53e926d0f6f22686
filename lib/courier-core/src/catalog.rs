//! Named collections of request descriptors.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{Error, RequestDescriptor, Result};

/// The operations of one service API, keyed by operation name.
///
/// Catalogs are built once and shared; descriptors are immutable.
///
/// # Example
///
/// ```
/// use courier_core::{Catalog, ParameterBinding, RequestDescriptor};
///
/// let catalog = Catalog::builder("orchestration")
///     .operation(RequestDescriptor::get("list_stacks", "/stacks").selector("stacks"))
///     .operation(
///         RequestDescriptor::delete("delete_stack", "/stacks/{name}/{id}")
///             .bind(ParameterBinding::path("name"))
///             .bind(ParameterBinding::path("id")),
///     )
///     .build()
///     .expect("valid catalog");
///
/// assert!(catalog.get("list_stacks").is_ok());
/// assert!(catalog.get("nope").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    service: String,
    operations: BTreeMap<String, Arc<RequestDescriptor>>,
}

impl Catalog {
    /// Empty catalog for a service.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            operations: BTreeMap::new(),
        }
    }

    /// Start building a catalog.
    #[must_use]
    pub fn builder(service: impl Into<String>) -> CatalogBuilder {
        CatalogBuilder {
            catalog: Self::new(service),
            pending: Vec::new(),
        }
    }

    /// Service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Add a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] if the name is already taken.
    pub fn register(&mut self, descriptor: RequestDescriptor) -> Result<()> {
        let name = descriptor.name().to_string();
        if self.operations.contains_key(&name) {
            return Err(Error::invalid_descriptor(format!(
                "{}: operation '{name}' registered twice",
                self.service
            )));
        }
        self.operations.insert(name, Arc::new(descriptor));
        Ok(())
    }

    /// Descriptor by operation name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownOperation`] if no such operation exists.
    pub fn get(&self, name: &str) -> Result<Arc<RequestDescriptor>> {
        self.operations
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownOperation(format!("{}.{name}", self.service)))
    }

    /// Operation names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// Number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if the catalog has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Builder for [`Catalog`]; validation errors surface in [`build`](Self::build).
#[derive(Debug)]
pub struct CatalogBuilder {
    catalog: Catalog,
    pending: Vec<crate::DescriptorBuilder>,
}

impl CatalogBuilder {
    /// Add an operation.
    #[must_use]
    pub fn operation(mut self, descriptor: crate::DescriptorBuilder) -> Self {
        self.pending.push(descriptor);
        self
    }

    /// Validate every descriptor and build the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] for the first invalid or
    /// duplicate operation.
    pub fn build(self) -> Result<Catalog> {
        let mut catalog = self.catalog;
        for pending in self.pending {
            catalog.register(pending.build()?)?;
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParameterBinding;

    #[test]
    fn lookup_by_name() {
        let catalog = Catalog::builder("metering")
            .operation(RequestDescriptor::get("list_meters", "/v2/meters"))
            .operation(
                RequestDescriptor::get("get_samples", "/v2/meters/{meter}")
                    .bind(ParameterBinding::path("meter")),
            )
            .build()
            .expect("valid");

        assert_eq!(catalog.service(), "metering");
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            ["get_samples", "list_meters"]
        );
        assert_eq!(
            catalog.get("list_meters").expect("present").path().as_str(),
            "/v2/meters"
        );
    }

    #[test]
    fn unknown_operation() {
        let catalog = Catalog::new("metering");
        assert!(catalog.is_empty());
        let err = catalog.get("list_meters").expect_err("absent");
        assert!(matches!(err, Error::UnknownOperation(ref name) if name == "metering.list_meters"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Catalog::builder("metering")
            .operation(RequestDescriptor::get("list_meters", "/v2/meters"))
            .operation(RequestDescriptor::get("list_meters", "/v2/meters/"))
            .build()
            .expect_err("duplicate");
        assert!(err.is_configuration_error());
    }

    #[test]
    fn invalid_descriptor_fails_the_build() {
        let err = Catalog::builder("metering")
            .operation(RequestDescriptor::get("get_samples", "/v2/meters/{meter}"))
            .build()
            .expect_err("unbound placeholder");
        assert!(matches!(err, Error::InvalidDescriptor(_)));
    }
}
