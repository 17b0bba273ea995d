//! Constructor catalog
//!
//! Configuration refers to constructors by identifier. The catalog maps those
//! identifiers to the Rust code that builds or decorates services.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::container::Container;
use crate::errors::Result;

/// A resolved service instance, shared for the lifetime of the container
pub type Service = Arc<dyn Any + Send + Sync>;

/// Wrap a value as a [`Service`]
pub fn service<T: Any + Send + Sync>(value: T) -> Service {
    Arc::new(value)
}

/// Builds the service registered under `service_key`
///
/// `argument` carries the second element of a parameterized binding, e.g.
/// the connection name for a connection factory.
pub trait Factory: Send + Sync {
    fn create(&self, container: &Container, service_key: &str, argument: Option<&str>)
        -> Result<Service>;
}

impl<F> Factory for F
where
    F: Fn(&Container, &str, Option<&str>) -> Result<Service> + Send + Sync,
{
    fn create(
        &self,
        container: &Container,
        service_key: &str,
        argument: Option<&str>,
    ) -> Result<Service> {
        self(container, service_key, argument)
    }
}

/// Wraps an already built service
pub trait DelegatorFactory: Send + Sync {
    fn decorate(&self, container: &Container, service_key: &str, inner: Service)
        -> Result<Service>;
}

impl<F> DelegatorFactory for F
where
    F: Fn(&Container, &str, Service) -> Result<Service> + Send + Sync,
{
    fn decorate(&self, container: &Container, service_key: &str, inner: Service) -> Result<Service> {
        self(container, service_key, inner)
    }
}

/// Identifier -> implementation table
///
/// Three namespaces:
/// - factories, referenced by `factories` bindings
/// - classes, built for identity registrations in `services`
/// - delegators, referenced by `delegators` chains
#[derive(Clone, Default)]
pub struct Catalog {
    factories: BTreeMap<String, Arc<dyn Factory>>,
    classes: BTreeMap<String, Arc<dyn Factory>>,
    delegators: BTreeMap<String, Arc<dyn DelegatorFactory>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: impl Factory + 'static,
    ) -> &mut Self {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn register_class(
        &mut self,
        name: impl Into<String>,
        factory: impl Factory + 'static,
    ) -> &mut Self {
        self.classes.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn register_delegator(
        &mut self,
        name: impl Into<String>,
        delegator: impl DelegatorFactory + 'static,
    ) -> &mut Self {
        self.delegators.insert(name.into(), Arc::new(delegator));
        self
    }

    pub fn factory(&self, name: &str) -> Option<&dyn Factory> {
        self.factories.get(name).map(|f| f.as_ref())
    }

    pub fn class(&self, name: &str) -> Option<&dyn Factory> {
        self.classes.get(name).map(|f| f.as_ref())
    }

    pub fn delegator(&self, name: &str) -> Option<&dyn DelegatorFactory> {
        self.delegators.get(name).map(|d| d.as_ref())
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Whether anything is registered under `name` in any namespace
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
            || self.classes.contains_key(name)
            || self.delegators.contains_key(name)
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .field("delegators", &self.delegators.keys().collect::<Vec<_>>())
            .finish()
    }
}
