//! Lazy, memoizing service container
//!
//! Services are built on first request from the merged configuration and
//! the constructor [`Catalog`], then cached for the container's lifetime.
//!
//! Resolution of an identifier:
//! 1. follow `services` / `console.services` aliases to a canonical key
//! 2. build it through its `factories` binding, or, for an identity
//!    registration, through the catalog class of the same name
//! 3. wrap it with every delegator registered for the canonical key, first
//!    listed innermost
//! 4. memoize under the canonical key
//!
//! Each key is built at most once at a time: concurrent first requests wait
//! for the thread already building it.

pub mod catalog;

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::Instant;

use serde::Serialize;

use crate::aggregator::MergedConfig;
use crate::core_types::schema::OP_RESOLVE_SERVICE;
use crate::errors::{ExError, KeelError, Result};
use crate::model::{FactoryBinding, ServiceKey};
use crate::{log_op_end, log_op_error, log_op_start};

pub use catalog::{service, Catalog, DelegatorFactory, Factory, Service};

/// How the canonical key of a resolution is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Registration {
    /// Built by a `factories` binding
    Factory { binding: FactoryBinding },
    /// Registered as itself; built by the catalog class of the same name
    Identity,
}

/// Where an identifier leads, without building anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Identifier as requested
    pub requested: String,
    /// Every identifier visited, starting with `requested`, ending with `key`
    pub chain: Vec<ServiceKey>,
    /// Canonical key the instance is cached under
    pub key: ServiceKey,
    pub registration: Registration,
    /// Delegators applied to the built service, innermost first
    pub delegators: Vec<String>,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain: Vec<&str> = self.chain.iter().map(ServiceKey::as_str).collect();
        write!(f, "{}", chain.join(" -> "))?;
        match &self.registration {
            Registration::Factory {
                binding: FactoryBinding::Constructor(ctor),
            } => write!(f, " => factory {}", ctor)?,
            Registration::Factory {
                binding: FactoryBinding::Parameterized(ctor, arg),
            } => write!(f, " => factory {}({})", ctor, arg)?,
            Registration::Identity => write!(f, " => class {}", self.key)?,
        }
        if !self.delegators.is_empty() {
            write!(f, " + delegators [{}]", self.delegators.join(", "))?;
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Service container over an immutable [`MergedConfig`]
pub struct Container {
    config: MergedConfig,
    catalog: Catalog,
    instances: Mutex<HashMap<ServiceKey, Service>>,
    builds: Mutex<Builds>,
    built: Condvar,
}

impl Container {
    pub fn new(config: MergedConfig, catalog: Catalog) -> Self {
        Self {
            config,
            catalog,
            instances: Mutex::new(HashMap::new()),
            builds: Mutex::new(Builds::default()),
            built: Condvar::new(),
        }
    }

    pub fn config(&self) -> &MergedConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Whether `id` has a registration; says nothing about whether it builds
    pub fn has(&self, id: &str) -> bool {
        self.config.is_registered(id)
    }

    /// Whether the canonical key for `id` has already been built
    pub fn is_instantiated(&self, id: &str) -> bool {
        match self.describe(id) {
            Ok(resolution) => lock(&self.instances).contains_key(&resolution.key),
            Err(_) => false,
        }
    }

    /// Follow the alias chain for `id` and report its registration
    ///
    /// # Errors
    ///
    /// `ERR_CYCLE_DETECTED` when aliases loop, `ERR_MISSING_REGISTRATION`
    /// when the chain ends at an identifier nothing registers.
    pub fn describe(&self, id: &str) -> Result<Resolution> {
        let mut chain = vec![ServiceKey::new(id)];
        let mut current = ServiceKey::new(id);

        let registration = loop {
            if let Some(binding) = self.config.factory(current.as_str()) {
                break Registration::Factory {
                    binding: binding.clone(),
                };
            }
            match self.config.service_target(current.as_str()) {
                Some(target) if *target == current => break Registration::Identity,
                Some(target) => {
                    let looped = chain.contains(target);
                    chain.push(target.clone());
                    if looped {
                        return Err(KeelError::AliasCycle {
                            chain: chain.iter().map(ToString::to_string).collect(),
                        }
                        .into());
                    }
                    current = target.clone();
                }
                None => {
                    return Err(KeelError::ServiceNotConfigured {
                        class: current.to_string(),
                    }
                    .into())
                }
            }
        };

        Ok(Resolution {
            requested: id.to_string(),
            delegators: self.config.delegators(current.as_str()).to_vec(),
            key: current,
            chain,
            registration,
        })
    }

    /// Resolve `id` to its shared instance, building it on first request
    ///
    /// Concurrent first requests for one key run its factory once; the other
    /// callers wait for that build and share its result. A failed build is
    /// not cached, so a waiter then attempts the build itself.
    ///
    /// # Errors
    ///
    /// Resolution errors from [`Container::describe`], circular construction
    /// (on one thread or across threads waiting on each other), a constructor
    /// missing from the catalog, or whatever the factory or a delegator
    /// reports.
    pub fn get_service(&self, id: &str) -> Result<Service> {
        let resolution = self.describe(id)?;

        if let Some(existing) = lock(&self.instances).get(&resolution.key) {
            return Ok(existing.clone());
        }

        let claim = match BuildClaim::acquire(self, &resolution.key)? {
            Acquired::Cached(existing) => return Ok(existing),
            Acquired::Claimed(claim) => claim,
        };

        let started = Instant::now();
        log_op_start!(OP_RESOLVE_SERVICE, service_key = resolution.key.as_str());

        match self.build(&resolution) {
            Ok(instance) => {
                lock(&self.instances).insert(resolution.key.clone(), instance.clone());
                drop(claim);
                log_op_end!(
                    OP_RESOLVE_SERVICE,
                    duration_ms = started.elapsed().as_millis() as u64,
                    service_key = resolution.key.as_str()
                );
                Ok(instance)
            }
            Err(err) => {
                drop(claim);
                log_op_error!(
                    OP_RESOLVE_SERVICE,
                    err,
                    duration_ms = started.elapsed().as_millis() as u64,
                    service_key = resolution.key.as_str()
                );
                Err(err)
            }
        }
    }

    /// Resolve `id` and downcast it to `T`
    ///
    /// # Errors
    ///
    /// As [`Container::get_service`], plus `ERR_TYPE_MISMATCH` when the
    /// instance is not a `T`.
    pub fn get<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
        self.get_service(id)?.downcast::<T>().map_err(|_| {
            ExError::from(KeelError::ServiceTypeMismatch {
                service_key: id.to_string(),
                expected: type_name::<T>().to_string(),
            })
        })
    }

    fn build(&self, resolution: &Resolution) -> Result<Service> {
        let key = resolution.key.as_str();

        let mut instance = match &resolution.registration {
            Registration::Factory { binding } => {
                let factory = self.catalog.factory(binding.constructor()).ok_or_else(|| {
                    KeelError::ServiceNotConfigured {
                        class: binding.constructor().to_string(),
                    }
                })?;
                factory.create(self, key, binding.argument())?
            }
            Registration::Identity => {
                let class = self
                    .catalog
                    .class(key)
                    .ok_or_else(|| KeelError::ServiceNotConfigured {
                        class: key.to_string(),
                    })?;
                class.create(self, key, None)?
            }
        };

        for name in &resolution.delegators {
            let delegator =
                self.catalog
                    .delegator(name)
                    .ok_or_else(|| KeelError::ServiceNotConfigured {
                        class: name.clone(),
                    })?;
            instance = delegator.decorate(self, key, instance)?;
            tracing::debug!(service_key = key, delegator = %name, "applied delegator");
        }

        Ok(instance)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("providers", &self.config.providers())
            .field("catalog", &self.catalog)
            .field("instantiated", &lock(&self.instances).len())
            .finish()
    }
}

/// Keys under construction, shared by every thread using the container
#[derive(Default)]
struct Builds {
    /// Keys each thread is building, outermost first
    stacks: HashMap<ThreadId, Vec<ServiceKey>>,
    /// Which thread builds each key
    owners: HashMap<ServiceKey, ThreadId>,
    /// The key each blocked thread waits for
    waiting: HashMap<ThreadId, ServiceKey>,
}

impl Builds {
    /// Keys along the wait chain from `owner` back to `me`, if there is one
    fn wait_cycle(&self, me: ThreadId, key: &ServiceKey, owner: ThreadId) -> Option<Vec<String>> {
        let mut chain = vec![key.to_string()];
        let mut current = owner;
        while current != me {
            let next = self.waiting.get(&current)?;
            chain.push(next.to_string());
            current = *self.owners.get(next)?;
        }
        chain.push(key.to_string());
        Some(chain)
    }
}

enum Acquired<'a> {
    /// Another thread finished the build while this one waited
    Cached(Service),
    Claimed(BuildClaim<'a>),
}

/// Exclusive right to build one key; released on drop
struct BuildClaim<'a> {
    container: &'a Container,
    key: ServiceKey,
    thread: ThreadId,
}

impl<'a> BuildClaim<'a> {
    fn acquire(container: &'a Container, key: &ServiceKey) -> Result<Acquired<'a>> {
        let me = thread::current().id();
        let mut builds = lock(&container.builds);

        loop {
            if let Some(stack) = builds.stacks.get(&me) {
                if let Some(pos) = stack.iter().position(|k| k == key) {
                    let mut chain: Vec<String> =
                        stack[pos..].iter().map(ToString::to_string).collect();
                    chain.push(key.to_string());
                    return Err(KeelError::CircularDependency { chain }.into());
                }
            }

            if let Some(existing) = lock(&container.instances).get(key) {
                return Ok(Acquired::Cached(existing.clone()));
            }

            let owner = match builds.owners.get(key).copied() {
                Some(owner) => owner,
                None => {
                    builds.owners.insert(key.clone(), me);
                    builds.stacks.entry(me).or_default().push(key.clone());
                    return Ok(Acquired::Claimed(Self {
                        container,
                        key: key.clone(),
                        thread: me,
                    }));
                }
            };

            if let Some(chain) = builds.wait_cycle(me, key, owner) {
                return Err(KeelError::CircularDependency { chain }.into());
            }

            tracing::debug!(service_key = key.as_str(), "waiting for build on another thread");
            builds.waiting.insert(me, key.clone());
            builds = container
                .built
                .wait(builds)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            builds.waiting.remove(&me);
        }
    }
}

impl Drop for BuildClaim<'_> {
    fn drop(&mut self) {
        let mut builds = lock(&self.container.builds);
        builds.owners.remove(&self.key);
        if let Some(stack) = builds.stacks.get_mut(&self.thread) {
            stack.pop();
            if stack.is_empty() {
                builds.stacks.remove(&self.thread);
            }
        }
        drop(builds);
        self.container.built.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use crate::errors::ExErrorKind;
    use crate::model::ConfigFragment;
    use crate::provider::StaticProvider;

    fn container(fragment: ConfigFragment, catalog: Catalog) -> Container {
        let merged = Aggregator::default()
            .with_provider(StaticProvider::new("test", fragment))
            .aggregate()
            .unwrap();
        Container::new(merged, catalog)
    }

    #[test]
    fn test_describe_follows_alias_chain() {
        let c = container(
            ConfigFragment::new()
                .alias("Iface", "middle")
                .alias("middle", "impl.key")
                .parameterized_factory("impl.key", "Ctor", "arg"),
            Catalog::new(),
        );

        let resolution = c.describe("Iface").unwrap();
        assert_eq!(resolution.key.as_str(), "impl.key");
        assert_eq!(resolution.chain.len(), 3);
        assert_eq!(
            resolution.registration,
            Registration::Factory {
                binding: FactoryBinding::Parameterized("Ctor".into(), "arg".into())
            }
        );
        assert_eq!(
            resolution.to_string(),
            "Iface -> middle -> impl.key => factory Ctor(arg)"
        );
    }

    #[test]
    fn test_alias_cycle_is_reported() {
        let c = container(
            ConfigFragment::new().alias("a", "b").alias("b", "a"),
            Catalog::new(),
        );
        let err = c.describe("a").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::CycleDetected);
        assert_eq!(err.candidates().map(|c| c.len()), Some(3));
    }

    #[test]
    fn test_unregistered_identifier_names_itself() {
        let c = container(ConfigFragment::new(), Catalog::new());
        let err = c.get_service("nothing::Here").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::MissingRegistration);
        assert_eq!(
            err.message(),
            "The `nothing::Here` class must be configured in the DI container."
        );
    }

    #[test]
    fn test_identity_registration_uses_catalog_class() {
        let mut catalog = Catalog::new();
        catalog.register_class(
            "Greeter",
            |_: &Container, key: &str, _: Option<&str>| -> Result<Service> {
                Ok(service(format!("built {}", key)))
            },
        );
        let c = container(ConfigFragment::new().invokable("Greeter"), catalog);

        let greeting = c.get::<String>("Greeter").unwrap();
        assert_eq!(greeting.as_str(), "built Greeter");
        assert!(c.is_instantiated("Greeter"));
    }

    #[test]
    fn test_type_mismatch() {
        let mut catalog = Catalog::new();
        catalog.register_factory(
            "Ctor",
            |_: &Container, _: &str, _: Option<&str>| -> Result<Service> { Ok(service(7u32)) },
        );
        let c = container(ConfigFragment::new().factory("num", "Ctor"), catalog);

        let err = c.get::<String>("num").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::TypeMismatch);
        assert_eq!(*c.get::<u32>("num").unwrap(), 7);
    }

    #[test]
    fn test_self_dependency_is_circular() {
        let mut catalog = Catalog::new();
        catalog.register_factory(
            "Loop",
            |c: &Container, key: &str, _: Option<&str>| -> Result<Service> { c.get_service(key) },
        );
        let c = container(ConfigFragment::new().factory("loop", "Loop"), catalog);

        let err = c.get_service("loop").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::CycleDetected);
        assert!(err.message().contains("loop -> loop"));
        assert!(!c.is_instantiated("loop"));
    }
}
