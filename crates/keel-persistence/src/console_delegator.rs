//! Console integration
//!
//! Decorates the host console so persistence commands can reach the entity
//! manager (`em`) and the connection (`db`). Both helpers resolve lazily:
//! listing commands never opens a database.

use keel_core::console::ConsoleApplication;
use keel_core::container::{service, Container, DelegatorFactory, Service};
use keel_core::errors::{ExError, KeelError, Result};

use crate::identifiers::{CONNECTION, ENTITY_MANAGER_INTERFACE};

/// Helper name of the entity manager
pub const ENTITY_MANAGER_HELPER: &str = "em";

/// Helper name of the connection
pub const CONNECTION_HELPER: &str = "db";

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleDelegatorFactory;

impl DelegatorFactory for ConsoleDelegatorFactory {
    fn decorate(
        &self,
        _container: &Container,
        service_key: &str,
        inner: Service,
    ) -> Result<Service> {
        let console = inner.downcast::<ConsoleApplication>().map_err(|_| {
            ExError::from(KeelError::ServiceTypeMismatch {
                service_key: service_key.to_string(),
                expected: std::any::type_name::<ConsoleApplication>().to_string(),
            })
        })?;

        let decorated = ConsoleApplication::clone(&console)
            .with_helper(ENTITY_MANAGER_HELPER, ENTITY_MANAGER_INTERFACE)
            .with_helper(CONNECTION_HELPER, CONNECTION);

        tracing::debug!(service_key, "attached persistence console helpers");
        Ok(service(decorated))
    }
}
