use keel_core::container::service;
use keel_core::{Aggregator, Catalog, ConfigFragment, Container, Result, Service, StaticProvider};

/// Merge the given fragments, in order, into a container over `catalog`
#[allow(dead_code)]
pub fn container_from(fragments: Vec<(&str, ConfigFragment)>, catalog: Catalog) -> Container {
    let mut aggregator = Aggregator::default();
    for (name, fragment) in fragments {
        aggregator = aggregator.with_provider(StaticProvider::new(name, fragment));
    }
    let merged = aggregator.aggregate().expect("fragments should merge");
    Container::new(merged, catalog)
}

/// A catalog factory that builds a `String` naming the key it was asked for
#[allow(dead_code)]
pub fn naming_factory(
    _: &Container,
    key: &str,
    argument: Option<&str>,
) -> Result<Service> {
    Ok(service(match argument {
        Some(arg) => format!("{}({})", key, arg),
        None => key.to_string(),
    }))
}
