use keel_core::console::{self, ConsoleConfigProvider};
use keel_core::{
    Aggregator, Catalog, ConfigFragment, ConflictPolicy, Container, MergedConfig, StaticProvider,
};
use keel_persistence::PersistenceConfigProvider;

/// Console + persistence providers, then `overlays` in order
#[allow(dead_code)]
pub fn merged(
    overlays: Vec<ConfigFragment>,
    policy: ConflictPolicy,
) -> keel_core::Result<MergedConfig> {
    let mut aggregator = Aggregator::new(policy)
        .with_provider(ConsoleConfigProvider)
        .with_provider(PersistenceConfigProvider);
    for (idx, fragment) in overlays.into_iter().enumerate() {
        aggregator =
            aggregator.with_provider(StaticProvider::new(format!("overlay-{}", idx), fragment));
    }
    aggregator.aggregate()
}

#[allow(dead_code)]
pub fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    console::register_classes(&mut catalog);
    keel_persistence::register_classes(&mut catalog);
    catalog
}

/// Container with the default wiring plus `overlays`
#[allow(dead_code)]
pub fn container(overlays: Vec<ConfigFragment>) -> Container {
    let merged = merged(overlays, ConflictPolicy::Reject).expect("default wiring merges");
    Container::new(merged, catalog())
}
