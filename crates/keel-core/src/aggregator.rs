//! Configuration aggregation
//!
//! Merges the fragments of all registered providers, in registration order,
//! into one [`MergedConfig`]:
//!
//! | Section            | Merge                                                        |
//! |--------------------|--------------------------------------------------------------|
//! | `factories`        | identical re-declaration allowed; differing binding conflicts |
//! | `services`         | same as `factories`                                           |
//! | `delegators`       | chains append in provider order                               |
//! | `console.commands` | any second declaration of a name conflicts                    |
//! | `console.services` | same as `factories`                                           |
//! | settings sections  | deep merge, later providers override leaves                   |
//!
//! Conflicts are rejected under [`ConflictPolicy::Reject`] (the default) or
//! resolved in favour of the later provider under [`ConflictPolicy::LastWins`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::core_types::schema::OP_AGGREGATE;
use crate::errors::{ExError, ExErrorKind, KeelError, Result};
use crate::merge::{deep_merge, lookup_path};
use crate::model::{ConfigFragment, FactoryBinding, ServiceKey};
use crate::provider::ConfigProvider;
use crate::{log_op_end, log_op_error, log_op_start};

/// What the aggregator does when two providers bind the same identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Fail aggregation naming both providers
    #[default]
    Reject,
    /// Keep the later provider's binding and log a warning
    LastWins,
}

impl FromStr for ConflictPolicy {
    type Err = ExError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reject" => Ok(ConflictPolicy::Reject),
            "last-wins" => Ok(ConflictPolicy::LastWins),
            other => Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("parse_conflict_policy")
                .with_message(format!(
                    "unknown conflict policy `{}` (expected `reject` or `last-wins`)",
                    other
                ))),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::Reject => f.write_str("reject"),
            ConflictPolicy::LastWins => f.write_str("last-wins"),
        }
    }
}

/// Host-side configuration aggregator
#[derive(Default)]
pub struct Aggregator {
    policy: ConflictPolicy,
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl Aggregator {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            policy,
            providers: Vec::new(),
        }
    }

    /// Register a provider; later providers merge on top of earlier ones
    pub fn with_provider(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn add_provider(&mut self, provider: Box<dyn ConfigProvider>) {
        self.providers.push(provider);
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Invoke every provider once and merge the results
    pub fn aggregate(&self) -> Result<MergedConfig> {
        let started = Instant::now();
        log_op_start!(
            OP_AGGREGATE,
            provider_count = self.providers.len(),
            policy = %self.policy
        );

        let mut merged = MergedConfig {
            policy: self.policy,
            ..MergedConfig::default()
        };

        for provider in &self.providers {
            let name = provider.name();
            if let Err(err) = merged.absorb(name, provider.provide()) {
                log_op_error!(
                    OP_AGGREGATE,
                    err,
                    duration_ms = started.elapsed().as_millis() as u64,
                    provider = name
                );
                return Err(err);
            }
            merged.providers.push(name.to_string());
        }

        log_op_end!(
            OP_AGGREGATE,
            duration_ms = started.elapsed().as_millis() as u64,
            command_count = merged.fragment.console.commands.len()
        );
        Ok(merged)
    }
}

/// Which provider contributed each binding
#[derive(Debug, Clone, Default)]
struct Origins {
    factories: BTreeMap<ServiceKey, String>,
    services: BTreeMap<ServiceKey, String>,
    commands: BTreeMap<String, String>,
    command_services: BTreeMap<ServiceKey, String>,
}

/// The merged configuration of all providers; immutable once built
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
    policy: ConflictPolicy,
    providers: Vec<String>,
    fragment: ConfigFragment,
    origins: Origins,
}

/// Whether a repeated identical binding counts as a conflict
#[derive(Clone, Copy, PartialEq, Eq)]
enum Repeat {
    Allowed,
    Conflict,
}

fn merge_section<K, V>(
    section: &str,
    target: &mut BTreeMap<K, V>,
    origins: &mut BTreeMap<K, String>,
    incoming: BTreeMap<K, V>,
    provider: &str,
    policy: ConflictPolicy,
    repeat: Repeat,
) -> Result<()>
where
    K: Ord + Clone + fmt::Display,
    V: PartialEq,
{
    for (key, value) in incoming {
        if let Some(existing) = target.get(&key) {
            if *existing == value && repeat == Repeat::Allowed {
                continue;
            }
            let first_provider = origins.get(&key).cloned().unwrap_or_default();
            match policy {
                ConflictPolicy::Reject => {
                    return Err(KeelError::DuplicateBinding {
                        section: section.to_string(),
                        key: key.to_string(),
                        first_provider,
                        second_provider: provider.to_string(),
                    }
                    .into());
                }
                ConflictPolicy::LastWins => {
                    tracing::warn!(
                        section,
                        key = %key,
                        first_provider = %first_provider,
                        provider,
                        "binding overridden by later provider"
                    );
                }
            }
        }
        origins.insert(key.clone(), provider.to_string());
        target.insert(key, value);
    }
    Ok(())
}

/// `services` and `console.services` share one identifier space; a binding
/// in `incoming` must agree with any binding of the same id in `other`.
/// Under `LastWins` the earlier binding in `other` is dropped.
fn check_shared_ids(
    section: &str,
    incoming: &BTreeMap<ServiceKey, ServiceKey>,
    other_section: &str,
    other: &mut BTreeMap<ServiceKey, ServiceKey>,
    other_origins: &mut BTreeMap<ServiceKey, String>,
    provider: &str,
    policy: ConflictPolicy,
) -> Result<()> {
    for (key, target) in incoming {
        if other.get(key).map_or(true, |existing| existing == target) {
            continue;
        }
        let first_provider = other_origins.get(key).cloned().unwrap_or_default();
        match policy {
            ConflictPolicy::Reject => {
                return Err(KeelError::DuplicateBinding {
                    section: format!("{}` / `{}", other_section, section),
                    key: key.to_string(),
                    first_provider,
                    second_provider: provider.to_string(),
                }
                .into());
            }
            ConflictPolicy::LastWins => {
                tracing::warn!(
                    section,
                    other_section,
                    key = %key,
                    first_provider = %first_provider,
                    provider,
                    "binding in the other service section overridden by later provider"
                );
                other.remove(key);
                other_origins.remove(key);
            }
        }
    }
    Ok(())
}

impl MergedConfig {
    /// Merge everything `provider` contributed into this configuration
    fn absorb(&mut self, provider: &str, fragment: ConfigFragment) -> Result<()> {
        let ConfigFragment {
            factories,
            services,
            delegators,
            console,
            settings,
        } = fragment;

        merge_section(
            "factories",
            &mut self.fragment.factories,
            &mut self.origins.factories,
            factories,
            provider,
            self.policy,
            Repeat::Allowed,
        )?;
        check_shared_ids(
            "services",
            &services,
            "console.services",
            &mut self.fragment.console.services,
            &mut self.origins.command_services,
            provider,
            self.policy,
        )?;
        merge_section(
            "services",
            &mut self.fragment.services,
            &mut self.origins.services,
            services,
            provider,
            self.policy,
            Repeat::Allowed,
        )?;
        merge_section(
            "console.commands",
            &mut self.fragment.console.commands,
            &mut self.origins.commands,
            console.commands,
            provider,
            self.policy,
            Repeat::Conflict,
        )?;
        check_shared_ids(
            "console.services",
            &console.services,
            "services",
            &mut self.fragment.services,
            &mut self.origins.services,
            provider,
            self.policy,
        )?;
        merge_section(
            "console.services",
            &mut self.fragment.console.services,
            &mut self.origins.command_services,
            console.services,
            provider,
            self.policy,
            Repeat::Allowed,
        )?;

        for (key, chain) in delegators {
            self.fragment
                .delegators
                .entry(key)
                .or_default()
                .extend(chain);
        }

        for (section, value) in settings {
            let merged = match self.fragment.settings.remove(&section) {
                Some(existing) => deep_merge(existing, value),
                None => value,
            };
            self.fragment.settings.insert(section, merged);
        }

        Ok(())
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Provider names in merge order
    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    /// The merged fragment
    pub fn fragment(&self) -> &ConfigFragment {
        &self.fragment
    }

    pub fn factory(&self, key: &str) -> Option<&FactoryBinding> {
        self.fragment.factories.get(key)
    }

    /// Target of `id` in `services`, falling back to `console.services`
    pub fn service_target(&self, id: &str) -> Option<&ServiceKey> {
        self.fragment
            .services
            .get(id)
            .or_else(|| self.fragment.console.services.get(id))
    }

    /// Delegator chain registered for `key` (empty if none)
    pub fn delegators(&self, key: &str) -> &[String] {
        self.fragment
            .delegators
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Console command name -> handler identifier
    pub fn commands(&self) -> &BTreeMap<String, String> {
        &self.fragment.console.commands
    }

    /// Whether `id` has any registration (factory, alias or identity)
    pub fn is_registered(&self, id: &str) -> bool {
        self.factory(id).is_some() || self.service_target(id).is_some()
    }

    /// A whole settings section, e.g. `doctrine`
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.fragment.settings.get(name)
    }

    /// Settings lookup by dotted path, e.g. `doctrine.connection.orm_default`
    pub fn setting(&self, path: &str) -> Option<&Value> {
        let (section, rest) = match path.split_once('.') {
            Some((section, rest)) => (section, Some(rest)),
            None => (path, None),
        };
        let root = self.section(section)?;
        match rest {
            Some(rest) => lookup_path(root, rest),
            None => Some(root),
        }
    }

    pub fn origin_of_factory(&self, key: &str) -> Option<&str> {
        self.origins.factories.get(key).map(String::as_str)
    }

    pub fn origin_of_service(&self, id: &str) -> Option<&str> {
        self.origins
            .services
            .get(id)
            .or_else(|| self.origins.command_services.get(id))
            .map(String::as_str)
    }

    pub fn origin_of_command(&self, name: &str) -> Option<&str> {
        self.origins.commands.get(name).map(String::as_str)
    }

    /// The merged nested mapping
    pub fn to_value(&self) -> Value {
        self.fragment.to_value()
    }

    /// SHA-256 of the canonical JSON rendering
    ///
    /// Equal digests mean byte-identical merged configuration.
    pub fn digest(&self) -> String {
        let canonical = self.to_value().to_string();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Report registrations that will fail when resolved
    ///
    /// Resolution is lazy, so none of these stop aggregation.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for (name, handler) in self.commands() {
            if !self.is_registered(handler) {
                issues.push(ValidationIssue {
                    kind: IssueKind::UnregisteredCommandHandler,
                    subject: name.clone(),
                    detail: format!("handler `{}` is not registered as a service", handler),
                });
            }
        }

        for (id, target) in &self.fragment.services {
            if id != target && !self.is_registered(target.as_str()) {
                issues.push(ValidationIssue {
                    kind: IssueKind::DanglingAlias,
                    subject: id.to_string(),
                    detail: format!("target `{}` has no registration", target),
                });
            }
        }

        for key in self.fragment.delegators.keys() {
            if !self.is_registered(key.as_str()) {
                issues.push(ValidationIssue {
                    kind: IssueKind::DelegatorWithoutService,
                    subject: key.to_string(),
                    detail: "delegators are registered for a service with no registration"
                        .to_string(),
                });
            }
        }

        issues
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    UnregisteredCommandHandler,
    DanglingAlias,
    DelegatorWithoutService,
}

/// A non-fatal finding from [`MergedConfig::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub subject: String,
    pub detail: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            IssueKind::UnregisteredCommandHandler => "command",
            IssueKind::DanglingAlias => "alias",
            IssueKind::DelegatorWithoutService => "delegator",
        };
        write!(f, "{} `{}`: {}", label, self.subject, self.detail)
    }
}
