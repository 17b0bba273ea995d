//! Factory and delegator bindings

use serde::{Deserialize, Serialize};

/// How the container builds the service registered under a key
///
/// On the wire a plain constructor is a string and a parameterized one is a
/// two-element array `[constructor, argument]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactoryBinding {
    /// Constructor reference invoked with the container
    Constructor(String),
    /// Constructor reference plus an argument, for factories that build one
    /// service per named connection
    Parameterized(String, String),
}

impl FactoryBinding {
    pub fn constructor(&self) -> &str {
        match self {
            FactoryBinding::Constructor(ctor) | FactoryBinding::Parameterized(ctor, _) => ctor,
        }
    }

    pub fn argument(&self) -> Option<&str> {
        match self {
            FactoryBinding::Constructor(_) => None,
            FactoryBinding::Parameterized(_, arg) => Some(arg),
        }
    }
}

/// Ordered decorator-factory references; the first entry wraps innermost
pub type DelegatorChain = Vec<String>;
