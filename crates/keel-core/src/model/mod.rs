//! Registration data model
//!
//! Typed representation of one provider's configuration fragment.

pub mod binding;
pub mod fragment;
pub mod service_key;

pub use binding::{DelegatorChain, FactoryBinding};
pub use fragment::{ConfigFragment, ConsoleSection};
pub use service_key::ServiceKey;
