//! Types shared by every keel crate
//!
//! - [`schema`]: log field keys, boundary events and operation names
//! - [`Sensitive`]: redacting wrapper for secrets read from settings

pub mod schema;
pub mod sensitive;

pub use sensitive::Sensitive;
