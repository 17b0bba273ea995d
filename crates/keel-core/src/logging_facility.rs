//! Logging for keel processes
//!
//! The host binary calls [`init`] once. Library code only emits events,
//! through the boundary macros [`log_op_start!`](crate::log_op_start),
//! [`log_op_end!`](crate::log_op_end) and [`log_op_error!`](crate::log_op_error),
//! with field and op names from `keel_core_types::schema`.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile, FILTER_ENV};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
