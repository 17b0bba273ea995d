//! Operation boundary macros
//!
//! Every instrumented operation logs one `start` and exactly one of `end` or
//! `end_error`, tagged with the calling module as `component`.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_op {
    ($level:expr, $op:expr, $event:expr $(, $($field:tt)*)?) => {
        tracing::event!(
            $level,
            component = module_path!(),
            op = $op,
            event = $event
            $(, $($field)*)?
        )
    };
}

/// Log the start of an operation
///
/// ```
/// # use keel_core::log_op_start;
/// use keel_core::core_types::schema::OP_RESOLVE_SERVICE;
///
/// log_op_start!(OP_RESOLVE_SERVICE, service_key = "doctrine.connection.orm_default");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_op!(
            tracing::Level::INFO,
            $op,
            $crate::core_types::schema::EVENT_START
            $(, $($field)*)?
        )
    };
}

/// Log the successful end of an operation; `duration_ms` comes first
///
/// ```
/// # use keel_core::log_op_end;
/// log_op_end!("aggregate", duration_ms = 3, command_count = 28);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_op!(
            tracing::Level::INFO,
            $op,
            $crate::core_types::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// Log a failed operation
///
/// Takes the error by reference. Its code, kind and the service key it
/// names (empty when it names none) become `err.*` fields.
///
/// ```
/// # use keel_core::log_op_error;
/// use keel_core::errors::{ExError, KeelError};
///
/// let err = ExError::from(KeelError::ServiceNotConfigured {
///     class: "dbal::Connection".to_string(),
/// });
/// log_op_error!("resolve_service", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: &$crate::errors::ExError = &$err;
        $crate::__log_op!(
            tracing::Level::ERROR,
            $op,
            $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            err.service_key = ex_err.service_key().unwrap_or_default()
            $(, $($field)*)?
        );
    }};
}
