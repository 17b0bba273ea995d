//! Field keys, event names and operation names shared by every keel log line

// Envelope
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Registration identifiers
pub const FIELD_SERVICE_KEY: &str = "service_key";
pub const FIELD_PROVIDER: &str = "provider";
pub const FIELD_COMMAND: &str = "command";
pub const FIELD_CONNECTION: &str = "connection";
pub const FIELD_POLICY: &str = "policy";

pub const FIELD_PROVIDER_COUNT: &str = "provider_count";
pub const FIELD_COMMAND_COUNT: &str = "command_count";
pub const FIELD_EXIT_CODE: &str = "exit_code";

// Error fields, only present on `end_error`
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";
pub const FIELD_ERR_SERVICE_KEY: &str = "err.service_key";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

/// Merging provider fragments into one configuration
pub const OP_AGGREGATE: &str = "aggregate";
/// First build of a container service
pub const OP_RESOLVE_SERVICE: &str = "resolve_service";
/// One console command invocation
pub const OP_RUN_COMMAND: &str = "run_command";
pub const OP_OPEN_CONNECTION: &str = "open_connection";
pub const OP_BUILD_ENTITY_MANAGER: &str = "build_entity_manager";

/// Every operation that logs start/end boundaries
pub const OPS: [&str; 5] = [
    OP_AGGREGATE,
    OP_RESOLVE_SERVICE,
    OP_RUN_COMMAND,
    OP_OPEN_CONNECTION,
    OP_BUILD_ENTITY_MANAGER,
];
