//! Identifiers the persistence provider registers
//!
//! Capabilities are what application code asks the container for; the
//! remaining names are constructors and command handlers the host catalog
//! maps to code.

// Capabilities
pub const ENTITY_MANAGER_INTERFACE: &str = "orm::EntityManagerInterface";
pub const CONNECTION: &str = "dbal::Connection";
pub const CONSOLE: &str = keel_core::console::CONSOLE_SERVICE;

// Constructors
pub const ENTITY_MANAGER_FACTORY: &str = "persistence::EntityManagerFactory";
pub const CONNECTION_FACTORY: &str = "persistence::ConnectionFactory";
pub const CONSOLE_DELEGATOR_FACTORY: &str = "persistence::ConsoleDelegatorFactory";

// Mapping
pub const SIMPLIFIED_YAML_DRIVER: &str = "orm::mapping::SimplifiedYamlDriver";
pub const ARRAY_CACHE: &str = "array";

// DBAL commands
pub const RESERVED_WORDS_COMMAND: &str = "dbal::command::ReservedWordsCommand";
pub const RUN_SQL_COMMAND: &str = "dbal::command::RunSqlCommand";

// ORM commands
pub const COLLECTION_REGION_COMMAND: &str = "orm::command::clear_cache::CollectionRegionCommand";
pub const ENTITY_REGION_COMMAND: &str = "orm::command::clear_cache::EntityRegionCommand";
pub const METADATA_COMMAND: &str = "orm::command::clear_cache::MetadataCommand";
pub const QUERY_COMMAND: &str = "orm::command::clear_cache::QueryCommand";
pub const QUERY_REGION_COMMAND: &str = "orm::command::clear_cache::QueryRegionCommand";
pub const RESULT_COMMAND: &str = "orm::command::clear_cache::ResultCommand";
pub const SCHEMA_CREATE_COMMAND: &str = "orm::command::schema_tool::CreateCommand";
pub const SCHEMA_UPDATE_COMMAND: &str = "orm::command::schema_tool::UpdateCommand";
pub const SCHEMA_DROP_COMMAND: &str = "orm::command::schema_tool::DropCommand";
pub const ENSURE_PRODUCTION_SETTINGS_COMMAND: &str =
    "orm::command::EnsureProductionSettingsCommand";
pub const GENERATE_PROXIES_COMMAND: &str = "orm::command::GenerateProxiesCommand";
pub const CONVERT_MAPPING_COMMAND: &str = "orm::command::ConvertMappingCommand";
pub const RUN_DQL_COMMAND: &str = "orm::command::RunDqlCommand";
pub const VALIDATE_SCHEMA_COMMAND: &str = "orm::command::ValidateSchemaCommand";
pub const INFO_COMMAND: &str = "orm::command::InfoCommand";
pub const MAPPING_DESCRIBE_COMMAND: &str = "orm::command::MappingDescribeCommand";

// Migrations commands
pub const DUMP_SCHEMA_COMMAND: &str = "migrations::command::DumpSchemaCommand";
pub const EXECUTE_COMMAND: &str = "migrations::command::ExecuteCommand";
pub const GENERATE_COMMAND: &str = "migrations::command::GenerateCommand";
pub const LATEST_COMMAND: &str = "migrations::command::LatestCommand";
pub const MIGRATE_COMMAND: &str = "migrations::command::MigrateCommand";
pub const ROLLUP_COMMAND: &str = "migrations::command::RollupCommand";
pub const STATUS_COMMAND: &str = "migrations::command::StatusCommand";
pub const VERSION_COMMAND: &str = "migrations::command::VersionCommand";
pub const UP_TO_DATE_COMMAND: &str = "migrations::command::UpToDateCommand";
pub const DIFF_COMMAND: &str = "migrations::command::DiffCommand";

/// Console command name -> handler, in registration order
pub const COMMANDS: [(&str, &str); 28] = [
    ("dbal:reserved-words", RESERVED_WORDS_COMMAND),
    ("dbal:run-sql", RUN_SQL_COMMAND),
    ("orm:clear-cache:region:collection", COLLECTION_REGION_COMMAND),
    ("orm:clear-cache:region:entity", ENTITY_REGION_COMMAND),
    ("orm:clear-cache:metadata", METADATA_COMMAND),
    ("orm:clear-cache:query", QUERY_COMMAND),
    ("orm:clear-cache:region:query", QUERY_REGION_COMMAND),
    ("orm:clear-cache:result", RESULT_COMMAND),
    ("orm:schema-tool:create", SCHEMA_CREATE_COMMAND),
    ("orm:schema-tool:update", SCHEMA_UPDATE_COMMAND),
    ("orm:schema-tool:drop", SCHEMA_DROP_COMMAND),
    (
        "orm:ensure-production-settings",
        ENSURE_PRODUCTION_SETTINGS_COMMAND,
    ),
    ("orm:generate-proxies", GENERATE_PROXIES_COMMAND),
    ("orm:convert-mapping", CONVERT_MAPPING_COMMAND),
    ("orm:run-dql", RUN_DQL_COMMAND),
    ("orm:validate-schema", VALIDATE_SCHEMA_COMMAND),
    ("orm:info", INFO_COMMAND),
    ("orm:mapping:describe", MAPPING_DESCRIBE_COMMAND),
    ("migrations:dump-schema", DUMP_SCHEMA_COMMAND),
    ("migrations:execute", EXECUTE_COMMAND),
    ("migrations:generate", GENERATE_COMMAND),
    ("migrations:latest", LATEST_COMMAND),
    ("migrations:migrate", MIGRATE_COMMAND),
    ("migrations:rollup", ROLLUP_COMMAND),
    ("migrations:status", STATUS_COMMAND),
    ("migrations:version", VERSION_COMMAND),
    ("migrations:up-to-date", UP_TO_DATE_COMMAND),
    ("migrations:diff", DIFF_COMMAND),
];
