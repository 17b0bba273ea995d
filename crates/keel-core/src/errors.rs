use thiserror::Error;

use crate::core_types::schema::{OP_AGGREGATE, OP_RESOLVE_SERVICE};

/// Result type alias using the structured error facility
pub type Result<T> = std::result::Result<T, ExError>;

/// Message template for a service or class the container cannot build.
///
/// `%s` is replaced by the missing identifier.
pub const SERVICE_NOT_CONFIGURED_PATTERN: &str =
    "The `%s` class must be configured in the DI container.";

/// Render a `%s` message template with a single argument
pub fn render_pattern(pattern: &str, value: &str) -> String {
    pattern.replacen("%s", value, 1)
}

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used for programmatic handling,
/// test assertions and CLI exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Registration
    InvalidInput,
    NotFound,
    MissingRegistration,
    DuplicateMapping,
    CycleDetected,
    TypeMismatch,

    // Console
    UnknownCommand,
    CommandFailed,

    // Collaborators
    UnsupportedDriver,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::MissingRegistration => "ERR_MISSING_REGISTRATION",
            ExErrorKind::DuplicateMapping => "ERR_DUPLICATE_MAPPING",
            ExErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ExErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            ExErrorKind::UnknownCommand => "ERR_UNKNOWN_COMMAND",
            ExErrorKind::CommandFailed => "ERR_COMMAND_FAILED",
            ExErrorKind::UnsupportedDriver => "ERR_UNSUPPORTED_DRIVER",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus the identifiers
/// needed to name the offending registration.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    service_key: Option<String>,
    provider: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
    candidates: Option<Vec<String>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            service_key: None,
            provider: None,
            message: String::new(),
            source: None,
            candidates: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the identifier (service key, alias, class or command) involved
    pub fn with_service_key(mut self, key: impl Into<String>) -> Self {
        self.service_key = Some(key.into());
        self
    }

    /// Add the provider that contributed the offending entry
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Add candidate identifiers (suggestions, conflicting providers, cycle members)
    pub fn with_candidates(mut self, ids: Vec<String>) -> Self {
        self.candidates = Some(ids);
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn service_key(&self) -> Option<&str> {
        self.service_key.as_deref()
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    pub fn candidates(&self) -> Option<&[String]> {
        self.candidates.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(key) = &self.service_key {
            write!(f, " (service: {})", key)?;
        }
        if let Some(provider) = &self.provider {
            write!(f, " (provider: {})", provider)?;
        }
        if let Some(source) = &self.source {
            write!(f, " <- {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for registration, merge and resolution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeelError {
    // ===== Resolution Errors =====
    /// No factory, alias or class is registered for the requested identifier
    #[error("The `{class}` class must be configured in the DI container.")]
    ServiceNotConfigured { class: String },

    /// An alias chain loops back on itself
    #[error("Alias cycle detected: {}", chain.join(" -> "))]
    AliasCycle { chain: Vec<String> },

    /// A factory requested a service that is still being constructed
    #[error("Circular dependency detected: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    /// The resolved service is not of the requested type
    #[error("Service `{service_key}` is not a `{expected}`")]
    ServiceTypeMismatch {
        service_key: String,
        expected: String,
    },

    // ===== Merge Errors =====
    /// Two providers bound the same identifier in a conflicting way
    #[error(
        "Conflicting `{section}` binding for `{key}`: provided by `{first_provider}` and `{second_provider}`"
    )]
    DuplicateBinding {
        section: String,
        key: String,
        first_provider: String,
        second_provider: String,
    },

    /// A fragment could not be interpreted
    #[error("Invalid configuration fragment from `{provider}`: {reason}")]
    InvalidFragment { provider: String, reason: String },

    // ===== Console Errors =====
    /// The command name is not in the command table
    #[error("Command `{name}` is not defined")]
    UnknownCommand {
        name: String,
        suggestions: Vec<String>,
    },

    /// A command handler reported a failure
    #[error("Command `{name}` failed: {reason}")]
    CommandFailed { name: String, reason: String },

    // ===== Collaborator Errors =====
    /// Settings name a driver this build cannot provide
    #[error("Unsupported {what} `{driver}`")]
    UnsupportedDriver { what: String, driver: String },

    /// Settings exist but cannot be used
    #[error("Invalid settings at `{path}`: {reason}")]
    InvalidSettings { path: String, reason: String },

    // ===== Generic Errors =====
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<KeelError> for ExError {
    fn from(err: KeelError) -> Self {
        let message = err.to_string();
        match err {
            KeelError::ServiceNotConfigured { class } => {
                ExError::new(ExErrorKind::MissingRegistration)
                    .with_service_key(class)
                    .with_message(message)
            }

            KeelError::AliasCycle { chain } => ExError::new(ExErrorKind::CycleDetected)
                .with_op("resolve_alias")
                .with_service_key(chain.first().cloned().unwrap_or_default())
                .with_candidates(chain)
                .with_message(message),

            KeelError::CircularDependency { chain } => ExError::new(ExErrorKind::CycleDetected)
                .with_op(OP_RESOLVE_SERVICE)
                .with_service_key(chain.first().cloned().unwrap_or_default())
                .with_candidates(chain)
                .with_message(message),

            KeelError::ServiceTypeMismatch { service_key, .. } => {
                ExError::new(ExErrorKind::TypeMismatch)
                    .with_service_key(service_key)
                    .with_message(message)
            }

            KeelError::DuplicateBinding {
                key,
                first_provider,
                second_provider,
                ..
            } => ExError::new(ExErrorKind::DuplicateMapping)
                .with_op(OP_AGGREGATE)
                .with_service_key(key)
                .with_provider(second_provider.clone())
                .with_candidates(vec![first_provider, second_provider])
                .with_message(message),

            KeelError::InvalidFragment { provider, .. } => ExError::new(ExErrorKind::InvalidInput)
                .with_op("load_fragment")
                .with_provider(provider)
                .with_message(message),

            KeelError::UnknownCommand { name, suggestions } => {
                ExError::new(ExErrorKind::UnknownCommand)
                    .with_service_key(name)
                    .with_candidates(suggestions)
                    .with_message(message)
            }

            KeelError::CommandFailed { name, .. } => ExError::new(ExErrorKind::CommandFailed)
                .with_service_key(name)
                .with_message(message),

            KeelError::UnsupportedDriver { .. } => {
                ExError::new(ExErrorKind::UnsupportedDriver).with_message(message)
            }

            KeelError::InvalidSettings { path, .. } => ExError::new(ExErrorKind::InvalidInput)
                .with_service_key(path)
                .with_message(message),

            KeelError::Persistence { .. } => {
                ExError::new(ExErrorKind::Persistence).with_message(message)
            }

            KeelError::Io { .. } => ExError::new(ExErrorKind::Io).with_message(message),

            KeelError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            KeelError::Internal { .. } => ExError::new(ExErrorKind::Internal).with_message(message),
        }
    }
}
