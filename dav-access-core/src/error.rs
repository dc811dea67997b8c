//! Error types for dav-access

/// Result type for dav-access operations
pub type Result<T> = std::result::Result<T, DavAccessError>;

/// dav-access errors
///
/// Only configuration-time errors are ever returned to the host. Request-time
/// failures are logged and degrade to "property not defined".
#[derive(Debug, thiserror::Error)]
pub enum DavAccessError {
    /// A directive was given an unacceptable value
    #[error("{message}")]
    InvalidDirective {
        /// Directive name as written by the operator
        directive: String,
        /// Full message naming the directive and the offending value
        message: String,
    },

    /// Directive name not known to this module
    #[error("Invalid command '{0}'")]
    UnknownDirective(String),

    /// Template expression could not be compiled
    #[error("Cannot parse expression '{expression}': {reason}")]
    ExpressionParse {
        /// Expression source text
        expression: String,
        /// Parser error text
        reason: String,
    },

    /// Template expression failed at request time
    #[error("{0}")]
    ExpressionEval(String),

    /// Configuration file is structurally wrong
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML
    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DavAccessError {
    /// Build an [`DavAccessError::InvalidDirective`]
    pub fn invalid_directive(directive: impl Into<String>, message: impl Into<String>) -> Self {
        DavAccessError::InvalidDirective {
            directive: directive.into(),
            message: message.into(),
        }
    }

    /// Whether this error belongs to configuration load (and must abort startup)
    pub fn is_config_time(&self) -> bool {
        !matches!(self, DavAccessError::ExpressionEval(_))
    }
}
