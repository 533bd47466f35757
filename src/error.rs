//! Error types for the Junos provider.
//!
//! This module provides the error hierarchy for every stage of a resource
//! operation: input validation, platform compatibility, session transport,
//! commit, and parsing of configuration read back from the device.

use std::path::PathBuf;
use thiserror::Error;

use crate::resource::ResourceKind;

/// The main error type for the Junos provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider configuration errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resource input validation errors.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Resource not supported by the target platform.
    #[error("Compatibility error: {0}")]
    Compatibility(#[from] CompatibilityError),

    /// Session and transport errors.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The device rejected the candidate configuration.
    #[error("Commit error: {0}")]
    Commit(#[from] CommitError),

    /// Configuration read back from the device could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// A write failed and the candidate configuration was rolled back.
    ///
    /// The rollback's own failure, if any, is carried next to the cause,
    /// together with the warnings the commit and rollback reported.
    #[error("{cause}; {}{}", rollback_summary(.rollback.as_deref()), warnings_summary(.warnings))]
    RolledBack {
        /// The error that triggered the rollback.
        cause: Box<ProviderError>,
        /// The error returned by the rollback itself.
        rollback: Option<Box<ProviderError>>,
        /// Warnings reported by the failed commit and by the rollback.
        warnings: Vec<String>,
    },

    /// The requested object does not exist on the device.
    #[error("{kind} '{id}' not found on device")]
    NotFound {
        /// Resource kind.
        kind: ResourceKind,
        /// Resource identifier.
        id: String,
    },

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn rollback_summary(rollback: Option<&ProviderError>) -> String {
    rollback.map_or_else(
        || String::from("configuration rolled back"),
        |err| format!("rollback also failed: {err}"),
    )
}

fn warnings_summary(warnings: &[String]) -> String {
    if warnings.is_empty() {
        String::new()
    } else {
        format!(" (warnings: {})", warnings.join("; "))
    }
}

/// Provider configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Resource definitions in the file failed validation.
    #[error("Invalid resource definition at {field}: {source}")]
    InvalidResource {
        /// Path of the offending resource in the file.
        field: String,
        /// Underlying validation failure.
        source: ValidationError,
    },

    /// A setting the requested command depends on is not configured.
    #[error("Missing setting {setting}: {hint}")]
    MissingSetting {
        /// Dotted path of the setting.
        setting: String,
        /// How to provide it.
        hint: String,
    },

    /// Two resources share the same identity.
    #[error("Duplicate {resource_type} name: {name}")]
    DuplicateName {
        /// Type of resource.
        resource_type: String,
        /// The duplicated name.
        name: String,
    },
}

/// Errors in resource input detected before anything is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Two mutually exclusive fields are both set.
    #[error("conflict between '{field}' and '{other}' for {context}")]
    Conflict {
        /// First field.
        field: String,
        /// Field it conflicts with.
        other: String,
        /// Block the fields live in.
        context: String,
    },

    /// A numeric field is outside its allowed range.
    #[error("{field} = {value} is out of range {min}..={max}")]
    OutOfRange {
        /// Field name.
        field: String,
        /// Offending value.
        value: u64,
        /// Inclusive minimum.
        min: u64,
        /// Inclusive maximum.
        max: u64,
    },

    /// A string field holds a value outside its enumeration.
    #[error("{field} = '{value}' is not one of: {expected}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Offending value.
        value: String,
        /// Allowed values.
        expected: String,
    },

    /// A required field is empty or absent.
    #[error("{field} is required")]
    Missing {
        /// Field name.
        field: String,
    },

    /// The algorithm of an SSH public key is not recognized.
    #[error("format in public key '{key}' not supported")]
    UnsupportedKeyFormat {
        /// The offending key.
        key: String,
    },

    /// An SSH public key is not written the way the device returns it.
    #[error("public key '{key}' is not in normal form, expected '{expected}'")]
    KeyNotNormalized {
        /// The key as declared.
        key: String,
        /// The normal form.
        expected: String,
    },

    /// An identifier does not follow device naming rules.
    #[error("{field} '{value}' is invalid: {reason}")]
    InvalidName {
        /// Field name.
        field: String,
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Platform compatibility errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompatibilityError {
    /// The resource kind is not available on the device model.
    #[error("{kind} not compatible with Junos device {model}")]
    Unsupported {
        /// Requested resource kind.
        kind: ResourceKind,
        /// Device model reported by the session.
        model: String,
    },
}

/// Session and transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A session could not be opened.
    #[error("failed to open session: {message}")]
    Open {
        /// Description of the failure.
        message: String,
    },

    /// The configuration database could not be locked.
    #[error("failed to lock configuration: {message}")]
    Lock {
        /// Description of the failure.
        message: String,
    },

    /// A command failed on the device.
    #[error("command '{command}' failed: {message}")]
    Command {
        /// The command that was sent.
        command: String,
        /// Error reported by the device or transport.
        message: String,
    },

    /// The session was used after it was closed.
    #[error("session is closed")]
    Closed,

    /// No transport is available in this process.
    #[error("no transport available: {message}")]
    Unavailable {
        /// Why no session can be opened.
        message: String,
    },
}

/// Commit errors.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The device rejected the candidate configuration.
    #[error("commit rejected: {message}")]
    Rejected {
        /// Error reported by the device.
        message: String,
        /// Warnings the device reported alongside the error.
        warnings: Vec<String>,
    },
}

/// Errors interpreting configuration text read back from the device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A numeric field could not be parsed.
    #[error("invalid number for {field} in line '{line}': {message}")]
    InvalidNumber {
        /// Field being populated.
        field: String,
        /// The offending configuration line.
        line: String,
        /// Parser message.
        message: String,
    },
}

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wraps `cause` with the outcome of the rollback that followed it.
    #[must_use]
    pub fn rolled_back(cause: Self, rollback: Option<Self>, warnings: Vec<String>) -> Self {
        Self::RolledBack {
            cause: Box::new(cause),
            rollback: rollback.map(Box::new),
            warnings,
        }
    }

    /// Returns the device warnings carried by this error.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        match self {
            Self::RolledBack { warnings, .. }
            | Self::Commit(CommitError::Rejected { warnings, .. }) => warnings.as_slice(),
            _ => &[],
        }
    }

    /// Returns the error that started a failure chain.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::RolledBack { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Returns true if the device was never modified by the failed operation.
    #[must_use]
    pub const fn is_side_effect_free(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Validation(_) | Self::Compatibility(_)
        )
    }
}

impl ValidationError {
    /// Creates a conflict error between two fields of a block.
    #[must_use]
    pub fn conflict(
        field: impl Into<String>,
        other: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            field: field.into(),
            other: other.into(),
            context: context.into(),
        }
    }

    /// Creates an out-of-range error.
    #[must_use]
    pub fn out_of_range(field: impl Into<String>, value: u64, min: u64, max: u64) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value,
            min,
            max,
        }
    }

    /// Creates a missing-field error.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }
}

impl TransportError {
    /// Creates a command failure.
    #[must_use]
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }
}

impl CommitError {
    /// Creates a commit rejection.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            warnings: Vec::new(),
        }
    }

    /// Attaches the warnings reported with the rejection.
    #[must_use]
    pub fn with_warnings(self, warnings: Vec<String>) -> Self {
        match self {
            Self::Rejected { message, .. } => Self::Rejected { message, warnings },
        }
    }
}

impl ParseError {
    /// Creates an invalid number error.
    #[must_use]
    pub fn invalid_number(
        field: impl Into<String>,
        line: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidNumber {
            field: field.into(),
            line: line.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolled_back_reports_both_errors() {
        let cause = ProviderError::from(CommitError::rejected("missing mandatory statement"));
        let rollback = ProviderError::from(TransportError::command("rollback 0", "timeout"));
        let err = ProviderError::rolled_back(cause, Some(rollback), Vec::new());

        let message = err.to_string();
        assert!(message.contains("missing mandatory statement"));
        assert!(message.contains("rollback also failed"));
        assert!(message.contains("timeout"));
    }

    #[test]
    fn test_rolled_back_without_rollback_error() {
        let cause = ProviderError::from(CommitError::rejected("bad"));
        let err = ProviderError::rolled_back(cause, None, Vec::new());

        assert!(err.to_string().ends_with("configuration rolled back"));
        assert!(matches!(err.root_cause(), ProviderError::Commit(_)));
        assert!(err.warnings().is_empty());
    }

    #[test]
    fn test_rolled_back_carries_warnings() {
        let cause = ProviderError::from(
            CommitError::rejected("bad").with_warnings(vec![String::from("statement deprecated")]),
        );
        assert_eq!(cause.warnings(), ["statement deprecated"]);

        let warnings = vec![
            String::from("statement deprecated"),
            String::from("uncommitted changes discarded"),
        ];
        let err = ProviderError::rolled_back(cause, None, warnings);

        assert_eq!(
            err.to_string(),
            "Commit error: commit rejected: bad; configuration rolled back \
(warnings: statement deprecated; uncommitted changes discarded)"
        );
        assert_eq!(err.warnings().len(), 2);
    }

    #[test]
    fn test_side_effect_free() {
        let err = ProviderError::from(ValidationError::missing("encrypted_password"));
        assert!(err.is_side_effect_free());

        let err = ProviderError::from(TransportError::Closed);
        assert!(!err.is_side_effect_free());
    }
}
