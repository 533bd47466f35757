//! Resource option model.
//!
//! Each manageable Junos object is described by a strongly typed options
//! struct and a [`Resource`] implementation that maps it to and from
//! configuration lines:
//! - [`Security`]: IKE traceoptions and UTM web filtering (singleton)
//! - [`SystemRootAuthentication`]: root password and keys (singleton)
//! - [`SystemLoginUser`]: login users, keyed by name

mod keys;
mod login_user;
mod root_authentication;
mod security;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::CommandSet;
use crate::error::{ParseError, ValidationError};

pub use login_user::{LoginUserAuthentication, LoginUserOptions, SystemLoginUser};
pub use root_authentication::{SystemRootAuthOptions, SystemRootAuthentication};
pub use security::{
    IkeTraceoptions, Security, SecurityOptions, TraceFile, UtmOptions, WEB_FILTERING_TYPES,
};

/// Kinds of resources the provider manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// `junos_security`.
    Security,
    /// `junos_system_root_authentication`.
    SystemRootAuthentication,
    /// `junos_system_login_user`.
    SystemLoginUser,
}

impl ResourceKind {
    /// Every kind, in registration order.
    pub const ALL: [Self; 3] = [
        Self::Security,
        Self::SystemRootAuthentication,
        Self::SystemLoginUser,
    ];

    /// Resource type name exposed to the declarative framework.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Security => "junos_security",
            Self::SystemRootAuthentication => "junos_system_root_authentication",
            Self::SystemLoginUser => "junos_system_login_user",
        }
    }

    /// Fixed identifier of singleton kinds.
    ///
    /// Singletons always exist on the device exactly once; only their
    /// settings are added or removed.
    #[must_use]
    pub const fn singleton_id(self) -> Option<&'static str> {
        match self {
            Self::Security => Some("security"),
            Self::SystemRootAuthentication => Some("system_root_authentication"),
            Self::SystemLoginUser => None,
        }
    }

    /// Returns true for singleton kinds.
    #[must_use]
    pub const fn is_singleton(self) -> bool {
        self.singleton_id().is_some()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Mapping between a resource's options and configuration lines.
///
/// Implementations are stateless; all methods are associated functions so
/// the reconciler dispatches statically on the resource type.
pub trait Resource {
    /// The kind this implementation manages.
    const KIND: ResourceKind;

    /// Typed options of the resource.
    type Options: Clone + fmt::Debug + PartialEq + Send + Sync;

    /// Identifier of a resource instance.
    fn identifier(options: &Self::Options) -> String;

    /// Checks field ranges, enumerations and mutual exclusions.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    fn validate(options: &Self::Options) -> Result<(), ValidationError>;

    /// Emits the `set` lines for validated options.
    ///
    /// # Errors
    ///
    /// Returns an error for values that cannot be expressed as lines.
    fn set_lines(options: &Self::Options) -> Result<CommandSet, ValidationError>;

    /// Emits the `delete` lines removing the whole managed subtree.
    fn delete_lines(id: &str) -> CommandSet;

    /// Command that reads the managed subtree back.
    fn read_command(id: &str) -> String;

    /// Interprets a read reply.
    ///
    /// Returns `None` when the object does not exist on the device. Singleton
    /// kinds always return `Some`.
    ///
    /// # Errors
    ///
    /// Returns an error when a recognized statement carries an unusable value.
    fn parse(id: &str, raw: &str) -> Result<Option<Self::Options>, ParseError>;

    /// Validates then renders, all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns the validation error without emitting any line.
    fn render(options: &Self::Options) -> Result<CommandSet, ValidationError> {
        Self::validate(options)?;
        Self::set_lines(options)
    }
}

/// Checks an optional numeric field against an inclusive range.
pub(crate) fn check_range(
    field: &str,
    value: Option<u64>,
    min: u64,
    max: u64,
) -> Result<(), ValidationError> {
    match value {
        Some(v) if v < min || v > max => Err(ValidationError::out_of_range(field, v, min, max)),
        _ => Ok(()),
    }
}
