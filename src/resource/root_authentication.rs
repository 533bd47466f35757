//! `junos_system_root_authentication`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::codec::{show_command, unquote, CommandSet, KeyFormat, PrefixTable};
use crate::error::{ParseError, ValidationError};

use super::keys::{insert_key, push_authentication, validate_keys};
use super::{Resource, ResourceKind};

const PATH: &str = "system root-authentication";

/// Root account authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemRootAuthOptions {
    /// Hashed password, stored verbatim.
    pub encrypted_password: String,
    /// Refuse any public key login.
    #[serde(default)]
    pub no_public_keys: bool,
    /// OpenSSH formatted public keys.
    #[serde(default)]
    pub ssh_public_keys: BTreeSet<String>,
}

/// The `junos_system_root_authentication` resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRootAuthentication;

impl Resource for SystemRootAuthentication {
    const KIND: ResourceKind = ResourceKind::SystemRootAuthentication;
    type Options = SystemRootAuthOptions;

    fn identifier(_options: &SystemRootAuthOptions) -> String {
        String::from("system_root_authentication")
    }

    fn validate(options: &SystemRootAuthOptions) -> Result<(), ValidationError> {
        if options.encrypted_password.is_empty() {
            return Err(ValidationError::missing("encrypted_password"));
        }
        validate_keys(
            options.no_public_keys,
            &options.ssh_public_keys,
            "root-authentication",
        )
    }

    fn set_lines(options: &SystemRootAuthOptions) -> Result<CommandSet, ValidationError> {
        let mut lines = CommandSet::new();
        push_authentication(
            &mut lines,
            PATH,
            Some(&options.encrypted_password),
            options.no_public_keys,
            &options.ssh_public_keys,
        )?;
        Ok(lines)
    }

    fn delete_lines(_id: &str) -> CommandSet {
        let mut lines = CommandSet::new();
        lines.delete(PATH);
        lines
    }

    fn read_command(_id: &str) -> String {
        show_command(PATH)
    }

    fn parse(_id: &str, raw: &str) -> Result<Option<SystemRootAuthOptions>, ParseError> {
        let mut options = SystemRootAuthOptions::default();
        parse_table().parse_into(&mut options, raw)?;
        Ok(Some(options))
    }
}

fn parse_table() -> PrefixTable<SystemRootAuthOptions> {
    PrefixTable::<SystemRootAuthOptions>::new()
        .on("encrypted-password", |options, rest, _| {
            options.encrypted_password = unquote(rest);
            Ok(())
        })
        .on("no-public-keys", |options, _, _| {
            options.no_public_keys = true;
            Ok(())
        })
        .on("ssh-dsa", |options, rest, _| {
            insert_key(&mut options.ssh_public_keys, KeyFormat::Dsa, rest);
            Ok(())
        })
        .on("ssh-ecdsa", |options, rest, _| {
            insert_key(&mut options.ssh_public_keys, KeyFormat::Ecdsa, rest);
            Ok(())
        })
        .on("ssh-ed25519", |options, rest, _| {
            insert_key(&mut options.ssh_public_keys, KeyFormat::Ed25519, rest);
            Ok(())
        })
        .on("ssh-rsa", |options, rest, _| {
            insert_key(&mut options.ssh_public_keys, KeyFormat::Rsa, rest);
            Ok(())
        })
}
