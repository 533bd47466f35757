//! `junos_system_login_user`: one local account, keyed by name.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::codec::{
    configuration_lines, parse_number, quote, show_command, unquote, CommandSet, KeyFormat,
    PrefixTable,
};
use crate::error::{ParseError, ValidationError};

use super::keys::{insert_key, push_authentication, validate_keys};
use super::{check_range, Resource, ResourceKind};

const NAME_MAX_LEN: usize = 64;
const UID_RANGE: (u64, u64) = (100, 64_000);

/// A login user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginUserOptions {
    /// Account name, also the resource id.
    pub name: String,
    /// Login class.
    pub class: String,
    /// Numeric user id; assigned by the device when unset.
    #[serde(default)]
    pub uid: Option<u32>,
    /// Custom CLI prompt.
    #[serde(default)]
    pub cli_prompt: Option<String>,
    /// Full name shown in listings.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Authentication block.
    #[serde(default)]
    pub authentication: Option<LoginUserAuthentication>,
}

/// Authentication of a login user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoginUserAuthentication {
    /// Hashed password, stored verbatim.
    pub encrypted_password: Option<String>,
    /// Refuse any public key login.
    pub no_public_keys: bool,
    /// OpenSSH formatted public keys.
    pub ssh_public_keys: BTreeSet<String>,
}

/// The `junos_system_login_user` resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLoginUser;

impl Resource for SystemLoginUser {
    const KIND: ResourceKind = ResourceKind::SystemLoginUser;
    type Options = LoginUserOptions;

    fn identifier(options: &LoginUserOptions) -> String {
        options.name.clone()
    }

    fn validate(options: &LoginUserOptions) -> Result<(), ValidationError> {
        validate_name(&options.name)?;
        if options.class.is_empty() {
            return Err(ValidationError::missing("class"));
        }
        if options.class.contains(char::is_whitespace) {
            return Err(ValidationError::InvalidName {
                field: String::from("class"),
                value: options.class.clone(),
                reason: String::from("must be a single keyword"),
            });
        }
        check_range("uid", options.uid.map(u64::from), UID_RANGE.0, UID_RANGE.1)?;
        if let Some(auth) = &options.authentication {
            validate_keys(
                auth.no_public_keys,
                &auth.ssh_public_keys,
                &format!("login user {} authentication", options.name),
            )?;
        }
        Ok(())
    }

    fn set_lines(options: &LoginUserOptions) -> Result<CommandSet, ValidationError> {
        let prefix = user_path(&options.name);
        let mut lines = CommandSet::new();

        lines.set(format!("{prefix} class {}", options.class));
        if let Some(uid) = options.uid {
            lines.set(format!("{prefix} uid {uid}"));
        }
        if let Some(prompt) = &options.cli_prompt {
            lines.set(format!("{prefix} cli prompt {}", quote(prompt)));
        }
        if let Some(full_name) = &options.full_name {
            lines.set(format!("{prefix} full-name {}", quote(full_name)));
        }
        if let Some(auth) = &options.authentication {
            push_authentication(
                &mut lines,
                &format!("{prefix} authentication"),
                auth.encrypted_password.as_deref(),
                auth.no_public_keys,
                &auth.ssh_public_keys,
            )?;
        }

        Ok(lines)
    }

    fn delete_lines(id: &str) -> CommandSet {
        let mut lines = CommandSet::new();
        lines.delete(user_path(id));
        lines
    }

    fn read_command(id: &str) -> String {
        show_command(&user_path(id))
    }

    fn parse(id: &str, raw: &str) -> Result<Option<LoginUserOptions>, ParseError> {
        if configuration_lines(raw).is_empty() {
            return Ok(None);
        }
        let mut options = LoginUserOptions {
            name: id.to_string(),
            ..LoginUserOptions::default()
        };
        parse_table().parse_into(&mut options, raw)?;
        Ok(Some(options))
    }
}

fn user_path(name: &str) -> String {
    format!("system login user {name}")
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidName {
        field: String::from("name"),
        value: name.to_string(),
        reason: reason.to_string(),
    };
    if name.is_empty() {
        return Err(ValidationError::missing("name"));
    }
    if name.len() > NAME_MAX_LEN {
        return Err(invalid("must be at most 64 characters"));
    }
    if name.starts_with('-') {
        return Err(invalid("must not start with '-'"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(invalid("allowed characters are letters, digits, '.', '_' and '-'"));
    }
    Ok(())
}

fn parse_table() -> PrefixTable<LoginUserOptions> {
    PrefixTable::<LoginUserOptions>::new()
        .on("class", |options, rest, _| {
            options.class = rest.to_string();
            Ok(())
        })
        .on("uid", |options, rest, line| {
            options.uid = Some(parse_number(rest, "uid", line)?);
            Ok(())
        })
        .on("cli prompt", |options, rest, _| {
            options.cli_prompt = Some(unquote(rest));
            Ok(())
        })
        .on("full-name", |options, rest, _| {
            options.full_name = Some(unquote(rest));
            Ok(())
        })
        .on("authentication encrypted-password", |options, rest, _| {
            authentication(options).encrypted_password = Some(unquote(rest));
            Ok(())
        })
        .on("authentication no-public-keys", |options, _, _| {
            authentication(options).no_public_keys = true;
            Ok(())
        })
        .on("authentication ssh-dsa", |options, rest, _| {
            insert_key(&mut authentication(options).ssh_public_keys, KeyFormat::Dsa, rest);
            Ok(())
        })
        .on("authentication ssh-ecdsa", |options, rest, _| {
            insert_key(&mut authentication(options).ssh_public_keys, KeyFormat::Ecdsa, rest);
            Ok(())
        })
        .on("authentication ssh-ed25519", |options, rest, _| {
            insert_key(&mut authentication(options).ssh_public_keys, KeyFormat::Ed25519, rest);
            Ok(())
        })
        .on("authentication ssh-rsa", |options, rest, _| {
            insert_key(&mut authentication(options).ssh_public_keys, KeyFormat::Rsa, rest);
            Ok(())
        })
}

fn authentication(options: &mut LoginUserOptions) -> &mut LoginUserAuthentication {
    options
        .authentication
        .get_or_insert_with(LoginUserAuthentication::default)
}
