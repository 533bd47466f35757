//! Authentication statements shared by root and login users.

use std::collections::BTreeSet;

use crate::codec::{quote, CommandSet, KeyFormat, SshPublicKey};
use crate::error::ValidationError;

/// Rejects `no_public_keys` combined with keys, unknown key formats and keys
/// not in normal form.
pub(crate) fn validate_keys(
    no_public_keys: bool,
    keys: &BTreeSet<String>,
    context: &str,
) -> Result<(), ValidationError> {
    if no_public_keys && !keys.is_empty() {
        return Err(ValidationError::conflict(
            "no_public_keys",
            "ssh_public_keys",
            context,
        ));
    }
    for key in keys {
        SshPublicKey::classify(key)?;
    }
    Ok(())
}

/// Emits password, `no-public-keys` and key lines under `prefix`.
pub(crate) fn push_authentication(
    lines: &mut CommandSet,
    prefix: &str,
    encrypted_password: Option<&str>,
    no_public_keys: bool,
    keys: &BTreeSet<String>,
) -> Result<(), ValidationError> {
    if let Some(password) = encrypted_password {
        lines.set(format!("{prefix} encrypted-password {}", quote(password)));
    }
    if no_public_keys {
        lines.set(format!("{prefix} no-public-keys"));
    }
    for key in keys {
        let key = SshPublicKey::classify(key)?;
        lines.set(format!("{prefix} {}", key.statement()));
    }
    Ok(())
}

/// Restores a key read under `format`'s keyword and stores it.
pub(crate) fn insert_key(keys: &mut BTreeSet<String>, format: KeyFormat, value: &str) {
    keys.insert(SshPublicKey::restore(format, value));
}
