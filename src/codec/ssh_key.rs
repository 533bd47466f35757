//! SSH public key dispatch.
//!
//! Junos stores authorized keys under one statement per key family
//! (`ssh-dsa`, `ssh-ecdsa`, `ssh-ed25519`, `ssh-rsa`). The family is chosen
//! from the OpenSSH algorithm token that starts the key.
//!
//! Declared keys must be in normal form: the exact text the device gives
//! back, with fields separated by single spaces and no surrounding
//! whitespace. ECDSA keys must name the curve their blob carries, and a
//! blob without a curve header reads back as `ecdsa-sha2-nistp256`.

use std::fmt;

use crate::error::ValidationError;

use super::lines::{quote, unquote};

/// Key family, one per configuration keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFormat {
    /// `ssh-dss` keys.
    Dsa,
    /// `ssh-rsa` keys.
    Rsa,
    /// `ecdsa-sha2-nistp256`, `-nistp384` and `-nistp521` keys.
    Ecdsa,
    /// `ssh-ed25519` keys.
    Ed25519,
}

/// OpenSSH algorithm tokens and the family they belong to.
const ALGORITHMS: &[(&str, KeyFormat)] = &[
    ("ssh-dss", KeyFormat::Dsa),
    ("ssh-rsa", KeyFormat::Rsa),
    ("ecdsa-sha2-nistp256", KeyFormat::Ecdsa),
    ("ecdsa-sha2-nistp384", KeyFormat::Ecdsa),
    ("ecdsa-sha2-nistp521", KeyFormat::Ecdsa),
    ("ssh-ed25519", KeyFormat::Ed25519),
];

/// Base64 heads of ECDSA key blobs, which embed the curve name.
const ECDSA_BLOB_HEADS: &[(&str, &str)] = &[
    ("AAAAE2VjZHNhLXNoYTItbmlzdHAzODQ", "ecdsa-sha2-nistp384"),
    ("AAAAE2VjZHNhLXNoYTItbmlzdHA1MjE", "ecdsa-sha2-nistp521"),
    ("AAAAE2VjZHNhLXNoYTItbmlzdHAyNTY", "ecdsa-sha2-nistp256"),
];

impl KeyFormat {
    /// All formats, in the order their statements are parsed.
    pub const ALL: [Self; 4] = [Self::Dsa, Self::Ecdsa, Self::Ed25519, Self::Rsa];

    /// Configuration keyword for this family.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Dsa => "ssh-dsa",
            Self::Rsa => "ssh-rsa",
            Self::Ecdsa => "ssh-ecdsa",
            Self::Ed25519 => "ssh-ed25519",
        }
    }

    /// Algorithm token restored when the device omits it.
    fn default_algorithm(self, body: &str) -> &'static str {
        match self {
            Self::Dsa => "ssh-dss",
            Self::Rsa => "ssh-rsa",
            Self::Ed25519 => "ssh-ed25519",
            Self::Ecdsa => ECDSA_BLOB_HEADS
                .iter()
                .find(|(head, _)| body.starts_with(*head))
                .map_or("ecdsa-sha2-nistp256", |(_, algorithm)| *algorithm),
        }
    }
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A public key split into its family and the body stored on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshPublicKey<'a> {
    /// Key family.
    pub format: KeyFormat,
    /// Key material after the algorithm token, comment included.
    pub body: &'a str,
}

impl<'a> SshPublicKey<'a> {
    /// Classifies an OpenSSH formatted key.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnsupportedKeyFormat`] when the algorithm
    /// token is unknown or the key has no body, and
    /// [`ValidationError::KeyNotNormalized`] when the key would read back
    /// differently.
    pub fn classify(key: &'a str) -> Result<Self, ValidationError> {
        let unsupported = || ValidationError::UnsupportedKeyFormat {
            key: key.to_string(),
        };
        let (algorithm, body) = key
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(unsupported)?;
        let format = ALGORITHMS
            .iter()
            .find(|(token, _)| *token == algorithm)
            .map(|(_, format)| *format)
            .ok_or_else(unsupported)?;
        if body.trim().is_empty() {
            return Err(unsupported());
        }

        let expected = rebuild(format, body.split_whitespace().collect::<Vec<_>>().join(" "));
        if expected != key {
            return Err(ValidationError::KeyNotNormalized {
                key: key.to_string(),
                expected,
            });
        }
        Ok(Self { format, body })
    }

    /// Renders the statement, relative to the authentication block.
    #[must_use]
    pub fn statement(&self) -> String {
        format!("{} {}", self.format.keyword(), quote(self.body))
    }

    /// Rebuilds the OpenSSH key from a statement value read from the device.
    ///
    /// Values that already start with an algorithm token are kept as-is.
    #[must_use]
    pub fn restore(format: KeyFormat, value: &str) -> String {
        rebuild(format, unquote(value))
    }
}

fn rebuild(format: KeyFormat, value: String) -> String {
    let carries_algorithm = value
        .split_once(char::is_whitespace)
        .is_some_and(|(token, _)| ALGORITHMS.iter().any(|(known, _)| *known == token));
    if carries_algorithm {
        return value;
    }
    format!("{} {value}", format.default_algorithm(&value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ECDSA_384: &str = "ecdsa-sha2-nistp384 AAAAE2VjZHNhLXNoYTItbmlzdHAzODQAAAAIbmlzdHAzODQ= user@host";

    #[test]
    fn test_classify_each_family() {
        let cases = [
            ("ssh-dss AAAAB3NzaC1kc3M=", KeyFormat::Dsa),
            ("ssh-rsa AAAAB3NzaC1yc2E=", KeyFormat::Rsa),
            (ECDSA_384, KeyFormat::Ecdsa),
            ("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5", KeyFormat::Ed25519),
        ];
        for (key, format) in cases {
            assert_eq!(SshPublicKey::classify(key).unwrap().format, format, "{key}");
        }
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let err = SshPublicKey::classify("ssh-foo AAAA").unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedKeyFormat {
                key: String::from("ssh-foo AAAA")
            }
        );
        assert!(SshPublicKey::classify("ssh-rsa").is_err());
        assert!(SshPublicKey::classify("ssh-rsa-cert-v01@openssh.com AAAA").is_err());
    }

    #[test]
    fn test_irregular_spacing_rejected() {
        for key in [
            "ssh-rsa\tAAAAB3NzaC1yc2E= admin",
            "ssh-rsa  AAAAB3NzaC1yc2E= admin",
            "ssh-rsa AAAAB3NzaC1yc2E=  admin",
            " ssh-ed25519 AAAAC3NzaC1lZDI1NTE5",
            "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5 ",
        ] {
            let err = SshPublicKey::classify(key).unwrap_err();
            assert!(
                matches!(err, ValidationError::KeyNotNormalized { .. }),
                "{key:?}: {err}"
            );
        }

        let err = SshPublicKey::classify("ssh-rsa\tAAAAB3NzaC1yc2E=  admin").unwrap_err();
        assert_eq!(
            err,
            ValidationError::KeyNotNormalized {
                key: String::from("ssh-rsa\tAAAAB3NzaC1yc2E=  admin"),
                expected: String::from("ssh-rsa AAAAB3NzaC1yc2E= admin"),
            }
        );
    }

    #[test]
    fn test_ecdsa_curve_must_match_blob() {
        let mismatched = ECDSA_384.replacen("nistp384", "nistp521", 1);
        let err = SshPublicKey::classify(&mismatched).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::KeyNotNormalized { ref expected, .. } if expected == ECDSA_384
        ));

        assert!(SshPublicKey::classify("ecdsa-sha2-nistp384 opaque").is_err());
        assert!(SshPublicKey::classify("ecdsa-sha2-nistp256 opaque").is_ok());
    }

    #[test]
    fn test_statement_strips_algorithm() {
        let key = SshPublicKey::classify("ssh-rsa AAAA... admin@laptop").unwrap();
        assert_eq!(key.statement(), "ssh-rsa \"AAAA... admin@laptop\"");
    }

    #[test]
    fn test_restore_round_trip() {
        for original in [
            "ssh-dss AAAAB3NzaC1kc3M=",
            "ssh-rsa AAAAB3NzaC1yc2E= admin",
            ECDSA_384,
            "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5",
        ] {
            let key = SshPublicKey::classify(original).unwrap();
            let value = key.statement();
            let (keyword, quoted) = value.split_once(' ').unwrap();
            assert_eq!(keyword, key.format.keyword());
            assert_eq!(SshPublicKey::restore(key.format, quoted), original);
        }
    }

    #[test]
    fn test_restore_keeps_full_key() {
        let restored = SshPublicKey::restore(KeyFormat::Rsa, "\"ssh-rsa AAAA comment\"");
        assert_eq!(restored, "ssh-rsa AAAA comment");
    }

    #[test]
    fn test_restore_ecdsa_defaults_to_p256() {
        let restored = SshPublicKey::restore(KeyFormat::Ecdsa, "\"opaque\"");
        assert_eq!(restored, "ecdsa-sha2-nistp256 opaque");
    }
}
