//! Platform compatibility gate.
//!
//! Some configuration objects only exist on certain device families. The
//! gate is consulted once per create and update, after the session is open
//! and before the configuration lock is taken.

use std::fmt;

use serde::Serialize;

use crate::error::CompatibilityError;
use crate::resource::ResourceKind;

/// Device family, derived from the hardware model name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    /// SRX services gateways.
    Srx,
    /// Virtual SRX.
    Vsrx,
    /// MX routers, physical or virtual.
    Mx,
    /// EX switches.
    Ex,
    /// QFX switches.
    Qfx,
    /// PTX packet transport routers.
    Ptx,
    /// ACX routers.
    Acx,
    /// Any model not recognized above.
    Unknown,
}

/// Model name prefixes, checked in order.
const MODEL_PREFIXES: &[(&str, PlatformFamily)] = &[
    ("vsrx", PlatformFamily::Vsrx),
    ("srx", PlatformFamily::Srx),
    ("vmx", PlatformFamily::Mx),
    ("mx", PlatformFamily::Mx),
    ("ex", PlatformFamily::Ex),
    ("qfx", PlatformFamily::Qfx),
    ("ptx", PlatformFamily::Ptx),
    ("acx", PlatformFamily::Acx),
];

/// Families each restricted kind is available on. Kinds absent from the
/// table are available everywhere.
const RESTRICTIONS: &[(ResourceKind, &[PlatformFamily])] = &[(
    ResourceKind::Security,
    &[PlatformFamily::Srx, PlatformFamily::Vsrx],
)];

impl PlatformFamily {
    /// Classifies a hardware model name, case-insensitively.
    #[must_use]
    pub fn from_model(model: &str) -> Self {
        let model = model.trim().to_ascii_lowercase();
        MODEL_PREFIXES
            .iter()
            .find(|(prefix, _)| model.starts_with(*prefix))
            .map_or(Self::Unknown, |(_, family)| *family)
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Srx => "srx",
            Self::Vsrx => "vsrx",
            Self::Mx => "mx",
            Self::Ex => "ex",
            Self::Qfx => "qfx",
            Self::Ptx => "ptx",
            Self::Acx => "acx",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Returns true if `kind` may be configured on `platform_model`.
///
/// An unknown model only passes for unrestricted kinds.
#[must_use]
pub fn is_compatible(platform_model: Option<&str>, kind: ResourceKind) -> bool {
    let Some((_, families)) = RESTRICTIONS.iter().find(|(restricted, _)| *restricted == kind)
    else {
        return true;
    };
    platform_model
        .map(PlatformFamily::from_model)
        .is_some_and(|family| families.contains(&family))
}

/// Pre-flight check run by the reconciler.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityGate;

impl CompatibilityGate {
    /// Creates the gate.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Checks `kind` against the device model.
    ///
    /// # Errors
    ///
    /// Returns [`CompatibilityError::Unsupported`] when the kind is not
    /// available on the model.
    pub fn check(
        &self,
        platform_model: Option<&str>,
        kind: ResourceKind,
    ) -> Result<(), CompatibilityError> {
        if is_compatible(platform_model, kind) {
            Ok(())
        } else {
            Err(CompatibilityError::Unsupported {
                kind,
                model: platform_model.unwrap_or("unknown").to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_families() {
        assert_eq!(PlatformFamily::from_model("SRX345"), PlatformFamily::Srx);
        assert_eq!(PlatformFamily::from_model("vsrx"), PlatformFamily::Vsrx);
        assert_eq!(PlatformFamily::from_model("vmx"), PlatformFamily::Mx);
        assert_eq!(PlatformFamily::from_model("ex4300-48p"), PlatformFamily::Ex);
        assert_eq!(PlatformFamily::from_model("olive"), PlatformFamily::Unknown);
    }

    #[test]
    fn test_security_on_firewalls_only() {
        assert!(is_compatible(Some("srx300"), ResourceKind::Security));
        assert!(is_compatible(Some("vSRX"), ResourceKind::Security));
        assert!(!is_compatible(Some("ex4300"), ResourceKind::Security));
        assert!(!is_compatible(Some("mx480"), ResourceKind::Security));
        assert!(!is_compatible(None, ResourceKind::Security));
    }

    #[test]
    fn test_authentication_everywhere() {
        for model in [Some("ex4300"), Some("qfx5100"), None] {
            assert!(is_compatible(model, ResourceKind::SystemRootAuthentication));
            assert!(is_compatible(model, ResourceKind::SystemLoginUser));
        }
    }

    #[test]
    fn test_gate_error_message() {
        let err = CompatibilityGate::new()
            .check(Some("ex4300"), ResourceKind::Security)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "junos_security not compatible with Junos device ex4300"
        );
    }
}
