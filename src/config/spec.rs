//! Resources file types.
//!
//! These structs map to `junos.resources.yaml`: a `provider` section
//! configuring how the provider runs, and a `resources` section declaring
//! the desired state of every managed object.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::resource::{LoginUserOptions, SecurityOptions, SystemRootAuthOptions};

/// The root of a resources file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProviderFile {
    /// Provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Desired resources.
    #[serde(default)]
    pub resources: ResourcesConfig,
}

/// Provider settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Platform model of the target device, used when simulating it.
    pub platform_model: Option<String>,
    /// Write creates to this set file instead of the device.
    pub fake_create_set_file: Option<PathBuf>,
    /// Also write updates to the set file.
    pub fake_update_also: bool,
    /// Also write deletes to the set file.
    pub fake_delete_also: bool,
}

/// Desired resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ResourcesConfig {
    /// `junos_security` singleton.
    pub security: Option<SecurityOptions>,
    /// `junos_system_root_authentication` singleton.
    pub root_authentication: Option<SystemRootAuthOptions>,
    /// `junos_system_login_user` instances.
    pub login_users: Vec<LoginUserOptions>,
}

impl ProviderConfig {
    /// Returns true if set-file mode is enabled.
    #[must_use]
    pub const fn is_fake(&self) -> bool {
        self.fake_create_set_file.is_some()
    }
}

impl ResourcesConfig {
    /// Returns the number of declared resource instances.
    #[must_use]
    pub fn count(&self) -> usize {
        usize::from(self.security.is_some())
            + usize::from(self.root_authentication.is_some())
            + self.login_users.len()
    }

    /// Returns true if no resource is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}
