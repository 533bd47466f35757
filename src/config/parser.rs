//! Resources file loading.
//!
//! Configuration comes from a YAML file, an optional `.env` file and
//! environment variables, which take precedence over the file.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ProviderError, Result};

use super::spec::{ProviderConfig, ProviderFile};

/// Environment variable enabling set-file mode.
pub const ENV_FAKE_CREATE_SET_FILE: &str = "JUNOS_FAKECREATE_SETFILE";

/// Environment variable extending set-file mode to updates.
pub const ENV_FAKE_UPDATE_ALSO: &str = "JUNOS_FAKEUPDATE_ALSO";

/// Environment variable extending set-file mode to deletes.
pub const ENV_FAKE_DELETE_ALSO: &str = "JUNOS_FAKEDELETE_ALSO";

/// Environment variable overriding the platform model.
pub const ENV_PLATFORM_MODEL: &str = "JUNOS_PLATFORM_MODEL";

/// Configuration parser.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a resources file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ProviderFile> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ProviderError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses a resources file from a YAML string.
    ///
    /// A relative set file path is resolved against the base path.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<ProviderFile> {
        debug!("Parsing YAML configuration");

        let mut file: ProviderFile = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            ProviderError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        if let (Some(base), Some(set_file)) =
            (&self.base_path, &mut file.provider.fake_create_set_file)
        {
            if set_file.is_relative() {
                *set_file = base.join(&*set_file);
            }
        }

        debug!(
            resources = file.resources.count(),
            "Successfully parsed configuration"
        );
        Ok(file)
    }

    /// Loads a resources file, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<ProviderFile> {
        let mut file = self.load_file(path)?;
        apply_overrides(&mut file.provider, |name| std::env::var(name).ok());
        Ok(file)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                ProviderError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Applies overrides read through `lookup` to the provider settings.
///
/// Boolean switches are on when set to anything but empty, `0` or `false`.
pub fn apply_overrides(provider: &mut ProviderConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(path) = lookup(ENV_FAKE_CREATE_SET_FILE).filter(|v| !v.is_empty()) {
        debug!("Overriding provider.fake_create_set_file from environment");
        provider.fake_create_set_file = Some(PathBuf::from(path));
    }
    if let Some(value) = lookup(ENV_FAKE_UPDATE_ALSO) {
        debug!("Overriding provider.fake_update_also from environment");
        provider.fake_update_also = is_enabled(&value);
    }
    if let Some(value) = lookup(ENV_FAKE_DELETE_ALSO) {
        debug!("Overriding provider.fake_delete_also from environment");
        provider.fake_delete_also = is_enabled(&value);
    }
    if let Some(model) = lookup(ENV_PLATFORM_MODEL).filter(|v| !v.is_empty()) {
        debug!("Overriding provider.platform_model from environment");
        provider.platform_model = Some(model);
    }
}

fn is_enabled(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["junos.resources.yaml", "junos.resources.yml"];

/// Directory under the user configuration directory searched last.
const USER_CONFIG_DIR: &str = "junos-provider";

/// Finds the resources file in `start_dir`, its parents, then the user
/// configuration directory.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        if let Some(found) = find_in(&current) {
            return Ok(found);
        }
        if !current.pop() {
            break;
        }
    }

    if let Some(found) = dirs::config_dir().and_then(|dir| find_in(&dir.join(USER_CONFIG_DIR))) {
        return Ok(found);
    }

    Err(ProviderError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

fn find_in(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_FILES
        .iter()
        .map(|filename| dir.join(filename))
        .find(|path| path.exists())
        .inspect(|path| info!("Found configuration file: {}", path.display()))
}
