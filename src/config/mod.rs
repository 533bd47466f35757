//! Resources file handling.
//!
//! This module covers everything the provider reads before it talks to a
//! device:
//! - Parsing `junos.resources.yaml` and applying environment overrides
//! - Validating every declared resource
//! - Fingerprinting command sets for change detection

mod hash;
mod parser;
mod spec;
mod validator;

pub use hash::ConfigHasher;
pub use parser::{
    apply_overrides, find_config_file, ConfigParser, DEFAULT_CONFIG_FILES,
    ENV_FAKE_CREATE_SET_FILE, ENV_FAKE_DELETE_ALSO, ENV_FAKE_UPDATE_ALSO, ENV_PLATFORM_MODEL,
};
pub use spec::{ProviderConfig, ProviderFile, ResourcesConfig};
pub use validator::{ConfigValidator, ValidationResult};
