//! Whole-file validation.
//!
//! Every declared resource is validated with its own rules; errors across
//! the file are collected rather than stopping at the first one.

use std::collections::HashSet;

use tracing::debug;

use crate::compat::is_compatible;
use crate::error::{ConfigError, ProviderError, Result, ValidationError};
use crate::resource::{Resource, ResourceKind, Security, SystemLoginUser, SystemRootAuthentication};

use super::spec::ProviderFile;

/// Validator for resources files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigValidator;

/// All errors and warnings found in a file.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Errors; any of them makes the file unusable.
    pub errors: Vec<ConfigError>,
    /// Non-fatal issues.
    pub warnings: Vec<String>,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a file, failing on the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error found.
    pub fn validate(&self, file: &ProviderFile) -> Result<ValidationResult> {
        let result = self.collect(file);
        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            return Ok(result);
        }
        match result.errors.into_iter().next() {
            Some(first) => Err(ProviderError::Config(first)),
            None => Err(ProviderError::internal("validation failed without errors")),
        }
    }

    /// Collects every error and warning in a file.
    #[must_use]
    pub fn collect(&self, file: &ProviderFile) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_provider(file, &mut result);
        Self::validate_security(file, &mut result);
        if let Some(root) = &file.resources.root_authentication {
            result.check(
                "resources.root_authentication",
                SystemRootAuthentication::validate(root),
            );
        }
        Self::validate_login_users(file, &mut result);

        if file.resources.is_empty() {
            result
                .warnings
                .push(String::from("No resources defined in configuration"));
        }

        result
    }

    fn validate_provider(file: &ProviderFile, result: &mut ValidationResult) {
        let provider = &file.provider;
        if !provider.is_fake() && (provider.fake_update_also || provider.fake_delete_also) {
            result.warnings.push(String::from(
                "fake_update_also and fake_delete_also have no effect without fake_create_set_file",
            ));
        }
    }

    fn validate_security(file: &ProviderFile, result: &mut ValidationResult) {
        let Some(security) = &file.resources.security else {
            return;
        };
        result.check("resources.security", Security::validate(security));

        if let Some(model) = file.provider.platform_model.as_deref() {
            if !is_compatible(Some(model), ResourceKind::Security) {
                result.warnings.push(format!(
                    "{} is not supported on platform model '{model}'",
                    ResourceKind::Security
                ));
            }
        }
    }

    fn validate_login_users(file: &ProviderFile, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, user) in file.resources.login_users.iter().enumerate() {
            result.check(
                &format!("resources.login_users[{i}]"),
                SystemLoginUser::validate(user),
            );
            if !seen.insert(user.name.as_str()) {
                result.errors.push(ConfigError::DuplicateName {
                    resource_type: ResourceKind::SystemLoginUser.type_name().to_string(),
                    name: user.name.clone(),
                });
            }
            if user.authentication.is_none() {
                result.warnings.push(format!(
                    "Login user '{}' has no authentication block",
                    user.name
                ));
            }
        }
    }
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    fn check(&mut self, field: &str, outcome: std::result::Result<(), ValidationError>) {
        if let Err(source) = outcome {
            self.errors.push(ConfigError::InvalidResource {
                field: field.to_string(),
                source,
            });
        }
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for error in &self.errors {
            writeln!(f, "error: {error}")?;
        }
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}
