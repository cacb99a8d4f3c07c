//! Settings validation.
//!
//! Field-level rules live on the settings structs as `validator` attributes;
//! cross-field rules are checked here.

use crate::error::{ConfigError, Result, SampleError};
use serde::Serialize;
use tracing::debug;
use validator::Validate;

use super::settings::{NamingSettings, SampleSettings};

/// Validator for sample settings.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default, Serialize)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug, Serialize)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found; warnings are returned in the
    /// result when everything else is valid.
    pub fn validate(&self, settings: &SampleSettings) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        if let Err(errors) = settings.validate() {
            for (field, field_errors) in errors.field_errors() {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map_or_else(|| error.code.to_string(), ToString::to_string);
                    result.add_error(field.as_ref(), message);
                }
            }
            for (field, kind) in errors.errors() {
                if !matches!(kind, validator::ValidationErrorsKind::Field(_)) {
                    result.add_error(field.as_ref(), "invalid nested settings");
                }
            }
        }

        Self::validate_probes(settings, &mut result);
        Self::validate_naming(&settings.naming, &mut result);

        let last_probe = settings.probe_offsets_secs.last().copied().unwrap_or(0);
        if settings.deploy_delay_secs.saturating_add(last_probe) > settings.log_stream_timeout_secs {
            result.warnings.push(String::from(
                "probes finish after the log stream timeout; they will run during or after cleanup",
            ));
        }

        debug!(
            "Validation finished: {} errors, {} warnings",
            result.errors.len(),
            result.warnings.len()
        );

        if let Some(first) = result.errors.first() {
            return Err(SampleError::Config(ConfigError::validation(
                first.message.clone(),
                first.field.clone(),
            )));
        }

        Ok(result)
    }

    /// Probe offsets must be strictly increasing.
    fn validate_probes(settings: &SampleSettings, result: &mut ValidationResult) {
        if settings.probe_offsets_secs.is_empty() {
            result
                .warnings
                .push(String::from("no probe offsets configured; the endpoint will not be probed"));
        }

        if settings
            .probe_offsets_secs
            .windows(2)
            .any(|pair| pair[0] >= pair[1])
        {
            result.add_error(
                "probe_offsets_secs",
                "probe offsets must be strictly increasing",
            );
        }

        if !settings.probe_path.starts_with('/') {
            result.add_error("probe_path", "probe path must start with '/'");
        }
    }

    /// Generated names need room for a random suffix.
    fn validate_naming(naming: &NamingSettings, result: &mut ValidationResult) {
        if naming.web_app_length <= naming.web_app_prefix.len() {
            result.add_error(
                "naming.web_app_length",
                "web app name length must exceed its prefix",
            );
        }

        if naming.resource_group_length <= naming.resource_group_prefix.len() {
            result.add_error(
                "naming.resource_group_length",
                "resource group name length must exceed its prefix",
            );
        }

        if naming.web_app_length > 60 {
            result.add_error("naming.web_app_length", "web app names are limited to 60 characters");
        }

        if naming.resource_group_length > 90 {
            result.add_error(
                "naming.resource_group_length",
                "resource group names are limited to 90 characters",
            );
        }
    }
}

impl ValidationResult {
    /// Returns true if no errors were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }
}
