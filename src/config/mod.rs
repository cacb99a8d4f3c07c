//! Configuration module for the web app sample.
//!
//! This module handles all configuration-related functionality:
//! - Parsing the optional `webapp-sample.yaml` settings file
//! - Environment overrides and `.env` loading
//! - Validation of settings values
//! - Generating per-run resource names

mod naming;
mod parser;
mod settings;
mod validation;

pub use naming::{SampleNames, plan_name, random_resource_name};
pub use parser::{ConfigParser, TEST_MODE_ENV, find_settings_file};
pub use settings::{
    DEFAULT_AUTHORITY_HOST, DEFAULT_MANAGEMENT_ENDPOINT, DEFAULT_PACKAGE_URL, EndpointSettings,
    NamingSettings, OperationSettings, PlanSettings, SampleSettings, SiteSettings,
};
pub use validation::{ConfigValidator, ValidationError, ValidationResult};
