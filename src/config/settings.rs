//! Settings types for the sample run.
//!
//! These structs map to the optional `webapp-sample.yaml` file. Every field
//! has a default, so an empty document (or no file at all) describes the
//! standard run.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Public Azure Resource Manager endpoint.
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// Public Microsoft Entra ID authority.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Package deployed into the web app.
pub const DEFAULT_PACKAGE_URL: &str =
    "https://github.com/Azure/azure-libraries-for-java/raw/master/azure-samples/src/main/resources/coffeeshop.zip";

/// Root settings structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct SampleSettings {
    /// Azure region for every resource created.
    #[validate(length(min = 1, message = "region must not be empty"))]
    pub region: String,

    /// Package pushed into the web app.
    #[validate(url(message = "package_url must be a valid URL"))]
    pub package_url: String,

    /// Upper bound on the publishing-profile read loop, in seconds.
    #[validate(range(min = 1, message = "log_stream_timeout_secs must be at least 1"))]
    pub log_stream_timeout_secs: u64,

    /// Delay before the background task deploys the package, in seconds.
    pub deploy_delay_secs: u64,

    /// Probe offsets in seconds, measured from deploy completion.
    pub probe_offsets_secs: Vec<u64>,

    /// Path probed on the deployed web app.
    pub probe_path: String,

    /// Whether HTTP helpers short-circuit to the playback sentinel.
    pub playback: bool,

    /// Site configuration for the web app.
    #[validate(nested)]
    pub site: SiteSettings,

    /// App service plan sku.
    #[validate(nested)]
    pub plan: PlanSettings,

    /// Generated resource names.
    pub naming: NamingSettings,

    /// Service endpoints.
    #[validate(nested)]
    pub endpoints: EndpointSettings,

    /// Long-running operation polling.
    #[validate(nested)]
    pub operations: OperationSettings,
}

/// Web app runtime stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct SiteSettings {
    /// Java version (`siteConfig.javaVersion`).
    #[validate(length(min = 1))]
    pub java_version: String,
    /// Java web container (`siteConfig.javaContainer`).
    #[validate(length(min = 1))]
    pub java_container: String,
    /// Java web container version (`siteConfig.javaContainerVersion`).
    #[validate(length(min = 1))]
    pub java_container_version: String,
}

/// App service plan sku.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct PlanSettings {
    /// Sku name, e.g. `S1`.
    #[validate(length(min = 1))]
    pub sku_name: String,
    /// Sku tier, e.g. `Standard`.
    #[validate(length(min = 1))]
    pub sku_tier: String,
}

/// Prefixes and total lengths of generated names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NamingSettings {
    /// Prefix for the web app name.
    pub web_app_prefix: String,
    /// Total length of the web app name.
    pub web_app_length: usize,
    /// Prefix for the resource group name.
    pub resource_group_prefix: String,
    /// Total length of the resource group name.
    pub resource_group_length: usize,
}

/// Management and identity endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct EndpointSettings {
    /// Resource Manager base URL.
    #[validate(url)]
    pub management: String,
    /// Entra ID authority host.
    #[validate(url)]
    pub authority: String,
}

/// Long-running operation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct OperationSettings {
    /// Poll interval when the service sends no `Retry-After`.
    #[validate(range(min = 1))]
    pub poll_interval_secs: u64,
    /// Maximum wait for a single operation.
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for SampleSettings {
    fn default() -> Self {
        Self {
            region: String::from("westus"),
            package_url: String::from(DEFAULT_PACKAGE_URL),
            log_stream_timeout_secs: 120,
            deploy_delay_secs: 10,
            probe_offsets_secs: vec![5, 15, 25, 35],
            probe_path: String::from("/coffeeshop/"),
            playback: false,
            site: SiteSettings::default(),
            plan: PlanSettings::default(),
            naming: NamingSettings::default(),
            endpoints: EndpointSettings::default(),
            operations: OperationSettings::default(),
        }
    }
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            java_version: String::from("1.8"),
            java_container: String::from("TOMCAT"),
            java_container_version: String::from("8.0"),
        }
    }
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            sku_name: String::from("S1"),
            sku_tier: String::from("Standard"),
        }
    }
}

impl Default for NamingSettings {
    fn default() -> Self {
        Self {
            web_app_prefix: String::from("webapp1-"),
            web_app_length: 20,
            resource_group_prefix: String::from("rg1NEMV_"),
            resource_group_length: 24,
        }
    }
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            management: String::from(DEFAULT_MANAGEMENT_ENDPOINT),
            authority: String::from(DEFAULT_AUTHORITY_HOST),
        }
    }
}

impl Default for OperationSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            timeout_secs: 1800,
        }
    }
}

impl SampleSettings {
    /// Returns the read-loop bound.
    #[must_use]
    pub const fn log_stream_timeout(&self) -> Duration {
        Duration::from_secs(self.log_stream_timeout_secs)
    }

    /// Returns the delay before deploying.
    #[must_use]
    pub const fn deploy_delay(&self) -> Duration {
        Duration::from_secs(self.deploy_delay_secs)
    }

    /// Returns the probe offsets as durations.
    #[must_use]
    pub fn probe_offsets(&self) -> Vec<Duration> {
        self.probe_offsets_secs
            .iter()
            .map(|s| Duration::from_secs(*s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_describe_standard_run() {
        let settings = SampleSettings::default();

        assert_eq!(settings.log_stream_timeout(), Duration::from_secs(120));
        assert_eq!(settings.deploy_delay(), Duration::from_secs(10));
        assert_eq!(settings.probe_offsets_secs, vec![5, 15, 25, 35]);
        assert_eq!(settings.naming.web_app_prefix, "webapp1-");
        assert_eq!(settings.naming.resource_group_prefix, "rg1NEMV_");
        assert!(!settings.playback);
    }

    #[test]
    fn test_defaults_pass_derive_validation() {
        assert!(SampleSettings::default().validate().is_ok());
    }

    #[test]
    fn test_empty_region_fails_derive_validation() {
        let settings = SampleSettings {
            region: String::new(),
            ..SampleSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
