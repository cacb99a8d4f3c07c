//! Azure Resource Manager types.
//!
//! Wire types mirror the ARM JSON bodies; the domain types (`ResourceGroup`,
//! `WebApp`, ...) are what the rest of the crate passes around.

use serde::{Deserialize, Serialize};

use crate::config::SiteSettings;

/// Generic ARM resource envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmResource<P> {
    /// Fully qualified resource ID.
    #[serde(default)]
    pub id: String,
    /// Resource name.
    #[serde(default)]
    pub name: String,
    /// Azure region.
    #[serde(default)]
    pub location: String,
    /// Resource-specific properties.
    #[serde(default)]
    pub properties: P,
}

impl<P> ArmResource<P> {
    /// Fills in a name or location the service left out with the requested
    /// values.
    #[must_use]
    pub fn or_requested(mut self, name: &str, location: &str) -> Self {
        if self.name.is_empty() {
            self.name = name.to_string();
        }
        if self.location.is_empty() {
            self.location = location.to_string();
        }
        self
    }
}

/// Properties shared by every resource that reports a provisioning state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningProperties {
    /// Provisioning state, if reported.
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

/// Properties of a web site (`Microsoft.Web/sites`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProperties {
    /// Default host name assigned to the site.
    #[serde(default)]
    pub default_host_name: Option<String>,
    /// Site state (`Running`, `Stopped`).
    #[serde(default)]
    pub state: Option<String>,
    /// Owning app service plan ID.
    #[serde(default)]
    pub server_farm_id: Option<String>,
}

/// Properties of the MSDeploy extension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsDeployProperties {
    /// Provisioning state of the deployment.
    #[serde(default)]
    pub provisioning_state: Option<String>,
    /// Whether the deployment finished.
    #[serde(default)]
    pub complete: Option<bool>,
}

/// Body of an `Azure-AsyncOperation` status document.
#[derive(Debug, Clone, Deserialize)]
pub struct AsyncOperationStatus {
    /// Operation status.
    pub status: String,
    /// Error details on failure.
    #[serde(default)]
    pub error: Option<ArmErrorDetail>,
}

/// ARM error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ArmErrorResponse {
    /// Error details.
    pub error: ArmErrorDetail,
}

/// ARM error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ArmErrorDetail {
    /// Error code.
    #[serde(default)]
    pub code: String,
    /// Error message.
    #[serde(default)]
    pub message: String,
}

/// A resource group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceGroup {
    /// Fully qualified resource ID.
    pub id: String,
    /// Resource group name.
    pub name: String,
    /// Azure region.
    pub location: String,
    /// Provisioning state.
    pub provisioning_state: Option<String>,
}

/// An app service plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppServicePlan {
    /// Fully qualified resource ID.
    pub id: String,
    /// Plan name.
    pub name: String,
    /// Azure region.
    pub location: String,
}

/// A web app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebApp {
    /// Fully qualified resource ID.
    pub id: String,
    /// Web app name.
    pub name: String,
    /// Owning resource group name.
    pub resource_group: String,
    /// Azure region.
    pub location: String,
    /// Public host name, e.g. `webapp1-xxxx.azurewebsites.net`.
    pub default_host_name: String,
    /// Site state.
    pub state: Option<String>,
}

/// Runtime stack applied to a new web app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    /// Java version.
    pub java_version: String,
    /// Java web container.
    pub java_container: String,
    /// Java web container version.
    pub java_container_version: String,
}

/// Package pushed into a web app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentPackage {
    /// URL of the package archive.
    pub uri: String,
    /// Whether the app is taken offline during deployment.
    pub app_offline: bool,
}

/// Publishing profile formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PublishingProfileFormat {
    /// FTP profile.
    #[default]
    Ftp,
    /// Web Deploy profile.
    WebDeploy,
    /// FileZilla3 profile.
    FileZilla3,
}

impl ResourceGroup {
    /// Converts an ARM resource into a resource group.
    #[must_use]
    pub fn from_resource(resource: ArmResource<ProvisioningProperties>) -> Self {
        Self {
            id: resource.id,
            name: resource.name,
            location: resource.location,
            provisioning_state: resource.properties.provisioning_state,
        }
    }
}

impl WebApp {
    /// Converts an ARM site into a web app.
    ///
    /// Falls back to the conventional `azurewebsites.net` host when the
    /// service omits `defaultHostName`.
    #[must_use]
    pub fn from_resource(resource: ArmResource<SiteProperties>, resource_group: &str) -> Self {
        let default_host_name = resource
            .properties
            .default_host_name
            .unwrap_or_else(|| format!("{}.azurewebsites.net", resource.name));

        Self {
            id: resource.id,
            name: resource.name,
            resource_group: resource_group.to_string(),
            location: resource.location,
            default_host_name,
            state: resource.properties.state,
        }
    }

    /// Returns the public URL for a path on this app.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("http://{}{path}", self.default_host_name)
    }
}

impl From<&SiteSettings> for SiteConfig {
    fn from(site: &SiteSettings) -> Self {
        Self {
            java_version: site.java_version.clone(),
            java_container: site.java_container.clone(),
            java_container_version: site.java_container_version.clone(),
        }
    }
}

impl DeploymentPackage {
    /// Creates a package deployed with the app kept online.
    #[must_use]
    pub fn online(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            app_offline: false,
        }
    }
}

impl PublishingProfileFormat {
    /// Value expected by the `publishxml` endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ftp => "Ftp",
            Self::WebDeploy => "WebDeploy",
            Self::FileZilla3 => "FileZilla3",
        }
    }
}

impl std::fmt::Display for PublishingProfileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true for provisioning states that end an operation.
#[must_use]
pub fn is_terminal_state(state: &str) -> bool {
    ["succeeded", "failed", "canceled", "cancelled"]
        .iter()
        .any(|s| state.eq_ignore_ascii_case(s))
}

/// Returns true for the successful terminal state.
#[must_use]
pub fn is_success_state(state: &str) -> bool {
    state.eq_ignore_ascii_case("succeeded")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_deserialization() {
        let json = r#"{
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Web/sites/webapp1-abc",
            "name": "webapp1-abc",
            "location": "West US",
            "properties": {
                "defaultHostName": "webapp1-abc.azurewebsites.net",
                "state": "Running",
                "serverFarmId": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Web/serverfarms/p"
            }
        }"#;

        let site: ArmResource<SiteProperties> = serde_json::from_str(json).expect("site json");
        let app = WebApp::from_resource(site, "rg");

        assert_eq!(app.default_host_name, "webapp1-abc.azurewebsites.net");
        assert_eq!(app.resource_group, "rg");
        assert_eq!(app.url_for("/coffeeshop/"), "http://webapp1-abc.azurewebsites.net/coffeeshop/");
    }

    #[test]
    fn test_missing_host_name_falls_back() {
        let site = ArmResource {
            id: String::new(),
            name: String::from("webapp1-xyz"),
            location: String::from("westus"),
            properties: SiteProperties::default(),
        };
        let app = WebApp::from_resource(site, "rg");
        assert_eq!(app.default_host_name, "webapp1-xyz.azurewebsites.net");
    }

    #[test]
    fn test_terminal_states() {
        assert!(is_terminal_state("Succeeded"));
        assert!(is_terminal_state("Failed"));
        assert!(is_terminal_state("Canceled"));
        assert!(!is_terminal_state("Accepted"));
        assert!(!is_terminal_state("InProgress"));
        assert!(is_success_state("succeeded"));
        assert!(!is_success_state("Failed"));
    }

    #[test]
    fn test_site_config_from_settings() {
        let config = SiteConfig::from(&SiteSettings::default());
        let json = serde_json::to_value(&config).expect("serialize");
        assert_eq!(json["javaVersion"], "1.8");
        assert_eq!(json["javaContainer"], "TOMCAT");
        assert_eq!(json["javaContainerVersion"], "8.0");
    }
}
