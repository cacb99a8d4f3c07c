//! Resource provisioner backed by the Resource Manager API.
//!
//! This module maps the sample's management operations onto ARM requests.
//! Each call waits for its long-running operation and propagates the first
//! failure unchanged.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::config::{PlanSettings, plan_name};
use crate::error::{AzureError, Result, SampleError};

use super::client::ArmClient;
use super::log_stream::{LineSource, ResponseLines};
use super::manager::WebAppManager;
use super::types::{
    AppServicePlan, ArmResource, DeploymentPackage, MsDeployProperties, ProvisioningProperties,
    PublishingProfileFormat, ResourceGroup, SiteConfig, SiteProperties, WebApp, is_success_state,
};

/// `Microsoft.Resources` API version.
pub const RESOURCES_API_VERSION: &str = "2021-04-01";

/// `Microsoft.Web` API version.
pub const WEB_API_VERSION: &str = "2022-03-01";

/// Provisioner for resource groups and web apps.
#[derive(Debug, Clone)]
pub struct ResourceProvisioner {
    /// Resource Manager client.
    client: ArmClient,
    /// Sku for implicitly created plans.
    plan: PlanSettings,
}

impl ResourceProvisioner {
    /// Creates a new provisioner.
    #[must_use]
    pub const fn new(client: ArmClient, plan: PlanSettings) -> Self {
        Self { client, plan }
    }

    fn resource_group_path(&self, name: &str) -> String {
        self.client.subscription_path(&format!("/resourcegroups/{name}"))
    }

    fn web_path(&self, group: &str, kind: &str, name: &str) -> String {
        self.client.subscription_path(&format!(
            "/resourceGroups/{group}/providers/Microsoft.Web/{kind}/{name}"
        ))
    }

    /// Creates the app service plan a web app runs on.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan cannot be created.
    pub async fn create_plan(
        &self,
        group: &ResourceGroup,
        name: &str,
        region: &str,
    ) -> Result<AppServicePlan> {
        info!("Creating app service plan {name} ({})", self.plan.sku_name);

        let body = json!({
            "location": region,
            "kind": "app",
            "sku": { "name": self.plan.sku_name, "tier": self.plan.sku_tier },
            "properties": {}
        });

        let resource: ArmResource<ProvisioningProperties> = self
            .client
            .put_resource(&self.web_path(&group.name, "serverfarms", name), WEB_API_VERSION, &body)
            .await?;
        let resource = resource.or_requested(name, region);

        Ok(AppServicePlan {
            id: resource.id,
            name: resource.name,
            location: resource.location,
        })
    }

    /// Builds the site creation body.
    fn site_body(plan: &AppServicePlan, region: &str, site: &SiteConfig) -> serde_json::Value {
        json!({
            "location": region,
            "kind": "app",
            "properties": {
                "serverFarmId": plan.id,
                "siteConfig": site
            }
        })
    }
}

#[async_trait]
impl WebAppManager for ResourceProvisioner {
    async fn create_resource_group(&self, name: &str, region: &str) -> Result<ResourceGroup> {
        info!("Creating resource group {name} in {region}");

        let resource: ArmResource<ProvisioningProperties> = self
            .client
            .put_resource(
                &self.resource_group_path(name),
                RESOURCES_API_VERSION,
                &json!({ "location": region }),
            )
            .await?;

        let group = ResourceGroup::from_resource(resource.or_requested(name, region));
        info!("Created resource group {}", group.id);
        Ok(group)
    }

    async fn delete_resource_group(&self, name: &str) -> Result<()> {
        info!("Deleting resource group {name}");
        self.client
            .delete_resource(&self.resource_group_path(name), RESOURCES_API_VERSION)
            .await?;
        info!("Deleted resource group {name}");
        Ok(())
    }

    async fn create_web_app(
        &self,
        group: &ResourceGroup,
        name: &str,
        region: &str,
        site: &SiteConfig,
    ) -> Result<WebApp> {
        let plan = self.create_plan(group, &plan_name(name), region).await?;

        info!("Creating web app {name}");
        let resource: ArmResource<SiteProperties> = self
            .client
            .put_resource(
                &self.web_path(&group.name, "sites", name),
                WEB_API_VERSION,
                &Self::site_body(&plan, region, site),
            )
            .await?;

        let app = WebApp::from_resource(resource.or_requested(name, region), &group.name);
        info!("Created web app {} at {}", app.name, app.default_host_name);
        Ok(app)
    }

    async fn deploy_package(&self, app: &WebApp, package: &DeploymentPackage) -> Result<()> {
        info!("Deploying {} to {}", package.uri, app.name);

        let path = format!(
            "{}/extensions/MSDeploy",
            self.web_path(&app.resource_group, "sites", &app.name)
        );
        let body = json!({
            "properties": {
                "packageUri": package.uri,
                "appOffline": package.app_offline
            }
        });

        let resource: ArmResource<MsDeployProperties> =
            self.client.put_resource(&path, WEB_API_VERSION, &body).await?;

        match resource.properties.provisioning_state.as_deref() {
            Some(state) if !is_success_state(state) => {
                Err(SampleError::Azure(AzureError::OperationFailed {
                    operation: format!("deploy to {}", app.name),
                    status: state.to_string(),
                }))
            }
            _ => {
                debug!("MSDeploy complete: {:?}", resource.properties.complete);
                info!("Deployed {} to {}", package.uri, app.name);
                Ok(())
            }
        }
    }

    async fn publishing_profile_stream(
        &self,
        app: &WebApp,
        format: PublishingProfileFormat,
    ) -> Result<Box<dyn LineSource>> {
        info!("Opening {format} publishing profile for {}", app.name);

        let path = format!(
            "{}/publishxml",
            self.web_path(&app.resource_group, "sites", &app.name)
        );
        let response = self
            .client
            .post_for_stream(&path, WEB_API_VERSION, &json!({ "format": format.as_str() }))
            .await?;

        Ok(Box::new(ResponseLines::new(response)))
    }
}
