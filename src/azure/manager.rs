//! The management operations the sample drives.
//!
//! [`ResourceProvisioner`](super::ResourceProvisioner) implements this over the
//! Resource Manager API; tests substitute their own implementations.

use async_trait::async_trait;

use crate::error::Result;

use super::log_stream::LineSource;
use super::types::{
    DeploymentPackage, PublishingProfileFormat, ResourceGroup, SiteConfig, WebApp,
};

/// Management operations used by a sample run.
///
/// Every method waits for the underlying operation to complete.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebAppManager: Send + Sync {
    /// Creates a resource group.
    async fn create_resource_group(&self, name: &str, region: &str) -> Result<ResourceGroup>;

    /// Deletes a resource group and everything in it.
    async fn delete_resource_group(&self, name: &str) -> Result<()>;

    /// Creates a web app, with its app service plan, inside `group`.
    async fn create_web_app(
        &self,
        group: &ResourceGroup,
        name: &str,
        region: &str,
        site: &SiteConfig,
    ) -> Result<WebApp>;

    /// Deploys a package into a web app.
    async fn deploy_package(&self, app: &WebApp, package: &DeploymentPackage) -> Result<()>;

    /// Opens the publishing profile of a web app as a line stream.
    async fn publishing_profile_stream(
        &self,
        app: &WebApp,
        format: PublishingProfileFormat,
    ) -> Result<Box<dyn LineSource>>;
}
