//! Azure management integration module.
//!
//! This module provides everything the sample needs from Azure: client-secret
//! authentication, the Resource Manager client, resource provisioning,
//! package deployment with endpoint warm-up, and publishing-profile streaming.

mod auth;
mod client;
mod deployment;
#[cfg_attr(test, allow(missing_docs))]
mod http;
mod log_stream;
#[cfg_attr(test, allow(missing_docs))]
mod manager;
mod provisioner;
mod types;

#[cfg(test)]
pub(crate) mod test_support;
#[cfg(test)]
pub(crate) use http::MockHttpFetcher;
#[cfg(test)]
pub(crate) use manager::MockWebAppManager;

pub use auth::{
    AccessToken, AzureCredentials, CLIENT_ID_ENV, CLIENT_SECRET_ENV, ClientSecretCredential,
    SUBSCRIPTION_ID_ENV, TENANT_ID_ENV,
};
pub use client::ArmClient;
pub use deployment::{DeploymentReport, DeploymentTrigger, ProbeResult, WarmupSchedule};
pub use http::{HttpFetcher, HttpHelper, PLAYBACK_SENTINEL};
pub use log_stream::{LineSource, LogStreamer, ResponseLines, StreamEnd, StreamSummary};
pub use manager::WebAppManager;
pub use provisioner::{RESOURCES_API_VERSION, ResourceProvisioner, WEB_API_VERSION};
pub use types::{
    AppServicePlan, ArmResource, DeploymentPackage, PublishingProfileFormat, ResourceGroup,
    SiteConfig, SiteProperties, WebApp,
};
