//! Deployment trigger and endpoint warm-up.
//!
//! After a fixed delay the package is deployed, then the app is probed at
//! fixed offsets from deploy completion. The trigger normally runs detached:
//! nothing waits for it or cancels it.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::config::SampleSettings;
use crate::error::Result;

use super::http::HttpFetcher;
use super::manager::WebAppManager;
use super::types::{DeploymentPackage, WebApp};

/// Delay and probe offsets of the warm-up sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmupSchedule {
    /// Delay before deploying.
    pub deploy_delay: Duration,
    /// Probe offsets measured from deploy completion.
    pub probe_offsets: Vec<Duration>,
    /// Path probed on the app.
    pub probe_path: String,
}

impl WarmupSchedule {
    /// Builds the schedule from settings.
    #[must_use]
    pub fn from_settings(settings: &SampleSettings) -> Self {
        Self {
            deploy_delay: settings.deploy_delay(),
            probe_offsets: settings.probe_offsets(),
            probe_path: settings.probe_path.clone(),
        }
    }
}

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// Offset from deploy completion.
    pub offset: Duration,
    /// Probed URL.
    pub url: String,
    /// Body on success.
    pub body: Option<String>,
    /// Error text on failure.
    pub error: Option<String>,
}

/// Outcome of the whole trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    /// Deployed package URL.
    pub package_uri: String,
    /// Probes in the order they ran.
    pub probes: Vec<ProbeResult>,
}

/// Deploys a package and warms up the endpoint.
pub struct DeploymentTrigger<M: ?Sized> {
    /// Management operations.
    manager: Arc<M>,
    /// Probe transport.
    fetcher: Arc<dyn HttpFetcher>,
    /// Target app.
    app: WebApp,
    /// Package to deploy.
    package: DeploymentPackage,
    /// Timing.
    schedule: WarmupSchedule,
}

impl<M: WebAppManager + ?Sized + 'static> DeploymentTrigger<M> {
    /// Creates a trigger for `app`.
    #[must_use]
    pub fn new(
        manager: Arc<M>,
        fetcher: Arc<dyn HttpFetcher>,
        app: WebApp,
        package: DeploymentPackage,
        schedule: WarmupSchedule,
    ) -> Self {
        Self {
            manager,
            fetcher,
            app,
            package,
            schedule,
        }
    }

    /// Waits, deploys, then probes.
    ///
    /// # Errors
    ///
    /// Returns an error if the deployment fails. Probe failures are recorded
    /// in the report instead.
    pub async fn run(self) -> Result<DeploymentReport> {
        tokio::time::sleep(self.schedule.deploy_delay).await;

        self.manager.deploy_package(&self.app, &self.package).await?;
        let deployed_at = Instant::now();

        let url = self.app.url_for(&self.schedule.probe_path);
        let mut probes = Vec::with_capacity(self.schedule.probe_offsets.len());

        for offset in &self.schedule.probe_offsets {
            tokio::time::sleep_until(deployed_at + *offset).await;
            probes.push(self.probe(&url, *offset).await);
        }

        Ok(DeploymentReport {
            package_uri: self.package.uri,
            probes,
        })
    }

    async fn probe(&self, url: &str, offset: Duration) -> ProbeResult {
        info!("Probing {url} (+{}s)", offset.as_secs());

        match self.fetcher.get(url).await {
            Ok(body) => {
                info!("{body}");
                ProbeResult {
                    offset,
                    url: url.to_string(),
                    body: Some(body),
                    error: None,
                }
            }
            Err(e) => {
                warn!("Probe of {url} failed: {e}");
                ProbeResult {
                    offset,
                    url: url.to_string(),
                    body: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Runs the trigger on its own task. Dropping the handle leaves the task
    /// running.
    pub fn spawn(self) -> JoinHandle<()> {
        let app = self.app.name.clone();
        tokio::spawn(async move {
            match self.run().await {
                Ok(report) => info!(
                    "Warm-up of {app} finished: {} probes after deploying {}",
                    report.probes.len(),
                    report.package_uri
                ),
                Err(e) => error!("Deployment to {app} failed: {e}"),
            }
        })
    }
}
