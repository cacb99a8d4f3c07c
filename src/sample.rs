//! The sample run.
//!
//! A run creates a resource group and a web app, opens the publishing-profile
//! stream, launches the deployment trigger as a detached task, reads the stream
//! for a bounded time, and finally releases the resource group. Release happens
//! on success, on error, and when the run is interrupted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::azure::{
    DeploymentPackage, DeploymentTrigger, HttpFetcher, LogStreamer, PublishingProfileFormat,
    SiteConfig, StreamSummary, WarmupSchedule, WebAppManager,
};
use crate::cleanup::{CleanupOutcome, ResourceGroupGuard};
use crate::config::{SampleNames, SampleSettings};
use crate::error::{Result, SampleError};

/// Summary of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Resource group name used by the run.
    pub resource_group: String,
    /// Web app name used by the run.
    pub web_app: String,
    /// Host name of the created web app.
    pub host_name: Option<String>,
    /// Package handed to the deployment trigger.
    pub package_uri: String,
    /// Whether the deployment trigger was launched.
    pub deployment_launched: bool,
    /// Publishing-profile read loop result.
    pub log_stream: Option<StreamSummary>,
    /// Resource group release.
    pub cleanup: CleanupOutcome,
    /// Run start.
    pub started_at: DateTime<Utc>,
    /// Run end, after cleanup.
    pub finished_at: DateTime<Utc>,
    /// Error that ended the run early.
    pub error: Option<String>,
}

impl RunReport {
    /// Returns true if the run finished without error. Cleanup failures do
    /// not count.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Partial results collected while the run progresses.
#[derive(Debug, Default)]
struct Progress {
    host_name: Option<String>,
    deployment_launched: bool,
    log_stream: Option<StreamSummary>,
}

/// Drives one provisioning, deployment and teardown cycle.
pub struct WebAppSample<M: WebAppManager + ?Sized + 'static> {
    /// Management operations.
    manager: Arc<M>,
    /// Probe transport handed to the deployment trigger.
    fetcher: Arc<dyn HttpFetcher>,
    /// Run settings.
    settings: SampleSettings,
}

impl<M: WebAppManager + ?Sized + 'static> WebAppSample<M> {
    /// Creates a new sample.
    #[must_use]
    pub fn new(manager: Arc<M>, fetcher: Arc<dyn HttpFetcher>, settings: SampleSettings) -> Self {
        Self {
            manager,
            fetcher,
            settings,
        }
    }

    /// Runs the sample to completion with freshly generated names.
    pub async fn run(&self) -> RunReport {
        self.run_until(std::future::pending()).await
    }

    /// Runs the sample until it finishes or `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RunReport
    where
        F: Future<Output = ()>,
    {
        let names = SampleNames::generate(&self.settings.naming);
        self.run_named(names, shutdown).await
    }

    /// Runs the sample with the given names.
    pub async fn run_named<F>(&self, names: SampleNames, shutdown: F) -> RunReport
    where
        F: Future<Output = ()>,
    {
        let started_at = Utc::now();
        info!(
            "Starting run: resource group {}, web app {}",
            names.resource_group, names.web_app
        );

        let mut guard = ResourceGroupGuard::new(Arc::clone(&self.manager));
        let mut progress = Progress::default();

        let result = tokio::select! {
            result = self.execute(&names, &mut guard, &mut progress) => result,
            () = shutdown => {
                warn!("Run interrupted, cleaning up");
                Err(SampleError::Cancelled)
            }
        };

        if let Err(e) = &result {
            error!("{e}");
        }

        let cleanup = guard.release().await;

        RunReport {
            resource_group: names.resource_group,
            web_app: names.web_app,
            host_name: progress.host_name,
            package_uri: self.settings.package_url.clone(),
            deployment_launched: progress.deployment_launched,
            log_stream: progress.log_stream,
            cleanup,
            started_at,
            finished_at: Utc::now(),
            error: result.err().map(|e| e.to_string()),
        }
    }

    async fn execute(
        &self,
        names: &SampleNames,
        guard: &mut ResourceGroupGuard<M>,
        progress: &mut Progress,
    ) -> Result<()> {
        let region = self.settings.region.as_str();

        info!("Creating resource group: {}", names.resource_group);
        guard.acquire(names.resource_group.as_str());
        let group = self
            .manager
            .create_resource_group(&names.resource_group, region)
            .await?;

        info!("Creating web app: {}", names.web_app);
        let site = SiteConfig::from(&self.settings.site);
        let app = self
            .manager
            .create_web_app(&group, &names.web_app, region, &site)
            .await?;
        progress.host_name = Some(app.default_host_name.clone());

        let stream = self
            .manager
            .publishing_profile_stream(&app, PublishingProfileFormat::Ftp)
            .await?;

        let trigger = DeploymentTrigger::new(
            Arc::clone(&self.manager),
            Arc::clone(&self.fetcher),
            app,
            DeploymentPackage::online(&self.settings.package_url),
            WarmupSchedule::from_settings(&self.settings),
        );
        let _detached = trigger.spawn();
        progress.deployment_launched = true;

        let summary = LogStreamer::new(self.settings.log_stream_timeout())
            .stream(stream)
            .await?;
        progress.log_stream = Some(summary);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::{LineSource, ResourceGroup, StreamEnd, WebApp};
    use crate::error::AzureError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    /// Which call the fake manager fails.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    enum FailAt {
        #[default]
        Nothing,
        /// The create request is accepted but the operation fails.
        ResourceGroup,
        /// The create request is rejected outright.
        ResourceGroupRejected,
        WebApp,
        Stream,
        Delete,
    }

    #[derive(Default)]
    struct FakeManager {
        fail_at: FailAt,
        stall_stream: bool,
        slow_create: bool,
        group_exists: AtomicBool,
        deleted: Mutex<Vec<String>>,
        create_group_calls: AtomicUsize,
        create_app_calls: AtomicUsize,
        deploy_calls: AtomicUsize,
        delete_calls: AtomicUsize,
    }

    struct FakeLines {
        remaining: usize,
        stall: bool,
    }

    #[async_trait]
    impl LineSource for FakeLines {
        async fn next_line(&mut self) -> Result<Option<String>> {
            if self.remaining > 0 {
                self.remaining -= 1;
                return Ok(Some(String::from("<publishProfile/>")));
            }
            if self.stall {
                std::future::pending::<()>().await;
            }
            Ok(None)
        }
    }

    fn failure(what: &str) -> SampleError {
        SampleError::Azure(AzureError::api_error(500, "InternalServerError", what))
    }

    #[async_trait]
    impl WebAppManager for FakeManager {
        async fn create_resource_group(&self, name: &str, region: &str) -> Result<ResourceGroup> {
            self.create_group_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_at == FailAt::ResourceGroupRejected {
                return Err(failure("resource group"));
            }
            self.group_exists.store(true, Ordering::SeqCst);
            if self.slow_create {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.fail_at == FailAt::ResourceGroup {
                return Err(failure("resource group"));
            }
            Ok(ResourceGroup {
                id: format!("/subscriptions/sub/resourceGroups/{name}"),
                name: name.to_string(),
                location: region.to_string(),
                provisioning_state: Some(String::from("Succeeded")),
            })
        }

        async fn delete_resource_group(&self, name: &str) -> Result<()> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            self.deleted.lock().expect("lock").push(name.to_string());
            if self.fail_at == FailAt::Delete {
                return Err(failure("delete"));
            }
            if !self.group_exists.load(Ordering::SeqCst) {
                return Err(SampleError::Azure(AzureError::ResourceNotFound {
                    resource: name.to_string(),
                }));
            }
            Ok(())
        }

        async fn create_web_app(
            &self,
            group: &ResourceGroup,
            name: &str,
            region: &str,
            _site: &SiteConfig,
        ) -> Result<WebApp> {
            self.create_app_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_at == FailAt::WebApp {
                return Err(failure("web app"));
            }
            Ok(WebApp {
                id: format!("{}/providers/Microsoft.Web/sites/{name}", group.id),
                name: name.to_string(),
                resource_group: group.name.clone(),
                location: region.to_string(),
                default_host_name: format!("{name}.azurewebsites.net"),
                state: Some(String::from("Running")),
            })
        }

        async fn deploy_package(&self, _app: &WebApp, package: &DeploymentPackage) -> Result<()> {
            assert_eq!(package.uri, crate::config::DEFAULT_PACKAGE_URL);
            assert!(!package.app_offline);
            self.deploy_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn publishing_profile_stream(
            &self,
            _app: &WebApp,
            format: PublishingProfileFormat,
        ) -> Result<Box<dyn LineSource>> {
            assert_eq!(format, PublishingProfileFormat::Ftp);
            if self.fail_at == FailAt::Stream {
                return Err(failure("stream"));
            }
            Ok(Box::new(FakeLines {
                remaining: 3,
                stall: self.stall_stream,
            }))
        }
    }

    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpFetcher for CountingFetcher {
        async fn get(&self, _url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(String::from(crate::azure::PLAYBACK_SENTINEL))
        }

        async fn post(&self, _url: &str, _body: &str) -> Result<String> {
            Ok(String::from(crate::azure::PLAYBACK_SENTINEL))
        }
    }

    fn sample(manager: &Arc<FakeManager>, fetcher: &Arc<CountingFetcher>) -> WebAppSample<FakeManager> {
        WebAppSample::new(
            Arc::clone(manager),
            Arc::clone(fetcher) as Arc<dyn HttpFetcher>,
            SampleSettings::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run_against_endless_stream() {
        let manager = Arc::new(FakeManager {
            stall_stream: true,
            ..FakeManager::default()
        });
        let fetcher = Arc::new(CountingFetcher::default());
        let started = Instant::now();

        let report = sample(&manager, &fetcher).run().await;

        assert!(report.is_success(), "unexpected error: {:?}", report.error);
        assert_eq!(started.elapsed(), Duration::from_secs(120));
        assert!(report.resource_group.starts_with("rg1NEMV_"));
        assert!(report.web_app.starts_with("webapp1-"));
        assert!(report.deployment_launched);

        let stream = report.log_stream.expect("stream summary");
        assert_eq!(stream.lines_read, 3);
        assert_eq!(stream.end, StreamEnd::TimedOut);

        assert_eq!(manager.create_group_calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.create_app_calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.deploy_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
        assert_eq!(manager.delete_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            report.cleanup,
            CleanupOutcome::Deleted {
                resource_group: report.resource_group.clone()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_stream_does_not_wait_for_deployment() {
        let manager = Arc::new(FakeManager {
            fail_at: FailAt::Nothing,
            ..FakeManager::default()
        });
        let fetcher = Arc::new(CountingFetcher::default());
        let started = Instant::now();

        let report = sample(&manager, &fetcher).run().await;

        assert!(report.is_success());
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(
            report.log_stream.map(|s| s.end),
            Some(StreamEnd::Exhausted)
        );
        assert_eq!(manager.delete_calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.deploy_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_group_creation_still_deletes_group_once() {
        let manager = Arc::new(FakeManager {
            fail_at: FailAt::ResourceGroup,
            ..FakeManager::default()
        });
        let fetcher = Arc::new(CountingFetcher::default());

        let report = sample(&manager, &fetcher).run().await;

        assert!(!report.is_success());
        assert_eq!(manager.delete_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *manager.deleted.lock().expect("lock"),
            vec![report.resource_group.clone()]
        );
        assert_eq!(
            report.cleanup,
            CleanupOutcome::Deleted {
                resource_group: report.resource_group.clone()
            }
        );
        assert_eq!(manager.create_app_calls.load(Ordering::SeqCst), 0);
        assert!(!report.deployment_launched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_group_creation_needs_no_cleanup() {
        let manager = Arc::new(FakeManager {
            fail_at: FailAt::ResourceGroupRejected,
            ..FakeManager::default()
        });
        let fetcher = Arc::new(CountingFetcher::default());

        let report = sample(&manager, &fetcher).run().await;

        assert!(!report.is_success());
        assert_eq!(manager.delete_calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.cleanup, CleanupOutcome::NothingToCleanUp);
        assert_eq!(report.cleanup.to_string(), "no cleanup necessary");
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_group_creation_still_cleans_up() {
        let manager = Arc::new(FakeManager {
            slow_create: true,
            ..FakeManager::default()
        });
        let fetcher = Arc::new(CountingFetcher::default());
        let names = SampleNames {
            resource_group: String::from("rg1NEMV_creating"),
            web_app: String::from("webapp1-creating"),
        };

        let report = sample(&manager, &fetcher)
            .run_named(names, tokio::time::sleep(Duration::from_secs(30)))
            .await;

        assert_eq!(report.error.as_deref(), Some("Run cancelled"));
        assert_eq!(manager.create_app_calls.load(Ordering::SeqCst), 0);
        assert_eq!(manager.delete_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            report.cleanup,
            CleanupOutcome::Deleted {
                resource_group: String::from("rg1NEMV_creating")
            }
        );
    }

    #[tokio::test]
    async fn test_failed_create_operation_deletes_requested_group() {
        use crate::azure::ResourceProvisioner;
        use crate::azure::test_support::client_for;
        use crate::config::PlanSettings;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let provisioner = Arc::new(ResourceProvisioner::new(
            client_for(&server).await,
            PlanSettings::default(),
        ));

        Mock::given(method("PUT"))
            .and(path("/subscriptions/sub/resourcegroups/rg1NEMV_accepted"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header(
                        "Azure-AsyncOperation",
                        format!("{}/operations/create-rg", server.uri()).as_str(),
                    )
                    .insert_header("Retry-After", "0"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/create-rg"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "code": "InternalServerError", "message": "operation lost" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/subscriptions/sub/resourcegroups/rg1NEMV_accepted"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Arc::new(CountingFetcher::default());
        let sample = WebAppSample::new(
            provisioner,
            fetcher as Arc<dyn HttpFetcher>,
            SampleSettings::default(),
        );
        let names = SampleNames {
            resource_group: String::from("rg1NEMV_accepted"),
            web_app: String::from("webapp1-accepted"),
        };

        let report = sample.run_named(names, std::future::pending()).await;

        assert!(report.error.as_deref().is_some_and(|e| e.contains("operation lost")));
        assert_eq!(
            report.cleanup,
            CleanupOutcome::Deleted {
                resource_group: String::from("rg1NEMV_accepted")
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_web_app_still_deletes_group_once() {
        let manager = Arc::new(FakeManager {
            fail_at: FailAt::WebApp,
            ..FakeManager::default()
        });
        let fetcher = Arc::new(CountingFetcher::default());

        let report = sample(&manager, &fetcher).run().await;

        assert!(report.error.as_deref().is_some_and(|e| e.contains("web app")));
        assert!(report.host_name.is_none());
        assert_eq!(manager.delete_calls.load(Ordering::SeqCst), 1);
        assert!(matches!(report.cleanup, CleanupOutcome::Deleted { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stream_still_deletes_group_once() {
        let manager = Arc::new(FakeManager {
            fail_at: FailAt::Stream,
            ..FakeManager::default()
        });
        let fetcher = Arc::new(CountingFetcher::default());

        let report = sample(&manager, &fetcher).run().await;

        assert!(!report.is_success());
        assert!(report.host_name.is_some());
        assert!(!report.deployment_launched);
        assert_eq!(manager.delete_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_failure_does_not_fail_run() {
        let manager = Arc::new(FakeManager {
            fail_at: FailAt::Delete,
            ..FakeManager::default()
        });
        let fetcher = Arc::new(CountingFetcher::default());

        let report = sample(&manager, &fetcher).run().await;

        assert!(report.is_success());
        assert!(!report.cleanup.is_clean());
        assert_eq!(manager.delete_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_run_still_cleans_up() {
        let manager = Arc::new(FakeManager {
            stall_stream: true,
            ..FakeManager::default()
        });
        let fetcher = Arc::new(CountingFetcher::default());
        let names = SampleNames {
            resource_group: String::from("rg1NEMV_interrupted"),
            web_app: String::from("webapp1-interrupted"),
        };

        let report = sample(&manager, &fetcher)
            .run_named(names, tokio::time::sleep(Duration::from_secs(30)))
            .await;

        assert_eq!(report.error.as_deref(), Some("Run cancelled"));
        assert!(report.log_stream.is_none());
        assert_eq!(manager.delete_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            report.cleanup,
            CleanupOutcome::Deleted {
                resource_group: String::from("rg1NEMV_interrupted")
            }
        );
    }
}
