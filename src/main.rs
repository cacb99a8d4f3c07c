//! `webapp-sample` CLI entrypoint.
//!
//! This is the main entrypoint for the web app sample command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use webapp_deploy_sample::azure::{
    ArmClient, AzureCredentials, HttpFetcher, HttpHelper, ResourceProvisioner,
};
use webapp_deploy_sample::cleanup::ResourceGroupGuard;
use webapp_deploy_sample::cli::{Cli, Commands, OutputFormatter};
use webapp_deploy_sample::config::{
    ConfigParser, ConfigValidator, SampleSettings, find_settings_file,
};
use webapp_deploy_sample::error::Result;
use webapp_deploy_sample::sample::WebAppSample;

use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_json);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<ExitCode> {
    let formatter = OutputFormatter::new(cli.output);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Run {
            playback,
            region,
            package_url,
            log_timeout,
        } => {
            let mut settings = load_settings(config)?;
            settings.playback |= playback;
            if let Some(region) = region {
                settings.region = region;
            }
            if let Some(url) = package_url {
                settings.package_url = url;
            }
            if let Some(secs) = log_timeout {
                settings.log_stream_timeout_secs = secs;
            }
            cmd_run(settings, &formatter).await
        }
        Commands::Validate => cmd_validate(config, &formatter),
        Commands::Probe { url, playback } => {
            let settings = load_settings(config)?;
            cmd_probe(&url, settings.playback || playback, &formatter).await
        }
        Commands::Cleanup { resource_group } => {
            let settings = load_settings(config)?;
            cmd_cleanup(&settings, &resource_group, &formatter).await
        }
    }
}

/// Runs the full sample.
async fn cmd_run(settings: SampleSettings, formatter: &OutputFormatter) -> Result<ExitCode> {
    for warning in ConfigValidator::new().validate(&settings)?.warnings {
        warn!("{warning}");
    }

    if settings.playback {
        info!("Playback mode: HTTP probes return a fixed sentinel");
    }

    let provisioner = Arc::new(create_provisioner(&settings)?);
    let fetcher: Arc<dyn HttpFetcher> = Arc::new(HttpHelper::new(settings.playback)?);
    let sample = WebAppSample::new(provisioner, fetcher, settings);

    let report = sample
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await;

    eprintln!("{}", formatter.format_report(&report));

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Validates the settings.
fn cmd_validate(config_path: Option<&Path>, formatter: &OutputFormatter) -> Result<ExitCode> {
    let settings = load_settings(config_path)?;
    let result = ConfigValidator::new().validate(&settings)?;

    eprintln!("{}", formatter.format_validation(&settings, &result));
    Ok(ExitCode::SUCCESS)
}

/// Fetches one URL through the HTTP helper.
async fn cmd_probe(url: &str, playback: bool, formatter: &OutputFormatter) -> Result<ExitCode> {
    let helper = HttpHelper::new(playback)?;
    let body = helper.get(url).await?;

    eprintln!("{}", formatter.format_probe(url, &body));
    Ok(ExitCode::SUCCESS)
}

/// Deletes a resource group by name.
async fn cmd_cleanup(
    settings: &SampleSettings,
    resource_group: &str,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let provisioner = Arc::new(create_provisioner(settings)?);

    let mut guard = ResourceGroupGuard::new(provisioner);
    guard.acquire(resource_group);
    let outcome = guard.release().await;

    eprintln!("{}", formatter.format_cleanup(&outcome));
    Ok(if outcome.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// Helper functions

/// Loads `.env` and the settings file, if any.
fn load_settings(config_path: Option<&Path>) -> Result<SampleSettings> {
    let config_file = config_path.map(Path::to_path_buf).or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(find_settings_file)
    });

    let base_path = config_file
        .as_deref()
        .and_then(Path::parent)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    let parser = ConfigParser::new().with_base_path(base_path);
    parser.load_dotenv()?;

    match &config_file {
        Some(path) => debug!("Loading settings from: {}", path.display()),
        None => debug!("No settings file found, using defaults"),
    }

    parser.load(config_file.as_deref())
}

/// Builds the management client from the environment.
fn create_provisioner(settings: &SampleSettings) -> Result<ResourceProvisioner> {
    let credentials = AzureCredentials::from_env();
    let missing = credentials.missing();
    if !missing.is_empty() {
        // The first API call reports this as an authentication failure.
        warn!("Missing credential variables: {}", missing.join(", "));
    }

    let client = ArmClient::new(credentials, settings)?;
    Ok(ResourceProvisioner::new(client, settings.plan.clone()))
}
