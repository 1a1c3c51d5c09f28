mod catalog;
mod cli;
mod config;
mod download;
mod error;
mod install;
mod platform;
mod select;
mod types;
mod wheel;


use anyhow::{Context, Result};
use catalog::github::build_client;
use catalog::GitHubCatalog;
use clap::Parser;
use cli::Cli;
use config::load_settings;
use console::style;
use download::Downloader;
use error::InstallError;
use install::{install_wheel, list_platforms, InstallRequest};
use platform::PlatformTag;
use std::io;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            match err.downcast_ref::<InstallError>() {
                Some(install_err) => {
                    if let InstallError::CatalogUnavailable { cause, .. }
                    | InstallError::DownloadFailed { cause, .. } = install_err
                    {
                        if cause.is_timeout() {
                            tracing::warn!("Raise the limit with --timeout or INSTALL_WHEEL_TIMEOUT");
                        }
                    }
                    if install_err.is_retryable() {
                        tracing::warn!("This failure is usually transient; re-running may succeed");
                    }
                    ExitCode::from(install_err.exit_code())
                }
                None => ExitCode::FAILURE,
            }
        }
    }
}

fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout is reserved for the listing and the downloaded path
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings()?;
    if let Some(repo) = cli.repo {
        settings.repo = repo;
    }
    if let Some(timeout) = cli.timeout {
        settings.timeout_secs = timeout;
    }
    tracing::debug!(
        "Using {} via {} (timeout {}s)",
        settings.repo,
        settings.api_url,
        settings.timeout_secs
    );

    let client = build_client(&settings).context("Could not build HTTP client")?;
    let catalog = GitHubCatalog::new(&settings, client.clone());

    if cli.list {
        let report = list_platforms(&catalog, cli.tool, cli.version.as_deref()).await?;
        match &report.version {
            Some(version) if !report.platforms.is_empty() => {
                if !cli.quiet {
                    eprintln!(
                        "Available platforms for {} in release {}:",
                        style(cli.tool).bold(),
                        style(version).bold()
                    );
                }
            }
            Some(version) => tracing::warn!("No {} wheels in release {}", cli.tool, version),
            None => tracing::warn!("No {} wheels published in {}", cli.tool, settings.repo),
        }
        report
            .write_to(&mut io::stdout().lock())
            .context("Could not write platform listing")?;
        return Ok(());
    }

    let platform = cli
        .platform
        .as_deref()
        .map(str::parse::<PlatformTag>)
        .transpose()?;

    let show_progress = !cli.quiet && console::Term::stderr().is_term();
    let downloader = Downloader::new(client, settings.timeout_secs, show_progress);
    let request = InstallRequest {
        tool: cli.tool,
        version: cli.version,
        output_dir: cli.output,
        platform,
    };

    let path = install_wheel(&catalog, &downloader, &request).await?;
    if !cli.quiet {
        eprintln!(
            "{} {}",
            style("Wheel downloaded:").green().bold(),
            path.display()
        );
    }
    println!("{}", path.display());
    Ok(())
}
