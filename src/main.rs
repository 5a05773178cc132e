//! rosdistro-filter - Main entry point
//!
//! Filters a ROS distribution and its rosdep mappings down to what the local
//! apk repositories provide.

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use rosdistro_filter::cli::Cli;
use rosdistro_filter::config::FilterConfig;
use rosdistro_filter::fetch::HttpSource;
use rosdistro_filter::package_index::{ApkIndex, PackageIndex, SnapshotIndex};
use rosdistro_filter::pipeline::{self, RunRequest};
use rosdistro_filter::rosdep::Overrides;
use rosdistro_filter::sanity;

/// Initialize the logger with appropriate settings
fn init_logger() {
    // RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Main application entry point
fn main() {
    init_logger();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed: {:?}", cli);

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from: {:?}", path);
            FilterConfig::load_from_file(path)?
        }
        None => FilterConfig::default(),
    };
    config.validate().context("Invalid configuration")?;

    let index: Box<dyn PackageIndex> = match &cli.index_file {
        Some(path) => {
            info!("Using index snapshot: {:?}", path);
            Box::new(SnapshotIndex::new(path))
        }
        None => {
            let apk = ApkIndex::new(config.index_command.clone(), config.refresh_command.clone());
            sanity::verify_environment(apk.program())
                .into_result()
                .context("Pre-flight check failed")?;
            if cli.refresh_index {
                apk.refresh().context("Failed to refresh the package index")?;
            }
            Box::new(apk)
        }
    };

    let overrides = if cli.stage.includes_rosdep() {
        Overrides::load(&config).context("Failed to load manual rosdep entries")?
    } else {
        Overrides::default()
    };

    let source = HttpSource::new(config.request_timeout())?;
    let request = RunRequest {
        distro: cli.distro,
        output_dir: cli.output_dir,
        stage: cli.stage,
        dry_run: cli.dry_run,
    };

    let report = pipeline::run(&config, &request, index.as_ref(), &source, &overrides)
        .with_context(|| format!("Failed to filter the {} distribution", request.distro))?;

    for path in &report.written {
        info!("Wrote {}", path.display());
    }
    info!("Done ({} candidate packages)", report.candidates);

    Ok(())
}
