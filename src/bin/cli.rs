//! Link checker CLI
//!
//! Local execution entry point. For AWS Lambda, use `link-checker-lambda`.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use link_checker::{
    config::load_config,
    error::Result,
    models::Config,
    notify::Notifications,
    pipeline::{self, RunContext},
    storage::{LocalStorage, read_manifest},
};

/// Ad-disclosure link checker for Hatena and Livedoor blogs
#[derive(Parser, Debug)]
#[command(
    name = "link-checker",
    version,
    about = "Verifies ad-disclosure links on Hatena and Livedoor blogs"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every target and manual link listed in a manifest
    Check {
        /// Manifest JSON file
        #[arg(long)]
        manifest: PathBuf,

        /// Directory receiving the report and artifacts
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Load the config file if present, defaults otherwise.
fn resolve_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let config = load_config(path)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    } else {
        log::warn!(
            "Config file {} not found, using default configuration",
            path.display()
        );
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = resolve_config(&cli.config)?;

    match cli.command {
        Command::Check {
            manifest,
            output_dir,
        } => {
            let manifest_dir = manifest
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let manifest_name = manifest
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let manifest = read_manifest(&LocalStorage::new(manifest_dir), &manifest_name).await?;
            log::info!(
                "Loaded manifest: {} auto targets, {} manual links, {} previous failures",
                manifest.auto_url_list.len(),
                manifest.manual_url_list.len(),
                manifest.previous_error_details.len()
            );

            let ctx = RunContext::new(config)?;
            let storage = LocalStorage::new(&output_dir);
            let notifications = Notifications::from_config(&ctx.config.notify, ctx.http.clone());
            let outcome = pipeline::run_pipeline(&ctx, &manifest, &storage, &notifications).await?;

            log::info!(
                "Done: {} links, {} NG, report at {}",
                outcome.summary.total,
                outcome.summary.ng,
                outcome.report_location
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            log::info!("✓ Config OK");
            log::info!("  Workers: {}", config.crawler.max_workers);
            log::info!(
                "  Timeout: {}s, retries: {}, backoff: {}",
                config.crawler.timeout_secs,
                config.crawler.max_retries,
                config.crawler.backoff_factor
            );
            log::info!(
                "  Meta refresh: {} hops ({})",
                config.verifier.max_meta_refresh_hops,
                config.verifier.refresh_retry
            );
            log::info!("  Blocked domains: {:?}", config.policy.blocked_domains);
            log::info!(
                "  Platform escape: {} ('{}')",
                if config.policy.platform_escape.enabled {
                    "on"
                } else {
                    "off"
                },
                config.policy.platform_escape.token
            );
            log::info!("  Report key: {}", config.output.report_key);
        }
    }

    Ok(())
}
