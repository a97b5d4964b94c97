//! nacos-watch - Nacos service instance watcher
//!
//! A CLI tool that polls a Nacos registry for the instances of a set of
//! services and reports which services have instance-level problems.
//!
//! Exit codes:
//!   0 - Success (or nothing to list)
//!   1 - Login failure, configuration error, or access token rejected
//!   2 - Flagged services found with --fail-on-flagged

mod analysis;
mod cli;
mod config;
mod models;
mod registry;
mod report;

use anyhow::{Context, Result};
use cli::{Args, Command, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use models::TickReport;
use registry::{RegistryClient, RegistryConfig, RegistryError};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("nacos-watch v{}", env!("CARGO_PKG_VERSION"));

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\nError: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .nacos-watch.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("Edit it to set the registry host, namespace and services.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout only carries report lines.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Log in and run the requested command. Returns the process exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let password = args
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .context("Missing password (--password or NACOS_PASSWORD)")?;

    let mut client = RegistryClient::new(RegistryConfig::from(&config.registry))?;

    if let Err(e) = client.login(&config.registry.username, password).await {
        if let RegistryError::LoginRejected { ref body, .. } = e {
            println!("{}", body);
        }
        error!("Login failed: {}", e);
        println!("Login failed");
        return Ok(1);
    }

    println!(
        "Logged in on '{}' as '{}'",
        client.config().host,
        config.registry.username
    );
    println!("Using namespace: '{}'", client.config().namespace);
    println!();

    match args.command {
        Some(Command::ListInstances) => list_instances(&client, &config, &args).await,
        None => Ok(0),
    }
}

/// Run the list-instances command once, or repeatedly with --watch.
async fn list_instances(client: &RegistryClient, config: &Config, args: &Args) -> Result<i32> {
    let services = &config.services.names;
    if services.is_empty() {
        info!("No services given, nothing to list");
        return Ok(0);
    }

    debug!(services = ?services, "Listing instances");

    if !args.watch {
        let report = analysis::run_tick(client, services).await;
        print_report(&report, args.format)?;

        if args.fail_on_flagged && report.flagged_count() > 0 {
            eprintln!(
                "\n{} flagged service(s) found. Failing (exit code 2).",
                report.flagged_count()
            );
            return Ok(2);
        }
        return Ok(0);
    }

    if args.fail_on_flagged {
        warn!("--fail-on-flagged has no effect in watch mode");
    }

    let interval = Duration::from_secs(config.watch.interval_seconds);
    info!("Watching {} services every {:?}", services.len(), interval);

    tokio::select! {
        result = watch_loop(client, services, interval, args.format) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping watch");
            Ok(0)
        }
    }
}

/// Tick forever, one tick at a time, until the token is rejected.
async fn watch_loop(
    client: &RegistryClient,
    services: &[String],
    interval: Duration,
    format: OutputFormat,
) -> Result<i32> {
    loop {
        let report = analysis::run_tick(client, services).await;
        print_report(&report, format)?;

        if report.token_rejected {
            error!("Access token was rejected by the registry; log in again");
            return Ok(1);
        }

        tokio::time::sleep(interval).await;
    }
}

/// Print one tick in the requested format.
fn print_report(tick: &TickReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", report::render_text(tick)),
        OutputFormat::Json => println!("{}", report::render_json(tick)?),
    }
    std::io::stdout().flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
