//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// nacos-watch - Nacos service instance watcher
///
/// Logs in to a Nacos registry, lists the instances of the given services
/// and flags every service with unhealthy, disabled or zero-weight
/// instances (or no instances at all).
///
/// Examples:
///   nacos-watch --host http://nacos:8848 --username nacos --password nacos \
///       --namespace dev --command list-instances --services orders,payments
///   nacos-watch ... --services orders --watch --interval 5
///   nacos-watch --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Registry base URL, e.g. http://localhost:8848
    #[arg(long, value_name = "URL", env = "NACOS_HOST")]
    pub host: Option<String>,

    /// Username for the registry login
    #[arg(long, env = "NACOS_USERNAME")]
    pub username: Option<String>,

    /// Password for the registry login
    #[arg(long, env = "NACOS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Namespace id to query
    #[arg(long, env = "NACOS_NAMESPACE")]
    pub namespace: Option<String>,

    /// Command to run
    #[arg(long, value_name = "COMMAND", required_unless_present = "init_config")]
    pub command: Option<Command>,

    /// Service names to inspect (comma-separated)
    ///
    /// Example: --services orders,payments
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub services: Option<Vec<String>>,

    /// Keep polling until interrupted
    #[arg(long)]
    pub watch: bool,

    /// Seconds between two polls in watch mode
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Service group name
    #[arg(long, value_name = "GROUP")]
    pub group: Option<String>,

    /// Cluster name
    #[arg(long, value_name = "CLUSTER")]
    pub cluster: Option<String>,

    /// Maximum number of instances requested per service
    #[arg(long, value_name = "COUNT")]
    pub page_size: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .nacos-watch.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Exit with code 2 when any service is flagged (single run only)
    #[arg(long)]
    pub fail_on_flagged: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .nacos-watch.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Supported commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Command {
    /// List the instances of every service given by --services
    ListInstances,
}

/// Output format for tick reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line per service (default)
    #[default]
    Text,
    /// One JSON object per tick
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref host) = self.host {
            if !host.starts_with("http://") && !host.starts_with("https://") {
                return Err("Host must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.interval == Some(0) {
            return Err("Interval must be at least 1 second".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.page_size == Some(0) {
            return Err("Page size must be at least 1".to_string());
        }

        Ok(())
    }

    /// Service names from --services, trimmed, with empty entries dropped.
    pub fn service_names(&self) -> Option<Vec<String>> {
        self.services.as_ref().map(|names| {
            names
                .iter()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .map(String::from)
                .collect()
        })
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            host: Some("http://localhost:8848".to_string()),
            username: Some("nacos".to_string()),
            password: Some("nacos".to_string()),
            namespace: Some("dev".to_string()),
            command: Some(Command::ListInstances),
            services: None,
            watch: false,
            interval: None,
            group: None,
            cluster: None,
            page_size: None,
            timeout: None,
            config: None,
            format: OutputFormat::Text,
            fail_on_flagged: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::try_parse_from([
            "nacos-watch",
            "--host",
            "http://nacos:8848",
            "--username",
            "admin",
            "--password",
            "pw",
            "--namespace",
            "prod",
            "--command",
            "list-instances",
            "--services",
            "orders,payments",
            "--watch",
        ])
        .unwrap();

        assert_eq!(args.host.as_deref(), Some("http://nacos:8848"));
        assert_eq!(args.command, Some(Command::ListInstances));
        assert_eq!(
            args.service_names(),
            Some(vec!["orders".to_string(), "payments".to_string()])
        );
        assert!(args.watch);
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn test_parse_rejects_unknown_command() {
        let result = Args::try_parse_from(["nacos-watch", "--command", "delete-everything"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_service_names_trimmed() {
        let mut args = make_args();
        args.services = Some(vec![" orders".into(), "".into(), "payments ".into()]);
        assert_eq!(
            args.service_names(),
            Some(vec!["orders".to_string(), "payments".to_string()])
        );

        args.services = None;
        assert_eq!(args.service_names(), None);
    }

    #[test]
    fn test_validation_invalid_host() {
        let mut args = make_args();
        args.host = Some("nacos:8848".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_values() {
        let mut args = make_args();
        args.interval = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.page_size = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
