//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.nacos-watch.toml` files.

use crate::registry::RegistryConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".nacos-watch.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Registry connection settings.
    #[serde(default)]
    pub registry: RegistrySection,

    /// Watch loop settings.
    #[serde(default)]
    pub watch: WatchSection,

    /// Services to inspect.
    #[serde(default)]
    pub services: ServicesSection,
}

/// Registry connection and query settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySection {
    /// Registry base URL.
    #[serde(default)]
    pub host: String,

    /// Login user. The password is only taken from the CLI or environment.
    #[serde(default)]
    pub username: String,

    /// Namespace id.
    #[serde(default)]
    pub namespace: String,

    /// Service group name.
    #[serde(default = "default_group")]
    pub group: String,

    /// Cluster name.
    #[serde(default = "default_cluster")]
    pub cluster: String,

    /// Instances requested per service (a single page is fetched).
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Page number to fetch.
    #[serde(default = "default_page")]
    pub page: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            namespace: String::new(),
            group: default_group(),
            cluster: default_cluster(),
            page_size: default_page_size(),
            page: default_page(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_group() -> String {
    "DEFAULT_GROUP".to_string()
}

fn default_cluster() -> String {
    "DEFAULT".to_string()
}

fn default_page_size() -> u32 {
    200
}

fn default_page() -> u32 {
    1
}

fn default_timeout() -> u64 {
    1000
}

/// Watch loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchSection {
    /// Seconds between two ticks.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    1
}

/// Services to inspect when --services is not given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesSection {
    #[serde(default)]
    pub names: Vec<String>,
}

impl From<&RegistrySection> for RegistryConfig {
    fn from(section: &RegistrySection) -> Self {
        Self {
            host: section.host.clone(),
            namespace: section.namespace.clone(),
            group: section.group.clone(),
            cluster: section.cluster.clone(),
            page_size: section.page_size,
            page: section.page,
            timeout_seconds: section.timeout_seconds,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values the CLI actually provides override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref host) = args.host {
            self.registry.host = host.clone();
        }
        if let Some(ref username) = args.username {
            self.registry.username = username.clone();
        }
        if let Some(ref namespace) = args.namespace {
            self.registry.namespace = namespace.clone();
        }
        if let Some(ref group) = args.group {
            self.registry.group = group.clone();
        }
        if let Some(ref cluster) = args.cluster {
            self.registry.cluster = cluster.clone();
        }
        if let Some(page_size) = args.page_size {
            self.registry.page_size = page_size;
        }
        if let Some(timeout) = args.timeout {
            self.registry.timeout_seconds = timeout;
        }

        if let Some(interval) = args.interval {
            self.watch.interval_seconds = interval;
        }

        if let Some(names) = args.service_names() {
            self.services.names = names;
        }
    }

    /// Check that the merged settings are complete enough to log in and query.
    pub fn validate(&self) -> Result<()> {
        if self.registry.host.trim().is_empty() {
            bail!("Missing registry host (--host, NACOS_HOST or [registry].host)");
        }
        if self.registry.username.trim().is_empty() {
            bail!("Missing username (--username, NACOS_USERNAME or [registry].username)");
        }
        if self.registry.namespace.trim().is_empty() {
            bail!("Missing namespace (--namespace, NACOS_NAMESPACE or [registry].namespace)");
        }
        if self.registry.page_size == 0 {
            bail!("[registry].page_size must be at least 1");
        }
        if self.watch.interval_seconds == 0 {
            bail!("[watch].interval_seconds must be at least 1");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    fn parse_args(extra: &[&str]) -> Args {
        let mut argv = vec!["nacos-watch", "--command", "list-instances"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.registry.group, "DEFAULT_GROUP");
        assert_eq!(config.registry.cluster, "DEFAULT");
        assert_eq!(config.registry.page_size, 200);
        assert_eq!(config.registry.timeout_seconds, 1000);
        assert_eq!(config.watch.interval_seconds, 1);
        assert!(config.services.names.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[registry]
host = "http://nacos:8848"
namespace = "prod"
group = "PAYMENTS"

[watch]
interval_seconds = 5

[services]
names = ["orders", "payments"]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.registry.host, "http://nacos:8848");
        assert_eq!(config.registry.namespace, "prod");
        assert_eq!(config.registry.group, "PAYMENTS");
        assert_eq!(config.registry.cluster, "DEFAULT");
        assert_eq!(config.watch.interval_seconds, 5);
        assert_eq!(config.services.names, vec!["orders", "payments"]);
    }

    #[test]
    fn test_merge_cli_overrides_file() {
        let mut config: Config = toml::from_str(
            r#"
[registry]
host = "http://file-host:8848"
namespace = "file-ns"
cluster = "FILE"

[services]
names = ["from-file"]
"#,
        )
        .unwrap();

        let args = parse_args(&[
            "--host",
            "http://cli-host:8848",
            "--username",
            "nacos",
            "--services",
            "a,b",
            "--timeout",
            "30",
        ]);
        config.merge_with_args(&args);

        assert_eq!(config.registry.host, "http://cli-host:8848");
        assert_eq!(config.registry.cluster, "FILE");
        assert_eq!(config.registry.timeout_seconds, 30);
        assert_eq!(config.services.names, vec!["a", "b"]);
        // Only overridden when the CLI actually provides a value.
        if std::env::var("NACOS_NAMESPACE").is_err() {
            assert_eq!(config.registry.namespace, "file-ns");
        }
    }

    #[test]
    fn test_validate_requires_connection_settings() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.registry.host = "http://nacos:8848".to_string();
        config.registry.username = "nacos".to_string();
        assert!(config.validate().is_err());

        config.registry.namespace = "dev".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_registry_config_from_section() {
        let section = RegistrySection {
            host: "http://nacos:8848".to_string(),
            namespace: "dev".to_string(),
            page_size: 50,
            ..RegistrySection::default()
        };

        let registry = RegistryConfig::from(&section);
        assert_eq!(registry.host, "http://nacos:8848");
        assert_eq!(registry.page_size, 50);
        assert_eq!(registry.page, 1);
        assert_eq!(registry.group, "DEFAULT_GROUP");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[registry]\nnamespace = \"staging\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.registry.namespace, "staging");
        assert_eq!(config.registry.page_size, 200);

        std::fs::write(&path, "[registry\nbroken").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[registry]"));
        assert!(toml_str.contains("[watch]"));
        assert!(toml_str.contains("DEFAULT_GROUP"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.registry.page_size, 200);
    }
}
