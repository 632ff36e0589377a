//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LEDCACHE_*)
//! 2. TOML config file (if LEDCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// How hostnames are tested against the private address ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BypassMatching {
    /// Parse the host as an IP literal and test CIDR containment.
    #[default]
    Cidr,
    /// Legacy string-prefix rules, including their over-matching of DNS
    /// names (e.g. `10.example.com` matches `10.`).
    Prefix,
}

/// Names of the two current-version stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNames {
    pub assets: String,
    pub cdn: String,
}

impl StoreNames {
    /// Store names that survive activation.
    pub fn whitelist(&self) -> Vec<String> {
        vec![self.assets.clone(), self.cdn.clone()]
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LEDCACHE_*)
/// 2. TOML config file (if LEDCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via LEDCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Keep stores in memory only; nothing survives a restart.
    #[serde(default)]
    pub ephemeral: bool,

    /// Origin of the hosted application. Manifest paths resolve against it.
    ///
    /// Set via LEDCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Base store name.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Version tag. Bump it whenever asset contents change so activation
    /// prunes the previous stores.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Suffix distinguishing the CDN store from the local-assets store.
    #[serde(default = "default_cdn_suffix")]
    pub cdn_suffix: String,

    /// Local paths precached into the assets store at install time.
    #[serde(default = "default_precache_paths")]
    pub precache_paths: Vec<String>,

    /// External URLs precached into the CDN store at install time.
    #[serde(default = "default_cdn_urls")]
    pub cdn_urls: Vec<String>,

    /// Hostname fragments identifying public CDNs, in addition to `cdn.`.
    #[serde(default = "default_cdn_hosts")]
    pub cdn_hosts: Vec<String>,

    /// Entry page served to failed navigations.
    #[serde(default = "default_fallback_document")]
    pub fallback_document: String,

    #[serde(default)]
    pub bypass_matching: BypassMatching,

    /// Networks whose hosts are the local device and must never be cached.
    /// Only consulted in `cidr` matching mode.
    #[serde(default = "default_device_networks")]
    pub device_networks: Vec<IpNet>,

    /// Activate right after install instead of waiting for old pages to close.
    #[serde(default = "default_true")]
    pub skip_waiting_on_install: bool,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via LEDCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via LEDCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./ledcache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080/".into()
}

fn default_cache_name() -> String {
    "led-display".into()
}

fn default_cache_version() -> String {
    "v1.1".into()
}

fn default_cdn_suffix() -> String {
    "-cdn".into()
}

fn default_precache_paths() -> Vec<String> {
    ["./", "./index.html", "./manifest.json", "./images/logo.png", "./images/logoPerso.png"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_cdn_urls() -> Vec<String> {
    vec!["https://cdn.tailwindcss.com".into()]
}

fn default_cdn_hosts() -> Vec<String> {
    vec!["unpkg.com".into(), "jsdelivr.net".into()]
}

fn default_fallback_document() -> String {
    "./index.html".into()
}

fn default_device_networks() -> Vec<IpNet> {
    ["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16", "fc00::/7"]
        .into_iter()
        .filter_map(|net| net.parse().ok())
        .collect()
}

fn default_user_agent() -> String {
    "ledcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            ephemeral: false,
            origin: default_origin(),
            cache_name: default_cache_name(),
            cache_version: default_cache_version(),
            cdn_suffix: default_cdn_suffix(),
            precache_paths: default_precache_paths(),
            cdn_urls: default_cdn_urls(),
            cdn_hosts: default_cdn_hosts(),
            fallback_document: default_fallback_document(),
            bypass_matching: BypassMatching::default(),
            device_networks: default_device_networks(),
            skip_waiting_on_install: true,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Current-version store names: `<name>-<version>` and the same with the
    /// CDN suffix appended.
    pub fn store_names(&self) -> StoreNames {
        let assets = format!("{}-{}", self.cache_name, self.cache_version);
        let cdn = format!("{assets}{}", self.cdn_suffix);
        StoreNames { assets, cdn }
    }

    /// Parsed application origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is not an absolute URL.
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Resolve a manifest path (e.g. `./index.html`) against the origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin or the joined URL is invalid.
    pub fn resolve(&self, path: &str) -> Result<url::Url, ConfigError> {
        self.origin_url()?
            .join(path)
            .map_err(|e| ConfigError::Invalid { field: "precache_paths".into(), reason: format!("{path}: {e}") })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LEDCACHE_`
    /// 2. TOML file from `LEDCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LEDCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LEDCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./ledcache.sqlite"));
        assert_eq!(config.user_agent, "ledcache/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.precache_paths.len(), 5);
        assert_eq!(config.cdn_urls, vec!["https://cdn.tailwindcss.com".to_string()]);
        assert_eq!(config.bypass_matching, BypassMatching::Cidr);
        assert_eq!(config.device_networks.len(), 4);
        assert!(config.skip_waiting_on_install);
        assert!(!config.ephemeral);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_store_names() {
        let names = AppConfig::default().store_names();
        assert_eq!(names.assets, "led-display-v1.1");
        assert_eq!(names.cdn, "led-display-v1.1-cdn");
        assert_eq!(names.whitelist(), vec!["led-display-v1.1".to_string(), "led-display-v1.1-cdn".to_string()]);
    }

    #[test]
    fn test_resolve_manifest_paths() {
        let config = AppConfig { origin: "http://localhost:8080/app/".into(), ..Default::default() };
        assert_eq!(config.resolve("./").unwrap().as_str(), "http://localhost:8080/app/");
        assert_eq!(config.resolve("./index.html").unwrap().as_str(), "http://localhost:8080/app/index.html");
        assert_eq!(
            config.resolve("https://cdn.tailwindcss.com").unwrap().as_str(),
            "https://cdn.tailwindcss.com/"
        );
    }

    #[test]
    fn test_load_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("LEDCACHE_CACHE_VERSION", "v2");
            jail.set_env("LEDCACHE_BYPASS_MATCHING", "prefix");
            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.store_names().assets, "led-display-v2");
            assert_eq!(config.bypass_matching, BypassMatching::Prefix);
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("ledcache.toml", "cache_name = \"panel\"\nskip_waiting_on_install = false\n")?;
            jail.set_env("LEDCACHE_CONFIG_FILE", "ledcache.toml");
            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.store_names().cdn, "panel-v1.1-cdn");
            assert!(!config.skip_waiting_on_install);
            Ok(())
        });
    }
}
