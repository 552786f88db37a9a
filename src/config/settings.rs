// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeMap;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application configuration.
///
/// Loaded from optional `config/default` and `config/{env}` files plus
/// `BAZARYAB__`-prefixed environment variables, with built-in defaults for
/// every field so the binary runs with no config at all.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Crawl orchestration defaults.
    pub crawl: CrawlSettings,
    /// Per-site overrides, keyed by adapter name.
    #[serde(default)]
    pub sites: BTreeMap<String, SiteSettings>,
}

/// Crawl orchestration settings shared by all sites.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// Upper bound on sites crawled concurrently.
    pub max_concurrent_sites: usize,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Retry budget for transient failures.
    pub max_retries: u32,
    /// Minimum spacing between requests to the same site.
    pub min_delay_ms: u64,
}

/// Overrides for a single site adapter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteSettings {
    /// Base URL override, mostly useful for pointing tests at a mock server.
    pub base_url: Option<String>,
    pub min_delay_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            .set_default("crawl.max_concurrent_sites", 3)?
            .set_default("crawl.request_timeout_secs", 20)?
            .set_default("crawl.max_retries", 2)?
            .set_default("crawl.min_delay_ms", 1000)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("BAZARYAB").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// Effective per-request timeout for a site, falling back to the
    /// crawl-wide default.
    pub fn request_timeout(&self, site: &str) -> Duration {
        let secs = self
            .sites
            .get(site)
            .and_then(|s| s.request_timeout_secs)
            .unwrap_or(self.crawl.request_timeout_secs);
        Duration::from_secs(secs)
    }

    /// Effective minimum request spacing for a site.
    pub fn min_delay(&self, site: &str) -> Duration {
        let ms = self
            .sites
            .get(site)
            .and_then(|s| s.min_delay_ms)
            .unwrap_or(self.crawl.min_delay_ms);
        Duration::from_millis(ms)
    }

    /// Effective retry budget for a site.
    pub fn max_retries(&self, site: &str) -> u32 {
        self.sites
            .get(site)
            .and_then(|s| s.max_retries)
            .unwrap_or(self.crawl.max_retries)
    }

    pub fn base_url(&self, site: &str) -> Option<&str> {
        self.sites.get(site).and_then(|s| s.base_url.as_deref())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            crawl: CrawlSettings {
                max_concurrent_sites: 3,
                request_timeout_secs: 20,
                max_retries: 2,
                min_delay_ms: 1000,
            },
            sites: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_config_files() {
        let settings = Settings::new().expect("built-in defaults must load");
        assert_eq!(settings.crawl.max_concurrent_sites, 3);
        assert_eq!(settings.crawl.max_retries, 2);
        assert!(settings.sites.is_empty());
    }

    #[test]
    fn site_overrides_win_over_crawl_defaults() {
        let mut settings = Settings::default();
        settings.sites.insert(
            "divar".to_string(),
            SiteSettings {
                base_url: Some("http://localhost:9000".to_string()),
                min_delay_ms: Some(0),
                request_timeout_secs: Some(5),
                max_retries: Some(0),
            },
        );

        assert_eq!(settings.min_delay("divar"), Duration::from_millis(0));
        assert_eq!(settings.request_timeout("divar"), Duration::from_secs(5));
        assert_eq!(settings.max_retries("divar"), 0);
        assert_eq!(settings.base_url("divar"), Some("http://localhost:9000"));
        // Unknown site falls back to crawl-wide defaults.
        assert_eq!(settings.min_delay("sheypoor"), Duration::from_millis(1000));
        assert_eq!(settings.max_retries("sheypoor"), 2);
        assert!(settings.base_url("sheypoor").is_none());
    }
}
