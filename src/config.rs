use crate::cache::{cache_size, DataFileCache};
use crate::datasets::AWS_IP_RANGES_URL;
use anyhow::{anyhow, Result};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Default source of the blocked address list
pub const DEFAULT_BLOCKLIST_URL: &str = "https://reestr.rublacklist.net/api/ips";

/// Default report file name
pub const DEFAULT_REPORT_PATH: &str = "amazon.csv";

#[derive(Debug, Clone, Serialize)]
pub struct BlocklensConfig {
    /// Path to the directory to hold blocklens' data
    pub data_dir: String,

    /// Where the provider IP ranges document is fetched from
    pub ranges_url: String,

    /// Where the blocked address list is fetched from
    pub blocklist_url: String,

    /// TTL for cached datasets in seconds, 0 keeps them forever (default: 24 hours)
    pub cache_ttl_secs: u64,

    /// Default report output path
    pub report_path: String,
}

const EMPTY_CONFIG: &str = r#"### blocklens configuration file

### directory for cached data used by blocklens
# data_dir = "~/.blocklens"

### data sources
# ranges_url = "https://ip-ranges.amazonaws.com/ip-ranges.json"
# blocklist_url = "https://reestr.rublacklist.net/api/ips"

### cache TTL in seconds, 0 means download once and keep
# cache_ttl_secs = 86400     # 24 hours

### report written by `blocklens xref`
# report_path = "amazon.csv"
"#;

impl Default for BlocklensConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());

        Self {
            data_dir: format!("{}/.blocklens", home_dir),
            ranges_url: AWS_IP_RANGES_URL.to_string(),
            blocklist_url: DEFAULT_BLOCKLIST_URL.to_string(),
            cache_ttl_secs: 86400, // 24 hours
            report_path: DEFAULT_REPORT_PATH.to_string(),
        }
    }
}

impl BlocklensConfig {
    /// Function to create and initialize a new configuration
    pub fn new(path: &Option<String>) -> Result<BlocklensConfig> {
        let mut builder = Config::builder();

        // By default use $HOME/.blocklens/blocklens.toml as the configuration file path
        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not find home directory"))?
            .to_str()
            .ok_or_else(|| anyhow!("Could not convert home directory path to string"))?
            .to_owned();

        let blocklens_dir = format!("{}/.blocklens", home_dir.as_str());

        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                std::fs::create_dir_all(blocklens_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create blocklens directory: {}", e))?;
                let p = format!("{}/blocklens.toml", blocklens_dir.as_str());
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // E.g., `BLOCKLENS_CACHE_TTL_SECS=0 ./blocklens xref` keeps downloads forever
        builder = builder.add_source(config::Environment::with_prefix("BLOCKLENS"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        let config = Self::from_settings(&config, &blocklens_dir);
        std::fs::create_dir_all(config.data_dir.as_str())
            .map_err(|e| anyhow!("Unable to create data directory: {}", e))?;

        Ok(config)
    }

    /// Build a configuration from flat key/value settings, falling back to
    /// defaults rooted at `default_data_dir`
    pub fn from_settings(settings: &HashMap<String, String>, default_data_dir: &str) -> Self {
        let data_dir = settings
            .get("data_dir")
            .map(|d| expand_home(d))
            .unwrap_or_else(|| default_data_dir.to_string());

        let cache_ttl_secs = settings
            .get("cache_ttl_secs")
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);

        BlocklensConfig {
            data_dir,
            ranges_url: settings
                .get("ranges_url")
                .cloned()
                .unwrap_or_else(|| AWS_IP_RANGES_URL.to_string()),
            blocklist_url: settings
                .get("blocklist_url")
                .cloned()
                .unwrap_or_else(|| DEFAULT_BLOCKLIST_URL.to_string()),
            cache_ttl_secs,
            report_path: settings
                .get("report_path")
                .cloned()
                .unwrap_or_else(|| DEFAULT_REPORT_PATH.to_string()),
        }
    }

    /// Get cache TTL as Duration
    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_ttl_secs)
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> String {
        format!("{}/cache", self.data_dir.trim_end_matches('/'))
    }

    /// Open the dataset cache under the data directory
    pub fn file_cache(&self) -> Result<DataFileCache> {
        DataFileCache::new(&self.data_dir)
    }

    /// Get the config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{}/.blocklens/blocklens.toml", home_dir)
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let ttl = if self.cache_ttl_secs == 0 {
            "never expires".to_string()
        } else {
            format!("{} seconds", self.cache_ttl_secs)
        };
        let mut lines = vec![
            format!("Data Directory:     {}", self.data_dir),
            format!("Ranges URL:         {}", self.ranges_url),
            format!("Blocklist URL:      {}", self.blocklist_url),
            format!("Cache TTL:          {}", ttl),
            format!("Report Path:        {}", self.report_path),
        ];

        let cache_dir = self.cache_dir();
        if Path::new(&cache_dir).exists() {
            let size = cache_size(&self.data_dir).unwrap_or(0);
            lines.push(format!(
                "Cache Directory:    {} ({})",
                cache_dir,
                format_size(size)
            ));
        }

        lines.join("\n")
    }
}

/// Replace a leading `~` with the home directory
fn expand_home(path: &str) -> String {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => format!("{}{}", home.to_string_lossy(), rest),
        _ => path.to_string(),
    }
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BlocklensConfig::default();
        assert_eq!(config.cache_ttl_secs, 86400);
        assert_eq!(config.ranges_url, AWS_IP_RANGES_URL);
        assert_eq!(config.blocklist_url, DEFAULT_BLOCKLIST_URL);
        assert_eq!(config.report_path, "amazon.csv");
        assert!(config.data_dir.ends_with("/.blocklens"));
    }

    #[test]
    fn test_from_settings() {
        let mut settings = HashMap::new();
        settings.insert("data_dir".to_string(), "/test/dir/".to_string());
        settings.insert("cache_ttl_secs".to_string(), "0".to_string());
        settings.insert("report_path".to_string(), "out.tsv".to_string());

        let config = BlocklensConfig::from_settings(&settings, "/unused");
        assert_eq!(config.data_dir, "/test/dir/");
        assert_eq!(config.cache_dir(), "/test/dir/cache");
        assert_eq!(config.cache_ttl(), std::time::Duration::ZERO);
        assert_eq!(config.report_path, "out.tsv");
        assert_eq!(config.ranges_url, AWS_IP_RANGES_URL);
    }

    #[test]
    fn test_from_settings_bad_ttl_uses_default() {
        let mut settings = HashMap::new();
        settings.insert("cache_ttl_secs".to_string(), "soon".to_string());
        let config = BlocklensConfig::from_settings(&settings, "/data");
        assert_eq!(config.data_dir, "/data");
        assert_eq!(config.cache_ttl_secs, 86400);
    }

    #[test]
    fn test_summary_mentions_ttl() {
        let config = BlocklensConfig {
            data_dir: "/nonexistent/blocklens".to_string(),
            cache_ttl_secs: 0,
            ..Default::default()
        };
        let summary = config.summary();
        assert!(summary.contains("never expires"));
        assert!(!summary.contains("Cache Directory"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(1073741824), "1.00 GB");
    }
}
