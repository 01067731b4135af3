use anyhow::{Context, Result};
use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::TermId;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root of the saved speech tree.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,
    /// Root of the cached listing documents.
    #[serde(default = "default_metadata_dir")]
    pub metadata_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            metadata_dir: default_metadata_dir(),
        }
    }
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_metadata_dir() -> PathBuf {
    PathBuf::from("./metadata")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// JSON file of the form `{"API_KEY": "..."}`.
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Pause before the single retry of a failed speech request.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            key_file: default_key_file(),
            timeout_secs: default_timeout_secs(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://parlament.hu".to_string()
}
fn default_key_file() -> PathBuf {
    PathBuf::from("PARLAMENT_APIKEY.json")
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_retry_delay_secs() -> u64 {
    5
}

impl ApiConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Terms to scan. The API has no "list all terms" call, so the scan walks
/// this range upwards until a term comes back empty.
#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    #[serde(default = "default_first_term")]
    pub first_term: TermId,
    #[serde(default = "default_last_term")]
    pub last_term: TermId,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            first_term: default_first_term(),
            last_term: default_last_term(),
        }
    }
}

fn default_first_term() -> TermId {
    36
}
fn default_last_term() -> TermId {
    59
}

impl ScanConfig {
    pub fn terms(&self) -> RangeInclusive<TermId> {
        self.first_term..=self.last_term
    }
}

#[derive(Debug, Deserialize)]
struct KeyFile {
    #[serde(rename = "API_KEY")]
    api_key: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.scan.first_term > config.scan.last_term {
        anyhow::bail!(
            "scan.first_term ({}) must be <= scan.last_term ({})",
            config.scan.first_term,
            config.scan.last_term
        );
    }

    if config.api.timeout_secs == 0 {
        anyhow::bail!("api.timeout_secs must be > 0");
    }

    if config.api.base_url.trim().is_empty() {
        anyhow::bail!("api.base_url must not be empty");
    }

    Ok(())
}

/// Read the API access token from the key file.
pub fn load_access_token(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read API key file: {}", path.display()))?;

    let key: KeyFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse API key file: {}", path.display()))?;

    if key.api_key.trim().is_empty() {
        anyhow::bail!("API_KEY in {} is empty", path.display());
    }

    Ok(key.api_key.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("harvest.toml");
        std::fs::write(&path, "").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.scan.terms(), 36..=59);
        assert_eq!(config.api.retry_delay(), Duration::from_secs(5));
        assert_eq!(config.storage.save_dir, PathBuf::from("./data"));
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("harvest.toml");
        std::fs::write(
            &path,
            "[scan]\nlast_term = 42\n\n[storage]\nsave_dir = \"/srv/speeches\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.scan.terms(), 36..=42);
        assert_eq!(config.storage.save_dir, PathBuf::from("/srv/speeches"));
        assert_eq!(config.storage.metadata_dir, PathBuf::from("./metadata"));
    }

    #[test]
    fn inverted_scan_range_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("harvest.toml");
        std::fs::write(&path, "[scan]\nfirst_term = 50\nlast_term = 40\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("first_term"));
    }

    #[test]
    fn missing_config_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load_config(&tmp.path().join("absent.toml")).is_err());
    }

    #[test]
    fn access_token_from_key_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("key.json");
        std::fs::write(&path, r#"{"API_KEY": " abc123 "}"#).unwrap();
        assert_eq!(load_access_token(&path).unwrap(), "abc123");
    }

    #[test]
    fn malformed_key_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("key.json");
        std::fs::write(&path, r#"{"api_key": "abc"}"#).unwrap();
        assert!(load_access_token(&path).is_err());
        assert!(load_access_token(&tmp.path().join("missing.json")).is_err());
    }
}
