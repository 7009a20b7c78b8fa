use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::ProviderConfig;

const DEFAULT_INITIAL_CAPACITY: usize = 256;
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: Option<String>,
    pub rpc: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AbiConfig {
    /// Initial encoder buffer size in bytes
    pub initial_capacity: usize,
    /// Render decoded addresses in EIP-55 form
    pub checksum_addresses: bool,
}

impl Default for AbiConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            checksum_addresses: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    #[serde(default)]
    pub abi: AbiConfig,

    #[serde(default = "default_block_tag")]
    pub default_block_tag: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            abi: AbiConfig::default(),
            default_block_tag: default_block_tag(),
        }
    }
}

fn default_block_tag() -> String {
    "latest".to_string()
}

impl EndpointConfig {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.rpc.clone())
            .unwrap_or_else(|| "unnamed".to_string())
    }

    pub fn provider_config(&self) -> Option<ProviderConfig> {
        let rpc = self.rpc.as_deref()?.trim();
        if rpc.is_empty() {
            return None;
        }
        let timeout = Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));
        Some(ProviderConfig::http(rpc).with_timeout(timeout))
    }
}

impl Config {
    /// First endpoint with a usable RPC URL, optionally matched by name
    pub fn endpoint(&self, name: Option<&str>) -> Option<ProviderConfig> {
        self.endpoints
            .iter()
            .filter(|e| name.map_or(true, |n| e.name.as_deref() == Some(n)))
            .find_map(EndpointConfig::provider_config)
    }

    /// Encoder capacity, never below one byte
    pub fn initial_capacity(&self) -> usize {
        self.abi.initial_capacity.max(1)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    load_from(&path)
}

pub fn load_from(path: &Path) -> Config {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "no config file");
            return Config::default();
        }
    };
    match Config::parse(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unparsable config");
            Config::default()
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("ABIWIRE_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("abiwire").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("abiwire").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "abiwire", "abiwire")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.endpoints.is_empty());
        assert_eq!(config.abi.initial_capacity, 256);
        assert!(config.abi.checksum_addresses);
        assert_eq!(config.default_block_tag, "latest");
    }

    #[test]
    fn test_parse_full() {
        let config = Config::parse(
            r#"
default_block_tag = "pending"

[abi]
initial_capacity = 0
checksum_addresses = false

[[endpoints]]
name = "local"
rpc = "http://127.0.0.1:8545"
timeout_ms = 500

[[endpoints]]
name = "broken"
"#,
        )
        .unwrap();
        assert_eq!(config.default_block_tag, "pending");
        assert!(!config.abi.checksum_addresses);
        assert_eq!(config.initial_capacity(), 1);

        let endpoint = config.endpoint(None).unwrap();
        assert_eq!(endpoint.url, "http://127.0.0.1:8545");
        assert_eq!(endpoint.request_timeout, Duration::from_millis(500));
        assert!(config.endpoint(Some("broken")).is_none());
        assert_eq!(config.endpoints[1].display_name(), "broken");
    }

    #[test]
    fn test_unparsable_falls_back() {
        let path = std::env::temp_dir().join(format!("abiwire-config-{}.toml", std::process::id()));
        fs::write(&path, "endpoints = 3").unwrap();
        let config = load_from(&path);
        let _ = fs::remove_file(&path);
        assert!(config.endpoints.is_empty());
        assert_eq!(config.default_block_tag, "latest");
    }
}
