use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Configuration for all supported networks
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub networks: HashMap<String, NetworkConfig>,
}

/// Configuration for a single EVM network
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc: String,
    #[serde(rename = "chainId", skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(rename = "nativeToken")]
    pub native_token: NativeToken,
    #[serde(default)]
    pub tokens: HashMap<String, TokenInfo>,
}

/// The coin a network pays gas in
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NativeToken {
    pub symbol: String,
    pub decimals: u8,
}

/// Contract address and precision of a well-known token
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenInfo {
    pub address: String,
    pub decimals: u8,
}

impl Config {
    /// Load configuration from embedded JSON
    pub fn load() -> Result<Self> {
        let config_str = include_str!("../config.json");
        let config: Config = serde_json::from_str(config_str)?;
        Ok(config)
    }

    /// Load configuration from a JSON file with the same layout as the embedded one
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn get_network(&self, network_id: &str) -> Option<&NetworkConfig> {
        self.networks.get(network_id)
    }

    /// Network ids in a stable (sorted) order
    pub fn network_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.networks.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl NetworkConfig {
    pub fn token(&self, symbol: &str) -> Option<&TokenInfo> {
        self.tokens.get(symbol)
    }
}
