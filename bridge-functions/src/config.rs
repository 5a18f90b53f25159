//! Configuration Management Module
//!
//! Loads the chain registry and the retry/confirmation settings used by every
//! routine. One `[[network]]` per deployment (testnet, mainnet); each network
//! lists its chains and names its hub.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chain_clients_common::strip_hex_prefix;
use chain_clients_evm::DEFAULT_GAS_LIMIT_OVERRIDE;

use crate::error::FunctionError;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "BRIDGE_FUNCTIONS_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/functions.toml";

// ============================================================================
// CHAIN SELECTOR
// ============================================================================

/// Bridge-level chain identifier, distinct from the native chain id.
///
/// Parses decimal (`"15971525489660198786"`) and hex (`"0xdda641cfe44aff82"`)
/// strings, and big-endian argument words of up to 32 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainSelector(pub u64);

impl ChainSelector {
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, FunctionError> {
        if bytes.is_empty() || bytes.len() > 32 {
            return Err(FunctionError::InvalidArgument(format!(
                "Chain selector must be 1 to 32 bytes, got {}",
                bytes.len()
            )));
        }
        let split = bytes.len().saturating_sub(8);
        if bytes[..split].iter().any(|&b| b != 0) {
            return Err(FunctionError::InvalidArgument(format!(
                "Chain selector 0x{} does not fit in 64 bits",
                hex::encode(bytes)
            )));
        }
        let value = bytes[split..]
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | b as u64);
        Ok(ChainSelector(value))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl FromStr for ChainSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = if s.starts_with("0x") || s.starts_with("0X") {
            u64::from_str_radix(strip_hex_prefix(s), 16)
        } else {
            s.parse::<u64>()
        };
        parsed
            .map(ChainSelector)
            .map_err(|e| format!("Invalid chain selector '{}': {}", s, e))
    }
}

impl TryFrom<String> for ChainSelector {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChainSelector> for String {
    fn from(value: ChainSelector) -> Self {
        value.0.to_string()
    }
}

impl fmt::Display for ChainSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network used by routines whose arguments do not name a host chain
    /// (total balance, withdrawal collection). Optional when only one network
    /// is configured.
    #[serde(default)]
    pub default_network: Option<String>,
    #[serde(default)]
    pub settings: FunctionsSettings,
    /// Deployments (use [[network]] in TOML)
    #[serde(rename = "network", default)]
    pub networks: Vec<NetworkConfig>,
}

/// One deployment of the pool network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Human-readable name ("testnet", "mainnet")
    pub name: String,
    /// Native chain id the rebalance request is issued from
    pub host_chain_id: u64,
    /// Selector of the hub (parent pool) chain
    pub hub_chain_selector: ChainSelector,
    /// Chains of this network (use [[network.chain]] in TOML)
    #[serde(rename = "chain", default)]
    pub chains: Vec<ChainDescriptor>,
}

/// Static description of one chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDescriptor {
    /// Human-readable name for the chain
    pub name: String,
    pub selector: ChainSelector,
    /// Native chain id (e.g., 84532 for Base Sepolia)
    pub chain_id: u64,
    /// Endpoint URL templates; may contain `${SECRET_NAME}` placeholders
    pub rpc_urls: Vec<String>,
    /// Blocks required on top of an event before it is trusted
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
    /// Pool contract address
    #[serde(default)]
    pub pool_addr: Option<String>,
    /// Pooled token (USDC) address
    #[serde(default)]
    pub token_addr: Option<String>,
}

impl ChainDescriptor {
    pub fn pool_addr(&self) -> Result<&str, FunctionError> {
        self.pool_addr.as_deref().ok_or_else(|| {
            FunctionError::NotFound(format!("No pool address configured for {}", self.name))
        })
    }

    pub fn token_addr(&self) -> Result<&str, FunctionError> {
        self.token_addr.as_deref().ok_or_else(|| {
            FunctionError::NotFound(format!("No token address configured for {}", self.name))
        })
    }
}

/// Retry, confirmation and gas constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionsSettings {
    /// Endpoint attempts when searching for the source event
    #[serde(default = "default_log_search_attempts")]
    pub log_search_attempts: u32,
    /// Blocks behind the head searched for the source event
    #[serde(default = "default_log_search_window_blocks")]
    pub log_search_window_blocks: u64,
    #[serde(default = "default_log_search_retry_delay_ms")]
    pub log_search_retry_delay_ms: u64,
    #[serde(default = "default_confirmation_poll_interval_ms")]
    pub confirmation_poll_interval_ms: u64,
    #[serde(default = "default_max_confirmation_polls")]
    pub max_confirmation_polls: u32,
    /// Reported for every eth_estimateGas call
    #[serde(default = "default_gas_limit_override")]
    pub gas_limit_override: u64,
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
    /// Rounds of deposit receipt lookups
    #[serde(default = "default_receipt_rounds")]
    pub receipt_rounds: u32,
    /// New receipt lookups per chain per round
    #[serde(default = "default_receipt_batch_size")]
    pub receipt_batch_size: usize,
    #[serde(default = "default_receipt_round_delay_ms")]
    pub receipt_round_delay_ms: u64,
}

impl Default for FunctionsSettings {
    fn default() -> Self {
        Self {
            log_search_attempts: default_log_search_attempts(),
            log_search_window_blocks: default_log_search_window_blocks(),
            log_search_retry_delay_ms: default_log_search_retry_delay_ms(),
            confirmation_poll_interval_ms: default_confirmation_poll_interval_ms(),
            max_confirmation_polls: default_max_confirmation_polls(),
            gas_limit_override: default_gas_limit_override(),
            rpc_timeout_ms: default_rpc_timeout_ms(),
            receipt_rounds: default_receipt_rounds(),
            receipt_batch_size: default_receipt_batch_size(),
            receipt_round_delay_ms: default_receipt_round_delay_ms(),
        }
    }
}

fn default_confirmations() -> u64 {
    3
}

fn default_log_search_attempts() -> u32 {
    5
}

fn default_log_search_window_blocks() -> u64 {
    1000
}

fn default_log_search_retry_delay_ms() -> u64 {
    3000
}

fn default_confirmation_poll_interval_ms() -> u64 {
    5000
}

fn default_max_confirmation_polls() -> u32 {
    60
}

fn default_gas_limit_override() -> u64 {
    DEFAULT_GAS_LIMIT_OVERRIDE
}

fn default_rpc_timeout_ms() -> u64 {
    10_000
}

fn default_receipt_rounds() -> u32 {
    3
}

fn default_receipt_batch_size() -> usize {
    6
}

fn default_receipt_round_delay_ms() -> u64 {
    1000
}

// ============================================================================
// LOOKUPS
// ============================================================================

impl NetworkConfig {
    pub fn chain(&self, selector: ChainSelector) -> Option<&ChainDescriptor> {
        self.chains.iter().find(|c| c.selector == selector)
    }

    pub fn hub(&self) -> Result<&ChainDescriptor, FunctionError> {
        self.chain(self.hub_chain_selector).ok_or_else(|| {
            FunctionError::NotFound(format!(
                "Hub chain {} missing from network {}",
                self.hub_chain_selector, self.name
            ))
        })
    }

    /// Chains with a deployed pool; verification-only chains have none.
    pub fn pool_chains(&self) -> impl Iterator<Item = &ChainDescriptor> {
        self.chains.iter().filter(|c| c.pool_addr.is_some())
    }

    /// Every pool chain except the hub.
    pub fn child_chains(&self) -> impl Iterator<Item = &ChainDescriptor> {
        let hub = self.hub_chain_selector;
        self.pool_chains().filter(move |c| c.selector != hub)
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Optional path to config file. If None, uses
    ///   BRIDGE_FUNCTIONS_CONFIG_PATH env var or default.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated configuration
    /// * `Err(anyhow::Error)` - File missing, unparsable or invalid
    pub fn load_from_path(path: Option<&str>) -> anyhow::Result<Self> {
        let config_path = path
            .map(|p| p.to_string())
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        if !std::path::Path::new(&config_path).exists() {
            anyhow::bail!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/functions.template.toml config/functions.toml\n\
                Then edit config/functions.toml with your actual values.",
                config_path
            );
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid configuration in {}", config_path))?;
        Ok(config)
    }

    /// Parses and validates configuration text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for consistency.
    ///
    /// Checks:
    /// - At least one network is configured, with unique names and host chain ids
    /// - Selectors are unique within a network
    /// - Every chain has at least one endpoint
    /// - The hub selector belongs to its network
    /// - The default network, if set, exists
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.networks.is_empty() {
            anyhow::bail!("Configuration error: At least one [[network]] must be configured");
        }

        let mut names = HashSet::new();
        let mut host_ids = HashSet::new();
        for network in &self.networks {
            if !names.insert(network.name.as_str()) {
                anyhow::bail!("Configuration error: Duplicate network name '{}'", network.name);
            }
            if !host_ids.insert(network.host_chain_id) {
                anyhow::bail!(
                    "Configuration error: Host chain id {} used by more than one network",
                    network.host_chain_id
                );
            }

            let mut selectors = HashSet::new();
            for chain in &network.chains {
                if !selectors.insert(chain.selector) {
                    anyhow::bail!(
                        "Configuration error: Chain selector {} appears twice in network {}",
                        chain.selector,
                        network.name
                    );
                }
                if chain.rpc_urls.is_empty() {
                    anyhow::bail!(
                        "Configuration error: Chain {} in network {} has no rpc_urls",
                        chain.name,
                        network.name
                    );
                }
            }

            if network.chain(network.hub_chain_selector).is_none() {
                anyhow::bail!(
                    "Configuration error: Hub chain selector {} is not part of network {}",
                    network.hub_chain_selector,
                    network.name
                );
            }
        }

        if let Some(default) = &self.default_network {
            if !names.contains(default.as_str()) {
                anyhow::bail!(
                    "Configuration error: default_network '{}' is not configured",
                    default
                );
            }
        }

        Ok(())
    }

    /// Network whose host chain id matches the request.
    pub fn network_for_host_chain(
        &self,
        host_chain_id: u64,
    ) -> Result<&NetworkConfig, FunctionError> {
        self.networks
            .iter()
            .find(|n| n.host_chain_id == host_chain_id)
            .ok_or_else(|| FunctionError::Unsupported(format!("Wrong chain id {}", host_chain_id)))
    }

    /// Network for routines whose arguments carry no host chain id.
    pub fn default_network(&self) -> Result<&NetworkConfig, FunctionError> {
        match &self.default_network {
            Some(name) => self.networks.iter().find(|n| &n.name == name).ok_or_else(|| {
                FunctionError::NotFound(format!("Network '{}' is not configured", name))
            }),
            None if self.networks.len() == 1 => Ok(&self.networks[0]),
            None => Err(FunctionError::Unsupported(
                "default_network must be set when several networks are configured".to_string(),
            )),
        }
    }

    /// Looks a chain up across every network.
    pub fn find_chain(&self, selector: ChainSelector) -> Result<&ChainDescriptor, FunctionError> {
        self.networks
            .iter()
            .find_map(|n| n.chain(selector))
            .ok_or_else(|| FunctionError::NotFound(format!("Unknown chain selector {}", selector)))
    }
}
