use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::datasets::blocks::ChainBlock;
use crate::models::datasets::logs::ChainLog;
use crate::models::errors::ConfigError;
use crate::utils::codec::normalize_address;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub address: String,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "0.0.0.0".to_string(),
            port: 9100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractConfig {
    pub name: String,
    pub address: String,
    // ABI file name, resolved against `abi_dir`
    pub abi: String,
}

// Binds a decoded event name to a named log handler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventHandlerConfig {
    pub event: String,
    pub handler: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHandlerConfig {
    pub handler: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub chain_name: String,
    pub rpc_url: String,
    pub start_block: u64,
    pub end_block: Option<u64>,
    #[serde(default = "default_abi_dir")]
    pub abi_dir: String,
    #[serde(default)]
    pub contracts: Vec<ContractConfig>,
    #[serde(default)]
    pub event_handlers: Vec<EventHandlerConfig>,
    #[serde(default)]
    pub block_handlers: Vec<BlockHandlerConfig>,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_abi_dir() -> String {
    "abis".to_string()
}

impl Config {
    /// Checks required fields and lowercases every contract address.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.chain_name.is_empty() {
            return Err(empty("chain_name"));
        }
        if self.rpc_url.is_empty() {
            return Err(empty("rpc_url"));
        }

        let mut seen = BTreeSet::new();
        for contract in &mut self.contracts {
            if contract.name.is_empty() {
                return Err(empty("contracts.name"));
            }
            if contract.address.is_empty() {
                return Err(empty("contracts.address"));
            }
            if contract.abi.is_empty() {
                return Err(empty("contracts.abi"));
            }
            contract.address = normalize_address(&contract.address);
            if !seen.insert(contract.address.clone()) {
                return Err(ConfigError::DuplicateContract {
                    address: contract.address.clone(),
                });
            }
        }
        for binding in &self.event_handlers {
            if binding.event.is_empty() {
                return Err(empty("event_handlers.event"));
            }
            if binding.handler.is_empty() {
                return Err(empty("event_handlers.handler"));
            }
        }
        if self.block_handlers.iter().any(|b| b.handler.is_empty()) {
            return Err(empty("block_handlers.handler"));
        }
        Ok(())
    }
}

fn empty(field: &str) -> ConfigError {
    ConfigError::EmptyField {
        field: field.to_string(),
    }
}

#[derive(Debug, Default)]
pub struct TransformedData {
    pub blocks: Vec<ChainBlock>,
    pub logs: Vec<ChainLog>,
}
