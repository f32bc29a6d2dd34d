use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::abi::decoder::{AbiDecoder, EventArguments};
use crate::abi::interface::ContractInterface;
use crate::models::common::ContractConfig;
use crate::models::datasets::logs::{ChainLog, RpcLogData};
use crate::models::errors::{ConfigError, DecodeError};
use crate::utils::codec::normalize_address;

/// Decoders keyed by lowercased contract address.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    decoders: BTreeMap<String, AbiDecoder>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every configured ABI from `abi_dir`. Contracts sharing an ABI file
    /// share one parsed interface.
    pub fn from_config<P: AsRef<Path>>(
        abi_dir: P,
        contracts: &[ContractConfig],
    ) -> Result<Self, ConfigError> {
        let abi_dir = abi_dir.as_ref();
        let mut interfaces: BTreeMap<&str, Arc<ContractInterface>> = BTreeMap::new();
        let mut registry = Self::new();

        for contract in contracts {
            let interface = match interfaces.get(contract.abi.as_str()) {
                Some(interface) => interface.clone(),
                None => {
                    let interface = Arc::new(ContractInterface::from_path(
                        &contract.name,
                        abi_dir.join(&contract.abi),
                    )?);
                    interfaces.insert(contract.abi.as_str(), interface.clone());
                    interface
                }
            };

            info!(
                "Registered ABI {} for contract {} at {} ({} events)",
                contract.abi,
                contract.name,
                contract.address,
                interface.events().len()
            );
            registry.register(&contract.address, AbiDecoder::from_shared(interface));
        }

        Ok(registry)
    }

    pub fn register(&mut self, address: &str, decoder: AbiDecoder) {
        self.decoders.insert(normalize_address(address), decoder);
    }

    pub fn decoder_for(&self, address: &str) -> Option<&AbiDecoder> {
        self.decoders.get(&normalize_address(address))
    }

    /// Decodes `log` with the ABI registered for its emitting contract, if any.
    pub fn decode(
        &self,
        raw: &RpcLogData,
        log: &mut ChainLog,
    ) -> Result<Option<EventArguments>, DecodeError> {
        match self.decoder_for(&log.contract_address) {
            Some(decoder) => decoder.decode(raw, log),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABI: &str = r#"[{"type":"event","name":"Ping","anonymous":false,"inputs":[]}]"#;

    #[test]
    fn lookups_ignore_address_case() {
        let mut registry = ContractRegistry::new();
        let decoder = AbiDecoder::new(ContractInterface::from_json_str("ping", ABI).unwrap());
        registry.register("0xABCDEF0000000000000000000000000000000001", decoder);

        assert!(
            registry
                .decoder_for("0xabcdef0000000000000000000000000000000001")
                .is_some()
        );
        assert!(
            registry
                .decoder_for("0xAbCdEf0000000000000000000000000000000001")
                .is_some()
        );
        assert!(
            registry
                .decoder_for("0x0000000000000000000000000000000000000001")
                .is_none()
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_abi_file_fails_construction() {
        let contracts = vec![ContractConfig {
            name: "ghost".to_string(),
            address: "0x0000000000000000000000000000000000000001".to_string(),
            abi: "ghost.json".to_string(),
        }];
        assert!(matches!(
            ContractRegistry::from_config("/nonexistent", &contracts),
            Err(ConfigError::AbiFile { .. })
        ));
    }
}
