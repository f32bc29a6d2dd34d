use alloy_dyn_abi::DynSolType;
use alloy_json_abi::{Event, JsonAbi};
use alloy_primitives::B256;
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::models::errors::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct EventInput {
    pub name: String,
    // Type as declared in the ABI, tuples expanded to `(t1,t2)`
    pub ty: String,
    pub indexed: bool,
    pub(crate) resolved: DynSolType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDefinition {
    pub name: String,
    pub signature: String,
    pub selector: B256,
    pub anonymous: bool,
    pub inputs: Vec<EventInput>,
}

impl EventDefinition {
    fn from_event(contract: &str, event: &Event) -> Result<Self, ConfigError> {
        let inputs = event
            .inputs
            .iter()
            .map(|param| {
                let ty = param.selector_type().into_owned();
                let resolved = DynSolType::parse(&ty).map_err(|e| ConfigError::InvalidAbi {
                    contract: contract.to_string(),
                    reason: format!("event {} input {}: {e}", event.name, param.name),
                })?;
                Ok(EventInput {
                    name: param.name.clone(),
                    ty,
                    indexed: param.indexed,
                    resolved,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            name: event.name.clone(),
            signature: event.signature(),
            selector: event.selector(),
            anonymous: event.anonymous,
            inputs,
        })
    }

    pub fn indexed_count(&self) -> usize {
        self.inputs.iter().filter(|input| input.indexed).count()
    }
}

/// Event table of one contract.
///
/// Events are kept sorted by name (overloads in declaration order) so lookups
/// resolve selector collisions the same way on every run.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractInterface {
    name: String,
    events: Vec<EventDefinition>,
}

impl ContractInterface {
    pub fn from_json_abi(name: &str, abi: &JsonAbi) -> Result<Self, ConfigError> {
        // `JsonAbi` stores events in a BTreeMap keyed by name
        let events = abi
            .events()
            .map(|event| EventDefinition::from_event(name, event))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            events,
        })
    }

    /// Parses either a bare ABI array or a build artifact carrying an `abi` field.
    pub fn from_json_str(name: &str, json: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidAbi {
            contract: name.to_string(),
            reason,
        };

        let mut value: Value = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        if let Some(abi) = value.get_mut("abi") {
            value = abi.take();
        }
        let abi: JsonAbi = serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;

        Self::from_json_abi(name, &abi)
    }

    pub fn from_path<P: AsRef<Path>>(name: &str, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::AbiFile {
            path: path.to_string_lossy().into_owned(),
            source,
        })?;
        Self::from_json_str(name, &json)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn events(&self) -> &[EventDefinition] {
        &self.events
    }

    /// First non-anonymous event whose selector equals `selector`.
    pub fn find_event(&self, selector: &B256) -> Option<&EventDefinition> {
        self.events
            .iter()
            .find(|event| !event.anonymous && event.selector == *selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    const ABI: &str = r#"[
        {"type":"function","name":"transfer","stateMutability":"nonpayable",
         "inputs":[{"name":"to","type":"address"},{"name":"value","type":"uint256"}],
         "outputs":[{"name":"","type":"bool"}]},
        {"type":"event","name":"Transfer","anonymous":false,"inputs":[
            {"name":"from","type":"address","indexed":true},
            {"name":"to","type":"address","indexed":true},
            {"name":"value","type":"uint256","indexed":false}]},
        {"type":"event","name":"Approval","anonymous":false,"inputs":[
            {"name":"owner","type":"address","indexed":true},
            {"name":"spender","type":"address","indexed":true},
            {"name":"value","type":"uint256","indexed":false}]},
        {"type":"event","name":"Swapped","anonymous":false,"inputs":[
            {"name":"route","type":"tuple[]","indexed":false,"components":[
                {"name":"pool","type":"address"},{"name":"fee","type":"uint24"}]}]}
    ]"#;

    #[test]
    fn builds_sorted_event_table() {
        let interface = ContractInterface::from_json_str("token", ABI).unwrap();
        let names: Vec<_> = interface.events().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Approval", "Swapped", "Transfer"]);
    }

    #[test]
    fn computes_signatures_and_selectors() {
        let interface = ContractInterface::from_json_str("token", ABI).unwrap();
        let transfer = &interface.events()[2];
        assert_eq!(transfer.signature, "Transfer(address,address,uint256)");
        assert_eq!(
            transfer.selector,
            b256!("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
        );
        assert_eq!(transfer.indexed_count(), 2);
        assert_eq!(
            interface.find_event(&transfer.selector).map(|e| e.name.as_str()),
            Some("Transfer")
        );
    }

    #[test]
    fn expands_tuple_types() {
        let interface = ContractInterface::from_json_str("router", ABI).unwrap();
        let swapped = &interface.events()[1];
        assert_eq!(swapped.inputs[0].ty, "(address,uint24)[]");
        assert_eq!(swapped.signature, "Swapped((address,uint24)[])");
    }

    #[test]
    fn accepts_build_artifacts() {
        let artifact = format!(r#"{{"contractName":"Token","abi":{ABI}}}"#);
        let interface = ContractInterface::from_json_str("token", &artifact).unwrap();
        assert_eq!(interface.events().len(), 3);
        assert_eq!(interface.name(), "token");
    }

    #[test]
    fn skips_anonymous_events_when_matching() {
        let abi = r#"[{"type":"event","name":"Ping","anonymous":true,"inputs":[]}]"#;
        let interface = ContractInterface::from_json_str("ping", abi).unwrap();
        let selector = interface.events()[0].selector;
        assert!(interface.find_event(&selector).is_none());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            ContractInterface::from_json_str("broken", "{not json"),
            Err(ConfigError::InvalidAbi { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        assert!(matches!(
            ContractInterface::from_path("missing", "/nonexistent/abi.json"),
            Err(ConfigError::AbiFile { .. })
        ));
    }
}
