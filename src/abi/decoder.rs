use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::B256;
use std::sync::Arc;
use tracing::debug;

use crate::abi::interface::{ContractInterface, EventDefinition, EventInput};
use crate::abi::render::render_value;
use crate::models::datasets::logs::{ChainLog, RpcLogData};
use crate::models::errors::DecodeError;

#[derive(Debug, Clone, PartialEq)]
pub struct EventArgument {
    pub name: String,
    pub ty: String,
    pub indexed: bool,
    pub value: DynSolValue,
}

/// Decoded arguments of one log, in the ABI's declared input order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventArguments(Vec<EventArgument>);

impl EventArguments {
    pub fn get(&self, name: &str) -> Option<&DynSolValue> {
        self.0
            .iter()
            .find(|argument| argument.name == name)
            .map(|argument| &argument.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventArgument> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<EventArgument> {
        self.0
    }
}

/// Decodes raw logs against one contract's event table.
///
/// Holds no mutable state; clones share the same interface.
#[derive(Debug, Clone)]
pub struct AbiDecoder {
    interface: Arc<ContractInterface>,
}

impl AbiDecoder {
    pub fn new(interface: ContractInterface) -> Self {
        Self {
            interface: Arc::new(interface),
        }
    }

    pub fn from_shared(interface: Arc<ContractInterface>) -> Self {
        Self { interface }
    }

    pub fn interface(&self) -> &ContractInterface {
        &self.interface
    }

    /// Matches `raw` against the event table and fills the decoding columns of `log`.
    ///
    /// Returns `Ok(None)` when the log has no topics or topic 0 is not a known
    /// event; `log` is left untouched in that case and on error.
    pub fn decode(
        &self,
        raw: &RpcLogData,
        log: &mut ChainLog,
    ) -> Result<Option<EventArguments>, DecodeError> {
        let Some(selector) = raw.topics.first() else {
            return Ok(None);
        };

        let Some(event) = self.interface.find_event(selector) else {
            debug!(
                "No event in {} matches topic {} of log {}:{}",
                self.interface.name(),
                selector,
                log.transaction_hash,
                log.log_index
            );
            return Ok(None);
        };

        let arguments = decode_arguments(event, &raw.topics[1..], &raw.data)?;
        apply_arguments(log, event, &arguments);

        debug!(
            "Decoded {} from log {}:{}",
            event.signature, log.transaction_hash, log.log_index
        );
        Ok(Some(arguments))
    }
}

fn decode_arguments(
    event: &EventDefinition,
    topics: &[B256],
    data: &[u8],
) -> Result<EventArguments, DecodeError> {
    let expected = event.indexed_count();
    if topics.len() != expected {
        return Err(DecodeError::TopicCountMismatch {
            event: event.signature.clone(),
            expected,
            got: topics.len(),
        });
    }

    let mut indexed = event
        .inputs
        .iter()
        .filter(|input| input.indexed)
        .zip(topics)
        .enumerate()
        .map(|(i, (input, topic))| decode_topic(event, i + 1, input, topic))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();

    let mut body = decode_body(event, data)?.into_iter();

    let arguments = event
        .inputs
        .iter()
        .map(|input| {
            let value = if input.indexed {
                indexed.next()
            } else {
                body.next()
            };
            value
                .map(|value| EventArgument {
                    name: input.name.clone(),
                    ty: input.ty.clone(),
                    indexed: input.indexed,
                    value,
                })
                .ok_or_else(|| DecodeError::InvalidData {
                    event: event.signature.clone(),
                    reason: format!("missing value for input {}", input.name),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EventArguments(arguments))
}

// Reference types are stored as the keccak hash of their encoding, so only
// value types can be recovered from a topic.
fn decode_topic(
    event: &EventDefinition,
    index: usize,
    input: &EventInput,
    topic: &B256,
) -> Result<DynSolValue, DecodeError> {
    let is_value_type = matches!(
        input.resolved,
        DynSolType::Bool
            | DynSolType::Int(_)
            | DynSolType::Uint(_)
            | DynSolType::FixedBytes(_)
            | DynSolType::Address
            | DynSolType::Function
    );
    if !is_value_type {
        return Ok(DynSolValue::FixedBytes(*topic, 32));
    }
    // Only a final byte of 1 is true, whatever the rest of the word holds
    if input.resolved == DynSolType::Bool {
        return Ok(DynSolValue::Bool(topic[31] == 1));
    }

    input
        .resolved
        .abi_decode(topic.as_slice())
        .map_err(|e| DecodeError::InvalidTopic {
            event: event.signature.clone(),
            index,
            reason: e.to_string(),
        })
}

fn decode_body(event: &EventDefinition, data: &[u8]) -> Result<Vec<DynSolValue>, DecodeError> {
    let types: Vec<DynSolType> = event
        .inputs
        .iter()
        .filter(|input| !input.indexed)
        .map(|input| input.resolved.clone())
        .collect();
    if types.is_empty() {
        return Ok(Vec::new());
    }

    let decoded = DynSolType::Tuple(types)
        .abi_decode_params(data)
        .map_err(|e| DecodeError::InvalidData {
            event: event.signature.clone(),
            reason: e.to_string(),
        })?;

    Ok(match decoded {
        DynSolValue::Tuple(values) => values,
        other => vec![other],
    })
}

fn apply_arguments(log: &mut ChainLog, event: &EventDefinition, arguments: &EventArguments) {
    log.event = event.name.clone();
    log.event_signature = event.signature.clone();
    log.anonymous = event.anonymous;
    log.argument_names = arguments.iter().map(|a| a.name.clone()).collect();
    log.argument_types = arguments.iter().map(|a| a.ty.clone()).collect();
    log.argument_values = arguments.iter().map(|a| render_value(&a.value)).collect();
    log.decoded = true;
}
