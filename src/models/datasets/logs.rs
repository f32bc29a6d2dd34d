use alloy_primitives::{Address, B256, Bytes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

////////////////////////////////////// RPC Data ////////////////////////////////////////
// Event log as returned by the RPC client
#[derive(Debug, Clone, Default)]
pub struct RpcLogData {
    pub block_number: Option<u64>,
    pub block_hash: Option<B256>,
    pub tx_hash: Option<B256>,
    pub tx_index: Option<u64>,
    pub log_index: Option<u64>,
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub removed: bool,
}

/////////////////////////////////// Transformed Data ///////////////////////////////////
// Row of the `logs` table. The argument columns stay empty until a decoder
// matches the log against a known event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainLog {
    pub transaction_hash: String,
    pub transaction_index: u64,
    pub block_number: u64,
    pub block_hash: String,
    pub removed: bool,
    pub log_index: u64,
    pub data: String,
    pub topics: Vec<String>,
    pub contract_address: String,
    pub anonymous: bool,
    pub event: String,
    pub event_signature: String,
    pub argument_names: Vec<String>,
    pub argument_types: Vec<String>,
    pub argument_values: Vec<String>,
    pub block_time: DateTime<Utc>,
    #[serde(rename = "decoded_from_abi")]
    pub decoded: bool,
    pub process_time: DateTime<Utc>,
    pub block_date: DateTime<Utc>,
}
