use alloy_primitives::{Address, B256, Bloom, Bytes, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

////////////////////////////////////// RPC Data ////////////////////////////////////////
// Block header fields as returned by the RPC client
#[derive(Debug, Clone, Default)]
pub struct RpcBlockData {
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
    pub nonce: Option<u64>,
    pub mix_hash: Option<B256>,
    pub sha3_uncles: B256,
    pub logs_bloom: Bloom,
    pub transactions_root: B256,
    pub state_root: B256,
    pub receipts_root: B256,
    pub miner: Address,
    pub difficulty: U256,
    pub size: Option<U256>,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub base_fee_per_gas: Option<u64>,
    pub timestamp: u64,
    pub extra_data: Bytes,
    pub uncles: Vec<B256>,
    pub transaction_count: usize,
}

/////////////////////////////////// Transformed Data ///////////////////////////////////
// Row of the `blocks` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainBlock {
    pub number: u64,
    pub hash: String,
    pub parent_hash: String,
    pub nonce: String,
    pub mix_hash: String,
    pub sha3_uncles: String,
    pub logs_bloom: String,
    pub transactions_root: String,
    pub state_root: String,
    pub receipts_root: String,
    pub miner: String,
    pub difficulty: f64,
    // Not derivable from a single block, backfilled downstream if at all
    pub total_difficulty: f64,
    pub size: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub base_fee_per_gas: Option<u64>,
    pub timestamp: DateTime<Utc>,
    pub uncles: Vec<String>,
    pub num_of_transactions: u32,
    pub extra_data_raw: String,
    pub extra_data: String,
    pub process_time: DateTime<Utc>,
    pub block_date: DateTime<Utc>,
}
