use alloy_network::AnyRpcBlock;

use crate::models::datasets::blocks::RpcBlockData;

pub trait BlockParser {
    fn parse_block(&self) -> RpcBlockData;
}

impl BlockParser for AnyRpcBlock {
    fn parse_block(&self) -> RpcBlockData {
        let inner = &self.header.inner;

        RpcBlockData {
            number: inner.number,
            hash: self.header.hash,
            parent_hash: inner.parent_hash,
            // Post-merge and most L2 blocks omit the nonce
            nonce: inner.nonce.map(|nonce| u64::from_be_bytes(nonce.0)),
            mix_hash: inner.mix_hash,
            sha3_uncles: inner.ommers_hash,
            logs_bloom: inner.logs_bloom,
            transactions_root: inner.transactions_root,
            state_root: inner.state_root,
            receipts_root: inner.receipts_root,
            miner: inner.beneficiary,
            difficulty: inner.difficulty,
            size: self.header.size,
            gas_limit: inner.gas_limit,
            gas_used: inner.gas_used,
            base_fee_per_gas: inner.base_fee_per_gas,
            timestamp: inner.timestamp,
            extra_data: inner.extra_data.clone(),
            uncles: self.uncles.clone(),
            transaction_count: self.transactions.len(),
        }
    }
}
