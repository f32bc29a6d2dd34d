use chrono::{DateTime, Utc};

use crate::models::datasets::blocks::{ChainBlock, RpcBlockData};
use crate::utils::codec::{
    derive_human_readable_text, hex_encode_prefixed, normalize_address, truncate_to_day,
    u256_to_f64,
};

pub trait BlockTransformer {
    fn transform_blocks(blocks: Vec<RpcBlockData>) -> Vec<ChainBlock>;
}

impl BlockTransformer for RpcBlockData {
    fn transform_blocks(blocks: Vec<RpcBlockData>) -> Vec<ChainBlock> {
        blocks.iter().map(to_canonical_block).collect()
    }
}

/// Converts a raw block into its `blocks` row.
///
/// Never fails: fields the RPC client left out fall back to zero values.
pub fn to_canonical_block(block: &RpcBlockData) -> ChainBlock {
    // Out-of-range timestamps fall back to the epoch
    let timestamp = i64::try_from(block.timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_default();

    let extra_data_raw = hex_encode_prefixed(&block.extra_data);
    let extra_data = derive_human_readable_text(&extra_data_raw);

    ChainBlock {
        number: block.number,
        hash: block.hash.to_string(),
        parent_hash: block.parent_hash.to_string(),
        nonce: format!("{:x}", block.nonce.unwrap_or_default()),
        mix_hash: block.mix_hash.unwrap_or_default().to_string(),
        sha3_uncles: block.sha3_uncles.to_string(),
        logs_bloom: hex_encode_prefixed(block.logs_bloom.as_slice()),
        transactions_root: block.transactions_root.to_string(),
        state_root: block.state_root.to_string(),
        receipts_root: block.receipts_root.to_string(),
        miner: normalize_address(&block.miner.to_string()),
        difficulty: u256_to_f64(block.difficulty),
        total_difficulty: 0.0,
        size: block
            .size
            .map(|size| size.saturating_to::<u64>())
            .unwrap_or_default(),
        gas_limit: block.gas_limit,
        gas_used: block.gas_used,
        base_fee_per_gas: block.base_fee_per_gas,
        timestamp,
        uncles: block.uncles.iter().map(ToString::to_string).collect(),
        num_of_transactions: u32::try_from(block.transaction_count).unwrap_or(u32::MAX),
        extra_data_raw,
        extra_data,
        process_time: Utc::now(),
        block_date: truncate_to_day(timestamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, Bytes, U256, address, b256};
    use chrono::TimeZone;

    fn raw_block() -> RpcBlockData {
        RpcBlockData {
            number: 19_426_589,
            hash: b256!("0x1111111111111111111111111111111111111111111111111111111111111111"),
            parent_hash: b256!(
                "0x2222222222222222222222222222222222222222222222222222222222222222"
            ),
            nonce: Some(0x42),
            miner: address!("0x95222290DD7278Aa3Ddd389Cc1E1d165CC4BAfe5"),
            difficulty: U256::from(58_750_003_716_598_352_816_469u128),
            size: Some(U256::from(71_234u64)),
            gas_limit: 30_000_000,
            gas_used: 12_345_678,
            base_fee_per_gas: Some(25_000_000_000),
            // 2024-03-13T13:55:35Z
            timestamp: 1_710_338_135,
            extra_data: Bytes::from_static(b"beaverbuild.org\n"),
            uncles: vec![B256::repeat_byte(0x33), B256::repeat_byte(0x44)],
            transaction_count: 79,
            ..Default::default()
        }
    }

    #[test]
    fn derives_dates_from_chain_timestamp() {
        let block = to_canonical_block(&raw_block());
        assert_eq!(
            block.timestamp,
            Utc.with_ymd_and_hms(2024, 3, 13, 13, 55, 35).unwrap()
        );
        assert_eq!(
            block.block_date,
            Utc.with_ymd_and_hms(2024, 3, 13, 0, 0, 0).unwrap()
        );
        assert_eq!(block.block_date, truncate_to_day(block.timestamp));
    }

    #[test]
    fn keeps_raw_and_readable_extra_data() {
        let block = to_canonical_block(&raw_block());
        assert_eq!(block.extra_data_raw, "0x6265617665726275696c642e6f72670a");
        assert_eq!(block.extra_data, "beaverbuild.org");
    }

    #[test]
    fn normalizes_scalar_fields() {
        let block = to_canonical_block(&raw_block());
        assert_eq!(block.number, 19_426_589);
        assert_eq!(
            block.hash,
            "0x1111111111111111111111111111111111111111111111111111111111111111"
        );
        assert_eq!(block.nonce, "42");
        assert_eq!(block.miner, "0x95222290dd7278aa3ddd389cc1e1d165cc4bafe5");
        assert_eq!(block.total_difficulty, 0.0);
        assert!(block.difficulty > 5.8e22 && block.difficulty < 5.9e22);
        assert_eq!(block.size, 71_234);
        assert_eq!(block.base_fee_per_gas, Some(25_000_000_000));
        assert_eq!(block.num_of_transactions, 79);
        assert_eq!(block.logs_bloom.len(), 2 + 512);
    }

    #[test]
    fn out_of_range_counters_saturate() {
        let block = to_canonical_block(&RpcBlockData {
            timestamp: u64::MAX,
            transaction_count: usize::MAX,
            ..Default::default()
        });
        assert_eq!(block.timestamp, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(block.block_date, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(block.num_of_transactions, u32::MAX);
    }

    #[test]
    fn preserves_uncle_order() {
        let block = to_canonical_block(&raw_block());
        assert_eq!(
            block.uncles,
            vec![
                B256::repeat_byte(0x33).to_string(),
                B256::repeat_byte(0x44).to_string()
            ]
        );
    }

    #[test]
    fn missing_optional_fields_default_to_zero() {
        let block = to_canonical_block(&RpcBlockData {
            miner: Address::ZERO,
            ..Default::default()
        });
        assert_eq!(block.nonce, "0");
        assert_eq!(block.size, 0);
        assert_eq!(block.base_fee_per_gas, None);
        assert_eq!(block.extra_data_raw, "0x");
        assert_eq!(block.extra_data, "");
        assert_eq!(block.mix_hash, B256::ZERO.to_string());
    }

    #[test]
    fn transforms_batches_in_order() {
        let mut second = raw_block();
        second.number += 1;
        let blocks = RpcBlockData::transform_blocks(vec![raw_block(), second]);
        assert_eq!(
            blocks.iter().map(|b| b.number).collect::<Vec<_>>(),
            vec![19_426_589, 19_426_590]
        );
    }
}
