use chrono::{DateTime, Utc};

use crate::models::datasets::logs::{ChainLog, RpcLogData};
use crate::utils::codec::{hex_encode_prefixed, normalize_address};

pub trait LogTransformer {
    fn transform_logs(
        logs: Vec<RpcLogData>,
        block_time: DateTime<Utc>,
        block_date: DateTime<Utc>,
    ) -> Vec<ChainLog>;
}

impl LogTransformer for RpcLogData {
    fn transform_logs(
        logs: Vec<RpcLogData>,
        block_time: DateTime<Utc>,
        block_date: DateTime<Utc>,
    ) -> Vec<ChainLog> {
        logs.iter()
            .map(|log| to_canonical_log(log, block_time, block_date))
            .collect()
    }
}

/// Converts a raw log into an undecoded `logs` row.
///
/// `block_time` and `block_date` come from the enclosing block, `process_time`
/// is the wall clock at conversion.
pub fn to_canonical_log(
    log: &RpcLogData,
    block_time: DateTime<Utc>,
    block_date: DateTime<Utc>,
) -> ChainLog {
    ChainLog {
        transaction_hash: log.tx_hash.unwrap_or_default().to_string(),
        transaction_index: log.tx_index.unwrap_or_default(),
        block_number: log.block_number.unwrap_or_default(),
        block_hash: log.block_hash.unwrap_or_default().to_string(),
        removed: log.removed,
        log_index: log.log_index.unwrap_or_default(),
        data: hex_encode_prefixed(&log.data),
        // Position matters: topic 0 is the event selector
        topics: log.topics.iter().map(ToString::to_string).collect(),
        contract_address: normalize_address(&log.address.to_string()),
        anonymous: false,
        event: String::new(),
        event_signature: String::new(),
        argument_names: Vec::new(),
        argument_types: Vec::new(),
        argument_values: Vec::new(),
        block_time,
        decoded: false,
        process_time: Utc::now(),
        block_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, Bytes, address};
    use chrono::TimeZone;

    use crate::utils::codec::truncate_to_day;

    fn raw_log() -> RpcLogData {
        RpcLogData {
            block_number: Some(12_965_001),
            block_hash: Some(B256::repeat_byte(0xab)),
            tx_hash: Some(B256::repeat_byte(0xcd)),
            tx_index: Some(7),
            log_index: Some(42),
            address: address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            topics: vec![
                B256::repeat_byte(0x01),
                B256::repeat_byte(0x02),
                B256::repeat_byte(0x03),
            ],
            data: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
            removed: true,
            ..Default::default()
        }
    }

    #[test]
    fn copies_identity_and_payload() {
        let block_time = Utc.with_ymd_and_hms(2021, 8, 5, 12, 33, 42).unwrap();
        let block_date = truncate_to_day(block_time);
        let before = Utc::now();
        let log = to_canonical_log(&raw_log(), block_time, block_date);

        assert_eq!(log.transaction_hash, B256::repeat_byte(0xcd).to_string());
        assert_eq!(log.transaction_index, 7);
        assert_eq!(log.block_number, 12_965_001);
        assert_eq!(log.log_index, 42);
        assert!(log.removed);
        assert_eq!(log.data, "0xdeadbeef");
        assert_eq!(
            log.contract_address,
            "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"
        );
        assert_eq!(log.block_time, block_time);
        assert_eq!(log.block_date, block_date);
        assert!(log.process_time >= before);
    }

    #[test]
    fn preserves_topic_order() {
        let log = to_canonical_log(&raw_log(), Utc::now(), Utc::now());
        assert_eq!(
            log.topics,
            vec![
                B256::repeat_byte(0x01).to_string(),
                B256::repeat_byte(0x02).to_string(),
                B256::repeat_byte(0x03).to_string(),
            ]
        );
    }

    #[test]
    fn starts_undecoded() {
        let log = to_canonical_log(&raw_log(), Utc::now(), Utc::now());
        assert!(!log.decoded);
        assert!(log.event.is_empty());
        assert!(log.argument_names.is_empty());
        assert!(log.argument_types.is_empty());
        assert!(log.argument_values.is_empty());
    }

    #[test]
    fn serializes_with_storage_column_names() {
        let log = to_canonical_log(&raw_log(), Utc::now(), Utc::now());
        let row = serde_json::to_value(&log).unwrap();
        assert_eq!(row["decoded_from_abi"], serde_json::Value::Bool(false));
        assert_eq!(row["contract_address"], log.contract_address.as_str());
        assert!(row.get("decoded").is_none());
    }
}
