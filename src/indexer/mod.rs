pub mod handlers;
pub mod rpc;
pub mod transformations;

use alloy_eips::BlockNumberOrTag;
use alloy_network::{AnyNetwork, AnyRpcBlock};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{Filter, Log};
use anyhow::{Context, Result, anyhow};
use std::time::Instant;
use tracing::{debug, warn};

use crate::abi::ContractRegistry;
use crate::indexer::rpc::{blocks::BlockParser, logs::LogParser};
use crate::indexer::transformations::blocks::to_canonical_block;
use crate::indexer::transformations::logs::to_canonical_log;
use crate::metrics::Metrics;
use crate::models::common::TransformedData;
use crate::models::datasets::blocks::RpcBlockData;
use crate::models::datasets::logs::RpcLogData;

fn record_rpc_call<T, E>(
    metrics: Option<&Metrics>,
    method: &'static str,
    start: Instant,
    result: &Result<T, E>,
) {
    if let Some(metrics) = metrics {
        let labels = metrics.method_labels(method);
        metrics.rpc_requests.add(1, &labels);
        metrics
            .rpc_latency
            .record(start.elapsed().as_secs_f64(), &labels);
        if result.is_err() {
            metrics.rpc_errors.add(1, &labels);
        }
    }
}

pub async fn get_latest_block_number<P>(provider: &P, metrics: Option<&Metrics>) -> Result<u64>
where
    P: Provider<AnyNetwork>,
{
    let start = Instant::now();
    let result = provider.get_block_number().await;
    record_rpc_call(metrics, "get_latest_block_number", start, &result);

    result.map_err(|e| {
        warn!("Failed to get latest block number. Error details:\n{:#?}", e);
        anyhow!("RPC error: {}", e)
    })
}

pub async fn get_block_by_number<P>(
    provider: &P,
    block_number: u64,
    metrics: Option<&Metrics>,
) -> Result<Option<AnyRpcBlock>>
where
    P: Provider<AnyNetwork>,
{
    let start = Instant::now();
    let result = provider
        .get_block_by_number(BlockNumberOrTag::Number(block_number))
        .await;
    record_rpc_call(metrics, "get_block_by_number", start, &result);

    result.map_err(|e| {
        warn!(
            "Failed to get block {}. Error details:\n{:#?}",
            block_number, e
        );
        anyhow!("RPC error: {}", e)
    })
}

pub async fn get_logs<P>(
    provider: &P,
    block_number: u64,
    metrics: Option<&Metrics>,
) -> Result<Vec<Log>>
where
    P: Provider<AnyNetwork>,
{
    let filter = Filter::new()
        .from_block(block_number)
        .to_block(block_number);

    let start = Instant::now();
    let result = provider.get_logs(&filter).await;
    record_rpc_call(metrics, "get_logs", start, &result);

    result.map_err(|e| {
        warn!(
            "Failed to get logs for block {}. Error details:\n{:#?}",
            block_number, e
        );
        anyhow!("RPC error: {}", e)
    })
}

/// Canonicalizes one block and its logs, then decodes every log whose
/// contract has a registered ABI.
///
/// Logs inherit the block's timestamp and date. A log that fails to decode is
/// kept as an undecoded row.
pub fn transform_data(
    block: &RpcBlockData,
    logs: &[RpcLogData],
    registry: &ContractRegistry,
    metrics: Option<&Metrics>,
) -> TransformedData {
    let block = to_canonical_block(block);

    let mut decoded = 0u64;
    let mut failed = 0u64;
    let logs = logs
        .iter()
        .map(|raw| {
            let mut log = to_canonical_log(raw, block.timestamp, block.block_date);
            match registry.decode(raw, &mut log) {
                Ok(Some(arguments)) => {
                    decoded += 1;
                    debug!(
                        "Decoded {} with {} arguments (block {}, log {})",
                        log.event,
                        arguments.len(),
                        log.block_number,
                        log.log_index
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    failed += 1;
                    warn!(
                        "Keeping undecoded log {} of tx {}: {}",
                        log.log_index, log.transaction_hash, e
                    );
                }
            }
            log
        })
        .collect::<Vec<_>>();

    if let Some(metrics) = metrics {
        let labels = metrics.chain_label();
        metrics.logs_processed.add(logs.len() as u64, &labels);
        metrics.logs_decoded.add(decoded, &labels);
        metrics.log_decode_errors.add(failed, &labels);
    }

    TransformedData {
        blocks: vec![block],
        logs,
    }
}

/// Fetches, parses and normalizes a single block.
pub async fn process_block<P>(
    provider: &P,
    block_number: u64,
    registry: &ContractRegistry,
    metrics: Option<&Metrics>,
) -> Result<TransformedData>
where
    P: Provider<AnyNetwork>,
{
    let block = get_block_by_number(provider, block_number, metrics)
        .await?
        .ok_or_else(|| anyhow!("Provider returned no block {}", block_number))?;
    let logs = get_logs(provider, block_number, metrics)
        .await
        .with_context(|| format!("fetching logs of block {block_number}"))?;

    let block = block.parse_block();
    let logs = logs.parse_logs();

    Ok(transform_data(&block, &logs, registry, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, Bytes, U256, address, b256};

    use crate::abi::{AbiDecoder, ContractInterface};

    const TOKEN: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    const TRANSFER: B256 =
        b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");
    const ABI: &str = r#"[{"type":"event","name":"Transfer","anonymous":false,"inputs":[
        {"name":"from","type":"address","indexed":true},
        {"name":"to","type":"address","indexed":true},
        {"name":"value","type":"uint256","indexed":false}]}]"#;

    fn registry() -> ContractRegistry {
        let mut registry = ContractRegistry::new();
        let interface = ContractInterface::from_json_str("token", ABI).unwrap();
        registry.register(&TOKEN.to_string(), AbiDecoder::new(interface));
        registry
    }

    fn block() -> RpcBlockData {
        RpcBlockData {
            number: 100,
            timestamp: 1_700_000_000,
            transaction_count: 1,
            ..Default::default()
        }
    }

    fn transfer(data: Bytes) -> RpcLogData {
        RpcLogData {
            block_number: Some(100),
            tx_hash: Some(B256::repeat_byte(0x11)),
            log_index: Some(0),
            address: TOKEN,
            topics: vec![
                TRANSFER,
                Address::repeat_byte(0x01).into_word(),
                Address::repeat_byte(0x02).into_word(),
            ],
            data,
            ..Default::default()
        }
    }

    #[test]
    fn decodes_logs_of_registered_contracts() {
        let data = Bytes::from(U256::from(1000).to_be_bytes::<32>().to_vec());
        let other = RpcLogData {
            address: Address::repeat_byte(0x99),
            topics: vec![TRANSFER],
            log_index: Some(1),
            ..Default::default()
        };

        let out = transform_data(&block(), &[transfer(data), other], &registry(), None);

        assert_eq!(out.blocks.len(), 1);
        assert_eq!(out.logs.len(), 2);
        assert!(out.logs[0].decoded);
        assert_eq!(out.logs[0].event, "Transfer");
        assert_eq!(out.logs[0].argument_values[2], "1000");
        assert!(!out.logs[1].decoded);
    }

    #[test]
    fn logs_inherit_block_time() {
        let data = Bytes::from(U256::from(1).to_be_bytes::<32>().to_vec());
        let out = transform_data(&block(), &[transfer(data)], &registry(), None);
        assert_eq!(out.logs[0].block_time, out.blocks[0].timestamp);
        assert_eq!(out.logs[0].block_date, out.blocks[0].block_date);
    }

    #[test]
    fn failed_decode_keeps_raw_row() {
        let out = transform_data(
            &block(),
            &[transfer(Bytes::from_static(&[0x01, 0x02]))],
            &registry(),
            None,
        );

        let log = &out.logs[0];
        assert!(!log.decoded);
        assert!(log.event.is_empty());
        assert!(log.argument_values.is_empty());
        assert_eq!(log.topics.len(), 3);
    }
}
