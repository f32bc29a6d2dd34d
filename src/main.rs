use alloy_network::AnyNetwork;
use alloy_provider::ProviderBuilder;
use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::{signal, time::Instant};
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};
use url::Url;

use chain_normalizer::abi::ContractRegistry;
use chain_normalizer::indexer;
use chain_normalizer::indexer::handlers::{HandlerCatalog, HandlerDispatcher};
use chain_normalizer::metrics::Metrics;
use chain_normalizer::models::common::TransformedData;
use chain_normalizer::models::datasets::blocks::ChainBlock;
use chain_normalizer::models::datasets::logs::ChainLog;
use chain_normalizer::utils::load_config;

const SLEEP_DURATION: u64 = 1000; // ms

// One line of output, tagged with its destination table
#[derive(Serialize)]
#[serde(tag = "table", content = "row", rename_all = "lowercase")]
enum OutputRow<'a> {
    Blocks(&'a ChainBlock),
    Logs(&'a ChainLog),
}

fn write_rows<W: Write>(out: &mut W, data: &TransformedData) -> Result<()> {
    let rows = data
        .blocks
        .iter()
        .map(OutputRow::Blocks)
        .chain(data.logs.iter().map(OutputRow::Logs));
    for row in rows {
        serde_json::to_writer(&mut *out, &row)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only rows
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(io::stderr)
        .init();

    info!("=========================== INITIALIZING ===========================");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yml".to_string());
    let config = match load_config(&config_path) {
        Ok(config) => {
            info!("Config loaded successfully");
            config
        }
        Err(e) => {
            error!("Failed to load config: {:#}", e);
            return Err(e);
        }
    };

    let metrics = if config.metrics.enabled {
        Some(Metrics::new(config.chain_name.clone())?)
    } else {
        info!("Metrics are disabled");
        None
    };

    if let Some(metrics) = &metrics {
        metrics
            .start_metrics_server(&config.metrics.address, config.metrics.port)
            .await
            .context("failed to start metrics server")?;
    }

    let registry = ContractRegistry::from_config(&config.abi_dir, &config.contracts)?;
    info!("Registered {} contracts", registry.len());

    let dispatcher = HandlerDispatcher::from_config(
        &config.event_handlers,
        &config.block_handlers,
        &HandlerCatalog::builtin(),
    )?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    tokio::spawn(async move {
        if let Ok(()) = signal::ctrl_c().await {
            info!("Received Ctrl+C signal, initiating shutdown...");
            shutdown_flag.store(true, Ordering::SeqCst);
        }
    });

    let rpc_url: Url = config
        .rpc_url
        .parse()
        .with_context(|| format!("invalid rpc_url {}", config.rpc_url))?;
    info!("RPC URL: {}", rpc_url);
    let provider = ProviderBuilder::new()
        .network::<AnyNetwork>()
        .connect_http(rpc_url);

    let mut block_number = config.start_block;
    if let Some(end_block) = config.end_block {
        if end_block < block_number {
            return Err(anyhow!(
                "end_block {} is before start_block {}",
                end_block,
                block_number
            ));
        }
    }

    info!("Starting block number: {}", block_number);
    info!("======================== STARTING NORMALIZER =======================");

    let mut out = BufWriter::new(io::stdout().lock());

    loop {
        if shutdown.load(Ordering::SeqCst) {
            info!("Shutting down main processing loop...");
            break;
        }

        match config.end_block {
            Some(end_block) if block_number > end_block => {
                info!("Reached end block {}", end_block);
                break;
            }
            Some(_) => {}
            None => {
                let latest_block =
                    indexer::get_latest_block_number(&provider, metrics.as_ref()).await?;
                if block_number > latest_block {
                    info!(
                        "Caught up with chain tip {}, sleeping for {}ms",
                        latest_block, SLEEP_DURATION
                    );
                    tokio::time::sleep(tokio::time::Duration::from_millis(SLEEP_DURATION)).await;
                    continue;
                }
            }
        }

        let block_start_time = Instant::now();

        let data =
            indexer::process_block(&provider, block_number, &registry, metrics.as_ref()).await?;
        write_rows(&mut out, &data)?;
        let summary = dispatcher.dispatch(&data)?;

        info!(
            "Processed block {} ({} logs, {} handled)",
            block_number,
            data.logs.len(),
            summary.logs_handled
        );

        if let Some(metrics) = &metrics {
            let labels = metrics.chain_label();
            metrics.blocks_processed.add(1, &labels);
            metrics.latest_processed_block.record(block_number, &labels);
            metrics
                .latest_block_processing_time
                .record(block_start_time.elapsed().as_secs_f64(), &labels);
        }

        block_number += 1;
    }

    Ok(())
}
