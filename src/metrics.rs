use std::sync::Arc;
use tracing::{error, info};

use anyhow::Result;
use axum::{Router, routing::get};
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Histogram, MeterProvider};
use opentelemetry_sdk::metrics::{MetricError, SdkMeterProvider};
use prometheus::{Encoder, TextEncoder};
use std::net::SocketAddr;

pub struct Metrics {
    registry: Arc<prometheus::Registry>,
    _provider: SdkMeterProvider,
    pub chain_name: String,

    // Block processing metrics
    pub blocks_processed: Counter<u64>,
    pub latest_processed_block: Gauge<u64>,
    pub latest_block_processing_time: Gauge<f64>,

    // Log metrics
    pub logs_processed: Counter<u64>,
    pub logs_decoded: Counter<u64>,
    pub log_decode_errors: Counter<u64>,

    // RPC metrics
    pub rpc_requests: Counter<u64>,
    pub rpc_errors: Counter<u64>,
    pub rpc_latency: Histogram<f64>,
}

impl Metrics {
    pub fn new(chain_name: String) -> Result<Self, MetricError> {
        let registry = prometheus::Registry::new();

        // Configure OpenTelemetry to use this registry
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        let provider = SdkMeterProvider::builder().with_reader(exporter).build();
        let meter = provider.meter("normalizer_metrics");

        let blocks_processed = meter
            .u64_counter("normalizer_blocks_processed")
            .with_description("Total number of blocks normalized")
            .build();

        let latest_processed_block = meter
            .u64_gauge("normalizer_latest_processed_block_number")
            .with_description("Latest block number normalized")
            .build();

        let latest_block_processing_time = meter
            .f64_gauge("normalizer_latest_block_processing")
            .with_description("Time spent normalizing the latest block")
            .with_unit("s")
            .build();

        let logs_processed = meter
            .u64_counter("normalizer_logs_processed")
            .with_description("Total number of logs normalized")
            .build();

        let logs_decoded = meter
            .u64_counter("normalizer_logs_decoded")
            .with_description("Number of logs decoded against a registered ABI")
            .build();

        let log_decode_errors = meter
            .u64_counter("normalizer_log_decode_errors")
            .with_description("Number of logs whose payload did not match the ABI event")
            .build();

        let rpc_requests = meter
            .u64_counter("normalizer_rpc_requests")
            .with_description("Number of RPC requests made")
            .build();

        let rpc_errors = meter
            .u64_counter("normalizer_rpc_errors")
            .with_description("Number of RPC errors encountered")
            .build();

        let rpc_latency = meter
            .f64_histogram("normalizer_rpc_latency")
            .with_description("RPC request latency")
            .with_boundaries(vec![
                0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 1.0, 5.0, 10.0,
            ])
            .with_unit("s")
            .build();

        Ok(Self {
            registry: Arc::new(registry),
            _provider: provider,
            chain_name,
            blocks_processed,
            latest_processed_block,
            latest_block_processing_time,
            logs_processed,
            logs_decoded,
            log_decode_errors,
            rpc_requests,
            rpc_errors,
            rpc_latency,
        })
    }

    /// Labels shared by every instrument.
    pub fn chain_label(&self) -> [KeyValue; 1] {
        [KeyValue::new("chain", self.chain_name.clone())]
    }

    pub fn method_labels(&self, method: &'static str) -> [KeyValue; 2] {
        [
            KeyValue::new("chain", self.chain_name.clone()),
            KeyValue::new("method", method),
        ]
    }

    pub async fn start_metrics_server(&self, addr: &str, port: u16) -> Result<()> {
        let addr = format!("{addr}:{port}").parse::<SocketAddr>()?;
        let registry = self.registry.clone();

        let app = Router::new().route("/metrics", get(move || metrics_handler(registry.clone())));

        // Only used for logging
        let access_url = if addr.ip().is_unspecified() {
            format!("http://localhost:{port}/metrics")
        } else {
            format!("http://{}:{port}/metrics", addr.ip())
        };

        info!(
            "Starting metrics server - binding to {} (accessible at {})",
            addr, access_url
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Metrics server stopped: {}", e);
            }
        });

        Ok(())
    }

    /// Current metrics in the Prometheus text format.
    pub fn render(&self) -> String {
        encode_registry(&self.registry)
    }
}

async fn metrics_handler(registry: Arc<prometheus::Registry>) -> String {
    encode_registry(&registry)
}

fn encode_registry(registry: &prometheus::Registry) -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        let metrics = Metrics::new("testnet".to_string()).unwrap();
        metrics.blocks_processed.add(2, &metrics.chain_label());
        metrics
            .rpc_requests
            .add(1, &metrics.method_labels("get_logs"));

        let text = metrics.render();
        assert!(text.contains("normalizer_blocks_processed"));
        assert!(text.contains("chain=\"testnet\""));
        assert!(text.contains("method=\"get_logs\""));
    }
}
