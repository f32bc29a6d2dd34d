use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::common::{BlockHandlerConfig, EventHandlerConfig, TransformedData};
use crate::models::datasets::blocks::ChainBlock;
use crate::models::datasets::logs::ChainLog;
use crate::models::errors::ConfigError;

/// User logic run on every decoded log of one event.
///
/// Returns `Ok(true)` when the handler acted on the log and `Ok(false)` when
/// it chose to skip it.
pub trait LogHandler: Send + Sync {
    fn handle(&self, log: &ChainLog) -> Result<bool>;
}

/// User logic run once per normalized block.
pub trait BlockHandler: Send + Sync {
    fn handle(&self, block: &ChainBlock) -> Result<bool>;
}

/// Emits one `info!` line per row it sees.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceHandler;

impl LogHandler for TraceHandler {
    fn handle(&self, log: &ChainLog) -> Result<bool> {
        info!(
            "{} in block {} log {}: {:?}",
            log.event_signature, log.block_number, log.log_index, log.argument_values
        );
        Ok(true)
    }
}

impl BlockHandler for TraceHandler {
    fn handle(&self, block: &ChainBlock) -> Result<bool> {
        info!(
            "Block {} with {} transactions",
            block.number, block.num_of_transactions
        );
        Ok(true)
    }
}

/// Handlers compiled into the binary, addressable by name from the config.
#[derive(Clone, Default)]
pub struct HandlerCatalog {
    log_handlers: BTreeMap<String, Arc<dyn LogHandler>>,
    block_handlers: BTreeMap<String, Arc<dyn BlockHandler>>,
}

impl HandlerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the handlers shipped with the crate (`trace`).
    pub fn builtin() -> Self {
        Self::new()
            .with_log_handler("trace", Arc::new(TraceHandler))
            .with_block_handler("trace", Arc::new(TraceHandler))
    }

    pub fn with_log_handler(mut self, name: &str, handler: Arc<dyn LogHandler>) -> Self {
        self.log_handlers.insert(name.to_string(), handler);
        self
    }

    pub fn with_block_handler(mut self, name: &str, handler: Arc<dyn BlockHandler>) -> Self {
        self.block_handlers.insert(name.to_string(), handler);
        self
    }

    fn log_handler(&self, name: &str) -> Result<Arc<dyn LogHandler>, ConfigError> {
        self.log_handlers
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownHandler {
                name: name.to_string(),
            })
    }

    fn block_handler(&self, name: &str) -> Result<Arc<dyn BlockHandler>, ConfigError> {
        self.block_handlers
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownHandler {
                name: name.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub blocks_handled: usize,
    pub logs_handled: usize,
}

/// Routes normalized rows to their handlers.
///
/// Decoded logs go to the handlers bound to their event name, in binding
/// order. Undecoded logs are never dispatched. Every block goes to every
/// block handler.
#[derive(Clone, Default)]
pub struct HandlerDispatcher {
    log_handlers: BTreeMap<String, Vec<(String, Arc<dyn LogHandler>)>>,
    block_handlers: Vec<(String, Arc<dyn BlockHandler>)>,
}

impl HandlerDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(
        event_handlers: &[EventHandlerConfig],
        block_handlers: &[BlockHandlerConfig],
        catalog: &HandlerCatalog,
    ) -> Result<Self, ConfigError> {
        let mut dispatcher = Self::new();
        for binding in event_handlers {
            let handler = catalog.log_handler(&binding.handler)?;
            dispatcher.register_log_handler(&binding.event, &binding.handler, handler);
        }
        for binding in block_handlers {
            let handler = catalog.block_handler(&binding.handler)?;
            dispatcher.register_block_handler(&binding.handler, handler);
        }
        Ok(dispatcher)
    }

    pub fn register_log_handler(&mut self, event: &str, name: &str, handler: Arc<dyn LogHandler>) {
        info!("Bound log handler {} to event {}", name, event);
        self.log_handlers
            .entry(event.to_string())
            .or_default()
            .push((name.to_string(), handler));
    }

    pub fn register_block_handler(&mut self, name: &str, handler: Arc<dyn BlockHandler>) {
        info!("Bound block handler {}", name);
        self.block_handlers.push((name.to_string(), handler));
    }

    pub fn is_empty(&self) -> bool {
        self.log_handlers.is_empty() && self.block_handlers.is_empty()
    }

    /// Runs the handlers over one block's rows. Stops at the first handler error.
    pub fn dispatch(&self, data: &TransformedData) -> Result<DispatchSummary> {
        let mut summary = DispatchSummary::default();

        for block in &data.blocks {
            for (name, handler) in &self.block_handlers {
                if handler
                    .handle(block)
                    .with_context(|| format!("block handler {name} failed on block {}", block.number))?
                {
                    summary.blocks_handled += 1;
                }
            }
        }

        for log in data.logs.iter().filter(|log| log.decoded) {
            let Some(handlers) = self.log_handlers.get(&log.event) else {
                continue;
            };
            for (name, handler) in handlers {
                let handled = handler.handle(log).with_context(|| {
                    format!(
                        "log handler {name} failed on {} (tx {}, log {})",
                        log.event, log.transaction_hash, log.log_index
                    )
                })?;
                debug!(
                    "Handler {} returned {} for {} log {}",
                    name, handled, log.event, log.log_index
                );
                if handled {
                    summary.logs_handled += 1;
                }
            }
        }

        Ok(summary)
    }
}
