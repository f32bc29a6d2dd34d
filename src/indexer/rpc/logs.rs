use alloy_rpc_types_eth::Log;

use crate::models::datasets::logs::RpcLogData;

pub trait LogParser {
    fn parse_logs(self) -> Vec<RpcLogData>;
}

impl LogParser for Vec<Log> {
    fn parse_logs(self) -> Vec<RpcLogData> {
        self.into_iter()
            .map(|log| RpcLogData {
                block_number: log.block_number,
                block_hash: log.block_hash,
                tx_hash: log.transaction_hash,
                tx_index: log.transaction_index,
                log_index: log.log_index,
                address: log.inner.address,
                topics: log.inner.data.topics().to_vec(),
                data: log.inner.data.data,
                removed: log.removed,
            })
            .collect()
    }
}
