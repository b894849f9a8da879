//! Observer that mirrors block lifecycle events into the log.

use tracing::info;

use crate::error::ChainResult;
use crate::listener::{BlockInfo, BlockObserver, GenesisInfo, Message, TxHeader};

#[derive(Debug, Default)]
pub struct LoggingObserver {
    delivered: u64,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockObserver for LoggingObserver {
    fn init(&mut self, genesis: &GenesisInfo) -> ChainResult<()> {
        info!(genesis_bytes = genesis.raw.len(), "observing chain init");
        Ok(())
    }

    fn begin(&mut self, block: &BlockInfo) -> ChainResult<()> {
        info!(
            height = block.height,
            timestamp = block.timestamp,
            proposer = %block.proposer,
            "block started"
        );
        Ok(())
    }

    fn deliver(
        &mut self,
        block: &BlockInfo,
        header: &TxHeader,
        message: &Message,
        result: &[u8],
    ) -> ChainResult<()> {
        self.delivered += 1;
        info!(
            height = block.height,
            tx = %header.hash,
            sender = %header.sender,
            target = %message.target,
            msg_id = message.msg_id,
            result_bytes = result.len(),
            "transaction delivered"
        );
        Ok(())
    }

    fn commit(&mut self) -> ChainResult<()> {
        info!(total_delivered = self.delivered, "block committed");
        Ok(())
    }
}
