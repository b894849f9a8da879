//! Chain Node
//!
//! Top-level handle wiring a storage engine, the lifecycle manager with
//! its primary listener, and a read-only query path. This is the surface
//! a consensus integration embeds.

use std::sync::Arc;

use lib_codec::{Buffer, Decode, Encode};
use lib_storage::{Lane, Storage};
use lib_types::{Address, BlockHeight, TxHash};
use tracing::debug;

use crate::context::{ExecutionContext, Provenance};
use crate::error::ChainResult;
use crate::keys;
use crate::listener::manager::LifecycleManager;
use crate::listener::primary::ChainPrimary;

pub struct ChainNode {
    store: Arc<dyn Storage>,
    manager: LifecycleManager,
    query_ctx: ExecutionContext,
}

impl ChainNode {
    /// A full node: executes transactions and serves queries.
    pub fn new(store: Arc<dyn Storage>) -> ChainResult<Self> {
        let mut manager = LifecycleManager::new(Arc::clone(&store))?;
        let primary = ChainPrimary::new(ExecutionContext::new(Arc::clone(&store))?);
        manager.set_primary(Box::new(primary))?;
        Ok(Self {
            query_ctx: ExecutionContext::new(Arc::clone(&store))?,
            store,
            manager,
        })
    }

    /// A replay node: observers only, no primary. Transaction results are
    /// not recomputed.
    pub fn replay(store: Arc<dyn Storage>) -> ChainResult<Self> {
        Ok(Self {
            manager: LifecycleManager::new(Arc::clone(&store))?,
            query_ctx: ExecutionContext::new(Arc::clone(&store))?,
            store,
        })
    }

    pub fn manager(&mut self) -> &mut LifecycleManager {
        &mut self.manager
    }

    /// Last committed height; zero before init.
    pub fn committed_height(&self) -> ChainResult<BlockHeight> {
        match self
            .store
            .get_protected_key(keys::protected::BLOCK_HEIGHT)?
        {
            Some(raw) => Ok(BlockHeight::decode_from_slice(&raw)?),
            None => Ok(0),
        }
    }

    /// Serve a read-only query against committed state.
    ///
    /// Path `"abi"` returns the JSON self-description of every dispatch
    /// table. Any other path treats `data` as a message payload
    /// (`[timestamp][target][msg_id][args]`) executed in the query lane
    /// with zeroed provenance.
    pub fn query(&mut self, path: &str, data: &[u8]) -> ChainResult<Vec<u8>> {
        if path == "abi" {
            return Ok(self.query_ctx.dispatch().abi().to_string().into_bytes());
        }

        self.query_ctx.switch_to(Lane::Query);
        let mut buf = Buffer::from_bytes(data.to_vec());
        let outcome = (|| {
            let timestamp = u64::decode(&mut buf)?;
            self.query_ctx.set_provenance(Provenance {
                tx_hash: TxHash::zero(),
                block_time: timestamp,
                sender: Address::zero(),
            });
            let mut result = Buffer::new();
            self.query_ctx.call(&mut buf, &mut result)?;
            Ok(result.into_vec())
        })();
        self.query_ctx.reset();
        debug!(ok = outcome.is_ok(), "query served");
        outcome
    }
}

/// Convenience for building the standard query payload.
pub fn query_payload(timestamp: u64, target: Address, msg_id: u16, args: &[u8]) -> Vec<u8> {
    let mut buf = Buffer::new();
    timestamp.encode(&mut buf);
    target.encode(&mut buf);
    msg_id.encode(&mut buf);
    buf.write_bytes(args);
    buf.into_vec()
}
