//! Lifecycle Manager
//!
//! Sequences consensus callbacks into the primary listener and the
//! observers, and enforces the call protocol:
//!
//! ```text
//! init_chain (once) -> [begin_block -> apply_transaction* -> end_block
//!                       -> commit_block]*
//! ```
//!
//! `check_transaction` is valid at any point inside a block window and
//! never leaves durable effects.
//!
//! # Invariants
//!
//! - Exactly one primary; observers run after it, in registration order.
//! - The primary is reset after every transaction, accepted or rejected,
//!   so one transaction's failure cannot leak into the next.
//! - Height is authoritative here, not in consensus input: it is restored
//!   from the store at startup and incremented once per begin_block.

use std::sync::Arc;

use lib_codec::{Buffer, CodecError, Decode, Encode};
use lib_storage::Storage;
use lib_types::{Address, BlockHeight};
use tracing::{debug, info};

use crate::error::{ChainResult, ConfigError};
use crate::keys;
use crate::listener::{
    parse_header, BlockInfo, BlockObserver, GenesisInfo, Message, PrimaryListener,
    ValidationMode, ValidatorUpdate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleState {
    Idle,
    InBlock,
}

impl LifecycleState {
    fn name(self) -> &'static str {
        match self {
            LifecycleState::Idle => "Idle",
            LifecycleState::InBlock => "InBlock",
        }
    }
}

pub struct LifecycleManager {
    store: Arc<dyn Storage>,
    primary: Option<Box<dyn PrimaryListener>>,
    observers: Vec<Box<dyn BlockObserver>>,
    state: LifecycleState,
    height: BlockHeight,
    block: Option<BlockInfo>,
}

impl LifecycleManager {
    /// Restores the committed height so a restarted process resumes its
    /// count instead of starting over.
    pub fn new(store: Arc<dyn Storage>) -> ChainResult<Self> {
        let height = match store.get_protected_key(keys::protected::BLOCK_HEIGHT)? {
            Some(raw) => BlockHeight::decode_from_slice(&raw)?,
            None => 0,
        };
        Ok(Self {
            store,
            primary: None,
            observers: Vec::new(),
            state: LifecycleState::Idle,
            height,
            block: None,
        })
    }

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    pub fn set_primary(&mut self, primary: Box<dyn PrimaryListener>) -> ChainResult<()> {
        if self.primary.is_some() {
            return Err(ConfigError::PrimaryAlreadySet.into());
        }
        self.primary = Some(primary);
        Ok(())
    }

    pub fn add_observer(&mut self, observer: Box<dyn BlockObserver>) -> ChainResult<()> {
        if observer.is_primary_capable() {
            return Err(ConfigError::ObserverIsPrimary.into());
        }
        self.observers.push(observer);
        Ok(())
    }

    fn expect_state(&self, op: &'static str, expected: LifecycleState) -> ChainResult<()> {
        if self.state != expected {
            return Err(ConfigError::InvalidLifecycleState {
                op,
                state: self.state.name(),
            }
            .into());
        }
        Ok(())
    }

    /// Install genesis state. Valid once per store, outside any block.
    /// The protected height key is written only after the genesis commit
    /// lands, so it doubles as the "initialized" marker.
    pub fn init_chain(&mut self, genesis: &GenesisInfo) -> ChainResult<()> {
        self.expect_state("init_chain", LifecycleState::Idle)?;
        if self
            .store
            .get_protected_key(keys::protected::BLOCK_HEIGHT)?
            .is_some()
        {
            return Err(ConfigError::AlreadyInitialized.into());
        }
        if let Some(primary) = self.primary.as_mut() {
            primary.init(genesis)?;
        }
        for observer in &mut self.observers {
            observer.init(genesis)?;
        }
        self.store.commit_block()?;
        self.store
            .save_protected_key(keys::protected::BLOCK_HEIGHT, &0u64.encode_to_vec())?;
        info!("chain initialized");
        Ok(())
    }

    /// Open a block. Height is owned here: consensus supplies only the
    /// timestamp and proposer, and the manager numbers the block itself,
    /// so listeners can never observe a height that disagrees with the one
    /// committed later.
    pub fn begin_block(&mut self, timestamp: u64, proposer: Address) -> ChainResult<()> {
        self.expect_state("begin_block", LifecycleState::Idle)?;
        self.height += 1;
        let block = BlockInfo {
            height: self.height,
            timestamp,
            proposer,
        };
        self.state = LifecycleState::InBlock;
        self.block = Some(block);
        debug!(height = self.height, "block opened");
        if let Some(primary) = self.primary.as_mut() {
            primary.begin(&block)?;
        }
        for observer in &mut self.observers {
            observer.begin(&block)?;
        }
        Ok(())
    }

    /// Mempool admission check. Runs in the check lane; nothing persists.
    pub fn check_transaction(&mut self, raw: &[u8]) -> ChainResult<()> {
        self.expect_state("check_transaction", LifecycleState::InBlock)?;
        let primary = self
            .primary
            .as_mut()
            .ok_or(ConfigError::MissingPrimary("check_transaction"))?;
        let (header, signed, _) = parse_header(raw)?;
        let outcome = primary.validate_transaction(ValidationMode::Check, &header, &signed);
        primary.reset();
        outcome
    }

    /// Deliver one transaction into the open block. On rejection the
    /// primary is reset and no state (including the sender's nonce)
    /// changes. `precomputed` is the result recorded when the block was
    /// first executed; it is used only when no primary is registered
    /// (replay mode) and ignored otherwise.
    pub fn apply_transaction(&mut self, raw: &[u8], precomputed: &[u8]) -> ChainResult<Vec<u8>> {
        self.expect_state("apply_transaction", LifecycleState::InBlock)?;
        let block = self
            .block
            .ok_or(ConfigError::InvalidLifecycleState {
                op: "apply_transaction",
                state: "InBlock without block info",
            })?;
        let (header, signed, mut payload) = parse_header(raw)?;
        let message = Message::decode(&mut payload)?;

        let result = match self.primary.as_mut() {
            Some(primary) => {
                let outcome = primary
                    .validate_transaction(ValidationMode::Apply, &header, &signed)
                    .and_then(|()| primary.process(&block, &header, &message));
                match outcome {
                    Ok(result) => result,
                    Err(err) => {
                        primary.reset();
                        return Err(err);
                    }
                }
            }
            // Replay mode: results were decided when the block was first
            // executed; observers only watch. The recording is
            // length-prefixed and must account for every byte.
            None => Self::decode_recorded_result(precomputed)?,
        };

        for observer in &mut self.observers {
            observer.deliver(&block, &header, &message, &result)?;
        }
        Ok(result)
    }

    fn decode_recorded_result(precomputed: &[u8]) -> ChainResult<Vec<u8>> {
        let mut recorded = Buffer::from_bytes(precomputed.to_vec());
        let len = u64::decode(&mut recorded)? as usize;
        if len != recorded.remaining_len() {
            return Err(CodecError::UnexpectedEnd {
                needed: len,
                available: recorded.remaining_len(),
            }
            .into());
        }
        Ok(recorded.read_bytes(len)?.to_vec())
    }

    /// Close the open block's delivery phase. Returns validator-set
    /// changes for consensus; this chain never changes its validator set.
    pub fn end_block(&mut self) -> ChainResult<Vec<ValidatorUpdate>> {
        self.expect_state("end_block", LifecycleState::InBlock)?;
        if self.primary.is_none() {
            return Err(ConfigError::MissingPrimary("end_block").into());
        }
        Ok(Vec::new())
    }

    /// Persist the block's flushed writes, then the new height. The height
    /// key is written last: a failed listener commit or storage commit
    /// must never leave a height on record whose block did not land.
    pub fn commit_block(&mut self) -> ChainResult<()> {
        self.expect_state("commit_block", LifecycleState::InBlock)?;
        if let Some(primary) = self.primary.as_mut() {
            primary.commit()?;
        }
        for observer in &mut self.observers {
            observer.commit()?;
        }
        self.store.commit_block()?;
        self.store
            .save_protected_key(keys::protected::BLOCK_HEIGHT, &self.height.encode_to_vec())?;
        self.state = LifecycleState::Idle;
        self.block = None;
        info!(height = self.height, "block committed");
        Ok(())
    }
}
