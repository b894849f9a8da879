//! Primary Listener
//!
//! The one listener that executes state transitions. Envelope validation
//! (signature, nonce) and message execution are separate steps so the
//! mempool can run the former alone in the check lane.
//!
//! # Invariants
//!
//! - A staged nonce increment survives only if `process` flushes it; a
//!   rejected message burns nothing.
//! - `process` resets the context on every exit path, success or failure.

use ed25519_dalek::{Signature, VerifyingKey};
use lib_codec::{Buffer, Decode, Encode};
use lib_storage::Lane;
use lib_types::Address;
use tracing::{debug, info};

use crate::context::{ExecutionContext, Provenance};
use crate::contracts::{Curve, GENESIS_TOKEN_ADDRESS};
use crate::error::{ChainResult, DomainError};
use crate::keys;
use crate::listener::{
    BlockInfo, BlockObserver, GenesisInfo, Message, PrimaryListener, TxHeader, ValidationMode,
};

pub struct ChainPrimary {
    ctx: ExecutionContext,
}

impl ChainPrimary {
    pub fn new(ctx: ExecutionContext) -> Self {
        Self { ctx }
    }

    fn verify_signature(header: &TxHeader, signed: &[u8]) -> ChainResult<()> {
        let key = VerifyingKey::from_bytes(header.verify_key.as_bytes())
            .map_err(|_| DomainError::InvalidSignature)?;
        let signature = Signature::from_bytes(header.signature.as_bytes());
        key.verify_strict(signed, &signature)
            .map_err(|_| DomainError::InvalidSignature)?;
        Ok(())
    }

    fn check_and_bump_nonce(&mut self, header: &TxHeader) -> ChainResult<()> {
        let store = self.ctx.store();
        let key = keys::nonce_key(&header.sender);
        let expected = match store.get(&key)? {
            Some(raw) => u64::decode_from_slice(&raw)?,
            None => 0,
        };
        if header.nonce != expected {
            return Err(DomainError::InvalidNonce {
                expected,
                actual: header.nonce,
            }
            .into());
        }
        // Staged, not flushed: visible only if process() flushes.
        store.put(&key, &(expected + 1).encode_to_vec())?;
        Ok(())
    }
}

impl BlockObserver for ChainPrimary {
    fn init(&mut self, _genesis: &GenesisInfo) -> ChainResult<()> {
        self.ctx.switch_to(Lane::Transaction);
        self.ctx.set_provenance(Provenance {
            tx_hash: lib_types::TxHash::zero(),
            block_time: 0,
            sender: Address::zero(),
        });
        self.ctx.create_creator()?;
        self.ctx.create_token_at(
            GENESIS_TOKEN_ADDRESS,
            GENESIS_TOKEN_ADDRESS,
            Curve::Linear {
                base_price: 0,
                slope: 1,
            },
        )?;
        self.ctx.flush()?;
        self.ctx.reset();
        info!("genesis contracts installed");
        Ok(())
    }

    fn is_primary_capable(&self) -> bool {
        true
    }
}

impl PrimaryListener for ChainPrimary {
    fn validate_transaction(
        &mut self,
        mode: ValidationMode,
        header: &TxHeader,
        signed: &[u8],
    ) -> ChainResult<()> {
        let lane = match mode {
            ValidationMode::Check => Lane::Check,
            ValidationMode::Apply => Lane::Transaction,
        };
        self.ctx.switch_to(lane);
        Self::verify_signature(header, signed)?;
        self.check_and_bump_nonce(header)?;
        debug!(sender = %header.sender, nonce = header.nonce, ?mode, "transaction validated");
        Ok(())
    }

    fn process(
        &mut self,
        block: &BlockInfo,
        header: &TxHeader,
        message: &Message,
    ) -> ChainResult<Vec<u8>> {
        self.ctx.switch_to(Lane::Transaction);
        self.ctx.set_provenance(Provenance {
            tx_hash: header.hash,
            block_time: block.timestamp,
            sender: header.sender,
        });

        let outcome = (|| {
            let mut msg = Buffer::from_bytes(message.to_call_bytes());
            let mut result = Buffer::new();
            self.ctx.call(&mut msg, &mut result)?;
            self.ctx.flush()?;
            Ok(result.into_vec())
        })();

        self.ctx.reset();
        outcome
    }

    fn reset(&mut self) {
        self.ctx.reset();
    }
}
