//! Block Listeners
//!
//! The consensus engine drives the chain through a small set of lifecycle
//! calls. Exactly one primary listener executes state transitions; any
//! number of passive observers see the same calls after the primary, in
//! registration order.
//!
//! # Transaction wire layout
//!
//! ```text
//! raw = [verify_key: 32][signature: 64][nonce: u64 LE][payload]
//! payload = [timestamp: u64 LE][target: 20][msg_id: u16 LE][args...]
//! ```
//!
//! The signature covers everything after itself (nonce and payload). The
//! transaction hash is SHA-256 of the full raw bytes.

pub mod logging;
pub mod manager;
pub mod primary;

use lib_codec::{Buffer, Decode, Encode};
use lib_types::{Address, BlockHeight, SignatureBytes, TxHash, VerifyKey};

use crate::error::ChainResult;

/// Consensus-supplied facts about the block being built.
#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
    pub height: BlockHeight,
    pub timestamp: u64,
    pub proposer: Address,
}

/// Opaque genesis payload handed to `init_chain`.
#[derive(Debug, Clone, Default)]
pub struct GenesisInfo {
    pub raw: Vec<u8>,
}

/// Validator-set change reported back to consensus at end of block.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorUpdate {
    pub verify_key: VerifyKey,
    pub power: u64,
}

/// Envelope fields of a transaction, parsed before any validation.
#[derive(Debug, Clone, Copy)]
pub struct TxHeader {
    pub hash: TxHash,
    pub verify_key: VerifyKey,
    pub signature: SignatureBytes,
    pub nonce: u64,
    pub sender: Address,
}

/// Decoded transaction payload.
#[derive(Debug, Clone)]
pub struct Message {
    pub timestamp: u64,
    pub target: Address,
    pub msg_id: u16,
    pub args: Vec<u8>,
}

impl Message {
    pub fn decode(payload: &mut Buffer) -> ChainResult<Self> {
        let timestamp = u64::decode(payload)?;
        let target = Address::decode(payload)?;
        let msg_id = u16::decode(payload)?;
        let args = payload.read_bytes(payload.remaining_len())?.to_vec();
        Ok(Self {
            timestamp,
            target,
            msg_id,
            args,
        })
    }

    /// Re-encode the dispatchable part (target, id, args) for the
    /// execution context's `call`.
    pub fn to_call_bytes(&self) -> Vec<u8> {
        let mut buf = Buffer::new();
        self.target.encode(&mut buf);
        self.msg_id.encode(&mut buf);
        buf.write_bytes(&self.args);
        buf.into_vec()
    }
}

/// Split a raw transaction into its header, the signed region (nonce plus
/// payload), and a buffer positioned at the payload.
pub fn parse_header(raw: &[u8]) -> ChainResult<(TxHeader, Vec<u8>, Buffer)> {
    let hash = TxHash::of(raw);
    let mut buf = Buffer::from_bytes(raw.to_vec());
    let verify_key = VerifyKey::decode(&mut buf)?;
    let signature = SignatureBytes::decode(&mut buf)?;
    let signed = buf.remaining().to_vec();
    let nonce = u64::decode(&mut buf)?;
    let header = TxHeader {
        hash,
        verify_key,
        signature,
        nonce,
        sender: verify_key.to_address(),
    };
    Ok((header, signed, buf))
}

/// Which lane a transaction validation runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Mempool admission; effects are never committed.
    Check,
    /// In-block delivery; effects persist on commit.
    Apply,
}

/// Passive recipient of block lifecycle events. All hooks default to
/// no-ops so observers implement only what they watch.
pub trait BlockObserver {
    fn init(&mut self, _genesis: &GenesisInfo) -> ChainResult<()> {
        Ok(())
    }

    fn begin(&mut self, _block: &BlockInfo) -> ChainResult<()> {
        Ok(())
    }

    fn deliver(
        &mut self,
        _block: &BlockInfo,
        _header: &TxHeader,
        _message: &Message,
        _result: &[u8],
    ) -> ChainResult<()> {
        Ok(())
    }

    fn commit(&mut self) -> ChainResult<()> {
        Ok(())
    }

    /// Marker preventing a primary from being registered as an observer.
    fn is_primary_capable(&self) -> bool {
        false
    }
}

/// The one listener that executes transactions and owns their results.
pub trait PrimaryListener: BlockObserver {
    /// Check the envelope (signature, nonce) in the lane selected by
    /// `mode`. On success the incremented nonce is staged but not yet
    /// flushed; it becomes visible only if `process` succeeds.
    fn validate_transaction(
        &mut self,
        mode: ValidationMode,
        header: &TxHeader,
        signed: &[u8],
    ) -> ChainResult<()>;

    /// Execute the message and return its encoded result.
    fn process(
        &mut self,
        block: &BlockInfo,
        header: &TxHeader,
        message: &Message,
    ) -> ChainResult<Vec<u8>>;

    /// Discard all unflushed and lane-local state.
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_header_splits_envelope() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&[0x11; 32]); // verify key
        raw.extend_from_slice(&[0x22; 64]); // signature
        raw.extend_from_slice(&7u64.to_le_bytes());
        raw.extend_from_slice(b"payload");

        let (header, signed, mut payload) = parse_header(&raw).unwrap();
        assert_eq!(header.verify_key, VerifyKey::new([0x11; 32]));
        assert_eq!(header.nonce, 7);
        assert_eq!(header.hash, TxHash::of(&raw));
        assert_eq!(header.sender, VerifyKey::new([0x11; 32]).to_address());

        // Signed region starts at the nonce.
        assert_eq!(&signed[..8], &7u64.to_le_bytes());
        assert_eq!(&signed[8..], b"payload");
        assert_eq!(payload.read_bytes(7).unwrap(), b"payload");
    }

    #[test]
    fn parse_header_rejects_short_input() {
        assert!(parse_header(&[0u8; 40]).is_err());
    }

    #[test]
    fn message_roundtrips_through_call_bytes() {
        let mut payload = Buffer::new();
        55u64.encode(&mut payload);
        Address::new([9; 20]).encode(&mut payload);
        2u16.encode(&mut payload);
        payload.write_bytes(&[1, 2, 3]);

        let mut payload = Buffer::from_bytes(payload.into_vec());
        let message = Message::decode(&mut payload).unwrap();
        assert_eq!(message.timestamp, 55);
        assert_eq!(message.target, Address::new([9; 20]));
        assert_eq!(message.msg_id, 2);
        assert_eq!(message.args, vec![1, 2, 3]);

        let call = message.to_call_bytes();
        assert_eq!(&call[..20], Address::new([9; 20]).as_bytes());
        assert_eq!(&call[20..22], &2u16.to_le_bytes());
        assert_eq!(&call[22..], &[1, 2, 3]);
    }
}
