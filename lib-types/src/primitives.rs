use lib_codec::{Buffer, CodecResult, Decode, Encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Block height in the chain (0 = no committed blocks yet).
pub type BlockHeight = u64;

/// Length of an [`Address`] in bytes.
pub const ADDRESS_LEN: usize = 20;
/// Length of a [`TxHash`] in bytes.
pub const TX_HASH_LEN: usize = 32;
/// Length of a [`VerifyKey`] in bytes.
pub const VERIFY_KEY_LEN: usize = 32;
/// Length of a [`SignatureBytes`] in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// 20-byte identifier namespacing accounts and contracts.
///
/// Either fixed/well-known (genesis contracts) or derived deterministically
/// from a hash via [`Address::derive`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// The zero address. Home of the Creator contract.
    pub const fn zero() -> Self {
        Self([0u8; ADDRESS_LEN])
    }

    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Derive an address from arbitrary input bytes: the first 20 bytes of
    /// SHA-256(input). Used for verify-key → account addresses and
    /// tx-hash → token addresses; determinism here is what makes creation
    /// replay-safe across nodes.
    pub fn derive(input: &[u8]) -> Self {
        let digest = Sha256::digest(input);
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[..ADDRESS_LEN]);
        Self(bytes)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl Encode for Address {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_bytes(&self.0);
    }
}

impl Decode for Address {
    fn decode(buf: &mut Buffer) -> CodecResult<Self> {
        let raw = buf.read_bytes(ADDRESS_LEN)?;
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(raw);
        Ok(Self(bytes))
    }
}

/// 32-byte transaction hash (SHA-256 of the raw transaction bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TxHash(pub [u8; TX_HASH_LEN]);

impl TxHash {
    pub const fn new(bytes: [u8; TX_HASH_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn zero() -> Self {
        Self([0u8; TX_HASH_LEN])
    }

    pub const fn as_bytes(&self) -> &[u8; TX_HASH_LEN] {
        &self.0
    }

    /// Hash raw transaction bytes.
    pub fn of(raw: &[u8]) -> Self {
        let digest = Sha256::digest(raw);
        let mut bytes = [0u8; TX_HASH_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for TxHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Encode for TxHash {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_bytes(&self.0);
    }
}

impl Decode for TxHash {
    fn decode(buf: &mut Buffer) -> CodecResult<Self> {
        let raw = buf.read_bytes(TX_HASH_LEN)?;
        let mut bytes = [0u8; TX_HASH_LEN];
        bytes.copy_from_slice(raw);
        Ok(Self(bytes))
    }
}

/// Ed25519 verify key identifying a transaction sender.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerifyKey(pub [u8; VERIFY_KEY_LEN]);

impl VerifyKey {
    pub const fn new(bytes: [u8; VERIFY_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; VERIFY_KEY_LEN] {
        &self.0
    }

    /// The account address owned by this key.
    pub fn to_address(&self) -> Address {
        Address::derive(&self.0)
    }
}

impl fmt::Debug for VerifyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifyKey({})", hex::encode(&self.0[..8]))
    }
}

impl Encode for VerifyKey {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_bytes(&self.0);
    }
}

impl Decode for VerifyKey {
    fn decode(buf: &mut Buffer) -> CodecResult<Self> {
        let raw = buf.read_bytes(VERIFY_KEY_LEN)?;
        let mut bytes = [0u8; VERIFY_KEY_LEN];
        bytes.copy_from_slice(raw);
        Ok(Self(bytes))
    }
}

/// Raw Ed25519 signature. Opaque here; verification is the chain layer's
/// concern.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SignatureBytes(pub [u8; SIGNATURE_LEN]);

impl SignatureBytes {
    pub const fn new(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }
}

impl fmt::Debug for SignatureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureBytes({})", hex::encode(&self.0[..8]))
    }
}

impl Encode for SignatureBytes {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_bytes(&self.0);
    }
}

impl Decode for SignatureBytes {
    fn decode(buf: &mut Buffer) -> CodecResult<Self> {
        let raw = buf.read_bytes(SIGNATURE_LEN)?;
        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes.copy_from_slice(raw);
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_codec::{Decode, Encode};

    #[test]
    fn address_derivation_is_deterministic() {
        let a = Address::derive(b"some input");
        let b = Address::derive(b"some input");
        let c = Address::derive(b"other input");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn address_codec_roundtrip() {
        let addr = Address::new([0xab; ADDRESS_LEN]);
        let bytes = addr.encode_to_vec();
        assert_eq!(bytes.len(), ADDRESS_LEN);
        assert_eq!(Address::decode_from_slice(&bytes).unwrap(), addr);
    }

    #[test]
    fn tx_hash_of_matches_sha256() {
        let hash = TxHash::of(b"abc");
        // SHA-256("abc") well-known digest, first bytes ba7816bf...
        assert_eq!(&hash.0[..4], &[0xba, 0x78, 0x16, 0xbf]);
    }

    #[test]
    fn truncated_primitives_fail_to_decode() {
        assert!(Address::decode_from_slice(&[0; 19]).is_err());
        assert!(TxHash::decode_from_slice(&[0; 31]).is_err());
        assert!(SignatureBytes::decode_from_slice(&[0; 63]).is_err());
    }
}
