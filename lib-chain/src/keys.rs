//! Storage Key Layout
//!
//! Key encoding is protocol. These functions define the canonical byte
//! layout for all contract-state keys; never inline key construction in
//! contract logic.
//!
//! Layout conventions:
//! - Every key is scoped by the owning contract's 20-byte address, so a
//!   contract's full state is reconstructible from its address alone.
//! - A one-byte field tag follows the address; composite keys append
//!   further fixed-width fields (no delimiters needed).

use lib_types::{Address, ADDRESS_LEN};

const TAG_KIND: u8 = 0x00;
const TAG_NONCE: u8 = 0x01;
const TAG_BALANCE: u8 = 0x02;
const TAG_TOKEN_BASE: u8 = 0x03;
const TAG_TOKEN_CURVE: u8 = 0x04;
const TAG_TOKEN_SUPPLY: u8 = 0x05;

const SCOPED_LEN: usize = ADDRESS_LEN + 1;

fn scoped(addr: &Address, tag: u8) -> [u8; SCOPED_LEN] {
    let mut key = [0u8; SCOPED_LEN];
    key[..ADDRESS_LEN].copy_from_slice(addr.as_bytes());
    key[ADDRESS_LEN] = tag;
    key
}

/// Key holding a contract's kind discriminant. Its presence is what makes
/// an address "in use".
#[inline]
pub fn kind_key(addr: &Address) -> [u8; SCOPED_LEN] {
    scoped(addr, TAG_KIND)
}

/// Key holding an account's transaction nonce.
#[inline]
pub fn nonce_key(addr: &Address) -> [u8; SCOPED_LEN] {
    scoped(addr, TAG_NONCE)
}

/// Key holding one account's balance of one token:
/// `[account: 20][tag: 1][token: 20]`.
#[inline]
pub fn balance_key(addr: &Address, token: &Address) -> [u8; SCOPED_LEN + ADDRESS_LEN] {
    let mut key = [0u8; SCOPED_LEN + ADDRESS_LEN];
    key[..ADDRESS_LEN].copy_from_slice(addr.as_bytes());
    key[ADDRESS_LEN] = TAG_BALANCE;
    key[SCOPED_LEN..].copy_from_slice(token.as_bytes());
    key
}

/// Key holding a token's base-token address.
#[inline]
pub fn token_base_key(addr: &Address) -> [u8; SCOPED_LEN] {
    scoped(addr, TAG_TOKEN_BASE)
}

/// Key holding a token's pricing curve.
#[inline]
pub fn token_curve_key(addr: &Address) -> [u8; SCOPED_LEN] {
    scoped(addr, TAG_TOKEN_CURVE)
}

/// Key holding a token's aggregate supply.
#[inline]
pub fn token_supply_key(addr: &Address) -> [u8; SCOPED_LEN] {
    scoped(addr, TAG_TOKEN_SUPPLY)
}

/// Well-known protected (lane-exempt) keys.
pub mod protected {
    /// Last committed block height, as a little-endian u64.
    pub const BLOCK_HEIGHT: &str = "chain block height";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_scoped_by_address() {
        let a = Address::new([0x11; ADDRESS_LEN]);
        let b = Address::new([0x22; ADDRESS_LEN]);
        assert_ne!(kind_key(&a), kind_key(&b));
        assert!(kind_key(&a).starts_with(a.as_bytes()));
    }

    #[test]
    fn field_tags_do_not_collide() {
        let addr = Address::new([0x33; ADDRESS_LEN]);
        let keys = [
            kind_key(&addr).to_vec(),
            nonce_key(&addr).to_vec(),
            token_base_key(&addr).to_vec(),
            token_curve_key(&addr).to_vec(),
            token_supply_key(&addr).to_vec(),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn balance_key_is_token_scoped() {
        let addr = Address::new([0x44; ADDRESS_LEN]);
        let t1 = Address::new([0x55; ADDRESS_LEN]);
        let t2 = Address::new([0x66; ADDRESS_LEN]);
        assert_ne!(balance_key(&addr, &t1), balance_key(&addr, &t2));
        assert_eq!(balance_key(&addr, &t1).len(), 41);
    }
}
