//! Token contract: a fungible asset backed by a bonding curve.

use lib_codec::{Decode, Encode, U256};
use lib_storage::Storage;
use lib_types::Address;

use crate::contracts::{Curve, ContractKind};
use crate::error::{ChainError, ChainResult, DomainError};
use crate::keys;
use lib_storage::StorageError;

/// Bonding-curve-backed token. Purchases are paid for in the base token;
/// supply moves only through buy/sell.
#[derive(Debug)]
pub struct Token {
    pub address: Address,
    /// Token the curve prices purchases in. The genesis token is its own
    /// base.
    pub base: Address,
    pub curve: Curve,
    pub supply: U256,
}

impl Token {
    pub fn new(address: Address, base: Address, curve: Curve) -> Self {
        Self {
            address,
            base,
            curve,
            supply: U256::ZERO,
        }
    }

    /// Load a token's fields from the active lane. A kind tag without its
    /// fields is corruption, not absence.
    pub fn load(store: &dyn Storage, address: Address) -> ChainResult<Self> {
        let base = Address::decode_from_slice(&Self::field(store, &keys::token_base_key(&address))?)?;
        let curve = Curve::decode_from_slice(&Self::field(store, &keys::token_curve_key(&address))?)?;
        let supply =
            U256::decode_from_slice(&Self::field(store, &keys::token_supply_key(&address))?)?;
        Ok(Self {
            address,
            base,
            curve,
            supply,
        })
    }

    fn field(store: &dyn Storage, key: &[u8]) -> ChainResult<Vec<u8>> {
        store.get(key)?.ok_or_else(|| {
            ChainError::Storage(StorageError::CorruptedData(hex::encode(key)))
        })
    }

    /// Cost in base tokens of minting `amount` at the current supply.
    pub fn buy_cost(&self, amount: U256) -> Result<U256, DomainError> {
        self.curve.range_cost(self.supply, amount)
    }

    /// Refund in base tokens of burning `amount` at the current supply.
    pub fn sell_refund(&self, amount: U256) -> Result<U256, DomainError> {
        let remaining = self
            .supply
            .checked_sub(amount)
            .ok_or(DomainError::SupplyUnderflow)?;
        self.curve.range_cost(remaining, amount)
    }

    /// Write every field into the active lane.
    pub fn store(&self, store: &dyn Storage) -> ChainResult<()> {
        store.put(
            &keys::kind_key(&self.address),
            &ContractKind::Token.encode_to_vec(),
        )?;
        store.put(&keys::token_base_key(&self.address), &self.base.encode_to_vec())?;
        store.put(
            &keys::token_curve_key(&self.address),
            &self.curve.encode_to_vec(),
        )?;
        store.put(
            &keys::token_supply_key(&self.address),
            &self.supply.encode_to_vec(),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_storage::MemStorage;

    #[test]
    fn store_then_load_roundtrip() {
        let store = MemStorage::new();
        let addr = Address::new([0xaa; 20]);
        let base = Address::new([0xbb; 20]);
        let mut token = Token::new(addr, base, Curve::Linear { base_price: 1, slope: 2 });
        token.supply = U256::from(99u64);
        token.store(&store).unwrap();
        store.flush().unwrap();

        let loaded = Token::load(&store, addr).unwrap();
        assert_eq!(loaded.base, base);
        assert_eq!(loaded.curve, token.curve);
        assert_eq!(loaded.supply, U256::from(99u64));
    }

    #[test]
    fn sell_more_than_supply_underflows() {
        let token = Token::new(
            Address::new([1; 20]),
            Address::new([2; 20]),
            Curve::Constant { price: 1 },
        );
        assert!(matches!(
            token.sell_refund(U256::from(1u64)),
            Err(DomainError::SupplyUnderflow)
        ));
    }
}
