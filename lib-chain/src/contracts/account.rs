//! Account contract: an address owning a mapping of token → balance.

use std::collections::HashMap;

use lib_codec::{Decode, Encode, U256};
use lib_storage::Storage;
use lib_types::Address;
use tracing::debug;

use crate::contracts::ContractKind;
use crate::error::{ChainResult, DomainError};
use crate::keys;

/// Per-address balance state. Fields live in memory until the enclosing
/// call flushes; a reset simply drops the instance.
#[derive(Debug)]
pub struct Account {
    pub address: Address,
    /// Loaded/mutated balances; entries absent here fall back to storage.
    balances: HashMap<Address, U256>,
}

impl Account {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balances: HashMap::new(),
        }
    }

    /// Current balance of `token`, loading it from the active lane on
    /// first access. Missing keys mean a zero balance, not an error.
    pub fn balance(&mut self, store: &dyn Storage, token: Address) -> ChainResult<U256> {
        if let Some(value) = self.balances.get(&token) {
            return Ok(*value);
        }
        let value = match store.get(&keys::balance_key(&self.address, &token))? {
            Some(raw) => U256::decode_from_slice(&raw)?,
            None => U256::ZERO,
        };
        debug!(account = %self.address, %token, %value, "balance loaded");
        self.balances.insert(token, value);
        Ok(value)
    }

    pub fn set_balance(&mut self, token: Address, value: U256) {
        debug!(account = %self.address, %token, %value, "balance set");
        self.balances.insert(token, value);
    }

    /// Checked credit.
    pub fn credit(
        &mut self,
        store: &dyn Storage,
        token: Address,
        amount: U256,
    ) -> ChainResult<()> {
        let current = self.balance(store, token)?;
        let updated = current.checked_add(amount).ok_or(DomainError::Overflow)?;
        self.set_balance(token, updated);
        Ok(())
    }

    /// Checked debit; a debit below the current balance fails and leaves
    /// the balance untouched.
    pub fn debit(&mut self, store: &dyn Storage, token: Address, amount: U256) -> ChainResult<()> {
        let current = self.balance(store, token)?;
        if current < amount {
            return Err(DomainError::InsufficientBalance {
                account: self.address,
                token,
                have: current,
                need: amount,
            }
            .into());
        }
        self.set_balance(token, current - amount);
        Ok(())
    }

    /// Write every loaded field into the active lane.
    pub fn store(&self, store: &dyn Storage) -> ChainResult<()> {
        store.put(
            &keys::kind_key(&self.address),
            &ContractKind::Account.encode_to_vec(),
        )?;
        for (token, value) in &self.balances {
            store.put(
                &keys::balance_key(&self.address, token),
                &value.encode_to_vec(),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_storage::MemStorage;

    #[test]
    fn missing_balance_is_zero() {
        let store = MemStorage::new();
        let mut account = Account::new(Address::new([1; 20]));
        let token = Address::new([2; 20]);
        assert_eq!(account.balance(&store, token).unwrap(), U256::ZERO);
    }

    #[test]
    fn debit_below_balance_fails_and_preserves_state() {
        let store = MemStorage::new();
        let mut account = Account::new(Address::new([1; 20]));
        let token = Address::new([2; 20]);
        account.set_balance(token, U256::from(10u64));

        let err = account.debit(&store, token, U256::from(11u64)).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ChainError::Domain(DomainError::InsufficientBalance { .. })
        ));
        assert_eq!(account.balance(&store, token).unwrap(), U256::from(10u64));
    }

    #[test]
    fn stored_balances_reload_after_flush() {
        let store = MemStorage::new();
        let addr = Address::new([1; 20]);
        let token = Address::new([2; 20]);

        let mut account = Account::new(addr);
        account.credit(&store, token, U256::from(7u64)).unwrap();
        account.store(&store).unwrap();
        store.flush().unwrap();

        let mut reloaded = Account::new(addr);
        assert_eq!(reloaded.balance(&store, token).unwrap(), U256::from(7u64));
    }
}
