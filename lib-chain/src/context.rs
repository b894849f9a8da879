//! Execution Context
//!
//! Owns the registry of live contracts, the dispatch tables, and the
//! ambient provenance of the call in flight (transaction hash, block
//! timestamp, sender). Provenance is an explicit value set before `call`
//! and valid only for its duration; there is no process-wide mutable
//! state.

use std::collections::HashMap;
use std::sync::Arc;

use lib_codec::{Buffer, Decode, U256};
use lib_storage::{Lane, Storage};
use lib_types::{Address, TxHash, VerifyKey};
use tracing::debug;

use crate::contracts::{Account, Contract, ContractKind, Curve, Token, CREATOR_ADDRESS};
use crate::dispatch::Dispatch;
use crate::error::{ChainResult, ConfigError, DomainError};
use crate::keys;

/// Ambient facts about the call in flight. Set before `call`, cleared by
/// `reset`.
#[derive(Debug, Clone, Copy)]
pub struct Provenance {
    /// Hash of the invoking transaction; seeds derived addresses.
    pub tx_hash: TxHash,
    /// Timestamp of the enclosing block.
    pub block_time: u64,
    /// Account that signed the transaction (zero for queries).
    pub sender: Address,
}

/// The execution engine for one lane at a time.
pub struct ExecutionContext {
    store: Arc<dyn Storage>,
    dispatch: Dispatch,
    contracts: HashMap<Address, Contract>,
    provenance: Option<Provenance>,
}

impl ExecutionContext {
    pub fn new(store: Arc<dyn Storage>) -> ChainResult<Self> {
        Ok(Self {
            store,
            dispatch: Dispatch::new()?,
            contracts: HashMap::new(),
            provenance: None,
        })
    }

    /// Shared handle to the storage engine.
    pub fn store(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.store)
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub fn switch_to(&self, lane: Lane) {
        self.store.switch_to(lane);
    }

    pub fn set_provenance(&mut self, provenance: Provenance) {
        self.provenance = Some(provenance);
    }

    pub fn provenance(&self) -> ChainResult<Provenance> {
        self.provenance
            .ok_or_else(|| ConfigError::MissingProvenance.into())
    }

    /// Single entry point for message execution: decode the target address
    /// and message id from `msg`, resolve the contract, dispatch, and
    /// serialize the handler's return value into `result`.
    pub fn call(&mut self, msg: &mut Buffer, result: &mut Buffer) -> ChainResult<()> {
        self.provenance()?;
        let target = Address::decode(msg)?;
        let msg_id = u16::decode(msg)?;
        let kind = self.contract_kind(target)?;
        let handler = self.dispatch.lookup(kind, msg_id)?;
        debug!(%target, kind = kind.name(), msg_id, "dispatching message");
        handler(self, target, msg, result)
    }

    fn contract_kind(&mut self, address: Address) -> ChainResult<ContractKind> {
        self.load(address)?;
        // load() just guaranteed presence
        Ok(self.contracts[&address].kind())
    }

    fn load(&mut self, address: Address) -> ChainResult<()> {
        if !self.contracts.contains_key(&address) {
            let contract = Contract::load(&*self.store, address)?;
            self.contracts.insert(address, contract);
        }
        Ok(())
    }

    /// Fetch a loaded-or-loadable Account, failing on absence or a
    /// different variant.
    pub fn get_account(&mut self, address: Address) -> ChainResult<&mut Account> {
        self.load(address)?;
        match self.contracts.get_mut(&address) {
            Some(Contract::Account(account)) => Ok(account),
            Some(other) => Err(DomainError::KindMismatch {
                address,
                expected: ContractKind::Account.name(),
                actual: other.kind().name(),
            }
            .into()),
            None => Err(DomainError::ContractNotFound(address).into()),
        }
    }

    /// Fetch a loaded-or-loadable Token, failing on absence or a
    /// different variant.
    pub fn get_token(&mut self, address: Address) -> ChainResult<&mut Token> {
        self.load(address)?;
        match self.contracts.get_mut(&address) {
            Some(Contract::Token(token)) => Ok(token),
            Some(other) => Err(DomainError::KindMismatch {
                address,
                expected: ContractKind::Token.name(),
                actual: other.kind().name(),
            }
            .into()),
            None => Err(DomainError::ContractNotFound(address).into()),
        }
    }

    /// Instantiate the Creator singleton at the zero address (genesis
    /// only).
    pub fn create_creator(&mut self) -> ChainResult<Address> {
        self.register(CREATOR_ADDRESS, Contract::Creator)
    }

    /// Instantiate an Account at the address owned by `verify_key`.
    pub fn create_account(&mut self, verify_key: VerifyKey) -> ChainResult<Address> {
        let address = verify_key.to_address();
        self.register(address, Contract::Account(Account::new(address)))
    }

    /// Instantiate a Token at an address derived from the current
    /// transaction's hash. At most one such creation per transaction;
    /// replaying the same hash collides and is rejected.
    pub fn create_token(&mut self, base: Address, curve: Curve) -> ChainResult<Address> {
        let tx_hash = self.provenance()?.tx_hash;
        let address = Address::derive(tx_hash.as_bytes());
        self.create_token_at(address, base, curve)
    }

    /// Instantiate a Token at a caller-chosen address (genesis only).
    pub fn create_token_at(
        &mut self,
        address: Address,
        base: Address,
        curve: Curve,
    ) -> ChainResult<Address> {
        self.register(address, Contract::Token(Token::new(address, base, curve)))
    }

    fn register(&mut self, address: Address, contract: Contract) -> ChainResult<Address> {
        if self.contracts.contains_key(&address)
            || self.store.get(&keys::kind_key(&address))?.is_some()
        {
            return Err(DomainError::DuplicateAddress(address).into());
        }
        debug!(%address, kind = contract.kind().name(), "contract created");
        self.contracts.insert(address, contract);
        Ok(address)
    }

    // -------------------------------------------------------------------
    // Balance helpers for message handlers
    // -------------------------------------------------------------------

    pub fn balance_of(&mut self, account: Address, token: Address) -> ChainResult<U256> {
        let store = self.store();
        self.get_account(account)?.balance(&*store, token)
    }

    pub fn credit(&mut self, account: Address, token: Address, amount: U256) -> ChainResult<()> {
        let store = self.store();
        self.get_account(account)?.credit(&*store, token, amount)
    }

    pub fn debit(&mut self, account: Address, token: Address, amount: U256) -> ChainResult<()> {
        let store = self.store();
        self.get_account(account)?.debit(&*store, token, amount)
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    /// Persist every live contract's dirty fields through the storage
    /// engine's flush, making them visible to later reads in this lane.
    pub fn flush(&mut self) -> ChainResult<()> {
        for (address, contract) in &self.contracts {
            contract.store(&*self.store, *address)?;
        }
        self.store.flush()?;
        Ok(())
    }

    /// Discard in-memory mutations and the active lane's unflushed writes.
    /// Invoked unconditionally after every external call, success or
    /// failure.
    pub fn reset(&mut self) {
        self.contracts.clear();
        self.provenance = None;
        self.store.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_storage::MemStorage;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(Arc::new(MemStorage::new())).unwrap()
    }

    fn provenance(hash_byte: u8) -> Provenance {
        Provenance {
            tx_hash: TxHash::new([hash_byte; 32]),
            block_time: 0,
            sender: Address::zero(),
        }
    }

    #[test]
    fn call_requires_provenance() {
        let mut ctx = ctx();
        let mut msg = Buffer::from_bytes(vec![0u8; 22]);
        let mut out = Buffer::new();
        assert!(matches!(
            ctx.call(&mut msg, &mut out),
            Err(crate::error::ChainError::Config(
                ConfigError::MissingProvenance
            ))
        ));
    }

    #[test]
    fn token_addresses_derive_from_tx_hash() {
        let mut ctx = ctx();
        let curve = Curve::Constant { price: 1 };
        let base = Address::new([0xbb; 20]);

        ctx.set_provenance(provenance(1));
        let first = ctx.create_token(base, curve).unwrap();
        ctx.set_provenance(provenance(2));
        let second = ctx.create_token(base, curve).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn replaying_a_tx_hash_collides() {
        let mut ctx = ctx();
        let curve = Curve::Constant { price: 1 };
        let base = Address::new([0xbb; 20]);

        ctx.set_provenance(provenance(7));
        ctx.create_token(base, curve).unwrap();
        let err = ctx.create_token(base, curve).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ChainError::Domain(DomainError::DuplicateAddress(_))
        ));
    }

    #[test]
    fn duplicate_address_detected_across_flush() {
        let mut ctx = ctx();
        ctx.set_provenance(provenance(3));
        ctx.create_token(Address::new([0xbb; 20]), Curve::Constant { price: 1 })
            .unwrap();
        ctx.flush().unwrap();
        ctx.reset();

        // Same tx hash replayed in a fresh call: the flushed kind tag
        // still claims the address.
        ctx.set_provenance(provenance(3));
        let err = ctx
            .create_token(Address::new([0xbb; 20]), Curve::Constant { price: 1 })
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ChainError::Domain(DomainError::DuplicateAddress(_))
        ));
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let mut ctx = ctx();
        ctx.set_provenance(provenance(4));
        let token = ctx
            .create_token(Address::new([0xbb; 20]), Curve::Constant { price: 1 })
            .unwrap();
        assert!(matches!(
            ctx.get_account(token),
            Err(crate::error::ChainError::Domain(
                DomainError::KindMismatch { .. }
            ))
        ));
    }

    #[test]
    fn reset_discards_unflushed_contracts() {
        let mut ctx = ctx();
        ctx.set_provenance(provenance(5));
        let token = ctx
            .create_token(Address::new([0xbb; 20]), Curve::Constant { price: 1 })
            .unwrap();
        ctx.reset();
        assert!(matches!(
            ctx.get_token(token),
            Err(crate::error::ChainError::Domain(
                DomainError::ContractNotFound(_)
            ))
        ));
    }
}
