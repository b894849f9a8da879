//! Contract Variants
//!
//! The variant set is closed and fixed at build time: {Account, Token,
//! Creator}, dispatched by pattern match. There is no uploaded or
//! interpreted contract code.
//!
//! Every variant persists its fields under keys scoped by its own address
//! (see [`crate::keys`]), so a contract's full state is reconstructible
//! from its address alone.

pub mod account;
pub mod curve;
pub mod token;

pub use account::Account;
pub use curve::Curve;
pub use token::Token;

use lib_codec::{Buffer, CodecError, CodecResult, Decode, Encode};
use lib_storage::Storage;
use lib_types::Address;

use crate::error::{ChainResult, DomainError};
use crate::keys;

/// Home of the Creator contract.
pub const CREATOR_ADDRESS: Address = Address::new([0u8; 20]);

/// Fixed address of the genesis token created at chain init.
pub const GENESIS_TOKEN_ADDRESS: Address = Address::new([0xbb; 20]);

/// Persisted discriminant naming a contract's variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    Account,
    Token,
    Creator,
}

impl ContractKind {
    pub fn name(self) -> &'static str {
        match self {
            ContractKind::Account => "Account",
            ContractKind::Token => "Token",
            ContractKind::Creator => "Creator",
        }
    }

    fn discriminant(self) -> u16 {
        match self {
            ContractKind::Account => 1,
            ContractKind::Token => 2,
            ContractKind::Creator => 3,
        }
    }
}

impl Encode for ContractKind {
    fn encode(&self, buf: &mut Buffer) {
        self.discriminant().encode(buf);
    }
}

impl Decode for ContractKind {
    fn decode(buf: &mut Buffer) -> CodecResult<Self> {
        match u16::decode(buf)? {
            1 => Ok(ContractKind::Account),
            2 => Ok(ContractKind::Token),
            3 => Ok(ContractKind::Creator),
            other => Err(CodecError::UnknownDiscriminant {
                type_name: "ContractKind",
                value: u64::from(other),
            }),
        }
    }
}

/// A live, addressed contract instance.
#[derive(Debug)]
pub enum Contract {
    Account(Account),
    Token(Token),
    /// Stateless singleton factory; its only persisted field is the kind
    /// tag claiming the address.
    Creator,
}

impl Contract {
    pub fn kind(&self) -> ContractKind {
        match self {
            Contract::Account(_) => ContractKind::Account,
            Contract::Token(_) => ContractKind::Token,
            Contract::Creator => ContractKind::Creator,
        }
    }

    /// Load the contract registered at `address` from the active lane.
    pub fn load(store: &dyn Storage, address: Address) -> ChainResult<Self> {
        let raw = store
            .get(&keys::kind_key(&address))?
            .ok_or(DomainError::ContractNotFound(address))?;
        match ContractKind::decode_from_slice(&raw)? {
            ContractKind::Account => Ok(Contract::Account(Account::new(address))),
            ContractKind::Token => Ok(Contract::Token(Token::load(store, address)?)),
            ContractKind::Creator => Ok(Contract::Creator),
        }
    }

    /// Write the contract's dirty fields into the active lane.
    pub fn store(&self, store: &dyn Storage, address: Address) -> ChainResult<()> {
        match self {
            Contract::Account(account) => account.store(store),
            Contract::Token(token) => token.store(store),
            Contract::Creator => {
                store.put(
                    &keys::kind_key(&address),
                    &ContractKind::Creator.encode_to_vec(),
                )?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_storage::MemStorage;

    #[test]
    fn load_absent_address_is_not_found() {
        let store = MemStorage::new();
        let err = Contract::load(&store, Address::new([9; 20])).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ChainError::Domain(DomainError::ContractNotFound(_))
        ));
    }

    #[test]
    fn kind_tag_roundtrips_through_storage() {
        let store = MemStorage::new();
        let addr = Address::new([7; 20]);
        Contract::Creator.store(&store, addr).unwrap();
        store.flush().unwrap();
        let loaded = Contract::load(&store, addr).unwrap();
        assert_eq!(loaded.kind(), ContractKind::Creator);
    }

    #[test]
    fn unknown_kind_discriminant_fails_decode() {
        assert!(matches!(
            ContractKind::decode_from_slice(&[0xff, 0xff]),
            Err(CodecError::UnknownDiscriminant { .. })
        ));
    }
}
