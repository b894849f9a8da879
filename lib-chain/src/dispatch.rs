//! Message Dispatch Tables
//!
//! One table per contract kind, registered once at startup. Each entry
//! binds a numeric message id to a handler plus the human-readable
//! name/input/output strings served by the `abi` query. Re-registering an
//! id is a wiring bug and fails construction.

use lib_codec::{Buffer, Decode, Encode, U256};
use lib_types::{Address, VerifyKey};
use serde_json::json;

use crate::context::ExecutionContext;
use crate::contracts::{ContractKind, Curve};
use crate::error::{ChainResult, ConfigError, DomainError};

/// A message handler. Plain function pointers keep the tables `Copy` and
/// constructible without allocation per call.
pub type Handler =
    fn(&mut ExecutionContext, Address, &mut Buffer, &mut Buffer) -> ChainResult<()>;

#[derive(Debug)]
struct MessageDef {
    id: u16,
    name: &'static str,
    input: &'static str,
    output: &'static str,
    handler: Handler,
}

#[derive(Debug)]
struct DispatchTable {
    kind: ContractKind,
    messages: Vec<MessageDef>,
}

impl DispatchTable {
    fn new(kind: ContractKind, messages: Vec<MessageDef>) -> Result<Self, ConfigError> {
        for (i, def) in messages.iter().enumerate() {
            if messages[..i].iter().any(|prev| prev.id == def.id) {
                return Err(ConfigError::DuplicateMessageId {
                    kind: kind.name(),
                    id: def.id,
                });
            }
        }
        Ok(Self { kind, messages })
    }

    fn lookup(&self, id: u16) -> Result<Handler, DomainError> {
        self.messages
            .iter()
            .find(|def| def.id == id)
            .map(|def| def.handler)
            .ok_or(DomainError::UnknownMessage {
                kind: self.kind.name(),
                id,
            })
    }

    fn describe(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for def in &self.messages {
            map.insert(
                def.name.to_owned(),
                json!({ "ID": def.id, "Input": def.input, "Output": def.output }),
            );
        }
        serde_json::Value::Object(map)
    }
}

/// All dispatch tables, one per contract kind.
pub struct Dispatch {
    account: DispatchTable,
    token: DispatchTable,
    creator: DispatchTable,
}

impl Dispatch {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            account: DispatchTable::new(
                ContractKind::Account,
                vec![
                    MessageDef {
                        id: 1,
                        name: "get_balance",
                        input: "[token: address]",
                        output: "[balance: u256]",
                        handler: account_get_balance,
                    },
                    MessageDef {
                        id: 2,
                        name: "transfer",
                        input: "[token: address][dest: address][amount: u256]",
                        output: "[]",
                        handler: account_transfer,
                    },
                ],
            )?,
            token: DispatchTable::new(
                ContractKind::Token,
                vec![
                    MessageDef {
                        id: 1,
                        name: "buy",
                        input: "[amount: u256]",
                        output: "[cost: u256]",
                        handler: token_buy,
                    },
                    MessageDef {
                        id: 2,
                        name: "sell",
                        input: "[amount: u256]",
                        output: "[refund: u256]",
                        handler: token_sell,
                    },
                ],
            )?,
            creator: DispatchTable::new(
                ContractKind::Creator,
                vec![MessageDef {
                    id: 1,
                    name: "create",
                    input: "[kind: u16][params...]",
                    output: "[address: address]",
                    handler: creator_create,
                }],
            )?,
        })
    }

    pub fn lookup(&self, kind: ContractKind, id: u16) -> Result<Handler, DomainError> {
        match kind {
            ContractKind::Account => self.account.lookup(id),
            ContractKind::Token => self.token.lookup(id),
            ContractKind::Creator => self.creator.lookup(id),
        }
    }

    /// Self-description of every registered message, keyed by contract
    /// kind then message name.
    pub fn abi(&self) -> serde_json::Value {
        let mut root = serde_json::Map::new();
        for table in [&self.account, &self.token, &self.creator] {
            root.insert(table.kind.name().to_owned(), table.describe());
        }
        serde_json::Value::Object(root)
    }
}

// =====================================================================
// Account handlers
// =====================================================================

fn account_get_balance(
    ctx: &mut ExecutionContext,
    target: Address,
    msg: &mut Buffer,
    result: &mut Buffer,
) -> ChainResult<()> {
    let token = Address::decode(msg)?;
    let balance = ctx.balance_of(target, token)?;
    balance.encode(result);
    Ok(())
}

fn account_transfer(
    ctx: &mut ExecutionContext,
    target: Address,
    msg: &mut Buffer,
    _result: &mut Buffer,
) -> ChainResult<()> {
    let token = Address::decode(msg)?;
    let dest = Address::decode(msg)?;
    let amount = U256::decode(msg)?;

    let sender = ctx.provenance()?.sender;
    if sender != target {
        return Err(DomainError::Unauthorized(format!(
            "transfer from {target} signed by {sender}"
        ))
        .into());
    }

    // Destination must already exist as an account.
    ctx.get_account(dest)?;
    ctx.debit(target, token, amount)?;
    ctx.credit(dest, token, amount)?;
    Ok(())
}

// =====================================================================
// Token handlers
// =====================================================================

fn token_buy(
    ctx: &mut ExecutionContext,
    target: Address,
    msg: &mut Buffer,
    result: &mut Buffer,
) -> ChainResult<()> {
    let amount = U256::decode(msg)?;
    let sender = ctx.provenance()?.sender;

    let token = ctx.get_token(target)?;
    let base = token.base;
    let cost = token.buy_cost(amount)?;
    token.supply = token
        .supply
        .checked_add(amount)
        .ok_or(DomainError::Overflow)?;

    ctx.debit(sender, base, cost)?;
    ctx.credit(sender, target, amount)?;
    cost.encode(result);
    Ok(())
}

fn token_sell(
    ctx: &mut ExecutionContext,
    target: Address,
    msg: &mut Buffer,
    result: &mut Buffer,
) -> ChainResult<()> {
    let amount = U256::decode(msg)?;
    let sender = ctx.provenance()?.sender;

    let token = ctx.get_token(target)?;
    let base = token.base;
    let refund = token.sell_refund(amount)?;
    token.supply = token
        .supply
        .checked_sub(amount)
        .ok_or(DomainError::SupplyUnderflow)?;

    ctx.debit(sender, target, amount)?;
    ctx.credit(sender, base, refund)?;
    refund.encode(result);
    Ok(())
}

// =====================================================================
// Creator handler
// =====================================================================

fn creator_create(
    ctx: &mut ExecutionContext,
    _target: Address,
    msg: &mut Buffer,
    result: &mut Buffer,
) -> ChainResult<()> {
    let kind = u16::decode(msg)?;
    let address = match kind {
        1 => {
            let verify_key = VerifyKey::decode(msg)?;
            ctx.create_account(verify_key)?
        }
        2 => {
            let base = Address::decode(msg)?;
            let curve = Curve::decode(msg)?;
            ctx.create_token(base, curve)?
        }
        other => return Err(DomainError::UnknownContractKind(other).into()),
    };
    address.encode(result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_registered_handlers() {
        let dispatch = Dispatch::new().unwrap();
        assert!(dispatch.lookup(ContractKind::Account, 1).is_ok());
        assert!(dispatch.lookup(ContractKind::Account, 2).is_ok());
        assert!(dispatch.lookup(ContractKind::Token, 1).is_ok());
        assert!(dispatch.lookup(ContractKind::Creator, 1).is_ok());
    }

    #[test]
    fn lookup_rejects_unknown_ids() {
        let dispatch = Dispatch::new().unwrap();
        assert!(matches!(
            dispatch.lookup(ContractKind::Token, 9),
            Err(DomainError::UnknownMessage { kind: "Token", id: 9 })
        ));
    }

    #[test]
    fn abi_lists_every_message() {
        let dispatch = Dispatch::new().unwrap();
        let abi = dispatch.abi();
        assert_eq!(abi["Account"]["get_balance"]["ID"], 1);
        assert_eq!(abi["Account"]["transfer"]["ID"], 2);
        assert_eq!(abi["Token"]["buy"]["ID"], 1);
        assert_eq!(abi["Token"]["sell"]["ID"], 2);
        assert_eq!(abi["Creator"]["create"]["ID"], 1);
        assert_eq!(
            abi["Creator"]["create"]["Output"],
            "[address: address]"
        );
    }

    #[test]
    fn duplicate_ids_fail_table_construction() {
        fn noop(
            _: &mut ExecutionContext,
            _: Address,
            _: &mut Buffer,
            _: &mut Buffer,
        ) -> ChainResult<()> {
            Ok(())
        }
        let err = DispatchTable::new(
            ContractKind::Account,
            vec![
                MessageDef {
                    id: 1,
                    name: "a",
                    input: "[]",
                    output: "[]",
                    handler: noop,
                },
                MessageDef {
                    id: 1,
                    name: "b",
                    input: "[]",
                    output: "[]",
                    handler: noop,
                },
            ],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateMessageId { kind: "Account", id: 1 }
        ));
    }
}
