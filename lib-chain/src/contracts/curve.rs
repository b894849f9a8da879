//! Bonding curve pricing.
//!
//! A curve maps aggregate supply to the unit price of the next token
//! issued. Buying `amount` tokens at supply `s` costs the sum of the unit
//! prices over `[s, s + amount)`; selling refunds the same sum over the
//! range being burned, so mint and burn are exact inverses at any supply.

use lib_codec::{Buffer, CodecError, CodecResult, Decode, Encode, U256};

use crate::error::DomainError;

const KIND_CONSTANT: u8 = 0;
const KIND_LINEAR: u8 = 1;

/// Deterministic pricing curve for token issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// price(s) = price
    Constant { price: u64 },
    /// price(s) = base_price + slope * s
    Linear { base_price: u64, slope: u64 },
}

impl Curve {
    /// Unit price at the given supply.
    pub fn price(&self, supply: U256) -> Result<U256, DomainError> {
        match *self {
            Curve::Constant { price } => Ok(U256::from(price)),
            Curve::Linear { base_price, slope } => supply
                .checked_mul(U256::from(slope))
                .and_then(|scaled| scaled.checked_add(U256::from(base_price)))
                .ok_or(DomainError::Overflow),
        }
    }

    /// Total cost of the `amount` units priced over `[supply, supply + amount)`,
    /// in the token's base currency. Closed form, no iteration.
    pub fn range_cost(&self, supply: U256, amount: U256) -> Result<U256, DomainError> {
        match *self {
            Curve::Constant { price } => U256::from(price)
                .checked_mul(amount)
                .ok_or(DomainError::Overflow),
            Curve::Linear { base_price, slope } => {
                // sum = amount*base + slope*(amount*supply + amount*(amount-1)/2)
                let base_part = U256::from(base_price)
                    .checked_mul(amount)
                    .ok_or(DomainError::Overflow)?;
                if amount.is_zero() {
                    return Ok(base_part);
                }
                let triangle = amount
                    .checked_mul(amount - U256::from(1u64))
                    .ok_or(DomainError::Overflow)?
                    // product of consecutive integers, always even
                    / U256::from(2u64);
                let offset = amount
                    .checked_mul(supply)
                    .and_then(|v| v.checked_add(triangle))
                    .ok_or(DomainError::Overflow)?;
                U256::from(slope)
                    .checked_mul(offset)
                    .and_then(|v| v.checked_add(base_part))
                    .ok_or(DomainError::Overflow)
            }
        }
    }
}

impl Encode for Curve {
    fn encode(&self, buf: &mut Buffer) {
        match *self {
            Curve::Constant { price } => {
                KIND_CONSTANT.encode(buf);
                price.encode(buf);
            }
            Curve::Linear { base_price, slope } => {
                KIND_LINEAR.encode(buf);
                base_price.encode(buf);
                slope.encode(buf);
            }
        }
    }
}

impl Decode for Curve {
    fn decode(buf: &mut Buffer) -> CodecResult<Self> {
        match u8::decode(buf)? {
            KIND_CONSTANT => Ok(Curve::Constant {
                price: u64::decode(buf)?,
            }),
            KIND_LINEAR => Ok(Curve::Linear {
                base_price: u64::decode(buf)?,
                slope: u64::decode(buf)?,
            }),
            other => Err(CodecError::UnknownDiscriminant {
                type_name: "Curve",
                value: u64::from(other),
            }),
        }
    }
}
