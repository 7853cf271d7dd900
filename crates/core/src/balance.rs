//! Balance types for channel funds and ticket amounts
//!
//! Amounts are unsigned 256-bit integers carried on the wire as fixed
//! 32-byte big-endian buffers. Two kinds are distinguished: the native
//! chain currency (gas) and the protocol's own token (ticket value).
//! Symbol and decimals exist for display only and take no part in wire
//! equality.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::MixCraftError;

/// Wire width of a balance value
pub const BALANCE_LENGTH: usize = 32;

/// Which currency a balance is denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceKind {
    /// Native chain currency, used for gas
    Native,
    /// Protocol token, used for ticket value
    Token,
}

impl BalanceKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            BalanceKind::Native => "xDAI",
            BalanceKind::Token => "MIX",
        }
    }

    pub fn decimals(&self) -> u8 {
        18
    }
}

/// An unsigned 256-bit amount of a single currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    amount: U256,
    kind: BalanceKind,
}

impl Balance {
    pub fn new(amount: U256, kind: BalanceKind) -> Self {
        Self { amount, kind }
    }

    pub fn zero(kind: BalanceKind) -> Self {
        Self {
            amount: U256::ZERO,
            kind,
        }
    }

    /// Convenience constructor for small token amounts.
    pub fn tokens(amount: u64) -> Self {
        Self {
            amount: U256::from(amount),
            kind: BalanceKind::Token,
        }
    }

    pub fn amount(&self) -> U256 {
        self.amount
    }

    pub fn kind(&self) -> BalanceKind {
        self.kind
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Fixed 32-byte big-endian wire encoding.
    pub fn to_be_bytes(&self) -> [u8; BALANCE_LENGTH] {
        self.amount.to_be_bytes::<BALANCE_LENGTH>()
    }

    /// Decode from the 32-byte big-endian wire form.
    pub fn from_be_bytes(bytes: [u8; BALANCE_LENGTH], kind: BalanceKind) -> Self {
        Self {
            amount: U256::from_be_bytes::<BALANCE_LENGTH>(bytes),
            kind,
        }
    }

    /// Checked addition; fails on overflow or on mixing currencies.
    pub fn checked_add(&self, other: &Balance) -> Result<Balance, MixCraftError> {
        if self.kind != other.kind {
            return Err(MixCraftError::BalanceKindMismatch);
        }
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(MixCraftError::BalanceOverflow)?;
        Ok(Balance::new(amount, self.kind))
    }

    /// Checked subtraction; fails on underflow or on mixing currencies.
    pub fn checked_sub(&self, other: &Balance) -> Result<Balance, MixCraftError> {
        if self.kind != other.kind {
            return Err(MixCraftError::BalanceKindMismatch);
        }
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(MixCraftError::BalanceOverflow)?;
        Ok(Balance::new(amount, self.kind))
    }

    /// Amount comparison across the same kind.
    pub fn gt(&self, other: &Balance) -> bool {
        self.amount > other.amount
    }

    pub fn ge(&self, other: &Balance) -> bool {
        self.amount >= other.amount
    }
}

impl std::fmt::Display for Balance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.kind.symbol())
    }
}
