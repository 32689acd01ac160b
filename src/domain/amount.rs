//! `Amount` and `Balance` newtypes over signed integer minor units.
//!
//! The teacher's equivalent (`domain/amount.rs`) wraps `rust_decimal::Decimal`
//! because that domain handles arbitrary-precision currency math. This domain
//! stores balances as plain minor-unit integers (spec §3), so these newtypes
//! wrap `i64` instead and carry a strict positivity/non-negativity guard
//! rather than decimal-scale validation.

use serde::{Deserialize, Serialize};

/// A strictly positive quantity of minor units, used for `Deposit`/`Withdraw`
/// payloads. Constructing a non-positive `Amount` is impossible, which is
/// what closes the negative-amount validation gap noted in `SPEC_FULL.md` §9:
/// the guard lives here instead of only at the HTTP boundary, so every
/// caller gets it for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub fn new(minor_units: i64) -> Result<Self, AmountError> {
        if minor_units <= 0 {
            return Err(AmountError::NotPositive(minor_units));
        }
        Ok(Self(minor_units))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Amount::new(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum AmountError {
    #[error("amount must be positive, got {0}")]
    NotPositive(i64),
}

/// A non-negative running total. Unlike `Amount`, zero is a valid balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(i64);

impl Balance {
    pub const ZERO: Balance = Balance(0);

    pub fn new(minor_units: i64) -> Result<Self, BalanceError> {
        if minor_units < 0 {
            return Err(BalanceError::Negative(minor_units));
        }
        Ok(Self(minor_units))
    }

    pub fn get(&self) -> i64 {
        self.0
    }

    pub fn is_sufficient_for(&self, amount: Amount) -> bool {
        self.0 >= amount.get()
    }

    pub fn credit(&self, amount: Amount) -> Self {
        Self(self.0 + amount.get())
    }

    pub fn debit(&self, amount: Amount) -> Result<Self, BalanceError> {
        let remaining = self.0 - amount.get();
        if remaining < 0 {
            return Err(BalanceError::InsufficientBalance {
                available: self.0,
                required: amount.get(),
            });
        }
        Ok(Self(remaining))
    }
}

#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum BalanceError {
    #[error("balance cannot be negative, got {0}")]
    Negative(i64),
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_rejects_zero_and_negative() {
        assert!(Amount::new(0).is_err());
        assert!(Amount::new(-1).is_err());
        assert!(Amount::new(1).is_ok());
    }

    #[test]
    fn balance_debit_exact_succeeds() {
        let balance = Balance::new(100).unwrap();
        let amount = Amount::new(100).unwrap();
        assert_eq!(balance.debit(amount).unwrap(), Balance::ZERO);
    }

    #[test]
    fn balance_debit_over_fails() {
        let balance = Balance::new(100).unwrap();
        let amount = Amount::new(101).unwrap();
        assert!(balance.debit(amount).is_err());
    }

    #[test]
    fn balance_credit_accumulates() {
        let balance = Balance::new(70).unwrap();
        let amount = Amount::new(30).unwrap();
        assert_eq!(balance.credit(amount), Balance::new(100).unwrap());
    }
}
