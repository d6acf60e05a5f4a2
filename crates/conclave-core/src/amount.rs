//! # Monetary Amounts and Percentages
//!
//! [`TokenAmount`] is the single representation for every balance, fee,
//! deposit, lock and reward in the engine: a `u128` in the token's smallest
//! unit, exposing only overflow-checked operations.
//!
//! ## Security Invariant
//!
//! There is no unchecked arithmetic path on amounts. Every operation that
//! can wrap returns [`ArithmeticError`] instead; callers propagate with `?`.
//! Invalid inputs are rejected rather than silently coerced — a wrapped
//! balance would corrupt settlement conservation.

use serde::{Deserialize, Serialize};

use crate::error::{ArithmeticError, ValidationError};

/// The base for per-myriad percentages: 10 000 = 100%.
pub const PERMYRIAD_BASE: u32 = 10_000;

/// A token amount in the token's smallest unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct TokenAmount(u128);

impl TokenAmount {
    /// The zero amount.
    pub const ZERO: TokenAmount = TokenAmount(0);

    /// Wrap a raw amount.
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// The raw amount in smallest units.
    pub const fn raw(&self) -> u128 {
        self.0
    }

    /// Whether the amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    pub fn checked_add(self, other: TokenAmount) -> Result<TokenAmount, ArithmeticError> {
        self.0
            .checked_add(other.0)
            .map(TokenAmount)
            .ok_or(ArithmeticError::Overflow)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, other: TokenAmount) -> Result<TokenAmount, ArithmeticError> {
        self.0
            .checked_sub(other.0)
            .map(TokenAmount)
            .ok_or(ArithmeticError::Underflow)
    }

    /// Checked multiplication by a scalar weight.
    pub fn checked_mul(self, factor: u64) -> Result<TokenAmount, ArithmeticError> {
        self.0
            .checked_mul(u128::from(factor))
            .map(TokenAmount)
            .ok_or(ArithmeticError::Overflow)
    }

    /// Checked integer division by a scalar. The remainder is the caller's
    /// concern (settlement keeps it in the source pool).
    pub fn checked_div(self, divisor: u64) -> Result<TokenAmount, ArithmeticError> {
        if divisor == 0 {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(TokenAmount(self.0 / u128::from(divisor)))
    }
}

impl std::fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bounded share expressed in per-myriad (1/10 000) units.
///
/// Used for penalty percentages and fee discounts. Construction rejects
/// values above [`PERMYRIAD_BASE`]; a share can never exceed the whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permyriad(u32);

impl Permyriad {
    /// The zero share.
    pub const ZERO: Permyriad = Permyriad(0);

    /// Create a share, rejecting values above the base.
    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if value > PERMYRIAD_BASE {
            return Err(ValidationError::PermyriadOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// The raw per-myriad value.
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// The complementary share (base minus this share).
    pub fn complement(&self) -> Permyriad {
        Permyriad(PERMYRIAD_BASE - self.0)
    }

    /// Apply the share to an amount, rounding down.
    pub fn of(&self, amount: TokenAmount) -> Result<TokenAmount, ArithmeticError> {
        let scaled = amount
            .raw()
            .checked_mul(u128::from(self.0))
            .ok_or(ArithmeticError::Overflow)?;
        Ok(TokenAmount::new(scaled / u128::from(PERMYRIAD_BASE)))
    }
}

impl std::fmt::Display for Permyriad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}‱", self.0)
    }
}

/// An unbounded multiple expressed in per-myriad units.
///
/// Appeal collateral is a *multiple* of the next round's fees (e.g. 2× is
/// 20 000), so unlike [`Permyriad`] it may exceed the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollateralFactor(u32);

impl CollateralFactor {
    /// Create a collateral factor from a raw per-myriad multiple.
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// The raw per-myriad multiple.
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Apply the multiple to an amount, rounding down.
    pub fn of(&self, amount: TokenAmount) -> Result<TokenAmount, ArithmeticError> {
        let scaled = amount
            .raw()
            .checked_mul(u128::from(self.0))
            .ok_or(ArithmeticError::Overflow)?;
        Ok(TokenAmount::new(scaled / u128::from(PERMYRIAD_BASE)))
    }
}

impl std::fmt::Display for CollateralFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}‱", self.0)
    }
}
