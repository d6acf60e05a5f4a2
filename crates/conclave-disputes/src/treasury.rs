//! # Treasury Collaborator
//!
//! The engine never moves tokens itself: every outbound payment — fee
//! shares, refunds, appeal deposit returns — is a credit in an external
//! per-(token, owner) ledger, withdrawn out of band. [`Treasury`] is the
//! narrow seam; [`MemoryTreasury`] is the in-memory reference used by
//! tests.

use std::collections::HashMap;

use conclave_core::{AccountId, ArithmeticError, TokenAmount, TokenId};

/// The outbound credit ledger the engine pays into.
pub trait Treasury {
    /// Credit `amount` of `token` to `owner`, pending withdrawal.
    fn assign(
        &mut self,
        token: TokenId,
        owner: AccountId,
        amount: TokenAmount,
    ) -> Result<(), ArithmeticError>;
}

/// An in-memory treasury ledger.
#[derive(Debug, Default)]
pub struct MemoryTreasury {
    balances: HashMap<TokenId, HashMap<AccountId, TokenAmount>>,
}

impl MemoryTreasury {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// An owner's pending balance in `token`.
    pub fn balance_of(&self, token: &TokenId, owner: &AccountId) -> TokenAmount {
        self.balances
            .get(token)
            .and_then(|owners| owners.get(owner))
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// The sum of all pending balances in `token`.
    pub fn total_of(&self, token: &TokenId) -> TokenAmount {
        let total = self
            .balances
            .get(token)
            .map(|owners| owners.values().map(|a| a.raw()).sum::<u128>())
            .unwrap_or(0);
        TokenAmount::new(total)
    }
}

impl Treasury for MemoryTreasury {
    fn assign(
        &mut self,
        token: TokenId,
        owner: AccountId,
        amount: TokenAmount,
    ) -> Result<(), ArithmeticError> {
        if amount.is_zero() {
            return Ok(());
        }
        let entry = self
            .balances
            .entry(token)
            .or_default()
            .entry(owner)
            .or_insert(TokenAmount::ZERO);
        *entry = entry.checked_add(amount)?;
        tracing::debug!(%token, %owner, %amount, "treasury credit");
        Ok(())
    }
}
