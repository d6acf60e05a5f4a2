//! # The Guardian Stake Ledger
//!
//! Per-guardian balance partitions and the operations that move value
//! between them. The active partition lives inside the sortition tree (one
//! leaf per guardian) so activation, deactivation, locking, unlocking and
//! slashing all write term-stamped checkpoints there.
//!
//! ## Effective Terms
//!
//! Activation and deactivation take effect the term *after* the current
//! one, as do lock and slash movements. A round drafted at term D therefore
//! sees a stable weight distribution: everything that happens while the
//! draft is in progress lands at later terms.
//!
//! ## Conservation Invariant
//!
//! For every guardian, at all times:
//! `staked == active + available + locked + pending_deactivation`.
//! Slashing removes value from the system (it leaves through the collected
//! pool), staking and reward assignment add it; `total_staked` tracks the
//! system-wide sum.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use conclave_core::{AccountId, TermId, TokenAmount};

use crate::error::RegistryError;
use crate::tree::SortitionTree;

/// A deactivation scheduled but possibly not yet effective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDeactivation {
    /// The amount leaving the active partition.
    pub amount: TokenAmount,
    /// The term from which the amount becomes claimable into available.
    pub effective_term: TermId,
}

/// One guardian's balance partitions. The active partition is not stored
/// here — it lives in the sortition tree leaf referenced by `slot`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StakeAccount {
    /// The guardian's sortition tree slot, assigned on first activation.
    pub slot: Option<usize>,
    /// Stake not activated and free to withdraw.
    pub available: TokenAmount,
    /// Stake locked against in-flight adjudication rounds.
    pub locked: TokenAmount,
    /// A scheduled deactivation, if any.
    pub pending_deactivation: Option<PendingDeactivation>,
}

impl StakeAccount {
    /// The pending-deactivation amount, zero if none.
    pub fn pending_amount(&self) -> TokenAmount {
        self.pending_deactivation
            .map(|p| p.amount)
            .unwrap_or(TokenAmount::ZERO)
    }
}

/// A single guardian's slashing/unlock instruction for
/// [`GuardianRegistry::slash_or_unlock`].
#[derive(Debug, Clone, Copy)]
pub struct LockSettlement {
    /// The guardian whose lock is being settled.
    pub guardian: AccountId,
    /// The locked amount being released or slashed.
    pub amount: TokenAmount,
    /// Whether the guardian was coherent: `true` unlocks back to active,
    /// `false` slashes into the collected pool.
    pub rewarded: bool,
}

/// The stake ledger and sortition registry.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GuardianRegistry {
    accounts: HashMap<AccountId, StakeAccount>,
    /// Slot index → guardian, the inverse of `StakeAccount::slot`.
    slots: Vec<AccountId>,
    tree: SortitionTree,
    total_staked: TokenAmount,
    /// Cumulative tokens removed by slashing, for audit.
    slashed_total: TokenAmount,
    /// Tokens sent to the burn sink.
    burned: TokenAmount,
}

impl GuardianRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Balance queries ────────────────────────────────────────────────

    /// A guardian's account partitions, if the guardian has ever staked.
    pub fn account(&self, guardian: &AccountId) -> Option<&StakeAccount> {
        self.accounts.get(guardian)
    }

    /// A guardian's latest active balance (including movements already
    /// scheduled for the next term).
    pub fn active_balance(&self, guardian: &AccountId) -> TokenAmount {
        self.slot_of(guardian)
            .map(|slot| self.tree.leaf_latest(slot))
            .unwrap_or(TokenAmount::ZERO)
    }

    /// A guardian's active balance effective at `term` (checkpoint query).
    pub fn active_balance_at(&self, guardian: &AccountId, term: TermId) -> TokenAmount {
        self.slot_of(guardian)
            .map(|slot| self.tree.leaf_value_at(slot, term))
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Total active stake effective at `term`.
    pub fn total_active_at(&self, term: TermId) -> TokenAmount {
        self.tree.total_at(term)
    }

    /// A guardian's total stake across all partitions.
    pub fn staked_balance(&self, guardian: &AccountId) -> TokenAmount {
        let Some(account) = self.accounts.get(guardian) else {
            return TokenAmount::ZERO;
        };
        // Partitions are individually overflow-checked on every mutation;
        // their sum fits by construction.
        TokenAmount::new(
            account.available.raw()
                + account.locked.raw()
                + account.pending_amount().raw()
                + self.active_balance(guardian).raw(),
        )
    }

    /// System-wide staked total.
    pub fn total_staked(&self) -> TokenAmount {
        self.total_staked
    }

    /// Cumulative slashed tokens.
    pub fn slashed_total(&self) -> TokenAmount {
        self.slashed_total
    }

    /// Tokens sent to the burn sink.
    pub fn burned(&self) -> TokenAmount {
        self.burned
    }

    /// The guardian occupying a sortition slot.
    pub fn guardian_at_slot(&self, slot: usize) -> Option<&AccountId> {
        self.slots.get(slot)
    }

    pub(crate) fn tree(&self) -> &SortitionTree {
        &self.tree
    }

    // ── Stake movements ────────────────────────────────────────────────

    /// Deposit stake into the available partition.
    pub fn stake(&mut self, guardian: AccountId, amount: TokenAmount) -> Result<(), RegistryError> {
        if amount.is_zero() {
            return Err(RegistryError::ZeroAmount);
        }
        let account = self.accounts.entry(guardian).or_default();
        account.available = account.available.checked_add(amount)?;
        self.total_staked = self.total_staked.checked_add(amount)?;
        tracing::debug!(%guardian, %amount, "stake deposited");
        Ok(())
    }

    /// Withdraw stake from the available partition, first claiming any
    /// matured deactivation.
    pub fn unstake(
        &mut self,
        guardian: AccountId,
        current_term: TermId,
        amount: TokenAmount,
    ) -> Result<(), RegistryError> {
        if amount.is_zero() {
            return Err(RegistryError::ZeroAmount);
        }
        self.process_deactivation(&guardian, current_term)?;
        let account = self
            .accounts
            .get_mut(&guardian)
            .ok_or(RegistryError::UnknownGuardian(guardian))?;
        if account.available < amount {
            return Err(RegistryError::InsufficientAvailableBalance {
                requested: amount,
                available: account.available,
            });
        }
        account.available = account.available.checked_sub(amount)?;
        self.total_staked = self.total_staked.checked_sub(amount)?;
        tracing::debug!(%guardian, %amount, "stake withdrawn");
        Ok(())
    }

    /// Move available stake into the active partition, effective the next
    /// term. The resulting active balance must reach `min_active_balance`.
    pub fn activate(
        &mut self,
        guardian: AccountId,
        current_term: TermId,
        amount: TokenAmount,
        min_active_balance: TokenAmount,
    ) -> Result<(), RegistryError> {
        if amount.is_zero() {
            return Err(RegistryError::ZeroAmount);
        }
        self.process_deactivation(&guardian, current_term)?;
        let account = self
            .accounts
            .get_mut(&guardian)
            .ok_or(RegistryError::UnknownGuardian(guardian))?;
        if account.available < amount {
            return Err(RegistryError::InsufficientAvailableBalance {
                requested: amount,
                available: account.available,
            });
        }
        let effective_term = current_term.next();
        let resulting = match account.slot {
            Some(slot) => self.tree.leaf_latest(slot).checked_add(amount)?,
            None => amount,
        };
        if resulting < min_active_balance {
            return Err(RegistryError::BelowMinActiveBalance {
                resulting,
                minimum: min_active_balance,
            });
        }
        account.available = account.available.checked_sub(amount)?;
        match account.slot {
            Some(slot) => self.tree.increase(slot, effective_term, amount)?,
            None => {
                let slot = self.tree.insert(effective_term, amount)?;
                account.slot = Some(slot);
                self.slots.push(guardian);
            }
        }
        tracing::debug!(%guardian, %amount, %effective_term, "stake activated");
        Ok(())
    }

    /// Schedule a deactivation of exactly `amount`, effective the next
    /// term, replacing any not-yet-effective request. A zero amount cancels
    /// the pending request. The remaining active balance must be zero or at
    /// least `min_active_balance`.
    pub fn deactivate(
        &mut self,
        guardian: AccountId,
        current_term: TermId,
        amount: TokenAmount,
        min_active_balance: TokenAmount,
    ) -> Result<(), RegistryError> {
        self.process_deactivation(&guardian, current_term)?;
        let account = self
            .accounts
            .get(&guardian)
            .ok_or(RegistryError::UnknownGuardian(guardian))?;
        let slot = account.slot.ok_or(RegistryError::InsufficientActiveBalance {
            requested: amount,
            active: TokenAmount::ZERO,
        })?;
        let effective_term = current_term.next();

        // Validate against the balance the guardian would have once any
        // still-pending request is rolled back; nothing mutates until the
        // whole request is known to be valid.
        let pending_amount = account.pending_amount();
        let active = self.tree.leaf_latest(slot).checked_add(pending_amount)?;
        if !amount.is_zero() {
            if active < amount {
                return Err(RegistryError::InsufficientActiveBalance {
                    requested: amount,
                    active,
                });
            }
            let remaining = active.checked_sub(amount)?;
            if !remaining.is_zero() && remaining < min_active_balance {
                return Err(RegistryError::BelowMinActiveBalance {
                    resulting: remaining,
                    minimum: min_active_balance,
                });
            }
        }

        if !pending_amount.is_zero() {
            self.tree.increase(slot, effective_term, pending_amount)?;
        }
        let account = self
            .accounts
            .get_mut(&guardian)
            .ok_or(RegistryError::UnknownGuardian(guardian))?;
        account.pending_deactivation = None;
        if amount.is_zero() {
            tracing::debug!(%guardian, "deactivation request cancelled");
            return Ok(());
        }
        self.tree.decrease(slot, effective_term, amount)?;
        let account = self
            .accounts
            .get_mut(&guardian)
            .ok_or(RegistryError::UnknownGuardian(guardian))?;
        account.pending_deactivation = Some(PendingDeactivation {
            amount,
            effective_term,
        });
        tracing::debug!(%guardian, %amount, %effective_term, "deactivation requested");
        Ok(())
    }

    /// Claim a matured deactivation request into the available partition.
    /// A request still pending is left untouched.
    pub fn process_deactivation(
        &mut self,
        guardian: &AccountId,
        current_term: TermId,
    ) -> Result<(), RegistryError> {
        let Some(account) = self.accounts.get_mut(guardian) else {
            return Ok(());
        };
        let Some(pending) = account.pending_deactivation else {
            return Ok(());
        };
        if pending.effective_term > current_term {
            return Ok(());
        }
        account.pending_deactivation = None;
        account.available = account.available.checked_add(pending.amount)?;
        tracing::debug!(guardian = %guardian, amount = %pending.amount, "deactivation processed");
        Ok(())
    }

    // ── Locks, slashing, rewards ───────────────────────────────────────

    /// Move active stake into the locked partition, effective next term.
    /// Used by the draft; the caller has verified headroom.
    pub(crate) fn lock_active(
        &mut self,
        guardian: &AccountId,
        current_term: TermId,
        amount: TokenAmount,
    ) -> Result<(), RegistryError> {
        let account = self
            .accounts
            .get_mut(guardian)
            .ok_or(RegistryError::UnknownGuardian(*guardian))?;
        let slot = account.slot.ok_or(RegistryError::InsufficientActiveBalance {
            requested: amount,
            active: TokenAmount::ZERO,
        })?;
        self.tree.decrease(slot, current_term.next(), amount)?;
        let account = self
            .accounts
            .get_mut(guardian)
            .ok_or(RegistryError::UnknownGuardian(*guardian))?;
        account.locked = account.locked.checked_add(amount)?;
        Ok(())
    }

    /// Lock a final-round participant proportionally to their own active
    /// balance at the draft term (the final round's key economic
    /// divergence from drafted rounds). Returns the locked amount.
    pub fn lock_final_round(
        &mut self,
        guardian: AccountId,
        current_term: TermId,
        draft_term: TermId,
        penalty_pct: conclave_core::Permyriad,
    ) -> Result<TokenAmount, RegistryError> {
        let balance_at_draft = self.active_balance_at(&guardian, draft_term);
        let amount = penalty_pct.of(balance_at_draft)?;
        if amount.is_zero() {
            return Ok(TokenAmount::ZERO);
        }
        let active = self.active_balance(&guardian);
        if active < amount {
            return Err(RegistryError::InsufficientActiveBalance {
                requested: amount,
                active,
            });
        }
        self.lock_active(&guardian, current_term, amount)?;
        tracing::debug!(%guardian, %amount, "final-round stake locked");
        Ok(amount)
    }

    /// Settle a batch of locks: unlock coherent guardians back to active,
    /// slash incoherent ones into the collected pool. Returns the total
    /// collected by this call.
    ///
    /// The whole batch is validated before any mutation, so an error leaves
    /// no partial settlement behind.
    pub fn slash_or_unlock(
        &mut self,
        current_term: TermId,
        settlements: &[LockSettlement],
    ) -> Result<TokenAmount, RegistryError> {
        for settlement in settlements {
            let account = self
                .accounts
                .get(&settlement.guardian)
                .ok_or(RegistryError::UnknownGuardian(settlement.guardian))?;
            if account.locked < settlement.amount {
                return Err(RegistryError::InsufficientLockedBalance {
                    requested: settlement.amount,
                    locked: account.locked,
                });
            }
        }

        let mut collected = TokenAmount::ZERO;
        for settlement in settlements {
            let account = self
                .accounts
                .get_mut(&settlement.guardian)
                .ok_or(RegistryError::UnknownGuardian(settlement.guardian))?;
            account.locked = account.locked.checked_sub(settlement.amount)?;
            if settlement.rewarded {
                let slot = account.slot.ok_or(RegistryError::UnknownGuardian(settlement.guardian))?;
                self.tree
                    .increase(slot, current_term.next(), settlement.amount)?;
            } else {
                collected = collected.checked_add(settlement.amount)?;
                self.slashed_total = self.slashed_total.checked_add(settlement.amount)?;
                self.total_staked = self.total_staked.checked_sub(settlement.amount)?;
                tracing::debug!(
                    guardian = %settlement.guardian,
                    amount = %settlement.amount,
                    "stake slashed"
                );
            }
        }
        Ok(collected)
    }

    /// Credit stake-denominated reward tokens to a guardian's available
    /// partition.
    pub fn assign_tokens(
        &mut self,
        guardian: AccountId,
        amount: TokenAmount,
    ) -> Result<(), RegistryError> {
        if amount.is_zero() {
            return Ok(());
        }
        let account = self.accounts.entry(guardian).or_default();
        account.available = account.available.checked_add(amount)?;
        self.total_staked = self.total_staked.checked_add(amount)?;
        tracing::debug!(%guardian, %amount, "reward tokens assigned");
        Ok(())
    }

    /// Send tokens to the burn sink.
    pub fn burn_tokens(&mut self, amount: TokenAmount) -> Result<(), RegistryError> {
        self.burned = self.burned.checked_add(amount)?;
        tracing::debug!(%amount, "tokens burned");
        Ok(())
    }

    fn slot_of(&self, guardian: &AccountId) -> Option<usize> {
        self.accounts.get(guardian).and_then(|a| a.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(id: u64) -> TermId {
        TermId::new(id)
    }

    fn amt(raw: u128) -> TokenAmount {
        TokenAmount::new(raw)
    }

    const MIN: TokenAmount = TokenAmount::new(100);

    fn staked_guardian(registry: &mut GuardianRegistry, stake: u128) -> AccountId {
        let guardian = AccountId::new();
        registry.stake(guardian, amt(stake)).unwrap();
        guardian
    }

    fn conservation_holds(registry: &GuardianRegistry, guardians: &[AccountId]) -> bool {
        let sum: u128 = guardians
            .iter()
            .map(|g| registry.staked_balance(g).raw())
            .sum();
        sum == registry.total_staked().raw()
    }

    #[test]
    fn stake_lands_in_available() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 500);
        assert_eq!(registry.account(&g).unwrap().available, amt(500));
        assert_eq!(registry.staked_balance(&g), amt(500));
        assert_eq!(registry.total_staked(), amt(500));
    }

    #[test]
    fn zero_stake_rejected() {
        let mut registry = GuardianRegistry::new();
        assert!(matches!(
            registry.stake(AccountId::new(), TokenAmount::ZERO),
            Err(RegistryError::ZeroAmount)
        ));
    }

    #[test]
    fn activation_is_effective_next_term() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 500);
        registry.activate(g, t(4), amt(300), MIN).unwrap();

        assert_eq!(registry.active_balance_at(&g, t(4)), TokenAmount::ZERO);
        assert_eq!(registry.active_balance_at(&g, t(5)), amt(300));
        assert_eq!(registry.account(&g).unwrap().available, amt(200));
        assert!(conservation_holds(&registry, &[g]));
    }

    #[test]
    fn activation_below_minimum_rejected() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 500);
        let err = registry.activate(g, t(4), amt(99), MIN).unwrap_err();
        assert!(matches!(err, RegistryError::BelowMinActiveBalance { .. }));
    }

    #[test]
    fn activation_exceeding_available_rejected() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 100);
        let err = registry.activate(g, t(4), amt(200), MIN).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InsufficientAvailableBalance { .. }
        ));
    }

    #[test]
    fn deactivation_schedules_and_matures() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 500);
        registry.activate(g, t(4), amt(300), MIN).unwrap();
        registry.deactivate(g, t(6), amt(300), MIN).unwrap();

        // Scheduled: active drops at term 7, amount parked in pending.
        assert_eq!(registry.active_balance_at(&g, t(6)), amt(300));
        assert_eq!(registry.active_balance_at(&g, t(7)), TokenAmount::ZERO);
        assert_eq!(registry.account(&g).unwrap().pending_amount(), amt(300));
        assert!(conservation_holds(&registry, &[g]));

        // Matured at term 7: any balance-touching call claims it.
        registry.process_deactivation(&g, t(7)).unwrap();
        assert_eq!(registry.account(&g).unwrap().pending_amount(), TokenAmount::ZERO);
        assert_eq!(registry.account(&g).unwrap().available, amt(500));
        assert!(conservation_holds(&registry, &[g]));
    }

    #[test]
    fn pending_deactivation_can_be_amended() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 500);
        registry.activate(g, t(4), amt(400), MIN).unwrap();
        registry.deactivate(g, t(5), amt(400), MIN).unwrap();
        // Amend down to 250 while still pending.
        registry.deactivate(g, t(5), amt(250), MIN).unwrap();

        assert_eq!(registry.account(&g).unwrap().pending_amount(), amt(250));
        assert_eq!(registry.active_balance_at(&g, t(6)), amt(150));
        assert!(conservation_holds(&registry, &[g]));
    }

    #[test]
    fn zero_deactivation_cancels_pending() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 500);
        registry.activate(g, t(4), amt(400), MIN).unwrap();
        registry.deactivate(g, t(5), amt(200), MIN).unwrap();
        registry.deactivate(g, t(5), TokenAmount::ZERO, MIN).unwrap();

        assert!(registry.account(&g).unwrap().pending_deactivation.is_none());
        assert_eq!(registry.active_balance_at(&g, t(6)), amt(400));
    }

    #[test]
    fn deactivation_leaving_dust_rejected() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 500);
        registry.activate(g, t(4), amt(300), MIN).unwrap();
        // Would leave 50 active, below the minimum of 100 but not zero.
        let err = registry.deactivate(g, t(5), amt(250), MIN).unwrap_err();
        assert!(matches!(err, RegistryError::BelowMinActiveBalance { .. }));
    }

    #[test]
    fn unstake_claims_matured_deactivation_first() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 500);
        registry.activate(g, t(4), amt(500), MIN).unwrap();
        registry.deactivate(g, t(6), amt(500), MIN).unwrap();
        registry.unstake(g, t(7), amt(500)).unwrap();
        assert_eq!(registry.staked_balance(&g), TokenAmount::ZERO);
        assert_eq!(registry.total_staked(), TokenAmount::ZERO);
    }

    #[test]
    fn unstake_beyond_available_rejected() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 500);
        registry.activate(g, t(4), amt(400), MIN).unwrap();
        let err = registry.unstake(g, t(5), amt(200)).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InsufficientAvailableBalance { .. }
        ));
    }

    #[test]
    fn lock_moves_active_to_locked_next_term() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 500);
        registry.activate(g, t(4), amt(500), MIN).unwrap();
        registry.lock_active(&g, t(6), amt(50)).unwrap();

        assert_eq!(registry.account(&g).unwrap().locked, amt(50));
        assert_eq!(registry.active_balance_at(&g, t(6)), amt(500));
        assert_eq!(registry.active_balance_at(&g, t(7)), amt(450));
        assert!(conservation_holds(&registry, &[g]));
    }

    #[test]
    fn slash_or_unlock_settles_both_ways() {
        let mut registry = GuardianRegistry::new();
        let coherent = staked_guardian(&mut registry, 500);
        let incoherent = staked_guardian(&mut registry, 500);
        registry.activate(coherent, t(4), amt(500), MIN).unwrap();
        registry.activate(incoherent, t(4), amt(500), MIN).unwrap();
        registry.lock_active(&coherent, t(6), amt(40)).unwrap();
        registry.lock_active(&incoherent, t(6), amt(40)).unwrap();

        let collected = registry
            .slash_or_unlock(
                t(8),
                &[
                    LockSettlement {
                        guardian: coherent,
                        amount: amt(40),
                        rewarded: true,
                    },
                    LockSettlement {
                        guardian: incoherent,
                        amount: amt(40),
                        rewarded: false,
                    },
                ],
            )
            .unwrap();

        assert_eq!(collected, amt(40));
        assert_eq!(registry.slashed_total(), amt(40));
        assert_eq!(registry.active_balance_at(&coherent, t(9)), amt(500));
        assert_eq!(registry.active_balance_at(&incoherent, t(9)), amt(460));
        assert_eq!(registry.staked_balance(&incoherent), amt(460));
        assert!(conservation_holds(&registry, &[coherent, incoherent]));
    }

    #[test]
    fn slash_or_unlock_validates_whole_batch_first() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 500);
        registry.activate(g, t(4), amt(500), MIN).unwrap();
        registry.lock_active(&g, t(6), amt(40)).unwrap();

        let err = registry
            .slash_or_unlock(
                t(8),
                &[
                    LockSettlement {
                        guardian: g,
                        amount: amt(40),
                        rewarded: true,
                    },
                    // Second entry over-claims; the whole batch must fail
                    // without touching the first.
                    LockSettlement {
                        guardian: g,
                        amount: amt(999),
                        rewarded: false,
                    },
                ],
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::InsufficientLockedBalance { .. }));
        assert_eq!(registry.account(&g).unwrap().locked, amt(40));
    }

    #[test]
    fn lock_final_round_is_balance_proportional() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 1_000);
        registry.activate(g, t(4), amt(1_000), MIN).unwrap();

        let pct = conclave_core::Permyriad::new(1_000).unwrap(); // 10%
        let locked = registry.lock_final_round(g, t(6), t(5), pct).unwrap();
        assert_eq!(locked, amt(100));
        assert_eq!(registry.account(&g).unwrap().locked, amt(100));
        assert!(conservation_holds(&registry, &[g]));
    }

    #[test]
    fn lock_final_round_zero_balance_locks_nothing() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 1_000);
        let pct = conclave_core::Permyriad::new(1_000).unwrap();
        let locked = registry.lock_final_round(g, t(6), t(5), pct).unwrap();
        assert_eq!(locked, TokenAmount::ZERO);
    }

    #[test]
    fn assign_and_burn() {
        let mut registry = GuardianRegistry::new();
        let g = staked_guardian(&mut registry, 100);
        registry.assign_tokens(g, amt(30)).unwrap();
        assert_eq!(registry.account(&g).unwrap().available, amt(130));
        assert_eq!(registry.total_staked(), amt(130));

        registry.burn_tokens(amt(12)).unwrap();
        assert_eq!(registry.burned(), amt(12));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Stake(usize, u128),
            Activate(usize, u128),
            Deactivate(usize, u128),
            Unstake(usize, u128),
            Lock(usize, u128),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0usize..4, 1u128..5_000).prop_map(|(g, a)| Op::Stake(g, a)),
                (0usize..4, 1u128..5_000).prop_map(|(g, a)| Op::Activate(g, a)),
                (0usize..4, 0u128..5_000).prop_map(|(g, a)| Op::Deactivate(g, a)),
                (0usize..4, 1u128..5_000).prop_map(|(g, a)| Op::Unstake(g, a)),
                (0usize..4, 1u128..500).prop_map(|(g, a)| Op::Lock(g, a)),
            ]
        }

        proptest! {
            /// `staked == active + available + locked + pending` for every
            /// guardian after any operation sequence, counting failed
            /// operations as no-ops.
            #[test]
            fn conservation_under_arbitrary_ops(ops in proptest::collection::vec(op_strategy(), 1..80)) {
                let mut registry = GuardianRegistry::new();
                let guardians: Vec<AccountId> = (0..4).map(|_| AccountId::new()).collect();

                for (step, op) in ops.iter().enumerate() {
                    let term = t(step as u64 + 1);
                    match *op {
                        Op::Stake(g, a) => {
                            let _ = registry.stake(guardians[g], amt(a));
                        }
                        Op::Activate(g, a) => {
                            let _ = registry.activate(guardians[g], term, amt(a), MIN);
                        }
                        Op::Deactivate(g, a) => {
                            let _ = registry.deactivate(guardians[g], term, amt(a), MIN);
                        }
                        Op::Unstake(g, a) => {
                            let _ = registry.unstake(guardians[g], term, amt(a));
                        }
                        Op::Lock(g, a) => {
                            let guardian = guardians[g];
                            if registry.active_balance(&guardian) >= amt(a) {
                                let _ = registry.lock_active(&guardian, term, amt(a));
                            }
                        }
                    }

                    let sum: u128 = guardians
                        .iter()
                        .map(|g| registry.staked_balance(g).raw())
                        .sum();
                    prop_assert_eq!(sum, registry.total_staked().raw());

                    // The tree's latest total equals the sum of latest
                    // active balances.
                    let active_sum: u128 = guardians
                        .iter()
                        .map(|g| registry.active_balance(g).raw())
                        .sum();
                    prop_assert_eq!(active_sum, registry.tree().total_latest().raw());
                }
            }
        }
    }
}
