//! # Weighted-Random Guardian Draft
//!
//! Stake-weighted sortition over the active balances at a round's draft
//! term. A guardian may be selected several times in one round; each
//! selection is one *seat* and the caller accumulates seats into a weight.
//!
//! ## Batch Determinism
//!
//! Exactly one pseudo-random value is consumed per attempted seat, derived
//! from the term entropy, the dispute id, and a monotonically increasing
//! attempt counter owned by the caller. Slicing a draft into batches of any
//! size yields the same selection sequence as a single call, and already
//! drafted seats are never re-locked because the counter only moves
//! forward.
//!
//! An attempt whose sampled guardian falls below the minimum active
//! balance, or has no unlocked active headroom left, consumes its random
//! value without filling the seat; the caller retries with fresh counter
//! values on a later call.

use conclave_core::{
    draft_seed, AccountId, DisputeId, Entropy, Permyriad, TermId, TokenAmount,
};

use crate::error::RegistryError;
use crate::ledger::GuardianRegistry;

/// Parameters for one draft batch.
#[derive(Debug, Clone)]
pub struct DraftParams {
    /// The draft term's resolved entropy.
    pub entropy: Entropy,
    /// The dispute being drafted for.
    pub dispute_id: DisputeId,
    /// The term whose active balances weight the sampling.
    pub draft_term: TermId,
    /// The ensured current term (lock movements land at its successor).
    pub current_term: TermId,
    /// Seats to attempt in this batch.
    pub seats_requested: u64,
    /// Attempt counter base: total attempts consumed by earlier batches of
    /// this round.
    pub prior_attempts: u64,
    /// Guardians below this active balance at the draft term are skipped.
    pub min_active_balance: TokenAmount,
    /// Penalty share of the minimum active balance locked per seat.
    pub penalty_pct: Permyriad,
}

/// One filled seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftedSeat {
    /// The selected guardian.
    pub guardian: AccountId,
    /// The stake locked against this seat.
    pub locked: TokenAmount,
}

/// The result of one draft batch.
#[derive(Debug, Clone)]
pub struct DraftOutcome {
    /// Seats filled by this batch, in selection order.
    pub seats: Vec<DraftedSeat>,
    /// Random values consumed, filled or not. The caller adds this to its
    /// attempt counter.
    pub attempts: u64,
}

impl GuardianRegistry {
    /// Run one batch of the weighted-random draft.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NoActiveStakeAtTerm`] when the draft term has zero
    /// total active stake; lock arithmetic errors propagate.
    pub fn draft(&mut self, params: &DraftParams) -> Result<DraftOutcome, RegistryError> {
        let total = self.total_active_at(params.draft_term);
        if total.is_zero() {
            return Err(RegistryError::NoActiveStakeAtTerm(params.draft_term));
        }
        let lock_per_seat = params.penalty_pct.of(params.min_active_balance)?;

        let mut seats = Vec::new();
        let mut attempts = 0u64;
        while attempts < params.seats_requested {
            let seed = draft_seed(
                &params.entropy,
                params.dispute_id,
                params.prior_attempts + attempts,
            );
            attempts += 1;

            let target = TokenAmount::new(seed % total.raw());
            let Some(slot) = self.tree().sample_at(params.draft_term, target) else {
                continue;
            };
            let Some(&guardian) = self.guardian_at_slot(slot) else {
                continue;
            };

            let balance_at_draft = self.active_balance_at(&guardian, params.draft_term);
            if balance_at_draft < params.min_active_balance {
                continue;
            }
            // The lock needs headroom in the guardian's *latest* active
            // balance; deactivations since the draft term may have taken it.
            if self.active_balance(&guardian) < lock_per_seat {
                continue;
            }

            self.lock_active(&guardian, params.current_term, lock_per_seat)?;
            tracing::debug!(
                %guardian,
                dispute = %params.dispute_id,
                locked = %lock_per_seat,
                "guardian drafted"
            );
            seats.push(DraftedSeat {
                guardian,
                locked: lock_per_seat,
            });
        }

        Ok(DraftOutcome { seats, attempts })
    }
}
