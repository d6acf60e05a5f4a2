//! # Observability Events
//!
//! Every observable state change appends a typed [`CourtEvent`] to the
//! court's event log and mirrors it to `tracing`. Events carry the ids and
//! amounts an external indexer needs to reconstruct settlement without
//! re-deriving the weighted draft randomness.

use serde::{Deserialize, Serialize};

use conclave_core::{AccountId, DisputeId, RoundId, SubjectId, TermId, TokenAmount};
use conclave_voting::Outcome;

use crate::dispute::DisputeState;

/// A typed engine event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourtEvent {
    /// The clock advanced.
    Heartbeat {
        /// The term before the heartbeat.
        previous_term: TermId,
        /// The term reached.
        current_term: TermId,
    },
    /// A configuration was scheduled.
    ConfigScheduled {
        /// The term it takes effect.
        effective_term: TermId,
    },
    /// A dispute was created.
    DisputeCreated {
        /// The dispute.
        dispute: DisputeId,
        /// Its arbitrable subject.
        subject: SubjectId,
        /// Number of possible rulings.
        possible_rulings: u8,
        /// Round 0's scheduled draft term.
        draft_term: TermId,
    },
    /// Evidence was submitted.
    EvidenceSubmitted {
        /// The dispute.
        dispute: DisputeId,
        /// The submitter.
        submitter: AccountId,
    },
    /// The evidence period was closed early.
    EvidencePeriodClosed {
        /// The dispute.
        dispute: DisputeId,
        /// The rescheduled draft term.
        new_draft_term: TermId,
    },
    /// A new adjudication round was created.
    RoundCreated {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
        /// Its draft term.
        draft_term: TermId,
        /// Its seat count (weight-scaled for the final round).
        guardians_number: u64,
        /// Whether it is the final round.
        is_final: bool,
    },
    /// A guardian was drafted (possibly repeatedly; `weight` accumulates).
    GuardianDrafted {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
        /// The drafted guardian.
        guardian: AccountId,
        /// The guardian's accumulated weight after this draft.
        weight: u64,
        /// The stake locked by this selection.
        locked: TokenAmount,
    },
    /// The dispute's lifecycle state changed.
    DisputeStateChanged {
        /// The dispute.
        dispute: DisputeId,
        /// The new state.
        state: DisputeState,
    },
    /// A vote commitment was placed.
    VoteCommitted {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
        /// The voter.
        voter: AccountId,
    },
    /// A commitment was leaked and forfeited.
    VoteLeaked {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
        /// The voter.
        voter: AccountId,
    },
    /// A vote was revealed.
    VoteRevealed {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
        /// The voter.
        voter: AccountId,
        /// The revealed outcome.
        outcome: Outcome,
        /// The voter's weight.
        weight: u64,
    },
    /// An appeal was raised.
    AppealCreated {
        /// The dispute.
        dispute: DisputeId,
        /// The appealed round.
        round: RoundId,
        /// The appealer.
        appealer: AccountId,
        /// The proposed ruling.
        ruling: Outcome,
        /// The appeal deposit.
        deposit: TokenAmount,
    },
    /// An appeal was confirmed.
    AppealConfirmed {
        /// The dispute.
        dispute: DisputeId,
        /// The appealed round.
        round: RoundId,
        /// The confirmer.
        confirmer: AccountId,
        /// The opposing ruling.
        ruling: Outcome,
        /// The confirmation deposit.
        deposit: TokenAmount,
    },
    /// The final ruling was computed.
    RulingComputed {
        /// The dispute.
        dispute: DisputeId,
        /// The final ruling.
        ruling: Outcome,
    },
    /// Penalty settlement completed for a round.
    PenaltiesSettled {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
        /// Tokens collected from incoherent guardians.
        collected: TokenAmount,
        /// Total coherent weight.
        coherent_weight: u64,
    },
    /// A guardian's reward was settled.
    RewardSettled {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
        /// The rewarded guardian.
        guardian: AccountId,
        /// Stake tokens paid from the collected pool.
        tokens: TokenAmount,
        /// Fee tokens paid from the round fees.
        fees: TokenAmount,
    },
    /// A round's appeal deposits were settled.
    AppealDepositSettled {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_roundtrip() {
        let event = CourtEvent::GuardianDrafted {
            dispute: DisputeId::new(1),
            round: RoundId::FIRST,
            guardian: AccountId::new(),
            weight: 2,
            locked: TokenAmount::new(10),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: CourtEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
