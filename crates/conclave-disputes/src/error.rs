//! # Dispute Engine Error Types
//!
//! The engine-level error taxonomy. Variants group into five families:
//! state-machine violations (terminal for the call), temporal staleness
//! (retry after a corrective call), economic validation failures (terminal,
//! fix the input), idempotence guards (the effect already happened), and
//! arithmetic (defensive, signals a logic bug). Lower-layer errors compose
//! in via `#[from]` so callers keep the original discriminator.

use conclave_clock::ClockError;
use conclave_core::{AccountId, ArithmeticError, DisputeId, RoundId, TermId};
use conclave_registry::RegistryError;
use conclave_voting::{Outcome, VotingError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::dispute::AdjudicationState;

/// Errors arising from dispute engine operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisputeError {
    // ── State-machine violations ───────────────────────────────────────
    /// The dispute does not exist.
    #[error("unknown {0}")]
    UnknownDispute(DisputeId),

    /// The round does not exist within the dispute.
    #[error("unknown {round} in {dispute}")]
    UnknownRound {
        /// The dispute.
        dispute: DisputeId,
        /// The missing round.
        round: RoundId,
    },

    /// The round is in the wrong adjudication phase for the operation.
    #[error("{dispute} {round} is {actual}, operation requires {expected}")]
    InvalidAdjudicationState {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
        /// The phase the round is actually in.
        actual: AdjudicationState,
        /// The phase the operation requires.
        expected: AdjudicationState,
    },

    /// Only the latest round of a dispute accepts this operation.
    #[error("{round} is not the latest round of {dispute}")]
    RoundNotLatest {
        /// The dispute.
        dispute: DisputeId,
        /// The rejected round.
        round: RoundId,
    },

    /// The round already has all of its seats filled.
    #[error("{dispute} {round} is already fully drafted")]
    RoundAlreadyDrafted {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
    },

    /// The round's draft term has not been reached yet.
    #[error("{dispute} draft term {draft_term} not reached (current {current_term})")]
    DraftTermNotReached {
        /// The dispute.
        dispute: DisputeId,
        /// The round's scheduled draft term.
        draft_term: TermId,
        /// The ensured current term.
        current_term: TermId,
    },

    /// Evidence can no longer be submitted or the period re-closed.
    #[error("evidence period of {0} is closed")]
    EvidencePeriodClosed(DisputeId),

    /// Settlement must proceed round by round.
    #[error("penalties of the round before {round} in {dispute} are not settled")]
    PreviousRoundNotSettled {
        /// The dispute.
        dispute: DisputeId,
        /// The round whose predecessor is unsettled.
        round: RoundId,
    },

    /// Rewards and deposits settle only after the round's penalties.
    #[error("penalties of {round} in {dispute} are not settled yet")]
    PenaltiesNotSettled {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
    },

    /// The round was never appealed.
    #[error("{round} in {dispute} has no appeal")]
    NoAppeal {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
    },

    // ── Economic validation failures ───────────────────────────────────
    /// Disputes need between 2 and 250 possible rulings.
    #[error("possible rulings {0} outside the allowed 2..=250 range")]
    InvalidPossibleRulings(u8),

    /// The caller carries no weight in this ballot.
    #[error("voter {voter} has zero weight in {dispute} {round}")]
    VoterWeightZero {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
        /// The weightless voter.
        voter: AccountId,
    },

    /// The ruling is not a votable outcome of this ballot.
    #[error("ruling {0} is not a valid outcome for this round")]
    InvalidRuling(Outcome),

    /// Appeals and confirmations must name a genuinely different ruling.
    #[error("ruling {0} does not differ from the ruling it contests")]
    SameRuling(Outcome),

    /// Batched operations need a positive batch size.
    #[error("batch size must be positive")]
    ZeroBatchSize,

    /// The guardian was not drafted for the round.
    #[error("guardian {guardian} was not drafted in {dispute} {round}")]
    NotDrafted {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
        /// The guardian.
        guardian: AccountId,
    },

    /// The guardian was drafted but did not vote for the final ruling.
    #[error("guardian {guardian} was not coherent in {dispute} {round}")]
    NotCoherent {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
        /// The guardian.
        guardian: AccountId,
    },

    /// The caller does not hold the governance role the operation needs.
    #[error("account {caller} is not the {role} governor")]
    NotAuthorized {
        /// The rejected caller.
        caller: AccountId,
        /// The required role.
        role: &'static str,
    },

    // ── Idempotence guards ─────────────────────────────────────────────
    /// Penalties were already settled for the round.
    #[error("penalties of {round} in {dispute} are already settled")]
    PenaltiesAlreadySettled {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
    },

    /// The guardian's reward was already paid.
    #[error("guardian {guardian} was already rewarded in {dispute} {round}")]
    AlreadyRewarded {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
        /// The guardian.
        guardian: AccountId,
    },

    /// The appeal deposits were already settled.
    #[error("appeal deposits of {round} in {dispute} are already settled")]
    AppealAlreadySettled {
        /// The dispute.
        dispute: DisputeId,
        /// The round.
        round: RoundId,
    },

    // ── Composed lower-layer errors ────────────────────────────────────
    /// Temporal staleness or entropy failure from the term clock.
    #[error(transparent)]
    Clock(#[from] ClockError),

    /// Stake ledger or sortition failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Commit-reveal tally failure.
    #[error(transparent)]
    Voting(#[from] VotingError),

    /// Configuration validation or scheduling failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Overflow-checked arithmetic failed.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}
