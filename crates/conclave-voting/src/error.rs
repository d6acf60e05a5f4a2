//! # Voting Error Types
//!
//! Idempotence guards (`AlreadyCommitted`, `AlreadyRevealed`) are distinct
//! from integrity failures (`CommitmentMismatch`) and from authorization
//! failures on the representative path, so callers can tell "this already
//! happened" apart from "this was never valid".

use conclave_core::{AccountId, ArithmeticError};
use thiserror::Error;

use crate::outcome::Outcome;
use crate::tally::VoteId;

/// Errors arising from commit-reveal tally operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotingError {
    /// A ballot was created twice for the same round identifier.
    #[error("ballot for {0} already exists")]
    VoteAlreadyExists(VoteId),

    /// The round identifier has no ballot.
    #[error("no ballot for {0}")]
    UnknownVote(VoteId),

    /// The voter already committed for this ballot (re-committing the
    /// identical hash included).
    #[error("voter {voter} already committed in {vote}")]
    AlreadyCommitted {
        /// The ballot.
        vote: VoteId,
        /// The voter.
        voter: AccountId,
    },

    /// The voter has no commitment to reveal or leak.
    #[error("voter {voter} has no commitment in {vote}")]
    NoCommitment {
        /// The ballot.
        vote: VoteId,
        /// The voter.
        voter: AccountId,
    },

    /// The voter's commitment was already revealed or leaked.
    #[error("voter {voter} already revealed in {vote}")]
    AlreadyRevealed {
        /// The ballot.
        vote: VoteId,
        /// The voter.
        voter: AccountId,
    },

    /// The outcome is a sentinel or outside the ballot's outcome range.
    #[error("outcome {outcome} is not votable (max {max})")]
    InvalidOutcome {
        /// The rejected outcome.
        outcome: Outcome,
        /// The ballot's highest votable outcome.
        max: Outcome,
    },

    /// `hash(outcome, salt)` does not match the stored commitment.
    #[error("reveal for voter {voter} in {vote} does not match the commitment")]
    CommitmentMismatch {
        /// The ballot.
        vote: VoteId,
        /// The voter.
        voter: AccountId,
    },

    /// The representative is not on the guardian's allow-list and provided
    /// no authorization.
    #[error("representative {representative} is not authorized for guardian {guardian}")]
    RepresentativeNotAllowed {
        /// The guardian being represented.
        guardian: AccountId,
        /// The rejected representative.
        representative: AccountId,
    },

    /// The single-use commit authorization signature did not verify.
    #[error("commit authorization for guardian {guardian} is invalid")]
    InvalidAuthorization {
        /// The guardian whose key rejected the signature.
        guardian: AccountId,
    },

    /// The guardian has no registered signing key to verify an
    /// authorization against.
    #[error("guardian {0} has no registered signing key")]
    NoSigningKey(AccountId),

    /// Tally arithmetic failed.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}
