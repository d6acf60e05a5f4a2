//! # Registry Error Types
//!
//! Economic validation failures carry the requested and available amounts so
//! operators can diagnose a rejected stake operation without replaying it.

use conclave_core::{AccountId, ArithmeticError, TermId, TokenAmount};
use thiserror::Error;

/// Errors arising from stake ledger and sortition operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The guardian has never staked.
    #[error("unknown guardian {0}")]
    UnknownGuardian(AccountId),

    /// Zero-amount balance movements are rejected rather than treated as
    /// no-ops.
    #[error("amount must be positive")]
    ZeroAmount,

    /// The available balance cannot cover the requested movement.
    #[error("insufficient available balance: requested {requested}, available {available}")]
    InsufficientAvailableBalance {
        /// The requested amount.
        requested: TokenAmount,
        /// The available balance at the time of the request.
        available: TokenAmount,
    },

    /// The active balance cannot cover the requested movement.
    #[error("insufficient active balance: requested {requested}, active {active}")]
    InsufficientActiveBalance {
        /// The requested amount.
        requested: TokenAmount,
        /// The active balance at the time of the request.
        active: TokenAmount,
    },

    /// The locked balance cannot cover the requested slash or unlock.
    #[error("insufficient locked balance: requested {requested}, locked {locked}")]
    InsufficientLockedBalance {
        /// The requested amount.
        requested: TokenAmount,
        /// The locked balance at the time of the request.
        locked: TokenAmount,
    },

    /// The operation would leave a nonzero active balance below the
    /// configured minimum.
    #[error("resulting active balance {resulting} is below the minimum {minimum}")]
    BelowMinActiveBalance {
        /// The active balance the operation would produce.
        resulting: TokenAmount,
        /// The configured minimum active balance.
        minimum: TokenAmount,
    },

    /// A draft was requested against a term with no active stake at all.
    #[error("no active stake at {0}")]
    NoActiveStakeAtTerm(TermId),

    /// A tree operation referenced a slot that was never inserted. This is
    /// a logic bug, not a recoverable condition.
    #[error("unknown sortition slot {0}")]
    UnknownSlot(usize),

    /// A checkpoint write moved backwards in term order. Checkpoints are
    /// append-only; this is a logic bug, not a recoverable condition.
    #[error("checkpoint for {attempted} is earlier than latest checkpoint {latest}")]
    CheckpointOutOfOrder {
        /// The term of the rejected write.
        attempted: TermId,
        /// The latest recorded term.
        latest: TermId,
    },

    /// Overflow-checked arithmetic failed.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}
