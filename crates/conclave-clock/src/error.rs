//! # Clock Error Types
//!
//! Temporal-staleness errors are deliberately distinct from state-machine
//! errors elsewhere in the engine: every variant here is resolved by a
//! corrective call (a heartbeat, or waiting for the chain to advance) and a
//! retry, never by changing the request.

use conclave_core::TermId;
use thiserror::Error;

/// Errors arising from term clock operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The clock cannot be constructed with a zero term duration.
    #[error("term duration must be positive")]
    ZeroTermDuration,

    /// The first term must start at or after the time of construction.
    #[error("first term start time is in the past")]
    FirstTermStartInPast,

    /// `heartbeat` was called with `max_transitions == 0`.
    #[error("heartbeat requires a positive number of transitions")]
    ZeroMaxTransitions,

    /// `heartbeat` was called but the clock is already current.
    #[error("no term transitions are needed")]
    NoTransitionsNeeded,

    /// The clock has not been heartbeat-ed to the present; the operation
    /// must be retried after a heartbeat.
    #[error("term is outdated: {pending} transition(s) pending")]
    TermOutdated {
        /// How many transitions a heartbeat must cover to become current.
        pending: u64,
    },

    /// The requested term has not been ensured by any heartbeat yet.
    #[error("{0} has not been ensured")]
    TermNotEnsured(TermId),

    /// The term's entropy source block has not been mined past yet.
    #[error(
        "entropy for {term} not ready: source block {source_block}, current height {current_height}"
    )]
    EntropyNotReady {
        /// The term whose entropy was requested.
        term: TermId,
        /// The block whose hash seeds the term's entropy.
        source_block: u64,
        /// The chain height at the time of the request.
        current_height: u64,
    },

    /// The freshness window elapsed before the entropy was resolved; it is
    /// now permanently unavailable and the draft must use a later term.
    #[error(
        "entropy for {term} expired: source block {source_block} is more than {window} blocks \
         behind current height {current_height}"
    )]
    EntropyExpired {
        /// The term whose entropy was requested.
        term: TermId,
        /// The block whose hash would have seeded the term's entropy.
        source_block: u64,
        /// The chain height at the time of the request.
        current_height: u64,
        /// The configured freshness window in blocks.
        window: u64,
    },

    /// The block oracle could not produce a hash for a block inside the
    /// freshness window.
    #[error("block oracle has no hash for block {0}")]
    BlockHashUnavailable(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_outdated_display() {
        let err = ClockError::TermOutdated { pending: 3 };
        assert!(format!("{err}").contains("3 transition(s)"));
    }

    #[test]
    fn entropy_not_ready_display() {
        let err = ClockError::EntropyNotReady {
            term: TermId::new(5),
            source_block: 100,
            current_height: 100,
        };
        let msg = format!("{err}");
        assert!(msg.contains("term:5"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn entropy_expired_display() {
        let err = ClockError::EntropyExpired {
            term: TermId::new(5),
            source_block: 100,
            current_height: 400,
            window: 256,
        };
        let msg = format!("{err}");
        assert!(msg.contains("256"));
        assert!(msg.contains("400"));
    }
}
