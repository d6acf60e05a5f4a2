#![deny(missing_docs)]

//! # conclave-clock — Term Clock for the Conclave Engine
//!
//! Discrete protocol time. Wall-clock time enters the engine exclusively
//! through this crate: the [`TermClock`] converts it into a monotonically
//! increasing sequence of fixed-duration terms, and every time-sensitive
//! operation elsewhere gates on term ids.
//!
//! ## Key Properties
//!
//! - **Explicit advancement.** The clock never advances itself. Callers run
//!   [`TermClock::heartbeat`]; operations that need a current clock call
//!   [`TermClock::ensured_current_term`] and fail with
//!   [`ClockError::TermOutdated`] when transitions are pending.
//! - **Lazy, bounded-freshness entropy.** Each term records its entropy
//!   source block at creation; the entropy value resolves on first access
//!   within a bounded block window and is permanently unavailable after it.
//! - **Oracle seams.** Wall time and block data come from the [`TimeOracle`]
//!   and [`BlockOracle`] traits, with system and manual implementations.

pub mod error;
pub mod oracle;
pub mod terms;

pub use error::ClockError;
pub use oracle::{BlockOracle, ManualBlockOracle, ManualTimeOracle, SystemTimeOracle, TimeOracle};
pub use terms::{Term, TermClock, DEFAULT_ENTROPY_WINDOW};
