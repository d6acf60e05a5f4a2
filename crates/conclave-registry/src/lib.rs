#![deny(missing_docs)]

//! # conclave-registry — Stake Ledger and Sortition Registry
//!
//! Tracks every guardian's stake across its five partitions (staked is the
//! sum of active, available, locked and pending-deactivation), keeps the
//! full per-term history of active balances, and runs the stake-weighted
//! sortition draft over them.
//!
//! ## Balance Partitions
//!
//! ```text
//! staked ═ available + active + locked + pending-deactivation
//!
//! stake ─────▶ available ──activate (next term)──▶ active
//! unstake ◀── available ◀──deactivate (next term, via pending)── active
//! draft lock: active ──▶ locked      settlement: locked ──▶ active (unlock)
//!                                    settlement: locked ──▶ collected (slash)
//! ```
//!
//! Every movement into or out of the active partition is recorded in the
//! checkpointed sortition tree at the term it becomes effective, which is
//! always the term after the current one. Historical queries therefore never
//! see retroactive mutation.
//!
//! ## Sortition
//!
//! [`SortitionTree`] is a binary cumulative-weight tree whose nodes carry
//! append-only per-term checkpoints: point updates are O(log n), and both
//! the total-stake query and the weighted sample run against any past term
//! in O(log n · log c).

pub mod checkpoints;
pub mod draft;
pub mod error;
pub mod ledger;
pub mod tree;

pub use checkpoints::CheckpointHistory;
pub use draft::{DraftOutcome, DraftParams, DraftedSeat};
pub use error::RegistryError;
pub use ledger::{GuardianRegistry, LockSettlement, PendingDeactivation, StakeAccount};
pub use tree::SortitionTree;
