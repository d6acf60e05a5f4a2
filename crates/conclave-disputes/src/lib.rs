#![deny(missing_docs)]

//! # conclave-disputes — Dispute Adjudication State Machine
//!
//! The engine's core: dispute and round lifecycle, the stake-weighted
//! draft, commit-reveal orchestration, the bounded appeal cascade, and the
//! conserving penalty/reward/deposit settlement.
//!
//! ## The Court Runtime
//!
//! [`Court`] owns concrete instances of every role — term clock, guardian
//! registry, vote tally, representative registry, configuration history —
//! and coordinates them with compile-time dispatch. External collaborators
//! enter through two narrow traits: [`Treasury`] (outbound credits) and
//! [`Arbitrable`] (the one-time ruling notification).
//!
//! ## Timing Discipline
//!
//! Round adjudication state is computed from term arithmetic, never
//! stored: [`adjudication_state_at`] derives the phase from the round's
//! draft term, its recorded delay, and the config effective at the draft
//! term. Every time-sensitive operation first demands a fully heartbeat-ed
//! clock and fails with a distinct staleness error otherwise; nothing
//! self-advances.

pub mod arbitrable;
pub mod config;
pub mod dispute;
pub mod engine;
pub mod error;
pub mod events;
pub mod treasury;

pub use arbitrable::{Arbitrable, RecordingArbitrable};
pub use config::{
    ConfigError, ConfigHistory, CourtConfig, GovernanceConfig, FINAL_ROUND_WEIGHT_PRECISION,
};
pub use dispute::{
    adjudication_state_at, AdjudicationRound, AdjudicationState, Appeal, Dispute, DisputeState,
    EvidenceItem, GuardianDraftEntry, RoundFunding,
};
pub use engine::{Court, CourtSettings, MAX_POSSIBLE_RULINGS};
pub use error::DisputeError;
pub use events::CourtEvent;
pub use treasury::{MemoryTreasury, Treasury};
