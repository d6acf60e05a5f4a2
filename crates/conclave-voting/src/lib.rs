#![deny(missing_docs)]

//! # conclave-voting — Commit-Reveal Vote Tally
//!
//! Per round identifier, collects hashed vote commitments, later validates
//! and records revealed outcomes, tallies weighted votes per outcome, and
//! tracks the current leader.
//!
//! ## Division of Responsibility
//!
//! The tally does not know what phase a round is in or how much weight a
//! voter carries — both are the owning round's concern. The engine verifies
//! phase and draft-derived weight before delegating here; this crate
//! enforces everything local to the ballot: slot occupancy, commitment
//! integrity, outcome validity, and tally arithmetic.

pub mod error;
pub mod outcome;
pub mod representative;
pub mod tally;

pub use error::VotingError;
pub use outcome::Outcome;
pub use representative::{authorization_message, RepresentativeRegistry};
pub use tally::{commitment_of, CastVote, VoteId, VoteRecord, VoteTally};

// Re-export the signature primitives so callers on the representative path
// do not need their own ed25519 dependency.
pub use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
