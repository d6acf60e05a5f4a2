#![deny(missing_docs)]

//! # conclave-core — Foundational Types for the Conclave Engine
//!
//! This crate defines the foundational types that every other crate in the
//! workspace depends on. It has no internal crate dependencies — only `serde`,
//! `serde_json`, `thiserror`, `chrono`, `uuid`, and `sha2` from the external
//! ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Every identifier is a
//!    distinct type. You cannot pass a [`DisputeId`] where a [`TermId`] is
//!    expected, and a [`SubjectId`] never masquerades as an [`AccountId`].
//!
//! 2. **Overflow-checked monetary arithmetic.** [`TokenAmount`] exposes only
//!    checked operations returning [`ArithmeticError`] on wrap. Settlement
//!    code has no path to silent overflow.
//!
//! 3. **Per-myriad percentages.** [`Permyriad`] (bounded at 10 000) and
//!    [`CollateralFactor`] (unbounded multiple) are distinct types, so a
//!    penalty share can never be confused with an appeal-collateral multiple.
//!
//! 4. **One digest path.** All commitments and entropy derivations flow
//!    through [`sha256`]/[`Digest`], so there is a single hashing convention
//!    to audit.

pub mod amount;
pub mod error;
pub mod hashing;
pub mod identity;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use amount::{CollateralFactor, Permyriad, TokenAmount};
pub use error::{ArithmeticError, ValidationError};
pub use hashing::{draft_seed, sha256, Digest, Entropy};
pub use identity::{AccountId, DisputeId, RoundId, SubjectId, TokenId};
pub use temporal::{TermId, Timestamp};
