//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the Conclave engine.
//! Each identifier is a distinct type — you cannot pass a [`SubjectId`]
//! where an [`AccountId`] is expected.
//!
//! ## Minting
//!
//! UUID-based identifiers ([`AccountId`], [`SubjectId`], [`TokenId`]) are
//! minted outside the engine and are always valid by construction.
//! Integer-based identifiers ([`DisputeId`], [`RoundId`]) are minted
//! sequentially by the engine itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// UUID-based identifiers (externally minted, always valid by construction)
// ---------------------------------------------------------------------------

/// A unique identifier for any principal interacting with the engine:
/// a staked guardian, a dispute creator, an appealer, or a governor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Create a new random account identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an account identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque reference to the external arbitrable agreement a dispute is
/// adjudicating. The engine never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(Uuid);

impl SubjectId {
    /// Create a new random subject identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a subject identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SubjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "subject:{}", self.0)
    }
}

/// A unique identifier for an ERC20-style fee token ledgered by the
/// treasury collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(Uuid);

impl TokenId {
    /// Create a new random token identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a token identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "token:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Integer-based identifiers (engine minted, sequential)
// ---------------------------------------------------------------------------

/// A sequential dispute identifier, assigned at dispute creation and never
/// reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct DisputeId(u64);

impl DisputeId {
    /// Wrap a raw dispute number.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw dispute number.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DisputeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dispute:{}", self.0)
    }
}

/// A round number within a dispute. Round 0 is the first adjudication
/// round; each confirmed appeal increments it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct RoundId(u64);

impl RoundId {
    /// The first round of every dispute.
    pub const FIRST: RoundId = RoundId(0);

    /// Wrap a raw round number.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw round number.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// The round number as an index into a dispute's round list.
    pub fn as_index(&self) -> usize {
        self.0 as usize
    }

    /// The round created when this round's appeal is confirmed.
    pub fn next(&self) -> RoundId {
        RoundId(self.0 + 1)
    }
}

impl std::fmt::Display for RoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "round:{}", self.0)
    }
}
