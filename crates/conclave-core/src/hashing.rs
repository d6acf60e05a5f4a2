//! # Digests and Entropy Derivation
//!
//! SHA-256 is the single hashing convention in the engine: vote commitments,
//! evidence digests and draft-seed derivation all flow through [`sha256`].
//!
//! ## Determinism
//!
//! Draft seeds are derived from a term's entropy value mixed with the
//! dispute id and a monotonically increasing seat counter, so a draft can be
//! re-executed batch by batch and every batch derives the same seed sequence
//! regardless of how the batches are sliced.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::identity::DisputeId;

/// A 32-byte SHA-256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// A term's 32-byte entropy value, derived from a block hash by the term
/// clock and consumed by the sortition draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entropy(pub [u8; 32]);

impl Entropy {
    /// The raw entropy bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Hash arbitrary bytes with SHA-256.
pub fn sha256(bytes: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Digest(hasher.finalize().into())
}

/// Derive the pseudo-random value for one draft seat.
///
/// `seat_index` is the dispute-round-global counter of seats requested so
/// far; consuming exactly one value per seat keeps batched drafting
/// equivalent to a single-call draft.
pub fn draft_seed(entropy: &Entropy, dispute_id: DisputeId, seat_index: u64) -> u128 {
    let mut hasher = Sha256::new();
    hasher.update(entropy.as_bytes());
    hasher.update(dispute_id.raw().to_be_bytes());
    hasher.update(seat_index.to_be_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    let mut head = [0u8; 16];
    head.copy_from_slice(&digest[..16]);
    u128::from_be_bytes(head)
}
