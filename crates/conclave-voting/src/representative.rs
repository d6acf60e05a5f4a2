//! # Representative Proxy Commits
//!
//! A guardian can let a representative place commitments on their behalf in
//! two ways:
//!
//! 1. **Standing allow-list** — a time-unbounded authorization the guardian
//!    toggles per representative.
//! 2. **Single-use authorization** — an ed25519 signature by the guardian's
//!    registered key over the exact `(vote, guardian, representative,
//!    commitment)` tuple. Binding the commitment makes the signature
//!    worthless for any other ballot or hash, and the tally's occupied-slot
//!    rule makes it single-use.

use std::collections::{HashMap, HashSet};

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use conclave_core::{AccountId, Digest};

use crate::error::VotingError;
use crate::tally::VoteId;

/// The byte string a guardian signs to authorize one proxy commitment.
pub fn authorization_message(
    vote: &VoteId,
    guardian: &AccountId,
    representative: &AccountId,
    commitment: &Digest,
) -> Vec<u8> {
    let mut message = Vec::with_capacity(16 + 16 + 16 + 32 + 24);
    message.extend_from_slice(b"conclave:commit-auth:v1:");
    message.extend_from_slice(&vote.dispute.raw().to_be_bytes());
    message.extend_from_slice(&vote.round.raw().to_be_bytes());
    message.extend_from_slice(guardian.as_uuid().as_bytes());
    message.extend_from_slice(representative.as_uuid().as_bytes());
    message.extend_from_slice(commitment.as_bytes());
    message
}

/// Allow-list entries and signing keys for the representative paths.
#[derive(Debug, Default)]
pub struct RepresentativeRegistry {
    allowed: HashMap<AccountId, HashSet<AccountId>>,
    keys: HashMap<AccountId, VerifyingKey>,
}

impl RepresentativeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or remove a representative from a guardian's allow-list.
    pub fn set_representative(
        &mut self,
        guardian: AccountId,
        representative: AccountId,
        allowed: bool,
    ) {
        let entry = self.allowed.entry(guardian).or_default();
        if allowed {
            entry.insert(representative);
        } else {
            entry.remove(&representative);
        }
        tracing::debug!(%guardian, %representative, allowed, "representative updated");
    }

    /// Whether the representative is on the guardian's allow-list.
    pub fn is_allowed(&self, guardian: &AccountId, representative: &AccountId) -> bool {
        self.allowed
            .get(guardian)
            .is_some_and(|reps| reps.contains(representative))
    }

    /// Register the guardian's authorization-verification key.
    pub fn register_signing_key(&mut self, guardian: AccountId, key: VerifyingKey) {
        self.keys.insert(guardian, key);
    }

    /// The guardian's registered key, if any.
    pub fn signing_key(&self, guardian: &AccountId) -> Option<&VerifyingKey> {
        self.keys.get(guardian)
    }

    /// Verify a single-use proxy-commit authorization.
    ///
    /// # Errors
    ///
    /// [`VotingError::NoSigningKey`] when the guardian never registered a
    /// key; [`VotingError::InvalidAuthorization`] when the signature does
    /// not verify over the exact tuple.
    pub fn verify_authorization(
        &self,
        vote: &VoteId,
        guardian: &AccountId,
        representative: &AccountId,
        commitment: &Digest,
        signature: &Signature,
    ) -> Result<(), VotingError> {
        let key = self
            .keys
            .get(guardian)
            .ok_or(VotingError::NoSigningKey(*guardian))?;
        let message = authorization_message(vote, guardian, representative, commitment);
        key.verify(&message, signature)
            .map_err(|_| VotingError::InvalidAuthorization {
                guardian: *guardian,
            })
    }
}
