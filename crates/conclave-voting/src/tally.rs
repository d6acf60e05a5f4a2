//! # Ballots and Weighted Tallies
//!
//! One [`VoteRecord`] per round identifier. Commitments occupy a voter's
//! slot permanently — a leaked or revealed commitment can never be
//! replaced — and reveals move weight into the per-outcome tally.
//!
//! ## Leader Rule
//!
//! The leader starts as [`Outcome::REFUSED`] with a zero tally. A reveal
//! takes the lead with a strictly greater tally, or with an equal tally and
//! a numerically smaller outcome. This makes the tie-break deterministic
//! and keeps "refused" the default when nobody reveals.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use conclave_core::{sha256, AccountId, ArithmeticError, Digest, DisputeId, RoundId};

use crate::error::VotingError;
use crate::outcome::Outcome;

/// The identifier of one ballot: a (dispute, round) pair.
///
/// Serializes as the string `"<dispute>/<round>"` so ballots can key JSON
/// maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoteId {
    /// The dispute the ballot belongs to.
    pub dispute: DisputeId,
    /// The round the ballot belongs to.
    pub round: RoundId,
}

impl VoteId {
    /// Create a ballot identifier.
    pub fn new(dispute: DisputeId, round: RoundId) -> Self {
        Self { dispute, round }
    }
}

impl std::fmt::Display for VoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vote:{}/{}", self.dispute.raw(), self.round.raw())
    }
}

impl Serialize for VoteId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}/{}", self.dispute.raw(), self.round.raw()))
    }
}

impl<'de> Deserialize<'de> for VoteId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let (dispute, round) = raw
            .split_once('/')
            .ok_or_else(|| serde::de::Error::custom("expected \"<dispute>/<round>\""))?;
        let dispute = dispute.parse::<u64>().map_err(serde::de::Error::custom)?;
        let round = round.parse::<u64>().map_err(serde::de::Error::custom)?;
        Ok(VoteId::new(DisputeId::new(dispute), RoundId::new(round)))
    }
}

/// Compute the commitment digest for `(outcome, salt)`.
pub fn commitment_of(outcome: Outcome, salt: &[u8; 32]) -> Digest {
    let mut payload = [0u8; 33];
    payload[0] = outcome.raw();
    payload[1..].copy_from_slice(salt);
    sha256(&payload)
}

/// One voter's slot in a ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastVote {
    /// The hashed commitment.
    pub commitment: Digest,
    /// The recorded outcome: `None` until revealed or leaked.
    pub outcome: Option<Outcome>,
}

/// A single ballot: commitments, reveals and the running tally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    max_outcome: Outcome,
    votes: HashMap<AccountId, CastVote>,
    tallies: BTreeMap<Outcome, u64>,
    winning_outcome: Outcome,
    winning_tally: u64,
}

impl VoteRecord {
    fn new(possible_rulings: u8) -> Self {
        Self {
            max_outcome: Outcome::max_for(possible_rulings),
            votes: HashMap::new(),
            tallies: BTreeMap::new(),
            winning_outcome: Outcome::REFUSED,
            winning_tally: 0,
        }
    }

    /// The highest votable outcome of this ballot.
    pub fn max_outcome(&self) -> Outcome {
        self.max_outcome
    }

    /// The current leader.
    pub fn winning_outcome(&self) -> Outcome {
        self.winning_outcome
    }

    /// The weight revealed for `outcome` so far.
    pub fn outcome_tally(&self, outcome: Outcome) -> u64 {
        self.tallies.get(&outcome).copied().unwrap_or(0)
    }

    /// A voter's recorded outcome, if revealed or leaked.
    pub fn voter_outcome(&self, voter: &AccountId) -> Option<Outcome> {
        self.votes.get(voter).and_then(|cast| cast.outcome)
    }

    /// A voter's slot, if committed.
    pub fn cast(&self, voter: &AccountId) -> Option<&CastVote> {
        self.votes.get(voter)
    }
}

/// All ballots, keyed by round identifier.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VoteTally {
    records: HashMap<VoteId, VoteRecord>,
}

impl VoteTally {
    /// An empty tally store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a ballot for a round with `possible_rulings` rulings.
    ///
    /// # Errors
    ///
    /// [`VotingError::VoteAlreadyExists`] if the identifier is taken.
    pub fn create(&mut self, vote: VoteId, possible_rulings: u8) -> Result<(), VotingError> {
        if self.records.contains_key(&vote) {
            return Err(VotingError::VoteAlreadyExists(vote));
        }
        self.records.insert(vote, VoteRecord::new(possible_rulings));
        tracing::debug!(%vote, possible_rulings, "ballot created");
        Ok(())
    }

    /// A ballot, if it exists.
    pub fn record(&self, vote: &VoteId) -> Option<&VoteRecord> {
        self.records.get(vote)
    }

    /// Whether `outcome` is votable in this ballot (used by the appeal
    /// validation as well as by reveals).
    pub fn is_valid_outcome(&self, vote: &VoteId, outcome: Outcome) -> Result<bool, VotingError> {
        let record = self.records.get(vote).ok_or(VotingError::UnknownVote(*vote))?;
        Ok(outcome.is_votable(record.max_outcome))
    }

    /// The ballot's current leader.
    pub fn winning_outcome(&self, vote: &VoteId) -> Result<Outcome, VotingError> {
        let record = self.records.get(vote).ok_or(VotingError::UnknownVote(*vote))?;
        Ok(record.winning_outcome)
    }

    /// The weight revealed for `outcome`.
    pub fn outcome_tally(&self, vote: &VoteId, outcome: Outcome) -> Result<u64, VotingError> {
        let record = self.records.get(vote).ok_or(VotingError::UnknownVote(*vote))?;
        Ok(record.outcome_tally(outcome))
    }

    /// Whether the voter's revealed outcome equals `outcome`.
    pub fn voted_for(
        &self,
        vote: &VoteId,
        voter: &AccountId,
        outcome: Outcome,
    ) -> Result<bool, VotingError> {
        let record = self.records.get(vote).ok_or(VotingError::UnknownVote(*vote))?;
        Ok(record.voter_outcome(voter) == Some(outcome))
    }

    /// Store a commitment in the voter's slot.
    ///
    /// # Errors
    ///
    /// [`VotingError::AlreadyCommitted`] if the slot is occupied, whatever
    /// hash it holds.
    pub fn commit(
        &mut self,
        vote: VoteId,
        voter: AccountId,
        commitment: Digest,
    ) -> Result<(), VotingError> {
        let record = self
            .records
            .get_mut(&vote)
            .ok_or(VotingError::UnknownVote(vote))?;
        if record.votes.contains_key(&voter) {
            return Err(VotingError::AlreadyCommitted { vote, voter });
        }
        record.votes.insert(
            voter,
            CastVote {
                commitment,
                outcome: None,
            },
        );
        tracing::debug!(%vote, %voter, "vote committed");
        Ok(())
    }

    /// Mark an un-revealed commitment as intentionally forfeited.
    ///
    /// The caller proves knowledge of the committed `(outcome, salt)`; the
    /// slot records [`Outcome::LEAKED`], which never enters a tally but
    /// keeps the slot occupied.
    pub fn leak(
        &mut self,
        vote: VoteId,
        voter: AccountId,
        outcome: Outcome,
        salt: &[u8; 32],
    ) -> Result<(), VotingError> {
        let record = self
            .records
            .get_mut(&vote)
            .ok_or(VotingError::UnknownVote(vote))?;
        let cast = record
            .votes
            .get_mut(&voter)
            .ok_or(VotingError::NoCommitment { vote, voter })?;
        if cast.outcome.is_some() {
            return Err(VotingError::AlreadyRevealed { vote, voter });
        }
        if commitment_of(outcome, salt) != cast.commitment {
            return Err(VotingError::CommitmentMismatch { vote, voter });
        }
        cast.outcome = Some(Outcome::LEAKED);
        tracing::debug!(%vote, %voter, "vote leaked");
        Ok(())
    }

    /// Reveal a commitment and add `weight` to the outcome's tally.
    ///
    /// # Errors
    ///
    /// Exactly one reveal per voter per ballot; sentinels and
    /// out-of-range outcomes are invalid; the hash must match.
    pub fn reveal(
        &mut self,
        vote: VoteId,
        voter: AccountId,
        outcome: Outcome,
        salt: &[u8; 32],
        weight: u64,
    ) -> Result<(), VotingError> {
        let record = self
            .records
            .get_mut(&vote)
            .ok_or(VotingError::UnknownVote(vote))?;
        if !outcome.is_votable(record.max_outcome) {
            return Err(VotingError::InvalidOutcome {
                outcome,
                max: record.max_outcome,
            });
        }
        let cast = record
            .votes
            .get_mut(&voter)
            .ok_or(VotingError::NoCommitment { vote, voter })?;
        if cast.outcome.is_some() {
            return Err(VotingError::AlreadyRevealed { vote, voter });
        }
        if commitment_of(outcome, salt) != cast.commitment {
            return Err(VotingError::CommitmentMismatch { vote, voter });
        }

        let tally = record.tallies.entry(outcome).or_insert(0);
        let updated = tally
            .checked_add(weight)
            .ok_or(ArithmeticError::Overflow)?;
        cast.outcome = Some(outcome);
        *tally = updated;

        if updated > record.winning_tally
            || (updated == record.winning_tally && outcome < record.winning_outcome)
        {
            record.winning_outcome = outcome;
            record.winning_tally = updated;
        }
        tracing::debug!(%vote, %voter, %outcome, weight, "vote revealed");
        Ok(())
    }
}
