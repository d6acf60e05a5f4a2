//! # Dispute Data Model
//!
//! Disputes, adjudication rounds, appeals and the computed adjudication
//! phase. Disputes and rounds are created together and never deleted;
//! state only advances forward.
//!
//! ## Phase Computation
//!
//! A round's phase is derived, not stored: [`adjudication_state_at`] takes
//! the round, the config effective at its draft term, and the current term.
//! The phase windows chain off the term the draft actually completed
//! (`draft_term_id + delayed_terms`):
//!
//! ```text
//! Invalid ──draft──▶ Committing ──▶ Revealing ──▶ Appealing ──▶ Ended
//!                                        │            │
//!                                 (final round)   appeal raised
//!                                        ▼            ▼
//!                                      Ended    ConfirmingAppeal ──▶ Ended
//! ```
//!
//! A confirmed appeal ends the round immediately; the final round skips the
//! appeal windows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use conclave_core::{AccountId, Digest, DisputeId, RoundId, SubjectId, TermId, TokenAmount};
use conclave_voting::Outcome;

use crate::config::CourtConfig;

/// The lifecycle state of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeState {
    /// Created; round 0 not fully drafted yet.
    PreDraft,
    /// At least one round drafted; adjudication in progress.
    Adjudicating,
    /// Final ruling computed. Terminal state.
    Ruled,
}

impl DisputeState {
    /// The canonical state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreDraft => "pre-draft",
            Self::Adjudicating => "adjudicating",
            Self::Ruled => "ruled",
        }
    }
}

impl std::fmt::Display for DisputeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The computed adjudication phase of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjudicationState {
    /// Not yet fully drafted, or the draft term not reached.
    Invalid,
    /// Guardians may commit hashed votes.
    Committing,
    /// Guardians may reveal their commitments.
    Revealing,
    /// Anyone may appeal the round's current winning outcome.
    Appealing,
    /// A raised appeal awaits confirmation with an opposing ruling.
    ConfirmingAppeal,
    /// The round is over; settlement may proceed.
    Ended,
}

impl AdjudicationState {
    /// The canonical phase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Committing => "committing",
            Self::Revealing => "revealing",
            Self::Appealing => "appealing",
            Self::ConfirmingAppeal => "confirming-appeal",
            Self::Ended => "ended",
        }
    }
}

impl std::fmt::Display for AdjudicationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One guardian's accumulated draft state within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianDraftEntry {
    /// Accumulated weight: seats for drafted rounds, scaled balance for
    /// the final round.
    pub weight: u64,
    /// Stake locked against this round.
    pub locked: TokenAmount,
    /// Whether the reward was already settled.
    pub rewarded: bool,
}

/// An appeal against a round's winning outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appeal {
    /// Who raised the appeal.
    pub appealer: AccountId,
    /// The ruling the appealer proposes instead of the winning outcome.
    pub appealed_ruling: Outcome,
    /// The appeal deposit.
    pub deposit: TokenAmount,
    /// Who confirmed the appeal, once confirmed.
    pub confirmer: Option<AccountId>,
    /// The ruling the confirmer opposes with.
    pub opposed_ruling: Option<Outcome>,
    /// The confirmation deposit.
    pub confirm_deposit: TokenAmount,
    /// Whether the deposits were settled.
    pub settled: bool,
}

impl Appeal {
    /// Whether the appeal was confirmed.
    pub fn is_confirmed(&self) -> bool {
        self.confirmer.is_some()
    }
}

/// Who funded a round's guardian fees, for zero-coherence refunds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundFunding {
    /// Round 0 is funded by the dispute creator.
    Creator(AccountId),
    /// Appeal rounds are funded by the previous round's appeal parties.
    Appeal {
        /// The appealer of the previous round.
        appealer: AccountId,
        /// The confirmer of the previous round.
        confirmer: AccountId,
    },
}

/// One adjudication round of a dispute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjudicationRound {
    /// The term drafting becomes possible (and, for the final round, the
    /// term its commit phase opens).
    pub draft_term_id: TermId,
    /// Terms the draft actually lagged behind `draft_term_id`.
    pub delayed_terms: u64,
    /// Seats to fill; for the final round, the scaled total weight.
    pub guardians_number: u64,
    /// Seats filled so far.
    pub selected_seats: u64,
    /// Random values consumed by drafting so far (filled or skipped).
    pub draft_attempts: u64,
    /// Whether this is the non-appealable, balance-weighted final round.
    pub is_final: bool,
    /// Total guardian fees attached to this round.
    pub guardian_fees: TokenAmount,
    /// Who funded the fees.
    pub funding: RoundFunding,
    /// Tokens collected from incoherent guardians during penalty
    /// settlement.
    pub collected_tokens: TokenAmount,
    /// Total weight of guardians who voted for the final ruling.
    pub coherent_weight: u64,
    /// Whether penalty settlement completed.
    pub settled_penalties: bool,
    /// Batch cursor into `drafted_order` for penalty settlement.
    pub settle_cursor: usize,
    /// Guardians in first-selection order (final round: commit order).
    pub drafted_order: Vec<AccountId>,
    /// Per-guardian accumulated draft state.
    pub guardian_states: HashMap<AccountId, GuardianDraftEntry>,
    /// The round's appeal, if one was raised.
    pub appeal: Option<Appeal>,
}

impl AdjudicationRound {
    /// Create a not-yet-drafted round.
    pub fn new(
        draft_term_id: TermId,
        guardians_number: u64,
        guardian_fees: TokenAmount,
        funding: RoundFunding,
        is_final: bool,
    ) -> Self {
        Self {
            draft_term_id,
            delayed_terms: 0,
            guardians_number,
            selected_seats: 0,
            draft_attempts: 0,
            is_final,
            guardian_fees,
            funding,
            collected_tokens: TokenAmount::ZERO,
            coherent_weight: 0,
            settled_penalties: false,
            settle_cursor: 0,
            drafted_order: Vec::new(),
            guardian_states: HashMap::new(),
            appeal: None,
        }
    }

    /// Whether every seat has been filled (always true for the final
    /// round, which needs no draft).
    pub fn is_fully_drafted(&self) -> bool {
        self.is_final || self.selected_seats >= self.guardians_number
    }

    /// A guardian's draft entry, if drafted (or, in the final round,
    /// committed).
    pub fn guardian_state(&self, guardian: &AccountId) -> Option<&GuardianDraftEntry> {
        self.guardian_states.get(guardian)
    }
}

/// A piece of submitted evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Who submitted it.
    pub submitter: AccountId,
    /// Digest of the evidence payload (stored off-engine).
    pub digest: Digest,
    /// The term it arrived in.
    pub term: TermId,
}

/// A dispute under adjudication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    /// The dispute identifier.
    pub id: DisputeId,
    /// The account that created the dispute and funded round 0.
    pub creator: AccountId,
    /// Opaque reference to the arbitrable agreement.
    pub subject: SubjectId,
    /// Number of possible rulings (2..=250).
    pub possible_rulings: u8,
    /// Lifecycle state.
    pub state: DisputeState,
    /// The final ruling, once computed.
    pub final_ruling: Option<Outcome>,
    /// Whether the arbitrable collaborator was notified of the ruling.
    pub ruling_notified: bool,
    /// The term the dispute was created in.
    pub create_term_id: TermId,
    /// Submitted evidence, in arrival order.
    pub evidence: Vec<EvidenceItem>,
    /// Adjudication rounds; index is the round id.
    pub rounds: Vec<AdjudicationRound>,
}

impl Dispute {
    /// The id of the latest round.
    pub fn last_round_id(&self) -> RoundId {
        RoundId::new(self.rounds.len() as u64 - 1)
    }

    /// The latest round.
    pub fn last_round(&self) -> &AdjudicationRound {
        self.rounds.last().expect("disputes always have round 0")
    }

    /// A round by id.
    pub fn round(&self, round: RoundId) -> Option<&AdjudicationRound> {
        self.rounds.get(round.as_index())
    }
}

/// Compute a round's adjudication phase at `current_term`, under the
/// config effective at the round's draft term.
pub fn adjudication_state_at(
    round: &AdjudicationRound,
    config: &CourtConfig,
    current_term: TermId,
) -> AdjudicationState {
    if !round.is_fully_drafted() {
        return AdjudicationState::Invalid;
    }
    let start = round.draft_term_id.advance(round.delayed_terms);
    if current_term < start {
        return AdjudicationState::Invalid;
    }
    let commit_end = start.advance(config.commit_terms);
    if current_term < commit_end {
        return AdjudicationState::Committing;
    }
    let reveal_end = commit_end.advance(config.reveal_terms);
    if current_term < reveal_end {
        return AdjudicationState::Revealing;
    }
    if round.is_final {
        return AdjudicationState::Ended;
    }
    let appeal_end = reveal_end.advance(config.appeal_terms);
    let confirm_end = appeal_end.advance(config.appeal_confirmation_terms);
    match &round.appeal {
        None => {
            if current_term < appeal_end {
                AdjudicationState::Appealing
            } else {
                AdjudicationState::Ended
            }
        }
        Some(appeal) if !appeal.is_confirmed() => {
            if current_term < confirm_end {
                AdjudicationState::ConfirmingAppeal
            } else {
                AdjudicationState::Ended
            }
        }
        Some(_) => AdjudicationState::Ended,
    }
}

impl AdjudicationRound {
    /// The term the round's full schedule ends: the draft term of any next
    /// round spawned by a confirmed appeal.
    pub fn schedule_end(&self, config: &CourtConfig) -> TermId {
        self.draft_term_id
            .advance(self.delayed_terms)
            .advance(config.commit_terms)
            .advance(config.reveal_terms)
            .advance(config.appeal_terms)
            .advance(config.appeal_confirmation_terms)
    }
}
