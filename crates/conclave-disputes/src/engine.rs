//! # The Court Runtime
//!
//! [`Court`] owns every engine component and serializes all access: each
//! operation is atomic, and an error leaves no partial mutation behind.
//! Time-sensitive operations demand a fully heartbeat-ed clock — the court
//! never advances the clock on a caller's behalf.
//!
//! ## Settlement Conservation
//!
//! Slashing is the only source of the collected pool, rewards are its only
//! sink (integer division leaves the remainder in place), and every fee or
//! deposit leaving the engine goes through the treasury collaborator. No
//! value is created or destroyed anywhere in between.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use conclave_clock::{BlockOracle, TermClock, TimeOracle};
use conclave_core::{
    AccountId, Digest, DisputeId, RoundId, SubjectId, TermId, TokenAmount,
};
use conclave_registry::{DraftParams, GuardianRegistry, LockSettlement};
use conclave_voting::{
    Outcome, RepresentativeRegistry, Signature, VerifyingKey, VoteId, VoteTally, VotingError,
};

use crate::arbitrable::Arbitrable;
use crate::config::{
    ConfigHistory, CourtConfig, GovernanceConfig, FINAL_ROUND_WEIGHT_PRECISION,
};
use crate::dispute::{
    adjudication_state_at, AdjudicationRound, AdjudicationState, Appeal, Dispute, DisputeState,
    EvidenceItem, GuardianDraftEntry, RoundFunding,
};
use crate::error::DisputeError;
use crate::events::CourtEvent;
use crate::treasury::Treasury;

/// Disputes carry between 2 and this many possible rulings; the outcome
/// space is a `u8` with three reserved values.
pub const MAX_POSSIBLE_RULINGS: u8 = 250;

/// Construction parameters for a [`Court`].
#[derive(Debug, Clone)]
pub struct CourtSettings {
    /// Fixed duration of every term.
    pub term_duration: Duration,
    /// When term 1 starts; must be at or after construction time.
    pub first_term_start: DateTime<Utc>,
    /// Entropy freshness window, in blocks.
    pub entropy_window: u64,
    /// The genesis configuration, effective from term 0.
    pub config: CourtConfig,
    /// The governance roles.
    pub governance: GovernanceConfig,
}

/// Sizing details of the round a confirmed appeal would create.
#[derive(Debug, Clone, Copy)]
struct NextRound {
    guardians_number: u64,
    guardian_fees: TokenAmount,
    draft_term: TermId,
    is_final: bool,
}

/// The dispute adjudication engine.
pub struct Court<T: Treasury> {
    clock: TermClock,
    registry: GuardianRegistry,
    voting: VoteTally,
    representatives: RepresentativeRegistry,
    config: ConfigHistory,
    governance: GovernanceConfig,
    treasury: T,
    disputes: Vec<Dispute>,
    events: Vec<CourtEvent>,
}

impl<T: Treasury> Court<T> {
    /// Build a court from settings, oracles and a treasury collaborator.
    pub fn new(
        settings: CourtSettings,
        time: Arc<dyn TimeOracle>,
        blocks: Arc<dyn BlockOracle>,
        treasury: T,
    ) -> Result<Self, DisputeError> {
        let clock = TermClock::new(
            settings.term_duration,
            settings.first_term_start,
            time,
            blocks,
            settings.entropy_window,
        )?;
        Ok(Self {
            clock,
            registry: GuardianRegistry::new(),
            voting: VoteTally::new(),
            representatives: RepresentativeRegistry::new(),
            config: ConfigHistory::new(settings.config)?,
            governance: settings.governance,
            treasury,
            disputes: Vec::new(),
            events: Vec::new(),
        })
    }

    // ── Accessors ──────────────────────────────────────────────────────

    /// The term clock.
    pub fn clock(&self) -> &TermClock {
        &self.clock
    }

    /// The guardian registry.
    pub fn registry(&self) -> &GuardianRegistry {
        &self.registry
    }

    /// The vote tally store.
    pub fn voting(&self) -> &VoteTally {
        &self.voting
    }

    /// The treasury collaborator.
    pub fn treasury(&self) -> &T {
        &self.treasury
    }

    /// The governance roles.
    pub fn governance(&self) -> &GovernanceConfig {
        &self.governance
    }

    /// The configuration effective at `term`.
    pub fn config_at(&self, term: TermId) -> &CourtConfig {
        self.config.config_at(term)
    }

    /// A dispute by id.
    pub fn dispute(&self, id: DisputeId) -> Result<&Dispute, DisputeError> {
        self.disputes
            .get(id.raw() as usize)
            .ok_or(DisputeError::UnknownDispute(id))
    }

    /// The event log accumulated so far.
    pub fn events(&self) -> &[CourtEvent] {
        &self.events
    }

    /// Take the accumulated events, clearing the log.
    pub fn drain_events(&mut self) -> Vec<CourtEvent> {
        std::mem::take(&mut self.events)
    }

    /// A round's computed adjudication phase at the wall-clock current
    /// term.
    pub fn adjudication_state(
        &self,
        dispute_id: DisputeId,
        round_id: RoundId,
    ) -> Result<AdjudicationState, DisputeError> {
        let dispute = self.dispute(dispute_id)?;
        let round = dispute.round(round_id).ok_or(DisputeError::UnknownRound {
            dispute: dispute_id,
            round: round_id,
        })?;
        let config = self.config.config_at(round.draft_term_id);
        Ok(adjudication_state_at(
            round,
            config,
            self.clock.current_term_id(),
        ))
    }

    // ── Clock ──────────────────────────────────────────────────────────

    /// Advance the term clock by up to `max_transitions` terms.
    pub fn heartbeat(&mut self, max_transitions: u64) -> Result<TermId, DisputeError> {
        let previous_term = self.clock.last_ensured_term_id();
        let current_term = self.clock.heartbeat(max_transitions)?;
        tracing::info!(%previous_term, %current_term, "heartbeat");
        self.events.push(CourtEvent::Heartbeat {
            previous_term,
            current_term,
        });
        Ok(current_term)
    }

    fn ensured_term(&self) -> Result<TermId, DisputeError> {
        Ok(self.clock.ensured_current_term()?)
    }

    // ── Governance and configuration ───────────────────────────────────

    /// Schedule a configuration change. Config governor only.
    pub fn schedule_config(
        &mut self,
        caller: AccountId,
        config: CourtConfig,
        effective_term: TermId,
    ) -> Result<(), DisputeError> {
        if caller != self.governance.config_governor {
            return Err(DisputeError::NotAuthorized {
                caller,
                role: "config",
            });
        }
        let current = self.clock.current_term_id();
        self.config.schedule(config, effective_term, current)?;
        tracing::info!(%effective_term, "config scheduled");
        self.events.push(CourtEvent::ConfigScheduled { effective_term });
        Ok(())
    }

    /// Hand the config governor role to another account.
    pub fn set_config_governor(
        &mut self,
        caller: AccountId,
        new_governor: AccountId,
    ) -> Result<(), DisputeError> {
        if caller != self.governance.config_governor {
            return Err(DisputeError::NotAuthorized {
                caller,
                role: "config",
            });
        }
        self.governance.config_governor = new_governor;
        Ok(())
    }

    /// Hand the funds governor role to another account.
    pub fn set_funds_governor(
        &mut self,
        caller: AccountId,
        new_governor: AccountId,
    ) -> Result<(), DisputeError> {
        if caller != self.governance.funds_governor {
            return Err(DisputeError::NotAuthorized {
                caller,
                role: "funds",
            });
        }
        self.governance.funds_governor = new_governor;
        Ok(())
    }

    /// Hand the modules governor role to another account.
    pub fn set_modules_governor(
        &mut self,
        caller: AccountId,
        new_governor: AccountId,
    ) -> Result<(), DisputeError> {
        if caller != self.governance.modules_governor {
            return Err(DisputeError::NotAuthorized {
                caller,
                role: "modules",
            });
        }
        self.governance.modules_governor = new_governor;
        Ok(())
    }

    // ── Guardian stake operations ──────────────────────────────────────

    /// Deposit stake for a guardian.
    pub fn stake(&mut self, guardian: AccountId, amount: TokenAmount) -> Result<(), DisputeError> {
        Ok(self.registry.stake(guardian, amount)?)
    }

    /// Withdraw available stake.
    pub fn unstake(
        &mut self,
        guardian: AccountId,
        amount: TokenAmount,
    ) -> Result<(), DisputeError> {
        let term = self.ensured_term()?;
        Ok(self.registry.unstake(guardian, term, amount)?)
    }

    /// Activate stake, effective next term.
    pub fn activate(
        &mut self,
        guardian: AccountId,
        amount: TokenAmount,
    ) -> Result<(), DisputeError> {
        let term = self.ensured_term()?;
        let min = self.config.config_at(term.next()).min_active_balance;
        Ok(self.registry.activate(guardian, term, amount, min)?)
    }

    /// Request deactivation, effective next term.
    pub fn deactivate(
        &mut self,
        guardian: AccountId,
        amount: TokenAmount,
    ) -> Result<(), DisputeError> {
        let term = self.ensured_term()?;
        let min = self.config.config_at(term.next()).min_active_balance;
        Ok(self.registry.deactivate(guardian, term, amount, min)?)
    }

    /// Toggle a standing representative authorization.
    pub fn set_representative(
        &mut self,
        guardian: AccountId,
        representative: AccountId,
        allowed: bool,
    ) {
        self.representatives
            .set_representative(guardian, representative, allowed);
    }

    /// Register a guardian's proxy-authorization verification key.
    pub fn register_signing_key(&mut self, guardian: AccountId, key: VerifyingKey) {
        self.representatives.register_signing_key(guardian, key);
    }

    // ── Dispute lifecycle ──────────────────────────────────────────────

    /// Open a dispute over `subject` with `possible_rulings` rulings.
    pub fn create_dispute(
        &mut self,
        creator: AccountId,
        subject: SubjectId,
        possible_rulings: u8,
    ) -> Result<DisputeId, DisputeError> {
        let term = self.ensured_term()?;
        if !(2..=MAX_POSSIBLE_RULINGS).contains(&possible_rulings) {
            return Err(DisputeError::InvalidPossibleRulings(possible_rulings));
        }
        let evidence_terms = self.config.config_at(term).evidence_terms;
        let draft_term = term.advance(evidence_terms);
        let config = *self.config.config_at(draft_term);
        let guardians_number = config.first_round_guardians_number;
        let guardian_fees = config.guardian_fee.checked_mul(guardians_number)?;

        let id = DisputeId::new(self.disputes.len() as u64);
        let round = AdjudicationRound::new(
            draft_term,
            guardians_number,
            guardian_fees,
            RoundFunding::Creator(creator),
            false,
        );
        self.disputes.push(Dispute {
            id,
            creator,
            subject,
            possible_rulings,
            state: DisputeState::PreDraft,
            final_ruling: None,
            ruling_notified: false,
            create_term_id: term,
            evidence: Vec::new(),
            rounds: vec![round],
        });
        tracing::info!(dispute = %id, %subject, possible_rulings, %draft_term, "dispute created");
        self.events.push(CourtEvent::DisputeCreated {
            dispute: id,
            subject,
            possible_rulings,
            draft_term,
        });
        Ok(id)
    }

    /// Record a piece of evidence for a dispute still in its evidence
    /// period.
    pub fn submit_evidence(
        &mut self,
        dispute_id: DisputeId,
        submitter: AccountId,
        digest: Digest,
    ) -> Result<(), DisputeError> {
        let index = self.dispute_index(dispute_id)?;
        let term = self.clock.current_term_id();
        let dispute = &self.disputes[index];
        if dispute.state != DisputeState::PreDraft
            || term >= dispute.rounds[0].draft_term_id
            || dispute.rounds[0].selected_seats > 0
        {
            return Err(DisputeError::EvidencePeriodClosed(dispute_id));
        }
        self.disputes[index].evidence.push(EvidenceItem {
            submitter,
            digest,
            term,
        });
        self.events.push(CourtEvent::EvidenceSubmitted {
            dispute: dispute_id,
            submitter,
        });
        Ok(())
    }

    /// Close the evidence period early, rescheduling round 0's draft to
    /// the next term.
    pub fn close_evidence_period(&mut self, dispute_id: DisputeId) -> Result<(), DisputeError> {
        let term = self.ensured_term()?;
        let index = self.dispute_index(dispute_id)?;
        let dispute = &self.disputes[index];
        let round = &dispute.rounds[0];
        let new_draft_term = term.next();
        if dispute.state != DisputeState::PreDraft
            || round.selected_seats > 0
            || new_draft_term >= round.draft_term_id
        {
            return Err(DisputeError::EvidencePeriodClosed(dispute_id));
        }
        // The round re-reads its parameters under the config effective at
        // the new, earlier draft term.
        let config = *self.config.config_at(new_draft_term);
        let guardians_number = config.first_round_guardians_number;
        let guardian_fees = config.guardian_fee.checked_mul(guardians_number)?;

        let round = &mut self.disputes[index].rounds[0];
        round.draft_term_id = new_draft_term;
        round.guardians_number = guardians_number;
        round.guardian_fees = guardian_fees;
        tracing::info!(dispute = %dispute_id, %new_draft_term, "evidence period closed");
        self.events.push(CourtEvent::EvidencePeriodClosed {
            dispute: dispute_id,
            new_draft_term,
        });
        Ok(())
    }

    /// Run one batch of the current round's guardian draft.
    pub fn draft(&mut self, dispute_id: DisputeId) -> Result<(), DisputeError> {
        let term = self.ensured_term()?;
        let index = self.dispute_index(dispute_id)?;

        let dispute = &self.disputes[index];
        let round_id = dispute.last_round_id();
        let round = dispute.last_round();
        if round.is_final || round.is_fully_drafted() {
            return Err(DisputeError::RoundAlreadyDrafted {
                dispute: dispute_id,
                round: round_id,
            });
        }
        if term < round.draft_term_id {
            return Err(DisputeError::DraftTermNotReached {
                dispute: dispute_id,
                draft_term: round.draft_term_id,
                current_term: term,
            });
        }
        let config = *self.config.config_at(round.draft_term_id);
        let remaining = round.guardians_number - round.selected_seats;
        let seats_requested = remaining.min(config.max_guardians_per_draft_batch);
        let prior_attempts = round.draft_attempts;
        let possible_rulings = dispute.possible_rulings;

        let entropy = self.clock.term_entropy(term)?;
        let outcome = self.registry.draft(&DraftParams {
            entropy,
            dispute_id,
            draft_term: term,
            current_term: term,
            seats_requested,
            prior_attempts,
            min_active_balance: config.min_active_balance,
            penalty_pct: config.penalty_pct,
        })?;

        let round = self.round_mut(index, round_id);
        round.delayed_terms = term.terms_since(round.draft_term_id);
        round.draft_attempts += outcome.attempts;
        round.selected_seats += outcome.seats.len() as u64;
        let mut drafted = Vec::with_capacity(outcome.seats.len());
        for seat in &outcome.seats {
            let entry = round
                .guardian_states
                .entry(seat.guardian)
                .or_insert(GuardianDraftEntry {
                    weight: 0,
                    locked: TokenAmount::ZERO,
                    rewarded: false,
                });
            if entry.weight == 0 {
                round.drafted_order.push(seat.guardian);
            }
            entry.weight += 1;
            entry.locked = entry.locked.checked_add(seat.locked)?;
            drafted.push((seat.guardian, entry.weight, seat.locked));
        }
        let fully_drafted = round.is_fully_drafted();

        for (guardian, weight, locked) in drafted {
            self.events.push(CourtEvent::GuardianDrafted {
                dispute: dispute_id,
                round: round_id,
                guardian,
                weight,
                locked,
            });
        }
        if fully_drafted {
            let dispute = &mut self.disputes[index];
            if dispute.state == DisputeState::PreDraft {
                dispute.state = DisputeState::Adjudicating;
                self.events.push(CourtEvent::DisputeStateChanged {
                    dispute: dispute_id,
                    state: DisputeState::Adjudicating,
                });
            }
            self.voting
                .create(VoteId::new(dispute_id, round_id), possible_rulings)?;
            tracing::info!(dispute = %dispute_id, round = %round_id, "round fully drafted");
        }
        Ok(())
    }

    // ── Voting ─────────────────────────────────────────────────────────

    /// Commit a hashed vote.
    pub fn commit_vote(
        &mut self,
        dispute_id: DisputeId,
        round_id: RoundId,
        voter: AccountId,
        commitment: Digest,
    ) -> Result<(), DisputeError> {
        self.commit_checked(dispute_id, round_id, voter, commitment)
    }

    /// Commit a hashed vote on a guardian's behalf, via the standing
    /// allow-list or a single-use signed authorization.
    pub fn commit_vote_on_behalf_of(
        &mut self,
        dispute_id: DisputeId,
        round_id: RoundId,
        guardian: AccountId,
        representative: AccountId,
        commitment: Digest,
        authorization: Option<&Signature>,
    ) -> Result<(), DisputeError> {
        if !self.representatives.is_allowed(&guardian, &representative) {
            let signature =
                authorization.ok_or(VotingError::RepresentativeNotAllowed {
                    guardian,
                    representative,
                })?;
            let vote = VoteId::new(dispute_id, round_id);
            self.representatives.verify_authorization(
                &vote,
                &guardian,
                &representative,
                &commitment,
                signature,
            )?;
        }
        self.commit_checked(dispute_id, round_id, guardian, commitment)
    }

    fn commit_checked(
        &mut self,
        dispute_id: DisputeId,
        round_id: RoundId,
        voter: AccountId,
        commitment: Digest,
    ) -> Result<(), DisputeError> {
        let term = self.ensured_term()?;
        let index = self.dispute_index(dispute_id)?;
        let round = self.round_ref(index, round_id, dispute_id)?;
        let config = *self.config.config_at(round.draft_term_id);
        self.require_state(
            dispute_id,
            round_id,
            round,
            &config,
            term,
            AdjudicationState::Committing,
        )?;
        let vote = VoteId::new(dispute_id, round_id);

        if round.is_final && round.guardian_state(&voter).is_none() {
            // First commit of a final-round participant: weigh them by
            // their draft-term balance and lock proportionally.
            let draft_term = round.draft_term_id;
            let balance = self.registry.active_balance_at(&voter, draft_term);
            let weight = final_round_weight(balance, config.min_active_balance)?;
            if weight == 0 {
                return Err(DisputeError::VoterWeightZero {
                    dispute: dispute_id,
                    round: round_id,
                    voter,
                });
            }
            // Check the ballot slot before locking so a doomed commit
            // leaves no lock behind.
            let record = self
                .voting
                .record(&vote)
                .ok_or(VotingError::UnknownVote(vote))?;
            if record.cast(&voter).is_some() {
                return Err(VotingError::AlreadyCommitted { vote, voter }.into());
            }
            let locked =
                self.registry
                    .lock_final_round(voter, term, draft_term, config.penalty_pct)?;
            let round = self.round_mut(index, round_id);
            round.guardian_states.insert(
                voter,
                GuardianDraftEntry {
                    weight,
                    locked,
                    rewarded: false,
                },
            );
            round.drafted_order.push(voter);
        } else if !round.is_final {
            let weight = round.guardian_state(&voter).map(|e| e.weight).unwrap_or(0);
            if weight == 0 {
                return Err(DisputeError::VoterWeightZero {
                    dispute: dispute_id,
                    round: round_id,
                    voter,
                });
            }
        }

        self.voting.commit(vote, voter, commitment)?;
        self.events.push(CourtEvent::VoteCommitted {
            dispute: dispute_id,
            round: round_id,
            voter,
        });
        Ok(())
    }

    /// Forfeit an un-revealed commitment by proving its contents.
    pub fn leak_vote(
        &mut self,
        dispute_id: DisputeId,
        round_id: RoundId,
        voter: AccountId,
        outcome: Outcome,
        salt: &[u8; 32],
    ) -> Result<(), DisputeError> {
        let term = self.ensured_term()?;
        let index = self.dispute_index(dispute_id)?;
        let round = self.round_ref(index, round_id, dispute_id)?;
        let config = *self.config.config_at(round.draft_term_id);
        let state = adjudication_state_at(round, &config, term);
        if state != AdjudicationState::Committing && state != AdjudicationState::Revealing {
            return Err(DisputeError::InvalidAdjudicationState {
                dispute: dispute_id,
                round: round_id,
                actual: state,
                expected: AdjudicationState::Committing,
            });
        }
        self.voting
            .leak(VoteId::new(dispute_id, round_id), voter, outcome, salt)?;
        self.events.push(CourtEvent::VoteLeaked {
            dispute: dispute_id,
            round: round_id,
            voter,
        });
        Ok(())
    }

    /// Reveal a committed vote, adding the voter's weight to the tally.
    pub fn reveal_vote(
        &mut self,
        dispute_id: DisputeId,
        round_id: RoundId,
        voter: AccountId,
        outcome: Outcome,
        salt: &[u8; 32],
    ) -> Result<(), DisputeError> {
        let term = self.ensured_term()?;
        let index = self.dispute_index(dispute_id)?;
        let round = self.round_ref(index, round_id, dispute_id)?;
        let config = *self.config.config_at(round.draft_term_id);
        self.require_state(
            dispute_id,
            round_id,
            round,
            &config,
            term,
            AdjudicationState::Revealing,
        )?;
        let weight = round.guardian_state(&voter).map(|e| e.weight).unwrap_or(0);
        if weight == 0 {
            return Err(DisputeError::VoterWeightZero {
                dispute: dispute_id,
                round: round_id,
                voter,
            });
        }
        self.voting
            .reveal(VoteId::new(dispute_id, round_id), voter, outcome, salt, weight)?;
        self.events.push(CourtEvent::VoteRevealed {
            dispute: dispute_id,
            round: round_id,
            voter,
            outcome,
            weight,
        });
        Ok(())
    }

    // ── Appeals ────────────────────────────────────────────────────────

    /// Appeal the current winning outcome of the latest round.
    pub fn create_appeal(
        &mut self,
        dispute_id: DisputeId,
        round_id: RoundId,
        appealer: AccountId,
        ruling: Outcome,
    ) -> Result<(), DisputeError> {
        let term = self.ensured_term()?;
        let index = self.dispute_index(dispute_id)?;
        self.require_latest_round(index, round_id, dispute_id)?;
        let round = self.round_ref(index, round_id, dispute_id)?;
        let config = *self.config.config_at(round.draft_term_id);
        self.require_state(
            dispute_id,
            round_id,
            round,
            &config,
            term,
            AdjudicationState::Appealing,
        )?;
        let vote = VoteId::new(dispute_id, round_id);
        if !self.voting.is_valid_outcome(&vote, ruling)? {
            return Err(DisputeError::InvalidRuling(ruling));
        }
        if ruling == self.voting.winning_outcome(&vote)? {
            return Err(DisputeError::SameRuling(ruling));
        }

        let next = self.next_round_details(index, round_id)?;
        let deposit = config.appeal_collateral_factor.of(next.guardian_fees)?;
        let round = self.round_mut(index, round_id);
        round.appeal = Some(Appeal {
            appealer,
            appealed_ruling: ruling,
            deposit,
            confirmer: None,
            opposed_ruling: None,
            confirm_deposit: TokenAmount::ZERO,
            settled: false,
        });
        tracing::info!(dispute = %dispute_id, round = %round_id, %ruling, "appeal created");
        self.events.push(CourtEvent::AppealCreated {
            dispute: dispute_id,
            round: round_id,
            appealer,
            ruling,
            deposit,
        });
        Ok(())
    }

    /// Confirm a raised appeal with an opposing ruling, creating the next
    /// round.
    pub fn confirm_appeal(
        &mut self,
        dispute_id: DisputeId,
        round_id: RoundId,
        confirmer: AccountId,
        ruling: Outcome,
    ) -> Result<(), DisputeError> {
        let term = self.ensured_term()?;
        let index = self.dispute_index(dispute_id)?;
        self.require_latest_round(index, round_id, dispute_id)?;
        let round = self.round_ref(index, round_id, dispute_id)?;
        let config = *self.config.config_at(round.draft_term_id);
        self.require_state(
            dispute_id,
            round_id,
            round,
            &config,
            term,
            AdjudicationState::ConfirmingAppeal,
        )?;
        let appeal = round.appeal.ok_or(DisputeError::NoAppeal {
            dispute: dispute_id,
            round: round_id,
        })?;
        let vote = VoteId::new(dispute_id, round_id);
        if !self.voting.is_valid_outcome(&vote, ruling)? {
            return Err(DisputeError::InvalidRuling(ruling));
        }
        if ruling == appeal.appealed_ruling {
            return Err(DisputeError::SameRuling(ruling));
        }

        let next = self.next_round_details(index, round_id)?;
        let confirm_deposit = config
            .appeal_confirm_collateral_factor
            .of(next.guardian_fees)?;
        let possible_rulings = self.disputes[index].possible_rulings;

        let dispute = &mut self.disputes[index];
        let round = &mut dispute.rounds[round_id.as_index()];
        let appeal = round.appeal.as_mut().ok_or(DisputeError::NoAppeal {
            dispute: dispute_id,
            round: round_id,
        })?;
        appeal.confirmer = Some(confirmer);
        appeal.opposed_ruling = Some(ruling);
        appeal.confirm_deposit = confirm_deposit;
        let appealer = appeal.appealer;

        dispute.rounds.push(AdjudicationRound::new(
            next.draft_term,
            next.guardians_number,
            next.guardian_fees,
            RoundFunding::Appeal {
                appealer,
                confirmer,
            },
            next.is_final,
        ));
        let new_round_id = dispute.last_round_id();

        if next.is_final {
            // The final round needs no draft; its ballot opens now.
            self.voting
                .create(VoteId::new(dispute_id, new_round_id), possible_rulings)?;
        }
        tracing::info!(
            dispute = %dispute_id,
            round = %round_id,
            next_round = %new_round_id,
            is_final = next.is_final,
            "appeal confirmed"
        );
        self.events.push(CourtEvent::AppealConfirmed {
            dispute: dispute_id,
            round: round_id,
            confirmer,
            ruling,
            deposit: confirm_deposit,
        });
        self.events.push(CourtEvent::RoundCreated {
            dispute: dispute_id,
            round: new_round_id,
            draft_term: next.draft_term,
            guardians_number: next.guardians_number,
            is_final: next.is_final,
        });
        Ok(())
    }

    // ── Ruling ─────────────────────────────────────────────────────────

    /// Compute (or fetch) the final ruling and notify the arbitrable
    /// collaborator exactly once.
    pub fn rule(
        &mut self,
        dispute_id: DisputeId,
        arbitrable: &mut dyn Arbitrable,
    ) -> Result<Outcome, DisputeError> {
        let term = self.ensured_term()?;
        let index = self.dispute_index(dispute_id)?;
        let ruling = self.ensure_final_ruling(index, term)?;
        let dispute = &mut self.disputes[index];
        if !dispute.ruling_notified {
            dispute.ruling_notified = true;
            arbitrable.rule(dispute_id, ruling);
            tracing::info!(dispute = %dispute_id, %ruling, "arbitrable notified");
        }
        Ok(ruling)
    }

    /// The final ruling, computing it if the last round just ended.
    pub fn compute_ruling(&mut self, dispute_id: DisputeId) -> Result<Outcome, DisputeError> {
        let term = self.ensured_term()?;
        let index = self.dispute_index(dispute_id)?;
        self.ensure_final_ruling(index, term)
    }

    // ── Settlement ─────────────────────────────────────────────────────

    /// Settle a batch of a round's guardian penalties.
    pub fn settle_penalties(
        &mut self,
        dispute_id: DisputeId,
        round_id: RoundId,
        batch_size: u64,
    ) -> Result<(), DisputeError> {
        if batch_size == 0 {
            return Err(DisputeError::ZeroBatchSize);
        }
        let term = self.ensured_term()?;
        let index = self.dispute_index(dispute_id)?;
        let final_ruling = self.ensure_final_ruling(index, term)?;

        let dispute = &self.disputes[index];
        let round = dispute.round(round_id).ok_or(DisputeError::UnknownRound {
            dispute: dispute_id,
            round: round_id,
        })?;
        if round.settled_penalties {
            return Err(DisputeError::PenaltiesAlreadySettled {
                dispute: dispute_id,
                round: round_id,
            });
        }
        if round_id != RoundId::FIRST
            && !dispute.rounds[round_id.as_index() - 1].settled_penalties
        {
            return Err(DisputeError::PreviousRoundNotSettled {
                dispute: dispute_id,
                round: round_id,
            });
        }
        let config = *self.config.config_at(round.draft_term_id);

        let vote = VoteId::new(dispute_id, round_id);
        let start = round.settle_cursor;
        let end = (start + batch_size as usize).min(round.drafted_order.len());
        let batch: Vec<AccountId> = round.drafted_order[start..end].to_vec();
        let mut settlements = Vec::with_capacity(batch.len());
        let mut coherent_delta: u64 = 0;
        for guardian in &batch {
            let entry = round
                .guardian_state(guardian)
                .copied()
                .ok_or(DisputeError::NotDrafted {
                    dispute: dispute_id,
                    round: round_id,
                    guardian: *guardian,
                })?;
            let coherent = self.voting.voted_for(&vote, guardian, final_ruling)?;
            if coherent {
                coherent_delta = coherent_delta
                    .checked_add(entry.weight)
                    .ok_or(conclave_core::ArithmeticError::Overflow)?;
            }
            settlements.push(LockSettlement {
                guardian: *guardian,
                amount: entry.locked,
                rewarded: coherent,
            });
        }

        let collected = self.registry.slash_or_unlock(term, &settlements)?;

        let round = self.round_mut(index, round_id);
        round.collected_tokens = round.collected_tokens.checked_add(collected)?;
        round.coherent_weight = round
            .coherent_weight
            .checked_add(coherent_delta)
            .ok_or(conclave_core::ArithmeticError::Overflow)?;
        round.settle_cursor = end;

        if end < round.drafted_order.len() {
            return Ok(());
        }
        round.settled_penalties = true;
        let collected_total = round.collected_tokens;
        let coherent_weight = round.coherent_weight;
        let guardian_fees = round.guardian_fees;
        let funding = round.funding;

        if coherent_weight == 0 {
            // Nobody voted for the final ruling: the collected stake is
            // burned and the round's fees return to whoever funded them.
            self.registry.burn_tokens(collected_total)?;
            match funding {
                RoundFunding::Creator(creator) => {
                    self.treasury
                        .assign(config.fee_token, creator, guardian_fees)?;
                }
                RoundFunding::Appeal {
                    appealer,
                    confirmer,
                } => {
                    let half = guardian_fees.checked_div(2)?;
                    self.treasury.assign(config.fee_token, appealer, half)?;
                    self.treasury.assign(
                        config.fee_token,
                        confirmer,
                        guardian_fees.checked_sub(half)?,
                    )?;
                }
            }
        }
        tracing::info!(
            dispute = %dispute_id,
            round = %round_id,
            collected = %collected_total,
            coherent_weight,
            "penalties settled"
        );
        self.events.push(CourtEvent::PenaltiesSettled {
            dispute: dispute_id,
            round: round_id,
            collected: collected_total,
            coherent_weight,
        });
        Ok(())
    }

    /// Settle one coherent guardian's reward for a round.
    pub fn settle_reward(
        &mut self,
        dispute_id: DisputeId,
        round_id: RoundId,
        guardian: AccountId,
    ) -> Result<(), DisputeError> {
        let index = self.dispute_index(dispute_id)?;
        let dispute = &self.disputes[index];
        let round = dispute.round(round_id).ok_or(DisputeError::UnknownRound {
            dispute: dispute_id,
            round: round_id,
        })?;
        if !round.settled_penalties {
            return Err(DisputeError::PenaltiesNotSettled {
                dispute: dispute_id,
                round: round_id,
            });
        }
        let entry = round
            .guardian_state(&guardian)
            .copied()
            .ok_or(DisputeError::NotDrafted {
                dispute: dispute_id,
                round: round_id,
                guardian,
            })?;
        let final_ruling = dispute.final_ruling.ok_or(DisputeError::PenaltiesNotSettled {
            dispute: dispute_id,
            round: round_id,
        })?;
        let vote = VoteId::new(dispute_id, round_id);
        if !self.voting.voted_for(&vote, &guardian, final_ruling)? {
            return Err(DisputeError::NotCoherent {
                dispute: dispute_id,
                round: round_id,
                guardian,
            });
        }
        if entry.rewarded {
            return Err(DisputeError::AlreadyRewarded {
                dispute: dispute_id,
                round: round_id,
                guardian,
            });
        }
        let config = *self.config.config_at(round.draft_term_id);
        let coherent_weight = round.coherent_weight;
        let reward_tokens = round
            .collected_tokens
            .checked_mul(entry.weight)?
            .checked_div(coherent_weight)?;
        let reward_fees = round
            .guardian_fees
            .checked_mul(entry.weight)?
            .checked_div(coherent_weight)?;

        let round = self.round_mut(index, round_id);
        let entry = round
            .guardian_states
            .get_mut(&guardian)
            .ok_or(DisputeError::NotDrafted {
                dispute: dispute_id,
                round: round_id,
                guardian,
            })?;
        entry.rewarded = true;

        self.registry.assign_tokens(guardian, reward_tokens)?;
        self.treasury.assign(config.fee_token, guardian, reward_fees)?;
        tracing::info!(
            dispute = %dispute_id,
            round = %round_id,
            %guardian,
            tokens = %reward_tokens,
            fees = %reward_fees,
            "reward settled"
        );
        self.events.push(CourtEvent::RewardSettled {
            dispute: dispute_id,
            round: round_id,
            guardian,
            tokens: reward_tokens,
            fees: reward_fees,
        });
        Ok(())
    }

    /// Settle a round's appeal deposits after its penalties.
    pub fn settle_appeal_deposit(
        &mut self,
        dispute_id: DisputeId,
        round_id: RoundId,
    ) -> Result<(), DisputeError> {
        let index = self.dispute_index(dispute_id)?;
        let dispute = &self.disputes[index];
        let round = dispute.round(round_id).ok_or(DisputeError::UnknownRound {
            dispute: dispute_id,
            round: round_id,
        })?;
        if !round.settled_penalties {
            return Err(DisputeError::PenaltiesNotSettled {
                dispute: dispute_id,
                round: round_id,
            });
        }
        let appeal = round.appeal.ok_or(DisputeError::NoAppeal {
            dispute: dispute_id,
            round: round_id,
        })?;
        if appeal.settled {
            return Err(DisputeError::AppealAlreadySettled {
                dispute: dispute_id,
                round: round_id,
            });
        }
        let config = *self.config.config_at(round.draft_term_id);
        let final_ruling = dispute.final_ruling.ok_or(DisputeError::PenaltiesNotSettled {
            dispute: dispute_id,
            round: round_id,
        })?;

        let mut credits: Vec<(AccountId, TokenAmount)> = Vec::with_capacity(2);
        match appeal.confirmer {
            // An unconfirmed appeal is refunded in full.
            None => credits.push((appeal.appealer, appeal.deposit)),
            Some(confirmer) => {
                let total = appeal.deposit.checked_add(appeal.confirm_deposit)?;
                // The next round's fees were already charged out of the
                // pooled deposits.
                let next_fees = dispute.rounds[round_id.as_index() + 1].guardian_fees;
                let pool = total.checked_sub(next_fees)?;
                if appeal.appealed_ruling == final_ruling {
                    credits.push((appeal.appealer, pool));
                } else if appeal.opposed_ruling == Some(final_ruling) {
                    credits.push((confirmer, pool));
                } else {
                    // Neither side matched the final ruling: each recovers
                    // its own deposit minus half the fees.
                    let half = next_fees.checked_div(2)?;
                    credits.push((appeal.appealer, appeal.deposit.checked_sub(half)?));
                    credits.push((
                        confirmer,
                        appeal
                            .confirm_deposit
                            .checked_sub(next_fees.checked_sub(half)?)?,
                    ));
                }
            }
        }

        let round = self.round_mut(index, round_id);
        if let Some(appeal) = round.appeal.as_mut() {
            appeal.settled = true;
        }
        for (owner, amount) in credits {
            self.treasury.assign(config.fee_token, owner, amount)?;
        }
        tracing::info!(dispute = %dispute_id, round = %round_id, "appeal deposit settled");
        self.events.push(CourtEvent::AppealDepositSettled {
            dispute: dispute_id,
            round: round_id,
        });
        Ok(())
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn dispute_index(&self, id: DisputeId) -> Result<usize, DisputeError> {
        let index = id.raw() as usize;
        if index >= self.disputes.len() {
            return Err(DisputeError::UnknownDispute(id));
        }
        Ok(index)
    }

    fn round_ref(
        &self,
        index: usize,
        round_id: RoundId,
        dispute_id: DisputeId,
    ) -> Result<&AdjudicationRound, DisputeError> {
        self.disputes[index]
            .round(round_id)
            .ok_or(DisputeError::UnknownRound {
                dispute: dispute_id,
                round: round_id,
            })
    }

    fn round_mut(&mut self, index: usize, round_id: RoundId) -> &mut AdjudicationRound {
        &mut self.disputes[index].rounds[round_id.as_index()]
    }

    fn require_latest_round(
        &self,
        index: usize,
        round_id: RoundId,
        dispute_id: DisputeId,
    ) -> Result<(), DisputeError> {
        if round_id != self.disputes[index].last_round_id() {
            return Err(DisputeError::RoundNotLatest {
                dispute: dispute_id,
                round: round_id,
            });
        }
        Ok(())
    }

    fn require_state(
        &self,
        dispute_id: DisputeId,
        round_id: RoundId,
        round: &AdjudicationRound,
        config: &CourtConfig,
        term: TermId,
        expected: AdjudicationState,
    ) -> Result<(), DisputeError> {
        let actual = adjudication_state_at(round, config, term);
        if actual != expected {
            return Err(DisputeError::InvalidAdjudicationState {
                dispute: dispute_id,
                round: round_id,
                actual,
                expected,
            });
        }
        Ok(())
    }

    /// Compute the final ruling once the last round has ended.
    fn ensure_final_ruling(
        &mut self,
        index: usize,
        term: TermId,
    ) -> Result<Outcome, DisputeError> {
        let dispute = &self.disputes[index];
        if let Some(ruling) = dispute.final_ruling {
            return Ok(ruling);
        }
        let dispute_id = dispute.id;
        let round_id = dispute.last_round_id();
        let round = dispute.last_round();
        let config = *self.config.config_at(round.draft_term_id);
        self.require_state(
            dispute_id,
            round_id,
            round,
            &config,
            term,
            AdjudicationState::Ended,
        )?;
        let ruling = match &round.appeal {
            // Appealed but never confirmed: the appealed ruling prevails.
            Some(appeal) if !appeal.is_confirmed() => appeal.appealed_ruling,
            _ => self
                .voting
                .winning_outcome(&VoteId::new(dispute_id, round_id))?,
        };
        let dispute = &mut self.disputes[index];
        dispute.final_ruling = Some(ruling);
        dispute.state = DisputeState::Ruled;
        tracing::info!(dispute = %dispute_id, %ruling, "final ruling computed");
        self.events.push(CourtEvent::RulingComputed {
            dispute: dispute_id,
            ruling,
        });
        self.events.push(CourtEvent::DisputeStateChanged {
            dispute: dispute_id,
            state: DisputeState::Ruled,
        });
        Ok(ruling)
    }

    /// Sizing of the round a confirmed appeal of `round_id` would create.
    fn next_round_details(
        &self,
        index: usize,
        round_id: RoundId,
    ) -> Result<NextRound, DisputeError> {
        let dispute = &self.disputes[index];
        let round = &dispute.rounds[round_id.as_index()];
        let current_config = self.config.config_at(round.draft_term_id);
        let draft_term = round.schedule_end(current_config);
        let next_config = self.config.config_at(draft_term);
        let next_id = round_id.next();

        if next_id.raw() >= next_config.max_regular_appeal_rounds {
            // The final round: every sufficiently staked guardian is
            // implicitly a juror, weighted by balance.
            let total = self.registry.total_active_at(draft_term);
            let scaled = total
                .raw()
                .checked_mul(u128::from(FINAL_ROUND_WEIGHT_PRECISION))
                .ok_or(conclave_core::ArithmeticError::Overflow)?;
            let guardians_number = u64::try_from(scaled / next_config.min_active_balance.raw())
                .map_err(|_| conclave_core::ArithmeticError::Overflow)?;
            let base_fees = next_config
                .guardian_fee
                .checked_mul(guardians_number)?
                .checked_div(FINAL_ROUND_WEIGHT_PRECISION)?;
            let guardian_fees = next_config
                .final_round_reduction
                .complement()
                .of(base_fees)?;
            Ok(NextRound {
                guardians_number,
                guardian_fees,
                draft_term,
                is_final: true,
            })
        } else {
            let mut guardians_number = round
                .guardians_number
                .checked_mul(next_config.appeal_step_factor)
                .ok_or(conclave_core::ArithmeticError::Overflow)?;
            // Even seat counts can tie; force odd.
            if guardians_number % 2 == 0 {
                guardians_number += 1;
            }
            let guardian_fees = next_config.guardian_fee.checked_mul(guardians_number)?;
            Ok(NextRound {
                guardians_number,
                guardian_fees,
                draft_term,
                is_final: false,
            })
        }
    }
}

/// A final-round participant's weight: their draft-term active balance in
/// units of the minimum active balance, scaled by
/// [`FINAL_ROUND_WEIGHT_PRECISION`].
fn final_round_weight(
    balance: TokenAmount,
    min_active_balance: TokenAmount,
) -> Result<u64, DisputeError> {
    if balance < min_active_balance {
        return Ok(0);
    }
    let scaled = balance
        .raw()
        .checked_mul(u128::from(FINAL_ROUND_WEIGHT_PRECISION))
        .ok_or(conclave_core::ArithmeticError::Overflow)?;
    u64::try_from(scaled / min_active_balance.raw())
        .map_err(|_| conclave_core::ArithmeticError::Overflow.into())
}
