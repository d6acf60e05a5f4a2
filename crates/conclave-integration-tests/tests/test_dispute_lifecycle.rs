//! End-to-end adjudication: stake → dispute → draft → commit → reveal →
//! ruling → settlement, with every idempotence guard exercised along the
//! way.

use std::sync::Arc;

use chrono::{Duration, Utc};

use conclave_clock::{ManualBlockOracle, ManualTimeOracle};
use conclave_core::{AccountId, DisputeId, RoundId, SubjectId, TokenAmount, TokenId};
use conclave_disputes::{
    AdjudicationState, Court, CourtConfig, CourtSettings, DisputeError, DisputeState,
    GovernanceConfig, MemoryTreasury, RecordingArbitrable,
};
use conclave_voting::{commitment_of, Outcome, VotingError};

fn term_len() -> Duration {
    Duration::hours(8)
}

fn config(fee_token: TokenId) -> CourtConfig {
    CourtConfig {
        fee_token,
        guardian_fee: TokenAmount::new(10),
        evidence_terms: 2,
        commit_terms: 2,
        reveal_terms: 2,
        appeal_terms: 2,
        appeal_confirmation_terms: 2,
        penalty_pct: conclave_core::Permyriad::new(1_000).unwrap(),
        final_round_reduction: conclave_core::Permyriad::new(5_000).unwrap(),
        first_round_guardians_number: 3,
        appeal_step_factor: 2,
        max_regular_appeal_rounds: 3,
        appeal_collateral_factor: conclave_core::CollateralFactor::new(20_000),
        appeal_confirm_collateral_factor: conclave_core::CollateralFactor::new(30_000),
        min_active_balance: TokenAmount::new(100),
        max_guardians_per_draft_batch: 10,
    }
}

struct Harness {
    time: Arc<ManualTimeOracle>,
    blocks: Arc<ManualBlockOracle>,
    court: Court<MemoryTreasury>,
    fee_token: TokenId,
}

fn harness() -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let start = Utc::now();
    let time = Arc::new(ManualTimeOracle::new(start));
    let blocks = Arc::new(ManualBlockOracle::new(1_000));
    let fee_token = TokenId::new();
    let governor = AccountId::new();
    let court = Court::new(
        CourtSettings {
            term_duration: term_len(),
            first_term_start: start + term_len(),
            entropy_window: 256,
            config: config(fee_token),
            governance: GovernanceConfig {
                funds_governor: governor,
                config_governor: governor,
                modules_governor: governor,
            },
        },
        time.clone(),
        blocks.clone(),
        MemoryTreasury::new(),
    )
    .unwrap();
    Harness {
        time,
        blocks,
        court,
        fee_token,
    }
}

impl Harness {
    fn advance(&mut self, terms: u64) {
        self.time.advance(term_len() * terms as i32);
        self.court.heartbeat(u64::MAX).unwrap();
        self.blocks.advance(2);
    }

    fn add_guardian(&mut self, stake: u128) -> AccountId {
        let guardian = AccountId::new();
        self.court.stake(guardian, TokenAmount::new(stake)).unwrap();
        self.court
            .activate(guardian, TokenAmount::new(stake))
            .unwrap();
        guardian
    }

    fn draft_all(&mut self, dispute: DisputeId) {
        while !self
            .court
            .dispute(dispute)
            .unwrap()
            .last_round()
            .is_fully_drafted()
        {
            self.court.draft(dispute).unwrap();
        }
    }
}

#[test]
fn full_unappealed_lifecycle_settles_conserving() {
    let mut h = harness();
    let creator = AccountId::new();
    let guardians: Vec<AccountId> = vec![
        h.add_guardian(1_000),
        h.add_guardian(600),
        h.add_guardian(400),
    ];
    let staked_before: u128 = h.court.registry().total_staked().raw();

    let dispute = h
        .court
        .create_dispute(creator, SubjectId::new(), 2)
        .unwrap();
    assert_eq!(
        h.court.dispute(dispute).unwrap().state,
        DisputeState::PreDraft
    );

    // Term 2 is the draft term (created at 0, evidence 2).
    h.advance(2);
    h.draft_all(dispute);
    assert_eq!(
        h.court.dispute(dispute).unwrap().state,
        DisputeState::Adjudicating
    );
    let round = h.court.dispute(dispute).unwrap().rounds[0].clone();
    let total_weight: u64 = round.guardian_states.values().map(|e| e.weight).sum();
    assert_eq!(total_weight, 3);
    for guardian in &round.drafted_order {
        assert!(guardians.contains(guardian));
    }

    // Everyone except the last drafted guardian votes A; the last one
    // never reveals (and is slashed for it) when there is more than one.
    let outcome_a = Outcome::for_ruling(1);
    let salt = [7u8; 32];
    let voters: Vec<AccountId> = round.drafted_order.clone();
    let (revealers, silent): (&[AccountId], &[AccountId]) = if voters.len() > 1 {
        voters.split_at(voters.len() - 1)
    } else {
        (&voters[..], &[])
    };
    for voter in revealers.iter().chain(silent.iter()) {
        h.court
            .commit_vote(dispute, RoundId::FIRST, *voter, commitment_of(outcome_a, &salt))
            .unwrap();
    }

    h.advance(2); // reveal phase
    for voter in revealers {
        h.court
            .reveal_vote(dispute, RoundId::FIRST, *voter, outcome_a, &salt)
            .unwrap();
        // A second reveal always fails, with no double count.
        assert!(matches!(
            h.court
                .reveal_vote(dispute, RoundId::FIRST, *voter, outcome_a, &salt),
            Err(DisputeError::Voting(VotingError::AlreadyRevealed { .. }))
        ));
    }

    h.advance(4); // through the appeal windows, round ends
    assert_eq!(
        h.court
            .adjudication_state(dispute, RoundId::FIRST)
            .unwrap(),
        AdjudicationState::Ended
    );

    // Ruling notification happens exactly once, repeat calls included.
    let mut arbitrable = RecordingArbitrable::new();
    assert_eq!(h.court.rule(dispute, &mut arbitrable).unwrap(), outcome_a);
    assert_eq!(h.court.rule(dispute, &mut arbitrable).unwrap(), outcome_a);
    assert_eq!(arbitrable.rulings.len(), 1);

    // Penalties settle in batches of one with no semantic difference.
    while !h.court.dispute(dispute).unwrap().rounds[0].settled_penalties {
        h.court
            .settle_penalties(dispute, RoundId::FIRST, 1)
            .unwrap();
    }
    assert!(matches!(
        h.court.settle_penalties(dispute, RoundId::FIRST, 1),
        Err(DisputeError::PenaltiesAlreadySettled { .. })
    ));

    let round = h.court.dispute(dispute).unwrap().rounds[0].clone();
    let coherent_weight: u64 = revealers
        .iter()
        .map(|g| round.guardian_states[g].weight)
        .sum();
    assert_eq!(round.coherent_weight, coherent_weight);

    // Conservation: what was slashed is exactly what was collected.
    let slashed: u128 = silent
        .iter()
        .map(|g| round.guardian_states[g].locked.raw())
        .sum();
    assert_eq!(round.collected_tokens.raw(), slashed);
    assert_eq!(h.court.registry().slashed_total().raw(), slashed);

    // Rewards: proportional payouts, distinct errors, no double payment.
    let outsider = AccountId::new();
    assert!(matches!(
        h.court.settle_reward(dispute, RoundId::FIRST, outsider),
        Err(DisputeError::NotDrafted { .. })
    ));
    let mut paid_tokens = 0u128;
    for guardian in revealers {
        let weight = round.guardian_states[guardian].weight;
        h.court
            .settle_reward(dispute, RoundId::FIRST, *guardian)
            .unwrap();
        assert!(matches!(
            h.court.settle_reward(dispute, RoundId::FIRST, *guardian),
            Err(DisputeError::AlreadyRewarded { .. })
        ));
        let expected_tokens =
            round.collected_tokens.raw() * u128::from(weight) / u128::from(coherent_weight);
        let expected_fees =
            round.guardian_fees.raw() * u128::from(weight) / u128::from(coherent_weight);
        assert_eq!(
            h.court.treasury().balance_of(&h.fee_token, guardian).raw(),
            expected_fees
        );
        paid_tokens += expected_tokens;
    }
    for guardian in silent {
        assert!(matches!(
            h.court.settle_reward(dispute, RoundId::FIRST, *guardian),
            Err(DisputeError::NotCoherent { .. })
        ));
    }

    // The pool never over-pays; the rounding remainder is bounded by the
    // number of coherent guardians.
    assert!(paid_tokens <= round.collected_tokens.raw());
    assert!(round.collected_tokens.raw() - paid_tokens < revealers.len().max(1) as u128);

    // System-wide stake: slashing removed `slashed`, rewards returned
    // `paid_tokens`.
    assert_eq!(
        h.court.registry().total_staked().raw(),
        staked_before - slashed + paid_tokens
    );
}

#[test]
fn evidence_period_gates_round_zero() {
    let mut h = harness();
    h.add_guardian(1_000);
    let creator = AccountId::new();
    let dispute = h
        .court
        .create_dispute(creator, SubjectId::new(), 2)
        .unwrap();

    // Drafting during the evidence period is rejected.
    assert!(matches!(
        h.court.draft(dispute),
        Err(DisputeError::DraftTermNotReached { .. })
    ));

    // Closing the evidence period pulls the draft term to the next term.
    h.court.close_evidence_period(dispute).unwrap();
    assert_eq!(
        h.court.dispute(dispute).unwrap().rounds[0].draft_term_id,
        conclave_core::TermId::new(1)
    );
    h.advance(1);
    h.court.draft(dispute).unwrap();
}

#[test]
fn commit_outside_commit_phase_rejected() {
    let mut h = harness();
    let guardian = h.add_guardian(1_000);
    let dispute = h
        .court
        .create_dispute(AccountId::new(), SubjectId::new(), 2)
        .unwrap();
    h.advance(2);
    h.draft_all(dispute);

    let commitment = commitment_of(Outcome::for_ruling(1), &[1u8; 32]);
    h.advance(2); // now revealing
    let err = h
        .court
        .commit_vote(dispute, RoundId::FIRST, guardian, commitment)
        .unwrap_err();
    assert!(matches!(
        err,
        DisputeError::InvalidAdjudicationState {
            expected: AdjudicationState::Committing,
            ..
        }
    ));
}

#[test]
fn leaked_commitment_is_forfeited_and_slashed() {
    let mut h = harness();
    let guardian = h.add_guardian(1_000);
    let dispute = h
        .court
        .create_dispute(AccountId::new(), SubjectId::new(), 2)
        .unwrap();
    h.advance(2);
    h.draft_all(dispute);

    let outcome = Outcome::for_ruling(2);
    let salt = [9u8; 32];
    h.court
        .commit_vote(dispute, RoundId::FIRST, guardian, commitment_of(outcome, &salt))
        .unwrap();
    // Anyone who knows (outcome, salt) can leak the vote pre-reveal.
    h.court
        .leak_vote(dispute, RoundId::FIRST, guardian, outcome, &salt)
        .unwrap();

    h.advance(2);
    // The leaked slot cannot be revealed.
    assert!(matches!(
        h.court
            .reveal_vote(dispute, RoundId::FIRST, guardian, outcome, &salt),
        Err(DisputeError::Voting(VotingError::AlreadyRevealed { .. }))
    ));

    h.advance(4);
    h.court.settle_penalties(dispute, RoundId::FIRST, 10).unwrap();
    let round = &h.court.dispute(dispute).unwrap().rounds[0];
    // Zero coherent weight: the tally is empty, so everything locked was
    // collected and burned.
    assert_eq!(round.coherent_weight, 0);
    assert_eq!(h.court.registry().burned(), round.collected_tokens);
}

#[test]
fn settlement_before_round_end_rejected() {
    let mut h = harness();
    h.add_guardian(1_000);
    let dispute = h
        .court
        .create_dispute(AccountId::new(), SubjectId::new(), 2)
        .unwrap();
    h.advance(2);
    h.draft_all(dispute);

    let err = h
        .court
        .settle_penalties(dispute, RoundId::FIRST, 10)
        .unwrap_err();
    assert!(matches!(
        err,
        DisputeError::InvalidAdjudicationState {
            expected: AdjudicationState::Ended,
            ..
        }
    ));
    assert!(matches!(
        h.court.settle_penalties(dispute, RoundId::FIRST, 0),
        Err(DisputeError::ZeroBatchSize)
    ));
}
