//! # Court Configuration and Governance
//!
//! A versioned set of adjudication parameters. Configurations are scheduled
//! per term and looked up by "latest effective at or before term t", so a
//! round always reads the parameters that were in force at its draft term —
//! including long after later reconfigurations.
//!
//! ## Scheduling Rules
//!
//! A new configuration can only take effect at the current term or later,
//! and scheduling at or before an already-pending entry overwrites it.
//! History is never rewritten below the current term.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use conclave_core::{AccountId, CollateralFactor, Permyriad, TermId, TokenAmount, TokenId};

/// Weight precision for the final round: a guardian holding exactly the
/// minimum active balance carries this much weight.
pub const FINAL_ROUND_WEIGHT_PRECISION: u64 = 1_000;

/// The full adjudication parameter tuple effective from some term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtConfig {
    /// The token adjudication fees and deposits are denominated in.
    pub fee_token: TokenId,
    /// Fee paid per drafted guardian seat and per unit of final-round
    /// weight (scaled by [`FINAL_ROUND_WEIGHT_PRECISION`]).
    pub guardian_fee: TokenAmount,

    /// Maximum evidence period, in terms; round 0 drafts after it.
    pub evidence_terms: u64,
    /// Commit phase duration, in terms.
    pub commit_terms: u64,
    /// Reveal phase duration, in terms.
    pub reveal_terms: u64,
    /// Appeal window duration, in terms.
    pub appeal_terms: u64,
    /// Appeal confirmation window duration, in terms.
    pub appeal_confirmation_terms: u64,

    /// Share of the minimum active balance locked per drafted seat, and of
    /// a guardian's own balance in the final round.
    pub penalty_pct: Permyriad,
    /// Discount applied to final-round guardian fees.
    pub final_round_reduction: Permyriad,

    /// Seats in round 0.
    pub first_round_guardians_number: u64,
    /// Geometric growth factor for appeal round sizing.
    pub appeal_step_factor: u64,
    /// Number of drafted rounds before the final round.
    pub max_regular_appeal_rounds: u64,
    /// Appeal deposit as a per-myriad multiple of the next round's fees.
    pub appeal_collateral_factor: CollateralFactor,
    /// Confirmation deposit as a per-myriad multiple of the next round's
    /// fees.
    pub appeal_confirm_collateral_factor: CollateralFactor,

    /// Minimum active balance to be drafted or weighted.
    pub min_active_balance: TokenAmount,
    /// Seat cap per draft call.
    pub max_guardians_per_draft_batch: u64,
}

impl CourtConfig {
    /// Validate internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.commit_terms == 0
            || self.reveal_terms == 0
            || self.appeal_terms == 0
            || self.appeal_confirmation_terms == 0
        {
            return Err(ConfigError::ZeroPhaseDuration);
        }
        if self.first_round_guardians_number == 0 {
            return Err(ConfigError::ZeroFirstRoundGuardians);
        }
        if self.appeal_step_factor < 2 {
            return Err(ConfigError::AppealStepTooSmall(self.appeal_step_factor));
        }
        if self.min_active_balance.is_zero() {
            return Err(ConfigError::ZeroMinActiveBalance);
        }
        if self.max_guardians_per_draft_batch == 0 {
            return Err(ConfigError::ZeroDraftBatch);
        }
        Ok(())
    }
}

/// Configuration validation and scheduling errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Commit, reveal, appeal and confirmation phases all need at least
    /// one term.
    #[error("adjudication phase durations must be positive")]
    ZeroPhaseDuration,

    /// Round 0 needs at least one seat.
    #[error("first round guardians number must be positive")]
    ZeroFirstRoundGuardians,

    /// Appeal rounds must grow.
    #[error("appeal step factor {0} must be at least 2")]
    AppealStepTooSmall(u64),

    /// A zero minimum active balance breaks final-round weighting.
    #[error("minimum active balance must be positive")]
    ZeroMinActiveBalance,

    /// Draft batches need at least one seat.
    #[error("draft batch size must be positive")]
    ZeroDraftBatch,

    /// Configurations only take effect at the current term or later.
    #[error("config cannot be scheduled for past {effective} (current {current})")]
    ScheduledInPast {
        /// The rejected effective term.
        effective: TermId,
        /// The current term.
        current: TermId,
    },
}

/// Term-scheduled configuration history.
///
/// Entries are kept forever so historical rounds can always be
/// reconstructed against the parameters they ran under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigHistory {
    /// Sorted ascending by effective term; the first entry is the genesis
    /// configuration at term 0.
    entries: Vec<(TermId, CourtConfig)>,
}

impl ConfigHistory {
    /// Start a history with `genesis` effective from term 0.
    pub fn new(genesis: CourtConfig) -> Result<Self, ConfigError> {
        genesis.validate()?;
        Ok(Self {
            entries: vec![(TermId::ZERO, genesis)],
        })
    }

    /// The configuration effective at `term`: the latest entry whose
    /// effective term is at or before it.
    pub fn config_at(&self, term: TermId) -> &CourtConfig {
        let index = self
            .entries
            .partition_point(|(effective, _)| *effective <= term);
        // index >= 1 always: the genesis entry is effective from term 0.
        &self.entries[index - 1].1
    }

    /// Schedule `config` to take effect at `effective` (>= `current`).
    /// Pending entries at or after `effective` are overwritten.
    pub fn schedule(
        &mut self,
        config: CourtConfig,
        effective: TermId,
        current: TermId,
    ) -> Result<(), ConfigError> {
        config.validate()?;
        if effective < current {
            return Err(ConfigError::ScheduledInPast { effective, current });
        }
        self.entries.retain(|(term, _)| *term < effective);
        self.entries.push((effective, config));
        Ok(())
    }

    /// All entries, for indexers.
    pub fn entries(&self) -> &[(TermId, CourtConfig)] {
        &self.entries
    }
}

/// The three governance roles, injected at construction and mutated only
/// through the court's audited setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// May recover mis-assigned funds (held by external collaborators).
    pub funds_governor: AccountId,
    /// May schedule configuration changes.
    pub config_governor: AccountId,
    /// May re-wire module implementations (held for collaborators).
    pub modules_governor: AccountId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CourtConfig {
        CourtConfig {
            fee_token: TokenId::new(),
            guardian_fee: TokenAmount::new(10),
            evidence_terms: 5,
            commit_terms: 2,
            reveal_terms: 2,
            appeal_terms: 2,
            appeal_confirmation_terms: 2,
            penalty_pct: Permyriad::new(1_000).unwrap(),
            final_round_reduction: Permyriad::new(5_000).unwrap(),
            first_round_guardians_number: 3,
            appeal_step_factor: 2,
            max_regular_appeal_rounds: 3,
            appeal_collateral_factor: CollateralFactor::new(20_000),
            appeal_confirm_collateral_factor: CollateralFactor::new(30_000),
            min_active_balance: TokenAmount::new(100),
            max_guardians_per_draft_batch: 10,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn zero_phase_duration_rejected() {
        let mut cfg = config();
        cfg.reveal_terms = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroPhaseDuration));
    }

    #[test]
    fn small_step_factor_rejected() {
        let mut cfg = config();
        cfg.appeal_step_factor = 1;
        assert_eq!(cfg.validate(), Err(ConfigError::AppealStepTooSmall(1)));
    }

    #[test]
    fn lookup_returns_latest_at_or_before() {
        let mut history = ConfigHistory::new(config()).unwrap();
        let mut v2 = config();
        v2.guardian_fee = TokenAmount::new(20);
        history.schedule(v2, TermId::new(10), TermId::new(3)).unwrap();

        assert_eq!(history.config_at(TermId::new(9)).guardian_fee, TokenAmount::new(10));
        assert_eq!(history.config_at(TermId::new(10)).guardian_fee, TokenAmount::new(20));
        assert_eq!(history.config_at(TermId::new(99)).guardian_fee, TokenAmount::new(20));
    }

    #[test]
    fn scheduling_in_past_rejected() {
        let mut history = ConfigHistory::new(config()).unwrap();
        let err = history
            .schedule(config(), TermId::new(2), TermId::new(3))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ScheduledInPast { .. }));
    }

    #[test]
    fn scheduling_at_current_term_allowed() {
        let mut history = ConfigHistory::new(config()).unwrap();
        assert!(history
            .schedule(config(), TermId::new(3), TermId::new(3))
            .is_ok());
    }

    #[test]
    fn earlier_schedule_overwrites_pending() {
        let mut history = ConfigHistory::new(config()).unwrap();
        let mut v2 = config();
        v2.guardian_fee = TokenAmount::new(20);
        let mut v3 = config();
        v3.guardian_fee = TokenAmount::new(30);

        history.schedule(v2, TermId::new(10), TermId::new(3)).unwrap();
        // Scheduling earlier than the pending entry replaces it entirely.
        history.schedule(v3, TermId::new(8), TermId::new(3)).unwrap();

        assert_eq!(history.config_at(TermId::new(8)).guardian_fee, TokenAmount::new(30));
        assert_eq!(history.config_at(TermId::new(10)).guardian_fee, TokenAmount::new(30));
        assert_eq!(history.entries().len(), 2);
    }

    #[test]
    fn multiple_future_schedules_coexist() {
        let mut history = ConfigHistory::new(config()).unwrap();
        let mut v2 = config();
        v2.guardian_fee = TokenAmount::new(20);
        let mut v3 = config();
        v3.guardian_fee = TokenAmount::new(30);

        history.schedule(v2, TermId::new(8), TermId::new(3)).unwrap();
        history.schedule(v3, TermId::new(12), TermId::new(3)).unwrap();

        assert_eq!(history.config_at(TermId::new(8)).guardian_fee, TokenAmount::new(20));
        assert_eq!(history.config_at(TermId::new(11)).guardian_fee, TokenAmount::new(20));
        assert_eq!(history.config_at(TermId::new(12)).guardian_fee, TokenAmount::new(30));
    }
}
