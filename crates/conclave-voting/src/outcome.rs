//! # Vote Outcomes
//!
//! The outcome space is a compact `u8` with three reserved values at the
//! bottom: `MISSING` (no reveal), `LEAKED` (commitment forfeited before
//! reveal), and `REFUSED` (an explicit refusal to rule, which *is* a
//! votable outcome). Real rulings start immediately above `REFUSED`, so a
//! dispute with `n` possible rulings spans `REFUSED ..= REFUSED + n`.

use serde::{Deserialize, Serialize};

/// A vote outcome.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Outcome(u8);

impl Outcome {
    /// No outcome: the voter never revealed.
    pub const MISSING: Outcome = Outcome(0);
    /// The commitment was leaked and forfeited before the reveal phase.
    pub const LEAKED: Outcome = Outcome(1);
    /// An explicit refusal to rule. Votable, and the default leader.
    pub const REFUSED: Outcome = Outcome(2);

    /// Wrap a raw outcome value.
    pub fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// The outcome standing for ruling `n` (1-based).
    pub fn for_ruling(n: u8) -> Self {
        Self(Self::REFUSED.0.saturating_add(n))
    }

    /// The highest votable outcome for a dispute with `possible_rulings`
    /// rulings.
    pub fn max_for(possible_rulings: u8) -> Self {
        Self(Self::REFUSED.0.saturating_add(possible_rulings))
    }

    /// The raw outcome value.
    pub fn raw(&self) -> u8 {
        self.0
    }

    /// Whether this is one of the unrevealable sentinels
    /// (`MISSING`/`LEAKED`).
    pub fn is_sentinel(&self) -> bool {
        *self < Self::REFUSED
    }

    /// Whether the outcome can be committed and revealed in a ballot whose
    /// highest outcome is `max`.
    pub fn is_votable(&self, max: Outcome) -> bool {
        *self >= Self::REFUSED && *self <= max
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::MISSING => write!(f, "missing"),
            Self::LEAKED => write!(f, "leaked"),
            Self::REFUSED => write!(f, "refused"),
            Self(raw) => write!(f, "ruling:{}", raw - Self::REFUSED.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_values_are_fixed() {
        assert_eq!(Outcome::MISSING.raw(), 0);
        assert_eq!(Outcome::LEAKED.raw(), 1);
        assert_eq!(Outcome::REFUSED.raw(), 2);
    }

    #[test]
    fn sentinels_are_not_votable() {
        let max = Outcome::max_for(2);
        assert!(!Outcome::MISSING.is_votable(max));
        assert!(!Outcome::LEAKED.is_votable(max));
        assert!(Outcome::MISSING.is_sentinel());
        assert!(Outcome::LEAKED.is_sentinel());
        assert!(!Outcome::REFUSED.is_sentinel());
    }

    #[test]
    fn refusal_and_rulings_are_votable() {
        let max = Outcome::max_for(2);
        assert!(Outcome::REFUSED.is_votable(max));
        assert!(Outcome::for_ruling(1).is_votable(max));
        assert!(Outcome::for_ruling(2).is_votable(max));
        assert!(!Outcome::for_ruling(3).is_votable(max));
    }

    #[test]
    fn display_names() {
        assert_eq!(format!("{}", Outcome::MISSING), "missing");
        assert_eq!(format!("{}", Outcome::LEAKED), "leaked");
        assert_eq!(format!("{}", Outcome::REFUSED), "refused");
        assert_eq!(format!("{}", Outcome::for_ruling(1)), "ruling:1");
    }

    #[test]
    fn ordering_matches_raw_values() {
        assert!(Outcome::REFUSED < Outcome::for_ruling(1));
        assert!(Outcome::for_ruling(1) < Outcome::for_ruling(2));
    }
}
