//! # Temporal Types
//!
//! The engine's discrete clock unit ([`TermId`]) and a UTC-only wall-clock
//! timestamp ([`Timestamp`]).
//!
//! ## Design Decision
//!
//! All time-gated protocol logic is expressed in terms, never in wall-clock
//! durations: wall time enters the system in exactly one place (the term
//! clock's heartbeat) and is converted to term ids there. Everything
//! downstream compares term ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A term number: the protocol's discrete unit of time.
///
/// Term 0 is the genesis term that exists from construction; term ids only
/// ever increase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct TermId(u64);

impl TermId {
    /// The genesis term.
    pub const ZERO: TermId = TermId(0);

    /// Wrap a raw term number.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw term number.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// The term immediately after this one.
    pub fn next(&self) -> TermId {
        TermId(self.0.saturating_add(1))
    }

    /// The term `terms` after this one, saturating at the representable
    /// maximum. Term schedules never get close to the limit in practice.
    pub fn advance(&self, terms: u64) -> TermId {
        TermId(self.0.saturating_add(terms))
    }

    /// How many terms have elapsed since `earlier`; zero if `earlier` is
    /// not actually earlier.
    pub fn terms_since(&self, earlier: TermId) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::fmt::Display for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "term:{}", self.0)
    }
}

/// A UTC timestamp with second-level precision.
///
/// Serializes to ISO 8601 with a `Z` suffix. Local time conversion is a
/// presentation concern outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Access the underlying `chrono::DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_id_next_and_advance() {
        let t = TermId::new(5);
        assert_eq!(t.next(), TermId::new(6));
        assert_eq!(t.advance(10), TermId::new(15));
        assert_eq!(t.advance(0), t);
    }

    #[test]
    fn term_id_terms_since() {
        assert_eq!(TermId::new(10).terms_since(TermId::new(4)), 6);
        assert_eq!(TermId::new(4).terms_since(TermId::new(10)), 0);
        assert_eq!(TermId::ZERO.terms_since(TermId::ZERO), 0);
    }

    #[test]
    fn term_id_ordering() {
        assert!(TermId::new(1) < TermId::new(2));
        assert!(TermId::ZERO < TermId::new(1));
    }

    #[test]
    fn term_id_display() {
        assert_eq!(format!("{}", TermId::new(9)), "term:9");
    }

    #[test]
    fn timestamp_display_is_iso_8601_z() {
        let dt = DateTime::parse_from_rfc3339("2026-01-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            format!("{}", Timestamp::from_datetime(dt)),
            "2026-01-15T12:00:00Z"
        );
    }
}
