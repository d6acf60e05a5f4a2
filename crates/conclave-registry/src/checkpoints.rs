//! # Term-Checkpointed Values
//!
//! An append-only arena of `(term, value)` pairs with binary-search lookup.
//! Historical queries are O(log c) and past values are never mutated:
//! writing at a term earlier than the latest checkpoint is a hard error,
//! and writing at the same term overwrites in place (several balance
//! movements can land on the same effective term).

use serde::{Deserialize, Serialize};

use conclave_core::{TermId, TokenAmount};

use crate::error::RegistryError;

/// One recorded checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The term from which the value is effective.
    pub term: TermId,
    /// The value effective from `term` onward.
    pub value: TokenAmount,
}

/// An append-only history of term-stamped values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointHistory {
    points: Vec<Checkpoint>,
}

impl CheckpointHistory {
    /// An empty history; every query returns zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently recorded value, zero if none.
    pub fn latest(&self) -> TokenAmount {
        self.points.last().map(|p| p.value).unwrap_or(TokenAmount::ZERO)
    }

    /// The term of the most recent checkpoint, if any.
    pub fn latest_term(&self) -> Option<TermId> {
        self.points.last().map(|p| p.term)
    }

    /// The value effective at `term`: the latest checkpoint whose term is
    /// at or before it, zero if the history starts later.
    pub fn value_at(&self, term: TermId) -> TokenAmount {
        match self.points.binary_search_by(|p| p.term.cmp(&term)) {
            Ok(index) => self.points[index].value,
            Err(0) => TokenAmount::ZERO,
            Err(index) => self.points[index - 1].value,
        }
    }

    /// Record `value` effective from `term`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::CheckpointOutOfOrder`] when `term` precedes the
    /// latest recorded term.
    pub fn record(&mut self, term: TermId, value: TokenAmount) -> Result<(), RegistryError> {
        match self.points.last_mut() {
            Some(last) if last.term == term => {
                last.value = value;
                Ok(())
            }
            Some(last) if last.term > term => Err(RegistryError::CheckpointOutOfOrder {
                attempted: term,
                latest: last.term,
            }),
            _ => {
                self.points.push(Checkpoint { term, value });
                Ok(())
            }
        }
    }

    /// Number of recorded checkpoints.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(id: u64) -> TermId {
        TermId::new(id)
    }

    fn amt(raw: u128) -> TokenAmount {
        TokenAmount::new(raw)
    }

    #[test]
    fn empty_history_reads_zero() {
        let history = CheckpointHistory::new();
        assert_eq!(history.latest(), TokenAmount::ZERO);
        assert_eq!(history.value_at(t(100)), TokenAmount::ZERO);
        assert!(history.is_empty());
    }

    #[test]
    fn value_at_finds_latest_at_or_before() {
        let mut history = CheckpointHistory::new();
        history.record(t(2), amt(10)).unwrap();
        history.record(t(5), amt(30)).unwrap();
        history.record(t(9), amt(20)).unwrap();

        assert_eq!(history.value_at(t(1)), TokenAmount::ZERO);
        assert_eq!(history.value_at(t(2)), amt(10));
        assert_eq!(history.value_at(t(4)), amt(10));
        assert_eq!(history.value_at(t(5)), amt(30));
        assert_eq!(history.value_at(t(8)), amt(30));
        assert_eq!(history.value_at(t(9)), amt(20));
        assert_eq!(history.value_at(t(1_000)), amt(20));
    }

    #[test]
    fn same_term_overwrites_in_place() {
        let mut history = CheckpointHistory::new();
        history.record(t(3), amt(10)).unwrap();
        history.record(t(3), amt(25)).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.value_at(t(3)), amt(25));
    }

    #[test]
    fn out_of_order_write_rejected() {
        let mut history = CheckpointHistory::new();
        history.record(t(5), amt(10)).unwrap();
        let err = history.record(t(4), amt(99)).unwrap_err();
        assert!(matches!(err, RegistryError::CheckpointOutOfOrder { .. }));
        // The rejected write left nothing behind.
        assert_eq!(history.value_at(t(4)), TokenAmount::ZERO);
        assert_eq!(history.value_at(t(5)), amt(10));
    }

    #[test]
    fn latest_tracks_last_record() {
        let mut history = CheckpointHistory::new();
        history.record(t(1), amt(7)).unwrap();
        history.record(t(8), amt(3)).unwrap();
        assert_eq!(history.latest(), amt(3));
        assert_eq!(history.latest_term(), Some(t(8)));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// A history built from sorted (term, value) writes answers
            /// every historical query like a naive scan would.
            #[test]
            fn value_at_matches_naive_scan(
                mut writes in proptest::collection::vec((0u64..500, 0u128..1_000_000), 1..40),
                queries in proptest::collection::vec(0u64..600, 1..20),
            ) {
                writes.sort_by_key(|(term, _)| *term);
                let mut history = CheckpointHistory::new();
                for (term, value) in &writes {
                    history.record(t(*term), amt(*value)).unwrap();
                }
                for q in queries {
                    let expected = writes
                        .iter()
                        .filter(|(term, _)| *term <= q)
                        .next_back()
                        .map(|(_, value)| amt(*value))
                        .unwrap_or(TokenAmount::ZERO);
                    prop_assert_eq!(history.value_at(t(q)), expected);
                }
            }
        }
    }
}
