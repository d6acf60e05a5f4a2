//! # The Term Clock
//!
//! Protocol time as an append-only sequence of fixed-duration terms.
//! Term 0 is the genesis term, dated one duration before the configured
//! first term start so that the clock transitions to term 1 exactly at
//! that start time.
//!
//! ## Entropy
//!
//! Each term created by a heartbeat records the *next* block height as its
//! entropy source; the entropy value itself resolves lazily on first
//! access, and only while the source block is at most `entropy_window`
//! blocks behind the chain head. Outside that window the term's entropy is
//! permanently unavailable and drafting must wait for a later term.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use conclave_core::{Entropy, TermId, Timestamp};

use crate::error::ClockError;
use crate::oracle::{BlockOracle, TimeOracle};

/// Default entropy freshness window, in blocks.
pub const DEFAULT_ENTROPY_WINDOW: u64 = 256;

/// One protocol term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Term {
    /// The term number.
    pub id: TermId,
    /// When the term starts.
    pub start_time: Timestamp,
    /// The block whose hash seeds this term's entropy.
    pub entropy_source_block: u64,
    /// The resolved entropy value, if it has been computed in time.
    pub entropy: Option<Entropy>,
}

/// The term clock.
///
/// All mutation happens through [`heartbeat`](TermClock::heartbeat); every
/// other method is a read or a lazy entropy resolution. The clock never
/// advances implicitly.
pub struct TermClock {
    term_duration: Duration,
    entropy_window: u64,
    time: Arc<dyn TimeOracle>,
    blocks: Arc<dyn BlockOracle>,
    terms: Vec<Term>,
}

impl std::fmt::Debug for TermClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermClock")
            .field("term_duration", &self.term_duration)
            .field("entropy_window", &self.entropy_window)
            .field("last_ensured", &self.last_ensured_term_id())
            .finish()
    }
}

impl TermClock {
    /// Create a clock whose first real term starts at `first_term_start`.
    ///
    /// # Errors
    ///
    /// [`ClockError::ZeroTermDuration`] for a non-positive duration;
    /// [`ClockError::FirstTermStartInPast`] if the start time is before the
    /// oracle's current time.
    pub fn new(
        term_duration: Duration,
        first_term_start: DateTime<Utc>,
        time: Arc<dyn TimeOracle>,
        blocks: Arc<dyn BlockOracle>,
        entropy_window: u64,
    ) -> Result<Self, ClockError> {
        if term_duration <= Duration::zero() {
            return Err(ClockError::ZeroTermDuration);
        }
        if first_term_start < time.now() {
            return Err(ClockError::FirstTermStartInPast);
        }
        let genesis = Term {
            id: TermId::ZERO,
            start_time: Timestamp::from_datetime(first_term_start - term_duration),
            entropy_source_block: blocks.height(),
            entropy: None,
        };
        Ok(Self {
            term_duration,
            entropy_window,
            time,
            blocks,
            terms: vec![genesis],
        })
    }

    /// The fixed duration of every term.
    pub fn term_duration(&self) -> Duration {
        self.term_duration
    }

    /// The configured entropy freshness window, in blocks.
    pub fn entropy_window(&self) -> u64 {
        self.entropy_window
    }

    /// The highest term id a heartbeat has ensured.
    pub fn last_ensured_term_id(&self) -> TermId {
        self.terms
            .last()
            .map(|t| t.id)
            .unwrap_or(TermId::ZERO)
    }

    /// A term's record, if it has been ensured.
    pub fn term(&self, id: TermId) -> Option<&Term> {
        self.terms.get(id.raw() as usize)
    }

    /// Number of terms elapsed since the last ensured term, derived from
    /// wall-clock time. Zero while the clock is current.
    pub fn needed_transitions(&self) -> u64 {
        let genesis_start = *self.terms[0].start_time.as_datetime();
        let elapsed = self.time.now() - genesis_start;
        if elapsed < Duration::zero() {
            return 0;
        }
        let total = (elapsed.num_seconds() / self.term_duration.num_seconds()) as u64;
        total.saturating_sub(self.last_ensured_term_id().raw())
    }

    /// The term the wall clock is currently in, whether or not it has been
    /// ensured yet.
    pub fn current_term_id(&self) -> TermId {
        self.last_ensured_term_id().advance(self.needed_transitions())
    }

    /// Advance the clock by up to `max_transitions` terms.
    ///
    /// Each new term records its start time and entropy source block; the
    /// entropy value itself is not resolved here.
    ///
    /// # Errors
    ///
    /// [`ClockError::ZeroMaxTransitions`] when `max_transitions == 0`;
    /// [`ClockError::NoTransitionsNeeded`] when the clock is already
    /// current.
    pub fn heartbeat(&mut self, max_transitions: u64) -> Result<TermId, ClockError> {
        if max_transitions == 0 {
            return Err(ClockError::ZeroMaxTransitions);
        }
        let needed = self.needed_transitions();
        if needed == 0 {
            return Err(ClockError::NoTransitionsNeeded);
        }
        let transitions = needed.min(max_transitions);
        for _ in 0..transitions {
            let last = self.terms.last().expect("clock always has a genesis term");
            let term = Term {
                id: last.id.next(),
                start_time: Timestamp::from_datetime(
                    *last.start_time.as_datetime() + self.term_duration,
                ),
                entropy_source_block: self.blocks.height() + 1,
                entropy: None,
            };
            tracing::debug!(term = %term.id, source_block = term.entropy_source_block, "term ensured");
            self.terms.push(term);
        }
        Ok(self.last_ensured_term_id())
    }

    /// The current term id, provided the clock is fully heartbeat-ed.
    ///
    /// This is the gate every time-sensitive operation goes through; the
    /// clock never self-advances on behalf of a caller.
    ///
    /// # Errors
    ///
    /// [`ClockError::TermOutdated`] when transitions are pending.
    pub fn ensured_current_term(&self) -> Result<TermId, ClockError> {
        let pending = self.needed_transitions();
        if pending > 0 {
            return Err(ClockError::TermOutdated { pending });
        }
        Ok(self.last_ensured_term_id())
    }

    /// Resolve (and cache) the entropy value for an ensured term.
    ///
    /// The value is the hash of the term's source block, readable only
    /// while `source_block < height <= source_block + window`.
    ///
    /// # Errors
    ///
    /// [`ClockError::TermNotEnsured`] for unknown terms;
    /// [`ClockError::EntropyNotReady`] before the source block is mined;
    /// [`ClockError::EntropyExpired`] once the window has passed.
    pub fn term_entropy(&mut self, id: TermId) -> Result<Entropy, ClockError> {
        let index = id.raw() as usize;
        let window = self.entropy_window;
        let current_height = self.blocks.height();
        let term = self
            .terms
            .get_mut(index)
            .ok_or(ClockError::TermNotEnsured(id))?;
        if let Some(entropy) = term.entropy {
            return Ok(entropy);
        }
        let source_block = term.entropy_source_block;
        if current_height <= source_block {
            return Err(ClockError::EntropyNotReady {
                term: id,
                source_block,
                current_height,
            });
        }
        if current_height > source_block + window {
            return Err(ClockError::EntropyExpired {
                term: id,
                source_block,
                current_height,
                window,
            });
        }
        let hash = self
            .blocks
            .block_hash(source_block)
            .ok_or(ClockError::BlockHashUnavailable(source_block))?;
        let entropy = Entropy(hash);
        term.entropy = Some(entropy);
        Ok(entropy)
    }
}
