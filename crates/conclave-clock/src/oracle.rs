//! # Time and Block Oracles
//!
//! The clock's two external inputs — wall-clock time and chain block data —
//! are modeled as explicit traits so the engine runs identically against
//! the real world and against deterministic test fixtures.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use conclave_core::sha256;

/// Source of the current wall-clock time.
pub trait TimeOracle: Send + Sync {
    /// The current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Source of chain block height and block hashes.
pub trait BlockOracle: Send + Sync {
    /// The current chain height.
    fn height(&self) -> u64;

    /// The hash of a mined block, or `None` if the block is not yet mined.
    fn block_hash(&self, height: u64) -> Option<[u8; 32]>;
}

/// The production time oracle: `Utc::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeOracle;

impl TimeOracle for SystemTimeOracle {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven time oracle for tests: time moves only when the test
/// advances it.
#[derive(Debug)]
pub struct ManualTimeOracle {
    now: Mutex<DateTime<Utc>>,
}

impl ManualTimeOracle {
    /// Create an oracle frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("time oracle lock poisoned") = now;
    }

    /// Advance by a duration.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("time oracle lock poisoned");
        *now += by;
    }
}

impl TimeOracle for ManualTimeOracle {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("time oracle lock poisoned")
    }
}

/// A manually driven block oracle for tests.
///
/// Block hashes are derived deterministically from the height, so a test
/// that replays the same block schedule sees the same entropy.
#[derive(Debug)]
pub struct ManualBlockOracle {
    height: Mutex<u64>,
}

impl ManualBlockOracle {
    /// Create an oracle at the given starting height.
    pub fn new(height: u64) -> Self {
        Self {
            height: Mutex::new(height),
        }
    }

    /// Mine `blocks` new blocks.
    pub fn advance(&self, blocks: u64) {
        let mut height = self.height.lock().expect("block oracle lock poisoned");
        *height = height.saturating_add(blocks);
    }

    /// Jump to an absolute height.
    pub fn set_height(&self, height: u64) {
        *self.height.lock().expect("block oracle lock poisoned") = height;
    }
}

impl BlockOracle for ManualBlockOracle {
    fn height(&self) -> u64 {
        *self.height.lock().expect("block oracle lock poisoned")
    }

    fn block_hash(&self, height: u64) -> Option<[u8; 32]> {
        if height >= self.height() {
            return None;
        }
        let mut payload = *b"block:--------";
        payload[6..].copy_from_slice(&height.to_be_bytes());
        Some(*sha256(&payload).as_bytes())
    }
}
