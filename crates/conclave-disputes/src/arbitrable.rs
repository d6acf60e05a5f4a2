//! # Arbitrable Collaborator
//!
//! The external agreement that submitted a dispute. The engine's only
//! call back into it is the one-time ruling notification.

use conclave_core::DisputeId;
use conclave_voting::Outcome;

/// An external arbitrable agreement.
pub trait Arbitrable {
    /// Receive the final ruling for a dispute. Called exactly once per
    /// dispute by [`Court::rule`](crate::engine::Court::rule).
    fn rule(&mut self, dispute: DisputeId, ruling: Outcome);
}

/// A test double that records every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingArbitrable {
    /// Notifications in arrival order.
    pub rulings: Vec<(DisputeId, Outcome)>,
}

impl RecordingArbitrable {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Arbitrable for RecordingArbitrable {
    fn rule(&mut self, dispute: DisputeId, ruling: Outcome) {
        self.rulings.push((dispute, ruling));
    }
}
