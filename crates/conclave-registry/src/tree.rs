//! # Checkpointed Sortition Tree
//!
//! A binary cumulative-weight tree over guardian slots. Level 0 holds one
//! leaf per guardian; the node at `(level, pos)` covers leaves
//! `[pos << level, (pos + 1) << level)` and its value is their sum. Every
//! node carries a [`CheckpointHistory`], so totals and weighted samples can
//! be evaluated against any past term.
//!
//! ## Write Discipline
//!
//! All balance effects land at `current term + 1`, so the terms written to
//! any node are monotonically non-decreasing and the per-node histories
//! stay append-only. Appending a new leaf never rewrites history: a fresh
//! node's range starts exactly at the new leaf, and a new root level starts
//! from a copy of the old root's history (the old root covered every
//! existing leaf at every past term).
//!
//! ## Complexity
//!
//! Point update O(log n) node writes; historical total O(log c); weighted
//! sample O(log n · log c), where n is the slot count and c the checkpoint
//! count per node.

use serde::{Deserialize, Serialize};

use conclave_core::{ArithmeticError, TermId, TokenAmount};

use crate::checkpoints::CheckpointHistory;
use crate::error::RegistryError;

/// The cumulative-weight sortition tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortitionTree {
    /// Number of leaves (guardian slots) appended so far.
    leaf_count: usize,
    /// `levels[0]` are the leaves; the last level holds the single root.
    /// Never empty: height 1 covers the first leaf.
    levels: Vec<Vec<CheckpointHistory>>,
}

impl Default for SortitionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SortitionTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self {
            leaf_count: 0,
            levels: vec![Vec::new()],
        }
    }

    /// Number of guardian slots in the tree.
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    /// Whether the tree has no slots.
    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Leaves the current height can cover.
    fn capacity(&self) -> usize {
        1 << (self.levels.len() - 1)
    }

    /// Append a new slot with `value` effective from `term`.
    ///
    /// Returns the new slot index.
    pub fn insert(&mut self, term: TermId, value: TokenAmount) -> Result<usize, RegistryError> {
        let slot = self.leaf_count;
        self.leaf_count += 1;

        // Grow a new root level when the height no longer covers the leaf.
        // The old root covered every existing leaf at every past term, so
        // its history is exactly the new root's starting history.
        while self.capacity() < self.leaf_count {
            let old_root = self
                .levels
                .last()
                .and_then(|level| level.first())
                .cloned()
                .unwrap_or_default();
            self.levels.push(vec![old_root]);
        }

        let mut leaf = CheckpointHistory::new();
        if !value.is_zero() {
            leaf.record(term, value)?;
        }
        self.levels[0].push(leaf);

        if !value.is_zero() {
            self.apply_to_ancestors(slot, term, value, Direction::Increase)?;
        } else {
            // Materialize the ancestor nodes so later updates find them.
            self.ensure_ancestors(slot);
        }
        Ok(slot)
    }

    /// Increase a slot's value by `amount`, effective from `term`.
    pub fn increase(
        &mut self,
        slot: usize,
        term: TermId,
        amount: TokenAmount,
    ) -> Result<(), RegistryError> {
        self.update_leaf(slot, term, amount, Direction::Increase)
    }

    /// Decrease a slot's value by `amount`, effective from `term`.
    ///
    /// # Errors
    ///
    /// Underflow when the slot's latest value is smaller than `amount`.
    pub fn decrease(
        &mut self,
        slot: usize,
        term: TermId,
        amount: TokenAmount,
    ) -> Result<(), RegistryError> {
        self.update_leaf(slot, term, amount, Direction::Decrease)
    }

    /// A slot's value effective at `term`.
    pub fn leaf_value_at(&self, slot: usize, term: TermId) -> TokenAmount {
        self.levels[0]
            .get(slot)
            .map(|leaf| leaf.value_at(term))
            .unwrap_or(TokenAmount::ZERO)
    }

    /// A slot's latest value.
    pub fn leaf_latest(&self, slot: usize) -> TokenAmount {
        self.levels[0]
            .get(slot)
            .map(|leaf| leaf.latest())
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Total weight across all slots, effective at `term`.
    pub fn total_at(&self, term: TermId) -> TokenAmount {
        self.root().map(|r| r.value_at(term)).unwrap_or(TokenAmount::ZERO)
    }

    /// Latest total weight across all slots.
    pub fn total_latest(&self) -> TokenAmount {
        self.root().map(|r| r.latest()).unwrap_or(TokenAmount::ZERO)
    }

    /// Find the slot owning position `target` in the cumulative weight
    /// space at `term`, i.e. the slot s with
    /// `sum(0..s) <= target < sum(0..=s)`.
    ///
    /// Returns `None` when `target` is at or beyond the total.
    pub fn sample_at(&self, term: TermId, target: TokenAmount) -> Option<usize> {
        if target >= self.total_at(term) {
            return None;
        }
        let mut remaining = target;
        let mut pos = 0usize;
        for level in (1..self.levels.len()).rev() {
            let left_child = pos * 2;
            let left_sum = self
                .levels
                .get(level - 1)
                .and_then(|nodes| nodes.get(left_child))
                .map(|n| n.value_at(term))
                .unwrap_or(TokenAmount::ZERO);
            if remaining < left_sum {
                pos = left_child;
            } else {
                // Safe: remaining >= left_sum was just checked.
                remaining = TokenAmount::new(remaining.raw() - left_sum.raw());
                pos = left_child + 1;
            }
        }
        (pos < self.leaf_count).then_some(pos)
    }

    fn root(&self) -> Option<&CheckpointHistory> {
        self.levels.last().and_then(|level| level.first())
    }

    fn update_leaf(
        &mut self,
        slot: usize,
        term: TermId,
        amount: TokenAmount,
        direction: Direction,
    ) -> Result<(), RegistryError> {
        if slot >= self.leaf_count {
            return Err(RegistryError::UnknownSlot(slot));
        }
        if amount.is_zero() {
            return Ok(());
        }
        let leaf = &mut self.levels[0][slot];
        let updated = direction.apply(leaf.latest(), amount)?;
        leaf.record(term, updated)?;
        self.apply_to_ancestors(slot, term, amount, direction)
    }

    /// Apply a delta to every ancestor of `slot` above the leaf level.
    fn apply_to_ancestors(
        &mut self,
        slot: usize,
        term: TermId,
        amount: TokenAmount,
        direction: Direction,
    ) -> Result<(), RegistryError> {
        for level in 1..self.levels.len() {
            let pos = slot >> level;
            let nodes = &mut self.levels[level];
            if nodes.len() <= pos {
                nodes.resize_with(pos + 1, CheckpointHistory::new);
            }
            let node = &mut nodes[pos];
            let updated = direction.apply(node.latest(), amount)?;
            node.record(term, updated)?;
        }
        Ok(())
    }

    /// Materialize ancestor nodes for `slot` without changing any value.
    fn ensure_ancestors(&mut self, slot: usize) {
        for level in 1..self.levels.len() {
            let pos = slot >> level;
            let nodes = &mut self.levels[level];
            if nodes.len() <= pos {
                nodes.resize_with(pos + 1, CheckpointHistory::new);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    fn apply(
        self,
        current: TokenAmount,
        amount: TokenAmount,
    ) -> Result<TokenAmount, ArithmeticError> {
        match self {
            Direction::Increase => current.checked_add(amount),
            Direction::Decrease => current.checked_sub(amount),
        }
    }
}
