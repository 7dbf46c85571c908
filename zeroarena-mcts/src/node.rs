//! A single MCTS tree node and its atomic statistics.
//!
//! ## Architecture
//! - Level 3: per-node atomic state and the pure (lock-free) operations on it
//!
//! All fields that participate in concurrent search are stored as their
//! `u32`/`i32` atomic bit patterns; `f32` fields round-trip through
//! [`f32::to_bits`]/[`f32::from_bits`], which is well-defined for IEEE-754.
//! Every operation here reads or writes a single field atomically and needs
//! no external locking - the tree-wide lock in [`crate::tree::Tree`] is only
//! for structural mutation (allocating nodes, wiring up children, swapping
//! the root) and for the compound `visits + black_scores` update.

use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use zeroarena_core::{Player, NONE};

/// Default threshold stored in a freshly-reset node: "not yet expanded".
pub const DEFAULT_MIN_PSA_RATIO: f32 = 2.0;

/// Magnitude of the virtual loss applied while a worker holds a node.
pub const VIRTUAL_LOSS: f32 = 3.0;

/// Index into the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const NONE: NodeId = NodeId(usize::MAX);

    pub fn is_some(self) -> bool {
        self != NodeId::NONE
    }
}

/// Lifecycle state of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Status {
    /// Waiting to be reclaimed by the free-list.
    Invalid = 0,
    /// Part of the live search graph.
    Active = 1,
    /// Attached but skipped by selection.
    Pruned = 2,
}

impl Status {
    fn from_u32(v: u32) -> Self {
        match v {
            0 => Status::Invalid,
            1 => Status::Active,
            _ => Status::Pruned,
        }
    }
}

/// A node in the search tree. Atomic fields only; structural adjacency
/// (children) lives in the owning [`crate::tree::Tree`], not here.
#[derive(Debug)]
pub struct Node {
    mv: AtomicI32,
    visits: AtomicU32,
    status: AtomicU32,
    black_scores: AtomicU32,
    virtual_loss: AtomicU32,
    min_psa_ratio_children: AtomicU32,
    score: AtomicU32,
    value: AtomicU32,
    id: NodeId,
}

impl Node {
    /// A freshly-reset, unused slot (as produced by `alloc`'s "push new"
    /// branch, or by `free`).
    pub fn empty(id: NodeId) -> Self {
        Self {
            mv: AtomicI32::new(NONE),
            visits: AtomicU32::new(0),
            status: AtomicU32::new(Status::Invalid as u32),
            black_scores: AtomicU32::new(0),
            virtual_loss: AtomicU32::new(0),
            min_psa_ratio_children: AtomicU32::new(DEFAULT_MIN_PSA_RATIO.to_bits()),
            score: AtomicU32::new(0),
            value: AtomicU32::new(0),
            id,
        }
    }

    /// `New(move, score, value)`: (re-)initialise this slot as a live node
    /// with one visit already recorded, per the node lifecycle contract.
    pub fn init(&self, mv: i32, score: f32, value: f32) {
        self.mv.store(mv, Ordering::SeqCst);
        self.visits.store(1, Ordering::SeqCst);
        self.status.store(Status::Active as u32, Ordering::SeqCst);
        self.black_scores.store(0, Ordering::SeqCst);
        self.virtual_loss.store(0, Ordering::SeqCst);
        self.min_psa_ratio_children
            .store(DEFAULT_MIN_PSA_RATIO.to_bits(), Ordering::SeqCst);
        self.score.store(score.to_bits(), Ordering::SeqCst);
        self.value.store(value.to_bits(), Ordering::SeqCst);
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn mv(&self) -> i32 {
        self.mv.load(Ordering::SeqCst)
    }

    pub fn visits(&self) -> u32 {
        self.visits.load(Ordering::SeqCst)
    }

    pub fn is_not_visited(&self) -> bool {
        self.visits() == 0
    }

    pub fn black_scores(&self) -> f32 {
        f32::from_bits(self.black_scores.load(Ordering::SeqCst))
    }

    pub fn score(&self) -> f32 {
        f32::from_bits(self.score.load(Ordering::SeqCst))
    }

    pub fn value(&self) -> f32 {
        f32::from_bits(self.value.load(Ordering::SeqCst))
    }

    pub fn virtual_loss(&self) -> f32 {
        f32::from_bits(self.virtual_loss.load(Ordering::SeqCst))
    }

    pub fn min_psa_ratio(&self) -> f32 {
        f32::from_bits(self.min_psa_ratio_children.load(Ordering::SeqCst))
    }

    pub fn set_min_psa_ratio(&self, ratio: f32) {
        self.min_psa_ratio_children
            .store(ratio.to_bits(), Ordering::SeqCst);
    }

    /// `HasChildren ⇔ minPsaRatioChildren ≤ 1`.
    pub fn has_children(&self) -> bool {
        self.min_psa_ratio() <= 1.0
    }

    pub fn is_expandable(&self, min_psa_ratio: f32) -> bool {
        min_psa_ratio < self.min_psa_ratio()
    }

    pub fn status(&self) -> Status {
        Status::from_u32(self.status.load(Ordering::SeqCst))
    }

    pub fn activate(&self) {
        self.status.store(Status::Active as u32, Ordering::SeqCst);
    }

    pub fn prune(&self) {
        self.status.store(Status::Pruned as u32, Ordering::SeqCst);
    }

    pub fn invalidate(&self) {
        self.status.store(Status::Invalid as u32, Ordering::SeqCst);
    }

    pub fn is_valid(&self) -> bool {
        self.status() != Status::Invalid
    }

    pub fn is_active(&self) -> bool {
        self.status() == Status::Active
    }

    pub fn is_pruned(&self) -> bool {
        self.status() == Status::Pruned
    }

    /// Atomic store of the virtual loss constant; no tree lock required -
    /// readers observe it via a plain atomic load before computing `qsa`.
    pub fn add_virtual_loss(&self) {
        self.virtual_loss
            .store(VIRTUAL_LOSS.to_bits(), Ordering::SeqCst);
    }

    pub fn undo_virtual_loss(&self) {
        self.virtual_loss.store(0, Ordering::SeqCst);
    }

    /// `q = blackScores / visits`, a signed value in roughly `[-1, 1]` from
    /// Black's perspective. White's virtual loss inflates the numerator
    /// before the divide (biasing the path away from concurrent
    /// re-selection), then the whole thing is negated to read from White's
    /// perspective.
    pub fn evaluate(&self, player: Player) -> f32 {
        let visits = self.visits();
        let mut black_scores = self.black_scores();
        if player == Player::White {
            black_scores += self.virtual_loss();
        }
        let score = black_scores / visits as f32;
        if player == Player::White {
            -score
        } else {
            score
        }
    }

    /// The raw value head estimate (Black's perspective), negated for White.
    pub fn nn_evaluate(&self, player: Player) -> f32 {
        if player == Player::White {
            -self.value()
        } else {
            self.value()
        }
    }

    /// `visits += 1; blackScores += score`. Callers must hold the tree's
    /// write lock so the pair changes atomically with respect to readers.
    pub fn accumulate(&self, score: f32) {
        self.visits.fetch_add(1, Ordering::SeqCst);
        let mut cur;
        loop {
            cur = self.black_scores.load(Ordering::SeqCst);
            let next = (f32::from_bits(cur) + score).to_bits();
            if self
                .black_scores
                .compare_exchange_weak(cur, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                break;
            }
        }
    }

    /// Wipe the slot back to its just-allocated shape.
    pub fn reset(&self) {
        self.mv.store(NONE, Ordering::SeqCst);
        self.visits.store(0, Ordering::SeqCst);
        self.status.store(Status::Invalid as u32, Ordering::SeqCst);
        self.black_scores.store(0, Ordering::SeqCst);
        self.virtual_loss.store(0, Ordering::SeqCst);
        self.min_psa_ratio_children
            .store(DEFAULT_MIN_PSA_RATIO.to_bits(), Ordering::SeqCst);
        self.score.store(0, Ordering::SeqCst);
        self.value.store(0, Ordering::SeqCst);
    }
}

/// Ordering used to pick the reported best move: most-visited first; among
/// never-visited siblings, highest prior first; among visited siblings,
/// highest `Evaluate(player)` first.
pub(crate) fn fancy_cmp(a: &Node, b: &Node, player: Player) -> std::cmp::Ordering {
    let (va, vb) = (a.visits(), b.visits());
    if va != vb {
        return vb.cmp(&va);
    }
    if va == 0 {
        return b
            .score()
            .partial_cmp(&a.score())
            .unwrap_or(std::cmp::Ordering::Equal);
    }
    b.evaluate(player)
        .partial_cmp(&a.evaluate(player))
        .unwrap_or(std::cmp::Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_sets_one_visit_and_active() {
        let n = Node::empty(NodeId(0));
        n.init(3, 0.25, 0.6);
        assert_eq!(n.visits(), 1);
        assert!(n.is_active());
        assert_eq!(n.mv(), 3);
        assert!((n.score() - 0.25).abs() < 1e-6);
        assert!((n.value() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn accumulate_adds_to_black_scores() {
        let n = Node::empty(NodeId(0));
        n.init(0, 0.0, 0.0);
        n.accumulate(0.5);
        n.accumulate(0.25);
        assert!((n.black_scores() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn evaluate_mirrors_for_white() {
        let n = Node::empty(NodeId(0));
        n.init(0, 0.0, 0.0);
        n.accumulate(0.8);
        // visits starts at 1 from init, accumulate doesn't bump visits here
        // since we call accumulate directly rather than through Tree::update.
        let black_eval = n.evaluate(Player::Black);
        let white_eval = n.evaluate(Player::White);
        assert!((black_eval - 0.8).abs() < 1e-6);
        assert!((white_eval - (-0.8)).abs() < 1e-6);
    }

    #[test]
    fn virtual_loss_round_trips() {
        let n = Node::empty(NodeId(0));
        assert_eq!(n.virtual_loss(), 0.0);
        n.add_virtual_loss();
        assert_eq!(n.virtual_loss(), VIRTUAL_LOSS);
        n.undo_virtual_loss();
        assert_eq!(n.virtual_loss(), 0.0);
    }

    #[test]
    fn reset_restores_default_min_psa_ratio() {
        let n = Node::empty(NodeId(0));
        n.init(1, 0.1, 0.2);
        n.set_min_psa_ratio(0.0);
        n.reset();
        assert_eq!(n.min_psa_ratio(), DEFAULT_MIN_PSA_RATIO);
        assert!(!n.is_valid());
    }

    #[test]
    fn has_children_iff_min_psa_ratio_le_one() {
        let n = Node::empty(NodeId(0));
        n.init(0, 0.0, 0.0);
        assert!(!n.has_children()); // default 2.0
        n.set_min_psa_ratio(0.0);
        assert!(n.has_children());
        n.set_min_psa_ratio(1.0);
        assert!(n.has_children());
    }
}
