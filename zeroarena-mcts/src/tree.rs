//! The node arena and its structural operations.
//!
//! ## Architecture
//! - Level 2: arena allocation, child adjacency, and the single read/write
//!   lock that guards all of it
//!
//! Per-node statistics ([`Node`]) are atomics and can be read without taking
//! this lock once a caller already holds a [`NodeId`]; everything that
//! touches the *shape* of the tree - allocating, freeing, wiring up a child,
//! swapping the root, or the compound visits+black_scores update - goes
//! through the single [`std::sync::RwLock`] here, matching the coarse
//! locking strategy of the engine this was grounded on.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::RwLock;

use rustc_hash::FxHashMap;
use zeroarena_core::{MoveIndex, Player};

use crate::node::{Node, NodeId};

/// Initial arena capacity, matching the source engine's preallocation.
const INITIAL_CAPACITY: usize = 12_288;

struct TreeInner {
    nodes: Vec<Node>,
    children: Vec<Vec<NodeId>>,
    freelist: Vec<NodeId>,
    freeables: Vec<NodeId>,
    root: Option<NodeId>,
    /// `(board hash, move) -> visit count` used to report a stable policy
    /// distribution across repeated `Search` calls at the same position.
    cached_policies: FxHashMap<(u32, MoveIndex), u32>,
}

/// The node arena shared by every worker in a single [`crate::search`] call.
pub struct Tree {
    inner: RwLock<TreeInner>,
    /// Per-child slot capacity; `rows * cols + 1` to make room for a pass.
    child_capacity: usize,
    /// Snapshot of the root's live child count, refreshed once per `Search`.
    node_count: AtomicI32,
}

impl Tree {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            inner: RwLock::new(TreeInner {
                nodes: Vec::with_capacity(INITIAL_CAPACITY),
                children: Vec::with_capacity(INITIAL_CAPACITY),
                freelist: Vec::new(),
                freeables: Vec::new(),
                root: None,
                cached_policies: FxHashMap::default(),
            }),
            child_capacity: rows * cols + 1,
            node_count: AtomicI32::new(0),
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.inner.read().unwrap().root
    }

    pub fn set_root(&self, id: NodeId) {
        self.inner.write().unwrap().root = Some(id);
    }

    /// Total number of (live or free) arena slots.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node_count(&self) -> i32 {
        self.node_count.load(Ordering::SeqCst)
    }

    pub fn set_node_count(&self, n: i32) {
        self.node_count.store(n, Ordering::SeqCst);
    }

    /// Run `f` against the node at `id` under the shared read lock.
    pub fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&Node) -> R) -> R {
        let guard = self.inner.read().unwrap();
        f(&guard.nodes[id.0])
    }

    /// Reuse a free slot, or grow the arena.
    fn alloc(&self) -> NodeId {
        let mut guard = self.inner.write().unwrap();
        if let Some(id) = guard.freelist.pop() {
            return id;
        }
        let id = NodeId(guard.nodes.len());
        guard.nodes.push(Node::empty(id));
        guard.children.push(Vec::with_capacity(self.child_capacity));
        id
    }

    /// `New(move, score, value)`: allocate and initialise a live node.
    pub fn new_node(&self, mv: MoveIndex, score: f32, value: f32) -> NodeId {
        let id = self.alloc();
        self.with_node(id, |n| n.init(mv, score, value));
        id
    }

    /// Return `id` to the free-list, clearing its children but keeping
    /// their backing capacity.
    pub fn free(&self, id: NodeId) {
        let mut guard = self.inner.write().unwrap();
        guard.children[id.0].clear();
        guard.nodes[id.0].reset();
        guard.freelist.push(id);
    }

    /// Drain and free every node queued up by a prior `cleanup`.
    pub fn drain_freeables(&self) {
        let ids: Vec<NodeId> = {
            let mut guard = self.inner.write().unwrap();
            std::mem::take(&mut guard.freeables)
        };
        for id in ids {
            self.free(id);
        }
    }

    pub fn add_child(&self, parent: NodeId, child: NodeId) {
        self.inner.write().unwrap().children[parent.0].push(child);
    }

    /// Snapshot of `id`'s children (cloning a `Vec<NodeId>` is cheap).
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.inner.read().unwrap().children[id.0].clone()
    }

    pub fn find_child(&self, parent: NodeId, mv: MoveIndex) -> Option<NodeId> {
        let guard = self.inner.read().unwrap();
        guard.children[parent.0]
            .iter()
            .copied()
            .find(|&c| guard.nodes[c.0].mv() == mv)
    }

    /// Recursively count live descendants of `id`, `id` included.
    pub fn count_children(&self, id: NodeId) -> usize {
        let guard = self.inner.read().unwrap();
        Self::count_children_locked(&guard, id)
    }

    fn count_children_locked(guard: &TreeInner, id: NodeId) -> usize {
        1 + guard.children[id.0]
            .iter()
            .map(|&c| Self::count_children_locked(guard, c))
            .sum::<usize>()
    }

    /// `visits += 1; black_scores += score`, taking the write lock so the
    /// pair changes atomically with respect to concurrent readers.
    pub fn update(&self, id: NodeId, score: f32) {
        let guard = self.inner.write().unwrap();
        guard.nodes[id.0].accumulate(score);
    }

    /// Virtual loss is a single atomic store; the read lock here only
    /// guards indexing into the arena, not the field itself.
    pub fn add_virtual_loss(&self, id: NodeId) {
        self.inner.read().unwrap().nodes[id.0].add_virtual_loss();
    }

    pub fn undo_virtual_loss(&self, id: NodeId) {
        self.inner.read().unwrap().nodes[id.0].undo_virtual_loss();
    }

    /// PUCT-argmax over `parent`'s active children. Panics if `parent` has
    /// no children - callers must only select on nodes with `has_children`.
    pub fn select(&self, parent: NodeId, player: Player, puct: f32) -> NodeId {
        let guard = self.inner.read().unwrap();
        let parent_visits: u32 = guard.children[parent.0]
            .iter()
            .map(|&c| &guard.nodes[c.0])
            .filter(|n| n.is_valid())
            .map(|n| n.visits())
            .sum();
        let sqrt_parent = (parent_visits as f32).sqrt();

        let mut best: Option<(NodeId, f32)> = None;
        for &child in &guard.children[parent.0] {
            let node = &guard.nodes[child.0];
            if !node.is_active() {
                continue;
            }
            let q = if node.is_not_visited() {
                node.nn_evaluate(player)
            } else {
                node.evaluate(player)
            };
            let u = q + puct * node.score() * sqrt_parent / (1.0 + node.visits() as f32);
            match best {
                Some((_, best_u)) if best_u >= u => {}
                _ => best = Some((child, u)),
            }
        }
        best.expect("select called on a node with no active children")
            .0
    }

    /// Exact translation of the source engine's proportional swap-to-front
    /// opening-randomisation: walk the children, and with probability
    /// proportional to `visits / running_total` swap the current child to
    /// the front. A no-op if the current leader has too few visits.
    pub fn randomize_children(
        &self,
        of: NodeId,
        random_min_visits: u32,
        temperature: f32,
        rng: &mut impl rand::Rng,
    ) {
        let mut guard = self.inner.write().unwrap();
        if guard.children[of.0].is_empty() {
            return;
        }
        let visits: Vec<f32> = guard.children[of.0]
            .iter()
            .map(|&c| guard.nodes[c.0].visits() as f32)
            .collect();
        if visits[0] <= random_min_visits as f32 {
            return;
        }
        let mut accum = 0.0f32;
        let children = &mut guard.children[of.0];
        for i in 0..children.len() {
            let weight = if temperature > 0.0 {
                visits[i].powf(1.0 / temperature)
            } else {
                visits[i]
            };
            accum += weight;
            if accum <= 0.0 {
                continue;
            }
            if rng.gen::<f32>() < weight / accum {
                children.swap(0, i);
            }
        }
    }

    /// Invalidate every descendant of `root` (`root` itself excluded),
    /// queuing them onto the free-list for a later `drain_freeables`.
    fn clean_children(guard: &mut TreeInner, root: NodeId) {
        let kids = std::mem::take(&mut guard.children[root.0]);
        for child in kids {
            guard.nodes[child.0].invalidate();
            guard.freeables.push(child);
            Self::clean_children(guard, child);
        }
    }

    /// Prune every subtree under `old_root` except the one rooted at
    /// `new_root`, then make `new_root` the sole child of `old_root` so a
    /// later `free(old_root)` cleans it up as part of the normal lifecycle.
    pub fn cleanup(&self, old_root: NodeId, new_root: NodeId) {
        let mut guard = self.inner.write().unwrap();
        let siblings: Vec<NodeId> = guard.children[old_root.0]
            .iter()
            .copied()
            .filter(|&c| c != new_root)
            .collect();
        for sibling in siblings {
            guard.nodes[sibling.0].invalidate();
            guard.freeables.push(sibling);
            Self::clean_children(&mut guard, sibling);
        }
        guard.children[old_root.0] = vec![new_root];
    }

    /// Sort `of`'s children in place: most-visited first, breaking ties by
    /// prior score (for never-visited siblings) or by `Evaluate(player)`.
    pub fn sort_children_for_best(&self, of: NodeId, player: Player) {
        let mut guard = self.inner.write().unwrap();
        let TreeInner {
            ref mut children,
            ref nodes,
            ..
        } = *guard;
        children[of.0].sort_by(|&a, &b| crate::node::fancy_cmp(&nodes[a.0], &nodes[b.0], player));
    }

    pub fn record_policy(&self, hash: u32, mv: MoveIndex) {
        let mut guard = self.inner.write().unwrap();
        *guard.cached_policies.entry((hash, mv)).or_insert(0) += 1;
    }

    /// Normalised policy over `action_space + 1` slots (the trailing slot
    /// is the pass), for every cached visit recorded at `hash`.
    pub fn policies(&self, hash: u32, action_space: usize) -> Vec<f32> {
        let guard = self.inner.read().unwrap();
        let mut out = vec![0.0f32; action_space + 1];
        let mut total = 0u32;
        for (&(h, mv), &count) in guard.cached_policies.iter() {
            if h != hash {
                continue;
            }
            let slot = if mv < 0 { action_space } else { mv as usize };
            if slot < out.len() {
                out[slot] += count as f32;
                total += count;
            }
        }
        if total > 0 {
            for v in out.iter_mut() {
                *v /= total as f32;
            }
        }
        out
    }

    /// Wipe the arena back to empty, matching the source engine's full
    /// `Reset`: every node zeroed, free-list rebuilt, no cached policy.
    pub fn reset(&self) {
        let mut guard = self.inner.write().unwrap();
        let len = guard.nodes.len();
        for node in &guard.nodes {
            node.reset();
        }
        for children in &mut guard.children {
            children.clear();
        }
        guard.freelist = (0..len).map(NodeId).collect();
        guard.freeables.clear();
        guard.root = None;
        guard.cached_policies.clear();
        drop(guard);
        self.node_count.store(0, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeroarena_core::PASS;

    #[test]
    fn alloc_reuses_freed_slots() {
        let tree = Tree::new(3, 3);
        let a = tree.new_node(0, 0.0, 0.0);
        tree.free(a);
        let b = tree.new_node(1, 0.0, 0.0);
        assert_eq!(a, b);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn add_child_and_find_child_round_trip() {
        let tree = Tree::new(3, 3);
        let parent = tree.new_node(PASS, 0.0, 0.0);
        let child = tree.new_node(4, 0.5, 0.1);
        tree.add_child(parent, child);
        assert_eq!(tree.find_child(parent, 4), Some(child));
        assert_eq!(tree.find_child(parent, 7), None);
    }

    #[test]
    fn update_accumulates_visits_and_score() {
        let tree = Tree::new(3, 3);
        let id = tree.new_node(0, 0.0, 0.0);
        tree.update(id, 1.0);
        tree.update(id, 0.0);
        let (visits, black) = tree.with_node(id, |n| (n.visits(), n.black_scores()));
        assert_eq!(visits, 3); // init() already recorded one visit
        assert!((black - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cleanup_prunes_non_surviving_siblings() {
        let tree = Tree::new(3, 3);
        let root = tree.new_node(PASS, 0.0, 0.0);
        let keep = tree.new_node(0, 0.0, 0.0);
        let drop_me = tree.new_node(1, 0.0, 0.0);
        tree.add_child(root, keep);
        tree.add_child(root, drop_me);
        tree.cleanup(root, keep);
        assert_eq!(tree.children(root), vec![keep]);
        tree.with_node(drop_me, |n| assert!(!n.is_valid()));
        tree.drain_freeables();
    }

    #[test]
    fn count_children_counts_self_and_descendants() {
        let tree = Tree::new(3, 3);
        let root = tree.new_node(PASS, 0.0, 0.0);
        let a = tree.new_node(0, 0.0, 0.0);
        let b = tree.new_node(1, 0.0, 0.0);
        tree.add_child(root, a);
        tree.add_child(root, b);
        assert_eq!(tree.count_children(root), 3);
    }

    #[test]
    fn reset_clears_arena_and_rebuilds_freelist() {
        let tree = Tree::new(3, 3);
        let a = tree.new_node(0, 0.0, 0.0);
        let b = tree.new_node(1, 0.0, 0.0);
        tree.add_child(a, b);
        tree.reset();
        assert_eq!(tree.children(a), Vec::<NodeId>::new());
        assert_eq!(tree.root(), None);
    }
}
