//! Selection, expansion, back-propagation, and the worker pool that drives
//! one `search` call.
//!
//! ## Architecture
//! - Level 1: the public [`Mcts`] facade and its search pipeline
//!
//! `pipeline` is the per-iteration descent: select down the PUCT-optimal
//! path to a not-yet-expanded node, expand it once, and back-propagate the
//! resulting value. A configurable number of workers run this in a loop,
//! sharing the tree through its internal lock, until the timeout or
//! iteration budget trips a shared `running` flag.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use zeroarena_core::{GameState, MoveIndex, Player, PlayerMove, PASS, RESIGN};

use crate::inferer::Inferer;
use crate::node::{self, NodeId};
use crate::tree::Tree;
use crate::{MctsConfig, MctsError, PassPreference};

/// A running search over one game, generic over the concrete game and the
/// policy/value source backing it.
pub struct Mcts<G: GameState, I: Inferer<G>> {
    tree: Tree,
    config: MctsConfig,
    inferer: I,
    current: G,
    /// The position as of the end of the previous `search` call, used to
    /// detect how much of the existing tree can be reused.
    prev: Option<G>,
    rng: ChaCha8Rng,
    /// Playouts completed during the most recent `search` call.
    last_playouts: u32,
}

impl<G: GameState, I: Inferer<G>> Mcts<G, I> {
    pub fn new(config: MctsConfig, inferer: I, initial_state: G) -> Result<Self, MctsError> {
        config.validate()?;
        Ok(Self {
            tree: Tree::new(config.rows, config.cols),
            config,
            inferer,
            current: initial_state,
            prev: None,
            rng: ChaCha8Rng::seed_from_u64(0),
            last_playouts: 0,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn current(&self) -> &G {
        &self.current
    }

    pub fn set_current(&mut self, state: G) {
        self.current = state;
    }

    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    pub fn last_playouts(&self) -> u32 {
        self.last_playouts
    }

    /// Normalised visit-count policy over the current position, accumulated
    /// across every `search` call made from this exact board hash.
    pub fn policies(&self) -> Vec<f32> {
        self.tree.policies(self.current.hash(), self.current.action_space())
    }

    /// Discard the tree and any reuse bookkeeping. Used between games in a
    /// self-play loop.
    pub fn reset(&mut self) {
        self.tree.reset();
        self.prev = None;
    }

    /// Run one search from `self.current` as `player` and return the move
    /// it recommends. Blocks for up to `config.timeout`.
    pub fn search(&mut self, player: Player) -> MoveIndex {
        self.current.set_to_move(player);
        self.update_root();
        self.prepare_root();

        let root = self.tree.root().expect("update_root always ensures a root");
        let running = AtomicBool::new(true);
        let iterations = AtomicI32::new(0);
        let playouts = AtomicI32::new(0);

        {
            let tree = &self.tree;
            let inferer = &self.inferer;
            let config = &self.config;
            let current = &self.current;
            std::thread::scope(|scope| {
                scope.spawn(|| {
                    std::thread::sleep(config.timeout);
                    running.store(false, Ordering::SeqCst);
                });
                for _ in 0..config.workers {
                    scope.spawn(|| {
                        while running.load(Ordering::SeqCst) {
                            let mut state = current.clone();
                            let result = pipeline(tree, inferer, config, root, &mut state, 0);
                            if result.is_some() {
                                playouts.fetch_add(1, Ordering::SeqCst);
                            }
                            let val = iterations.fetch_add(1, Ordering::SeqCst) + 1;
                            if val > config.budget {
                                running.store(false, Ordering::SeqCst);
                            }
                            if tree.len() >= config.max_tree_size {
                                running.store(false, Ordering::SeqCst);
                            }
                        }
                    });
                }
            });
        }
        self.last_playouts = playouts.load(Ordering::SeqCst).max(0) as u32;

        let mv = if self.tree.children(root).is_empty() {
            let inference = self.inferer.infer(&self.current);
            let mut best = argmax(&inference.policy);
            if best >= self.current.action_space() as i32 {
                best = PASS;
            }
            best
        } else {
            self.best_move(root, player)
        };

        self.prev = Some(self.current.clone());
        self.tree.record_policy(self.current.hash(), mv);
        mv
    }

    /// `updateRoot`: try to reuse the existing tree at the new position;
    /// otherwise start a fresh single-node root.
    fn update_root(&mut self) {
        self.tree.drain_freeables();

        if !self.new_root_state() || self.tree.root().is_none() {
            let player = self.current.to_move();
            let mv = self.first_legal_move(player);
            let root = self.tree.new_node(mv, 0.0, 0.0);
            self.tree.set_root(root);
            self.prev = None;
        }

        let root = self.tree.root().expect("root just ensured");
        let count = self.tree.count_children(root) as i32;
        self.tree.set_node_count(count);
        if self.tree.children(root).is_empty() {
            self.tree
                .with_node(root, |n| n.set_min_psa_ratio(node::DEFAULT_MIN_PSA_RATIO));
        }
    }

    /// Prefer a pass if it is legal (matching the reuse fallback's
    /// conservative choice), else the first legal move in action-space
    /// order.
    fn first_legal_move(&self, player: Player) -> MoveIndex {
        if self.current.check(PlayerMove::new(player, PASS)) {
            return PASS;
        }
        (0..self.current.action_space() as i32)
            .find(|&mv| self.current.check(PlayerMove::new(player, mv)))
            .unwrap_or(PASS)
    }

    /// `newRootState`: replay from `prev` to `current` and, if the replay
    /// matches move-for-move, advance the tree's root along the same path
    /// instead of discarding it.
    fn new_root_state(&mut self) -> bool {
        let prev = match &self.prev {
            Some(p) => p.clone(),
            None => return false,
        };
        let depth = self.current.move_number() as i64 - prev.move_number() as i64;
        if depth < 0 {
            return false;
        }
        let depth = depth as usize;

        let mut probe = self.current.clone();
        for _ in 0..depth {
            probe.undo_last_move();
        }
        if probe != prev {
            return false;
        }

        let mut old_root = match self.tree.root() {
            Some(r) => r,
            None => return false,
        };
        let mut replay = prev;
        for _ in 0..depth {
            probe.fwd();
            let mv = probe.last_move();
            let new_root = match self.tree.find_child(old_root, mv.mv) {
                Some(n) => n,
                None => return false,
            };
            self.tree.set_root(new_root);
            self.tree.cleanup(old_root, new_root);
            replay = replay.apply(mv);
            old_root = new_root;
        }

        if probe.move_number() != self.current.move_number() || probe != self.current {
            return false;
        }
        self.prev = Some(replay);
        true
    }

    /// `prepareRoot`: make sure the root has at least one child and a
    /// first value estimate before workers start selecting through it.
    fn prepare_root(&mut self) {
        let root = self.tree.root().expect("root set by update_root");
        if !self.tree.with_node(root, |n| n.is_expandable(0.0)) {
            return;
        }
        let min_psa = min_psa_ratio(self.tree.node_count(), self.config.max_tree_size);
        let (value, had_children) =
            expand_and_evaluate(&self.tree, &self.inferer, root, &self.current, min_psa);
        // `hadChildren` means this is a reused root, already carrying visits
        // from a prior search - only a freshly-expanded root gets a visit
        // recorded here.
        if !had_children {
            self.tree.update(root, value);
        }
    }

    /// `bestMove`: pick the move to report, applying the pass/resign
    /// preferences on top of the raw search ranking.
    fn best_move(&mut self, root: NodeId, player: Player) -> MoveIndex {
        self.tree.sort_children_for_best(root, player);
        if self.current.move_number() < self.config.random_count {
            self.tree.randomize_children(
                root,
                self.config.random_min_visits,
                self.config.random_temperature,
                &mut self.rng,
            );
        }

        let children = self.tree.children(root);
        let top = match children.first() {
            Some(&c) => c,
            None => return PASS,
        };
        let (mut best_move, mut best_score) =
            self.tree.with_node(top, |n| (n.mv(), n.evaluate(player)));

        if self.config.pass_preference == PassPreference::DontPreferPass && best_move == PASS {
            let (mv, score) = self.no_pass_best_move(root, player, best_move, best_score);
            best_move = mv;
            best_score = score;
        } else if !self.config.dumb_pass && best_move == PASS {
            let black_eval = self.tree.with_node(root, |n| n.evaluate(Player::Black));
            let passing_loses = match player {
                Player::Black => black_eval < 0.0,
                Player::White => black_eval > 0.0,
            };
            if passing_loses {
                let (mv, score) = self.no_pass_best_move(root, player, best_move, best_score);
                best_move = mv;
                best_score = score;
            }
        } else if !self.config.dumb_pass && self.current.last_move().mv == PASS {
            let black_eval = self.tree.with_node(root, |n| n.evaluate(Player::Black));
            let passing_still_wins = match player {
                Player::Black => black_eval >= 0.0,
                Player::White => black_eval <= 0.0,
            };
            if passing_still_wins {
                best_move = PASS;
            }
        }

        if best_move == PASS && self.should_resign(best_score, player) {
            best_move = RESIGN;
        }
        best_move
    }

    /// `noPassBestMove`: if a non-pass legal child exists, report it
    /// instead; otherwise silently keep the original pass recommendation.
    /// This is a deliberate quirk of the engine this was grounded on - see
    /// the crate-level design notes - and is preserved rather than
    /// "fixed" into an error.
    fn no_pass_best_move(
        &self,
        root: NodeId,
        player: Player,
        fallback_move: MoveIndex,
        fallback_score: f32,
    ) -> (MoveIndex, f32) {
        for child in self.tree.children(root) {
            let (mv, visits, active) = self.tree.with_node(child, |n| (n.mv(), n.visits(), n.is_active()));
            if active && mv != PASS {
                let score = if visits == 0 {
                    1.0
                } else {
                    self.tree.with_node(child, |n| n.evaluate(player))
                };
                return (mv, score);
            }
        }
        (fallback_move, fallback_score)
    }

    fn should_resign(&self, best_score: f32, _player: Player) -> bool {
        if self.config.pass_preference == PassPreference::DontResign {
            return false;
        }
        if self.config.resign_percentage == 0.0 {
            return false;
        }
        let threshold_ply = (self.config.rows * self.config.cols / 4) as u32;
        if self.current.move_number() <= threshold_ply {
            return false;
        }
        let resign_threshold = if self.config.resign_percentage < 0.0 {
            0.1
        } else {
            self.config.resign_percentage
        };
        best_score <= resign_threshold
    }
}

/// Adaptive expansion threshold: as the arena fills up, new expansions get
/// pickier about which children they bother allocating.
fn min_psa_ratio(node_count: i32, max_tree_size: usize) -> f32 {
    let ratio = node_count as f32 / max_tree_size as f32;
    if ratio > 0.95 {
        0.01
    } else if ratio > 0.5 {
        0.001
    } else {
        0.0
    }
}

/// `combinedScore`: the terminal (or pass-ended) value of a position, from
/// Black's perspective.
fn combined_score<G: GameState>(state: &G) -> f32 {
    state.score(Player::Black) - state.score(Player::White) - state.additional_score()
}

/// First index of the largest value, ties broken by the earliest occurrence.
fn argmax(values: &[f32]) -> i32 {
    let mut best_idx = 0usize;
    let mut best_val = values[0];
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > best_val {
            best_val = v;
            best_idx = i;
        }
    }
    best_idx as i32
}

/// One PUCT descent from `node_id` to an unexpanded node and back.
/// Returns `None` only if `depth` exceeds the configured search ceiling.
fn pipeline<G, I>(
    tree: &Tree,
    inferer: &I,
    config: &MctsConfig,
    node_id: NodeId,
    state: &mut G,
    depth: u32,
) -> Option<f32>
where
    G: GameState,
    I: Inferer<G>,
{
    if depth > config.max_depth() {
        return None;
    }

    tree.add_virtual_loss(node_id);

    let min_psa = min_psa_ratio(tree.node_count(), config.max_tree_size);
    let expandable = tree.with_node(node_id, |n| n.is_expandable(0.0));
    let mut result = None;

    if expandable && (state.passes() >= 2 || state.ended().ended) {
        result = Some(combined_score(state));
    } else if expandable && tree.len() < config.max_tree_size {
        let (value, had_children) = expand_and_evaluate(tree, inferer, node_id, state, min_psa);
        if !had_children {
            result = Some(value);
        }
    }

    let has_children = tree.with_node(node_id, |n| n.has_children());
    if has_children && result.is_none() {
        let player = state.to_move();
        let child = tree.select(node_id, player, config.puct);
        let mv = tree.with_node(child, |n| n.mv());
        *state = state.apply(PlayerMove::new(player, mv));
        result = pipeline(tree, inferer, config, child, state, depth + 1);
    }

    if let Some(score) = result {
        tree.update(node_id, score);
    }
    tree.undo_virtual_loss(node_id);
    result
}

/// `expandAndSimulate`: infer a policy/value for `state`, attach children
/// for every legal move whose (renormalised) prior clears `min_psa_ratio`,
/// and report whether the node already had children (a benign race with
/// another worker, not an error).
fn expand_and_evaluate<G, I>(
    tree: &Tree,
    inferer: &I,
    parent: NodeId,
    state: &G,
    min_psa_ratio: f32,
) -> (f32, bool)
where
    G: GameState,
    I: Inferer<G>,
{
    let had_children = tree.with_node(parent, |n| n.has_children());
    if had_children {
        return (0.0, true);
    }

    let player = state.to_move();
    let inference = inferer.infer(state);
    let mut value = inference.value;
    if player == Player::White {
        value = -value;
    }

    let action_space = state.action_space();
    let mut legal: Vec<(f32, MoveIndex)> = Vec::with_capacity(action_space + 1);
    let mut legal_sum = 0.0f32;
    for mv in 0..action_space as i32 {
        if state.check(PlayerMove::new(player, mv)) {
            let p = inference.policy[mv as usize];
            legal.push((p, mv));
            legal_sum += p;
        }
    }
    if state.check(PlayerMove::new(player, PASS)) {
        let p = inference.policy[action_space];
        legal.push((p, PASS));
        legal_sum += p;
    }

    if legal.is_empty() {
        return (value, false);
    }

    if legal_sum > f32::MIN_POSITIVE {
        for (p, _) in legal.iter_mut() {
            *p /= legal_sum;
        }
    } else {
        let uniform = 1.0 / legal.len() as f32;
        for (p, _) in legal.iter_mut() {
            *p = uniform;
        }
    }

    legal.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let max_psa = legal[0].0;
    let old_min_psa = max_psa * tree.with_node(parent, |n| n.min_psa_ratio());
    let new_min_psa = max_psa * min_psa_ratio;

    let mut skipped = false;
    for &(score, mv) in &legal {
        if score < new_min_psa {
            // Sorted descending, so every remaining entry also falls below
            // the new threshold; the source engine achieves the same
            // effect by setting a flag and continuing rather than
            // breaking.
            skipped = true;
            break;
        }
        if score < old_min_psa && tree.find_child(parent, mv).is_none() {
            let child = tree.new_node(mv, score, value);
            tree.add_child(parent, child);
        }
    }

    tree.with_node(parent, |n| {
        n.set_min_psa_ratio(if skipped { min_psa_ratio } else { 0.0 })
    });

    (value, false)
}
