//! Training examples collected from self-play.

/// One (board, policy, outcome) triple extracted from a self-play game.
///
/// `board` is whatever a [`GameEncoder`] produces; `policy` is the
/// normalised visit-count distribution the search reported (including the
/// trailing pass slot); `value` starts out as a same-game colour tag and is
/// rewritten to `{-1, 0, 1}` once the game's outcome is known (see
/// `Arena::play`).
#[derive(Clone, Debug, PartialEq)]
pub struct Example {
    pub board: Vec<f32>,
    pub policy: Vec<f32>,
    pub value: f32,
}

/// Encodes a game position as the flat float input a network expects.
pub type GameEncoder<G> = fn(&G) -> Vec<f32>;

/// Expands one example into several (e.g. board symmetries). Applied right
/// after collection, before the post-game value rewrite.
pub type Augmenter = fn(&Example) -> Vec<Example>;

/// An example's policy/value fields are rejected if either contains a
/// non-finite entry (matches the source engine's `validPolicies` guard).
pub fn is_valid(example: &Example) -> bool {
    example.policy.iter().all(|v| v.is_finite()) && example.value.is_finite()
}
