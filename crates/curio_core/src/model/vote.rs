//! Vote directions and the vote-transition rule.
//!
//! # Responsibility
//! - Define the stored vote direction and the ledger transition algebra.
//! - Own the reputation delta table applied to post authors.
//!
//! # Invariants
//! - A stored direction is never neutral; "no vote" is the absence of a row.
//! - Requesting the currently held direction toggles the vote off.
//! - `reputation_delta` is the exact difference between the `to` and `from`
//!   entries of the delta table, so replaying transitions sums correctly.

use serde::{Deserialize, Serialize};

/// Reputation granted to a post author per received upvote.
pub const REP_UPVOTE: i64 = 10;
/// Reputation charged to a post author per received downvote.
pub const REP_DOWNVOTE: i64 = -2;
/// One-time reputation granted when an answer is accepted.
pub const REP_ACCEPTED: i64 = 15;

/// Stored vote direction on a question, answer, or comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Upvote, wire value `+1`.
    Up,
    /// Downvote, wire value `-1`.
    Down,
}

impl Direction {
    /// Returns the signed wire value for this direction.
    pub fn signum(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    /// Parses a non-neutral signed value. `0` is not a stored direction.
    pub fn from_signum(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Up),
            -1 => Some(Self::Down),
            _ => None,
        }
    }
}

/// Outcome of resolving a requested direction against the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTransition {
    /// Direction held before the request. `None` means no prior vote.
    pub from: Option<Direction>,
    /// Direction held after the request. `None` means the vote was cleared.
    pub to: Option<Direction>,
}

impl VoteTransition {
    /// Resolves a requested direction against the voter's current state.
    ///
    /// # Contract
    /// - Requesting the held direction again clears it (toggle-off).
    /// - Requesting `None` always clears, regardless of prior state.
    /// - Otherwise the requested direction replaces the prior one.
    pub fn resolve(from: Option<Direction>, requested: Option<Direction>) -> Self {
        let to = match requested {
            Some(direction) if from != Some(direction) => Some(direction),
            _ => None,
        };
        Self { from, to }
    }

    /// Returns whether the transition leaves the vote state unchanged.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }

    /// Net reputation change for the voted post's author.
    ///
    /// Comment votes never call this; they carry no reputation weight.
    pub fn reputation_delta(&self) -> i64 {
        post_vote_weight(self.to) - post_vote_weight(self.from)
    }
}

fn post_vote_weight(direction: Option<Direction>) -> i64 {
    match direction {
        Some(Direction::Up) => REP_UPVOTE,
        Some(Direction::Down) => REP_DOWNVOTE,
        None => 0,
    }
}

/// Up/down tallies for one votable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub up: i64,
    pub down: i64,
}

impl VoteTally {
    /// Net score, upvotes minus downvotes.
    pub fn score(&self) -> i64 {
        self.up - self.down
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, VoteTransition, REP_DOWNVOTE, REP_UPVOTE};

    #[test]
    fn repeat_direction_toggles_off() {
        let transition = VoteTransition::resolve(Some(Direction::Up), Some(Direction::Up));
        assert_eq!(transition.to, None);

        let transition = VoteTransition::resolve(Some(Direction::Down), Some(Direction::Down));
        assert_eq!(transition.to, None);
    }

    #[test]
    fn explicit_neutral_always_clears() {
        for from in [None, Some(Direction::Up), Some(Direction::Down)] {
            let transition = VoteTransition::resolve(from, None);
            assert_eq!(transition.to, None);
        }
    }

    #[test]
    fn switching_direction_replaces_vote() {
        let transition = VoteTransition::resolve(Some(Direction::Up), Some(Direction::Down));
        assert_eq!(transition.from, Some(Direction::Up));
        assert_eq!(transition.to, Some(Direction::Down));
    }

    #[test]
    fn delta_is_difference_of_weights() {
        let fresh_up = VoteTransition::resolve(None, Some(Direction::Up));
        assert_eq!(fresh_up.reputation_delta(), REP_UPVOTE);

        let switch = VoteTransition::resolve(Some(Direction::Up), Some(Direction::Down));
        assert_eq!(switch.reputation_delta(), REP_DOWNVOTE - REP_UPVOTE);

        let clear = VoteTransition::resolve(Some(Direction::Down), None);
        assert_eq!(clear.reputation_delta(), -REP_DOWNVOTE);
    }

    #[test]
    fn noop_transitions_carry_zero_delta() {
        let transition = VoteTransition::resolve(None, None);
        assert!(transition.is_noop());
        assert_eq!(transition.reputation_delta(), 0);
    }
}
