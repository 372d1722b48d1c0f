//! Explicit policy knobs for moderation-adjacent behavior.
//!
//! Whether authors may vote on their own posts, and whether a superseded
//! acceptance retracts its bonus, are product decisions. They are
//! configuration here rather than hardcoded.

/// Interaction policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionPolicy {
    /// When false, voting on one's own post or comment is rejected.
    pub allow_self_vote: bool,
    /// When true, accepting a different answer retracts the previously
    /// accepted answer's one-time reputation bonus.
    pub revoke_superseded_acceptance: bool,
}

impl Default for InteractionPolicy {
    /// Self-votes allowed, acceptance bonuses never retracted.
    fn default() -> Self {
        Self {
            allow_self_vote: true,
            revoke_superseded_acceptance: false,
        }
    }
}
