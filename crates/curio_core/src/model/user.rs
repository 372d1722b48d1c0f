//! User read model, reputation counter, and badge ladder.
//!
//! # Invariants
//! - Reputation is a plain signed counter and may go negative.
//! - Badges are awarded at fixed reputation thresholds and never removed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a user.
pub type UserId = Uuid;

/// Named achievement unlocked at a reputation threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Badge {
    Bronze,
    Silver,
    Gold,
}

impl Badge {
    /// Minimum reputation required to earn this badge.
    pub fn threshold(self) -> i64 {
        match self {
            Self::Bronze => 100,
            Self::Silver => 500,
            Self::Gold => 1000,
        }
    }

    /// Stable display/storage name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
        }
    }

    /// All badges in ascending threshold order.
    pub fn ladder() -> [Badge; 3] {
        [Self::Bronze, Self::Silver, Self::Gold]
    }
}

/// User read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uuid: UserId,
    pub display_name: String,
    /// Signed running sum of vote and acceptance deltas.
    pub reputation: i64,
    /// Earned badges in ascending threshold order.
    pub badges: Vec<Badge>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl User {
    /// Returns whether the user currently holds the given badge.
    pub fn has_badge(&self, badge: Badge) -> bool {
        self.badges.contains(&badge)
    }
}
