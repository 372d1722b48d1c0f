//! Badge evaluation.
//!
//! # Responsibility
//! - Decide which badges a reputation total has earned and persist the
//!   missing ones.
//!
//! # Invariants
//! - Badges are monotonic: a reputation drop never removes an earned badge.
//! - Evaluation runs inside the same transaction as the reputation change
//!   that triggered it.

use crate::model::user::{Badge, UserId};
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoResult;
use log::info;

/// Returns the badges earned by `reputation` that are not yet in `owned`.
pub fn missing_badges(reputation: i64, owned: &[Badge]) -> Vec<Badge> {
    Badge::ladder()
        .into_iter()
        .filter(|badge| reputation >= badge.threshold() && !owned.contains(badge))
        .collect()
}

/// Awards every badge `reputation` qualifies for that the user lacks.
///
/// Returns the badges newly awarded by this call.
pub fn award_missing<R: UserRepository>(
    repo: &R,
    user: UserId,
    reputation: i64,
) -> RepoResult<Vec<Badge>> {
    let owned = repo.badges(user)?;
    let earned = missing_badges(reputation, &owned);
    for badge in &earned {
        repo.award_badge(user, *badge)?;
        info!(
            "event=badge_awarded module=badge status=ok user={user} badge={} reputation={reputation}",
            badge.name()
        );
    }
    Ok(earned)
}
