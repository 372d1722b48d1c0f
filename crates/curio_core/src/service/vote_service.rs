//! Vote ledger and reputation engine.
//!
//! # Responsibility
//! - Apply vote mutations on posts and comments with toggle semantics.
//! - Keep the target author's reputation consistent with the ledger change
//!   inside one transaction.
//!
//! # Invariants
//! - A voter holds at most one direction per target; re-requesting the held
//!   direction clears it, requesting zero always clears it.
//! - The reputation delta applied equals the transition delta exactly; a
//!   no-op transition writes nothing.
//! - Comment votes never move reputation.
//! - Upvote notifications dispatch only after the vote has committed.

use crate::model::comment::CommentId;
use crate::model::policy::InteractionPolicy;
use crate::model::post::PostRef;
use crate::model::user::UserId;
use crate::model::vote::{Direction, VoteTally, VoteTransition};
use crate::repo::comment_repo::{CommentRepository, SqliteCommentRepository};
use crate::repo::post_repo::{PostRepository, SqlitePostRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::service::badge_service;
use crate::service::notification_service::{NotificationEvent, NotificationService};
use crate::service::{
    parse_requested_direction, post_not_found, with_write_tx, ServiceError,
};
use log::info;
use rusqlite::Connection;

/// Result of one vote mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    /// The transition the ledger performed.
    pub transition: VoteTransition,
    /// Tally of the target after the mutation.
    pub tally: VoteTally,
}

/// Voting service over posts and comments.
pub struct VoteService<'conn> {
    conn: &'conn Connection,
    policy: InteractionPolicy,
}

impl<'conn> VoteService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_policy(conn, InteractionPolicy::default())
    }

    pub fn with_policy(conn: &'conn Connection, policy: InteractionPolicy) -> Self {
        Self { conn, policy }
    }

    /// Applies a vote request on a question or answer.
    ///
    /// `requested` is the wire value: 1, -1, or 0. The author's reputation
    /// moves by the transition delta in the same transaction as the ledger
    /// write.
    pub fn vote_post(
        &self,
        post: PostRef,
        voter: UserId,
        requested: i64,
    ) -> Result<VoteOutcome, ServiceError> {
        let requested = parse_requested_direction(requested)?;

        let (outcome, event) = with_write_tx(self.conn, |tx| {
            let posts = SqlitePostRepository::attach(tx);
            let users = SqliteUserRepository::attach(tx);

            if !users.exists(voter)? {
                return Err(ServiceError::UserNotFound(voter));
            }
            let summary = posts.post_summary(post)?.ok_or_else(|| post_not_found(post))?;
            if !self.policy.allow_self_vote && summary.author_uuid == voter {
                return Err(ServiceError::SelfVoteNotAllowed(voter));
            }

            let from = posts.get_post_vote(post, voter)?;
            let transition = VoteTransition::resolve(from, requested);
            if !transition.is_noop() {
                posts.set_post_vote(post, voter, transition.to)?;
                let delta = transition.reputation_delta();
                if delta != 0 {
                    let reputation = users.adjust_reputation(summary.author_uuid, delta)?;
                    badge_service::award_missing(&users, summary.author_uuid, reputation)?;
                }
            }

            let tally = posts.post_tally(post)?;
            let event = (transition.to == Some(Direction::Up) && transition.from != transition.to)
                .then(|| {
                    NotificationEvent::post_upvoted(summary.author_uuid, voter, post, &summary.body)
                });
            Ok((VoteOutcome { transition, tally }, event))
        })?;

        info!(
            "event=vote_applied module=vote status=ok target={} voter={voter} from={} to={} score={}",
            post.id(),
            signum_of(outcome.transition.from),
            signum_of(outcome.transition.to),
            outcome.tally.score()
        );
        if let Some(event) = event {
            NotificationService::new(self.conn).dispatch(event);
        }
        Ok(outcome)
    }

    /// Applies a vote request on a comment. No reputation movement.
    pub fn vote_comment(
        &self,
        id: CommentId,
        voter: UserId,
        requested: i64,
    ) -> Result<VoteOutcome, ServiceError> {
        let requested = parse_requested_direction(requested)?;

        let (outcome, event) = with_write_tx(self.conn, |tx| {
            let comments = SqliteCommentRepository::attach(tx);
            let users = SqliteUserRepository::attach(tx);

            if !users.exists(voter)? {
                return Err(ServiceError::UserNotFound(voter));
            }
            let comment = comments
                .get_comment(id)?
                .ok_or(ServiceError::CommentNotFound(id))?;
            if !self.policy.allow_self_vote && comment.author_uuid == voter {
                return Err(ServiceError::SelfVoteNotAllowed(voter));
            }

            let from = comments.get_comment_vote(id, voter)?;
            let transition = VoteTransition::resolve(from, requested);
            if !transition.is_noop() {
                comments.set_comment_vote(id, voter, transition.to)?;
            }

            let tally = comments.comment_tally(id)?;
            let event = (transition.to == Some(Direction::Up) && transition.from != transition.to)
                .then(|| NotificationEvent::comment_upvoted(comment.author_uuid, voter, &comment));
            Ok((VoteOutcome { transition, tally }, event))
        })?;

        info!(
            "event=vote_applied module=vote status=ok target={id} voter={voter} from={} to={} score={}",
            signum_of(outcome.transition.from),
            signum_of(outcome.transition.to),
            outcome.tally.score()
        );
        if let Some(event) = event {
            NotificationService::new(self.conn).dispatch(event);
        }
        Ok(outcome)
    }
}

fn signum_of(direction: Option<Direction>) -> i64 {
    direction.map_or(0, Direction::signum)
}
