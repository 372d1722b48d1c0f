//! Interaction-consistency core for a question-and-answer board.
//!
//! Keeps the cross-entity interaction state of the board consistent under
//! concurrent use: the vote ledger, author reputation and badges, answer
//! acceptance, notification records, and cascade deletion of dependent
//! content. Persistence is SQLite through `rusqlite`; every cross-entity
//! mutation runs in one immediate transaction.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::comment::{Comment, CommentId, CommentVote};
pub use model::notification::{Notification, NotificationId, NotificationKind};
pub use model::policy::InteractionPolicy;
pub use model::post::{Answer, AnswerId, PostKind, PostRef, Question, QuestionId};
pub use model::user::{Badge, User, UserId};
pub use model::vote::{
    Direction, VoteTally, VoteTransition, REP_ACCEPTED, REP_DOWNVOTE, REP_UPVOTE,
};
pub use repo::comment_repo::{CommentRepository, SqliteCommentRepository};
pub use repo::notification_repo::{
    NewNotification, NotificationRepository, SqliteNotificationRepository,
};
pub use repo::post_repo::{
    PostRepository, PostSummary, QuestionListQuery, SqlitePostRepository,
};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::accept_service::AcceptService;
pub use service::delete_service::{CascadeOutcome, DeleteService};
pub use service::notification_service::{NotificationEvent, NotificationService};
pub use service::post_service::{CommentWithTally, PostService};
pub use service::vote_service::{VoteOutcome, VoteService};
pub use service::ServiceError;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn core_version_matches_manifest() {
        assert_eq!(core_version(), env!("CARGO_PKG_VERSION"));
    }
}
