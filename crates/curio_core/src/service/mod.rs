//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into interaction-level APIs: voting,
//!   acceptance, posting, notification dispatch, and cascade deletion.
//! - Own the shared error taxonomy surfaced to the transport layer.
//!
//! # Invariants
//! - Every operation takes an explicit actor id; there is no ambient
//!   authentication state in this core.
//! - Validation, not-found, and authorization failures surface before any
//!   mutation is applied.
//! - Write contention is retried a bounded number of times, then surfaces
//!   as `Conflict`.

pub mod accept_service;
pub mod badge_service;
pub mod delete_service;
pub mod notification_service;
pub mod post_service;
pub mod vote_service;

use crate::db::{is_busy, DbError};
use crate::model::comment::CommentId;
use crate::model::notification::NotificationId;
use crate::model::post::{AnswerId, PostRef, QuestionId};
use crate::model::user::UserId;
use crate::model::vote::Direction;
use crate::repo::RepoError;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Bounded retry budget for contended write transactions.
pub(crate) const WRITE_RETRY_ATTEMPTS: u32 = 3;

/// Errors surfaced by interaction services.
#[derive(Debug)]
pub enum ServiceError {
    /// Requested vote direction is outside `{-1, 0, 1}`.
    InvalidDirection(i64),
    /// A required text field is blank after trimming.
    BlankField(&'static str),
    /// Actor is not allowed to perform the named action.
    NotAuthorized {
        actor: UserId,
        action: &'static str,
    },
    /// Policy forbids voting on one's own content.
    SelfVoteNotAllowed(UserId),
    /// Reply target hangs under a different post than the new comment.
    ReplyOutsideThread { reply_to: CommentId },
    /// Write contention persisted past the retry budget.
    Conflict { attempts: u32 },
    /// A cascade sub-step failed after deletion began; retry the cleanup.
    CascadeIncomplete {
        stage: &'static str,
        source: Box<ServiceError>,
    },
    QuestionNotFound(QuestionId),
    AnswerNotFound(AnswerId),
    CommentNotFound(CommentId),
    UserNotFound(UserId),
    NotificationNotFound(NotificationId),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDirection(value) => {
                write!(f, "vote direction must be 1, -1, or 0, got {value}")
            }
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::NotAuthorized { actor, action } => {
                write!(f, "user {actor} is not authorized to {action}")
            }
            Self::SelfVoteNotAllowed(actor) => {
                write!(f, "user {actor} may not vote on their own content")
            }
            Self::ReplyOutsideThread { reply_to } => {
                write!(f, "reply target {reply_to} belongs to a different post")
            }
            Self::Conflict { attempts } => {
                write!(f, "write conflict persisted after {attempts} attempts")
            }
            Self::CascadeIncomplete { stage, source } => {
                write!(f, "deletion incomplete at `{stage}`, retry cleanup: {source}")
            }
            Self::QuestionNotFound(id) => write!(f, "question not found: {id}"),
            Self::AnswerNotFound(id) => write!(f, "answer not found: {id}"),
            Self::CommentNotFound(id) => write!(f, "comment not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::NotificationNotFound(id) => write!(f, "notification not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CascadeIncomplete { source, .. } => Some(source.as_ref()),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::QuestionNotFound(id) => Self::QuestionNotFound(id),
            RepoError::AnswerNotFound(id) => Self::AnswerNotFound(id),
            RepoError::CommentNotFound(id) => Self::CommentNotFound(id),
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            RepoError::NotificationNotFound(id) => Self::NotificationNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Maps a post reference to its not-found error.
pub(crate) fn post_not_found(post: PostRef) -> ServiceError {
    match post {
        PostRef::Question(id) => ServiceError::QuestionNotFound(id),
        PostRef::Answer(id) => ServiceError::AnswerNotFound(id),
    }
}

/// Validates a wire-level vote value into an optional direction.
pub(crate) fn parse_requested_direction(value: i64) -> Result<Option<Direction>, ServiceError> {
    match value {
        0 => Ok(None),
        other => Direction::from_signum(other)
            .map(Some)
            .ok_or(ServiceError::InvalidDirection(other)),
    }
}

/// Rejects blank required text fields before any mutation.
pub(crate) fn require_filled<'a>(
    value: &'a str,
    field: &'static str,
) -> Result<&'a str, ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::BlankField(field));
    }
    Ok(value)
}

/// Runs `op` inside an immediate write transaction with bounded retry.
///
/// The closure sees a transaction that commits only when it returns `Ok`;
/// an `Err` rolls every statement back. SQLite busy errors restart the
/// whole unit, so `op` must be safe to re-run from scratch.
pub(crate) fn with_write_tx<T>(
    conn: &Connection,
    op: impl Fn(&Transaction<'_>) -> Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let tx = match Transaction::new_unchecked(conn, TransactionBehavior::Immediate) {
            Ok(tx) => tx,
            Err(err) if is_busy(&err) => {
                if attempt < WRITE_RETRY_ATTEMPTS {
                    continue;
                }
                return Err(ServiceError::Conflict { attempts: attempt });
            }
            Err(err) => return Err(RepoError::from(err).into()),
        };

        match op(&tx) {
            Ok(value) => match tx.commit() {
                Ok(()) => return Ok(value),
                Err(err) if is_busy(&err) => {
                    if attempt < WRITE_RETRY_ATTEMPTS {
                        continue;
                    }
                    return Err(ServiceError::Conflict { attempts: attempt });
                }
                Err(err) => return Err(RepoError::from(err).into()),
            },
            Err(err) if is_busy_service(&err) => {
                if attempt < WRITE_RETRY_ATTEMPTS {
                    continue;
                }
                return Err(ServiceError::Conflict { attempts: attempt });
            }
            Err(err) => return Err(err),
        }
    }
}

fn is_busy_service(err: &ServiceError) -> bool {
    matches!(
        err,
        ServiceError::Repo(RepoError::Db(DbError::Sqlite(inner))) if is_busy(inner)
    )
}
