//! Denormalized notification record.
//!
//! # Invariants
//! - `sender_uuid` is never equal to `recipient_uuid`; self-notifications
//!   are suppressed before persistence.
//! - `snapshot_text` captures referenced text at dispatch time so the
//!   record stays renderable after its source entity is deleted.

use crate::model::comment::CommentId;
use crate::model::post::{AnswerId, QuestionId};
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a notification.
pub type NotificationId = Uuid;

/// Qualifying event category for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A new answer was posted on the recipient's question.
    Answer,
    /// A new comment was posted under the recipient's post.
    Comment,
    /// The recipient's question, answer, or comment received an upvote.
    Upvote,
    /// The recipient's answer was accepted.
    Accepted,
}

impl NotificationKind {
    /// Stable lowercase label, used in storage and log lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Answer => "answer",
            Self::Comment => "comment",
            Self::Upvote => "upvote",
            Self::Accepted => "accepted",
        }
    }
}

/// Notification read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub uuid: NotificationId,
    pub recipient_uuid: UserId,
    pub sender_uuid: UserId,
    pub kind: NotificationKind,
    pub question_uuid: Option<QuestionId>,
    pub answer_uuid: Option<AnswerId>,
    pub comment_uuid: Option<CommentId>,
    /// Point-in-time copy of the triggering text, if any.
    pub snapshot_text: Option<String>,
    pub is_read: bool,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}
