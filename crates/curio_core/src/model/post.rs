//! Question and answer read models.
//!
//! # Responsibility
//! - Define the two votable post shapes and the tagged parent reference.
//!
//! # Invariants
//! - An answer always back-references the question it belongs to.
//! - `accepted_answer_uuid`, when set, names an answer of the same question.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a question.
pub type QuestionId = Uuid;
/// Stable identifier for an answer.
pub type AnswerId = Uuid;

/// Kind discriminant for votable posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Question,
    Answer,
}

/// Tagged reference to a votable post.
///
/// Carries the kind with the id so parent dispatch is an exhaustive
/// variant match, never a string compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PostRef {
    Question(QuestionId),
    Answer(AnswerId),
}

impl PostRef {
    /// Rebuilds a reference from a kind discriminant and an id.
    pub fn from_parts(kind: PostKind, id: Uuid) -> Self {
        match kind {
            PostKind::Question => Self::Question(id),
            PostKind::Answer => Self::Answer(id),
        }
    }

    /// Returns the referenced post id.
    pub fn id(self) -> Uuid {
        match self {
            Self::Question(id) | Self::Answer(id) => id,
        }
    }

    /// Returns the kind discriminant.
    pub fn kind(self) -> PostKind {
        match self {
            Self::Question(_) => PostKind::Question,
            Self::Answer(_) => PostKind::Answer,
        }
    }
}

/// Question read model.
///
/// Title and body are opaque payloads to the interaction core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub uuid: QuestionId,
    pub author_uuid: UserId,
    pub title: String,
    pub body: String,
    /// At most one accepted answer, initially absent.
    pub accepted_answer_uuid: Option<AnswerId>,
    pub views: i64,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Answer read model. Stored as a separate entity with a stable identity,
/// not as a subdocument embedded in its question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub uuid: AnswerId,
    pub question_uuid: QuestionId,
    pub author_uuid: UserId,
    pub body: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

impl Answer {
    /// Returns the post reference for this answer.
    pub fn post_ref(&self) -> PostRef {
        PostRef::Answer(self.uuid)
    }
}

impl Question {
    /// Returns the post reference for this question.
    pub fn post_ref(&self) -> PostRef {
        PostRef::Question(self.uuid)
    }
}
