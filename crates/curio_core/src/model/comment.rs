//! Comment read model for threaded discussion under posts.
//!
//! # Invariants
//! - A comment has exactly one post parent, tagged by kind.
//! - `parent_comment_uuid`, when set, points to a comment under the same
//!   post parent (reply threading).
//! - At most one vote entry exists per (comment, voter) pair.

use crate::model::post::PostRef;
use crate::model::user::UserId;
use crate::model::vote::Direction;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a comment.
pub type CommentId = Uuid;

/// Comment read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub uuid: CommentId,
    pub author_uuid: UserId,
    /// Post this comment thread hangs under.
    pub parent: PostRef,
    /// Set when this comment is a reply to another comment.
    pub parent_comment_uuid: Option<CommentId>,
    pub body: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

impl Comment {
    /// Returns whether this comment is a threaded reply.
    pub fn is_reply(&self) -> bool {
        self.parent_comment_uuid.is_some()
    }
}

/// One voter's entry on a comment. Neutral votes are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentVote {
    pub voter_uuid: UserId,
    pub direction: Direction,
}
