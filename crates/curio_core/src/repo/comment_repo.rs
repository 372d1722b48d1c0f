//! Comment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist threaded comments, their vote rows, and reply-tree lookups.
//! - Provide the parent-index queries the cascade deleter traverses.
//!
//! # Invariants
//! - `set_comment_vote` keeps at most one `(comment, voter)` row.
//! - `delete_comments` removes vote rows together with their comments.
//! - Reply lookups are index scans over `parent_comment_uuid`, never
//!   recursive SQL.

use crate::model::comment::{Comment, CommentId, CommentVote};
use crate::model::post::PostRef;
use crate::model::user::UserId;
use crate::model::vote::{Direction, VoteTally};
use crate::repo::{
    ensure_ready, parse_direction, parse_post_kind, parse_uuid, post_kind_to_db, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

const REQUIRED_TABLES: &[&str] = &["comments", "comment_votes"];

const COMMENT_SELECT_SQL: &str = "SELECT
    uuid,
    author_uuid,
    parent_kind,
    parent_uuid,
    parent_comment_uuid,
    body,
    created_at
FROM comments";

/// Repository interface for comment persistence and traversal.
pub trait CommentRepository {
    /// Creates one comment under a post, optionally as a reply.
    fn create_comment(
        &self,
        author: UserId,
        parent: PostRef,
        parent_comment: Option<CommentId>,
        body: &str,
    ) -> RepoResult<Comment>;
    /// Loads one comment by id.
    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>>;
    /// Lists comments of one post, newest first.
    fn list_for_post(&self, parent: PostRef) -> RepoResult<Vec<Comment>>;
    /// Returns the voter's current direction on a comment.
    fn get_comment_vote(&self, id: CommentId, voter: UserId) -> RepoResult<Option<Direction>>;
    /// Replaces the voter's `(comment, voter)` row; `None` removes it.
    fn set_comment_vote(
        &self,
        id: CommentId,
        voter: UserId,
        direction: Option<Direction>,
    ) -> RepoResult<()>;
    /// Lists all vote entries on a comment.
    fn comment_votes(&self, id: CommentId) -> RepoResult<Vec<CommentVote>>;
    /// Tallies up/down votes for a comment.
    fn comment_tally(&self, id: CommentId) -> RepoResult<VoteTally>;
    /// Lists ids of comments attached directly to one post.
    fn ids_for_post(&self, parent: PostRef) -> RepoResult<Vec<CommentId>>;
    /// Lists ids of direct replies to any of the given comments.
    fn reply_ids(&self, parents: &[CommentId]) -> RepoResult<Vec<CommentId>>;
    /// Removes the given comments and their vote rows.
    fn delete_comments(&self, ids: &[CommentId]) -> RepoResult<usize>;
    /// Lists comments whose post parent or reply parent no longer exists.
    fn orphan_ids(&self) -> RepoResult<Vec<CommentId>>;
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    /// Attaches to a connection already validated by `open_db`.
    pub(crate) fn attach(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn create_comment(
        &self,
        author: UserId,
        parent: PostRef,
        parent_comment: Option<CommentId>,
        body: &str,
    ) -> RepoResult<Comment> {
        let uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO comments (
                uuid,
                author_uuid,
                parent_kind,
                parent_uuid,
                parent_comment_uuid,
                body
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                uuid.to_string(),
                author.to_string(),
                post_kind_to_db(parent.kind()),
                parent.id().to_string(),
                parent_comment.map(|value| value.to_string()),
                body
            ],
        )?;
        self.get_comment(uuid)?
            .ok_or(RepoError::CommentNotFound(uuid))
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMMENT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_comment_row(row)?));
        }
        Ok(None)
    }

    fn list_for_post(&self, parent: PostRef) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL}
             WHERE parent_kind = ?1 AND parent_uuid = ?2
             ORDER BY created_at DESC, uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![
            post_kind_to_db(parent.kind()),
            parent.id().to_string()
        ])?;

        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }

    fn get_comment_vote(&self, id: CommentId, voter: UserId) -> RepoResult<Option<Direction>> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT direction FROM comment_votes
                 WHERE comment_uuid = ?1 AND voter_uuid = ?2;",
                params![id.to_string(), voter.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(raw) => Ok(Some(parse_direction(raw, "comment_votes.direction")?)),
            None => Ok(None),
        }
    }

    fn set_comment_vote(
        &self,
        id: CommentId,
        voter: UserId,
        direction: Option<Direction>,
    ) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM comment_votes WHERE comment_uuid = ?1 AND voter_uuid = ?2;",
            params![id.to_string(), voter.to_string()],
        )?;

        if let Some(direction) = direction {
            self.conn.execute(
                "INSERT INTO comment_votes (comment_uuid, voter_uuid, direction)
                 VALUES (?1, ?2, ?3);",
                params![id.to_string(), voter.to_string(), direction.signum()],
            )?;
        }
        Ok(())
    }

    fn comment_votes(&self, id: CommentId) -> RepoResult<Vec<CommentVote>> {
        let mut stmt = self.conn.prepare(
            "SELECT voter_uuid, direction FROM comment_votes
             WHERE comment_uuid = ?1
             ORDER BY voter_uuid ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;

        let mut votes = Vec::new();
        while let Some(row) = rows.next()? {
            let voter_text: String = row.get("voter_uuid")?;
            let raw: i64 = row.get("direction")?;
            votes.push(CommentVote {
                voter_uuid: parse_uuid(&voter_text, "comment_votes.voter_uuid")?,
                direction: parse_direction(raw, "comment_votes.direction")?,
            });
        }
        Ok(votes)
    }

    fn comment_tally(&self, id: CommentId) -> RepoResult<VoteTally> {
        let tally = self.conn.query_row(
            "SELECT
                COUNT(CASE WHEN direction = 1 THEN 1 END),
                COUNT(CASE WHEN direction = -1 THEN 1 END)
             FROM comment_votes
             WHERE comment_uuid = ?1;",
            [id.to_string()],
            |row| {
                Ok(VoteTally {
                    up: row.get(0)?,
                    down: row.get(1)?,
                })
            },
        )?;
        Ok(tally)
    }

    fn ids_for_post(&self, parent: PostRef) -> RepoResult<Vec<CommentId>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid FROM comments
             WHERE parent_kind = ?1 AND parent_uuid = ?2;",
        )?;
        let mut rows = stmt.query(params![
            post_kind_to_db(parent.kind()),
            parent.id().to_string()
        ])?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get("uuid")?;
            ids.push(parse_uuid(&text, "comments.uuid")?);
        }
        Ok(ids)
    }

    fn reply_ids(&self, parents: &[CommentId]) -> RepoResult<Vec<CommentId>> {
        if parents.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = placeholder_list(parents.len());
        let mut stmt = self.conn.prepare(&format!(
            "SELECT uuid FROM comments WHERE parent_comment_uuid IN ({placeholders});"
        ))?;
        let mut rows = stmt.query(params_from_iter(id_values(parents)))?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get("uuid")?;
            ids.push(parse_uuid(&text, "comments.uuid")?);
        }
        Ok(ids)
    }

    fn delete_comments(&self, ids: &[CommentId]) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = placeholder_list(ids.len());
        self.conn.execute(
            &format!("DELETE FROM comment_votes WHERE comment_uuid IN ({placeholders});"),
            params_from_iter(id_values(ids)),
        )?;
        let removed = self.conn.execute(
            &format!("DELETE FROM comments WHERE uuid IN ({placeholders});"),
            params_from_iter(id_values(ids)),
        )?;
        Ok(removed)
    }

    fn orphan_ids(&self) -> RepoResult<Vec<CommentId>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.uuid FROM comments c
             WHERE (
                c.parent_kind = 'question'
                AND NOT EXISTS (SELECT 1 FROM questions q WHERE q.uuid = c.parent_uuid)
             ) OR (
                c.parent_kind = 'answer'
                AND NOT EXISTS (SELECT 1 FROM answers a WHERE a.uuid = c.parent_uuid)
             ) OR (
                c.parent_comment_uuid IS NOT NULL
                AND NOT EXISTS (SELECT 1 FROM comments p WHERE p.uuid = c.parent_comment_uuid)
             );",
        )?;
        let mut rows = stmt.query([])?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get("uuid")?;
            ids.push(parse_uuid(&text, "comments.uuid")?);
        }
        Ok(ids)
    }
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    let uuid_text: String = row.get("uuid")?;
    let author_text: String = row.get("author_uuid")?;
    let kind_text: String = row.get("parent_kind")?;
    let parent_text: String = row.get("parent_uuid")?;
    let reply_text: Option<String> = row.get("parent_comment_uuid")?;

    let kind = parse_post_kind(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid parent kind `{kind_text}` in comments.parent_kind"
        ))
    })?;
    let parent = PostRef::from_parts(kind, parse_uuid(&parent_text, "comments.parent_uuid")?);

    let parent_comment_uuid = match reply_text {
        Some(value) => Some(parse_uuid(&value, "comments.parent_comment_uuid")?),
        None => None,
    };

    Ok(Comment {
        uuid: parse_uuid(&uuid_text, "comments.uuid")?,
        author_uuid: parse_uuid(&author_text, "comments.author_uuid")?,
        parent,
        parent_comment_uuid,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
    })
}

fn placeholder_list(count: usize) -> String {
    let mut placeholders = String::new();
    for index in 1..=count {
        if index > 1 {
            placeholders.push_str(", ");
        }
        placeholders.push('?');
    }
    placeholders
}

fn id_values(ids: &[CommentId]) -> Vec<Value> {
    ids.iter().map(|id| Value::Text(id.to_string())).collect()
}
