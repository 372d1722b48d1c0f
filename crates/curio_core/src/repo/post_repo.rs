//! Question/answer repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs for questions and answers plus the post vote ledger.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `set_post_vote` removes any prior `(post, voter)` row before inserting
//!   the new direction; the table's primary key backs mutual exclusion.
//! - Question listing is deterministic: `created_at DESC, uuid ASC`.

use crate::model::post::{Answer, AnswerId, PostRef, Question, QuestionId};
use crate::model::user::UserId;
use crate::model::vote::{Direction, VoteTally};
use crate::repo::{
    ensure_ready, parse_direction, parse_uuid, post_kind_to_db, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const REQUIRED_TABLES: &[&str] = &["questions", "answers", "post_votes"];

const QUESTION_SELECT_SQL: &str = "SELECT
    uuid,
    author_uuid,
    title,
    body,
    accepted_answer_uuid,
    views,
    created_at,
    updated_at
FROM questions";

const ANSWER_SELECT_SQL: &str = "SELECT
    uuid,
    question_uuid,
    author_uuid,
    body,
    created_at
FROM answers";

const QUESTIONS_DEFAULT_LIMIT: u32 = 20;
const QUESTIONS_LIMIT_MAX: u32 = 50;

/// Query options for listing questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionListQuery {
    /// Maximum rows to return. Defaults to 20 and clamps to 50.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Author and body of a votable post, resolved through its tagged ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub author_uuid: UserId,
    pub body: String,
}

/// Repository interface for question/answer persistence and vote rows.
pub trait PostRepository {
    /// Creates one question.
    fn create_question(&self, author: UserId, title: &str, body: &str) -> RepoResult<Question>;
    /// Loads one question by id.
    fn get_question(&self, id: QuestionId) -> RepoResult<Option<Question>>;
    /// Lists questions newest first with pagination.
    fn list_questions(&self, query: &QuestionListQuery) -> RepoResult<Vec<Question>>;
    /// Atomically bumps the view counter.
    fn increment_views(&self, id: QuestionId) -> RepoResult<()>;
    /// Sets or clears the accepted answer reference.
    fn set_accepted_answer(&self, id: QuestionId, answer: Option<AnswerId>) -> RepoResult<()>;
    /// Creates one answer under a question.
    fn create_answer(&self, question: QuestionId, author: UserId, body: &str)
        -> RepoResult<Answer>;
    /// Loads one answer by id.
    fn get_answer(&self, id: AnswerId) -> RepoResult<Option<Answer>>;
    /// Lists answers of one question in creation order.
    fn list_answers(&self, question: QuestionId) -> RepoResult<Vec<Answer>>;
    /// Resolves the author and body behind a post reference.
    fn post_summary(&self, post: PostRef) -> RepoResult<Option<PostSummary>>;
    /// Returns the voter's current direction on a post.
    fn get_post_vote(&self, post: PostRef, voter: UserId) -> RepoResult<Option<Direction>>;
    /// Replaces the voter's `(post, voter)` row; `None` removes it.
    fn set_post_vote(
        &self,
        post: PostRef,
        voter: UserId,
        direction: Option<Direction>,
    ) -> RepoResult<()>;
    /// Tallies up/down votes for a post.
    fn post_tally(&self, post: PostRef) -> RepoResult<VoteTally>;
    /// Removes one question row.
    fn delete_question_row(&self, id: QuestionId) -> RepoResult<()>;
    /// Removes one answer row.
    fn delete_answer_row(&self, id: AnswerId) -> RepoResult<()>;
    /// Removes all vote rows of one post.
    fn delete_votes_for_post(&self, post: PostRef) -> RepoResult<usize>;
}

/// SQLite-backed question/answer repository.
#[derive(Debug)]
pub struct SqlitePostRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
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

impl PostRepository for SqlitePostRepository<'_> {
    fn create_question(&self, author: UserId, title: &str, body: &str) -> RepoResult<Question> {
        let uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO questions (uuid, author_uuid, title, body)
             VALUES (?1, ?2, ?3, ?4);",
            params![uuid.to_string(), author.to_string(), title, body],
        )?;
        self.get_question(uuid)?
            .ok_or(RepoError::QuestionNotFound(uuid))
    }

    fn get_question(&self, id: QuestionId) -> RepoResult<Option<Question>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{QUESTION_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_question_row(row)?));
        }
        Ok(None)
    }

    fn list_questions(&self, query: &QuestionListQuery) -> RepoResult<Vec<Question>> {
        let limit = query
            .limit
            .unwrap_or(QUESTIONS_DEFAULT_LIMIT)
            .min(QUESTIONS_LIMIT_MAX);
        let mut stmt = self.conn.prepare(&format!(
            "{QUESTION_SELECT_SQL}
             ORDER BY created_at DESC, uuid ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(limit), i64::from(query.offset)])?;

        let mut questions = Vec::new();
        while let Some(row) = rows.next()? {
            questions.push(parse_question_row(row)?);
        }
        Ok(questions)
    }

    fn increment_views(&self, id: QuestionId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE questions SET views = views + 1 WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::QuestionNotFound(id));
        }
        Ok(())
    }

    fn set_accepted_answer(&self, id: QuestionId, answer: Option<AnswerId>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE questions
             SET accepted_answer_uuid = ?1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2;",
            params![answer.map(|value| value.to_string()), id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::QuestionNotFound(id));
        }
        Ok(())
    }

    fn create_answer(
        &self,
        question: QuestionId,
        author: UserId,
        body: &str,
    ) -> RepoResult<Answer> {
        let uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO answers (uuid, question_uuid, author_uuid, body)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                uuid.to_string(),
                question.to_string(),
                author.to_string(),
                body
            ],
        )?;
        self.get_answer(uuid)?.ok_or(RepoError::AnswerNotFound(uuid))
    }

    fn get_answer(&self, id: AnswerId) -> RepoResult<Option<Answer>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ANSWER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_answer_row(row)?));
        }
        Ok(None)
    }

    fn list_answers(&self, question: QuestionId) -> RepoResult<Vec<Answer>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ANSWER_SELECT_SQL}
             WHERE question_uuid = ?1
             ORDER BY created_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([question.to_string()])?;

        let mut answers = Vec::new();
        while let Some(row) = rows.next()? {
            answers.push(parse_answer_row(row)?);
        }
        Ok(answers)
    }

    fn post_summary(&self, post: PostRef) -> RepoResult<Option<PostSummary>> {
        let summary = match post {
            PostRef::Question(id) => self.get_question(id)?.map(|question| PostSummary {
                author_uuid: question.author_uuid,
                body: question.body,
            }),
            PostRef::Answer(id) => self.get_answer(id)?.map(|answer| PostSummary {
                author_uuid: answer.author_uuid,
                body: answer.body,
            }),
        };
        Ok(summary)
    }

    fn get_post_vote(&self, post: PostRef, voter: UserId) -> RepoResult<Option<Direction>> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT direction FROM post_votes
                 WHERE post_uuid = ?1 AND voter_uuid = ?2;",
                params![post.id().to_string(), voter.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(raw) => Ok(Some(parse_direction(raw, "post_votes.direction")?)),
            None => Ok(None),
        }
    }

    fn set_post_vote(
        &self,
        post: PostRef,
        voter: UserId,
        direction: Option<Direction>,
    ) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM post_votes WHERE post_uuid = ?1 AND voter_uuid = ?2;",
            params![post.id().to_string(), voter.to_string()],
        )?;

        if let Some(direction) = direction {
            self.conn.execute(
                "INSERT INTO post_votes (post_uuid, post_kind, voter_uuid, direction)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    post.id().to_string(),
                    post_kind_to_db(post.kind()),
                    voter.to_string(),
                    direction.signum()
                ],
            )?;
        }
        Ok(())
    }

    fn post_tally(&self, post: PostRef) -> RepoResult<VoteTally> {
        let tally = self.conn.query_row(
            "SELECT
                COUNT(CASE WHEN direction = 1 THEN 1 END),
                COUNT(CASE WHEN direction = -1 THEN 1 END)
             FROM post_votes
             WHERE post_uuid = ?1;",
            [post.id().to_string()],
            |row| {
                Ok(VoteTally {
                    up: row.get(0)?,
                    down: row.get(1)?,
                })
            },
        )?;
        Ok(tally)
    }

    fn delete_question_row(&self, id: QuestionId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM questions WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::QuestionNotFound(id));
        }
        Ok(())
    }

    fn delete_answer_row(&self, id: AnswerId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM answers WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::AnswerNotFound(id));
        }
        Ok(())
    }

    fn delete_votes_for_post(&self, post: PostRef) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM post_votes WHERE post_uuid = ?1;",
            [post.id().to_string()],
        )?;
        Ok(removed)
    }
}

fn parse_question_row(row: &Row<'_>) -> RepoResult<Question> {
    let uuid_text: String = row.get("uuid")?;
    let author_text: String = row.get("author_uuid")?;
    let accepted_text: Option<String> = row.get("accepted_answer_uuid")?;

    let accepted_answer_uuid = match accepted_text {
        Some(value) => Some(parse_uuid(&value, "questions.accepted_answer_uuid")?),
        None => None,
    };

    Ok(Question {
        uuid: parse_uuid(&uuid_text, "questions.uuid")?,
        author_uuid: parse_uuid(&author_text, "questions.author_uuid")?,
        title: row.get("title")?,
        body: row.get("body")?,
        accepted_answer_uuid,
        views: row.get("views")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_answer_row(row: &Row<'_>) -> RepoResult<Answer> {
    let uuid_text: String = row.get("uuid")?;
    let question_text: String = row.get("question_uuid")?;
    let author_text: String = row.get("author_uuid")?;

    Ok(Answer {
        uuid: parse_uuid(&uuid_text, "answers.uuid")?,
        question_uuid: parse_uuid(&question_text, "answers.question_uuid")?,
        author_uuid: parse_uuid(&author_text, "answers.author_uuid")?,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
    })
}
