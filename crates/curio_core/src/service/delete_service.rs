//! Cascade deletion and orphan repair.
//!
//! # Responsibility
//! - Remove questions, answers, and comments together with every dependent
//!   record: vote rows, child answers, and full comment reply trees.
//! - Sweep comments stranded by interrupted cascades.
//!
//! # Invariants
//! - Only the author may delete their content.
//! - The parent's own row is removed last, so an interrupted cascade leaves
//!   the parent present and the operation retryable.
//! - Comment reply trees are collected iteratively over the parent index,
//!   never via recursive SQL.
//! - A failure after the first destructive step surfaces as
//!   `CascadeIncomplete`; earlier failures surface as ordinary errors.

use crate::model::comment::CommentId;
use crate::model::post::{AnswerId, QuestionId};
use crate::model::user::UserId;
use crate::repo::comment_repo::{CommentRepository, SqliteCommentRepository};
use crate::repo::post_repo::{PostRepository, SqlitePostRepository};
use crate::service::{with_write_tx, ServiceError};
use log::info;
use rusqlite::Connection;
use std::collections::HashSet;

/// Upper bound on comments removed per cascade sub-transaction.
const CASCADE_CHUNK: usize = 200;

/// Counts of dependent records removed by one cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub comments_removed: usize,
    pub answers_removed: usize,
}

/// Cascade deleter for questions, answers, and comments.
pub struct DeleteService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> DeleteService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Deletes a question with its answers, comment trees, and vote rows.
    pub fn delete_question(
        &self,
        id: QuestionId,
        actor: UserId,
    ) -> Result<CascadeOutcome, ServiceError> {
        let posts = SqlitePostRepository::try_new(self.conn)?;
        let comments = SqliteCommentRepository::try_new(self.conn)?;

        let question = posts
            .get_question(id)?
            .ok_or(ServiceError::QuestionNotFound(id))?;
        if question.author_uuid != actor {
            return Err(ServiceError::NotAuthorized {
                actor,
                action: "delete this question",
            });
        }
        let answers = posts.list_answers(id)?;

        let mut seeds = comments.ids_for_post(question.post_ref())?;
        for answer in &answers {
            seeds.extend(comments.ids_for_post(answer.post_ref())?);
        }
        let tree = collect_comment_tree(&comments, seeds)?;

        let comments_removed = delete_comment_chunks(self.conn, &tree)?;

        // Parent row goes last; its FK clears accepted_answer_uuid when the
        // accepted answer row is removed first.
        with_write_tx(self.conn, |tx| {
            let posts = SqlitePostRepository::attach(tx);
            for answer in &answers {
                posts.delete_votes_for_post(answer.post_ref())?;
                posts.delete_answer_row(answer.uuid)?;
            }
            posts.delete_votes_for_post(question.post_ref())?;
            posts.delete_question_row(id)?;
            Ok(())
        })
        .map_err(|err| {
            if comments_removed > 0 {
                cascade_stage("question posts", err)
            } else {
                err
            }
        })?;

        let outcome = CascadeOutcome {
            comments_removed,
            answers_removed: answers.len(),
        };
        info!(
            "event=question_deleted module=delete status=ok question={id} actor={actor} answers={} comments={}",
            outcome.answers_removed, outcome.comments_removed
        );
        Ok(outcome)
    }

    /// Deletes an answer with its comment tree and vote rows.
    pub fn delete_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        actor: UserId,
    ) -> Result<CascadeOutcome, ServiceError> {
        let posts = SqlitePostRepository::try_new(self.conn)?;
        let comments = SqliteCommentRepository::try_new(self.conn)?;

        if posts.get_question(question_id)?.is_none() {
            return Err(ServiceError::QuestionNotFound(question_id));
        }
        let answer = posts
            .get_answer(answer_id)?
            .filter(|answer| answer.question_uuid == question_id)
            .ok_or(ServiceError::AnswerNotFound(answer_id))?;
        if answer.author_uuid != actor {
            return Err(ServiceError::NotAuthorized {
                actor,
                action: "delete this answer",
            });
        }

        let seeds = comments.ids_for_post(answer.post_ref())?;
        let tree = collect_comment_tree(&comments, seeds)?;

        let comments_removed = delete_comment_chunks(self.conn, &tree)?;

        with_write_tx(self.conn, |tx| {
            let posts = SqlitePostRepository::attach(tx);
            posts.delete_votes_for_post(answer.post_ref())?;
            posts.delete_answer_row(answer_id)?;
            Ok(())
        })
        .map_err(|err| {
            if comments_removed > 0 {
                cascade_stage("answer post", err)
            } else {
                err
            }
        })?;

        let outcome = CascadeOutcome {
            comments_removed,
            answers_removed: 1,
        };
        info!(
            "event=answer_deleted module=delete status=ok answer={answer_id} question={question_id} actor={actor} comments={}",
            outcome.comments_removed
        );
        Ok(outcome)
    }

    /// Deletes a comment together with its transitive reply tree.
    pub fn delete_comment(
        &self,
        id: CommentId,
        actor: UserId,
    ) -> Result<CascadeOutcome, ServiceError> {
        let comments = SqliteCommentRepository::try_new(self.conn)?;

        let comment = comments
            .get_comment(id)?
            .ok_or(ServiceError::CommentNotFound(id))?;
        if comment.author_uuid != actor {
            return Err(ServiceError::NotAuthorized {
                actor,
                action: "delete this comment",
            });
        }

        let tree = collect_comment_tree(&comments, vec![id])?;
        // Descendants first, root last, so an interrupted run keeps the
        // root visible for retry.
        let descendants: Vec<CommentId> =
            tree.iter().copied().filter(|tree_id| *tree_id != id).collect();

        let tree_removed = delete_comment_chunks(self.conn, &descendants)?;
        let root_removed = with_write_tx(self.conn, |tx| {
            let comments = SqliteCommentRepository::attach(tx);
            Ok(comments.delete_comments(&[id])?)
        })
        .map_err(|err| {
            if tree_removed > 0 {
                cascade_stage("comment root", err)
            } else {
                err
            }
        })?;
        let comments_removed = tree_removed + root_removed;

        info!(
            "event=comment_deleted module=delete status=ok comment={id} actor={actor} removed={comments_removed}"
        );
        Ok(CascadeOutcome {
            comments_removed,
            answers_removed: 0,
        })
    }

    /// Sweeps comments whose post or reply parent no longer exists.
    ///
    /// Runs to a fixpoint: removing an orphan can orphan its replies, which
    /// the next pass picks up. Returns the total removed.
    pub fn repair_orphan_comments(&self) -> Result<usize, ServiceError> {
        let comments = SqliteCommentRepository::try_new(self.conn)?;
        let mut total = 0;
        loop {
            let orphans = comments.orphan_ids()?;
            if orphans.is_empty() {
                break;
            }
            for chunk in orphans.chunks(CASCADE_CHUNK) {
                total += with_write_tx(self.conn, |tx| {
                    let comments = SqliteCommentRepository::attach(tx);
                    Ok(comments.delete_comments(chunk)?)
                })?;
            }
        }
        if total > 0 {
            info!("event=orphan_repair module=delete status=ok removed={total}");
        }
        Ok(total)
    }
}

/// Collects the transitive reply closure of `seeds`, seeds included.
///
/// Breadth-first over the parent index; the seen set guards against
/// malformed reply cycles in persisted data.
fn collect_comment_tree(
    comments: &SqliteCommentRepository<'_>,
    seeds: Vec<CommentId>,
) -> Result<Vec<CommentId>, ServiceError> {
    let mut seen: HashSet<CommentId> = seeds.iter().copied().collect();
    let mut ordered = seeds.clone();
    let mut frontier = seeds;
    while !frontier.is_empty() {
        let replies = comments.reply_ids(&frontier)?;
        frontier = replies
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();
        ordered.extend(frontier.iter().copied());
    }
    Ok(ordered)
}

/// Removes comments in bounded sub-transactions.
fn delete_comment_chunks(conn: &Connection, ids: &[CommentId]) -> Result<usize, ServiceError> {
    let mut removed = 0;
    for chunk in ids.chunks(CASCADE_CHUNK) {
        let result = with_write_tx(conn, |tx| {
            let comments = SqliteCommentRepository::attach(tx);
            Ok(comments.delete_comments(chunk)?)
        });
        match result {
            Ok(count) => removed += count,
            Err(err) if removed > 0 => return Err(cascade_stage("comment tree", err)),
            Err(err) => return Err(err),
        }
    }
    Ok(removed)
}

fn cascade_stage(stage: &'static str, err: ServiceError) -> ServiceError {
    ServiceError::CascadeIncomplete {
        stage,
        source: Box::new(err),
    }
}
