//! Content creation and read paths.
//!
//! # Responsibility
//! - Register users and create questions, answers, and threaded comments.
//! - Serve question views with atomic view counting and paginated listings.
//!
//! # Invariants
//! - Required text fields are rejected when blank before any write.
//! - A reply's target comment must hang under the same post as the reply.
//! - Answer and comment notifications dispatch only after the content has
//!   committed.

use crate::model::comment::{Comment, CommentId};
use crate::model::post::{Answer, PostRef, Question, QuestionId};
use crate::model::user::{User, UserId};
use crate::model::vote::VoteTally;
use crate::repo::comment_repo::{CommentRepository, SqliteCommentRepository};
use crate::repo::post_repo::{
    PostRepository, QuestionListQuery, SqlitePostRepository,
};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::service::notification_service::{NotificationEvent, NotificationService};
use crate::service::{post_not_found, require_filled, with_write_tx, ServiceError};
use log::info;
use rusqlite::Connection;

/// One listed comment together with its current vote tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentWithTally {
    pub comment: Comment,
    pub tally: VoteTally,
}

/// Content service for users, questions, answers, and comments.
pub struct PostService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> PostService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Registers a user with zero reputation and no badges.
    pub fn register_user(&self, display_name: &str) -> Result<User, ServiceError> {
        let display_name = require_filled(display_name, "display name")?;
        let user = with_write_tx(self.conn, |tx| {
            let users = SqliteUserRepository::attach(tx);
            Ok(users.create_user(display_name)?)
        })?;
        info!(
            "event=user_registered module=post status=ok user={}",
            user.uuid
        );
        Ok(user)
    }

    /// Creates a question authored by `actor`.
    pub fn post_question(
        &self,
        actor: UserId,
        title: &str,
        body: &str,
    ) -> Result<Question, ServiceError> {
        let title = require_filled(title, "title")?;
        let body = require_filled(body, "body")?;
        let question = with_write_tx(self.conn, |tx| {
            let posts = SqlitePostRepository::attach(tx);
            let users = SqliteUserRepository::attach(tx);
            if !users.exists(actor)? {
                return Err(ServiceError::UserNotFound(actor));
            }
            Ok(posts.create_question(actor, title, body)?)
        })?;
        info!(
            "event=question_posted module=post status=ok question={} author={actor}",
            question.uuid
        );
        Ok(question)
    }

    /// Creates an answer under a question and notifies the question author.
    pub fn post_answer(
        &self,
        question_id: QuestionId,
        actor: UserId,
        body: &str,
    ) -> Result<Answer, ServiceError> {
        let body = require_filled(body, "body")?;
        let (answer, event) = with_write_tx(self.conn, |tx| {
            let posts = SqlitePostRepository::attach(tx);
            let users = SqliteUserRepository::attach(tx);
            if !users.exists(actor)? {
                return Err(ServiceError::UserNotFound(actor));
            }
            let question = posts
                .get_question(question_id)?
                .ok_or(ServiceError::QuestionNotFound(question_id))?;
            let answer = posts.create_answer(question_id, actor, body)?;
            let event = NotificationEvent::answer_posted(
                question.author_uuid,
                actor,
                question_id,
                answer.uuid,
                &answer.body,
            );
            Ok((answer, event))
        })?;
        info!(
            "event=answer_posted module=post status=ok answer={} question={question_id} author={actor}",
            answer.uuid
        );
        NotificationService::new(self.conn).dispatch(event);
        Ok(answer)
    }

    /// Creates a comment under a post, optionally replying to another
    /// comment in the same thread, and notifies the post author.
    pub fn post_comment(
        &self,
        parent: PostRef,
        actor: UserId,
        body: &str,
        reply_to: Option<CommentId>,
    ) -> Result<Comment, ServiceError> {
        let body = require_filled(body, "body")?;
        let (comment, event) = with_write_tx(self.conn, |tx| {
            let posts = SqlitePostRepository::attach(tx);
            let comments = SqliteCommentRepository::attach(tx);
            let users = SqliteUserRepository::attach(tx);

            if !users.exists(actor)? {
                return Err(ServiceError::UserNotFound(actor));
            }
            let summary = posts.post_summary(parent)?.ok_or_else(|| post_not_found(parent))?;
            if let Some(reply_to) = reply_to {
                let target = comments
                    .get_comment(reply_to)?
                    .ok_or(ServiceError::CommentNotFound(reply_to))?;
                if target.parent != parent {
                    return Err(ServiceError::ReplyOutsideThread { reply_to });
                }
            }

            let comment = comments.create_comment(actor, parent, reply_to, body)?;
            let event = NotificationEvent::comment_posted(summary.author_uuid, &comment);
            Ok((comment, event))
        })?;
        info!(
            "event=comment_posted module=post status=ok comment={} parent={} author={actor}",
            comment.uuid,
            parent.id()
        );
        NotificationService::new(self.conn).dispatch(event);
        Ok(comment)
    }

    /// Loads one question without touching its view counter.
    pub fn get_question(&self, id: QuestionId) -> Result<Question, ServiceError> {
        let posts = SqlitePostRepository::try_new(self.conn)?;
        posts
            .get_question(id)?
            .ok_or(ServiceError::QuestionNotFound(id))
    }

    /// Loads one question for display, bumping its view counter atomically.
    pub fn view_question(&self, id: QuestionId) -> Result<Question, ServiceError> {
        with_write_tx(self.conn, |tx| {
            let posts = SqlitePostRepository::attach(tx);
            posts.increment_views(id)?;
            Ok(posts
                .get_question(id)?
                .ok_or(ServiceError::QuestionNotFound(id))?)
        })
    }

    /// Lists questions newest first with pagination.
    pub fn list_questions(&self, query: &QuestionListQuery) -> Result<Vec<Question>, ServiceError> {
        let posts = SqlitePostRepository::try_new(self.conn)?;
        Ok(posts.list_questions(query)?)
    }

    /// Lists a question's answers in creation order.
    pub fn list_answers(&self, question_id: QuestionId) -> Result<Vec<Answer>, ServiceError> {
        let posts = SqlitePostRepository::try_new(self.conn)?;
        if posts.get_question(question_id)?.is_none() {
            return Err(ServiceError::QuestionNotFound(question_id));
        }
        Ok(posts.list_answers(question_id)?)
    }

    /// Lists a post's comments, newest first, with their vote tallies.
    pub fn list_comments(&self, parent: PostRef) -> Result<Vec<CommentWithTally>, ServiceError> {
        let posts = SqlitePostRepository::try_new(self.conn)?;
        if posts.post_summary(parent)?.is_none() {
            return Err(post_not_found(parent));
        }
        let comments = SqliteCommentRepository::attach(self.conn);
        let mut listed = Vec::new();
        for comment in comments.list_for_post(parent)? {
            let tally = comments.comment_tally(comment.uuid)?;
            listed.push(CommentWithTally { comment, tally });
        }
        Ok(listed)
    }
}
