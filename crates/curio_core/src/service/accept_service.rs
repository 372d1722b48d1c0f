//! Answer acceptance.
//!
//! # Responsibility
//! - Mark one answer as the accepted answer of its question and award the
//!   acceptance reputation bonus.
//!
//! # Invariants
//! - Only the question author may accept.
//! - The accepted answer must belong to the question being updated.
//! - Re-accepting the already accepted answer is a no-op; no second bonus.
//! - The marker flip and the bonus land in one transaction.

use crate::model::policy::InteractionPolicy;
use crate::model::post::{AnswerId, Question, QuestionId};
use crate::model::user::UserId;
use crate::model::vote::REP_ACCEPTED;
use crate::repo::post_repo::{PostRepository, SqlitePostRepository};
use crate::repo::user_repo::SqliteUserRepository;
use crate::repo::user_repo::UserRepository;
use crate::service::badge_service;
use crate::service::notification_service::{NotificationEvent, NotificationService};
use crate::service::{with_write_tx, ServiceError};
use log::info;
use rusqlite::Connection;

/// Acceptance controller for question authors.
pub struct AcceptService<'conn> {
    conn: &'conn Connection,
    policy: InteractionPolicy,
}

impl<'conn> AcceptService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_policy(conn, InteractionPolicy::default())
    }

    pub fn with_policy(conn: &'conn Connection, policy: InteractionPolicy) -> Self {
        Self { conn, policy }
    }

    /// Accepts `answer_id` on `question_id` as `actor`.
    ///
    /// Accepting a different answer later overwrites the marker; the earlier
    /// answerer keeps the bonus unless the policy revokes superseded
    /// acceptances. Returns the updated question.
    pub fn accept_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        actor: UserId,
    ) -> Result<Question, ServiceError> {
        let (question, event) = with_write_tx(self.conn, |tx| {
            let posts = SqlitePostRepository::attach(tx);
            let users = SqliteUserRepository::attach(tx);

            let question = posts
                .get_question(question_id)?
                .ok_or(ServiceError::QuestionNotFound(question_id))?;
            if question.author_uuid != actor {
                return Err(ServiceError::NotAuthorized {
                    actor,
                    action: "accept an answer on this question",
                });
            }
            let answer = posts
                .get_answer(answer_id)?
                .filter(|answer| answer.question_uuid == question_id)
                .ok_or(ServiceError::AnswerNotFound(answer_id))?;

            if question.accepted_answer_uuid == Some(answer_id) {
                return Ok((question, None));
            }

            if self.policy.revoke_superseded_acceptance {
                if let Some(previous_id) = question.accepted_answer_uuid {
                    if let Some(previous) = posts.get_answer(previous_id)? {
                        users.adjust_reputation(previous.author_uuid, -REP_ACCEPTED)?;
                    }
                }
            }

            posts.set_accepted_answer(question_id, Some(answer_id))?;
            let reputation = users.adjust_reputation(answer.author_uuid, REP_ACCEPTED)?;
            badge_service::award_missing(&users, answer.author_uuid, reputation)?;

            let updated = posts
                .get_question(question_id)?
                .ok_or(ServiceError::QuestionNotFound(question_id))?;
            let event = NotificationEvent::answer_accepted(
                answer.author_uuid,
                actor,
                question_id,
                answer_id,
                &answer.body,
            );
            Ok((updated, Some(event)))
        })?;

        if let Some(event) = event {
            info!(
                "event=answer_accepted module=accept status=ok question={question_id} answer={answer_id} actor={actor}"
            );
            NotificationService::new(self.conn).dispatch(event);
        }
        Ok(question)
    }
}
