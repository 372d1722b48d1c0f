//! Notification dispatch and read-state operations.
//!
//! # Responsibility
//! - Persist notification records for qualifying interaction events.
//! - Serve recipient inboxes, unread counts, and read-state mutations.
//!
//! # Invariants
//! - Dispatch is fire-and-forget: a failed insert is logged and swallowed,
//!   never propagated into the primary mutation's result.
//! - Self-notifications are suppressed before any write.
//! - Read-state mutations are recipient-only.

use crate::model::comment::{Comment, CommentId};
use crate::model::notification::{Notification, NotificationId, NotificationKind};
use crate::model::post::{AnswerId, PostRef, QuestionId};
use crate::model::user::UserId;
use crate::repo::notification_repo::{
    NewNotification, NotificationRepository, SqliteNotificationRepository,
};
use crate::service::ServiceError;
use log::{debug, error, info};
use rusqlite::Connection;

/// Hard cap on one inbox page.
const INBOX_LIMIT: u32 = 100;

/// One qualifying interaction event, ready for dispatch.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub recipient: UserId,
    pub sender: UserId,
    pub kind: NotificationKind,
    pub question_uuid: Option<QuestionId>,
    pub answer_uuid: Option<AnswerId>,
    pub comment_uuid: Option<CommentId>,
    /// Text snapshot taken at event time; survives source deletion.
    pub snapshot_text: Option<String>,
}

impl NotificationEvent {
    /// A new answer landed on the recipient's question.
    pub fn answer_posted(
        recipient: UserId,
        sender: UserId,
        question: QuestionId,
        answer: AnswerId,
        body: &str,
    ) -> Self {
        Self {
            recipient,
            sender,
            kind: NotificationKind::Answer,
            question_uuid: Some(question),
            answer_uuid: Some(answer),
            comment_uuid: None,
            snapshot_text: Some(body.to_owned()),
        }
    }

    /// A new comment landed under the recipient's post.
    pub fn comment_posted(recipient: UserId, comment: &Comment) -> Self {
        let (question_uuid, answer_uuid) = split_post_ref(comment.parent);
        Self {
            recipient,
            sender: comment.author_uuid,
            kind: NotificationKind::Comment,
            question_uuid,
            answer_uuid,
            comment_uuid: Some(comment.uuid),
            snapshot_text: Some(comment.body.clone()),
        }
    }

    /// The recipient's post received an upvote.
    pub fn post_upvoted(recipient: UserId, sender: UserId, post: PostRef, body: &str) -> Self {
        let (question_uuid, answer_uuid) = split_post_ref(post);
        Self {
            recipient,
            sender,
            kind: NotificationKind::Upvote,
            question_uuid,
            answer_uuid,
            comment_uuid: None,
            snapshot_text: Some(body.to_owned()),
        }
    }

    /// The recipient's comment received an upvote.
    pub fn comment_upvoted(recipient: UserId, sender: UserId, comment: &Comment) -> Self {
        let (question_uuid, answer_uuid) = split_post_ref(comment.parent);
        Self {
            recipient,
            sender,
            kind: NotificationKind::Upvote,
            question_uuid,
            answer_uuid,
            comment_uuid: Some(comment.uuid),
            snapshot_text: Some(comment.body.clone()),
        }
    }

    /// The recipient's answer was accepted.
    pub fn answer_accepted(
        recipient: UserId,
        sender: UserId,
        question: QuestionId,
        answer: AnswerId,
        body: &str,
    ) -> Self {
        Self {
            recipient,
            sender,
            kind: NotificationKind::Accepted,
            question_uuid: Some(question),
            answer_uuid: Some(answer),
            comment_uuid: None,
            snapshot_text: Some(body.to_owned()),
        }
    }
}

fn split_post_ref(post: PostRef) -> (Option<QuestionId>, Option<AnswerId>) {
    match post {
        PostRef::Question(id) => (Some(id), None),
        PostRef::Answer(id) => (None, Some(id)),
    }
}

/// Notification dispatch and inbox service.
pub struct NotificationService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> NotificationService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Persists one event, best effort.
    ///
    /// Runs after the triggering mutation has committed. Failures are
    /// logged and dropped so the caller's result is never affected.
    pub fn dispatch(&self, event: NotificationEvent) {
        if event.recipient == event.sender {
            debug!(
                "event=notify_suppressed module=notify status=ok reason=self kind={} user={}",
                event.kind.label(),
                event.sender
            );
            return;
        }

        let repo = SqliteNotificationRepository::attach(self.conn);
        let record = NewNotification {
            recipient_uuid: event.recipient,
            sender_uuid: event.sender,
            kind: event.kind,
            question_uuid: event.question_uuid,
            answer_uuid: event.answer_uuid,
            comment_uuid: event.comment_uuid,
            snapshot_text: event.snapshot_text,
        };
        match repo.insert(&record) {
            Ok(id) => info!(
                "event=notify_dispatched module=notify status=ok kind={} recipient={} id={id}",
                event.kind.label(),
                event.recipient
            ),
            Err(err) => error!(
                "event=notify_dispatch module=notify status=error kind={} recipient={} error={err}",
                event.kind.label(),
                event.recipient
            ),
        }
    }

    /// Lists the recipient's inbox, newest first, capped at 100 records.
    pub fn list_for(&self, recipient: UserId) -> Result<Vec<Notification>, ServiceError> {
        let repo = SqliteNotificationRepository::try_new(self.conn)?;
        Ok(repo.list_for_recipient(recipient, INBOX_LIMIT)?)
    }

    /// Counts the recipient's unread records.
    pub fn unread_count(&self, recipient: UserId) -> Result<i64, ServiceError> {
        let repo = SqliteNotificationRepository::try_new(self.conn)?;
        Ok(repo.unread_count(recipient)?)
    }

    /// Marks one record read. Idempotent; recipient-only.
    pub fn mark_read(
        &self,
        id: NotificationId,
        actor: UserId,
    ) -> Result<Notification, ServiceError> {
        let repo = SqliteNotificationRepository::try_new(self.conn)?;
        let mut notification = repo
            .get(id)?
            .ok_or(ServiceError::NotificationNotFound(id))?;
        if notification.recipient_uuid != actor {
            return Err(ServiceError::NotAuthorized {
                actor,
                action: "mark this notification read",
            });
        }
        if !notification.is_read {
            repo.mark_read(id)?;
            notification.is_read = true;
        }
        Ok(notification)
    }

    /// Marks all of the actor's unread records read; returns how many changed.
    pub fn mark_all_read(&self, actor: UserId) -> Result<usize, ServiceError> {
        let repo = SqliteNotificationRepository::try_new(self.conn)?;
        let changed = repo.mark_all_read(actor)?;
        info!("event=notify_mark_all module=notify status=ok user={actor} changed={changed}");
        Ok(changed)
    }
}
