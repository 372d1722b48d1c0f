//! Notification repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist denormalized notification records and read-state queries.
//!
//! # Invariants
//! - Records are insert-only except for the `is_read` flag.
//! - Recipient listings are deterministic: `created_at DESC, uuid ASC`.

use crate::model::notification::{Notification, NotificationId, NotificationKind};
use crate::model::user::UserId;
use crate::repo::{ensure_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const REQUIRED_TABLES: &[&str] = &["notifications"];

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    uuid,
    recipient_uuid,
    sender_uuid,
    kind,
    question_uuid,
    answer_uuid,
    comment_uuid,
    snapshot_text,
    is_read,
    created_at
FROM notifications";

/// Insert model for one notification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient_uuid: UserId,
    pub sender_uuid: UserId,
    pub kind: NotificationKind,
    pub question_uuid: Option<Uuid>,
    pub answer_uuid: Option<Uuid>,
    pub comment_uuid: Option<Uuid>,
    pub snapshot_text: Option<String>,
}

/// Repository interface for notification persistence.
pub trait NotificationRepository {
    /// Persists one record and returns its id.
    fn insert(&self, record: &NewNotification) -> RepoResult<NotificationId>;
    /// Loads one record by id.
    fn get(&self, id: NotificationId) -> RepoResult<Option<Notification>>;
    /// Lists a recipient's records, newest first, up to `limit`.
    fn list_for_recipient(&self, recipient: UserId, limit: u32) -> RepoResult<Vec<Notification>>;
    /// Counts a recipient's unread records.
    fn unread_count(&self, recipient: UserId) -> RepoResult<i64>;
    /// Flags one record as read.
    fn mark_read(&self, id: NotificationId) -> RepoResult<()>;
    /// Flags all of a recipient's unread records as read; returns how many.
    fn mark_all_read(&self, recipient: UserId) -> RepoResult<usize>;
}

/// SQLite-backed notification repository.
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
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

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn insert(&self, record: &NewNotification) -> RepoResult<NotificationId> {
        let uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO notifications (
                uuid,
                recipient_uuid,
                sender_uuid,
                kind,
                question_uuid,
                answer_uuid,
                comment_uuid,
                snapshot_text
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                uuid.to_string(),
                record.recipient_uuid.to_string(),
                record.sender_uuid.to_string(),
                record.kind.label(),
                record.question_uuid.map(|value| value.to_string()),
                record.answer_uuid.map(|value| value.to_string()),
                record.comment_uuid.map(|value| value.to_string()),
                record.snapshot_text.as_deref(),
            ],
        )?;
        Ok(uuid)
    }

    fn get(&self, id: NotificationId) -> RepoResult<Option<Notification>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTIFICATION_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_notification_row(row)?));
        }
        Ok(None)
    }

    fn list_for_recipient(&self, recipient: UserId, limit: u32) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL}
             WHERE recipient_uuid = ?1
             ORDER BY created_at DESC, uuid ASC
             LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![recipient.to_string(), i64::from(limit)])?;

        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }

    fn unread_count(&self, recipient: UserId) -> RepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications
             WHERE recipient_uuid = ?1 AND is_read = 0;",
            [recipient.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn mark_read(&self, id: NotificationId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotificationNotFound(id));
        }
        Ok(())
    }

    fn mark_all_read(&self, recipient: UserId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1
             WHERE recipient_uuid = ?1 AND is_read = 0;",
            [recipient.to_string()],
        )?;
        Ok(changed)
    }
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let uuid_text: String = row.get("uuid")?;
    let recipient_text: String = row.get("recipient_uuid")?;
    let sender_text: String = row.get("sender_uuid")?;
    let kind_text: String = row.get("kind")?;

    let kind = parse_kind(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid notification kind `{kind_text}` in notifications.kind"
        ))
    })?;

    let is_read = match row.get::<_, i64>("is_read")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_read value `{other}` in notifications.is_read"
            )));
        }
    };

    Ok(Notification {
        uuid: parse_uuid(&uuid_text, "notifications.uuid")?,
        recipient_uuid: parse_uuid(&recipient_text, "notifications.recipient_uuid")?,
        sender_uuid: parse_uuid(&sender_text, "notifications.sender_uuid")?,
        kind,
        question_uuid: parse_optional_uuid(row, "question_uuid")?,
        answer_uuid: parse_optional_uuid(row, "answer_uuid")?,
        comment_uuid: parse_optional_uuid(row, "comment_uuid")?,
        snapshot_text: row.get("snapshot_text")?,
        is_read,
        created_at: row.get("created_at")?,
    })
}

fn parse_optional_uuid(row: &Row<'_>, column: &str) -> RepoResult<Option<Uuid>> {
    match row.get::<_, Option<String>>(column)? {
        Some(value) => Ok(Some(parse_uuid(&value, &format!("notifications.{column}"))?)),
        None => Ok(None),
    }
}

fn parse_kind(value: &str) -> Option<NotificationKind> {
    match value {
        "answer" => Some(NotificationKind::Answer),
        "comment" => Some(NotificationKind::Comment),
        "upvote" => Some(NotificationKind::Upvote),
        "accepted" => Some(NotificationKind::Accepted),
        _ => None,
    }
}
