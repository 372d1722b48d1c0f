//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist users, their reputation counter, and their badge rows.
//!
//! # Invariants
//! - `adjust_reputation` is a relative in-place update, so concurrent
//!   deltas compose instead of overwriting each other.
//! - Badge awards are insert-or-ignore; the badge set never shrinks.

use crate::model::user::{Badge, User, UserId};
use crate::repo::{ensure_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

const REQUIRED_TABLES: &[&str] = &["users", "user_badges"];

/// Repository interface for user and badge persistence.
pub trait UserRepository {
    /// Creates one user with zero reputation and no badges.
    fn create_user(&self, display_name: &str) -> RepoResult<User>;
    /// Loads one user with badges, if present.
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Returns whether the user row exists.
    fn exists(&self, id: UserId) -> RepoResult<bool>;
    /// Applies a signed reputation delta and returns the new value.
    fn adjust_reputation(&self, id: UserId, delta: i64) -> RepoResult<i64>;
    /// Lists earned badges in ascending threshold order.
    fn badges(&self, id: UserId) -> RepoResult<Vec<Badge>>;
    /// Awards one badge; a no-op when already held.
    fn award_badge(&self, id: UserId, badge: Badge) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
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

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, display_name: &str) -> RepoResult<User> {
        let uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO users (uuid, display_name) VALUES (?1, ?2);",
            params![uuid.to_string(), display_name],
        )?;
        self.get_user(uuid)?.ok_or(RepoError::UserNotFound(uuid))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, display_name, reputation, created_at, updated_at
                 FROM users
                 WHERE uuid = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>("uuid")?,
                        row.get::<_, String>("display_name")?,
                        row.get::<_, i64>("reputation")?,
                        row.get::<_, i64>("created_at")?,
                        row.get::<_, i64>("updated_at")?,
                    ))
                },
            )
            .optional()?;

        let Some((uuid_text, display_name, reputation, created_at, updated_at)) = row else {
            return Ok(None);
        };

        Ok(Some(User {
            uuid: parse_uuid(&uuid_text, "users.uuid")?,
            display_name,
            reputation,
            badges: self.badges(id)?,
            created_at,
            updated_at,
        }))
    }

    fn exists(&self, id: UserId) -> RepoResult<bool> {
        let found = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM users WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    fn adjust_reputation(&self, id: UserId, delta: i64) -> RepoResult<i64> {
        let changed = self.conn.execute(
            "UPDATE users
             SET reputation = reputation + ?1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2;",
            params![delta, id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::UserNotFound(id));
        }

        let reputation = self.conn.query_row(
            "SELECT reputation FROM users WHERE uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(reputation)
    }

    fn badges(&self, id: UserId) -> RepoResult<Vec<Badge>> {
        let mut stmt = self
            .conn
            .prepare("SELECT badge FROM user_badges WHERE user_uuid = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;

        let mut badges = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get("badge")?;
            let badge = parse_badge(&value).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid badge `{value}` in user_badges.badge"))
            })?;
            badges.push(badge);
        }

        badges.sort();
        Ok(badges)
    }

    fn award_badge(&self, id: UserId, badge: Badge) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO user_badges (user_uuid, badge) VALUES (?1, ?2);",
            params![id.to_string(), badge.name()],
        )?;
        Ok(())
    }
}

fn parse_badge(value: &str) -> Option<Badge> {
    match value {
        "Bronze" => Some(Badge::Bronze),
        "Silver" => Some(Badge::Silver),
        "Gold" => Some(Badge::Gold),
        _ => None,
    }
}
