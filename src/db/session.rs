//! Session storage backing refresh-token validity.
//!
//! A session is created on every login and referenced by UUID from inside
//! the issued tokens. The `valid` flag is the single authority on whether
//! a refresh token pointing at the session may still be honored; it is
//! independent of the token's own expiry. Sessions are never deleted here,
//! only invalidated.

use sqlx::sqlite::SqlitePool;

/// A session record.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub uuid: String,
    pub user_uuid: String,
    pub user_agent: String,
    pub valid: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: i64,
    uuid: String,
    user_uuid: String,
    user_agent: String,
    valid: i64,
    created_at: String,
    updated_at: String,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            user_uuid: row.user_uuid,
            user_agent: row.user_agent,
            valid: row.valid != 0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SESSION_COLUMNS: &str = "id, uuid, user_uuid, user_agent, valid, created_at, updated_at";

/// Store for managing sessions.
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new valid session for a user and return the full record.
    pub async fn create(&self, user_uuid: &str, user_agent: &str) -> Result<Session, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO sessions (uuid, user_uuid, user_agent) VALUES (?, ?, ?)")
            .bind(&uuid)
            .bind(user_uuid)
            .bind(user_agent)
            .execute(&self.pool)
            .await?;

        let row: SessionRow = sqlx::query_as(&format!(
            "SELECT {} FROM sessions WHERE uuid = ?",
            SESSION_COLUMNS
        ))
        .bind(&uuid)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get a session by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Session>, sqlx::Error> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM sessions WHERE uuid = ?",
            SESSION_COLUMNS
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Session::from))
    }

    /// List all valid sessions for a user, in insertion order.
    pub async fn list_valid_by_user(&self, user_uuid: &str) -> Result<Vec<Session>, sqlx::Error> {
        let rows: Vec<SessionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM sessions WHERE user_uuid = ? AND valid = 1 ORDER BY id",
            SESSION_COLUMNS
        ))
        .bind(user_uuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Session::from).collect())
    }

    /// Set the validity flag for a session. Idempotent: setting an
    /// already-set value leaves the row (including `updated_at`) untouched
    /// and still reports success. A missing session is also a no-op.
    pub async fn set_validity(&self, uuid: &str, valid: bool) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE sessions SET valid = ?, updated_at = datetime('now') WHERE uuid = ? AND valid <> ?",
        )
        .bind(valid as i64)
        .bind(uuid)
        .bind(valid as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
