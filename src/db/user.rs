use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// User snapshot without secret fields. This is what every read path gets;
/// only [`UserStore::credentials_by_email`] exposes the password hash.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub uuid: String,
    pub email: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// User snapshot plus password hash, for the password-verification path.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    uuid: String,
    email: String,
    name: String,
    created_at: String,
    updated_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            email: row.email,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, uuid, email, name, created_at, updated_at";

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user. The password must already be hashed by the
    /// caller. Returns the user ID.
    pub async fn create(
        &self,
        uuid: &str,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO users (uuid, email, name, password_hash) VALUES (?, ?, ?, ?)")
                .bind(uuid)
                .bind(email)
                .bind(name)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user snapshot by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE uuid = ?", USER_COLUMNS))
                .bind(uuid)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    /// Get a user snapshot by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    /// Get a user with password hash by email, for password verification.
    pub async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, sqlx::Error> {
        let row: Option<(i64, String, String, String, String, String, String)> = sqlx::query_as(
            "SELECT id, uuid, email, name, created_at, updated_at, password_hash FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, uuid, email, name, created_at, updated_at, password_hash)| UserCredentials {
                user: User {
                    id,
                    uuid,
                    email,
                    name,
                    created_at,
                    updated_at,
                },
                password_hash,
            },
        ))
    }
}
