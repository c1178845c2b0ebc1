use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{NewUser, User};
use crate::infrastructure::database::unique_violation;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, instrument, trace};

const USER_COLUMNS: &str = "id, national_id, first_name, last_name, email, phone, password_hash";

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to find user by {column}"))?;
        Ok(row.map(User::from))
    }
}

/// Maps a unique-constraint failure on `users` to the matching duplicate error.
fn duplicate_user_error(err: sqlx::Error, national_id: &str, email: &str) -> anyhow::Error {
    match unique_violation(&err).as_deref() {
        Some("users.national_id") => DomainError::DuplicateNationalId(national_id.to_string()).into(),
        Some("users.email") => DomainError::DuplicateEmail(email.to_string()).into(),
        _ => anyhow::Error::new(err).context("Failed to write user"),
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn save_user(&self, user: NewUser) -> Result<User> {
        trace!("Inserting user");
        let result = sqlx::query(
            r#"
            INSERT INTO users (national_id, first_name, last_name, email, phone, password_hash)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.national_id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_user_error(e, &user.national_id, &user.email))?;

        let saved = User {
            id: result.last_insert_rowid(),
            national_id: user.national_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
        };
        debug!(user_id = saved.id, "User saved");
        Ok(saved)
    }

    #[instrument(skip(self))]
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find user by id")?;
        trace!(found = row.is_some(), "User lookup by id");
        Ok(row.map(User::from))
    }

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one("email", email).await
    }

    #[instrument(skip(self))]
    async fn find_user_by_national_id(&self, national_id: &str) -> Result<Option<User>> {
        self.find_one("national_id", national_id).await
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;
        debug!(count = rows.len(), "Users listed");
        Ok(rows.into_iter().map(User::from).collect())
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    async fn update_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET first_name = ?, last_name = ?, email = ?, phone = ?, password_hash = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_user_error(e, &user.national_id, &user.email))?;
        debug!("User updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    national_id: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    password_hash: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            national_id: row.national_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
        }
    }
}
