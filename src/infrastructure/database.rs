use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        national_id TEXT NOT NULL UNIQUE,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        phone TEXT NOT NULL,
        password_hash TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_number TEXT NOT NULL UNIQUE,
        balance TEXT NOT NULL,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_accounts_user_id ON accounts(user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        amount TEXT NOT NULL,
        kind TEXT NOT NULL CHECK (kind IN ('DEPOSIT', 'WITHDRAWAL', 'TRANSFER')),
        created_at TEXT NOT NULL,
        source_account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
        destination_account_id INTEGER REFERENCES accounts(id) ON DELETE CASCADE,
        CHECK ((kind = 'TRANSFER') = (destination_account_id IS NOT NULL)),
        CHECK (destination_account_id IS NULL OR destination_account_id <> source_account_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_transactions_source ON transactions(source_account_id)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_destination ON transactions(destination_account_id)",
];

#[instrument(skip(database_url))]
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL: {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    info!(max_connections, "Database pool created");
    Ok(pool)
}

/// A private in-memory database. The pool keeps a single connection alive for
/// its whole lifetime, since every new in-memory connection starts empty.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("Failed to open in-memory database")?;
    migrate(&pool).await?;
    Ok(pool)
}

#[instrument(skip(pool))]
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        debug!(statement = statement.trim(), "Applying schema statement");
        sqlx::query(*statement)
            .execute(pool)
            .await
            .context("Failed to apply database schema")?;
    }
    info!(statements = SCHEMA.len(), "Database schema is up to date");
    Ok(())
}

/// Name of the column behind a unique-constraint failure, e.g. `users.email`.
pub fn unique_violation(err: &sqlx::Error) -> Option<String> {
    let db_err = err.as_database_error()?;
    if !db_err.is_unique_violation() {
        return None;
    }
    db_err
        .message()
        .rsplit(": ")
        .next()
        .map(|column| column.trim().to_string())
}
