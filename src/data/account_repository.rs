use crate::domain::error::DomainError;
use crate::domain::models::Account;
use crate::domain::repository::AccountRepository;
use crate::infrastructure::database::unique_violation;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Executor, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::{debug, instrument, trace};

#[derive(Clone)]
pub struct SqliteAccountRepository {
    pool: SqlitePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

pub(crate) fn parse_decimal(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).with_context(|| format!("Corrupt decimal value in database: {raw}"))
}

/// Loads an account through any executor, so it can run inside a ledger
/// transaction as well as directly on the pool.
pub(crate) async fn fetch_account<'e, E>(executor: E, id: i64) -> Result<Option<Account>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT id, account_number, balance, user_id FROM accounts WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .context("Failed to load account")?;
    row.map(Account::try_from).transpose()
}

pub(crate) async fn store_balance<'e, E>(executor: E, id: i64, balance: Decimal) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE accounts SET balance = ? WHERE id = ?")
        .bind(balance.to_string())
        .bind(id)
        .execute(executor)
        .await
        .context("Failed to update account balance")?;
    Ok(())
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    #[instrument(skip(self))]
    async fn save(&self, account_number: &str, balance: Decimal, user_id: i64) -> Result<Account> {
        let result = sqlx::query(
            "INSERT INTO accounts (account_number, balance, user_id) VALUES (?, ?, ?)",
        )
        .bind(account_number)
        .bind(balance.to_string())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| -> anyhow::Error {
            if unique_violation(&e).is_some() {
                return DomainError::DuplicateAccountNumber(account_number.to_string()).into();
            }
            let missing_owner = e
                .as_database_error()
                .is_some_and(|db_err| db_err.is_foreign_key_violation());
            if missing_owner {
                return DomainError::UserNotFound(user_id).into();
            }
            anyhow::Error::new(e).context("Failed to insert account")
        })?;

        let account = Account {
            id: result.last_insert_rowid(),
            account_number: account_number.to_string(),
            balance,
            user_id,
        };
        debug!(account_id = account.id, "Account saved");
        Ok(account)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        let account = fetch_account(&self.pool, id).await?;
        trace!(found = account.is_some(), "Account lookup by id");
        Ok(account)
    }

    #[instrument(skip(self))]
    async fn find_by_number(&self, account_number: &str) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, account_number, balance, user_id FROM accounts WHERE account_number = ?",
        )
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find account by number")?;
        row.map(Account::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            "SELECT id, account_number, balance, user_id FROM accounts WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;
        debug!(count = rows.len(), "Accounts listed");
        rows.into_iter().map(Account::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete account")?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    account_number: String,
    balance: String,
    user_id: i64,
}

impl TryFrom<AccountRow> for Account {
    type Error = anyhow::Error;

    fn try_from(row: AccountRow) -> Result<Self> {
        Ok(Account {
            id: row.id,
            account_number: row.account_number,
            balance: parse_decimal(&row.balance)?,
            user_id: row.user_id,
        })
    }
}
