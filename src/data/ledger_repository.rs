use crate::data::account_repository::{fetch_account, parse_decimal, store_balance};
use crate::domain::error::DomainError;
use crate::domain::models::{Amount, NewTransaction, Transaction, TransactionKind};
use crate::domain::repository::LedgerRepository;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, instrument, trace};

#[derive(Clone)]
pub struct SqliteLedgerRepository {
    pool: SqlitePool,
}

impl SqliteLedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Takes the write lock before the balance is read, so concurrent
    /// writers wait on the busy timeout instead of failing on lock upgrade.
    async fn begin_write(&self) -> Result<sqlx::Transaction<'static, Sqlite>> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .context("Failed to begin transaction")
    }
}

async fn insert_transaction<'e, E>(executor: E, entry: NewTransaction) -> Result<Transaction>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO transactions (amount, kind, created_at, source_account_id, destination_account_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.amount.inner().to_string())
    .bind(entry.kind.as_str())
    .bind(entry.timestamp)
    .bind(entry.source_account_id)
    .bind(entry.destination_account_id)
    .execute(executor)
    .await
    .context("Failed to insert transaction")?;

    Ok(Transaction {
        id: result.last_insert_rowid(),
        amount: entry.amount.inner(),
        kind: entry.kind,
        timestamp: entry.timestamp,
        source_account_id: entry.source_account_id,
        destination_account_id: entry.destination_account_id,
    })
}

// Every early return below drops `tx` uncommitted, which rolls it back.
#[async_trait]
impl LedgerRepository for SqliteLedgerRepository {
    #[instrument(skip(self), fields(amount = %amount, kind = %kind))]
    async fn post(&self, account_id: i64, kind: TransactionKind, amount: Amount) -> Result<Transaction> {
        let mut tx = self.begin_write().await?;

        let mut account = fetch_account(&mut *tx, account_id)
            .await?
            .ok_or(DomainError::AccountNotFound(account_id))?;
        let before = account.balance;
        let after = account.apply(kind, amount)?;
        trace!(%before, %after, "Balance computed");

        store_balance(&mut *tx, account.id, after).await?;
        let record = insert_transaction(&mut *tx, NewTransaction::posting(kind, amount, account.id)).await?;

        tx.commit().await.context("Failed to commit transaction")?;
        debug!(transaction_id = record.id, balance = %after, "Posting committed");
        Ok(record)
    }

    #[instrument(skip(self), fields(amount = %amount))]
    async fn transfer(&self, source_id: i64, destination_id: i64, amount: Amount) -> Result<Transaction> {
        if source_id == destination_id {
            return Err(DomainError::SameAccount.into());
        }

        let mut tx = self.begin_write().await?;

        let mut source = fetch_account(&mut *tx, source_id)
            .await?
            .ok_or(DomainError::AccountNotFound(source_id))?;
        let mut destination = fetch_account(&mut *tx, destination_id)
            .await?
            .ok_or(DomainError::AccountNotFound(destination_id))?;

        let source_balance = source.debit(amount)?;
        let destination_balance = destination.credit(amount)?;

        store_balance(&mut *tx, source.id, source_balance).await?;
        store_balance(&mut *tx, destination.id, destination_balance).await?;
        let record = insert_transaction(
            &mut *tx,
            NewTransaction::transfer(amount, source.id, destination.id),
        )
        .await?;

        tx.commit().await.context("Failed to commit transfer")?;
        debug!(
            transaction_id = record.id,
            source_balance = %source_balance,
            destination_balance = %destination_balance,
            "Transfer committed"
        );
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn find_by_account(&self, account_id: i64) -> Result<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, amount, kind, created_at, source_account_id, destination_account_id
            FROM transactions
            WHERE source_account_id = ? OR destination_account_id = ?
            ORDER BY id
            "#,
        )
        .bind(account_id)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions")?;
        debug!(count = rows.len(), "Transactions listed");
        rows.into_iter().map(Transaction::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    amount: String,
    kind: String,
    created_at: DateTime<Utc>,
    source_account_id: i64,
    destination_account_id: Option<i64>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = anyhow::Error;

    fn try_from(row: TransactionRow) -> Result<Self> {
        let kind = TransactionKind::parse(&row.kind)
            .ok_or_else(|| anyhow!("Unknown transaction kind in database: {}", row.kind))?;
        Ok(Transaction {
            id: row.id,
            amount: parse_decimal(&row.amount)?,
            kind,
            timestamp: row.created_at,
            source_account_id: row.source_account_id,
            destination_account_id: row.destination_account_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::connect_in_memory;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn amount(value: &str) -> Amount {
        Amount::new(dec(value)).unwrap()
    }

    async fn setup(balances: &[&str]) -> (SqliteLedgerRepository, SqlitePool, Vec<i64>) {
        let pool = connect_in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO users (national_id, first_name, last_name, email, phone, password_hash) VALUES ('12345678', 'Ana', 'Lopez', 'ana@example.com', '0987654321', 'x')",
        )
        .execute(&pool)
        .await
        .unwrap();
        let mut ids = Vec::new();
        for (i, balance) in balances.iter().enumerate() {
            let result = sqlx::query("INSERT INTO accounts (account_number, balance, user_id) VALUES (?, ?, 1)")
                .bind(format!("{:010}", i + 1))
                .bind(*balance)
                .execute(&pool)
                .await
                .unwrap();
            ids.push(result.last_insert_rowid());
        }
        (SqliteLedgerRepository::new(pool.clone()), pool, ids)
    }

    async fn balance(pool: &SqlitePool, id: i64) -> Decimal {
        fetch_account(pool, id).await.unwrap().unwrap().balance
    }

    async fn record_count(pool: &SqlitePool) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(pool)
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_deposit_updates_balance_and_records_entry() {
        let (repo, pool, ids) = setup(&["1000.00"]).await;

        let record = repo.post(ids[0], TransactionKind::Deposit, amount("250.25")).await.unwrap();

        assert_eq!(record.kind, TransactionKind::Deposit);
        assert_eq!(record.amount, dec("250.25"));
        assert_eq!(record.destination_account_id, None);
        assert_eq!(balance(&pool, ids[0]).await, dec("1250.25"));
        assert_eq!(record_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_overdraft_rolls_back_everything() {
        let (repo, pool, ids) = setup(&["1000.00"]).await;

        let err = repo
            .post(ids[0], TransactionKind::Withdrawal, amount("1500.00"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::InsufficientFunds { .. })
        ));
        assert_eq!(balance(&pool, ids[0]).await, dec("1000.00"));
        assert_eq!(record_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_post_to_missing_account() {
        let (repo, pool, _) = setup(&[]).await;

        let err = repo.post(42, TransactionKind::Deposit, amount("1")).await.unwrap_err();

        assert_eq!(
            err.downcast_ref::<DomainError>(),
            Some(&DomainError::AccountNotFound(42))
        );
        assert_eq!(record_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_transfer_moves_funds_atomically() {
        let (repo, pool, ids) = setup(&["1000.00", "500.00"]).await;

        let record = repo.transfer(ids[0], ids[1], amount("200.00")).await.unwrap();

        assert_eq!(record.kind, TransactionKind::Transfer);
        assert_eq!(record.source_account_id, ids[0]);
        assert_eq!(record.destination_account_id, Some(ids[1]));
        assert_eq!(balance(&pool, ids[0]).await, dec("800.00"));
        assert_eq!(balance(&pool, ids[1]).await, dec("700.00"));
        assert_eq!(record_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_failed_transfer_changes_nothing() {
        let (repo, pool, ids) = setup(&["100.00", "500.00"]).await;

        assert!(repo.transfer(ids[0], ids[1], amount("100.01")).await.is_err());
        assert!(repo.transfer(ids[0], 999, amount("1")).await.is_err());
        assert!(repo.transfer(ids[0], ids[0], amount("1")).await.is_err());

        assert_eq!(balance(&pool, ids[0]).await, dec("100.00"));
        assert_eq!(balance(&pool, ids[1]).await, dec("500.00"));
        assert_eq!(record_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_history_includes_incoming_transfers() {
        let (repo, _pool, ids) = setup(&["100", "0"]).await;
        repo.post(ids[0], TransactionKind::Deposit, amount("5")).await.unwrap();
        repo.transfer(ids[0], ids[1], amount("10")).await.unwrap();
        repo.post(ids[1], TransactionKind::Withdrawal, amount("3")).await.unwrap();

        let source_history = repo.find_by_account(ids[0]).await.unwrap();
        assert_eq!(source_history.len(), 2);

        let destination_history = repo.find_by_account(ids[1]).await.unwrap();
        let kinds: Vec<_> = destination_history.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TransactionKind::Transfer, TransactionKind::Withdrawal]);
    }
}
