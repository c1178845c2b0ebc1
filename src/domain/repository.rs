use crate::domain::models::{Account, Amount, Transaction, TransactionKind};
use crate::domain::user::{NewUser, User};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn save_user(&self, user: NewUser) -> Result<User>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_national_id(&self, national_id: &str) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn update_user(&self, user: &User) -> Result<()>;
    /// Returns `false` when no user had the given id.
    async fn delete_user(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn save(&self, account_number: &str, balance: Decimal, user_id: i64) -> Result<Account>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Account>>;
    async fn find_by_number(&self, account_number: &str) -> Result<Option<Account>>;
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Account>>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Balance-affecting operations. Each call is one unit of work: the balance
/// updates and the ledger record commit together or not at all.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn post(&self, account_id: i64, kind: TransactionKind, amount: Amount) -> Result<Transaction>;
    async fn transfer(&self, source_id: i64, destination_id: i64, amount: Amount) -> Result<Transaction>;
    async fn find_by_account(&self, account_id: i64) -> Result<Vec<Transaction>>;
}

