use crate::domain::error::DomainError;
use crate::domain::models::{Account, CreateAccount};
use crate::domain::repository::{AccountRepository, UserRepository};
use crate::domain::validation::validate_create_account;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct AccountService<A: AccountRepository, U: UserRepository> {
    accounts: Arc<A>,
    users: Arc<U>,
}

impl<A: AccountRepository, U: UserRepository> AccountService<A, U> {
    pub fn new(accounts: Arc<A>, users: Arc<U>) -> Self {
        Self { accounts, users }
    }

    async fn ensure_user(&self, user_id: i64) -> Result<()> {
        match self.users.find_user_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::UserNotFound(user_id).into()),
        }
    }

    #[instrument(skip(self, req), fields(account_number = %req.account_number, user_id = req.user_id))]
    pub async fn create_account(&self, req: CreateAccount) -> Result<Account> {
        validate_create_account(&req)?;

        if self.accounts.find_by_number(&req.account_number).await?.is_some() {
            warn!("Account number already exists");
            return Err(DomainError::DuplicateAccountNumber(req.account_number).into());
        }
        self.ensure_user(req.user_id).await?;

        let account = self
            .accounts
            .save(&req.account_number, req.initial_balance, req.user_id)
            .await?;
        info!(account_id = account.id, balance = %account.balance, "Account created");
        Ok(account)
    }

    #[instrument(skip(self))]
    pub async fn accounts_for_user(&self, user_id: i64) -> Result<Vec<Account>> {
        self.ensure_user(user_id).await?;
        self.accounts.find_by_user(user_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_account(&self, id: i64) -> Result<Account> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(id).into())
    }

    #[instrument(skip(self))]
    pub async fn get_by_number(&self, account_number: &str) -> Result<Account> {
        self.accounts
            .find_by_number(account_number)
            .await?
            .ok_or_else(|| DomainError::AccountNumberNotFound(account_number.to_string()).into())
    }

    /// Deleting an account also removes its ledger entries.
    #[instrument(skip(self))]
    pub async fn delete_account(&self, id: i64) -> Result<()> {
        if !self.accounts.delete(id).await? {
            return Err(DomainError::AccountNotFound(id).into());
        }
        info!(account_id = id, "Account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::account_repository::SqliteAccountRepository;
    use crate::data::user_repository::SqliteUserRepository;
    use crate::domain::user::NewUser;
    use crate::infrastructure::database::connect_in_memory;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    type Service = AccountService<SqliteAccountRepository, SqliteUserRepository>;

    async fn setup() -> (Service, i64) {
        let pool = connect_in_memory().await.unwrap();
        let users = Arc::new(SqliteUserRepository::new(pool.clone()));
        let owner = users
            .save_user(NewUser {
                national_id: "12345678".to_string(),
                first_name: "Ana".to_string(),
                last_name: "Lopez".to_string(),
                email: "ana@example.com".to_string(),
                phone: "0987654321".to_string(),
                password_hash: "x".to_string(),
            })
            .await
            .unwrap();
        let accounts = Arc::new(SqliteAccountRepository::new(pool));
        (AccountService::new(accounts, users), owner.id)
    }

    fn request(number: &str, balance: &str, user_id: i64) -> CreateAccount {
        CreateAccount {
            account_number: number.to_string(),
            initial_balance: Decimal::from_str(balance).unwrap(),
            user_id,
        }
    }

    #[tokio::test]
    async fn test_create_and_read_account() {
        let (service, owner) = setup().await;

        let account = service.create_account(request("1234567890", "1000.00", owner)).await.unwrap();

        assert_eq!(service.get_account(account.id).await.unwrap(), account);
        assert_eq!(service.get_by_number("1234567890").await.unwrap(), account);
        assert_eq!(service.accounts_for_user(owner).await.unwrap(), vec![account]);
    }

    #[tokio::test]
    async fn test_duplicate_account_number() {
        let (service, owner) = setup().await;
        service.create_account(request("1234567890", "0", owner)).await.unwrap();

        let err = service
            .create_account(request("1234567890", "5", owner))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<DomainError>(),
            Some(&DomainError::DuplicateAccountNumber("1234567890".to_string()))
        );
    }

    #[tokio::test]
    async fn test_negative_initial_balance_is_invalid() {
        let (service, owner) = setup().await;

        let err = service
            .create_account(request("1234567890", "-0.01", owner))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_owner_must_exist() {
        let (service, owner) = setup().await;

        let err = service
            .create_account(request("1234567890", "0", owner + 1))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<DomainError>(),
            Some(&DomainError::UserNotFound(owner + 1))
        );

        let err = service.accounts_for_user(owner + 1).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<DomainError>(),
            Some(&DomainError::UserNotFound(owner + 1))
        );
    }

    #[tokio::test]
    async fn test_delete_account() {
        let (service, owner) = setup().await;
        let account = service.create_account(request("1234567890", "0", owner)).await.unwrap();

        service.delete_account(account.id).await.unwrap();

        let err = service.get_account(account.id).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<DomainError>(),
            Some(&DomainError::AccountNotFound(account.id))
        );
        assert!(service.delete_account(account.id).await.is_err());
    }
}
