use crate::domain::error::DomainError;
use crate::domain::models::{Amount, CreateTransaction, CreateTransfer, Transaction, TransactionKind};
use crate::domain::repository::{AccountRepository, LedgerRepository};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct LedgerService<L: LedgerRepository, A: AccountRepository> {
    ledger: Arc<L>,
    accounts: Arc<A>,
}

impl<L: LedgerRepository, A: AccountRepository> LedgerService<L, A> {
    pub fn new(ledger: Arc<L>, accounts: Arc<A>) -> Self {
        Self { ledger, accounts }
    }

    /// Posts a deposit or withdrawal against a single account.
    #[instrument(skip(self, req), fields(account_id = req.account_id, kind = %req.kind, amount = %req.amount))]
    pub async fn record_transaction(&self, req: CreateTransaction) -> Result<Transaction> {
        if req.kind == TransactionKind::Transfer {
            return Err(DomainError::Validation(
                "Transfers must be posted through the transfer endpoint".to_string(),
            )
            .into());
        }
        let amount = Amount::new(req.amount)?;

        let record = self
            .ledger
            .post(req.account_id, req.kind, amount)
            .await
            .inspect_err(|e| warn!(error = %e, "Posting rejected"))?;
        info!(transaction_id = record.id, "Transaction recorded");
        Ok(record)
    }

    #[instrument(
        skip(self, req),
        fields(
            source_account_id = req.source_account_id,
            destination_account_id = req.destination_account_id,
            amount = %req.amount
        )
    )]
    pub async fn transfer(&self, req: CreateTransfer) -> Result<Transaction> {
        let amount = Amount::new(req.amount)?;
        if req.source_account_id == req.destination_account_id {
            return Err(DomainError::SameAccount.into());
        }

        let record = self
            .ledger
            .transfer(req.source_account_id, req.destination_account_id, amount)
            .await
            .inspect_err(|e| warn!(error = %e, "Transfer rejected"))?;
        info!(transaction_id = record.id, "Transfer recorded");
        Ok(record)
    }

    /// Every entry touching the account, incoming transfers included, oldest first.
    #[instrument(skip(self))]
    pub async fn transactions_for_account(&self, account_id: i64) -> Result<Vec<Transaction>> {
        if self.accounts.find_by_id(account_id).await?.is_none() {
            return Err(DomainError::AccountNotFound(account_id).into());
        }
        self.ledger.find_by_account(account_id).await
    }
}
