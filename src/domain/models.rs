use crate::domain::error::DomainError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub account_number: String,
    pub balance: Decimal,
    pub user_id: i64,
}

impl Account {
    /// Adds `amount` to the balance and returns the new balance.
    pub fn credit(&mut self, amount: Amount) -> Result<Decimal, DomainError> {
        let new_balance = self
            .balance
            .checked_add(amount.inner())
            .ok_or(DomainError::InvalidAmount(amount.inner()))?;
        self.balance = new_balance;
        Ok(new_balance)
    }

    /// Subtracts `amount` from the balance. The balance is left untouched when
    /// it cannot cover the amount.
    pub fn debit(&mut self, amount: Amount) -> Result<Decimal, DomainError> {
        if self.balance < amount.inner() {
            return Err(DomainError::InsufficientFunds {
                balance: self.balance,
                requested: amount.inner(),
            });
        }
        self.balance -= amount.inner();
        Ok(self.balance)
    }

    pub fn apply(&mut self, kind: TransactionKind, amount: Amount) -> Result<Decimal, DomainError> {
        match kind {
            TransactionKind::Deposit => self.credit(amount),
            TransactionKind::Withdrawal => self.debit(amount),
            TransactionKind::Transfer => Err(DomainError::Validation(
                "Transfers must name a destination account".to_string(),
            )),
        }
    }
}

const CENT_SCALE: u32 = 2;

/// True when `value` has no digits below the cent.
pub fn is_whole_cents(value: Decimal) -> bool {
    value.normalize().scale() <= CENT_SCALE
}

/// A strictly positive monetary amount in whole cents.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO || !is_whole_cents(value) {
            return Err(DomainError::InvalidAmount(value));
        }
        Ok(Amount(value))
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::Transfer => "TRANSFER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DEPOSIT" => Some(TransactionKind::Deposit),
            "WITHDRAWAL" => Some(TransactionKind::Withdrawal),
            "TRANSFER" => Some(TransactionKind::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub timestamp: DateTime<Utc>,
    pub source_account_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_account_id: Option<i64>,
}

/// A ledger entry that has been validated but not yet stored.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: Amount,
    pub kind: TransactionKind,
    pub timestamp: DateTime<Utc>,
    pub source_account_id: i64,
    pub destination_account_id: Option<i64>,
}

impl NewTransaction {
    pub fn posting(kind: TransactionKind, amount: Amount, account_id: i64) -> Self {
        Self {
            amount,
            kind,
            timestamp: Utc::now(),
            source_account_id: account_id,
            destination_account_id: None,
        }
    }

    pub fn transfer(amount: Amount, source_account_id: i64, destination_account_id: i64) -> Self {
        Self {
            amount,
            kind: TransactionKind::Transfer,
            timestamp: Utc::now(),
            source_account_id,
            destination_account_id: Some(destination_account_id),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccount {
    pub account_number: String,
    pub initial_balance: Decimal,
    pub user_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTransaction {
    pub account_id: i64,
    pub amount: Decimal,
    pub kind: TransactionKind,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTransfer {
    pub source_account_id: i64,
    pub destination_account_id: i64,
    pub amount: Decimal,
}
