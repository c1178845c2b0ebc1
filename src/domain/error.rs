use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("User not found: {0}")]
    UserNotFound(i64),
    #[error("Account not found: {0}")]
    AccountNotFound(i64),
    #[error("Account with number {0} not found")]
    AccountNumberNotFound(String),
    #[error("National ID {0} is already registered")]
    DuplicateNationalId(String),
    #[error("Email {0} is already registered")]
    DuplicateEmail(String),
    #[error("Account number {0} already exists")]
    DuplicateAccountNumber(String),
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },
    #[error("Invalid amount: {0}. The amount must be greater than zero with at most two decimal places")]
    InvalidAmount(Decimal),
    #[error("Source and destination accounts must differ")]
    SameAccount,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
