//! Field rules for incoming user and account data.
//!
//! Each `validate_*` function checks every field and reports all failures in
//! a single [`DomainError::Validation`].

use crate::domain::error::DomainError;
use crate::domain::models::{CreateAccount, is_whole_cents};
use crate::domain::user::{CreateUser, LoginRequest, UpdateUser};
use rust_decimal::Decimal;

const EMAIL_MAX_LEN: usize = 100;

#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn check(&mut self, ok: bool, message: &str) {
        if !ok {
            self.0.push(message.to_string());
        }
    }

    fn finish(self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.0.join("; ")))
        }
    }
}

fn all_digits(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.len()) && value.chars().all(|c| c.is_ascii_digit())
}

pub fn is_valid_national_id(value: &str) -> bool {
    all_digits(value, 8, 10)
}

pub fn is_valid_name(value: &str) -> bool {
    let len = value.chars().count();
    (2..=50).contains(&len)
        && !value.trim().is_empty()
        && value.chars().all(|c| c.is_alphabetic() || c.is_whitespace())
}

pub fn is_valid_email(value: &str) -> bool {
    if value.len() > EMAIL_MAX_LEN || value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

pub fn is_valid_phone(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    all_digits(digits, 10, 15)
}

pub fn is_valid_password(value: &str) -> bool {
    (8..=100).contains(&value.chars().count())
}

pub fn is_valid_account_number(value: &str) -> bool {
    all_digits(value, 10, 20)
}

pub fn validate_create_user(req: &CreateUser) -> Result<(), DomainError> {
    let mut v = Violations::default();
    v.check(
        is_valid_national_id(&req.national_id),
        "national_id must have between 8 and 10 digits",
    );
    v.check(
        is_valid_name(&req.first_name),
        "first_name must have 2 to 50 letters or spaces",
    );
    v.check(
        is_valid_name(&req.last_name),
        "last_name must have 2 to 50 letters or spaces",
    );
    v.check(is_valid_email(&req.email), "email must be a valid address");
    v.check(
        is_valid_phone(&req.phone),
        "phone must have between 10 and 15 digits, optionally prefixed with +",
    );
    v.check(
        is_valid_password(&req.password),
        "password must have between 8 and 100 characters",
    );
    v.finish()
}

pub fn validate_update_user(req: &UpdateUser) -> Result<(), DomainError> {
    let mut v = Violations::default();
    if let Some(first_name) = &req.first_name {
        v.check(
            is_valid_name(first_name),
            "first_name must have 2 to 50 letters or spaces",
        );
    }
    if let Some(last_name) = &req.last_name {
        v.check(
            is_valid_name(last_name),
            "last_name must have 2 to 50 letters or spaces",
        );
    }
    if let Some(email) = &req.email {
        v.check(is_valid_email(email), "email must be a valid address");
    }
    if let Some(phone) = &req.phone {
        v.check(
            is_valid_phone(phone),
            "phone must have between 10 and 15 digits, optionally prefixed with +",
        );
    }
    v.finish()
}

pub fn validate_login(req: &LoginRequest) -> Result<(), DomainError> {
    let mut v = Violations::default();
    v.check(
        is_valid_national_id(&req.national_id),
        "national_id must have between 8 and 10 digits",
    );
    v.check(!req.password.is_empty(), "password is required");
    v.finish()
}

pub fn validate_create_account(req: &CreateAccount) -> Result<(), DomainError> {
    let mut v = Violations::default();
    v.check(
        is_valid_account_number(&req.account_number),
        "account_number must have between 10 and 20 digits",
    );
    v.check(
        req.initial_balance >= Decimal::ZERO,
        "initial_balance cannot be negative",
    );
    v.check(
        is_whole_cents(req.initial_balance),
        "initial_balance cannot have more than two decimal places",
    );
    v.check(req.user_id > 0, "user_id must be a positive number");
    v.finish()
}
