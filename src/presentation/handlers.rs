use crate::application::account_service::AccountService;
use crate::application::auth_service::AuthService;
use crate::application::ledger_service::LedgerService;
use crate::application::user_service::UserService;
use crate::data::account_repository::SqliteAccountRepository;
use crate::data::ledger_repository::SqliteLedgerRepository;
use crate::data::user_repository::SqliteUserRepository;
use crate::domain::error::DomainError;
use crate::presentation::middleware::AuthenticatedUser;
use actix_web::{FromRequest, HttpMessage, HttpResponse, ResponseError, web};
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

// AppState holding the services, all backed by the same pool
pub struct AppState {
    pub auth_service: AuthService<SqliteUserRepository>,
    pub user_service: UserService<SqliteUserRepository>,
    pub account_service: AccountService<SqliteAccountRepository, SqliteUserRepository>,
    pub ledger_service: LedgerService<SqliteLedgerRepository, SqliteAccountRepository>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt_secret: String, token_ttl_secs: i64) -> Self {
        let users = Arc::new(SqliteUserRepository::new(pool.clone()));
        let accounts = Arc::new(SqliteAccountRepository::new(pool.clone()));
        let ledger = Arc::new(SqliteLedgerRepository::new(pool));

        Self {
            auth_service: AuthService::new(users.clone(), jwt_secret, token_ttl_secs),
            user_service: UserService::new(users.clone()),
            account_service: AccountService::new(accounts.clone(), users),
            ledger_service: LedgerService::new(ledger, accounts),
        }
    }
}

// Uniform error response format
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    details: serde_json::Value,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// Bank API Error Types
#[derive(Error, Debug)]
pub enum BankError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Insufficient funds")]
    InsufficientFunds(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for BankError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            BankError::Validation(_) => StatusCode::BAD_REQUEST,
            BankError::NotFound(_) => StatusCode::NOT_FOUND,
            BankError::Conflict(_) => StatusCode::CONFLICT,
            BankError::InsufficientFunds(_) => StatusCode::BAD_REQUEST,
            BankError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            BankError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BankError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        // Log error based on severity
        match self {
            BankError::Validation(_) => {
                warn!(error = %error_msg, status = %status, "Validation error")
            }
            BankError::NotFound(_) => {
                warn!(error = %error_msg, status = %status, "Resource not found")
            }
            BankError::Conflict(_) => {
                warn!(error = %error_msg, status = %status, "Conflict")
            }
            BankError::InsufficientFunds(_) => {
                warn!(error = %error_msg, status = %status, "Insufficient funds")
            }
            BankError::Unauthorized(_) => {
                warn!(error = %error_msg, status = %status, "Unauthorized")
            }
            BankError::Database(_) => {
                error!(error = %error_msg, status = %status, "Database error")
            }
            BankError::Internal(_) => {
                error!(error = %error_msg, status = %status, "Internal error")
            }
        }

        // Server-side failures never expose their cause
        let (error, message) = match self {
            BankError::Database(_) | BankError::Internal(_) => {
                (INTERNAL_ERROR_MESSAGE.to_string(), INTERNAL_ERROR_MESSAGE)
            }
            BankError::Validation(msg)
            | BankError::NotFound(msg)
            | BankError::Conflict(msg)
            | BankError::InsufficientFunds(msg)
            | BankError::Unauthorized(msg) => (error_msg, msg.as_str()),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error,
            details: serde_json::json!({ "message": message }),
        })
    }
}

impl From<DomainError> for BankError {
    fn from(err: DomainError) -> Self {
        let msg = err.to_string();
        match err {
            DomainError::InsufficientFunds { .. } => BankError::InsufficientFunds(msg),
            DomainError::UserNotFound(_)
            | DomainError::AccountNotFound(_)
            | DomainError::AccountNumberNotFound(_) => BankError::NotFound(msg),
            DomainError::DuplicateNationalId(_)
            | DomainError::DuplicateEmail(_)
            | DomainError::DuplicateAccountNumber(_) => BankError::Conflict(msg),
            DomainError::InvalidAmount(_) | DomainError::SameAccount => BankError::Validation(msg),
            DomainError::Validation(detail) => BankError::Validation(detail),
            DomainError::Unauthorized(detail) => BankError::Unauthorized(detail),
            DomainError::Internal(detail) => BankError::Internal(detail),
        }
    }
}

impl From<anyhow::Error> for BankError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(domain) => BankError::from(domain.clone()),
            None => BankError::Database(format!("{:#}", err)),
        }
    }
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        BankError::Validation(format!("Invalid request body: {}", err)).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        BankError::Validation(format!("Invalid path parameter: {}", err)).into()
    })
}

// AuthenticatedUser extractor
impl FromRequest for AuthenticatedUser {
    type Error = BankError;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().copied();
        Box::pin(async move {
            user.ok_or_else(|| BankError::Unauthorized("User not authenticated".to_string()))
        })
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    info!("Health check requested");
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}
