use crate::domain::models::CreateAccount;
use crate::presentation::handlers::{AppState, BankError, MessageResponse};
use crate::presentation::middleware::AuthenticatedUser;
use actix_web::{HttpResponse, web};
use tracing::{error, info, instrument};

#[instrument(skip(state, user, req), fields(requested_by = user.user_id, account_id))]
pub async fn create_account(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreateAccount>,
) -> Result<HttpResponse, BankError> {
    info!(
        account_number = %req.account_number,
        owner_id = req.user_id,
        "Creating new account"
    );
    let account = state
        .account_service
        .create_account(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create account");
            BankError::from(e)
        })?;
    tracing::Span::current().record("account_id", account.id);
    info!(
        account_id = account.id,
        balance = %account.balance,
        "Account created successfully"
    );
    Ok(HttpResponse::Created().json(account))
}

#[instrument(skip(state, _user), fields(owner_id = %*path))]
pub async fn list_user_accounts(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, BankError> {
    let owner_id = path.into_inner();
    let accounts = state
        .account_service
        .accounts_for_user(owner_id)
        .await
        .map_err(|e| {
            error!(owner_id = owner_id, error = %e, "Failed to list accounts");
            BankError::from(e)
        })?;
    info!(owner_id = owner_id, count = accounts.len(), "Accounts listed");
    Ok(HttpResponse::Ok().json(accounts))
}

#[instrument(skip(state, _user), fields(account_id = %*path))]
pub async fn get_balance(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, BankError> {
    let account_id = path.into_inner();
    info!(account_id = account_id, "Getting account balance");
    let account = state
        .account_service
        .get_account(account_id)
        .await
        .map_err(|e| {
            error!(account_id = account_id, error = %e, "Failed to get account");
            BankError::from(e)
        })?;
    info!(
        account_id = account.id,
        balance = %account.balance,
        "Account retrieved successfully"
    );
    Ok(HttpResponse::Ok().json(account))
}

#[instrument(skip(state, _user), fields(account_number = %*path))]
pub async fn get_by_number(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, BankError> {
    let account_number = path.into_inner();
    let account = state
        .account_service
        .get_by_number(&account_number)
        .await
        .map_err(|e| {
            error!(account_number = %account_number, error = %e, "Failed to find account");
            BankError::from(e)
        })?;
    Ok(HttpResponse::Ok().json(account))
}

#[instrument(skip(state, user), fields(account_id = %*path, requested_by = user.user_id))]
pub async fn delete_account(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, BankError> {
    let account_id = path.into_inner();
    info!(account_id = account_id, "Deleting account");
    state
        .account_service
        .delete_account(account_id)
        .await
        .map_err(|e| {
            error!(account_id = account_id, error = %e, "Failed to delete account");
            BankError::from(e)
        })?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: format!("Account {} deleted", account_id),
    }))
}
