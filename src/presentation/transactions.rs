use crate::domain::models::{CreateTransaction, CreateTransfer};
use crate::presentation::handlers::{AppState, BankError};
use crate::presentation::middleware::AuthenticatedUser;
use actix_web::{HttpResponse, web};
use tracing::{error, info, instrument};

#[instrument(skip(state, user, req), fields(requested_by = user.user_id, account_id, kind, amount))]
pub async fn create_transaction(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreateTransaction>,
) -> Result<HttpResponse, BankError> {
    let posting = req.into_inner();
    let account_id = posting.account_id;
    let amount = posting.amount;
    tracing::Span::current()
        .record("account_id", account_id)
        .record("kind", posting.kind.as_str())
        .record("amount", tracing::field::display(amount));
    info!(
        account_id = account_id,
        kind = %posting.kind,
        amount = %amount,
        "Processing transaction"
    );
    let record = state
        .ledger_service
        .record_transaction(posting)
        .await
        .map_err(|e| {
            error!(account_id = account_id, amount = %amount, error = %e, "Failed to post transaction");
            BankError::from(e)
        })?;
    info!(
        transaction_id = record.id,
        account_id = account_id,
        "Transaction completed successfully"
    );
    Ok(HttpResponse::Created().json(record))
}

#[instrument(
    skip(state, user, req),
    fields(requested_by = user.user_id, source_account_id, destination_account_id, amount)
)]
pub async fn transfer(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreateTransfer>,
) -> Result<HttpResponse, BankError> {
    let transfer_req = req.into_inner();
    let from_id = transfer_req.source_account_id;
    let to_id = transfer_req.destination_account_id;
    let amount = transfer_req.amount;
    tracing::Span::current()
        .record("source_account_id", from_id)
        .record("destination_account_id", to_id)
        .record("amount", tracing::field::display(amount));
    info!(
        source_account_id = from_id,
        destination_account_id = to_id,
        amount = %amount,
        "Processing transfer"
    );
    let record = state.ledger_service.transfer(transfer_req).await.map_err(|e| {
        error!(
            source_account_id = from_id,
            destination_account_id = to_id,
            amount = %amount,
            error = %e,
            "Failed to transfer"
        );
        BankError::from(e)
    })?;
    info!(
        transaction_id = record.id,
        source_account_id = from_id,
        destination_account_id = to_id,
        "Transfer completed successfully"
    );
    Ok(HttpResponse::Created().json(record))
}

#[instrument(skip(state, _user), fields(account_id = %*path))]
pub async fn list_account_transactions(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, BankError> {
    let account_id = path.into_inner();
    let history = state
        .ledger_service
        .transactions_for_account(account_id)
        .await
        .map_err(|e| {
            error!(account_id = account_id, error = %e, "Failed to list transactions");
            BankError::from(e)
        })?;
    info!(account_id = account_id, count = history.len(), "Transactions listed");
    Ok(HttpResponse::Ok().json(history))
}
