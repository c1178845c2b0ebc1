use crate::presentation::accounts::{
    create_account, delete_account, get_balance, get_by_number, list_user_accounts,
};
use crate::presentation::auth::{login, register};
use crate::presentation::handlers::{health_check, json_config, path_config};
use crate::presentation::transactions::{create_transaction, list_account_transactions, transfer};
use crate::presentation::users::{create_user, delete_user, get_user, list_users, update_user};
use actix_web::web;

/// Registers every `/api` route together with the JSON and path error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).app_data(path_config()).service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/users", web::get().to(list_users))
            .route("/users", web::post().to(create_user))
            .route("/users/{id}", web::get().to(get_user))
            .route("/users/{id}", web::put().to(update_user))
            .route("/users/{id}", web::delete().to(delete_user))
            .route("/accounts", web::post().to(create_account))
            .route("/accounts/user/{user_id}", web::get().to(list_user_accounts))
            .route("/accounts/number/{number}", web::get().to(get_by_number))
            .route("/accounts/{id}/balance", web::get().to(get_balance))
            .route("/accounts/{id}", web::delete().to(delete_account))
            .route("/transactions", web::post().to(create_transaction))
            .route("/transactions/transfer", web::post().to(transfer))
            .route(
                "/transactions/account/{account_id}",
                web::get().to(list_account_transactions),
            ),
    );
}
