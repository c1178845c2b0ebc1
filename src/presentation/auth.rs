use crate::domain::user::{CreateUser, LoginRequest, UserProfile};
use crate::presentation::handlers::{AppState, BankError};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
}

#[instrument(skip(state, req))]
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<CreateUser>,
) -> Result<HttpResponse, BankError> {
    info!(email = %req.email, "Registration request received");

    let user = state
        .auth_service
        .register_user(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to register user");
            BankError::from(e)
        })?;

    info!(user_id = user.id, email = %user.email, "User registered successfully");
    Ok(HttpResponse::Created().json(user.profile()))
}

#[instrument(skip(state, req))]
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, BankError> {
    info!(national_id = %req.national_id, "Login request received");

    let (token, user) = state
        .auth_service
        .login(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to login");
            BankError::from(e)
        })?;

    let response = LoginResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        user: user.profile(),
    };

    info!(user_id = response.user.id, "Login successful");
    Ok(HttpResponse::Ok().json(response))
}
