use crate::domain::user::{CreateUser, UpdateUser, UserProfile};
use crate::presentation::handlers::{AppState, BankError, MessageResponse};
use crate::presentation::middleware::AuthenticatedUser;
use actix_web::{HttpResponse, web};
use tracing::{error, info, instrument};

#[instrument(skip(state, user), fields(requested_by = user.user_id))]
pub async fn list_users(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, BankError> {
    let users = state.user_service.list_users().await.map_err(|e| {
        error!(error = %e, "Failed to list users");
        BankError::from(e)
    })?;
    let profiles: Vec<UserProfile> = users.iter().map(|u| u.profile()).collect();
    info!(count = profiles.len(), "Users listed");
    Ok(HttpResponse::Ok().json(profiles))
}

#[instrument(skip(state, user), fields(user_id = %*path, requested_by = user.user_id))]
pub async fn get_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, BankError> {
    let user_id = path.into_inner();
    let found = state.user_service.get_user(user_id).await.map_err(|e| {
        error!(user_id = user_id, error = %e, "Failed to get user");
        BankError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(found.profile()))
}

#[instrument(skip(state, user, req), fields(requested_by = user.user_id, user_id))]
pub async fn create_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreateUser>,
) -> Result<HttpResponse, BankError> {
    info!(email = %req.email, "Creating new user");
    let created = state
        .user_service
        .create_user(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create user");
            BankError::from(e)
        })?;
    tracing::Span::current().record("user_id", created.id);
    info!(user_id = created.id, "User created successfully");
    Ok(HttpResponse::Created().json(created.profile()))
}

#[instrument(skip(state, user, req), fields(user_id = %*path, requested_by = user.user_id))]
pub async fn update_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<UpdateUser>,
) -> Result<HttpResponse, BankError> {
    let user_id = path.into_inner();
    info!(user_id = user_id, "Updating user");
    let updated = state
        .user_service
        .update_user(user_id, req.into_inner())
        .await
        .map_err(|e| {
            error!(user_id = user_id, error = %e, "Failed to update user");
            BankError::from(e)
        })?;
    info!(user_id = user_id, "User updated successfully");
    Ok(HttpResponse::Ok().json(updated.profile()))
}

#[instrument(skip(state, user), fields(user_id = %*path, requested_by = user.user_id))]
pub async fn delete_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, BankError> {
    let user_id = path.into_inner();
    info!(user_id = user_id, "Deleting user");
    state.user_service.delete_user(user_id).await.map_err(|e| {
        error!(user_id = user_id, error = %e, "Failed to delete user");
        BankError::from(e)
    })?;
    info!(user_id = user_id, "User deleted successfully");
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: format!("User {} deleted", user_id),
    }))
}
