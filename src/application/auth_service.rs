use crate::application::user_service::create_user;
use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{CreateUser, LoginRequest, User};
use crate::domain::validation::validate_login;
use crate::infrastructure::security::{generate_token, verify_password};
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, instrument, trace, warn};

const INVALID_CREDENTIALS: &str = "Invalid national ID or password";

pub struct AuthService<R: UserRepository> {
    user_repository: Arc<R>,
    jwt_secret: String,
    token_ttl_secs: i64,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(user_repository: Arc<R>, jwt_secret: String, token_ttl_secs: i64) -> Self {
        Self {
            user_repository,
            jwt_secret,
            token_ttl_secs,
        }
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register_user(&self, req: CreateUser) -> Result<User> {
        trace!("Starting user registration");
        let user = create_user(self.user_repository.as_ref(), req).await?;

        info!(
            user_id = user.id,
            email = %user.email,
            "User registered successfully"
        );

        Ok(user)
    }

    /// Checks the credentials and returns a signed access token with the user.
    #[instrument(skip(self, req), fields(national_id = %req.national_id))]
    pub async fn login(&self, req: LoginRequest) -> Result<(String, User)> {
        trace!("Starting login");
        validate_login(&req)?;

        let user = self
            .user_repository
            .find_user_by_national_id(&req.national_id)
            .await?
            .ok_or_else(|| {
                warn!(national_id = %req.national_id, "User not found during login");
                DomainError::Unauthorized(INVALID_CREDENTIALS.to_string())
            })?;

        let is_valid = verify_password(&req.password, &user.password_hash).map_err(|e| {
            error!(error = %e, "Failed to verify password");
            DomainError::Internal(format!("Failed to verify password: {}", e))
        })?;

        if !is_valid {
            warn!(user_id = user.id, "Invalid password during login");
            return Err(DomainError::Unauthorized(INVALID_CREDENTIALS.to_string()).into());
        }

        let token = generate_token(user.id, &self.jwt_secret, self.token_ttl_secs).map_err(|e| {
            error!(error = %e, "Failed to generate token");
            DomainError::Internal(format!("Failed to generate token: {}", e))
        })?;

        info!(user_id = user.id, "Login successful");

        Ok((token, user))
    }
}
