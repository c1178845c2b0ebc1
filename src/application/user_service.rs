use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{CreateUser, NewUser, UpdateUser, User};
use crate::domain::validation::{validate_create_user, validate_update_user};
use crate::infrastructure::security::hash_password;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};

/// Validates, checks uniqueness and hashes the password before inserting.
/// Shared by registration and administrative user creation.
pub(crate) async fn create_user<R: UserRepository>(repository: &R, req: CreateUser) -> Result<User> {
    validate_create_user(&req)?;

    if repository
        .find_user_by_national_id(&req.national_id)
        .await?
        .is_some()
    {
        warn!(national_id = %req.national_id, "National ID already registered");
        return Err(DomainError::DuplicateNationalId(req.national_id).into());
    }
    if repository.find_user_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "Email already registered");
        return Err(DomainError::DuplicateEmail(req.email).into());
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        DomainError::Internal(format!("Failed to hash password: {}", e))
    })?;

    debug!(email = %req.email, "Saving user to repository");
    repository
        .save_user(NewUser {
            national_id: req.national_id,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            password_hash,
        })
        .await
}

pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.repository.list_users().await
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.repository
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(id).into())
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn create_user(&self, req: CreateUser) -> Result<User> {
        let user = create_user(self.repository.as_ref(), req).await?;
        info!(user_id = user.id, "User created");
        Ok(user)
    }

    #[instrument(skip(self, req))]
    pub async fn update_user(&self, id: i64, req: UpdateUser) -> Result<User> {
        trace!("Starting user update");
        validate_update_user(&req)?;
        let mut user = self.get_user(id).await?;

        if let Some(email) = req.email {
            if email != user.email {
                if let Some(other) = self.repository.find_user_by_email(&email).await? {
                    warn!(user_id = id, other_user_id = other.id, "Email already in use");
                    return Err(DomainError::DuplicateEmail(email).into());
                }
            }
            user.email = email;
        }
        if let Some(first_name) = req.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = req.last_name {
            user.last_name = last_name;
        }
        if let Some(phone) = req.phone {
            user.phone = phone;
        }

        self.repository.update_user(&user).await?;
        info!(user_id = id, "User updated");
        Ok(user)
    }

    /// Removes the user together with their accounts and ledger history.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        if !self.repository.delete_user(id).await? {
            return Err(DomainError::UserNotFound(id).into());
        }
        info!(user_id = id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::user_repository::SqliteUserRepository;
    use crate::infrastructure::database::connect_in_memory;

    async fn service() -> UserService<SqliteUserRepository> {
        let pool = connect_in_memory().await.unwrap();
        UserService::new(Arc::new(SqliteUserRepository::new(pool)))
    }

    fn request(national_id: &str, email: &str) -> CreateUser {
        CreateUser {
            national_id: national_id.to_string(),
            first_name: "Carlos".to_string(),
            last_name: "Mendoza".to_string(),
            email: email.to_string(),
            phone: "0991234567".to_string(),
            password: "password123".to_string(),
        }
    }

    fn domain_error(err: &anyhow::Error) -> Option<&DomainError> {
        err.downcast_ref::<DomainError>()
    }

    #[tokio::test]
    async fn test_create_user_hashes_password() {
        let service = service().await;

        let user = service.create_user(request("12345678", "c@example.com")).await.unwrap();

        assert!(user.password_hash.starts_with("$argon2id$"));
        assert_eq!(service.get_user(user.id).await.unwrap().email, "c@example.com");
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicates() {
        let service = service().await;
        service.create_user(request("12345678", "c@example.com")).await.unwrap();

        let err = service
            .create_user(request("12345678", "other@example.com"))
            .await
            .unwrap_err();
        assert_eq!(
            domain_error(&err),
            Some(&DomainError::DuplicateNationalId("12345678".to_string()))
        );

        let err = service
            .create_user(request("87654321", "c@example.com"))
            .await
            .unwrap_err();
        assert_eq!(
            domain_error(&err),
            Some(&DomainError::DuplicateEmail("c@example.com".to_string()))
        );
    }

    #[tokio::test]
    async fn test_create_user_validates_fields() {
        let service = service().await;

        let err = service.create_user(request("12", "bad")).await.unwrap_err();
        assert!(matches!(domain_error(&err), Some(DomainError::Validation(_))));
        assert!(service.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_user_partial_fields() {
        let service = service().await;
        let user = service.create_user(request("12345678", "c@example.com")).await.unwrap();

        let updated = service
            .update_user(
                user.id,
                UpdateUser {
                    phone: Some("+593991112223".to_string()),
                    ..UpdateUser::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.phone, "+593991112223");
        assert_eq!(updated.first_name, "Carlos");
        assert_eq!(updated.email, "c@example.com");
    }

    #[tokio::test]
    async fn test_update_user_rejects_email_of_another_user() {
        let service = service().await;
        let first = service.create_user(request("12345678", "a@example.com")).await.unwrap();
        service.create_user(request("87654321", "b@example.com")).await.unwrap();

        let err = service
            .update_user(
                first.id,
                UpdateUser {
                    email: Some("b@example.com".to_string()),
                    ..UpdateUser::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            domain_error(&err),
            Some(&DomainError::DuplicateEmail("b@example.com".to_string()))
        );

        // Keeping one's own email is not a conflict
        let same = UpdateUser {
            email: Some("a@example.com".to_string()),
            ..UpdateUser::default()
        };
        assert!(service.update_user(first.id, same).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_user_operations() {
        let service = service().await;

        let err = service.get_user(5).await.unwrap_err();
        assert_eq!(domain_error(&err), Some(&DomainError::UserNotFound(5)));

        let err = service.update_user(5, UpdateUser::default()).await.unwrap_err();
        assert_eq!(domain_error(&err), Some(&DomainError::UserNotFound(5)));

        let err = service.delete_user(5).await.unwrap_err();
        assert_eq!(domain_error(&err), Some(&DomainError::UserNotFound(5)));
    }
}
