//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;

use crate::config::SecurityConfig;
use crate::db::{Principal, Store};
use crate::services::admin_user_service::MIN_PASSWORD_LEN;
use crate::services::auth_service::{AuthError, AuthService, LoginResult};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let is_valid = self
            .store
            .verify_principal_password(username, password)
            .await?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let principal = self
            .store
            .get_principal_by_username(username)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        self.store.touch_last_login(principal.id).await?;

        Ok(LoginResult {
            full_name: principal.full_name(),
            username: principal.username,
            is_staff: principal.is_staff,
            is_superuser: principal.is_superuser,
            api_key: principal.api_key,
        })
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<Option<Principal>, AuthError> {
        Ok(self.store.get_principal_by_api_key(api_key).await?)
    }

    async fn get_principal(&self, username: &str) -> Result<Principal, AuthError> {
        self.store
            .get_principal_by_username(username)
            .await?
            .ok_or(AuthError::PrincipalNotFound)
    }

    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "New password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let is_valid = self
            .store
            .verify_principal_password(username, current_password)
            .await?;

        if !is_valid {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_principal_password(username, new_password, Some(&self.security))
            .await?;

        Ok(())
    }
}
