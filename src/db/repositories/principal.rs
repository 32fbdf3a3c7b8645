use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::principals;

/// Principal data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub api_key: String,
    pub date_joined: String,
    pub last_login: Option<String>,
}

impl Principal {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl From<principals::Model> for Principal {
    fn from(model: principals::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            api_key: model.api_key,
            date_joined: model.date_joined,
            last_login: model.last_login,
        }
    }
}

pub struct PrincipalRepository {
    conn: DatabaseConnection,
}

impl PrincipalRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Principal>> {
        let principal = principals::Entity::find()
            .filter(principals::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query principal by username")?;

        Ok(principal.map(Principal::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Principal>> {
        let principal = principals::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query principal by ID")?;

        Ok(principal.map(Principal::from))
    }

    /// Verify password for a principal.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let principal = principals::Entity::find()
            .filter(principals::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query principal for password verification")?;

        let Some(principal) = principal else {
            return Ok(false);
        };

        let password_hash = principal.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Update password for a principal (hashes the new password)
    pub async fn update_password(
        &self,
        username: &str,
        new_password: &str,
        config: Option<&SecurityConfig>,
    ) -> Result<()> {
        let principal = principals::Entity::find()
            .filter(principals::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query principal for password update")?
            .ok_or_else(|| anyhow::anyhow!("Principal not found: {username}"))?;

        let new_hash = hash_password_blocking(new_password, config.cloned()).await?;

        let mut active: principals::ActiveModel = principal.into();
        active.password_hash = Set(new_hash);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Verify API key and return the associated principal
    pub async fn get_by_api_key(&self, api_key: &str) -> Result<Option<Principal>> {
        let principal = principals::Entity::find()
            .filter(principals::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await
            .context("Failed to query principal by API key")?;

        Ok(principal.map(Principal::from))
    }

    /// Stamp a successful login
    pub async fn touch_last_login(&self, id: i32) -> Result<()> {
        let principal = principals::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query principal for login stamp")?
            .ok_or_else(|| anyhow::anyhow!("Principal not found: {id}"))?;

        let mut active: principals::ActiveModel = principal.into();
        active.last_login = Set(Some(chrono::Utc::now().to_rfc3339()));
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Regenerate API key for a principal
    pub async fn regenerate_api_key(&self, username: &str) -> Result<String> {
        let principal = principals::Entity::find()
            .filter(principals::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query principal for API key regeneration")?
            .ok_or_else(|| anyhow::anyhow!("Principal not found: {username}"))?;

        let new_api_key = generate_api_key();

        let mut active: principals::ActiveModel = principal.into();
        active.api_key = Set(new_api_key.clone());
        active.update(&self.conn).await?;

        Ok(new_api_key)
    }
}

/// Hash a password off the async runtime.
pub async fn hash_password_blocking(
    password: &str,
    config: Option<SecurityConfig>,
) -> Result<String> {
    let password = password.to_string();
    task::spawn_blocking(move || hash_password(&password, config.as_ref()))
        .await
        .context("Password hashing task panicked")?
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random API key (64 character hex string)
#[must_use]
pub fn generate_api_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
