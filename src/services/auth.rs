// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::UserStore,
    models::auth::{Claims, Role, User},
};

/// Custo mínimo aceito pelo bcrypt; só para deixar os testes rápidos.
#[cfg(test)]
pub const TEST_HASH_COST: u32 = 4;

#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserStore>,
    jwt_secret: String,
    token_ttl: Duration,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(user_repo: Arc<dyn UserStore>, jwt_secret: String, token_ttl: Duration) -> Self {
        Self {
            user_repo,
            jwt_secret,
            token_ttl,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    #[cfg(test)]
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub async fn register_user(&self, name: &str, email: &str, password: &str) -> Result<String, AppError> {
        let user = self.create_account(name, email, password, Role::User).await?;
        tracing::info!(user_id = %user.id, "user registered");
        self.create_token(&user)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(&user)
    }

    /// Resolve o ator a partir do token: decodifica e recarrega o usuário.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Cria o superusuário inicial se o e-mail ainda não existir.
    pub async fn ensure_superuser(&self, name: &str, email: &str, password: &str) -> Result<bool, AppError> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            return Ok(false);
        }
        let user = self.create_account(name, email, password, Role::Superuser).await?;
        tracing::info!(user_id = %user.id, email = %user.email, "superuser bootstrapped");
        Ok(true)
    }

    async fn create_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AppError> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        // Hashing fora do runtime assíncrono
        let password_clone = password.to_owned();
        let cost = self.hash_cost;
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("password hashing task failed: {}", e))??;

        self.user_repo
            .create_user(name, email, &hashed_password, role)
            .await
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
