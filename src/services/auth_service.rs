//! Domain service for authentication and account self-management.
//!
//! Handles registration, login, password changes, and API key management.
//! Admin mutations of other accounts live in the admin API layer, gated by
//! the role on the caller's account record.

use serde::Serialize;
use thiserror::Error;

use crate::db::Role;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not found")]
    AccountNotFound,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Account info DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct AccountInfo {
    pub id: i32,
    pub email: String,
    pub role: &'static str,
    pub credits: i64,
    pub site_limit: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// Login result containing account info and API key.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub email: String,
    pub role: &'static str,
    pub api_key: String,
}

/// Resolved identity of an authenticated caller.
#[derive(Debug, Clone)]
pub struct Identity {
    pub account_id: i32,
    pub email: String,
    pub role: Role,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a new account with plan-default credits and site limit.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailTaken`] if the email is already registered.
    async fn register(&self, email: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Verifies credentials and returns account info.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Verifies an API key and returns the caller's identity if valid.
    async fn verify_api_key(&self, api_key: &str) -> Result<Option<Identity>, AuthError>;

    /// Resolves a session email back to an identity.
    async fn identify(&self, email: &str) -> Result<Option<Identity>, AuthError>;

    /// Gets information for a specific account.
    async fn get_account_info(&self, email: &str) -> Result<AccountInfo, AuthError>;

    /// Changes an account's password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is incorrect
    /// or the new password is invalid.
    async fn change_password(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Gets the current API key for an account.
    async fn get_api_key(&self, email: &str) -> Result<String, AuthError>;

    /// Regenerates the API key for an account and returns the new one.
    async fn regenerate_api_key(&self, email: &str) -> Result<String, AuthError>;
}
