//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::{QuotaConfig, SecurityConfig};
use crate::db::Store;
use crate::services::auth_service::{
    AccountInfo, AuthError, AuthService, Identity, LoginResult,
};
use async_trait::async_trait;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
    quotas: QuotaConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig, quotas: QuotaConfig) -> Self {
        Self {
            store,
            security,
            quotas,
        }
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < 8 {
        return Err(AuthError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    // Deliberately loose; the mail loop is the real validator.
    let well_formed = email.len() >= 3
        && email.len() <= 254
        && email.contains('@')
        && !email.starts_with('@')
        && !email.ends_with('@');

    if well_formed {
        Ok(())
    } else {
        Err(AuthError::Validation("Invalid email address".to_string()))
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        validate_email(email)?;
        validate_password(password)?;

        if self.store.get_account_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let account = self
            .store
            .create_account(
                email,
                password,
                self.quotas.default_credits,
                self.quotas.default_site_limit,
                &self.security,
            )
            .await?;

        Ok(LoginResult {
            email: account.email,
            role: account.role.as_str(),
            api_key: account.api_key,
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let is_valid = self.store.verify_account_password(email, password).await?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let account = self
            .store
            .get_account_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        Ok(LoginResult {
            email: account.email,
            role: account.role.as_str(),
            api_key: account.api_key,
        })
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<Option<Identity>, AuthError> {
        let account = self.store.verify_api_key(api_key).await?;
        Ok(account.map(|a| Identity {
            account_id: a.id,
            email: a.email,
            role: a.role,
        }))
    }

    async fn identify(&self, email: &str) -> Result<Option<Identity>, AuthError> {
        let account = self.store.get_account_by_email(email).await?;
        Ok(account.map(|a| Identity {
            account_id: a.id,
            email: a.email,
            role: a.role,
        }))
    }

    async fn get_account_info(&self, email: &str) -> Result<AccountInfo, AuthError> {
        let account = self
            .store
            .get_account_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        Ok(AccountInfo {
            id: account.id,
            email: account.email,
            role: account.role.as_str(),
            credits: account.credits,
            site_limit: account.site_limit,
            created_at: account.created_at,
            updated_at: account.updated_at,
        })
    }

    async fn change_password(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let is_valid = self
            .store
            .verify_account_password(email, current_password)
            .await?;

        if !is_valid {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_account_password(email, new_password, &self.security)
            .await?;

        Ok(())
    }

    async fn get_api_key(&self, email: &str) -> Result<String, AuthError> {
        let account = self
            .store
            .get_account_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        Ok(account.api_key)
    }

    async fn regenerate_api_key(&self, email: &str) -> Result<String, AuthError> {
        let new_api_key = self.store.regenerate_account_api_key(email).await?;
        Ok(new_api_key)
    }
}
