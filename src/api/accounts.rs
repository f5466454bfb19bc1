use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState,
    types::{AccountDto, SetCreditsRequest, SetRoleRequest, SetSiteLimitRequest, SiteDto},
};
use crate::db::Role;
use crate::services::auth_service::Identity;

// Admin surface. All handlers here sit behind the staff role gate.

/// GET /admin/accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AccountDto>>>, ApiError> {
    let accounts = state
        .store()
        .list_accounts()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list accounts: {e}")))?;

    Ok(Json(ApiResponse::success(
        accounts.into_iter().map(AccountDto::from).collect(),
    )))
}

/// GET /admin/accounts/{id}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let account = load_account(&state, id).await?;
    Ok(Json(ApiResponse::success(account.into())))
}

/// PUT /admin/accounts/{id}/credits
/// Set an account's credit balance to an absolute value. Top-ups and
/// manual adjustments both go through here.
pub async fn set_credits(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Path(id): Path<i32>,
    Json(payload): Json<SetCreditsRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    if payload.credits < 0 {
        return Err(ApiError::validation("Credits cannot be negative"));
    }

    let account = load_account(&state, id).await?;

    state
        .store()
        .set_account_credits(id, payload.credits)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to set credits: {e}")))?;

    tracing::info!(
        "Credits for {} set to {} by {}",
        account.email,
        payload.credits,
        identity.email
    );
    log_admin_action(
        &state,
        &format!(
            "{} set credits for {} to {}",
            identity.email, account.email, payload.credits
        ),
    )
    .await;

    let updated = load_account(&state, id).await?;
    Ok(Json(ApiResponse::success(updated.into())))
}

/// PUT /admin/accounts/{id}/role
/// Only admins and the owner may change roles, and nobody can hand out a
/// role above their own.
pub async fn set_role(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Path(id): Path<i32>,
    Json(payload): Json<SetRoleRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let role = Role::parse(&payload.role)
        .ok_or_else(|| ApiError::validation("Role must be user, staff, admin or owner"))?;

    if identity.role < Role::Admin {
        return Err(ApiError::forbidden("Admin role required to change roles"));
    }
    if role > identity.role {
        return Err(ApiError::forbidden(
            "Cannot grant a role above your own",
        ));
    }

    let account = load_account(&state, id).await?;
    if account.id == identity.account_id {
        return Err(ApiError::validation("You cannot change your own role"));
    }

    state
        .store()
        .set_account_role(id, role)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to set role: {e}")))?;

    log_admin_action(
        &state,
        &format!(
            "{} changed role of {} to {}",
            identity.email,
            account.email,
            role.as_str()
        ),
    )
    .await;

    let updated = load_account(&state, id).await?;
    Ok(Json(ApiResponse::success(updated.into())))
}

/// PUT /admin/accounts/{id}/site-limit
pub async fn set_site_limit(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Path(id): Path<i32>,
    Json(payload): Json<SetSiteLimitRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    if payload.site_limit < 0 {
        return Err(ApiError::validation("Site limit cannot be negative"));
    }

    let account = load_account(&state, id).await?;

    state
        .store()
        .set_account_site_limit(id, payload.site_limit)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to set site limit: {e}")))?;

    log_admin_action(
        &state,
        &format!(
            "{} set site limit for {} to {}",
            identity.email, account.email, payload.site_limit
        ),
    )
    .await;

    let updated = load_account(&state, id).await?;
    Ok(Json(ApiResponse::success(updated.into())))
}

/// DELETE /admin/accounts/{id}
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if identity.role < Role::Admin {
        return Err(ApiError::forbidden("Admin role required to delete accounts"));
    }
    if id == identity.account_id {
        return Err(ApiError::validation("You cannot delete your own account"));
    }

    let account = load_account(&state, id).await?;
    if account.role == Role::Owner {
        return Err(ApiError::forbidden("The owner account cannot be deleted"));
    }

    state
        .store()
        .delete_account(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete account: {e}")))?;

    state.invalidate_ads_cache().await;
    log_admin_action(
        &state,
        &format!("{} deleted account {}", identity.email, account.email),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/sites
/// Every site on the platform, for moderation.
pub async fn list_all_sites(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<SiteDto>>>, ApiError> {
    let sites = state
        .store()
        .list_all_sites()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list sites: {e}")))?;

    Ok(Json(ApiResponse::success(
        sites.into_iter().map(SiteDto::from).collect(),
    )))
}

/// PUT /admin/sites/{id}/status
/// Moderation override: staff may unpublish (or republish) any site.
pub async fn moderate_site_status(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Path(id): Path<i32>,
    Json(payload): Json<super::types::SetStatusRequest>,
) -> Result<Json<ApiResponse<SiteDto>>, ApiError> {
    let status = crate::db::SiteStatus::parse(&payload.status)
        .ok_or_else(|| ApiError::validation("Status must be draft, private or public"))?;

    let site = load_site(&state, id).await?;

    state
        .store()
        .set_site_status(site.id, status)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update site status: {e}")))?;

    log_admin_action(
        &state,
        &format!(
            "{} set status of site {} to {}",
            identity.email,
            site.slug,
            status.as_str()
        ),
    )
    .await;

    let updated = load_site(&state, id).await?;
    Ok(Json(ApiResponse::success(updated.into())))
}

/// DELETE /admin/sites/{id}
pub async fn moderate_delete_site(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let site = load_site(&state, id).await?;

    state
        .store()
        .delete_site(site.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete site: {e}")))?;

    state.invalidate_ads_cache().await;
    log_admin_action(
        &state,
        &format!("{} deleted site {}", identity.email, site.slug),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn load_site(state: &AppState, id: i32) -> Result<crate::entities::sites::Model, ApiError> {
    state
        .store()
        .get_site(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load site: {e}")))?
        .ok_or_else(|| ApiError::not_found("Site", id))
}

async fn load_account(state: &AppState, id: i32) -> Result<crate::db::Account, ApiError> {
    state
        .store()
        .get_account(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load account: {e}")))?
        .ok_or_else(|| ApiError::not_found("Account", id))
}

async fn log_admin_action(state: &AppState, message: &str) {
    if let Err(e) = state.store().add_log("admin", "info", message, None).await {
        tracing::warn!("Failed to record admin action: {e}");
    }
}
