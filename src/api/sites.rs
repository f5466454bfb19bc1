use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use regex::Regex;
use std::sync::{Arc, LazyLock};

use super::{
    ApiError, ApiResponse, AppState,
    types::{CreateSiteRequest, SetMonetizationRequest, SetStatusRequest, SiteDto, UpdateSiteRequest},
};
use crate::constants::limits;
use crate::db::SiteStatus;
use crate::services::auth_service::Identity;

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$").unwrap());

fn validate_slug(slug: &str) -> Result<(), ApiError> {
    if slug.is_empty() || slug.len() > limits::MAX_SLUG_LEN {
        return Err(ApiError::validation(format!(
            "Slug must be between 1 and {} characters",
            limits::MAX_SLUG_LEN
        )));
    }
    if !SLUG_RE.is_match(slug) {
        return Err(ApiError::validation(
            "Slug may only contain lowercase letters, digits and hyphens",
        ));
    }
    Ok(())
}

fn validate_html(html: &str) -> Result<(), ApiError> {
    if html.len() > limits::MAX_HTML_BYTES {
        return Err(ApiError::validation(format!(
            "Site content exceeds the {} byte limit",
            limits::MAX_HTML_BYTES
        )));
    }
    Ok(())
}

// ============================================================================
// Owner-scoped handlers
// ============================================================================

/// GET /sites
/// List sites owned by the authenticated account.
pub async fn list_sites(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<SiteDto>>>, ApiError> {
    let sites = state
        .store()
        .list_sites_for_owner(identity.account_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list sites: {e}")))?;

    Ok(Json(ApiResponse::success(
        sites.into_iter().map(SiteDto::from).collect(),
    )))
}

/// POST /sites
/// Create a draft site. Enforces the per-account site limit.
pub async fn create_site(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Json(payload): Json<CreateSiteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SiteDto>>), ApiError> {
    validate_slug(&payload.slug)?;
    validate_html(&payload.html)?;
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }

    let account = state
        .store()
        .get_account(identity.account_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load account: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Account not found".to_string()))?;

    let owned = state
        .store()
        .count_sites_for_owner(identity.account_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to count sites: {e}")))?;

    if owned >= u64::from(account.site_limit.max(0).unsigned_abs()) {
        return Err(ApiError::forbidden(format!(
            "Site limit reached ({} sites)",
            account.site_limit
        )));
    }

    if state
        .store()
        .get_site_by_slug(&payload.slug)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to check slug: {e}")))?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Slug '{}' is already taken",
            payload.slug
        )));
    }

    let site = state
        .store()
        .create_site(identity.account_id, &payload.slug, &payload.title, &payload.html)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create site: {e}")))?;

    tracing::info!("Site created: {} (owner: {})", payload.slug, identity.email);

    Ok((StatusCode::CREATED, Json(ApiResponse::success(site.into()))))
}

/// GET /sites/{slug}
pub async fn get_site(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<SiteDto>>, ApiError> {
    let site = owned_site(&state, &identity, &slug).await?;
    Ok(Json(ApiResponse::success(site.into())))
}

/// PUT /sites/{slug}
/// Update site title and/or content.
pub async fn update_site(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Path(slug): Path<String>,
    Json(payload): Json<UpdateSiteRequest>,
) -> Result<Json<ApiResponse<SiteDto>>, ApiError> {
    if let Some(html) = &payload.html {
        validate_html(html)?;
    }
    if let Some(title) = &payload.title
        && title.trim().is_empty()
    {
        return Err(ApiError::validation("Title cannot be empty"));
    }

    let site = owned_site(&state, &identity, &slug).await?;

    state
        .store()
        .update_site_content(site.id, payload.title.as_deref(), payload.html.as_deref())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update site: {e}")))?;

    let updated = reload_site(&state, site.id).await?;
    Ok(Json(ApiResponse::success(updated.into())))
}

/// PUT /sites/{slug}/status
/// Move a site between draft, private and public.
pub async fn set_site_status(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Path(slug): Path<String>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<Json<ApiResponse<SiteDto>>, ApiError> {
    let status = SiteStatus::parse(&payload.status)
        .ok_or_else(|| ApiError::validation("Status must be draft, private or public"))?;

    let site = owned_site(&state, &identity, &slug).await?;

    state
        .store()
        .set_site_status(site.id, status)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update site status: {e}")))?;

    tracing::info!("Site {} status set to {}", slug, status.as_str());

    let updated = reload_site(&state, site.id).await?;
    Ok(Json(ApiResponse::success(updated.into())))
}

/// PUT /sites/{slug}/monetization
/// Toggle ad monetization. Enabling requires a publisher id.
pub async fn set_site_monetization(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Path(slug): Path<String>,
    Json(payload): Json<SetMonetizationRequest>,
) -> Result<Json<ApiResponse<SiteDto>>, ApiError> {
    if payload.enabled && payload.publisher_id.as_deref().is_none_or(str::is_empty) {
        return Err(ApiError::validation(
            "A publisher id is required to enable monetization",
        ));
    }

    let site = owned_site(&state, &identity, &slug).await?;

    state
        .store()
        .set_site_monetization(site.id, payload.enabled, payload.publisher_id.as_deref())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update monetization: {e}")))?;

    state.invalidate_ads_cache().await;

    let updated = reload_site(&state, site.id).await?;
    Ok(Json(ApiResponse::success(updated.into())))
}

/// DELETE /sites/{slug}
pub async fn delete_site(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    let site = owned_site(&state, &identity, &slug).await?;

    state
        .store()
        .delete_site(site.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete site: {e}")))?;

    state.invalidate_ads_cache().await;
    tracing::info!("Site deleted: {} (owner: {})", slug, identity.email);

    Ok(StatusCode::NO_CONTENT)
}

async fn owned_site(
    state: &AppState,
    identity: &Identity,
    slug: &str,
) -> Result<crate::entities::sites::Model, ApiError> {
    let site = state
        .store()
        .get_site_by_slug(slug)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load site: {e}")))?
        .ok_or_else(|| ApiError::site_not_found(slug))?;

    // Owners see their own sites; staff may manage any site.
    if site.owner_id != identity.account_id && !identity.role.is_staff() {
        return Err(ApiError::site_not_found(slug));
    }

    Ok(site)
}

async fn reload_site(state: &AppState, id: i32) -> Result<crate::entities::sites::Model, ApiError> {
    state
        .store()
        .get_site(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to reload site: {e}")))?
        .ok_or_else(|| ApiError::internal("Site disappeared during update"))
}

// ============================================================================
// Public rendering
// ============================================================================

/// GET /s/{slug}
/// Serve a public site's HTML and count the view. Draft and private sites
/// are indistinguishable from missing ones.
pub async fn render_site(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let site = state
        .store()
        .get_site_by_slug(&slug)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load site: {e}")))?;

    let Some(site) = site else {
        return Ok(not_found_page());
    };

    if SiteStatus::parse(&site.status) != Some(SiteStatus::Public) {
        return Ok(not_found_page());
    }

    if let Err(e) = state.store().increment_site_views(site.id).await {
        tracing::warn!("Failed to record view for {slug}: {e}");
    }

    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        site.html,
    )
        .into_response())
}

fn not_found_page() -> Response {
    (
        StatusCode::NOT_FOUND,
        Html("<!DOCTYPE html><html><body><h1>404</h1><p>This site does not exist.</p></body></html>"),
    )
        .into_response()
}
