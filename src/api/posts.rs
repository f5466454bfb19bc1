use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState,
    types::{CreatePostRequest, PostDto, UpdatePostRequest},
};
use crate::db::PostStatus;
use crate::services::auth_service::Identity;

#[derive(Deserialize)]
pub struct FeedQuery {
    pub category: Option<String>,
}

// ============================================================================
// Author-scoped handlers
// ============================================================================

/// GET /posts
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<PostDto>>>, ApiError> {
    let posts = state
        .store()
        .list_posts_for_author(identity.account_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list posts: {e}")))?;

    Ok(Json(ApiResponse::success(
        posts.into_iter().map(PostDto::from).collect(),
    )))
}

/// POST /posts
/// Create a draft post. Slugs only need to be unique per author.
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PostDto>>), ApiError> {
    if payload.slug.is_empty() {
        return Err(ApiError::validation("Slug is required"));
    }
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }

    if state
        .store()
        .get_post_for_author(identity.account_id, &payload.slug)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to check slug: {e}")))?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "You already have a post with slug '{}'",
            payload.slug
        )));
    }

    let post = state
        .store()
        .create_post(
            identity.account_id,
            &payload.slug,
            &payload.title,
            &payload.html,
            &payload.category,
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create post: {e}")))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(post.into()))))
}

/// GET /posts/{slug}
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let post = authored_post(&state, &identity, &slug).await?;
    Ok(Json(ApiResponse::success(post.into())))
}

/// PUT /posts/{slug}
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Path(slug): Path<String>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let status = match payload.status.as_deref() {
        Some(s) => Some(
            PostStatus::parse(s)
                .ok_or_else(|| ApiError::validation("Status must be draft or active"))?,
        ),
        None => None,
    };

    let post = authored_post(&state, &identity, &slug).await?;

    state
        .store()
        .update_post(
            post.id,
            payload.title.as_deref(),
            payload.html.as_deref(),
            payload.category.as_deref(),
            status,
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update post: {e}")))?;

    let updated = state
        .store()
        .get_post_for_author(identity.account_id, &slug)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to reload post: {e}")))?
        .ok_or_else(|| ApiError::internal("Post disappeared during update"))?;

    Ok(Json(ApiResponse::success(updated.into())))
}

/// DELETE /posts/{slug}
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    let post = authored_post(&state, &identity, &slug).await?;

    state
        .store()
        .delete_post(post.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete post: {e}")))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn authored_post(
    state: &AppState,
    identity: &Identity,
    slug: &str,
) -> Result<crate::entities::posts::Model, ApiError> {
    state
        .store()
        .get_post_for_author(identity.account_id, slug)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load post: {e}")))?
        .ok_or_else(|| ApiError::post_not_found(slug))
}

// ============================================================================
// Public feed
// ============================================================================

/// GET /feed
/// Newest-first list of active posts across all authors, optionally filtered
/// by category.
pub async fn feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<ApiResponse<Vec<PostDto>>>, ApiError> {
    let posts = state
        .store()
        .list_active_posts(query.category.as_deref())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load feed: {e}")))?;

    Ok(Json(ApiResponse::success(
        posts.into_iter().map(PostDto::from).collect(),
    )))
}
