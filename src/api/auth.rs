use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState};
use crate::constants::SESSION_ACCOUNT_KEY;
use crate::services::auth_service::{AccountInfo, AuthError, Identity, LoginResult};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                Self::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::AccountNotFound => Self::Unauthorized("Account not found".to_string()),
            AuthError::EmailTaken => {
                Self::Conflict("An account with this email already exists".to_string())
            }
            AuthError::Validation(msg) => Self::ValidationError(msg),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware for protected routes. Accepts, in order:
/// 1. Session cookie (from login)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
///
/// On success the resolved [`Identity`] is attached to request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(identity) = resolve_identity(&state, &headers, &session).await? {
        tracing::Span::current().record("user_id", identity.email.as_str());
        request.extensions_mut().insert(identity);
        return Ok(next.run(request).await);
    }

    Ok((StatusCode::UNAUTHORIZED, "Unauthorized").into_response())
}

/// Role gate for the admin surface. Must run inside `auth_middleware`, which
/// attaches the identity. The role comes from the account record, not from
/// any hard-coded email list.
pub async fn require_staff(request: Request, next: Next) -> Result<impl IntoResponse, ApiError> {
    let Some(identity) = request.extensions().get::<Identity>() else {
        return Ok((StatusCode::UNAUTHORIZED, "Unauthorized").into_response());
    };

    if !identity.role.is_staff() {
        return Err(ApiError::forbidden("Staff role required"));
    }

    Ok(next.run(request).await)
}

/// Resolve a caller's identity from session or API key, if any.
pub async fn resolve_identity(
    state: &AppState,
    headers: &HeaderMap,
    session: &Session,
) -> Result<Option<Identity>, ApiError> {
    if let Ok(Some(email)) = session.get::<String>(SESSION_ACCOUNT_KEY).await
        && let Some(identity) = state.auth_service().identify(&email).await?
    {
        return Ok(Some(identity));
    }

    if let Some(key) = extract_api_key(headers)
        && let Some(identity) = state.auth_service().verify_api_key(&key).await?
    {
        return Ok(Some(identity));
    }

    Ok(None)
}

/// Extract API key from headers
fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    // Check X-Api-Key header
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.to_string());
    }

    // Check Authorization: Bearer header
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account with plan-default credits, then start a session.
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    let result = state
        .auth_service()
        .register(&payload.email, &payload.password)
        .await?;

    session
        .insert(SESSION_ACCOUNT_KEY, &result.email)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!("New account registered: {}", result.email);

    Ok(Json(ApiResponse::success(result)))
}

/// POST /auth/login
/// Authenticate with email and password, returns API key on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    session
        .insert(SESSION_ACCOUNT_KEY, &result.email)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(result)))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /auth/me
/// Get current account information (requires authentication)
pub async fn get_current_account(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
) -> Result<Json<ApiResponse<AccountInfo>>, ApiError> {
    let info = state.auth_service().get_account_info(&identity.email).await?;
    Ok(Json(ApiResponse::success(info)))
}

/// PUT /auth/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth_service()
        .change_password(
            &identity.email,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    tracing::info!("Password changed for account: {}", identity.email);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}

/// GET /auth/api-key
/// Get the current API key
pub async fn get_api_key(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state.auth_service().get_api_key(&identity.email).await?;
    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}

/// POST /auth/api-key/regenerate
/// Generate a new random API key
pub async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state
        .auth_service()
        .regenerate_api_key(&identity.email)
        .await?;

    tracing::info!("API key regenerated for account: {}", identity.email);

    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}
