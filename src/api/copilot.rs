use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState, auth::resolve_identity};
use crate::copilot::ChatRequest;
use crate::services::copilot_service::CopilotError;

/// Error body for the copilot endpoint. Clients branch on `action`, so the
/// shape is fixed: `OUT_OF_FUEL` drives the top-up flow, `NONE` means the
/// message is informational only.
#[derive(Serialize)]
struct CopilotErrorBody {
    message: String,
    action: &'static str,
}

fn copilot_error(err: CopilotError) -> Response {
    let (status, body) = match err {
        CopilotError::AuthRequired => (
            StatusCode::UNAUTHORIZED,
            CopilotErrorBody {
                message: CopilotError::AuthRequired.to_string(),
                action: "NONE",
            },
        ),
        CopilotError::OutOfFuel => (
            StatusCode::PAYMENT_REQUIRED,
            CopilotErrorBody {
                message: CopilotError::OutOfFuel.to_string(),
                action: "OUT_OF_FUEL",
            },
        ),
        CopilotError::Upstream(message) => {
            tracing::warn!("Copilot upstream failure: {message}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                CopilotErrorBody {
                    message,
                    action: "NONE",
                },
            )
        }
        CopilotError::Internal(message) => {
            tracing::error!("Copilot internal error: {message}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                CopilotErrorBody {
                    message: "Copilot request failed".to_string(),
                    action: "NONE",
                },
            )
        }
    };
    (status, Json(body)).into_response()
}

/// POST /copilot/chat
/// Credit-gated chat completion. Identity comes from the session or API key,
/// never from the request body. Unauthenticated callers get 401 before any
/// ledger access.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let account_id = resolve_identity(&state, &headers, &session)
        .await?
        .map(|identity| identity.account_id);

    match state.copilot_service().chat(account_id, payload).await {
        Ok(reply) => Ok(Json(reply).into_response()),
        Err(err) => Ok(copilot_error(err)),
    }
}
