use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{ApiError, AppState};
use crate::constants::ads;

/// GET /ads.txt
/// One seller line per distinct publisher id across all monetized sites.
/// The body is rebuilt from the database at most once per TTL; site
/// monetization changes invalidate the cache immediately.
pub async fn ads_txt(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let ttl = Duration::from_secs(ads::CACHE_TTL_SECONDS);

    if let Some((built_at, body)) = state.ads_cache().read().await.as_ref()
        && built_at.elapsed() < ttl
    {
        return Ok(ads_response(body.clone()));
    }

    let mut publisher_ids = state
        .store()
        .monetized_publisher_ids()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load publisher ids: {e}")))?;

    publisher_ids.sort();
    publisher_ids.dedup();

    let body = publisher_ids
        .iter()
        .map(|id| format!("{}, {}, {}\n", ads::SELLER_DOMAIN, id, ads::SELLER_LINE_SUFFIX))
        .collect::<String>();

    *state.ads_cache().write().await = Some((Instant::now(), body.clone()));

    Ok(ads_response(body))
}

fn ads_response(body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={}", ads::CACHE_TTL_SECONDS),
            ),
        ],
        body,
    )
        .into_response()
}
