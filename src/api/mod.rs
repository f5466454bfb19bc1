use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::clients::completion::{CompletionBackend, HttpCompletionClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::auth_service::AuthService;
use crate::services::auth_service_impl::SeaOrmAuthService;
use crate::services::copilot_service::CopilotService;
use crate::services::copilot_service_impl::LedgerCopilotService;

mod accounts;
mod ads;
pub mod auth;
mod copilot;
mod error;
mod observability;
mod posts;
mod sites;
mod system;
mod types;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

/// Cached ads.txt body and the moment it was built.
type AdsCache = RwLock<Option<(Instant, String)>>;

#[derive(Clone)]
pub struct AppState {
    store: Store,
    config: Arc<RwLock<Config>>,
    auth_service: Arc<dyn AuthService>,
    copilot_service: Arc<dyn CopilotService>,
    ads_cache: Arc<AdsCache>,
    start_time: Instant,
    prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    #[must_use]
    pub fn auth_service(&self) -> &dyn AuthService {
        self.auth_service.as_ref()
    }

    #[must_use]
    pub fn copilot_service(&self) -> &dyn CopilotService {
        self.copilot_service.as_ref()
    }

    #[must_use]
    pub fn ads_cache(&self) -> &AdsCache {
        &self.ads_cache
    }

    #[must_use]
    pub const fn start_time(&self) -> Instant {
        self.start_time
    }

    #[must_use]
    pub fn prometheus_handle(&self) -> Option<&PrometheusHandle> {
        self.prometheus_handle.as_ref()
    }

    /// Drop the cached ads.txt body so the next request rebuilds it.
    pub async fn invalidate_ads_cache(&self) {
        *self.ads_cache.write().await = None;
    }
}

/// Build application state with an explicit completion backend. Tests use
/// this to swap the upstream for a scripted fake.
pub async fn create_app_state_with_backend(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
    backend: Arc<dyn CompletionBackend>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
        store.clone(),
        config.security.clone(),
        config.quotas.clone(),
    ));

    let copilot_service: Arc<dyn CopilotService> = Arc::new(LedgerCopilotService::new(
        store.clone(),
        backend,
        config.copilot.model.clone(),
    ));

    Ok(Arc::new(AppState {
        store,
        config: Arc::new(RwLock::new(config)),
        auth_service,
        copilot_service,
        ads_cache: Arc::new(RwLock::new(None)),
        start_time: Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let backend: Arc<dyn CompletionBackend> = Arc::new(HttpCompletionClient::new(&config.copilot)?);
    create_app_state_with_backend(config, prometheus_handle, backend).await
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, session_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_minutes,
        )
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_minutes,
        )));

    // Session handling only applies under /api; public rendering and the
    // ads.txt endpoint are cookie-free.
    let api_router = Router::new()
        .merge(create_protected_router(state.clone()))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/copilot/chat", post(copilot::chat))
        .route("/system/health/live", get(system::health_live))
        .route("/system/health/ready", get(system::health_ready))
        .layer(session_layer);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .route("/s/{slug}", get(sites::render_site))
        .route("/feed", get(posts::feed))
        .route("/ads.txt", get(ads::ads_txt))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_routes = Router::new()
        .route("/admin/accounts", get(accounts::list_accounts))
        .route("/admin/accounts/{id}", get(accounts::get_account))
        .route("/admin/accounts/{id}", delete(accounts::delete_account))
        .route("/admin/accounts/{id}/credits", put(accounts::set_credits))
        .route("/admin/accounts/{id}/role", put(accounts::set_role))
        .route(
            "/admin/accounts/{id}/site-limit",
            put(accounts::set_site_limit),
        )
        .route("/admin/sites", get(accounts::list_all_sites))
        .route(
            "/admin/sites/{id}/status",
            put(accounts::moderate_site_status),
        )
        .route("/admin/sites/{id}", delete(accounts::moderate_delete_site))
        .route("/system/logs", get(system::get_logs))
        .route("/system/logs", delete(system::clear_logs))
        .route_layer(middleware::from_fn(auth::require_staff));

    Router::new()
        .route("/auth/me", get(auth::get_current_account))
        .route("/auth/password", put(auth::change_password))
        .route(
            "/auth/api-key",
            get(auth::get_api_key).post(auth::regenerate_api_key),
        )
        .route("/auth/api-key/regenerate", post(auth::regenerate_api_key))
        .route("/sites", get(sites::list_sites))
        .route("/sites", post(sites::create_site))
        .route("/sites/{slug}", get(sites::get_site))
        .route("/sites/{slug}", put(sites::update_site))
        .route("/sites/{slug}", delete(sites::delete_site))
        .route("/sites/{slug}/status", put(sites::set_site_status))
        .route(
            "/sites/{slug}/monetization",
            put(sites::set_site_monetization),
        )
        .route("/posts", get(posts::list_posts))
        .route("/posts", post(posts::create_post))
        .route("/posts/{slug}", get(posts::get_post))
        .route("/posts/{slug}", put(posts::update_post))
        .route("/posts/{slug}", delete(posts::delete_post))
        .route("/system/status", get(system::get_status))
        .route("/metrics", get(observability::get_metrics))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
