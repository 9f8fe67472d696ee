use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::Config;
use crate::db::Storage;
use crate::services::{AuthService, RatingService, StoreService, UserService};
use crate::state::SharedState;

mod admin;
pub mod auth;
mod error;
mod health;
mod observability;
mod owner;
mod ratings;
mod stores;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.shared.storage
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn store_service(&self) -> &Arc<dyn StoreService> {
        &self.shared.store_service
    }

    #[must_use]
    pub fn rating_service(&self) -> &Arc<dyn RatingService> {
        &self.shared.rating_service
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.shared.user_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = SharedState::new(config).await?;
    shared.prepare().await?;
    Ok(create_app_state(Arc::new(shared), prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let server = &state.config().server;

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_idle_minutes,
        )));

    let cors_layer = if server.cors_allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    let api_router = Router::new()
        .merge(public_routes())
        .merge(owner_routes())
        .merge(admin_routes())
        .route_layer(middleware::from_fn(observability::track_metrics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::identify,
        ))
        .layer(session_layer);

    Router::new()
        .nest("/api", api_router)
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        // The request span must be the innermost span so `identify` can
        // record the caller on it.
        .layer(middleware::from_fn(observability::request_span_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Routes open to anonymous callers, plus the per-route gated writes that
/// share their paths.
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route(
            "/logout",
            post(auth::logout).route_layer(middleware::from_fn(auth::require_auth)),
        )
        .route(
            "/me",
            get(auth::me).route_layer(middleware::from_fn(auth::require_auth)),
        )
        .route(
            "/update-password",
            put(auth::update_password).route_layer(middleware::from_fn(auth::require_auth)),
        )
        .route(
            "/stores",
            get(stores::list_stores).merge(
                post(stores::create_store)
                    .route_layer(middleware::from_fn(auth::require_admin)),
            ),
        )
        .route("/stores/search", get(stores::list_stores))
        .route(
            "/stores/{id}",
            get(stores::get_store).merge(
                put(stores::update_store)
                    .delete(stores::delete_store)
                    .route_layer(middleware::from_fn(auth::require_admin)),
            ),
        )
        .route(
            "/ratings/{store_id}",
            get(ratings::list_for_store).merge(
                post(ratings::submit_rating)
                    .route_layer(middleware::from_fn(auth::require_normal_user)),
            ),
        )
        .route("/ratings/{store_id}/average", get(ratings::average_for_store))
}

fn owner_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/owner/stores", get(owner::my_stores))
        .route("/owner/ratings", get(owner::my_ratings))
        .route_layer(middleware::from_fn(auth::require_store_owner))
}

fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/dashboard-stats", get(admin::dashboard_stats))
        .route("/admin/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/admin/users/{id}",
            get(admin::get_user).delete(admin::delete_user),
        )
        .route("/admin/stores", get(admin::list_stores))
        .route("/admin/ratings/{id}", delete(ratings::delete_rating))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::require_admin))
}
