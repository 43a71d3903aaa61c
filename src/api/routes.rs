//! Router assembly and shared application state.

use crate::auth::{
    api as auth_api, auth_middleware, models::RoleSet, require_roles, JwtHandler, RoleResolver,
    UserStore,
};
use crate::business::{api as business_api, BusinessStore};
use crate::middleware::{rate_limit_middleware, request_logging, RateLimitLayer};
use axum::{
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state, passed explicitly through request handling.
#[derive(Clone)]
pub struct AppState {
    pub user_store: Arc<UserStore>,
    pub business_store: Arc<BusinessStore>,
    pub jwt_handler: Arc<JwtHandler>,
    pub resolver: Arc<RoleResolver>,
}

/// Pagination query parameters shared by the listing endpoints.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl PageQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(50).min(500)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

/// Create the API router.
///
/// Three tiers: public (health), rate-limited login, and protected routes
/// behind JWT validation plus per-route role gates.
pub fn create_router(state: AppState, limiter: RateLimitLayer) -> Router {
    let public_routes = Router::new().route("/health", get(health_check));

    let login_routes = Router::new()
        .route("/api/login", post(auth_api::login))
        .route_layer(middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ));

    let session_routes = Router::new().route("/api/me", get(auth_api::get_current_user));

    let elevated_routes = Router::new()
        .route(
            "/api/users",
            get(auth_api::list_users).post(auth_api::create_user),
        )
        .route(
            "/api/users/:id",
            put(auth_api::update_user).delete(auth_api::delete_user),
        )
        .route("/api/reset-password", post(auth_api::reset_password))
        .route("/api/businesses", get(business_api::list_businesses))
        .route("/api/businesses/:id", put(business_api::update_business))
        .route_layer(middleware::from_fn_with_state(
            RoleSet::ELEVATED,
            require_roles,
        ));

    let business_routes = Router::new()
        .route("/api/businesses/me", get(business_api::my_business))
        .route_layer(middleware::from_fn_with_state(
            RoleSet::BUSINESS,
            require_roles,
        ));

    // The auth layer runs before the role gates: it validates the token and
    // injects the claims the gates read.
    let protected_routes = Router::new()
        .merge(session_routes)
        .merge(elevated_routes)
        .merge(business_routes)
        .route_layer(middleware::from_fn_with_state(
            state.jwt_handler.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(login_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_defaults() {
        let page = PageQuery {
            limit: None,
            offset: None,
        };
        assert_eq!(page.limit(), 50);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_page_query_limit_is_capped() {
        let page = PageQuery {
            limit: Some(10_000),
            offset: Some(20),
        };
        assert_eq!(page.limit(), 500);
        assert_eq!(page.offset(), 20);
    }
}
