//! BizPortal - Multi-tenant admin/business portal backend
//! Mission: Email/password login, role-based authorization, and user /
//! business profile management over a JSON API

use anyhow::{Context, Result};
use bizportal_backend::{
    api::{create_router, AppState},
    auth::{JwtHandler, RoleResolver, UserStore},
    business::BusinessStore,
    config::Config,
    middleware::RateLimitLayer,
};
use dotenv::dotenv;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    let config = Config::from_env()?;

    info!("Starting BizPortal backend");

    let user_store = Arc::new(UserStore::new(&config.database_path)?);
    let business_store = Arc::new(BusinessStore::new(&config.database_path)?);
    let jwt_handler = Arc::new(JwtHandler::new(
        config.jwt_secret.clone(),
        config.token_ttl_minutes,
    ));
    let resolver = Arc::new(RoleResolver::new(user_store.clone()));

    info!("Identity store initialized at: {}", config.database_path);

    let state = AppState {
        user_store,
        business_store,
        jwt_handler,
        resolver,
    };
    let limiter = RateLimitLayer::new(config.login_rate_limit.clone());

    let app = create_router(state, limiter);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

/// Initialize tracing with env-filter overrides
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bizportal_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
