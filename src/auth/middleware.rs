//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation and role gating

use crate::auth::{
    gate::{self, Denial},
    jwt::JwtHandler,
    models::{Claims, RoleSet},
};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

/// Auth middleware that validates Bearer tokens and injects the claims into
/// request extensions for downstream handlers and role gates.
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.to_string())
        .ok_or(AuthError::MissingToken)?;

    // Validate token and extract claims
    let claims = jwt_handler
        .validate_token(&token)
        .map_err(|_| AuthError::InvalidToken)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Route-layer role gate. Runs inside `auth_middleware`, so the claims are
/// already in the request extensions; re-evaluated on every request.
pub async fn require_roles(
    State(required): State<RoleSet>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    match gate::authorize(req.extensions().get::<Claims>(), required, Utc::now()) {
        Ok(()) => Ok(next.run(req).await),
        Err(Denial::MissingOrInvalidCredential) => Err(AuthError::MissingToken),
        Err(Denial::ForbiddenRole) => Err(AuthError::ForbiddenRole),
    }
}

/// Auth error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ForbiddenRole,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message, reason) = match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Authentication required",
                Denial::MissingOrInvalidCredential.reason(),
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token",
                Denial::MissingOrInvalidCredential.reason(),
            ),
            AuthError::ForbiddenRole => (
                StatusCode::FORBIDDEN,
                "Insufficient permissions",
                Denial::ForbiddenRole.reason(),
            ),
        };

        let body = Json(json!({
            "error": message,
            "reason": reason,
        }));

        (status, body).into_response()
    }
}
