//! Authentication API Endpoints
//! Mission: Provide login, session, and user management endpoints

use crate::api::routes::{AppState, PageQuery};
use crate::auth::{
    gate,
    models::{
        effective_role, Claims, CreateUserRequest, CreatedUserResponse, LoginRequest,
        LoginResponse, ResetPasswordRequest, ResetPasswordResponse, Role, RoleSet,
        UpdateUserRequest, UserResponse,
    },
    password,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Minimal shape check; anything beyond this is the mail system's problem.
pub(crate) fn valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.len() < 3 || email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Login endpoint - POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    if !valid_email(&payload.email) || payload.password.is_empty() {
        return Err(AuthApiError::Validation("Malformed email or password"));
    }

    info!("Login attempt: {}", payload.email);

    let user = state
        .user_store
        .get_user_by_email(&payload.email)
        .map_err(|e| {
            error!("User lookup failed: {}", e);
            AuthApiError::BackendUnavailable
        })?;

    // Unknown email and wrong password are indistinguishable to the caller;
    // the distinction only ever reaches the log.
    let Some(user) = user else {
        warn!("Failed login attempt (unknown email): {}", payload.email);
        return Err(AuthApiError::InvalidCredentials);
    };

    if !password::verify_password(&payload.password, &user.password_hash) {
        warn!("Failed login attempt: {}", payload.email);
        return Err(AuthApiError::InvalidCredentials);
    }

    let role = state.resolver.resolve(&user).map_err(|e| {
        error!("Role resolution failed for {}: {}", user.id, e);
        AuthApiError::BackendUnavailable
    })?;

    let (token, expires_in) = state.jwt_handler.generate_token(&user, role).map_err(|e| {
        error!("Token generation failed: {}", e);
        AuthApiError::InternalError
    })?;

    info!("Login successful: {} ({})", user.email, role.as_str());

    Ok(Json(LoginResponse {
        token,
        expires_in,
        role,
        user: UserResponse::from_user(&user, role),
    }))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// Get current session info - GET /api/me
///
/// Echoed straight from the JWT claims; no store lookup.
pub async fn get_current_user(Extension(claims): Extension<Claims>) -> Json<MeResponse> {
    Json(MeResponse {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    })
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub count: usize,
    pub users: Vec<UserResponse>,
}

/// List users - GET /api/users (elevated only)
pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<UsersResponse>, AuthApiError> {
    let users = state
        .user_store
        .list_users(page.limit(), page.offset())
        .map_err(|e| {
            error!("User listing failed: {}", e);
            AuthApiError::BackendUnavailable
        })?;

    let users: Vec<UserResponse> = users
        .iter()
        .map(|(user, assignment)| {
            UserResponse::from_user(user, effective_role(user.base_role, *assignment))
        })
        .collect();

    Ok(Json(UsersResponse {
        count: users.len(),
        users,
    }))
}

/// Create user - POST /api/users (elevated only)
///
/// Creates the user plus its role-specific auxiliary record: a role
/// assignment for elevated roles, a business profile for business users.
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreatedUserResponse>), AuthApiError> {
    if payload.name.trim().is_empty() {
        return Err(AuthApiError::Validation("Name is required"));
    }
    if !valid_email(&payload.email) {
        return Err(AuthApiError::Validation("Malformed email address"));
    }
    if let Some(password) = &payload.password {
        if password.len() < 8 {
            return Err(AuthApiError::WeakPassword);
        }
    }

    let existing = state
        .user_store
        .get_user_by_email(&payload.email)
        .map_err(|e| {
            error!("User lookup failed: {}", e);
            AuthApiError::BackendUnavailable
        })?;
    if existing.is_some() {
        return Err(AuthApiError::EmailAlreadyRegistered);
    }

    let generated = payload.password.is_none();
    let plaintext = payload.password.unwrap_or_else(password::generate_password);

    let user = state
        .user_store
        .create_user(&payload.name, &payload.email, &plaintext, payload.role)
        .map_err(|e| {
            error!("Failed to create user: {}", e);
            AuthApiError::BackendUnavailable
        })?;

    if payload.role == Role::Business {
        state
            .business_store
            .create_profile(&user.id, &payload.name, &payload.email, None)
            .map_err(|e| {
                error!("Failed to create business profile: {}", e);
                AuthApiError::BackendUnavailable
            })?;
    }

    info!("User created: {} ({})", user.email, user.base_role.as_str());

    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            user: UserResponse::from_user(&user, payload.role),
            initial_password: generated.then_some(plaintext),
        }),
    ))
}

/// Update user - PUT /api/users/:id (elevated only)
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AuthApiError> {
    let uuid = Uuid::parse_str(&user_id).map_err(|_| AuthApiError::InvalidUserId)?;

    if let Some(email) = &payload.email {
        if !valid_email(email) {
            return Err(AuthApiError::Validation("Malformed email address"));
        }
        // Email must stay unique across other accounts.
        let holder = state.user_store.get_user_by_email(email).map_err(|e| {
            error!("User lookup failed: {}", e);
            AuthApiError::BackendUnavailable
        })?;
        if holder.as_ref().is_some_and(|u| u.id != uuid) {
            return Err(AuthApiError::EmailAlreadyRegistered);
        }
    }

    let updated = state
        .user_store
        .update_user(
            &uuid,
            payload.name.as_deref(),
            payload.email.as_deref(),
            payload.role,
        )
        .map_err(|e| {
            error!("Failed to update user: {}", e);
            AuthApiError::BackendUnavailable
        })?
        .ok_or(AuthApiError::UserNotFound)?;

    let role = state.resolver.resolve(&updated).map_err(|e| {
        error!("Role resolution failed for {}: {}", updated.id, e);
        AuthApiError::BackendUnavailable
    })?;

    Ok(Json(UserResponse::from_user(&updated, role)))
}

/// Delete user - DELETE /api/users/:id (superadmin only)
///
/// Cascades the role assignment and business profile.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AuthApiError> {
    gate::authorize(Some(&claims), RoleSet::SUPERADMIN, Utc::now())
        .map_err(|_| AuthApiError::Forbidden)?;

    let uuid = Uuid::parse_str(&user_id).map_err(|_| AuthApiError::InvalidUserId)?;

    if uuid.to_string() == claims.sub {
        return Err(AuthApiError::CannotDeleteSelf);
    }

    let deleted = state.user_store.delete_user(&uuid).map_err(|e| {
        error!("Failed to delete user: {}", e);
        AuthApiError::BackendUnavailable
    })?;
    if !deleted {
        return Err(AuthApiError::UserNotFound);
    }

    state.business_store.delete_profile(&uuid).map_err(|e| {
        error!("Failed to delete business profile: {}", e);
        AuthApiError::BackendUnavailable
    })?;

    info!("User deleted: {}", user_id);

    Ok(StatusCode::NO_CONTENT)
}

/// Reset password - POST /api/reset-password (elevated only)
///
/// Issues a fresh random password, stores its hash, and returns it exactly
/// once. The new password never reaches the log.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, AuthApiError> {
    if !valid_email(&payload.email) {
        return Err(AuthApiError::Validation("Malformed email address"));
    }

    let user = state
        .user_store
        .get_user_by_email(&payload.email)
        .map_err(|e| {
            error!("User lookup failed: {}", e);
            AuthApiError::BackendUnavailable
        })?
        .ok_or(AuthApiError::UserNotFound)?;

    let new_password = password::generate_password();
    let password_hash = password::hash_password(&new_password).map_err(|e| {
        error!("Password hashing failed: {}", e);
        AuthApiError::InternalError
    })?;

    let updated = state
        .user_store
        .set_password(&user.id, &password_hash)
        .map_err(|e| {
            error!("Failed to store new password: {}", e);
            AuthApiError::BackendUnavailable
        })?;
    if !updated {
        return Err(AuthApiError::UserNotFound);
    }

    info!("Password reset for {}", user.email);

    Ok(Json(ResetPasswordResponse {
        email: user.email,
        new_password,
    }))
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    InvalidCredentials,
    Forbidden,
    Validation(&'static str),
    WeakPassword,
    EmailAlreadyRegistered,
    UserNotFound,
    InvalidUserId,
    CannotDeleteSelf,
    BackendUnavailable,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials")
            }
            AuthApiError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
            AuthApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthApiError::WeakPassword => (
                StatusCode::BAD_REQUEST,
                "Password must be at least 8 characters",
            ),
            AuthApiError::EmailAlreadyRegistered => {
                (StatusCode::CONFLICT, "Email already registered")
            }
            AuthApiError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AuthApiError::InvalidUserId => (StatusCode::BAD_REQUEST, "Invalid user ID format"),
            AuthApiError::CannotDeleteSelf => {
                (StatusCode::BAD_REQUEST, "Cannot delete your own account")
            }
            AuthApiError::BackendUnavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Backend unavailable")
            }
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
