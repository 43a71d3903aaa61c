//! Authentication Models
//! Mission: Define secure user and authentication data structures

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub name: String,
    pub base_role: Role,
    pub created_at: String,
}

/// Portal roles for RBAC
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "superadmin")]
    Superadmin, // Full access, including destructive operations
    #[serde(rename = "admin")]
    Admin, // User and business management
    #[serde(rename = "business")]
    Business, // Self-service access to own profile
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::Business => "business",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "superadmin" => Some(Role::Superadmin),
            "admin" => Some(Role::Admin),
            "business" => Some(Role::Business),
            _ => None,
        }
    }

    /// Roles that require a confirming row in `role_assignments`.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Superadmin | Role::Admin)
    }
}

/// A required-role set for authorization checks.
///
/// Membership is always a set test, whether one role or several is required.
#[derive(Debug, Clone, Copy)]
pub struct RoleSet(&'static [Role]);

impl RoleSet {
    pub const ELEVATED: RoleSet = RoleSet(&[Role::Superadmin, Role::Admin]);
    pub const SUPERADMIN: RoleSet = RoleSet(&[Role::Superadmin]);
    pub const BUSINESS: RoleSet = RoleSet(&[Role::Business]);
    pub const ANY: RoleSet = RoleSet(&[Role::Superadmin, Role::Admin, Role::Business]);

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

/// Effective role: the role assignment is authoritative when present; an
/// unconfirmed elevated base role degrades to the default.
pub fn effective_role(base: Role, assignment: Option<Role>) -> Role {
    match assignment {
        Some(assigned) => assigned,
        None if base.is_elevated() => Role::Business,
        None => base,
    }
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (user id)
    pub email: String,
    pub role: Role,
    pub exp: usize, // expiration timestamp
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: usize, // seconds until expiration
    pub role: Role,
    pub user: UserResponse,
}

/// User response (sanitized)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: String,
}

impl UserResponse {
    pub fn from_user(user: &User, role: Role) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            role,
            created_at: user.created_at.clone(),
        }
    }
}

/// Create user request (elevated callers only)
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub role: Role,
    /// When absent a random password is generated and returned once.
    pub password: Option<String>,
}

/// Create user response; `initial_password` is only present when the server
/// generated one, and is never persisted in cleartext.
#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_password: Option<String>,
}

/// Update user request
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Password reset request
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

/// Password reset response; the new password is shown exactly once.
#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub email: String,
    pub new_password: String,
}
