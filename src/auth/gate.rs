//! Session Gate
//! Mission: Authorize every protected request against a required role set

use crate::auth::models::{Claims, RoleSet};
use chrono::{DateTime, Utc};

/// Why a request was denied. The reason string is part of the API contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    MissingOrInvalidCredential,
    ForbiddenRole,
}

impl Denial {
    pub fn reason(&self) -> &'static str {
        match self {
            Denial::MissingOrInvalidCredential => "missing_or_invalid_credential",
            Denial::ForbiddenRole => "forbidden_role",
        }
    }
}

/// Authorize a caller against a required role set.
///
/// Expiry is re-checked against `now` on every call; a gate decision is never
/// cached past the credential's lifetime.
pub fn authorize(
    claims: Option<&Claims>,
    required: RoleSet,
    now: DateTime<Utc>,
) -> Result<(), Denial> {
    let claims = claims.ok_or(Denial::MissingOrInvalidCredential)?;

    if claims.exp as i64 <= now.timestamp() {
        return Err(Denial::MissingOrInvalidCredential);
    }

    if !required.contains(claims.role) {
        return Err(Denial::ForbiddenRole);
    }

    Ok(())
}
