//! JWT Token Handler
//! Mission: Generate and validate session tokens securely

use crate::auth::models::{Claims, Role, User};
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Default token lifetime. Sessions are deliberately short-lived; a
/// non-expiring credential is treated as a defect.
pub const DEFAULT_TTL_MINUTES: i64 = 120;

/// JWT Handler for token operations
pub struct JwtHandler {
    secret: String,
    ttl_minutes: i64,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key and token lifetime in
    /// minutes.
    pub fn new(secret: String, ttl_minutes: i64) -> Self {
        Self {
            secret,
            ttl_minutes,
        }
    }

    /// Generate a JWT for a user with their resolved effective role.
    ///
    /// The claims re-derive {user id, email, role} without a further lookup.
    pub fn generate_token(&self, user: &User, role: Role) -> Result<(String, usize)> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(chrono::Duration::minutes(self.ttl_minutes))
            .context("Invalid timestamp")?
            .timestamp() as usize;

        let expires_in = (self.ttl_minutes * 60) as usize;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role,
            exp: expiration,
        };

        debug!(
            "Generating JWT for user {} ({}), expires in {}m",
            user.email, user.id, self.ttl_minutes
        );

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to generate JWT")?;

        Ok((token, expires_in))
    }

    /// Validate a JWT and extract its claims. Expired tokens are rejected.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .context("Invalid or expired token")?;

        debug!("Validated JWT for user {}", decoded.claims.email);

        Ok(decoded.claims)
    }
}
