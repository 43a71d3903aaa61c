//! Business API Endpoints
//! Mission: Admin listings and tenant self-service over business profiles

use crate::api::routes::{AppState, PageQuery};
use crate::auth::api::valid_email;
use crate::auth::models::Claims;
use crate::business::models::{
    BusinessProfileResponse, BusinessSummary, UpdateBusinessRequest,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct BusinessesResponse {
    pub count: usize,
    pub businesses: Vec<BusinessSummary>,
}

/// List business profiles - GET /api/businesses (elevated only)
///
/// Payment status is derived per row at read time.
pub async fn list_businesses(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<BusinessesResponse>, BusinessApiError> {
    let now = Utc::now();
    let profiles = state.business_store.list(page.limit(), page.offset())?;

    let businesses: Vec<BusinessSummary> = profiles
        .iter()
        .map(|p| BusinessSummary::from_profile(p, now))
        .collect();

    Ok(Json(BusinessesResponse {
        count: businesses.len(),
        businesses,
    }))
}

/// Get own business profile - GET /api/businesses/me (business role)
///
/// The only view that includes the API key.
pub async fn my_business(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<BusinessProfileResponse>, BusinessApiError> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| BusinessApiError::Unauthorized)?;

    let profile = state
        .business_store
        .get_by_user(&user_id)?
        .ok_or_else(|| {
            BusinessApiError::NotFound("No business account found for the logged-in user".into())
        })?;

    Ok(Json(BusinessProfileResponse::from_profile(
        &profile,
        Utc::now(),
    )))
}

/// Update a business profile - PUT /api/businesses/:id (elevated only)
pub async fn update_business(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateBusinessRequest>,
) -> Result<Json<BusinessSummary>, BusinessApiError> {
    let uuid = Uuid::parse_str(&user_id)
        .map_err(|_| BusinessApiError::BadRequest("Invalid user ID format".into()))?;

    if let Some(email) = &payload.contact_email {
        if !valid_email(email) {
            return Err(BusinessApiError::BadRequest("Malformed contact email".into()));
        }
    }
    if let Some(ts) = &payload.last_payment_at {
        if DateTime::parse_from_rfc3339(ts).is_err() {
            return Err(BusinessApiError::BadRequest(
                "last_payment_at must be an RFC 3339 timestamp".into(),
            ));
        }
    }

    let profile = state
        .business_store
        .update_profile(
            &uuid,
            payload.business_name.as_deref(),
            payload.contact_email.as_deref(),
            payload.phone.as_deref(),
            payload.last_payment_at.as_deref(),
        )?
        .ok_or_else(|| BusinessApiError::NotFound(format!("Business {} not found", user_id)))?;

    Ok(Json(BusinessSummary::from_profile(&profile, Utc::now())))
}

// ===== Error Handling =====

#[derive(Debug)]
pub enum BusinessApiError {
    Database(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Unauthorized,
}

impl From<anyhow::Error> for BusinessApiError {
    fn from(err: anyhow::Error) -> Self {
        BusinessApiError::Database(err)
    }
}

impl IntoResponse for BusinessApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            BusinessApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Backend unavailable".to_string(),
                )
            }
            BusinessApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            BusinessApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            BusinessApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err = anyhow::anyhow!("Test error");
        let api_err: BusinessApiError = err.into();

        match api_err {
            BusinessApiError::Database(_) => (),
            _ => panic!("Expected Database error"),
        }
    }

    #[test]
    fn test_error_status_codes() {
        let not_found = BusinessApiError::NotFound("missing".into()).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad_request = BusinessApiError::BadRequest("nope".into()).into_response();
        assert_eq!(bad_request.status(), StatusCode::BAD_REQUEST);

        let database = BusinessApiError::Database(anyhow::anyhow!("boom")).into_response();
        assert_eq!(database.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
