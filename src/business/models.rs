//! Business Profile Models
//! Mission: Tenant profile records and derived payment state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days since the last payment before a profile stops being `current`.
pub const PAYMENT_DUE_DAYS: i64 = 30;
/// Days since the last payment before a profile is `overdue`.
pub const PAYMENT_OVERDUE_DAYS: i64 = 60;

/// Business profile, 1:1 with a user of role "business".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub user_id: Uuid,
    pub business_name: String,
    pub contact_email: String,
    pub phone: Option<String>,
    pub api_key: String,
    pub last_payment_at: Option<String>,
    pub created_at: String,
}

impl BusinessProfile {
    /// Derive the payment status at `now`. Never stored.
    pub fn payment_status(&self, now: DateTime<Utc>) -> PaymentStatus {
        let last_payment = self
            .last_payment_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        derive_payment_status(last_payment, now)
    }
}

/// Derived payment status; computed from the last-payment date at read time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "due")]
    Due,
    #[serde(rename = "overdue")]
    Overdue,
    #[serde(rename = "unpaid")]
    Unpaid,
}

pub fn derive_payment_status(
    last_payment: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> PaymentStatus {
    let Some(last_payment) = last_payment else {
        return PaymentStatus::Unpaid;
    };

    let days = (now - last_payment).num_days();
    if days <= PAYMENT_DUE_DAYS {
        PaymentStatus::Current
    } else if days <= PAYMENT_OVERDUE_DAYS {
        PaymentStatus::Due
    } else {
        PaymentStatus::Overdue
    }
}

/// Generate a new business API key string
pub fn generate_api_key() -> String {
    format!("bp_live_{}", Uuid::new_v4().simple())
}

/// Listing entry for admin views; the API key is only shown to its owner.
#[derive(Debug, Serialize)]
pub struct BusinessSummary {
    pub user_id: String,
    pub business_name: String,
    pub contact_email: String,
    pub phone: Option<String>,
    pub last_payment_at: Option<String>,
    pub payment_status: PaymentStatus,
    pub created_at: String,
}

impl BusinessSummary {
    pub fn from_profile(profile: &BusinessProfile, now: DateTime<Utc>) -> Self {
        Self {
            user_id: profile.user_id.to_string(),
            business_name: profile.business_name.clone(),
            contact_email: profile.contact_email.clone(),
            phone: profile.phone.clone(),
            last_payment_at: profile.last_payment_at.clone(),
            payment_status: profile.payment_status(now),
            created_at: profile.created_at.clone(),
        }
    }
}

/// Self-service view: the summary plus the owner's API key.
#[derive(Debug, Serialize)]
pub struct BusinessProfileResponse {
    #[serde(flatten)]
    pub summary: BusinessSummary,
    pub api_key: String,
}

impl BusinessProfileResponse {
    pub fn from_profile(profile: &BusinessProfile, now: DateTime<Utc>) -> Self {
        Self {
            summary: BusinessSummary::from_profile(profile, now),
            api_key: profile.api_key.clone(),
        }
    }
}

/// Update business request
#[derive(Debug, Deserialize)]
pub struct UpdateBusinessRequest {
    pub business_name: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    /// RFC 3339 timestamp of the most recent payment.
    pub last_payment_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_payment_status_boundaries() {
        let now = Utc::now();
        let days_ago = |d: i64| Some(now - Duration::days(d));

        assert_eq!(derive_payment_status(None, now), PaymentStatus::Unpaid);
        assert_eq!(derive_payment_status(days_ago(0), now), PaymentStatus::Current);
        assert_eq!(derive_payment_status(days_ago(29), now), PaymentStatus::Current);
        assert_eq!(derive_payment_status(days_ago(30), now), PaymentStatus::Current);
        assert_eq!(derive_payment_status(days_ago(31), now), PaymentStatus::Due);
        assert_eq!(derive_payment_status(days_ago(60), now), PaymentStatus::Due);
        assert_eq!(derive_payment_status(days_ago(61), now), PaymentStatus::Overdue);
        assert_eq!(derive_payment_status(days_ago(365), now), PaymentStatus::Overdue);
    }

    #[test]
    fn test_future_payment_counts_as_current() {
        let now = Utc::now();
        let status = derive_payment_status(Some(now + Duration::days(1)), now);
        assert_eq!(status, PaymentStatus::Current);
    }

    #[test]
    fn test_unparseable_date_is_unpaid() {
        let profile = BusinessProfile {
            user_id: Uuid::new_v4(),
            business_name: "Acme".to_string(),
            contact_email: "acme@example.com".to_string(),
            phone: None,
            api_key: generate_api_key(),
            last_payment_at: Some("yesterday-ish".to_string()),
            created_at: Utc::now().to_rfc3339(),
        };
        assert_eq!(profile.payment_status(Utc::now()), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_api_key_generation() {
        let key1 = generate_api_key();
        let key2 = generate_api_key();

        assert!(key1.starts_with("bp_live_"));
        assert!(key2.starts_with("bp_live_"));
        assert_ne!(key1, key2); // Keys should be unique
    }

    #[test]
    fn test_payment_status_serialization() {
        let json = serde_json::to_string(&PaymentStatus::Overdue).unwrap();
        assert_eq!(json, r#""overdue""#);

        let status: PaymentStatus = serde_json::from_str(r#""unpaid""#).unwrap();
        assert_eq!(status, PaymentStatus::Unpaid);
    }
}
