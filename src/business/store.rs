//! Business Profile Storage
//! Mission: Persist tenant profiles alongside the identity store

use crate::business::models::{generate_api_key, BusinessProfile};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS business_profiles (
    user_id TEXT PRIMARY KEY,
    business_name TEXT NOT NULL,
    contact_email TEXT NOT NULL,
    phone TEXT,
    api_key TEXT UNIQUE NOT NULL,
    last_payment_at TEXT,
    created_at TEXT NOT NULL
);
"#;

/// Business profile storage, sharing the SQLite file with the user store.
pub struct BusinessStore {
    db_path: String,
}

impl BusinessStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize business schema")?;
        Ok(())
    }

    fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<BusinessProfile> {
        let id_str: String = row.get(0)?;
        Ok(BusinessProfile {
            user_id: Uuid::parse_str(&id_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            business_name: row.get(1)?,
            contact_email: row.get(2)?,
            phone: row.get(3)?,
            api_key: row.get(4)?,
            last_payment_at: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    /// Create a profile for a business user. Generates the API key.
    pub fn create_profile(
        &self,
        user_id: &Uuid,
        business_name: &str,
        contact_email: &str,
        phone: Option<&str>,
    ) -> Result<BusinessProfile> {
        let profile = BusinessProfile {
            user_id: *user_id,
            business_name: business_name.to_string(),
            contact_email: contact_email.to_string(),
            phone: phone.map(|p| p.to_string()),
            api_key: generate_api_key(),
            last_payment_at: None,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.open()?;
        conn.execute(
            "INSERT INTO business_profiles
                 (user_id, business_name, contact_email, phone, api_key, last_payment_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                profile.user_id.to_string(),
                profile.business_name,
                profile.contact_email,
                profile.phone,
                profile.api_key,
                profile.last_payment_at,
                profile.created_at,
            ],
        )
        .context("Failed to insert business profile")?;

        info!("Created business profile: {}", profile.business_name);

        Ok(profile)
    }

    /// Get the profile owned by a user, if any.
    pub fn get_by_user(&self, user_id: &Uuid) -> Result<Option<BusinessProfile>> {
        let conn = self.open()?;

        let profile = conn
            .query_row(
                "SELECT user_id, business_name, contact_email, phone, api_key,
                        last_payment_at, created_at
                 FROM business_profiles WHERE user_id = ?1",
                params![user_id.to_string()],
                Self::row_to_profile,
            )
            .optional()?;

        Ok(profile)
    }

    /// List profiles, newest first.
    pub fn list(&self, limit: usize, offset: usize) -> Result<Vec<BusinessProfile>> {
        let conn = self.open()?;

        let mut stmt = conn.prepare(
            "SELECT user_id, business_name, contact_email, phone, api_key,
                    last_payment_at, created_at
             FROM business_profiles
             ORDER BY created_at DESC
             LIMIT ?1 OFFSET ?2",
        )?;

        let profiles = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_profile)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(profiles)
    }

    /// Update contact fields and the last-payment date. Returns None when no
    /// profile exists for the user.
    pub fn update_profile(
        &self,
        user_id: &Uuid,
        business_name: Option<&str>,
        contact_email: Option<&str>,
        phone: Option<&str>,
        last_payment_at: Option<&str>,
    ) -> Result<Option<BusinessProfile>> {
        let Some(current) = self.get_by_user(user_id)? else {
            return Ok(None);
        };

        let business_name = business_name.unwrap_or(&current.business_name);
        let contact_email = contact_email.unwrap_or(&current.contact_email);
        let phone = phone.map(|p| p.to_string()).or(current.phone);
        let last_payment_at = last_payment_at
            .map(|d| d.to_string())
            .or(current.last_payment_at);

        let conn = self.open()?;
        conn.execute(
            "UPDATE business_profiles
             SET business_name = ?1, contact_email = ?2, phone = ?3, last_payment_at = ?4
             WHERE user_id = ?5",
            params![
                business_name,
                contact_email,
                phone,
                last_payment_at,
                user_id.to_string()
            ],
        )
        .context("Failed to update business profile")?;

        self.get_by_user(user_id)
    }

    /// Delete the profile owned by a user. Returns false when none existed.
    pub fn delete_profile(&self, user_id: &Uuid) -> Result<bool> {
        let conn = self.open()?;

        let rows = conn.execute(
            "DELETE FROM business_profiles WHERE user_id = ?1",
            params![user_id.to_string()],
        )?;

        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (BusinessStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = BusinessStore::new(temp_file.path().to_str().unwrap()).unwrap();
        (store, temp_file)
    }

    #[test]
    fn test_create_and_retrieve_profile() {
        let (store, _temp) = create_test_store();
        let user_id = Uuid::new_v4();

        let created = store
            .create_profile(&user_id, "Acme Corp", "acme@example.com", Some("555-0100"))
            .unwrap();
        assert!(created.api_key.starts_with("bp_live_"));
        assert!(created.last_payment_at.is_none());

        let fetched = store.get_by_user(&user_id).unwrap().unwrap();
        assert_eq!(fetched.business_name, "Acme Corp");
        assert_eq!(fetched.phone.as_deref(), Some("555-0100"));
        assert_eq!(fetched.api_key, created.api_key);
    }

    #[test]
    fn test_missing_profile_is_none() {
        let (store, _temp) = create_test_store();
        assert!(store.get_by_user(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_list_pagination() {
        let (store, _temp) = create_test_store();

        for i in 0..3 {
            store
                .create_profile(
                    &Uuid::new_v4(),
                    &format!("Biz {}", i),
                    &format!("biz{}@example.com", i),
                    None,
                )
                .unwrap();
        }

        assert_eq!(store.list(50, 0).unwrap().len(), 3);
        assert_eq!(store.list(2, 0).unwrap().len(), 2);
        assert_eq!(store.list(2, 2).unwrap().len(), 1);
    }

    #[test]
    fn test_update_records_payment() {
        let (store, _temp) = create_test_store();
        let user_id = Uuid::new_v4();

        store
            .create_profile(&user_id, "Acme", "acme@example.com", None)
            .unwrap();

        let paid_at = Utc::now().to_rfc3339();
        let updated = store
            .update_profile(&user_id, None, None, Some("555-0199"), Some(&paid_at))
            .unwrap()
            .unwrap();

        assert_eq!(updated.business_name, "Acme");
        assert_eq!(updated.phone.as_deref(), Some("555-0199"));
        assert_eq!(updated.last_payment_at.as_deref(), Some(paid_at.as_str()));
    }

    #[test]
    fn test_update_missing_profile_returns_none() {
        let (store, _temp) = create_test_store();
        let result = store
            .update_profile(&Uuid::new_v4(), Some("Ghost"), None, None, None)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_delete_profile() {
        let (store, _temp) = create_test_store();
        let user_id = Uuid::new_v4();

        store
            .create_profile(&user_id, "Acme", "acme@example.com", None)
            .unwrap();

        assert!(store.delete_profile(&user_id).unwrap());
        assert!(store.get_by_user(&user_id).unwrap().is_none());
        assert!(!store.delete_profile(&user_id).unwrap());
    }
}
