//! User Storage
//! Mission: Securely store and manage portal accounts with SQLite

use crate::auth::models::{Role, User};
use crate::auth::password;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Identity schema: users plus the role-assignment table that confirms
/// elevated roles.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    name TEXT NOT NULL,
    base_role TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS role_assignments (
    user_id TEXT PRIMARY KEY,
    role TEXT NOT NULL,
    assigned_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id)
);
"#;

/// User storage with SQLite backend
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize the schema.
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    /// Open a connection with a bounded busy timeout so a contended store
    /// surfaces as a retryable error instead of hanging the request.
    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize identity schema")?;

        self.seed_default_superadmin(&conn)?;

        Ok(())
    }

    /// Seed a default superadmin for initial setup.
    fn seed_default_superadmin(&self, conn: &Connection) -> Result<()> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE base_role = 'superadmin'",
                [],
                |row| row.get(0),
            )
            .context("Failed to check for superadmin users")?;

        if count == 0 {
            let password_hash = password::hash_password("admin123")?;
            let id = Uuid::new_v4();
            let now = Utc::now().to_rfc3339();

            conn.execute(
                "INSERT INTO users (id, email, password_hash, name, base_role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id.to_string(),
                    "admin@bizportal.local",
                    password_hash,
                    "Portal Superadmin",
                    Role::Superadmin.as_str(),
                    now,
                ],
            )
            .context("Failed to insert superadmin user")?;

            conn.execute(
                "INSERT INTO role_assignments (user_id, role, assigned_at) VALUES (?1, ?2, ?3)",
                params![id.to_string(), Role::Superadmin.as_str(), now],
            )
            .context("Failed to insert superadmin role assignment")?;

            info!("Default superadmin created (email: admin@bizportal.local, password: admin123)");
            warn!("CHANGE DEFAULT PASSWORD IN PRODUCTION!");
        }

        Ok(())
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        let id_str: String = row.get(0)?;
        let role_str: String = row.get(4)?;
        Ok(User {
            id: Uuid::parse_str(&id_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            name: row.get(3)?,
            base_role: Role::from_str(&role_str).unwrap_or(Role::Business),
            created_at: row.get(5)?,
        })
    }

    /// Get user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.open()?;

        let user = conn
            .query_row(
                "SELECT id, email, password_hash, name, base_role, created_at
                 FROM users WHERE email = ?1",
                params![email],
                Self::row_to_user,
            )
            .optional()?;

        Ok(user)
    }

    /// Get user by ID
    pub fn get_user_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let conn = self.open()?;

        let user = conn
            .query_row(
                "SELECT id, email, password_hash, name, base_role, created_at
                 FROM users WHERE id = ?1",
                params![user_id.to_string()],
                Self::row_to_user,
            )
            .optional()?;

        Ok(user)
    }

    /// Look up the elevated role assignment for a user, if any.
    pub fn get_role_assignment(&self, user_id: &Uuid) -> Result<Option<Role>> {
        let conn = self.open()?;

        let role_str: Option<String> = conn
            .query_row(
                "SELECT role FROM role_assignments WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(role_str.and_then(|s| Role::from_str(&s)))
    }

    /// Remove a user's role assignment (demotion, or consistency repair).
    pub fn remove_role_assignment(&self, user_id: &Uuid) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "DELETE FROM role_assignments WHERE user_id = ?1",
            params![user_id.to_string()],
        )?;
        Ok(())
    }

    /// Create a new user. Elevated roles get a confirming role-assignment
    /// row in the same transaction.
    pub fn create_user(&self, name: &str, email: &str, plaintext: &str, role: Role) -> Result<User> {
        let password_hash = password::hash_password(plaintext)?;

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash,
            name: name.to_string(),
            base_role: role,
            created_at: Utc::now().to_rfc3339(),
        };

        let mut conn = self.open()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO users (id, email, password_hash, name, base_role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.name,
                user.base_role.as_str(),
                user.created_at,
            ],
        )
        .context("Failed to insert user")?;

        if role.is_elevated() {
            tx.execute(
                "INSERT INTO role_assignments (user_id, role, assigned_at) VALUES (?1, ?2, ?3)",
                params![user.id.to_string(), role.as_str(), user.created_at],
            )
            .context("Failed to insert role assignment")?;
        }

        tx.commit()?;

        info!("Created user: {} ({})", user.email, user.base_role.as_str());

        Ok(user)
    }

    /// Update a user's name, email, or role. A role change rewrites the
    /// role-assignment row. Returns None when the user does not exist.
    pub fn update_user(
        &self,
        user_id: &Uuid,
        name: Option<&str>,
        email: Option<&str>,
        role: Option<Role>,
    ) -> Result<Option<User>> {
        let Some(current) = self.get_user_by_id(user_id)? else {
            return Ok(None);
        };

        let name = name.unwrap_or(&current.name);
        let email = email.unwrap_or(&current.email);
        let role = role.unwrap_or(current.base_role);

        let mut conn = self.open()?;
        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE users SET name = ?1, email = ?2, base_role = ?3 WHERE id = ?4",
            params![name, email, role.as_str(), user_id.to_string()],
        )
        .context("Failed to update user")?;

        if role.is_elevated() {
            tx.execute(
                "INSERT OR REPLACE INTO role_assignments (user_id, role, assigned_at)
                 VALUES (?1, ?2, ?3)",
                params![user_id.to_string(), role.as_str(), Utc::now().to_rfc3339()],
            )
            .context("Failed to update role assignment")?;
        } else {
            tx.execute(
                "DELETE FROM role_assignments WHERE user_id = ?1",
                params![user_id.to_string()],
            )?;
        }

        tx.commit()?;

        info!("Updated user: {} ({})", email, role.as_str());

        self.get_user_by_id(user_id)
    }

    /// Store a new password hash for a user. Returns false when the user
    /// does not exist.
    pub fn set_password(&self, user_id: &Uuid, password_hash: &str) -> Result<bool> {
        let conn = self.open()?;

        let rows = conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, user_id.to_string()],
        )?;

        Ok(rows > 0)
    }

    /// List users with their role assignments, newest first.
    pub fn list_users(&self, limit: usize, offset: usize) -> Result<Vec<(User, Option<Role>)>> {
        let conn = self.open()?;

        let mut stmt = conn.prepare(
            "SELECT u.id, u.email, u.password_hash, u.name, u.base_role, u.created_at, r.role
             FROM users u
             LEFT JOIN role_assignments r ON r.user_id = u.id
             ORDER BY u.created_at DESC
             LIMIT ?1 OFFSET ?2",
        )?;

        let users = stmt
            .query_map(params![limit as i64, offset as i64], |row| {
                let user = Self::row_to_user(row)?;
                let assignment: Option<String> = row.get(6)?;
                Ok((user, assignment.and_then(|s| Role::from_str(&s))))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Delete a user and their role assignment. Returns false when the user
    /// does not exist. The business profile cascade is the caller's job.
    pub fn delete_user(&self, user_id: &Uuid) -> Result<bool> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM role_assignments WHERE user_id = ?1",
            params![user_id.to_string()],
        )?;

        let rows = tx.execute(
            "DELETE FROM users WHERE id = ?1",
            params![user_id.to_string()],
        )?;

        tx.commit()?;

        if rows == 0 {
            return Ok(false);
        }

        info!("Deleted user: {}", user_id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (UserStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = UserStore::new(db_path).unwrap();
        (store, temp_file)
    }

    #[test]
    fn test_default_superadmin_created() {
        let (store, _temp) = create_test_store();

        let admin = store.get_user_by_email("admin@bizportal.local").unwrap();
        assert!(admin.is_some());

        let admin = admin.unwrap();
        assert_eq!(admin.base_role, Role::Superadmin);

        // The seed includes the confirming assignment row.
        let assignment = store.get_role_assignment(&admin.id).unwrap();
        assert_eq!(assignment, Some(Role::Superadmin));
    }

    #[test]
    fn test_seeded_password_verifies() {
        let (store, _temp) = create_test_store();

        let admin = store
            .get_user_by_email("admin@bizportal.local")
            .unwrap()
            .unwrap();

        assert!(password::verify_password("admin123", &admin.password_hash));
        assert!(!password::verify_password("wrongpassword", &admin.password_hash));
    }

    #[test]
    fn test_create_and_retrieve_user() {
        let (store, _temp) = create_test_store();

        let user = store
            .create_user("Acme Corp", "acme@example.com", "password123", Role::Business)
            .unwrap();
        assert_eq!(user.email, "acme@example.com");
        assert_eq!(user.base_role, Role::Business);

        let retrieved = store.get_user_by_email("acme@example.com").unwrap();
        assert!(retrieved.is_some());

        let retrieved = retrieved.unwrap();
        assert_eq!(retrieved.id, user.id);
        assert_eq!(retrieved.name, "Acme Corp");

        // Business users get no assignment row.
        assert_eq!(store.get_role_assignment(&user.id).unwrap(), None);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (store, _temp) = create_test_store();

        store
            .create_user("First", "dup@example.com", "password123", Role::Business)
            .unwrap();
        let second = store.create_user("Second", "dup@example.com", "password123", Role::Business);
        assert!(second.is_err());
    }

    #[test]
    fn test_elevated_user_gets_assignment() {
        let (store, _temp) = create_test_store();

        let admin = store
            .create_user("Admin", "admin2@example.com", "password123", Role::Admin)
            .unwrap();

        assert_eq!(store.get_role_assignment(&admin.id).unwrap(), Some(Role::Admin));
    }

    #[test]
    fn test_list_users_pagination() {
        let (store, _temp) = create_test_store();

        store
            .create_user("One", "one@example.com", "pass1234", Role::Business)
            .unwrap();
        store
            .create_user("Two", "two@example.com", "pass1234", Role::Business)
            .unwrap();

        // Seeded superadmin + 2 created
        let all = store.list_users(50, 0).unwrap();
        assert_eq!(all.len(), 3);

        let page = store.list_users(2, 0).unwrap();
        assert_eq!(page.len(), 2);

        let rest = store.list_users(2, 2).unwrap();
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn test_update_user_role_rewrites_assignment() {
        let (store, _temp) = create_test_store();

        let user = store
            .create_user("Acme", "acme@example.com", "password123", Role::Business)
            .unwrap();

        // Promote
        let updated = store
            .update_user(&user.id, None, None, Some(Role::Admin))
            .unwrap()
            .unwrap();
        assert_eq!(updated.base_role, Role::Admin);
        assert_eq!(store.get_role_assignment(&user.id).unwrap(), Some(Role::Admin));

        // Demote back to business removes the assignment
        store
            .update_user(&user.id, None, None, Some(Role::Business))
            .unwrap()
            .unwrap();
        assert_eq!(store.get_role_assignment(&user.id).unwrap(), None);
    }

    #[test]
    fn test_update_missing_user_returns_none() {
        let (store, _temp) = create_test_store();
        let result = store
            .update_user(&Uuid::new_v4(), Some("Ghost"), None, None)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_set_password() {
        let (store, _temp) = create_test_store();

        let user = store
            .create_user("Acme", "acme@example.com", "oldpassword", Role::Business)
            .unwrap();

        let new_hash = password::hash_password("newpassword1").unwrap();
        assert!(store.set_password(&user.id, &new_hash).unwrap());

        let reloaded = store.get_user_by_id(&user.id).unwrap().unwrap();
        assert!(password::verify_password("newpassword1", &reloaded.password_hash));
        assert!(!password::verify_password("oldpassword", &reloaded.password_hash));

        assert!(!store.set_password(&Uuid::new_v4(), &new_hash).unwrap());
    }

    #[test]
    fn test_delete_user_removes_assignment() {
        let (store, _temp) = create_test_store();

        let admin = store
            .create_user("Admin", "admin2@example.com", "password123", Role::Admin)
            .unwrap();

        assert!(store.delete_user(&admin.id).unwrap());
        assert!(store.get_user_by_email("admin2@example.com").unwrap().is_none());
        assert_eq!(store.get_role_assignment(&admin.id).unwrap(), None);

        // Deleting again reports not-found.
        assert!(!store.delete_user(&admin.id).unwrap());
    }
}
