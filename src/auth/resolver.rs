//! Role Resolver
//! Mission: Compute the single effective role for a user

use crate::auth::models::{effective_role, Role, User};
use crate::auth::user_store::UserStore;
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Resolves a user's effective role from the user record and the
/// role-assignment table.
///
/// The assignment is authoritative; role values asserted by a caller in a
/// request body are never consulted.
pub struct RoleResolver {
    store: Arc<UserStore>,
}

impl RoleResolver {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self { store }
    }

    /// Resolve the effective role for a user record.
    ///
    /// An elevated base role with no confirming assignment row is a
    /// consistency error: it is logged and the user falls back to the
    /// lower-privileged default. Resolution is idempotent between writes.
    pub fn resolve(&self, user: &User) -> Result<Role> {
        let assignment = self.store.get_role_assignment(&user.id)?;

        if assignment.is_none() && user.base_role.is_elevated() {
            warn!(
                user_id = %user.id,
                base_role = user.base_role.as_str(),
                "Elevated base role has no matching role assignment, falling back to business"
            );
        }

        Ok(effective_role(user.base_role, assignment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::user_store::UserStore;
    use tempfile::NamedTempFile;

    fn create_test_resolver() -> (RoleResolver, Arc<UserStore>, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = Arc::new(UserStore::new(temp_file.path().to_str().unwrap()).unwrap());
        (RoleResolver::new(store.clone()), store, temp_file)
    }

    #[test]
    fn test_resolves_business_by_default() {
        let (resolver, store, _temp) = create_test_resolver();

        let user = store
            .create_user("Acme Corp", "acme@example.com", "password123", Role::Business)
            .unwrap();

        assert_eq!(resolver.resolve(&user).unwrap(), Role::Business);
    }

    #[test]
    fn test_assignment_confirms_elevated_role() {
        let (resolver, store, _temp) = create_test_resolver();

        let admin = store
            .create_user("Admin", "admin2@example.com", "password123", Role::Admin)
            .unwrap();
        let superadmin = store
            .create_user("Root", "root@example.com", "password123", Role::Superadmin)
            .unwrap();

        assert_eq!(resolver.resolve(&admin).unwrap(), Role::Admin);
        assert_eq!(resolver.resolve(&superadmin).unwrap(), Role::Superadmin);
    }

    #[test]
    fn test_missing_assignment_falls_back_to_business() {
        let (resolver, store, _temp) = create_test_resolver();

        // An elevated base role whose assignment row has been removed.
        let admin = store
            .create_user("Admin", "admin2@example.com", "password123", Role::Admin)
            .unwrap();
        store.remove_role_assignment(&admin.id).unwrap();

        assert_eq!(resolver.resolve(&admin).unwrap(), Role::Business);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let (resolver, store, _temp) = create_test_resolver();

        let user = store
            .create_user("Acme Corp", "acme@example.com", "password123", Role::Business)
            .unwrap();

        let first = resolver.resolve(&user).unwrap();
        let second = resolver.resolve(&user).unwrap();
        assert_eq!(first, second);
    }
}
