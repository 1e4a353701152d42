//! Session-stored identity.

use serde::{Deserialize, Serialize};

use fastlanche_core::{Email, Role, UserId};

use super::User;

/// The logged-in user, as stored in the session at login.
///
/// Role changes take effect on the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
}

impl CurrentUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether this user may read or act on data owned by `owner`.
    ///
    /// Admins can access everything; customers only their own data.
    #[must_use]
    pub fn can_access(&self, owner: UserId) -> bool {
        self.is_admin() || self.id == owner
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(id: i32, role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            name: "Ana".to_string(),
            email: Email::parse("ana@example.com").unwrap(),
            role,
        }
    }

    #[test]
    fn test_customer_accesses_only_own_data() {
        let customer = user(42, Role::Customer);
        assert!(customer.can_access(UserId::new(42)));
        assert!(!customer.can_access(UserId::new(7)));
    }

    #[test]
    fn test_admin_accesses_everything() {
        let admin = user(1, Role::Admin);
        assert!(admin.can_access(UserId::new(42)));
        assert!(admin.can_access(UserId::new(7)));
    }
}
