use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Permission;

/// A registered account.
///
/// Superusers implicitly hold every [`Permission`]; everyone else holds the
/// explicit grants in `permissions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub permissions: BTreeSet<Permission>,
}

impl User {
    pub fn has_perm(&self, permission: Permission) -> bool {
        self.is_active && (self.is_superuser || self.permissions.contains(&permission))
    }
}

/// Input for creating a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    pub email: Option<String>,
    #[serde(default)]
    pub is_superuser: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_superuser: bool, is_active: bool, permissions: &[Permission]) -> User {
        User {
            id: 1,
            username: "ana".to_string(),
            email: None,
            is_superuser,
            is_active,
            date_joined: Utc::now(),
            permissions: permissions.iter().copied().collect(),
        }
    }

    #[test]
    fn explicit_grant_is_honoured() {
        let u = user(false, true, &[Permission::AddPost]);
        assert!(u.has_perm(Permission::AddPost));
        assert!(!u.has_perm(Permission::DeletePost));
    }

    #[test]
    fn superuser_holds_everything() {
        let u = user(true, true, &[]);
        assert!(Permission::ALL.iter().all(|p| u.has_perm(*p)));
    }

    #[test]
    fn inactive_user_holds_nothing() {
        let u = user(true, false, &[Permission::AddPost]);
        assert!(!u.has_perm(Permission::AddPost));
    }
}
