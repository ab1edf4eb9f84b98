//! Request identity and permission gating.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::models::{Permission, User};

/// The identity behind a request, as resolved by the authentication
/// middleware. Requests without credentials are anonymous.
#[derive(Clone, Debug, Default)]
pub enum CurrentUser {
    #[default]
    Anonymous,
    Authenticated(User),
}

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user().is_none()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentUser>().cloned().unwrap_or_default())
    }
}

/// An authorization predicate: the user holds `permission`, or (when an owner
/// is set) is that owner.
#[derive(Debug, Clone, Copy)]
pub struct Gate<'a> {
    permission: Permission,
    owner: Option<&'a str>,
}

impl<'a> Gate<'a> {
    pub fn permission(permission: Permission) -> Self {
        Self {
            permission,
            owner: None,
        }
    }

    pub fn or_owner(self, owner: &'a str) -> Self {
        Self {
            owner: Some(owner),
            ..self
        }
    }

    pub fn allows(&self, user: &User) -> bool {
        if user.has_perm(self.permission) {
            return true;
        }
        match self.owner {
            Some(owner) => user.is_active && user.username == owner,
            None => false,
        }
    }

    /// Evaluate the gate, yielding the authenticated user on success.
    ///
    /// Anonymous requests get [`AppError::Unauthorized`]; every other denial is
    /// an explicit [`AppError::Forbidden`].
    pub fn check<'u>(&self, current: &'u CurrentUser) -> Result<&'u User, AppError> {
        let user = current.user().ok_or(AppError::Unauthorized)?;
        if self.allows(user) {
            Ok(user)
        } else {
            Err(AppError::Forbidden(format!(
                "{} does not hold {}",
                user.username, self.permission
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(name: &str, permissions: &[Permission]) -> User {
        User {
            id: 7,
            username: name.to_string(),
            email: None,
            is_superuser: false,
            is_active: true,
            date_joined: Utc::now(),
            permissions: permissions.iter().copied().collect(),
        }
    }

    #[test]
    fn anonymous_is_unauthorized() {
        let gate = Gate::permission(Permission::AddPost);
        assert!(matches!(
            gate.check(&CurrentUser::Anonymous),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn permission_holder_passes() {
        let current = CurrentUser::Authenticated(user("ana", &[Permission::AddPost]));
        let allowed = Gate::permission(Permission::AddPost).check(&current).unwrap();
        assert_eq!(allowed.username, "ana");
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let current = CurrentUser::Authenticated(user("ana", &[Permission::AddPost]));
        assert!(matches!(
            Gate::permission(Permission::DeletePost).check(&current),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn owner_passes_without_permission() {
        let current = CurrentUser::Authenticated(user("ana", &[]));
        let gate = Gate::permission(Permission::EditProposal).or_owner("ana");
        assert!(gate.check(&current).is_ok());
    }

    #[test]
    fn other_user_is_forbidden_even_with_owner_clause() {
        let current = CurrentUser::Authenticated(user("bruno", &[]));
        let gate = Gate::permission(Permission::EditProposal).or_owner("ana");
        assert!(matches!(gate.check(&current), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn inactive_owner_is_forbidden() {
        let mut owner = user("ana", &[]);
        owner.is_active = false;
        let gate = Gate::permission(Permission::EditProposal).or_owner("ana");
        assert!(!gate.allows(&owner));
    }
}
