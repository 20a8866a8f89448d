/// Role and ownership checks
///
/// Two roles exist. Admins may act on every post and its analytics; users
/// only on posts they own. Listing-style endpoints resolve an [`OwnerScope`]
/// first and filter by it.
///
/// # Example
///
/// ```
/// use postpulse_shared::auth::authorization::{owner_scope, require_owner_or_admin, OwnerScope};
/// use postpulse_shared::auth::middleware::AuthContext;
/// use postpulse_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let auth = AuthContext {
///     user_id: Uuid::new_v4(),
///     name: "Jane".into(),
///     email: "jane@example.com".into(),
///     role: UserRole::User,
/// };
///
/// assert!(require_owner_or_admin(&auth, auth.user_id, "update this post").is_ok());
/// assert_eq!(owner_scope(&auth, Some("ignored")).unwrap(), OwnerScope::User(auth.user_id));
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("Admin privileges required")]
    AdminRequired,

    /// Caller neither owns the resource nor is an admin
    #[error("Not authorized to {action}")]
    NotOwner { action: &'static str },

    /// An admin supplied a `user_id` filter that is not a UUID
    #[error("Invalid user_id format")]
    InvalidUserId,
}

pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::AdminRequired)
    }
}

/// Passes for the owner and for admins
///
/// `action` completes the sentence "Not authorized to ..." in the error.
pub fn require_owner_or_admin(
    auth: &AuthContext,
    owner_id: Uuid,
    action: &'static str,
) -> Result<(), AuthzError> {
    if auth.is_admin() || auth.user_id == owner_id {
        Ok(())
    } else {
        Err(AuthzError::NotOwner { action })
    }
}

/// Which users' posts a listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    AllUsers,
    User(Uuid),
}

impl OwnerScope {
    /// The owner filter, `None` meaning no restriction
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            OwnerScope::AllUsers => None,
            OwnerScope::User(id) => Some(*id),
        }
    }
}

/// Resolves the scope for a listing request
///
/// Non-admins are always scoped to themselves and their `requested` value is
/// not even parsed. Admins see everyone unless they name a user.
pub fn owner_scope(auth: &AuthContext, requested: Option<&str>) -> Result<OwnerScope, AuthzError> {
    if !auth.is_admin() {
        return Ok(OwnerScope::User(auth.user_id));
    }

    match requested.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(OwnerScope::AllUsers),
        Some(raw) => Uuid::parse_str(raw)
            .map(OwnerScope::User)
            .map_err(|_| AuthzError::InvalidUserId),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    fn context(role: UserRole) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            name: "Test".into(),
            email: "test@example.com".into(),
            role,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&context(UserRole::Admin)).is_ok());
        assert_eq!(
            require_admin(&context(UserRole::User)),
            Err(AuthzError::AdminRequired)
        );
    }

    #[test]
    fn test_owner_or_admin() {
        let user = context(UserRole::User);
        let admin = context(UserRole::Admin);
        let other = Uuid::new_v4();

        assert!(require_owner_or_admin(&user, user.user_id, "view this post").is_ok());
        assert!(require_owner_or_admin(&admin, other, "view this post").is_ok());

        let err = require_owner_or_admin(&user, other, "delete this post").unwrap_err();
        assert_eq!(err.to_string(), "Not authorized to delete this post");
    }

    #[test]
    fn test_user_scope_ignores_requested_user() {
        let user = context(UserRole::User);
        let expected = OwnerScope::User(user.user_id);

        assert_eq!(owner_scope(&user, None).unwrap(), expected);
        assert_eq!(owner_scope(&user, Some("not-a-uuid")).unwrap(), expected);
        assert_eq!(
            owner_scope(&user, Some(&Uuid::new_v4().to_string())).unwrap(),
            expected
        );
    }

    #[test]
    fn test_admin_scope() {
        let admin = context(UserRole::Admin);
        let target = Uuid::new_v4();

        assert_eq!(owner_scope(&admin, None).unwrap(), OwnerScope::AllUsers);
        assert_eq!(owner_scope(&admin, Some("")).unwrap(), OwnerScope::AllUsers);
        assert_eq!(
            owner_scope(&admin, Some(&target.to_string())).unwrap(),
            OwnerScope::User(target)
        );
        assert_eq!(
            owner_scope(&admin, Some("nope")),
            Err(AuthzError::InvalidUserId)
        );
    }

    #[test]
    fn test_scope_user_id() {
        let id = Uuid::new_v4();
        assert_eq!(OwnerScope::AllUsers.user_id(), None);
        assert_eq!(OwnerScope::User(id).user_id(), Some(id));
    }
}
