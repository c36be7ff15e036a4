//! Authenticated caller context.
//!
//! The surrounding request pipeline authenticates the caller and hands this
//! subsystem a [`Caller`] describing who is acting. Every operation takes it
//! as an explicit parameter — there is no ambient session state — which keeps
//! the authorization rules directly unit-testable.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Platform-level authorization role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Ordinary investor with standard permissions.
    #[default]
    Investor,
    /// Fundraiser: may inspect activity on offerings they raise for.
    Fundraiser,
    /// Platform administrator.
    Admin,
}

/// The authenticated caller of an operation.
///
/// Supplied by the external identity collaborator; a precondition for every
/// operation in this subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// The caller's user id.
    pub user_id: UserId,
    /// The caller's platform role.
    pub role: Role,
    /// Whether the caller's email address has been verified.
    pub email_verified: bool,
}

impl Caller {
    /// Creates a caller context.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role, email_verified: bool) -> Self {
        Self { user_id, role, email_verified }
    }

    /// Whether the caller is a platform administrator.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Whether the caller may inspect offering-wide activity (admin or
    /// fundraiser).
    #[must_use]
    pub const fn manages_offerings(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Fundraiser)
    }

    /// Whether the caller owns the given user id.
    #[must_use]
    pub fn owns(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_default_is_investor() {
        assert_eq!(Role::default(), Role::Investor);
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Fundraiser).unwrap(), "\"fundraiser\"");
        assert_eq!(serde_json::from_str::<Role>("\"admin\"").unwrap(), Role::Admin);
    }

    #[test]
    fn test_role_predicates() {
        let admin = Caller::new(UserId::new(1), Role::Admin, true);
        let fundraiser = Caller::new(UserId::new(2), Role::Fundraiser, true);
        let investor = Caller::new(UserId::new(3), Role::Investor, true);

        assert!(admin.is_admin());
        assert!(!fundraiser.is_admin());
        assert!(!investor.is_admin());

        assert!(admin.manages_offerings());
        assert!(fundraiser.manages_offerings());
        assert!(!investor.manages_offerings());
    }

    #[test]
    fn test_ownership() {
        let caller = Caller::new(UserId::new(9), Role::Investor, true);
        assert!(caller.owns(UserId::new(9)));
        assert!(!caller.owns(UserId::new(10)));
    }
}
