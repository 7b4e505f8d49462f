//! # Access Module
//!
//! Roles, capabilities and the calling actor.
//!
//! ## Capability Matrix
//! ```text
//! ┌──────────────────────┬────────┬────────┬────────┐
//! │ Capability           │ Admin  │ Worker │ Client │
//! ├──────────────────────┼────────┼────────┼────────┤
//! │ Cut (takes bookings) │        │   ✓    │        │
//! │ ViewEarnings         │   ✓    │        │        │
//! │ ManageAnyBooking     │   ✓    │        │        │
//! │ ManageInventory      │   ✓    │        │        │
//! └──────────────────────┴────────┴────────┴────────┘
//! ```
//!
//! The role is resolved once, when the web layer builds the [`Actor`] for
//! a request. Everything downstream asks [`Actor::require`] or
//! [`Role::has`]; nothing compares role strings.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// A user's role. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    /// A barber.
    Worker,
    Client,
}

/// Something a role may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Can be booked for a service.
    Cut,
    /// Can read the earnings aggregates.
    ViewEarnings,
    /// Can edit and cancel bookings owned by other users.
    ManageAnyBooking,
    /// Can restock products.
    ManageInventory,
}

impl Capability {
    const fn describe(&self) -> &'static str {
        match self {
            Capability::Cut => "take bookings",
            Capability::ViewEarnings => "view earnings",
            Capability::ManageAnyBooking => "manage other users' bookings",
            Capability::ManageInventory => "restock products",
        }
    }
}

impl Role {
    /// Checks the capability matrix.
    pub const fn has(&self, capability: Capability) -> bool {
        matches!(
            (self, capability),
            (Role::Worker, Capability::Cut)
                | (Role::Admin, Capability::ViewEarnings)
                | (Role::Admin, Capability::ManageAnyBooking)
                | (Role::Admin, Capability::ManageInventory)
        )
    }
}

/// The authenticated caller of an engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Actor {
            user_id: user_id.into(),
            role,
        }
    }

    /// Fails with `Forbidden` unless the actor's role grants `capability`.
    pub fn require(&self, capability: Capability) -> CoreResult<()> {
        if self.role.has(capability) {
            Ok(())
        } else {
            Err(CoreError::forbidden(format!(
                "user {} may not {}",
                self.user_id,
                capability.describe()
            )))
        }
    }

    /// Whether the actor owns a resource or may act on anyone's.
    pub fn may_act_for(&self, owner_id: &str, override_with: Capability) -> bool {
        self.user_id == owner_id || self.role.has(override_with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_capability_matrix() {
        assert!(Role::Worker.has(Capability::Cut));
        assert!(!Role::Admin.has(Capability::Cut));
        assert!(!Role::Client.has(Capability::Cut));

        assert!(Role::Admin.has(Capability::ViewEarnings));
        assert!(!Role::Worker.has(Capability::ViewEarnings));
        assert!(!Role::Client.has(Capability::ViewEarnings));

        assert!(Role::Admin.has(Capability::ManageInventory));
        assert!(!Role::Worker.has(Capability::ManageInventory));
    }

    #[test]
    fn test_require() {
        let client = Actor::new("c-1", Role::Client);
        let err = client.require(Capability::ViewEarnings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let admin = Actor::new("a-1", Role::Admin);
        assert!(admin.require(Capability::ViewEarnings).is_ok());
    }

    #[test]
    fn test_may_act_for() {
        let client = Actor::new("c-1", Role::Client);
        assert!(client.may_act_for("c-1", Capability::ManageAnyBooking));
        assert!(!client.may_act_for("c-2", Capability::ManageAnyBooking));

        let admin = Actor::new("a-1", Role::Admin);
        assert!(admin.may_act_for("c-2", Capability::ManageAnyBooking));
    }
}
