//! Role hierarchy, login-time role reconciliation and the route gate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Account role. Ordering follows the privilege ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Normal User")]
    NormalUser,
    #[serde(rename = "Store Owner")]
    StoreOwner,
    #[serde(rename = "System Administrator", alias = "Administrator")]
    Administrator,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::NormalUser, Self::StoreOwner, Self::Administrator];

    /// Label stored in the database and used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NormalUser => "Normal User",
            Self::StoreOwner => "Store Owner",
            Self::Administrator => "System Administrator",
        }
    }

    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::NormalUser => 1,
            Self::StoreOwner => 2,
            Self::Administrator => 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal User" => Ok(Self::NormalUser),
            "Store Owner" => Ok(Self::StoreOwner),
            "System Administrator" | "Administrator" => Ok(Self::Administrator),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Side effect a successful login must apply before a token is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAction {
    None,
    /// Overwrite the stored role with the transition's final role.
    UpgradePersist,
}

/// Result of reconciling a stored role with the role a login asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleTransition {
    pub previous: Role,
    pub final_role: Role,
    pub action: RoleAction,
}

impl RoleTransition {
    const fn unchanged(role: Role) -> Self {
        Self {
            previous: role,
            final_role: role,
            action: RoleAction::None,
        }
    }

    #[must_use]
    pub const fn is_upgrade(&self) -> bool {
        matches!(self.action, RoleAction::UpgradePersist)
    }
}

/// Whether a login through a higher role's entry point may promote the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpgradePolicy {
    #[default]
    PersistOnLogin,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Access Denied: Please use the appropriate login for your role ({stored}).")]
pub struct RoleDenied {
    pub stored: Role,
}

/// Decides whether a login requesting `requested` proceeds for an account
/// whose persisted role is `stored`.
///
/// Absent or equal requests keep the stored role. A strictly higher request
/// is an upgrade that the caller must persist. Anything else, including an
/// unrecognised label, is denied.
pub fn reconcile_role(
    stored: Role,
    requested: Option<&str>,
    policy: UpgradePolicy,
) -> Result<RoleTransition, RoleDenied> {
    let Some(requested) = requested else {
        return Ok(RoleTransition::unchanged(stored));
    };

    let Ok(requested) = requested.parse::<Role>() else {
        return Err(RoleDenied { stored });
    };

    if requested == stored {
        return Ok(RoleTransition::unchanged(stored));
    }

    if requested.rank() > stored.rank() && policy == UpgradePolicy::PersistOnLogin {
        return Ok(RoleTransition {
            previous: stored,
            final_role: requested,
            action: RoleAction::UpgradePersist,
        });
    }

    Err(RoleDenied { stored })
}

/// Outcome of the per-route role gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

impl Access {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Allows iff `actual` is one of `required`.
#[must_use]
pub fn authorize(required: &[Role], actual: Role) -> Access {
    if required.contains(&actual) {
        Access::Allow
    } else {
        Access::Deny
    }
}
