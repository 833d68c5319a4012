//! Account roles.

use serde::{Deserialize, Serialize};

/// Error returned when a role code is not one of the known codes.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role code: {0}")]
pub struct UnknownRole(pub String);

/// Role granted to an account.
///
/// The set is closed: codes stored in the database or carried in a token
/// that do not match one of these are rejected rather than ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCode {
    /// Customer placing orders.
    Client,
    /// Store staff with full access.
    Admin,
    /// Delivery staff.
    Courier,
}

impl RoleCode {
    /// All known roles, in code order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Client, Self::Courier];

    /// The stable code stored in `storefront.roles.code` and in tokens.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Admin => "admin",
            Self::Courier => "courier",
        }
    }

    /// Human-readable role name used when the role row is first created.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::Admin => "Administrator",
            Self::Courier => "Courier",
        }
    }
}

impl std::fmt::Display for RoleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for RoleCode {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "admin" => Ok(Self::Admin),
            "courier" => Ok(Self::Courier),
            _ => Err(UnknownRole(s.to_owned())),
        }
    }
}
