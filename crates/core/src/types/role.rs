//! Customer account roles.

use serde::{Deserialize, Serialize};

/// Role attached to a store account.
///
/// Serialized in SCREAMING_SNAKE_CASE because the role also travels
/// inside signed access tokens, where the wire form is the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular shopper. Assigned at registration.
    #[default]
    Customer,
    /// Store staff with management access.
    Admin,
}

impl Role {
    /// The wire form of the role, as embedded in token claims.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(Self::Customer),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_customer() {
        assert_eq!(Role::default(), Role::Customer);
    }

    #[test]
    fn test_wire_form() {
        assert_eq!(Role::Customer.as_str(), "CUSTOMER");
        assert_eq!(Role::Admin.to_string(), "ADMIN");
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_matches_wire_form() {
        assert_eq!(serde_json::to_string(&Role::Customer).unwrap(), "\"CUSTOMER\"");
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
    }
}
