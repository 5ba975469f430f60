//! Caller identities and roles for privileged operations.
//!
//! Kill-switch toggles, breaker resets, proof validation and signer
//! lifecycle changes all require a privileged caller; the acting identity
//! is recorded in every audit event.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role attached to a caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Ledger owner: manages signer lifecycle, full admin rights.
    Owner,
    /// Operator: kill switch and breaker administration.
    Operator,
    /// Validator: proof validation.
    Validator,
    /// Strategy agent: may propose decisions only.
    Agent,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => write!(f, "OWNER"),
            Self::Operator => write!(f, "OPERATOR"),
            Self::Validator => write!(f, "VALIDATOR"),
            Self::Agent => write!(f, "AGENT"),
        }
    }
}

/// A caller identity with its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// May toggle the kill switch and reset the circuit breaker.
    #[must_use]
    pub fn can_administer_safety(&self) -> bool {
        matches!(self.role, Role::Owner | Role::Operator)
    }

    /// May validate proofs in the ledger.
    #[must_use]
    pub fn can_validate_proofs(&self) -> bool {
        matches!(self.role, Role::Owner | Role::Validator)
    }

    /// May authorize and revoke ledger signers.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        matches!(self.role, Role::Owner)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.id, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_privileges() {
        assert!(Actor::new("ops", Role::Operator).can_administer_safety());
        assert!(Actor::new("root", Role::Owner).can_administer_safety());
        assert!(!Actor::new("a1", Role::Agent).can_administer_safety());

        assert!(Actor::new("v1", Role::Validator).can_validate_proofs());
        assert!(!Actor::new("ops", Role::Operator).can_validate_proofs());

        assert!(Actor::new("root", Role::Owner).is_owner());
        assert!(!Actor::new("v1", Role::Validator).is_owner());
    }
}
