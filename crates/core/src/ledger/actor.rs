//! The acting member behind each engine call.
//!
//! Identity is established upstream; the engine only inspects the capability
//! set it is handed.

use ikimina_shared::types::MemberId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{LedgerError, LedgerResult};

/// Capability names understood by the ledger engine.
pub mod capability {
    /// May approve or decline loans.
    pub const APPROVE_LOAN: &str = "approve-loan";
    /// May act on any member's behalf and run administrative operations.
    pub const ADMIN: &str = "admin";
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The member making the call.
    pub member_id: MemberId,
    /// Free-form role label, informational only.
    pub role: String,
    /// Capabilities granted to the caller.
    pub capabilities: BTreeSet<String>,
}

impl Actor {
    /// Creates an actor with no capabilities.
    #[must_use]
    pub fn new(member_id: MemberId, role: impl Into<String>) -> Self {
        Self {
            member_id,
            role: role.into(),
            capabilities: BTreeSet::new(),
        }
    }

    /// Adds a capability.
    #[must_use]
    pub fn with_capability(mut self, capability: &str) -> Self {
        self.capabilities.insert(capability.to_string());
        self
    }

    /// Returns true if the actor holds `capability`.
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Returns true if the actor holds the admin capability.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_capability(capability::ADMIN)
    }

    /// Fails with `MissingCapability` unless the actor holds `capability`.
    ///
    /// # Errors
    ///
    /// Returns `MissingCapability` when the capability is absent.
    pub fn require(&self, capability: &'static str) -> LedgerResult<()> {
        if self.has_capability(capability) {
            Ok(())
        } else {
            Err(LedgerError::MissingCapability {
                actor: self.member_id,
                capability,
            })
        }
    }
}
