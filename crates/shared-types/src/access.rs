//! # Access Control
//!
//! Owner and guardian roles guarding configuration entry points.

use crate::primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// Caller is not the owner.
    #[error("caller is not the owner")]
    NotOwner,

    /// Caller is not the guardian.
    #[error("caller is not the guardian")]
    NotGuardian,

    /// Caller is neither owner nor guardian.
    #[error("caller is not the owner or guardian")]
    NotOwnerOrGuardian,
}

/// Owner and guardian of a service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    /// May change configuration.
    pub owner: Address,
    /// May act in emergencies and cancel proposals.
    pub guardian: Address,
}

impl AccessControl {
    /// Create an access model.
    pub fn new(owner: Address, guardian: Address) -> Self {
        Self { owner, guardian }
    }

    /// Require `caller == owner`.
    pub fn only_owner(&self, caller: &Address) -> Result<(), AccessError> {
        if *caller != self.owner {
            return Err(AccessError::NotOwner);
        }
        Ok(())
    }

    /// Require `caller == guardian`.
    pub fn only_guardian(&self, caller: &Address) -> Result<(), AccessError> {
        if *caller != self.guardian {
            return Err(AccessError::NotGuardian);
        }
        Ok(())
    }

    /// Require the caller to hold either role.
    pub fn only_owner_or_guardian(&self, caller: &Address) -> Result<(), AccessError> {
        if *caller != self.owner && *caller != self.guardian {
            return Err(AccessError::NotOwnerOrGuardian);
        }
        Ok(())
    }
}
