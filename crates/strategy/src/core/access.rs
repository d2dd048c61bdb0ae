//! Privileged-caller checks applied at the controller's public boundary.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::errors::{StrategyError, StrategyResult};

/// Addresses allowed to drive or manage the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    pub governance: Address,
    pub management: Address,
    pub strategist: Address,
    pub keeper: Address,
    pub guardian: Address,
    /// The vault the strategy reports to.
    pub vault: Address,
}

impl Roles {
    fn require(&self, caller: Address, allowed: &[Address], action: &'static str) -> StrategyResult<()> {
        if allowed.contains(&caller) {
            Ok(())
        } else {
            Err(StrategyError::Unauthorized { caller, action })
        }
    }

    /// Harvest and tend.
    pub fn only_keepers(&self, caller: Address, action: &'static str) -> StrategyResult<()> {
        self.require(
            caller,
            &[self.keeper, self.strategist, self.governance, self.guardian, self.management],
            action,
        )
    }

    /// Collateral targets, loop policy, manual unwinds, health check.
    pub fn only_vault_managers(&self, caller: Address, action: &'static str) -> StrategyResult<()> {
        self.require(caller, &[self.management, self.governance], action)
    }

    pub fn only_emergency_authorized(&self, caller: Address, action: &'static str) -> StrategyResult<()> {
        self.require(
            caller,
            &[self.strategist, self.governance, self.guardian, self.management],
            action,
        )
    }

    /// Report cadence and keeper assignment.
    pub fn only_authorized(&self, caller: Address, action: &'static str) -> StrategyResult<()> {
        self.require(caller, &[self.strategist, self.governance], action)
    }

    pub fn only_governance(&self, caller: Address, action: &'static str) -> StrategyResult<()> {
        self.require(caller, &[self.governance], action)
    }

    pub fn only_vault(&self, caller: Address, action: &'static str) -> StrategyResult<()> {
        self.require(caller, &[self.vault], action)
    }
}
