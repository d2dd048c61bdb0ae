//! Owned controller settings. Engines receive them by value or reference;
//! only the management operations on `LeveragedStrategy` mutate them.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_REPORT_DELAY, DEFAULT_MIN_RATIO, DEFAULT_MIN_REPORT_DELAY,
    DEFAULT_MIN_REWARD_TO_SELL, DEFAULT_MIN_WANT, DEFAULT_PROFIT_FACTOR, MAX_ITERATIONS_CAP,
};
use crate::errors::{StrategyError, StrategyResult};
use crate::types::{Amount, CollateralTargets, RewardBehavior, SwapRouterKind, Wad};

/// Bounds on the leverage / deleverage loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopPolicy {
    /// Amounts at or below this are treated as dust.
    pub min_want: Amount,
    /// Ratio deviation from target tolerated before rebalancing.
    pub min_ratio: Wad,
    pub max_iterations: u8,
    /// Flash-funded loops when set, bounded iterative loops otherwise.
    pub flash_loans_active: bool,
}

impl Default for LoopPolicy {
    fn default() -> Self {
        Self {
            min_want: U256::from(DEFAULT_MIN_WANT),
            min_ratio: Wad::from_u64(DEFAULT_MIN_RATIO),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            flash_loans_active: true,
        }
    }
}

impl LoopPolicy {
    /// `max_iterations` in `1..=MAX_ITERATIONS_CAP`, `min_ratio` below the
    /// borrow ceiling.
    pub fn validate(&self, max_borrow_ratio: Wad) -> StrategyResult<()> {
        if self.max_iterations == 0 || self.max_iterations > MAX_ITERATIONS_CAP {
            return Err(StrategyError::InvalidParameter {
                param: "max_iterations",
                reason: format!("{} outside 1..={MAX_ITERATIONS_CAP}", self.max_iterations),
            });
        }
        if self.min_ratio >= max_borrow_ratio {
            return Err(StrategyError::InvalidParameter {
                param: "min_ratio",
                reason: format!("{} must be < max borrow ratio {max_borrow_ratio}", self.min_ratio),
            });
        }
        Ok(())
    }
}

/// Harvest cadence and keeper economics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSettings {
    pub min_report_delay: u64,
    pub max_report_delay: u64,
    /// Multiple of the call cost the expected credit + profit must exceed.
    pub profit_factor: u64,
    /// Debt outstanding / loss above this forces a harvest.
    pub debt_threshold: Amount,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            min_report_delay: DEFAULT_MIN_REPORT_DELAY,
            max_report_delay: DEFAULT_MAX_REPORT_DELAY,
            profit_factor: DEFAULT_PROFIT_FACTOR,
            debt_threshold: Amount::ZERO,
        }
    }
}

impl Default for RewardBehavior {
    fn default() -> Self {
        Self {
            router: SwapRouterKind::default(),
            min_reward_to_sell: U256::from(DEFAULT_MIN_REWARD_TO_SELL),
        }
    }
}

/// Everything a privileged caller can tune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySettings {
    pub targets: CollateralTargets,
    pub loop_policy: LoopPolicy,
    pub rewards: RewardBehavior,
    pub report: ReportSettings,
    /// Once set, every cycle unwinds and nothing re-levers.
    pub emergency_exit: bool,
}

impl StrategySettings {
    pub fn new(targets: CollateralTargets) -> Self {
        Self {
            targets,
            loop_policy: LoopPolicy::default(),
            rewards: RewardBehavior::default(),
            report: ReportSettings::default(),
            emergency_exit: false,
        }
    }
}

/// Inputs shared by the leverage and deleverage engines.
#[derive(Debug, Clone, Copy)]
pub struct LoopContext {
    /// Strategy account holding the position.
    pub account: Address,
    pub want: Address,
    pub targets: CollateralTargets,
    pub policy: LoopPolicy,
}

impl LoopContext {
    pub fn new(account: Address, want: Address, settings: &StrategySettings) -> Self {
        Self {
            account,
            want,
            targets: settings.targets,
            policy: settings.loop_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_policy_defaults() {
        let policy = LoopPolicy::default();
        assert_eq!(policy.max_iterations, 6);
        assert_eq!(policy.min_want, U256::from(100u64));
        assert!(policy.validate(Wad::from_bps(7_000)).is_ok());
    }

    #[test]
    fn test_loop_policy_rejects_bad_iterations() {
        let max_borrow = Wad::from_bps(7_000);
        for max_iterations in [0u8, 17] {
            let policy = LoopPolicy {
                max_iterations,
                ..Default::default()
            };
            let err = policy.validate(max_borrow).unwrap_err();
            assert!(matches!(
                err,
                StrategyError::InvalidParameter {
                    param: "max_iterations",
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_loop_policy_rejects_min_ratio_at_ceiling() {
        let policy = LoopPolicy {
            min_ratio: Wad::from_bps(7_000),
            ..Default::default()
        };
        assert!(policy.validate(Wad::from_bps(7_000)).is_err());
    }
}
