use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use super::wad::Wad;

/// Token amount in want's native units.
pub type Amount = U256;

/// Deposits and borrows of the strategy account in the lending market.
///
/// Read fresh from the market on every operation; never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub deposits: Amount,
    pub borrows: Amount,
}

impl Position {
    pub fn new(deposits: Amount, borrows: Amount) -> Self {
        Self { deposits, borrows }
    }

    /// Net realizable value (`deposits - borrows`), zero if underwater.
    pub fn net_supply(&self) -> Amount {
        self.deposits.saturating_sub(self.borrows)
    }

    pub fn is_empty(&self) -> bool {
        self.deposits.is_zero() && self.borrows.is_zero()
    }
}

/// Collateral ratio bounds the controller keeps the position within.
///
/// Invariant: `0 < target_ratio < max_ratio <= max_borrow_ratio < liquidation_threshold`.
/// Enforced by [`crate::core::ratio::validate_targets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralTargets {
    /// Ratio the leverage loop aims for.
    pub target_ratio: Wad,
    /// Withdrawals never leave the position above this ratio.
    pub max_ratio: Wad,
    /// Hard ceiling for borrows / deposits after any operation.
    pub max_borrow_ratio: Wad,
}

/// Direction of a single loop step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopDirection {
    Supply,
    Borrow,
    Repay,
    Withdraw,
}

impl LoopDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supply => "supply",
            Self::Borrow => "borrow",
            Self::Repay => "repay",
            Self::Withdraw => "withdraw",
        }
    }
}

/// One market call in a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStep {
    pub direction: LoopDirection,
    pub amount: Amount,
}

/// Ephemeral sequence of steps moving a position toward a ratio target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopPlan {
    pub steps: Vec<LoopStep>,
    /// Borrow still missing (lever up) or debt still to repay (lever down)
    /// after all planned steps.
    pub remaining: Amount,
    /// Number of deposit/borrow (or repay/withdraw) iterations used.
    pub iterations: u8,
}

impl LoopPlan {
    pub fn push(&mut self, direction: LoopDirection, amount: Amount) {
        if !amount.is_zero() {
            self.steps.push(LoopStep { direction, amount });
        }
    }

    /// Total amount moved in one direction.
    pub fn total(&self, direction: LoopDirection) -> Amount {
        self.steps
            .iter()
            .filter(|s| s.direction == direction)
            .fold(Amount::ZERO, |acc, s| acc + s.amount)
    }

    /// Append the steps of a follow-up plan; its remaining gap and
    /// iteration count replace ours.
    pub fn append(&mut self, next: LoopPlan) {
        self.steps.extend(next.steps);
        self.remaining = next.remaining;
        self.iterations = next.iterations;
    }

    /// Outcome of the executed plan; `Unchanged` when no step ran.
    pub fn outcome(&self, min_want: Amount) -> LoopOutcome {
        if self.steps.is_empty() {
            LoopOutcome::Unchanged
        } else {
            LoopOutcome::from_remaining(self.iterations, self.remaining, min_want)
        }
    }
}

/// Result of a bounded leverage or deleverage loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum LoopOutcome {
    /// Nothing to do: already within tolerance or below dust.
    Unchanged,
    /// Reached the target within `min_want`.
    Converged { iterations: u8 },
    /// Iteration cap or market capacity hit before the target.
    PartialConvergence { iterations: u8, remaining: Amount },
}

impl LoopOutcome {
    pub fn from_remaining(iterations: u8, remaining: Amount, min_want: Amount) -> Self {
        if remaining <= min_want {
            Self::Converged { iterations }
        } else {
            Self::PartialConvergence {
                iterations,
                remaining,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_supply_saturates() {
        let p = Position::new(U256::from(100u64), U256::from(150u64));
        assert_eq!(p.net_supply(), U256::ZERO);
        let p = Position::new(U256::from(150u64), U256::from(100u64));
        assert_eq!(p.net_supply(), U256::from(50u64));
    }

    #[test]
    fn test_plan_skips_zero_steps() {
        let mut plan = LoopPlan::default();
        plan.push(LoopDirection::Supply, U256::ZERO);
        plan.push(LoopDirection::Borrow, U256::from(5u64));
        plan.push(LoopDirection::Borrow, U256::from(7u64));
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.total(LoopDirection::Borrow), U256::from(12u64));
    }

    #[test]
    fn test_empty_plan_is_unchanged() {
        let plan = LoopPlan {
            remaining: U256::from(1_000u64),
            ..Default::default()
        };
        assert_eq!(plan.outcome(U256::from(100u64)), LoopOutcome::Unchanged);
    }

    #[test]
    fn test_outcome_from_remaining() {
        let dust = U256::from(100u64);
        assert_eq!(
            LoopOutcome::from_remaining(3, U256::from(99u64), dust),
            LoopOutcome::Converged { iterations: 3 }
        );
        assert!(matches!(
            LoopOutcome::from_remaining(6, U256::from(101u64), dust),
            LoopOutcome::PartialConvergence { .. }
        ));
    }
}
