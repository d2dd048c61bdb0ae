//! Default harvest sanity bound.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LOSS_LIMIT_BPS, DEFAULT_PROFIT_LIMIT_BPS, MAX_BPS};
use crate::execution::HealthCheck;
use crate::types::{Amount, HarvestReport};

/// Rejects reports whose profit or loss exceeds a share of total debt.
///
/// Limits are basis points of the strategy's total debt before the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonHealthCheck {
    pub profit_limit_bps: u64,
    pub loss_limit_bps: u64,
}

impl Default for CommonHealthCheck {
    fn default() -> Self {
        Self {
            profit_limit_bps: DEFAULT_PROFIT_LIMIT_BPS,
            loss_limit_bps: DEFAULT_LOSS_LIMIT_BPS,
        }
    }
}

impl CommonHealthCheck {
    fn limit(total_debt: Amount, bps: u64) -> Amount {
        total_debt.saturating_mul(U256::from(bps)) / U256::from(MAX_BPS)
    }
}

impl HealthCheck for CommonHealthCheck {
    fn check(&self, report: &HarvestReport, _debt_outstanding: Amount, total_debt: Amount) -> bool {
        if report.profit > Self::limit(total_debt, self.profit_limit_bps) {
            return false;
        }
        report.loss <= Self::limit(total_debt, self.loss_limit_bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(v: u64) -> U256 {
        U256::from(v)
    }

    fn report(profit: u64, loss: u64) -> HarvestReport {
        HarvestReport {
            profit: amt(profit),
            loss: amt(loss),
            debt_payment: U256::ZERO,
        }
    }

    #[test]
    fn test_default_limits() {
        let hc = CommonHealthCheck::default();
        let debt = amt(1_000_000);
        // 1% profit, 0.01% loss.
        assert!(hc.check(&report(10_000, 0), U256::ZERO, debt));
        assert!(!hc.check(&report(10_001, 0), U256::ZERO, debt));
        assert!(hc.check(&report(0, 100), U256::ZERO, debt));
        assert!(!hc.check(&report(0, 101), U256::ZERO, debt));
    }

    #[test]
    fn test_empty_report_always_passes() {
        let hc = CommonHealthCheck::default();
        assert!(hc.check(&HarvestReport::default(), U256::ZERO, U256::ZERO));
    }
}
