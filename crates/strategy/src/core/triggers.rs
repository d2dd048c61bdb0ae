//! Keeper-facing predicates. Read-only: they take shared references and
//! cannot move funds.

use alloy_primitives::{Address, U256};

use crate::constants::LIQUIDATION_WARNING_THRESHOLD;
use crate::core::accounting::estimated_total_assets;
use crate::core::position::read_position;
use crate::core::ratio::current_ratio;
use crate::core::settings::{LoopContext, StrategySettings};
use crate::execution::Venue;
use crate::types::{Amount, Wad};

/// Whether a harvest is worth calling now at `call_cost` (want units).
pub fn harvest_trigger<V: Venue>(
    venue: &V,
    account: Address,
    want: Address,
    settings: &StrategySettings,
    call_cost: Amount,
) -> bool {
    let Ok(params) = venue.strategy_params(account) else {
        return false;
    };
    if params.activation == 0 {
        return false;
    }

    let report = &settings.report;
    let since_report = venue.now().saturating_sub(params.last_report);
    if since_report < report.min_report_delay {
        return false;
    }
    if since_report >= report.max_report_delay {
        return true;
    }

    if venue.debt_outstanding(account) > report.debt_threshold {
        return true;
    }

    let ctx = LoopContext::new(account, want, settings);
    let total = estimated_total_assets(venue, &ctx, settings.rewards.router);
    if total + report.debt_threshold < params.total_debt {
        return true;
    }

    let profit = total.saturating_sub(params.total_debt);
    let credit = venue.credit_available(account);
    U256::from(report.profit_factor).saturating_mul(call_cost) < credit + profit
}

/// Whether the position should be rebalanced without a report: off target
/// by more than `min_ratio`, or close to liquidation. Defers to harvest.
pub fn tend_trigger<V: Venue>(
    venue: &V,
    account: Address,
    want: Address,
    settings: &StrategySettings,
    call_cost: Amount,
) -> bool {
    if harvest_trigger(venue, account, want, settings, call_cost) {
        return false;
    }

    let position = read_position(venue, account, want);
    if position.deposits.is_zero() {
        return false;
    }

    let ratio = current_ratio(&position);
    let threshold = venue.account_data(account, want).liquidation_threshold;
    if ratio >= threshold || threshold.saturating_sub(ratio) <= Wad::from_u64(LIQUIDATION_WARNING_THRESHOLD) {
        return true;
    }

    ratio.abs_diff(settings.targets.target_ratio) > settings.loop_policy.min_ratio
}
