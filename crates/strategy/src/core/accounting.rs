//! Profit / loss accounting for harvest reports and vault withdrawals.

use tracing::{debug, info};

use crate::core::deleverage::free_funds;
use crate::core::position::{idle_want, read_position};
use crate::core::rewards::estimated_rewards_in_want;
use crate::core::settings::LoopContext;
use crate::errors::StrategyResult;
use crate::execution::Venue;
use crate::types::{Amount, HarvestReport, Liquidation, SwapRouterKind};

/// Idle want plus net supply. Rewards are not counted.
pub fn realizable_assets<V: Venue>(venue: &V, ctx: &LoopContext) -> Amount {
    idle_want(venue, ctx.account, ctx.want) + read_position(venue, ctx.account, ctx.want).net_supply()
}

/// Realizable assets plus held and pending rewards at the router quote.
pub fn estimated_total_assets<V: Venue>(venue: &V, ctx: &LoopContext, router: SwapRouterKind) -> Amount {
    realizable_assets(venue, ctx) + estimated_rewards_in_want(venue, ctx.account, ctx.want, router)
}

/// Free up to `amount_needed` of want.
///
/// Loss is recognized only when the shortfall is at or below `min_want`;
/// a larger shortfall means the position could not be unwound far enough
/// this time, not that value was lost.
pub fn liquidate_position<V: Venue>(
    venue: &mut V,
    ctx: &LoopContext,
    amount_needed: Amount,
) -> StrategyResult<Liquidation> {
    let idle = idle_want(venue, ctx.account, ctx.want);
    if idle >= amount_needed {
        return Ok(Liquidation {
            liquidated: amount_needed,
            loss: Amount::ZERO,
        });
    }

    free_funds(venue, ctx, amount_needed - idle)?;
    let free = idle_want(venue, ctx.account, ctx.want);
    if free >= amount_needed {
        return Ok(Liquidation {
            liquidated: amount_needed,
            loss: Amount::ZERO,
        });
    }

    let shortfall = amount_needed - free;
    let loss = if shortfall <= ctx.policy.min_want {
        shortfall
    } else {
        Amount::ZERO
    };
    debug!(needed = %amount_needed, freed = %free, loss = %loss, "partial liquidation");
    Ok(Liquidation {
        liquidated: free,
        loss,
    })
}

/// Compute profit, loss and debt payment, freeing want so that
/// `debt_outstanding + profit` is idle when possible.
///
/// Pending rewards are valued at zero; only sold rewards count. Loss is
/// never netted against profit.
pub fn prepare_return<V: Venue>(
    venue: &mut V,
    ctx: &LoopContext,
    debt_outstanding: Amount,
) -> StrategyResult<HarvestReport> {
    let total_debt = venue.strategy_params(ctx.account)?.total_debt;
    let total_assets = realizable_assets(venue, ctx);

    let mut report = HarvestReport::default();
    if total_debt > total_assets {
        report.loss = total_debt - total_assets;
    } else {
        report.profit = total_assets - total_debt;
    }

    let required = debt_outstanding + report.profit;
    let idle = idle_want(venue, ctx.account, ctx.want);
    if required <= idle {
        report.debt_payment = debt_outstanding;
    } else {
        let available = liquidate_position(venue, ctx, required)?.liquidated;
        if available >= required {
            report.debt_payment = debt_outstanding;
        } else if available < debt_outstanding {
            // Remaining profit stays in the position for the next harvest.
            report.profit = Amount::ZERO;
            report.debt_payment = available;
        } else {
            report.debt_payment = debt_outstanding;
            report.profit = available - debt_outstanding;
        }
    }

    info!(
        total_assets = %total_assets,
        total_debt = %total_debt,
        profit = %report.profit,
        loss = %report.loss,
        debt_payment = %report.debt_payment,
        "harvest accounting"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::leverage::lever_max;
    use crate::core::settings::StrategySettings;
    use crate::execution::{PaperVenue, PaperVenueConfig, RewardsController, TokenLedger, Vault};
    use crate::types::{CollateralTargets, HarvestReport, Wad};
    use alloy_primitives::{Address, U256};
    use rust_decimal_macros::dec;

    const STRAT: Address = Address::repeat_byte(0x55);
    const USER: Address = Address::repeat_byte(0x77);

    fn amt(v: u64) -> U256 {
        U256::from(v)
    }

    /// Vault lends 1M; strategy levers it to 0.6.
    fn funded() -> (PaperVenue, LoopContext) {
        let mut venue = PaperVenue::new(PaperVenueConfig::default());
        let want = venue.config().want;
        venue.mint(want, USER, amt(1_000_000));
        venue.deposit(USER, amt(1_000_000)).unwrap();
        venue.add_strategy(STRAT, 10_000).unwrap();
        venue.report_harvest(STRAT, HarvestReport::default()).unwrap();

        let settings = StrategySettings::new(CollateralTargets {
            target_ratio: Wad::from_decimal(dec!(0.6)).unwrap(),
            max_ratio: Wad::from_decimal(dec!(0.7)).unwrap(),
            max_borrow_ratio: Wad::from_decimal(dec!(0.745)).unwrap(),
        });
        let ctx = LoopContext::new(STRAT, want, &settings);
        lever_max(&mut venue, &ctx, U256::ZERO).unwrap();
        (venue, ctx)
    }

    #[test]
    fn test_liquidate_from_idle() {
        let (mut venue, ctx) = funded();
        venue.mint(ctx.want, STRAT, amt(5_000));
        let out = liquidate_position(&mut venue, &ctx, amt(5_000)).unwrap();
        assert_eq!(out, Liquidation { liquidated: amt(5_000), loss: U256::ZERO });
    }

    #[test]
    fn test_liquidate_frees_from_position() {
        let (mut venue, ctx) = funded();
        let out = liquidate_position(&mut venue, &ctx, amt(250_000)).unwrap();
        assert!(out.loss.is_zero());
        // Flash fee comes out of collateral, so a couple of units may be short.
        assert!(out.liquidated + amt(4) >= amt(250_000));
        assert!(out.liquidated <= amt(250_000));
    }

    #[test]
    fn test_liquidate_everything() {
        let (mut venue, ctx) = funded();
        let out = liquidate_position(&mut venue, &ctx, U256::MAX).unwrap();
        assert!(out.loss.is_zero());
        assert!(out.liquidated > amt(999_990));
        assert!(read_position(&venue, ctx.account, ctx.want).is_empty());
    }

    #[test]
    fn test_prepare_return_reports_loss_without_profit() {
        let (mut venue, ctx) = funded();
        venue.slash_deposits(STRAT, amt(10_000));
        let report = prepare_return(&mut venue, &ctx, U256::ZERO).unwrap();
        assert!(report.profit.is_zero());
        assert!(report.loss >= amt(10_000));
        assert!(report.debt_payment.is_zero());
    }

    #[test]
    fn test_prepare_return_frees_debt_and_profit() {
        let (mut venue, ctx) = funded();
        venue.mint(ctx.want, STRAT, amt(20_000));
        venue.update_debt_ratio(STRAT, 5_000).unwrap();
        let outstanding = venue.debt_outstanding(STRAT);

        let report = prepare_return(&mut venue, &ctx, outstanding).unwrap();
        assert_eq!(report.debt_payment, outstanding);
        assert!(report.loss.is_zero());
        assert!(venue.balance_of(ctx.want, STRAT) >= report.profit + report.debt_payment);
    }

    #[test]
    fn test_estimated_total_assets_counts_rewards() {
        let (mut venue, ctx) = funded();
        let base = estimated_total_assets(&venue, &ctx, SwapRouterKind::UniswapV2);
        venue.mint(venue.reward_token(), STRAT, amt(1_000));
        let with_rewards = estimated_total_assets(&venue, &ctx, SwapRouterKind::UniswapV2);
        assert_eq!(with_rewards, base + amt(2_000));
        assert_eq!(realizable_assets(&venue, &ctx), base);
    }
}
