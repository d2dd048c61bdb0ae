//! Deleverage engine: repay and withdraw loop, manual unwinds, full exit.

use tracing::{debug, info, warn};

use crate::core::position::{idle_want, read_position};
use crate::core::ratio;
use crate::core::settings::LoopContext;
use crate::errors::{StrategyError, StrategyResult};
use crate::execution::Venue;
use crate::types::{Amount, LoopDirection, LoopOutcome, LoopPlan, Position, Wad};

/// Reduce borrows to `new_borrow`, then top deposits back up toward
/// `borrows / target_ratio` from idle want.
pub fn lever_down_to<V: Venue>(venue: &mut V, ctx: &LoopContext, new_borrow: Amount) -> StrategyResult<LoopPlan> {
    let position = read_position(venue, ctx.account, ctx.want);
    let mut plan = LoopPlan::default();

    if position.borrows > new_borrow {
        plan.remaining = position.borrows - new_borrow;

        if ctx.policy.flash_loans_active {
            let repaid = lever_down_flash(venue, ctx, plan.remaining, &mut plan)?;
            if !repaid.is_zero() {
                plan.remaining -= repaid;
                plan.iterations += 1;
            }
        }

        let mut rounds = 0u8;
        while rounds < ctx.policy.max_iterations && plan.remaining > ctx.policy.min_want {
            let to_repay = plan.remaining.min(idle_want(venue, ctx.account, ctx.want));
            let repaid = if to_repay.is_zero() {
                Amount::ZERO
            } else {
                venue.repay(ctx.account, ctx.want, to_repay)?
            };
            plan.push(LoopDirection::Repay, repaid);
            plan.remaining -= repaid;

            let withdrawn = withdraw_excess_collateral(venue, ctx, ctx.targets.max_ratio, &mut plan)?;
            rounds += 1;
            plan.iterations += 1;
            debug!(round = rounds, repaid = %repaid, withdrawn = %withdrawn, "lever down step");

            if repaid.is_zero() && withdrawn.is_zero() {
                break;
            }
        }
    }

    let position = read_position(venue, ctx.account, ctx.want);
    let target_deposit = ratio::theoretical_max_deposit(position.borrows, ctx.targets.target_ratio)?;
    if target_deposit > position.deposits {
        let to_deposit = target_deposit - position.deposits;
        if to_deposit > ctx.policy.min_want {
            let amount = to_deposit.min(idle_want(venue, ctx.account, ctx.want));
            if !amount.is_zero() {
                venue.supply(ctx.account, ctx.want, amount)?;
                plan.push(LoopDirection::Supply, amount);
            }
        }
    }

    log_outcome(venue, ctx, &plan, "delevered position");
    Ok(plan)
}

/// Flash borrow up to `amount`, repay debt with it, withdraw principal + fee
/// and settle the loan. Returns the debt repaid.
fn lever_down_flash<V: Venue>(
    venue: &mut V,
    ctx: &LoopContext,
    amount: Amount,
    plan: &mut LoopPlan,
) -> StrategyResult<Amount> {
    if amount <= ctx.policy.min_want {
        return Ok(Amount::ZERO);
    }
    let position = read_position(venue, ctx.account, ctx.want);
    let principal = amount
        .min(position.borrows)
        .min(venue.max_flash_loan(ctx.want));
    if principal.is_zero() {
        return Ok(Amount::ZERO);
    }
    let fee = venue.flash_fee(ctx.want, principal);
    let owed = principal + fee;

    let required = ratio::min_collateral(position.borrows - principal, ctx.targets.max_borrow_ratio)?;
    let available = position.deposits.saturating_sub(required);
    if available < owed {
        return Err(StrategyError::InsufficientLoopLiquidity {
            principal,
            fee,
            available,
        });
    }

    let loan = venue.flash_borrow(ctx.account, ctx.want, principal)?;
    venue.repay(ctx.account, ctx.want, principal)?;
    venue.withdraw(ctx.account, ctx.want, owed)?;
    venue.flash_repay(loan)?;

    plan.push(LoopDirection::Repay, principal);
    plan.push(LoopDirection::Withdraw, owed);
    debug!(principal = %principal, fee = %fee, "flash lever down");
    Ok(principal)
}

/// Withdraw deposits above what `borrows` needs at `ratio`. With no
/// borrows that is every deposit.
pub fn withdraw_excess_collateral<V: Venue>(
    venue: &mut V,
    ctx: &LoopContext,
    ratio: Wad,
    plan: &mut LoopPlan,
) -> StrategyResult<Amount> {
    let position = read_position(venue, ctx.account, ctx.want);
    let required = ratio::min_collateral(position.borrows, ratio)?;
    if position.deposits <= required {
        return Ok(Amount::ZERO);
    }
    let withdrawn = venue.withdraw(ctx.account, ctx.want, position.deposits - required)?;
    plan.push(LoopDirection::Withdraw, withdrawn);
    Ok(withdrawn)
}

/// Shrink net supply by `amount` while keeping the target ratio, leaving the
/// freed want idle.
pub fn free_funds<V: Venue>(venue: &mut V, ctx: &LoopContext, amount: Amount) -> StrategyResult<LoopPlan> {
    if amount.is_zero() {
        return Ok(LoopPlan::default());
    }
    let position = read_position(venue, ctx.account, ctx.want);
    let real = position.net_supply();
    let new_supply = real - amount.min(real);
    let new_borrow = ratio::borrow_from_supply(new_supply, ctx.targets.target_ratio)?;
    let idle_before = idle_want(venue, ctx.account, ctx.want);

    let mut plan = lever_down_to(venue, ctx, new_borrow)?;

    // An under-levered position frees nothing through the loop.
    let freed = idle_want(venue, ctx.account, ctx.want).saturating_sub(idle_before);
    if freed < amount {
        let position = read_position(venue, ctx.account, ctx.want);
        let take = (amount - freed).min(ratio::unencumbered(&position, ctx.targets.max_ratio)?);
        if !take.is_zero() {
            let withdrawn = venue.withdraw(ctx.account, ctx.want, take)?;
            plan.push(LoopDirection::Withdraw, withdrawn);
        }
    }
    Ok(plan)
}

/// Unwind to zero borrows and withdraw every deposit. Residual borrows at
/// or below `min_want` are repaid from idle want.
pub fn deleverage_to_zero<V: Venue>(venue: &mut V, ctx: &LoopContext) -> StrategyResult<LoopPlan> {
    let mut plan = lever_down_to(venue, ctx, Amount::ZERO)?;

    let position = read_position(venue, ctx.account, ctx.want);
    if !position.borrows.is_zero() && position.borrows <= ctx.policy.min_want {
        withdraw_excess_collateral(venue, ctx, ctx.targets.max_ratio, &mut plan)?;
        let dust = position.borrows.min(idle_want(venue, ctx.account, ctx.want));
        if !dust.is_zero() {
            let repaid = venue.repay(ctx.account, ctx.want, dust)?;
            plan.push(LoopDirection::Repay, repaid);
        }
    }
    withdraw_excess_collateral(venue, ctx, ctx.targets.max_ratio, &mut plan)?;

    let after = read_position(venue, ctx.account, ctx.want);
    plan.remaining = after.borrows;
    if plan.remaining > ctx.policy.min_want {
        warn!(
            borrows = %after.borrows,
            deposits = %after.deposits,
            "unwind left borrows outstanding"
        );
    } else {
        info!(deposits = %after.deposits, borrows = %after.borrows, "position unwound");
    }
    Ok(plan)
}

// ---------------------------------------------------------------------------
// Manual operations
// ---------------------------------------------------------------------------

fn is_dust(position: &Position, ctx: &LoopContext) -> bool {
    position.borrows.is_zero() && position.deposits <= ctx.policy.min_want
}

/// Ratio after removing `amount` of deposits; unbounded when nothing would
/// back outstanding borrows.
fn ratio_after_withdraw(position: &Position, amount: Amount) -> Wad {
    let remaining = position.deposits.saturating_sub(amount);
    if remaining.is_zero() && !position.borrows.is_zero() {
        return Wad::from_raw(Amount::MAX);
    }
    ratio::ratio_of(remaining, position.borrows)
}

/// Withdraw `amount` of collateral and repay the same amount of debt.
///
/// `amount` is clamped to outstanding borrows. Fails with
/// `ExceedsAvailableCollateral` if the withdrawal alone would push the ratio
/// above `max_borrow_ratio`.
pub fn manual_deleverage<V: Venue>(venue: &mut V, ctx: &LoopContext, amount: Amount) -> StrategyResult<LoopPlan> {
    let position = read_position(venue, ctx.account, ctx.want);
    let mut plan = LoopPlan::default();
    if is_dust(&position, ctx) {
        return Ok(plan);
    }
    let amount = amount.min(position.borrows);
    if amount.is_zero() {
        return Ok(plan);
    }

    let resulting_ratio = ratio_after_withdraw(&position, amount);
    if resulting_ratio > ctx.targets.max_borrow_ratio {
        return Err(StrategyError::ExceedsAvailableCollateral {
            requested: amount,
            resulting_ratio,
            max_ratio: ctx.targets.max_borrow_ratio,
        });
    }

    let withdrawn = venue.withdraw(ctx.account, ctx.want, amount)?;
    plan.push(LoopDirection::Withdraw, withdrawn);
    let repaid = venue.repay(ctx.account, ctx.want, withdrawn)?;
    plan.push(LoopDirection::Repay, repaid);
    plan.iterations = 1;

    let after = read_position(venue, ctx.account, ctx.want);
    plan.remaining = after.borrows;
    info!(
        repaid = %repaid,
        borrows = %after.borrows,
        ratio = %ratio::current_ratio(&after),
        "manual deleverage"
    );
    Ok(plan)
}

/// Withdraw collateral not backing borrows at `max_borrow_ratio`. Returns
/// the amount withdrawn.
pub fn manual_release_want<V: Venue>(venue: &mut V, ctx: &LoopContext, amount: Amount) -> StrategyResult<Amount> {
    let position = read_position(venue, ctx.account, ctx.want);
    if is_dust(&position, ctx) || amount.is_zero() {
        return Ok(Amount::ZERO);
    }

    let free = ratio::unencumbered(&position, ctx.targets.max_borrow_ratio)?;
    if amount > free {
        return Err(StrategyError::ExceedsAvailableCollateral {
            requested: amount,
            resulting_ratio: ratio_after_withdraw(&position, amount),
            max_ratio: ctx.targets.max_borrow_ratio,
        });
    }

    let withdrawn = venue.withdraw(ctx.account, ctx.want, amount)?;
    info!(withdrawn = %withdrawn, "manual want release");
    Ok(withdrawn)
}

fn log_outcome<V: Venue>(venue: &V, ctx: &LoopContext, plan: &LoopPlan, message: &'static str) {
    let after = read_position(venue, ctx.account, ctx.want);
    match plan.outcome(ctx.policy.min_want) {
        LoopOutcome::Unchanged => {}
        LoopOutcome::PartialConvergence { iterations, remaining } => warn!(
            iterations,
            remaining = %remaining,
            ratio = %ratio::current_ratio(&after),
            "deleverage loop stopped before target"
        ),
        LoopOutcome::Converged { iterations } => info!(
            iterations,
            flash = ctx.policy.flash_loans_active,
            deposits = %after.deposits,
            borrows = %after.borrows,
            ratio = %ratio::current_ratio(&after),
            "{}",
            message
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::leverage::lever_max;
    use crate::core::settings::{LoopPolicy, StrategySettings};
    use crate::execution::{LendingMarket, PaperVenue, PaperVenueConfig, TokenLedger};
    use crate::types::CollateralTargets;
    use alloy_primitives::{Address, U256};
    use rust_decimal_macros::dec;

    const STRAT: Address = Address::repeat_byte(0x55);

    fn amt(v: u64) -> U256 {
        U256::from(v)
    }

    /// 1M supplied and levered to 2.5M deposits / 1.5M borrows.
    fn levered(flash: bool) -> (PaperVenue, LoopContext) {
        let mut venue = PaperVenue::new(PaperVenueConfig::default());
        let want = venue.config().want;
        venue.mint(want, STRAT, amt(1_000_000));
        let targets = CollateralTargets {
            target_ratio: Wad::from_decimal(dec!(0.6)).unwrap(),
            max_ratio: Wad::from_decimal(dec!(0.7)).unwrap(),
            max_borrow_ratio: Wad::from_decimal(dec!(0.745)).unwrap(),
        };
        let mut settings = StrategySettings::new(targets);
        settings.loop_policy = LoopPolicy {
            flash_loans_active: false,
            ..Default::default()
        };
        let ctx = LoopContext::new(STRAT, want, &settings);
        lever_max(&mut venue, &ctx, U256::ZERO).unwrap();

        let mut ctx = ctx;
        ctx.policy.flash_loans_active = flash;
        (venue, ctx)
    }

    fn position(venue: &PaperVenue, ctx: &LoopContext) -> Position {
        read_position(venue, ctx.account, ctx.want)
    }

    #[test]
    fn test_iterative_unwind_to_zero() {
        let (mut venue, ctx) = levered(false);
        let plan = deleverage_to_zero(&mut venue, &ctx).unwrap();

        assert!(matches!(plan.outcome(ctx.policy.min_want), LoopOutcome::Converged { .. }));
        assert!(position(&venue, &ctx).is_empty());
        assert_eq!(venue.balance_of(ctx.want, STRAT), amt(1_000_000));
    }

    #[test]
    fn test_flash_unwind_costs_only_the_fee() {
        let (mut venue, ctx) = levered(true);
        let plan = deleverage_to_zero(&mut venue, &ctx).unwrap();

        assert_eq!(plan.total(LoopDirection::Repay), amt(1_500_000));
        assert!(position(&venue, &ctx).is_empty());
        assert_eq!(venue.balance_of(ctx.want, STRAT), amt(999_998));
    }

    #[test]
    fn test_iterative_unwind_partial_with_one_round() {
        let (mut venue, mut ctx) = levered(false);
        ctx.policy.max_iterations = 1;
        let plan = lever_down_to(&mut venue, &ctx, U256::ZERO).unwrap();

        assert!(matches!(
            plan.outcome(ctx.policy.min_want),
            LoopOutcome::PartialConvergence { .. }
        ));
        let after = position(&venue, &ctx);
        assert!(ratio::current_ratio(&after) <= ctx.targets.max_borrow_ratio);
    }

    #[test]
    fn test_free_funds_keeps_target_ratio() {
        let (mut venue, ctx) = levered(false);
        free_funds(&mut venue, &ctx, amt(400_000)).unwrap();

        let after = position(&venue, &ctx);
        assert_eq!(venue.balance_of(ctx.want, STRAT), amt(400_000));
        assert_eq!(after.net_supply(), amt(600_000));
        let current = ratio::current_ratio(&after);
        assert!(ratio::within_tolerance(current, ctx.targets.target_ratio, ctx.policy.min_ratio));
    }

    #[test]
    fn test_free_funds_without_borrows() {
        let mut venue = PaperVenue::new(PaperVenueConfig::default());
        let (_, ctx) = levered(false);
        venue.mint(ctx.want, STRAT, amt(1_000));
        venue.supply(STRAT, ctx.want, amt(1_000)).unwrap();

        free_funds(&mut venue, &ctx, amt(300)).unwrap();
        assert_eq!(venue.balance_of(ctx.want, STRAT), amt(300));
        assert_eq!(position(&venue, &ctx).deposits, amt(700));
    }

    #[test]
    fn test_manual_deleverage_bounds() {
        let (mut venue, ctx) = levered(false);
        let before = position(&venue, &ctx);

        // 1.5M / 0.745 = 2_013_423.. so anything above ~486k is too much.
        let err = manual_deleverage(&mut venue, &ctx, amt(500_000)).unwrap_err();
        assert!(matches!(err, StrategyError::ExceedsAvailableCollateral { .. }));
        assert_eq!(position(&venue, &ctx), before);

        manual_deleverage(&mut venue, &ctx, amt(400_000)).unwrap();
        let after = position(&venue, &ctx);
        assert_eq!(after.borrows, amt(1_100_000));
        assert_eq!(after.deposits, amt(2_100_000));
    }

    #[test]
    fn test_manual_release_want_bounds() {
        let (mut venue, ctx) = levered(false);
        let free = ratio::unencumbered(&position(&venue, &ctx), ctx.targets.max_borrow_ratio).unwrap();

        let err = manual_release_want(&mut venue, &ctx, free + amt(1)).unwrap_err();
        assert!(matches!(err, StrategyError::ExceedsAvailableCollateral { .. }));

        assert_eq!(manual_release_want(&mut venue, &ctx, free).unwrap(), free);
        let after = position(&venue, &ctx);
        assert!(ratio::current_ratio(&after) <= ctx.targets.max_borrow_ratio);
    }

    #[test]
    fn test_manual_ops_on_dust_are_noops() {
        let mut venue = PaperVenue::new(PaperVenueConfig::default());
        let (_, ctx) = levered(false);
        venue.mint(ctx.want, STRAT, amt(50));
        venue.supply(STRAT, ctx.want, amt(50)).unwrap();
        let before = position(&venue, &ctx);

        for _ in 0..3 {
            let plan = manual_deleverage(&mut venue, &ctx, amt(1_000)).unwrap();
            assert_eq!(plan.outcome(ctx.policy.min_want), LoopOutcome::Unchanged);
            assert_eq!(manual_release_want(&mut venue, &ctx, amt(1_000)).unwrap(), U256::ZERO);
        }
        assert_eq!(position(&venue, &ctx), before);
    }
}
