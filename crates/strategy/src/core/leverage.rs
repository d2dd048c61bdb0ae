//! Leverage engine: deposit and borrow loop toward `target_ratio`.
//!
//! Flash path: one unfunded step, then a single flash loan for the rest of
//! the gap. Iterative path: at most `max_iterations` deposit/borrow rounds.
//! Each round is capped by both the remaining gap and `max_borrow_ratio`, so
//! the ratio only ever moves toward the target.

use tracing::{debug, info, warn};

use crate::core::position::{idle_want, read_position};
use crate::core::ratio;
use crate::core::settings::LoopContext;
use crate::errors::{StrategyError, StrategyResult};
use crate::execution::Venue;
use crate::types::{Amount, LoopDirection, LoopOutcome, LoopPlan};

/// Lever the position up to `target_ratio`, keeping `reserved` want idle.
pub fn lever_max<V: Venue>(venue: &mut V, ctx: &LoopContext, reserved: Amount) -> StrategyResult<LoopPlan> {
    let position = read_position(venue, ctx.account, ctx.want);
    let supply = position.net_supply() + deployable(venue, ctx, reserved);
    let target_borrow = ratio::borrow_from_supply(supply, ctx.targets.target_ratio)?;

    let mut plan = LoopPlan::default();
    if target_borrow <= position.borrows + ctx.policy.min_want {
        return Ok(plan);
    }
    plan.remaining = target_borrow - position.borrows;

    if ctx.policy.flash_loans_active {
        let borrowed = lever_up_step(venue, ctx, reserved, plan.remaining, &mut plan)?;
        plan.remaining -= borrowed;
        plan.iterations += 1;
        if plan.remaining > ctx.policy.min_want {
            let funded = lever_up_flash(venue, ctx, reserved, plan.remaining, &mut plan)?;
            plan.remaining -= funded;
            plan.iterations += 1;
        }
    } else {
        while plan.iterations < ctx.policy.max_iterations && plan.remaining > ctx.policy.min_want {
            let borrowed = lever_up_step(venue, ctx, reserved, plan.remaining, &mut plan)?;
            if borrowed.is_zero() {
                break;
            }
            plan.remaining -= borrowed;
            plan.iterations += 1;
        }
    }

    // Trailing borrowed want goes back in as collateral.
    let trailing = deployable(venue, ctx, reserved);
    if !trailing.is_zero() {
        venue.supply(ctx.account, ctx.want, trailing)?;
        plan.push(LoopDirection::Supply, trailing);
    }

    let after = read_position(venue, ctx.account, ctx.want);
    match plan.outcome(ctx.policy.min_want) {
        LoopOutcome::PartialConvergence { iterations, remaining } => warn!(
            iterations,
            remaining = %remaining,
            ratio = %ratio::current_ratio(&after),
            target = %ctx.targets.target_ratio,
            "leverage loop stopped before target"
        ),
        outcome => info!(
            ?outcome,
            flash = ctx.policy.flash_loans_active,
            deposits = %after.deposits,
            borrows = %after.borrows,
            ratio = %ratio::current_ratio(&after),
            "leveraged position"
        ),
    }
    Ok(plan)
}

/// Idle want available to deploy.
fn deployable<V: Venue>(venue: &V, ctx: &LoopContext, reserved: Amount) -> Amount {
    idle_want(venue, ctx.account, ctx.want).saturating_sub(reserved)
}

/// Supply idle want, then borrow up to `amount` within `max_borrow_ratio`.
/// Returns the amount borrowed.
fn lever_up_step<V: Venue>(
    venue: &mut V,
    ctx: &LoopContext,
    reserved: Amount,
    amount: Amount,
    plan: &mut LoopPlan,
) -> StrategyResult<Amount> {
    if amount.is_zero() {
        return Ok(Amount::ZERO);
    }
    let idle = deployable(venue, ctx, reserved);
    let position = read_position(venue, ctx.account, ctx.want);
    let capacity = ratio::borrow_from_deposit(position.deposits + idle, ctx.targets.max_borrow_ratio)?;
    if capacity <= position.borrows {
        return Ok(Amount::ZERO);
    }
    let borrow = (capacity - position.borrows).min(amount);

    if !idle.is_zero() {
        venue.supply(ctx.account, ctx.want, idle)?;
        plan.push(LoopDirection::Supply, idle);
    }
    venue.borrow(ctx.account, ctx.want, borrow)?;
    plan.push(LoopDirection::Borrow, borrow);

    debug!(supplied = %idle, borrowed = %borrow, "lever up step");
    Ok(borrow)
}

/// Flash borrow the remaining gap, supply it with all idle want, borrow
/// principal + fee and repay the lender. Returns the principal.
fn lever_up_flash<V: Venue>(
    venue: &mut V,
    ctx: &LoopContext,
    reserved: Amount,
    amount: Amount,
    plan: &mut LoopPlan,
) -> StrategyResult<Amount> {
    let principal = amount.min(venue.max_flash_loan(ctx.want));
    if principal <= ctx.policy.min_want {
        return Ok(Amount::ZERO);
    }
    let fee = venue.flash_fee(ctx.want, principal);
    let owed = principal + fee;

    let position = read_position(venue, ctx.account, ctx.want);
    let idle = deployable(venue, ctx, reserved);
    let deposits_after = position.deposits + idle + principal;
    let available = ratio::borrow_from_deposit(deposits_after, ctx.targets.max_borrow_ratio)?
        .saturating_sub(position.borrows);
    if available < owed {
        return Err(StrategyError::InsufficientLoopLiquidity {
            principal,
            fee,
            available,
        });
    }

    let loan = venue.flash_borrow(ctx.account, ctx.want, principal)?;
    venue.supply(ctx.account, ctx.want, idle + principal)?;
    venue.borrow(ctx.account, ctx.want, owed)?;
    venue.flash_repay(loan)?;

    plan.push(LoopDirection::Supply, idle + principal);
    plan.push(LoopDirection::Borrow, owed);
    debug!(principal = %principal, fee = %fee, "flash lever up");
    Ok(principal)
}
