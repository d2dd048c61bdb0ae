//! Ratio calculator: pure fixed-point helpers.
//!
//! No external calls and no state. Every ratio is WAD-scaled (1e18 = 100%),
//! every division rounds toward zero, and out-of-range inputs fail with
//! `InvalidTarget` or `MathOverflow` instead of saturating.

use alloy_primitives::{I256, U256};

use crate::constants::{DEFAULT_COLLAT_MAX_MARGIN, DEFAULT_COLLAT_TARGET_MARGIN, WAD};
use crate::errors::{StrategyError, StrategyResult};
use crate::execution::ReserveConfig;
use crate::types::{Amount, CollateralTargets, Position, Wad};

/// `a * b / c` rounded down. Falls back to a quotient/remainder split when
/// `a * b` overflows, so the result is exact whenever it fits in 256 bits.
pub fn mul_div(a: U256, b: U256, c: U256) -> Option<U256> {
    if c.is_zero() {
        return None;
    }
    if let Some(product) = a.checked_mul(b) {
        return Some(product / c);
    }
    let q = a / c;
    let r = a % c;
    let head = q.checked_mul(b)?;
    let tail = r.checked_mul(b)? / c;
    head.checked_add(tail)
}

fn mul_div_checked(a: U256, b: U256, c: U256, context: &'static str) -> StrategyResult<U256> {
    mul_div(a, b, c).ok_or(StrategyError::MathOverflow { context })
}

// ---------------------------------------------------------------------------
// Ratios
// ---------------------------------------------------------------------------

/// `borrows / deposits`, zero when there are no deposits.
pub fn current_ratio(position: &Position) -> Wad {
    ratio_of(position.deposits, position.borrows)
}

/// Ratio for arbitrary deposit/borrow figures.
///
/// The quotient only exceeds `U256` when borrows dwarf deposits by 1e18x.
/// It then saturates to `U256::MAX`, which sits above every ratio bound: the
/// transaction guard rejects it and `tend_trigger` reports the position as
/// past the liquidation threshold.
pub fn ratio_of(deposits: Amount, borrows: Amount) -> Wad {
    if deposits.is_zero() {
        return Wad::ZERO;
    }
    Wad(mul_div(borrows, WAD, deposits).unwrap_or(U256::MAX))
}

/// Whether `current` sits within `tolerance` of `target`.
pub fn within_tolerance(current: Wad, target: Wad, tolerance: Wad) -> bool {
    current.abs_diff(target) <= tolerance
}

// ---------------------------------------------------------------------------
// Theoretical amounts
// ---------------------------------------------------------------------------

/// Deposits needed to back `borrows` at exactly `ratio`: `borrows / ratio`.
pub fn theoretical_max_deposit(borrows: Amount, ratio: Wad) -> StrategyResult<Amount> {
    if borrows.is_zero() {
        return Ok(Amount::ZERO);
    }
    if ratio.is_zero() {
        return Err(StrategyError::invalid_target(
            "zero ratio cannot back outstanding borrows",
        ));
    }
    mul_div_checked(borrows, WAD, ratio.raw(), "theoretical_max_deposit")
}

/// Borrow capacity of `deposits` at `ratio`: `deposits * ratio`.
pub fn borrow_from_deposit(deposits: Amount, ratio: Wad) -> StrategyResult<Amount> {
    mul_div_checked(deposits, ratio.raw(), WAD, "borrow_from_deposit")
}

/// Total borrow a net `supply` supports once fully looped at `ratio`:
/// `supply * ratio / (1 - ratio)`.
pub fn borrow_from_supply(supply: Amount, ratio: Wad) -> StrategyResult<Amount> {
    if ratio.is_zero() {
        return Ok(Amount::ZERO);
    }
    if ratio >= Wad::ONE {
        return Err(StrategyError::invalid_target(format!(
            "ratio {ratio} must be below 1"
        )));
    }
    mul_div_checked(supply, ratio.raw(), WAD - ratio.raw(), "borrow_from_supply")
}

/// Smallest deposit keeping `borrows / deposits <= ratio`. Rounds up, so
/// withdrawing down to it never lands above `ratio`.
pub fn min_collateral(borrows: Amount, ratio: Wad) -> StrategyResult<Amount> {
    let floor = theoretical_max_deposit(borrows, ratio)?;
    if borrow_from_deposit(floor, ratio)? < borrows {
        return floor
            .checked_add(U256::from(1u64))
            .ok_or(StrategyError::MathOverflow { context: "min_collateral" });
    }
    Ok(floor)
}

/// Deposits not needed to back borrows at `max_borrow_ratio`.
pub fn unencumbered(position: &Position, max_borrow_ratio: Wad) -> StrategyResult<Amount> {
    let locked = min_collateral(position.borrows, max_borrow_ratio)?;
    Ok(position.deposits.saturating_sub(locked))
}

/// Signed deposit change such that a matching borrow/repay at `target`
/// converges fastest: `deposits - borrows / target`, clamped to `[-deposits, +inf)`.
///
/// Positive means collateral in excess of what `target` requires; negative
/// means collateral short of it.
pub fn step_to_target(position: &Position, target: Wad, max_borrow_ratio: Wad) -> StrategyResult<I256> {
    if target > max_borrow_ratio {
        return Err(StrategyError::invalid_target(format!(
            "target {target} above max borrow ratio {max_borrow_ratio}"
        )));
    }
    let deposits = to_signed(position.deposits)?;
    let floor = -deposits;

    if target.is_zero() {
        return Ok(if position.borrows.is_zero() {
            deposits
        } else {
            floor
        });
    }

    let needed = to_signed(theoretical_max_deposit(position.borrows, target)?)?;
    Ok((deposits - needed).max(floor))
}

fn to_signed(amount: Amount) -> StrategyResult<I256> {
    I256::try_from(amount).map_err(|_| StrategyError::MathOverflow {
        context: "signed amount",
    })
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Enforce `0 < target < max <= max_borrow < liquidation_threshold` and
/// `max_borrow < ltv`.
pub fn validate_targets(targets: &CollateralTargets, reserve: &ReserveConfig) -> StrategyResult<()> {
    let CollateralTargets {
        target_ratio,
        max_ratio,
        max_borrow_ratio,
    } = *targets;

    if target_ratio.is_zero() {
        return Err(StrategyError::invalid_target("target ratio must be > 0"));
    }
    if target_ratio >= max_ratio {
        return Err(StrategyError::invalid_target(format!(
            "target {target_ratio} must be < max {max_ratio}"
        )));
    }
    if max_ratio > max_borrow_ratio {
        return Err(StrategyError::invalid_target(format!(
            "max {max_ratio} must be <= max borrow {max_borrow_ratio}"
        )));
    }
    if max_borrow_ratio >= reserve.liquidation_threshold {
        return Err(StrategyError::invalid_target(format!(
            "max borrow {max_borrow_ratio} must be < liquidation threshold {}",
            reserve.liquidation_threshold
        )));
    }
    if max_borrow_ratio >= reserve.ltv {
        return Err(StrategyError::invalid_target(format!(
            "max borrow {max_borrow_ratio} must be < ltv {}",
            reserve.ltv
        )));
    }
    Ok(())
}

/// Targets derived from the reserve's risk parameters.
///
/// `max_borrow = ltv - 0.5%`, `max = min(lt - 0.5%, max_borrow)`,
/// `target = min(lt - 2%, max - 2%)`.
pub fn default_targets(reserve: &ReserveConfig) -> StrategyResult<CollateralTargets> {
    let max_margin = Wad::from_u64(DEFAULT_COLLAT_MAX_MARGIN);
    let target_margin = Wad::from_u64(DEFAULT_COLLAT_TARGET_MARGIN);

    let max_borrow_ratio = reserve.ltv.saturating_sub(max_margin);
    let max_ratio = reserve
        .liquidation_threshold
        .saturating_sub(max_margin)
        .min(max_borrow_ratio);
    let target_ratio = reserve
        .liquidation_threshold
        .saturating_sub(target_margin)
        .min(max_ratio.saturating_sub(target_margin));

    let targets = CollateralTargets {
        target_ratio,
        max_ratio,
        max_borrow_ratio,
    };
    validate_targets(&targets, reserve)?;
    Ok(targets)
}
