use alloy_primitives::U256;

// ---------------------------------------------------------------------------
// Numeric Constants
// ---------------------------------------------------------------------------

/// WAD: 1e18, the fixed-point scale shared by every collateral ratio.
pub const WAD: U256 = crate::types::WAD_U256;

/// Seconds in a non-leap year.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Seconds in a day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Vault debt ratios are expressed in basis points.
pub const MAX_BPS: u64 = 10_000;

// ---------------------------------------------------------------------------
// Collateral Target Defaults
// ---------------------------------------------------------------------------

/// Default target sits 2% below the liquidation threshold (WAD).
pub const DEFAULT_COLLAT_TARGET_MARGIN: u64 = 20_000_000_000_000_000;

/// Default max ratio sits 0.5% below liquidation threshold / LTV (WAD).
pub const DEFAULT_COLLAT_MAX_MARGIN: u64 = 5_000_000_000_000_000;

/// Ratio distance from the liquidation threshold that forces a tend (WAD).
pub const LIQUIDATION_WARNING_THRESHOLD: u64 = 10_000_000_000_000_000;

// ---------------------------------------------------------------------------
// Loop Policy Defaults
// ---------------------------------------------------------------------------

/// Each geometric iteration shrinks the remaining gap by the borrow ratio;
/// six iterations cover supported ratio ranges.
pub const DEFAULT_MAX_ITERATIONS: u8 = 6;

/// Hard ceiling accepted by `set_mins_and_maxs`.
pub const MAX_ITERATIONS_CAP: u8 = 16;

/// Amounts at or below this are dust (native units).
pub const DEFAULT_MIN_WANT: u64 = 100;

/// Ratio tolerance around the target before rebalancing (0.5%, WAD).
pub const DEFAULT_MIN_RATIO: u64 = 5_000_000_000_000_000;

// ---------------------------------------------------------------------------
// Reporting Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_MIN_REPORT_DELAY: u64 = 0;
pub const DEFAULT_MAX_REPORT_DELAY: u64 = 30 * SECONDS_PER_DAY;
pub const DEFAULT_PROFIT_FACTOR: u64 = 100;

/// Default health-check limits, bps of total debt.
pub const DEFAULT_PROFIT_LIMIT_BPS: u64 = 100;
pub const DEFAULT_LOSS_LIMIT_BPS: u64 = 1;

/// Rewards below this want-value are left unsold (native units).
pub const DEFAULT_MIN_REWARD_TO_SELL: u64 = 1_000_000;
