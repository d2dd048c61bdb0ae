//! Newtype wrapper for WAD-scaled ratios.
//!
//! Collateral ratios, liquidation thresholds and LTVs are all fixed-point
//! fractions scaled to 1e18. Keeping them in a dedicated type prevents mixing
//! a ratio with a raw token amount at the type level.

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw WAD scale as a `U256`.
pub const WAD_U256: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Multiplier turning basis points into WAD (1e18 / 1e4).
pub const BPS_WAD_RATIO: u64 = 100_000_000_000_000;

const WAD_SCALE: Decimal = dec!(1_000_000_000_000_000_000);

/// WAD-scaled ratio (18 decimals). `Wad::ONE` is 100%.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wad(pub U256);

impl Wad {
    pub const ONE: Wad = Wad(WAD_U256);
    pub const ZERO: Wad = Wad(U256::ZERO);

    /// Create from a `U256` that is already WAD-scaled.
    pub const fn from_raw(val: U256) -> Self {
        Self(val)
    }

    /// Inner `U256`.
    pub const fn raw(self) -> U256 {
        self.0
    }

    /// Build from a plain `u64` count of 1e-18 units.
    pub fn from_u64(val: u64) -> Self {
        Self(U256::from(val))
    }

    /// Convert basis points (7500 = 75%) to WAD.
    pub fn from_bps(bps: u64) -> Self {
        Self(U256::from(bps) * U256::from(BPS_WAD_RATIO))
    }

    /// Convert a decimal fraction (`0.6`) to WAD. Truncates below 1e-18.
    ///
    /// Returns `None` for negative inputs or values that do not fit.
    pub fn from_decimal(val: Decimal) -> Option<Self> {
        if val.is_sign_negative() {
            return None;
        }
        let scaled = (val * WAD_SCALE).trunc().to_u128()?;
        Some(Self(U256::from(scaled)))
    }

    /// Convert to an off-chain `Decimal` for logging and display.
    pub fn to_decimal(self) -> Decimal {
        let raw = Decimal::from_str(&self.0.to_string()).unwrap_or_default();
        raw / WAD_SCALE
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Absolute distance between two ratios.
    pub fn abs_diff(self, other: Wad) -> Wad {
        if self >= other {
            Wad(self.0 - other.0)
        } else {
            Wad(other.0 - self.0)
        }
    }

    pub fn saturating_sub(self, other: Wad) -> Wad {
        Wad(self.0.saturating_sub(other.0))
    }
}

impl fmt::Debug for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wad({})", self.to_decimal())
    }
}

impl fmt::Display for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl From<U256> for Wad {
    fn from(val: U256) -> Self {
        Self(val)
    }
}

/// Convert a raw token amount to `Decimal` for structured log fields.
pub fn amount_to_decimal(amount: U256) -> Decimal {
    Decimal::from_str(&amount.to_string()).unwrap_or(Decimal::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wad_one_is_one() {
        assert_eq!(Wad::ONE.to_decimal(), dec!(1));
    }

    #[test]
    fn test_wad_zero() {
        assert_eq!(Wad::ZERO.to_decimal(), dec!(0));
        assert!(Wad::ZERO.is_zero());
    }

    #[test]
    fn test_from_bps() {
        // 7500 bps = 0.75
        assert_eq!(Wad::from_bps(7500).to_decimal(), dec!(0.75));
        assert_eq!(Wad::from_bps(10_000), Wad::ONE);
    }

    #[test]
    fn test_from_decimal() {
        let w = Wad::from_decimal(dec!(0.6)).unwrap();
        assert_eq!(w.raw(), U256::from(600_000_000_000_000_000u128));
        assert!(Wad::from_decimal(dec!(-0.1)).is_none());
    }

    #[test]
    fn test_abs_diff_is_symmetric() {
        let a = Wad::from_bps(6000);
        let b = Wad::from_bps(6050);
        assert_eq!(a.abs_diff(b), b.abs_diff(a));
        assert_eq!(a.abs_diff(b), Wad::from_bps(50));
    }

    #[test]
    fn test_amount_to_decimal() {
        assert_eq!(amount_to_decimal(U256::from(1_000_000u64)), dec!(1_000_000));
    }
}
