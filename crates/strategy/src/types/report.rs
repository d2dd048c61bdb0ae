use serde::{Deserialize, Serialize};

use super::position::{Amount, LoopOutcome, Position};
use super::wad::Wad;

/// Harvest state machine.
///
/// `Idle → Evaluating → {Leveraging | Deleveraging | Holding} → Reporting → Idle`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarvestPhase {
    #[default]
    Idle,
    Evaluating,
    Leveraging,
    Deleveraging,
    Holding,
    Reporting,
}

impl HarvestPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Evaluating => "evaluating",
            Self::Leveraging => "leveraging",
            Self::Deleveraging => "deleveraging",
            Self::Holding => "holding",
            Self::Reporting => "reporting",
        }
    }
}

/// What the evaluating phase decided to do with the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestDecision {
    /// New capital or ratio below target: lever up after the report.
    Leverage,
    /// Vault wants funds back or ratio above target: unwind first.
    Deleverage,
    /// No position change, only reward harvesting.
    Hold,
    /// Emergency exit: unwind everything.
    Exit,
}

/// Profit, loss and debt payment handed to the vault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestReport {
    pub profit: Amount,
    pub loss: Amount,
    pub debt_payment: Amount,
}

/// Want freed for a withdrawal and the loss recognized doing it.
///
/// `liquidated + loss <= amount_needed`; loss is only recognized for a
/// shortfall at or below `min_want`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liquidation {
    pub liquidated: Amount,
    pub loss: Amount,
}

/// Full result of a `harvest()` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestOutcome {
    pub decision: HarvestDecision,
    pub report: HarvestReport,
    /// Debt outstanding the vault returned after the report.
    pub debt_outstanding: Amount,
    pub rewards_sold: Amount,
    pub adjustment: LoopOutcome,
    pub position: Position,
    pub collateral_ratio: Wad,
}

/// Result of a `tend()` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TendOutcome {
    pub adjustment: LoopOutcome,
    pub position: Position,
    pub collateral_ratio: Wad,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_default_is_idle() {
        assert_eq!(HarvestPhase::default(), HarvestPhase::Idle);
        assert_eq!(HarvestPhase::Deleveraging.as_str(), "deleveraging");
    }

    #[test]
    fn test_report_serializes() {
        let report = HarvestReport::default();
        let json = serde_json::to_value(report).unwrap();
        assert!(json.get("profit").is_some());
        assert!(json.get("debt_payment").is_some());
    }
}
