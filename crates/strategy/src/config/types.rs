use alloy_primitives::U256;
use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::core::{CommonHealthCheck, LoopPolicy, ReportSettings};
use crate::execution::PaperVenueConfig;
use crate::types::{CollateralTargets, RewardBehavior, SwapRouterKind, Wad};

// ---------------------------------------------------------------------------
// Top-level aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    pub app: AppConfig,
    pub strategy: StrategyConfig,
    pub keeper: KeeperConfig,
    pub paper: PaperConfig,
}

// ---------------------------------------------------------------------------
// app.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    /// Level for this crate's targets; dependencies stay at `warn`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Mirror events to stderr in compact form.
    #[serde(default = "default_true")]
    pub stderr: bool,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// strategy.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    /// Absent: targets derive from the reserve's LTV and liquidation threshold.
    #[serde(default)]
    pub targets: Option<TargetsConfig>,
    pub loop_policy: LoopPolicyConfig,
    pub rewards: RewardsConfig,
    pub report: ReportConfig,
    pub health_check: HealthCheckConfig,
}

/// Collateral ratios as decimal fractions (`"0.6"` = 60%).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TargetsConfig {
    pub target_ratio: Decimal,
    pub max_ratio: Decimal,
    pub max_borrow_ratio: Decimal,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LoopPolicyConfig {
    pub min_want: u64,
    pub min_ratio: Decimal,
    pub max_iterations: u8,
    pub flash_loans_active: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RewardsConfig {
    pub router: SwapRouterKind,
    pub min_reward_to_sell: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReportConfig {
    pub min_report_delay_seconds: u64,
    pub max_report_delay_seconds: u64,
    pub profit_factor: u64,
    pub debt_threshold: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HealthCheckConfig {
    pub enabled: bool,
    pub profit_limit_bps: u64,
    pub loss_limit_bps: u64,
}

fn to_wad(field: &str, value: Decimal) -> Result<Wad> {
    Wad::from_decimal(value).ok_or_else(|| anyhow!("{field}: {value} is not a valid ratio"))
}

impl TargetsConfig {
    pub fn to_targets(&self) -> Result<CollateralTargets> {
        Ok(CollateralTargets {
            target_ratio: to_wad("target_ratio", self.target_ratio)?,
            max_ratio: to_wad("max_ratio", self.max_ratio)?,
            max_borrow_ratio: to_wad("max_borrow_ratio", self.max_borrow_ratio)?,
        })
    }
}

impl LoopPolicyConfig {
    pub fn to_policy(&self) -> Result<LoopPolicy> {
        Ok(LoopPolicy {
            min_want: U256::from(self.min_want),
            min_ratio: to_wad("min_ratio", self.min_ratio)?,
            max_iterations: self.max_iterations,
            flash_loans_active: self.flash_loans_active,
        })
    }
}

impl RewardsConfig {
    pub fn to_behavior(&self) -> RewardBehavior {
        RewardBehavior {
            router: self.router,
            min_reward_to_sell: U256::from(self.min_reward_to_sell),
        }
    }
}

impl ReportConfig {
    pub fn to_settings(&self) -> ReportSettings {
        ReportSettings {
            min_report_delay: self.min_report_delay_seconds,
            max_report_delay: self.max_report_delay_seconds,
            profit_factor: self.profit_factor,
            debt_threshold: U256::from(self.debt_threshold),
        }
    }
}

impl HealthCheckConfig {
    pub fn to_health_check(&self) -> Option<CommonHealthCheck> {
        self.enabled.then_some(CommonHealthCheck {
            profit_limit_bps: self.profit_limit_bps,
            loss_limit_bps: self.loss_limit_bps,
        })
    }
}

// ---------------------------------------------------------------------------
// keeper.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct KeeperConfig {
    pub interval_seconds: u64,
    /// Estimated cost of a keeper call in want units.
    pub call_cost: u64,
    /// Stop after this many ticks; run until Ctrl-C when absent.
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

// ---------------------------------------------------------------------------
// paper.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PaperConfig {
    pub ltv_bps: u64,
    pub liquidation_threshold_bps: u64,
    pub supply_apr_bps: u64,
    pub borrow_apr_bps: u64,
    pub reward_emission_bps: u64,
    pub flash_fee_flat: u64,
    pub flash_fee_bps: u64,
    /// Want deposited into the vault before the first tick.
    pub initial_deposit: u64,
    /// Vault allocation to the strategy, bps.
    pub debt_ratio_bps: u64,
    /// Simulated time that passes per keeper tick.
    pub seconds_per_tick: u64,
}

impl PaperConfig {
    pub fn to_venue_config(&self) -> PaperVenueConfig {
        PaperVenueConfig {
            ltv_bps: self.ltv_bps,
            liquidation_threshold_bps: self.liquidation_threshold_bps,
            supply_apr_bps: self.supply_apr_bps,
            borrow_apr_bps: self.borrow_apr_bps,
            reward_emission_bps: self.reward_emission_bps,
            flash_fee_flat: U256::from(self.flash_fee_flat),
            flash_fee_bps: self.flash_fee_bps,
            ..Default::default()
        }
    }
}
