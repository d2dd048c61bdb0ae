//! Keeper loop: advances a paper venue one tick at a time and calls
//! `harvest` or `tend` whenever the strategy's triggers say so.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::AppSettings;
use crate::core::{LeveragedStrategy, Roles};
use crate::execution::{HealthCheck, PaperVenue};
use crate::types::{Amount, HarvestDecision, LoopOutcome};

pub const STRATEGY_ADDRESS: Address = Address::repeat_byte(0x5a);
pub const DEPOSITOR_ADDRESS: Address = Address::repeat_byte(0x77);

/// Role table used for paper runs. The vault entry is bound by the builder.
pub fn paper_roles() -> Roles {
    Roles {
        governance: Address::repeat_byte(0xa1),
        management: Address::repeat_byte(0xa2),
        strategist: Address::repeat_byte(0xa3),
        keeper: Address::repeat_byte(0xa4),
        guardian: Address::repeat_byte(0xa5),
        vault: Address::ZERO,
    }
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeeperAction {
    Harvested(HarvestDecision),
    Tended(LoopOutcome),
    Idle,
    Failed(&'static str),
}

pub struct Keeper {
    strategy: LeveragedStrategy,
    venue: PaperVenue,
    call_cost: Amount,
    interval: Duration,
    seconds_per_tick: u64,
    max_ticks: Option<u64>,
    shutdown: CancellationToken,
}

impl Keeper {
    /// Build a paper venue, seed the vault and register a strategy on it.
    pub fn from_config(config: &AppSettings, shutdown: CancellationToken) -> Result<Self> {
        let mut venue = PaperVenue::new(config.paper.to_venue_config());
        let want = venue.config().want;
        let deposit = U256::from(config.paper.initial_deposit);
        venue.mint(want, DEPOSITOR_ADDRESS, deposit);
        venue.deposit(DEPOSITOR_ADDRESS, deposit).context("seeding vault deposit")?;
        venue
            .add_strategy(STRATEGY_ADDRESS, config.paper.debt_ratio_bps)
            .context("registering strategy with vault")?;

        let strategy_config = &config.strategy;
        let health_check = strategy_config
            .health_check
            .to_health_check()
            .map(|check| Arc::new(check) as Arc<dyn HealthCheck>);
        let mut builder = LeveragedStrategy::builder(STRATEGY_ADDRESS, paper_roles())
            .loop_policy(strategy_config.loop_policy.to_policy()?)
            .rewards(strategy_config.rewards.to_behavior())
            .report(strategy_config.report.to_settings())
            .health_check(health_check);
        if let Some(targets) = &strategy_config.targets {
            builder = builder.targets(targets.to_targets()?);
        }
        let strategy = builder.build(&venue).context("building strategy")?;

        info!(
            deposit = %deposit,
            debt_ratio_bps = config.paper.debt_ratio_bps,
            "paper venue seeded"
        );

        Ok(Self {
            strategy,
            venue,
            call_cost: U256::from(config.keeper.call_cost),
            interval: Duration::from_secs(config.keeper.interval_seconds),
            seconds_per_tick: config.paper.seconds_per_tick,
            max_ticks: config.keeper.max_ticks,
            shutdown,
        })
    }

    pub fn strategy(&self) -> &LeveragedStrategy {
        &self.strategy
    }

    pub fn venue(&self) -> &PaperVenue {
        &self.venue
    }

    /// Advance simulated time, then harvest if due, else tend if due.
    pub fn tick(&mut self) -> KeeperAction {
        self.venue.advance(self.seconds_per_tick);
        let keeper = self.strategy.roles().keeper;

        if self.strategy.harvest_trigger(&self.venue, self.call_cost) {
            return match self.strategy.harvest(&mut self.venue, keeper) {
                Ok(outcome) => KeeperAction::Harvested(outcome.decision),
                Err(e) => {
                    error!(code = e.code(), error = %e, "harvest failed");
                    KeeperAction::Failed(e.code())
                }
            };
        }
        if self.strategy.tend_trigger(&self.venue, self.call_cost) {
            return match self.strategy.tend(&mut self.venue, keeper) {
                Ok(outcome) => KeeperAction::Tended(outcome.adjustment),
                Err(e) => {
                    error!(code = e.code(), error = %e, "tend failed");
                    KeeperAction::Failed(e.code())
                }
            };
        }
        KeeperAction::Idle
    }

    /// Tick every `interval` until cancelled or `max_ticks` is reached.
    /// Returns the number of ticks run.
    pub async fn run(&mut self) -> Result<u64> {
        info!(interval_secs = self.interval.as_secs(), max_ticks = ?self.max_ticks, "keeper started");
        let mut ticks = 0u64;

        loop {
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                info!(ticks, "keeper reached tick limit");
                break;
            }
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    info!(ticks, "keeper shutting down");
                    break;
                }
                () = tokio::time::sleep(self.interval) => {
                    let action = self.tick();
                    ticks += 1;
                    let position = self.strategy.current_position(&self.venue);
                    info!(
                        tick = ticks,
                        ?action,
                        deposits = %position.deposits,
                        borrows = %position.borrows,
                        ratio = %self.strategy.current_ratio(&self.venue),
                        total_assets = %self.strategy.estimated_total_assets(&self.venue),
                        "keeper tick"
                    );
                }
            }
        }
        Ok(ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AppConfig, HealthCheckConfig, KeeperConfig, LoggingConfig, LoopPolicyConfig, PaperConfig, ReportConfig,
        RewardsConfig, StrategyConfig, TargetsConfig,
    };
    use crate::execution::Vault;
    use crate::types::SwapRouterKind;
    use rust_decimal_macros::dec;

    fn settings() -> AppSettings {
        AppSettings {
            app: AppConfig {
                logging: LoggingConfig {
                    log_dir: "logs".into(),
                    level: "info".into(),
                    stderr: false,
                },
            },
            strategy: StrategyConfig {
                targets: Some(TargetsConfig {
                    target_ratio: dec!(0.6),
                    max_ratio: dec!(0.7),
                    max_borrow_ratio: dec!(0.745),
                }),
                loop_policy: LoopPolicyConfig {
                    min_want: 100,
                    min_ratio: dec!(0.005),
                    max_iterations: 6,
                    flash_loans_active: true,
                },
                rewards: RewardsConfig {
                    router: SwapRouterKind::UniswapV2,
                    min_reward_to_sell: 1_000,
                },
                report: ReportConfig {
                    min_report_delay_seconds: 0,
                    max_report_delay_seconds: 86_400 * 30,
                    profit_factor: 100,
                    debt_threshold: 0,
                },
                health_check: HealthCheckConfig {
                    enabled: true,
                    profit_limit_bps: 100,
                    loss_limit_bps: 1,
                },
            },
            keeper: KeeperConfig {
                interval_seconds: 1,
                call_cost: 1_000,
                max_ticks: Some(3),
            },
            paper: PaperConfig {
                ltv_bps: 7_500,
                liquidation_threshold_bps: 8_000,
                supply_apr_bps: 0,
                borrow_apr_bps: 0,
                reward_emission_bps: 0,
                flash_fee_flat: 0,
                flash_fee_bps: 0,
                initial_deposit: 1_000_000,
                debt_ratio_bps: 10_000,
                seconds_per_tick: 3_600,
            },
        }
    }

    #[test]
    fn test_first_tick_harvests_and_levers() {
        let mut keeper = Keeper::from_config(&settings(), CancellationToken::new()).unwrap();
        assert_eq!(keeper.tick(), KeeperAction::Harvested(HarvestDecision::Leverage));

        let position = keeper.strategy().current_position(keeper.venue());
        assert_eq!(position.deposits, U256::from(2_500_000u64));
        assert_eq!(position.borrows, U256::from(1_500_000u64));
        assert_eq!(
            keeper.venue().strategy_params(STRATEGY_ADDRESS).unwrap().total_debt,
            U256::from(1_000_000u64)
        );

        // Nothing changed since: no credit, no profit, on target.
        assert_eq!(keeper.tick(), KeeperAction::Idle);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let shutdown = CancellationToken::new();
        let mut keeper = Keeper::from_config(&settings(), shutdown.clone()).unwrap();
        shutdown.cancel();
        assert_eq!(keeper.run().await.unwrap(), 0);
    }
}
