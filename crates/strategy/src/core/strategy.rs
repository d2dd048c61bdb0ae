//! Leveraged lending strategy controller.
//!
//! Public surface driven by keepers, managers and the vault:
//! - `harvest`: sell rewards, report profit / loss, re-target leverage
//! - `tend`: re-target leverage between reports
//! - manual unwinds, emergency exit, sweep, vault withdrawals and migration
//!
//! Every mutating operation runs inside `transact`. On error the venue is
//! reverted to its checkpoint and the controller to its prior state, so a
//! failed call leaves no partial position behind.

use std::sync::Arc;

use alloy_primitives::Address;
use tracing::{debug, error, info, warn};

use crate::core::access::Roles;
use crate::core::accounting;
use crate::core::deleverage::{self, deleverage_to_zero, lever_down_to};
use crate::core::health_check::CommonHealthCheck;
use crate::core::leverage::lever_max;
use crate::core::position::{idle_want, read_position};
use crate::core::ratio;
use crate::core::rewards;
use crate::core::settings::{LoopContext, LoopPolicy, ReportSettings, StrategySettings};
use crate::core::triggers;
use crate::errors::{StrategyError, StrategyResult};
use crate::execution::{HealthCheck, Venue};
use crate::types::{
    Amount, CollateralTargets, HarvestDecision, HarvestOutcome, HarvestPhase, HarvestReport, Liquidation,
    LoopDirection, LoopOutcome, LoopPlan, Position, RewardBehavior, SwapRouterKind, TendOutcome, Wad,
};

/// Configures and validates a [`LeveragedStrategy`] against a venue.
#[derive(Debug, Clone)]
pub struct StrategyBuilder {
    address: Address,
    roles: Roles,
    targets: Option<CollateralTargets>,
    loop_policy: LoopPolicy,
    rewards: RewardBehavior,
    report: ReportSettings,
    health_check: Option<Arc<dyn HealthCheck>>,
}

impl StrategyBuilder {
    /// `roles.vault` is overwritten with the venue's vault at build time.
    pub fn new(address: Address, roles: Roles) -> Self {
        Self {
            address,
            roles,
            targets: None,
            loop_policy: LoopPolicy::default(),
            rewards: RewardBehavior::default(),
            report: ReportSettings::default(),
            health_check: Some(Arc::new(CommonHealthCheck::default())),
        }
    }

    /// Explicit targets. Without them targets derive from the reserve's
    /// LTV and liquidation threshold.
    pub fn targets(mut self, targets: CollateralTargets) -> Self {
        self.targets = Some(targets);
        self
    }

    pub fn loop_policy(mut self, loop_policy: LoopPolicy) -> Self {
        self.loop_policy = loop_policy;
        self
    }

    pub fn rewards(mut self, rewards: RewardBehavior) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn report(mut self, report: ReportSettings) -> Self {
        self.report = report;
        self
    }

    /// `None` disables the post-harvest health check entirely.
    pub fn health_check(mut self, health_check: Option<Arc<dyn HealthCheck>>) -> Self {
        self.health_check = health_check;
        self
    }

    pub fn build<V: Venue>(self, venue: &V) -> StrategyResult<LeveragedStrategy> {
        if self.address == Address::ZERO {
            return Err(StrategyError::InvalidParameter {
                param: "address",
                reason: "strategy address must be non-zero".into(),
            });
        }

        let want = venue.want();
        let reserve = venue.reserve_config(want)?;
        let targets = match self.targets {
            Some(targets) => {
                ratio::validate_targets(&targets, &reserve)?;
                targets
            }
            None => ratio::default_targets(&reserve)?,
        };
        self.loop_policy.validate(targets.max_borrow_ratio)?;
        validate_report_settings(&self.report)?;

        let mut settings = StrategySettings::new(targets);
        settings.loop_policy = self.loop_policy;
        settings.rewards = self.rewards;
        settings.report = self.report;

        let roles = Roles {
            vault: venue.vault_address(),
            ..self.roles
        };

        info!(
            strategy = %self.address,
            want = %want,
            target = %targets.target_ratio,
            max = %targets.max_ratio,
            max_borrow = %targets.max_borrow_ratio,
            flash = settings.loop_policy.flash_loans_active,
            "strategy initialized"
        );

        Ok(LeveragedStrategy {
            address: self.address,
            want,
            share_token: venue.share_token(),
            reward_token: venue.reward_token(),
            roles,
            settings,
            health_check: self.health_check,
            do_health_check: true,
            phase: HarvestPhase::Idle,
        })
    }
}

fn validate_report_settings(report: &ReportSettings) -> StrategyResult<()> {
    if report.min_report_delay > report.max_report_delay {
        return Err(StrategyError::InvalidParameter {
            param: "min_report_delay",
            reason: format!(
                "{} exceeds max report delay {}",
                report.min_report_delay, report.max_report_delay
            ),
        });
    }
    Ok(())
}

/// Controller for one leveraged position on one lending market.
///
/// Holds no funds itself: balances, deposits and borrows live on the venue
/// under `address`. The controller owns only its settings and role table.
#[derive(Debug, Clone)]
pub struct LeveragedStrategy {
    /// Account holding the position on the venue.
    address: Address,
    want: Address,
    /// Vault share token; never sweepable.
    share_token: Address,
    reward_token: Address,
    roles: Roles,
    settings: StrategySettings,
    health_check: Option<Arc<dyn HealthCheck>>,
    /// Cleared to skip the health check on the next harvest only.
    do_health_check: bool,
    phase: HarvestPhase,
}

impl LeveragedStrategy {
    pub fn builder(address: Address, roles: Roles) -> StrategyBuilder {
        StrategyBuilder::new(address, roles)
    }

    /// A fresh controller at `address` with the same venue bindings and
    /// settings. The emergency flag is not carried over.
    pub fn clone_for<V: Venue>(&self, venue: &V, address: Address, roles: Roles) -> StrategyResult<LeveragedStrategy> {
        if address == self.address {
            return Err(StrategyError::InvalidParameter {
                param: "address",
                reason: format!("clone must not reuse {address}"),
            });
        }
        let clone = StrategyBuilder::new(address, roles)
            .targets(self.settings.targets)
            .loop_policy(self.settings.loop_policy)
            .rewards(self.settings.rewards)
            .report(self.settings.report)
            .health_check(self.health_check.clone())
            .build(venue)?;
        info!(original = %self.address, clone = %address, "strategy cloned");
        Ok(clone)
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn want(&self) -> Address {
        self.want
    }

    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    pub fn settings(&self) -> &StrategySettings {
        &self.settings
    }

    pub fn phase(&self) -> HarvestPhase {
        self.phase
    }

    pub fn is_emergency_exit(&self) -> bool {
        self.settings.emergency_exit
    }

    pub fn health_check_armed(&self) -> bool {
        self.do_health_check
    }

    pub fn current_position<V: Venue>(&self, venue: &V) -> Position {
        read_position(venue, self.address, self.want)
    }

    pub fn current_ratio<V: Venue>(&self, venue: &V) -> Wad {
        ratio::current_ratio(&self.current_position(venue))
    }

    /// Idle want plus net supply plus rewards valued at the configured router.
    pub fn estimated_total_assets<V: Venue>(&self, venue: &V) -> Amount {
        accounting::estimated_total_assets(venue, &self.loop_context(), self.settings.rewards.router)
    }

    pub fn estimated_rewards_in_want<V: Venue>(&self, venue: &V) -> Amount {
        rewards::estimated_rewards_in_want(venue, self.address, self.want, self.settings.rewards.router)
    }

    pub fn harvest_trigger<V: Venue>(&self, venue: &V, call_cost: Amount) -> bool {
        triggers::harvest_trigger(venue, self.address, self.want, &self.settings, call_cost)
    }

    pub fn tend_trigger<V: Venue>(&self, venue: &V, call_cost: Amount) -> bool {
        triggers::tend_trigger(venue, self.address, self.want, &self.settings, call_cost)
    }

    fn loop_context(&self) -> LoopContext {
        LoopContext::new(self.address, self.want, &self.settings)
    }

    // -----------------------------------------------------------------------
    // Atomicity
    // -----------------------------------------------------------------------

    /// Run `op` all-or-nothing. Also rejects any operation that leaves the
    /// ratio above `max_borrow_ratio` unless it was already there and did
    /// not grow.
    fn transact<V, T>(
        &mut self,
        venue: &mut V,
        action: &'static str,
        op: impl FnOnce(&mut Self, &mut V) -> StrategyResult<T>,
    ) -> StrategyResult<T>
    where
        V: Venue,
    {
        let snapshot = venue.checkpoint();
        let saved = self.clone();
        let before = self.current_ratio(&*venue);

        let result = op(self, venue);
        let result = result.and_then(|value| {
            self.ensure_ratio_bound(&*venue, before)?;
            Ok(value)
        });

        match result {
            Ok(value) => {
                self.phase = HarvestPhase::Idle;
                Ok(value)
            }
            Err(err) => {
                venue.revert_to(snapshot);
                *self = saved;
                warn!(action, code = err.code(), error = %err, "operation reverted");
                Err(err)
            }
        }
    }

    fn ensure_ratio_bound<V: Venue>(&self, venue: &V, before: Wad) -> StrategyResult<()> {
        let max_borrow = self.settings.targets.max_borrow_ratio;
        let after = self.current_ratio(venue);
        if after > max_borrow && after > before {
            return Err(StrategyError::ExceedsAvailableCollateral {
                requested: Amount::ZERO,
                resulting_ratio: after,
                max_ratio: max_borrow,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Harvest / tend
    // -----------------------------------------------------------------------

    /// Sell rewards, report to the vault, then re-target leverage for the
    /// debt the vault leaves with the strategy.
    pub fn harvest<V: Venue>(&mut self, venue: &mut V, caller: Address) -> StrategyResult<HarvestOutcome> {
        self.roles.only_keepers(caller, "harvest")?;
        self.transact(venue, "harvest", |strategy, venue| strategy.run_harvest(venue))
    }

    fn run_harvest<V: Venue>(&mut self, venue: &mut V) -> StrategyResult<HarvestOutcome> {
        let total_debt = venue.strategy_params(self.address)?.total_debt;
        self.phase = HarvestPhase::Evaluating;

        let rewards_sold = rewards::claim_and_sell(venue, self.address, self.want, &self.settings.rewards)?;

        let ctx = self.loop_context();
        let debt_outstanding = venue.debt_outstanding(self.address);
        let credit = venue.credit_available(self.address);
        let idle = idle_want(venue, self.address, self.want);
        let ratio_before = self.current_ratio(venue);
        let decision = self.decide(debt_outstanding, credit, idle, ratio_before);
        debug!(
            ?decision,
            debt_outstanding = %debt_outstanding,
            credit = %credit,
            idle = %idle,
            ratio = %ratio_before,
            "harvest evaluated"
        );

        self.phase = match decision {
            HarvestDecision::Leverage => HarvestPhase::Leveraging,
            HarvestDecision::Deleverage | HarvestDecision::Exit => HarvestPhase::Deleveraging,
            HarvestDecision::Hold => HarvestPhase::Holding,
        };
        let mut adjustment = LoopPlan::default();
        if decision == HarvestDecision::Exit {
            adjustment = deleverage_to_zero(venue, &ctx)?;
        }
        let report = accounting::prepare_return(venue, &ctx, debt_outstanding)?;

        self.phase = HarvestPhase::Reporting;
        let outstanding_after = venue.report_harvest(self.address, report)?;
        if decision != HarvestDecision::Exit {
            adjustment = self.adjust_position(venue, &ctx, outstanding_after)?;
        }

        self.run_health_check(&report, outstanding_after, total_debt)?;

        let position = self.current_position(venue);
        let collateral_ratio = ratio::current_ratio(&position);
        info!(
            ?decision,
            profit = %report.profit,
            loss = %report.loss,
            debt_payment = %report.debt_payment,
            rewards_sold = %rewards_sold,
            deposits = %position.deposits,
            borrows = %position.borrows,
            ratio = %collateral_ratio,
            "harvest complete"
        );
        Ok(HarvestOutcome {
            decision,
            report,
            debt_outstanding: outstanding_after,
            rewards_sold,
            adjustment: adjustment.outcome(ctx.policy.min_want),
            position,
            collateral_ratio,
        })
    }

    fn decide(&self, debt_outstanding: Amount, credit: Amount, idle: Amount, current: Wad) -> HarvestDecision {
        let policy = &self.settings.loop_policy;
        let target = self.settings.targets.target_ratio;
        let drift = current.abs_diff(target) > policy.min_ratio;

        if self.settings.emergency_exit {
            HarvestDecision::Exit
        } else if debt_outstanding > policy.min_want || (current > target && drift) {
            HarvestDecision::Deleverage
        } else if credit > policy.min_want || idle > policy.min_want || (current < target && drift) {
            HarvestDecision::Leverage
        } else {
            HarvestDecision::Hold
        }
    }

    fn run_health_check(&mut self, report: &HarvestReport, debt_outstanding: Amount, total_debt: Amount) -> StrategyResult<()> {
        if !self.do_health_check {
            info!("health check skipped for this harvest");
            self.do_health_check = true;
            return Ok(());
        }
        let Some(health_check) = &self.health_check else {
            return Ok(());
        };
        if !health_check.check(report, debt_outstanding, total_debt) {
            error!(
                profit = %report.profit,
                loss = %report.loss,
                debt_payment = %report.debt_payment,
                total_debt = %total_debt,
                "health check rejected harvest"
            );
            return Err(StrategyError::HealthCheckFailed {
                profit: report.profit,
                loss: report.loss,
                debt_payment: report.debt_payment,
            });
        }
        Ok(())
    }

    /// Re-target leverage without reporting to the vault.
    pub fn tend<V: Venue>(&mut self, venue: &mut V, caller: Address) -> StrategyResult<TendOutcome> {
        self.roles.only_keepers(caller, "tend")?;
        self.transact(venue, "tend", |strategy, venue| {
            let ctx = strategy.loop_context();
            let debt_outstanding = venue.debt_outstanding(strategy.address);
            let plan = strategy.adjust_position(venue, &ctx, debt_outstanding)?;

            let position = strategy.current_position(venue);
            let collateral_ratio = ratio::current_ratio(&position);
            let adjustment = plan.outcome(ctx.policy.min_want);
            info!(?adjustment, ratio = %collateral_ratio, "tend complete");
            Ok(TendOutcome {
                adjustment,
                position,
                collateral_ratio,
            })
        })
    }

    /// Deploy idle want and move the ratio back toward target, keeping
    /// `debt_outstanding` liquid. In emergency exit the position is unwound
    /// instead.
    fn adjust_position<V: Venue>(
        &self,
        venue: &mut V,
        ctx: &LoopContext,
        debt_outstanding: Amount,
    ) -> StrategyResult<LoopPlan> {
        if self.settings.emergency_exit {
            return deleverage_to_zero(venue, ctx);
        }

        let mut plan = LoopPlan::default();
        let idle = idle_want(venue, ctx.account, ctx.want);
        if idle > debt_outstanding && idle - debt_outstanding > ctx.policy.min_want {
            let amount = idle - debt_outstanding;
            venue.supply(ctx.account, ctx.want, amount)?;
            plan.push(LoopDirection::Supply, amount);
        }

        let idle = idle_want(venue, ctx.account, ctx.want);
        let position = read_position(venue, ctx.account, ctx.want);
        let target = ctx.targets.target_ratio;
        let drift = ratio::current_ratio(&position).abs_diff(target) > ctx.policy.min_ratio;
        // Positive: more collateral than `target` needs, so borrow more.
        let step = ratio::step_to_target(&position, target, ctx.targets.max_borrow_ratio)?;

        let next = if debt_outstanding > idle {
            let new_supply = position.net_supply().saturating_sub(debt_outstanding - idle);
            lever_down_to(venue, ctx, ratio::borrow_from_supply(new_supply, target)?)?
        } else if drift && step.is_positive() {
            lever_max(venue, ctx, debt_outstanding)?
        } else if drift && step.is_negative() {
            lever_down_to(venue, ctx, ratio::borrow_from_supply(position.net_supply(), target)?)?
        } else {
            LoopPlan::default()
        };
        plan.append(next);
        Ok(plan)
    }

    // -----------------------------------------------------------------------
    // Management
    // -----------------------------------------------------------------------

    /// Replace the collateral targets after validating them against the
    /// market's current reserve parameters.
    pub fn set_collateral_targets<V: Venue>(
        &mut self,
        venue: &V,
        caller: Address,
        targets: CollateralTargets,
    ) -> StrategyResult<()> {
        self.roles.only_vault_managers(caller, "set collateral targets")?;
        let reserve = venue.reserve_config(self.want)?;
        ratio::validate_targets(&targets, &reserve)?;
        self.settings.loop_policy.validate(targets.max_borrow_ratio)?;
        self.settings.targets = targets;
        info!(
            target = %targets.target_ratio,
            max = %targets.max_ratio,
            max_borrow = %targets.max_borrow_ratio,
            "collateral targets updated"
        );
        Ok(())
    }

    pub fn set_mins_and_maxs(
        &mut self,
        caller: Address,
        min_want: Amount,
        min_ratio: Wad,
        max_iterations: u8,
    ) -> StrategyResult<()> {
        self.roles.only_vault_managers(caller, "set loop bounds")?;
        let policy = LoopPolicy {
            min_want,
            min_ratio,
            max_iterations,
            ..self.settings.loop_policy
        };
        policy.validate(self.settings.targets.max_borrow_ratio)?;
        self.settings.loop_policy = policy;
        info!(min_want = %min_want, min_ratio = %min_ratio, max_iterations, "loop bounds updated");
        Ok(())
    }

    pub fn set_reward_behavior(
        &mut self,
        caller: Address,
        router: SwapRouterKind,
        min_reward_to_sell: Amount,
    ) -> StrategyResult<()> {
        self.roles.only_vault_managers(caller, "set reward behavior")?;
        self.settings.rewards = RewardBehavior {
            router,
            min_reward_to_sell,
        };
        info!(router = router.as_str(), min_reward_to_sell = %min_reward_to_sell, "reward behavior updated");
        Ok(())
    }

    pub fn set_flash_loans_active(&mut self, caller: Address, active: bool) -> StrategyResult<()> {
        self.roles.only_vault_managers(caller, "toggle flash loans")?;
        self.settings.loop_policy.flash_loans_active = active;
        info!(active, "flash loans toggled");
        Ok(())
    }

    pub fn set_health_check(&mut self, caller: Address, health_check: Option<Arc<dyn HealthCheck>>) -> StrategyResult<()> {
        self.roles.only_vault_managers(caller, "set health check")?;
        info!(enabled = health_check.is_some(), "health check replaced");
        self.health_check = health_check;
        Ok(())
    }

    /// `false` skips the health check on the next harvest only.
    pub fn set_do_health_check(&mut self, caller: Address, enabled: bool) -> StrategyResult<()> {
        self.roles.only_vault_managers(caller, "arm health check")?;
        self.do_health_check = enabled;
        Ok(())
    }

    pub fn set_debt_threshold(&mut self, caller: Address, debt_threshold: Amount) -> StrategyResult<()> {
        self.roles.only_authorized(caller, "set debt threshold")?;
        self.settings.report.debt_threshold = debt_threshold;
        Ok(())
    }

    pub fn set_min_report_delay(&mut self, caller: Address, delay: u64) -> StrategyResult<()> {
        self.roles.only_authorized(caller, "set min report delay")?;
        let report = ReportSettings {
            min_report_delay: delay,
            ..self.settings.report
        };
        validate_report_settings(&report)?;
        self.settings.report = report;
        Ok(())
    }

    pub fn set_max_report_delay(&mut self, caller: Address, delay: u64) -> StrategyResult<()> {
        self.roles.only_authorized(caller, "set max report delay")?;
        let report = ReportSettings {
            max_report_delay: delay,
            ..self.settings.report
        };
        validate_report_settings(&report)?;
        self.settings.report = report;
        Ok(())
    }

    pub fn set_profit_factor(&mut self, caller: Address, profit_factor: u64) -> StrategyResult<()> {
        self.roles.only_authorized(caller, "set profit factor")?;
        self.settings.report.profit_factor = profit_factor;
        Ok(())
    }

    pub fn set_keeper(&mut self, caller: Address, keeper: Address) -> StrategyResult<()> {
        self.roles.only_authorized(caller, "set keeper")?;
        if keeper == Address::ZERO {
            return Err(StrategyError::InvalidParameter {
                param: "keeper",
                reason: "keeper must be non-zero".into(),
            });
        }
        self.roles.keeper = keeper;
        info!(keeper = %keeper, "keeper updated");
        Ok(())
    }

    /// Repay `amount` of debt with an equal amount of collateral.
    pub fn manual_deleverage<V: Venue>(&mut self, venue: &mut V, caller: Address, amount: Amount) -> StrategyResult<LoopOutcome> {
        self.roles.only_vault_managers(caller, "manually deleverage")?;
        self.transact(venue, "manual deleverage", |strategy, venue| {
            let ctx = strategy.loop_context();
            let plan = deleverage::manual_deleverage(venue, &ctx, amount)?;
            Ok(plan.outcome(ctx.policy.min_want))
        })
    }

    /// Withdraw `amount` of unencumbered collateral to idle want.
    pub fn manual_release_want<V: Venue>(&mut self, venue: &mut V, caller: Address, amount: Amount) -> StrategyResult<Amount> {
        self.roles.only_vault_managers(caller, "manually release want")?;
        self.transact(venue, "manual release want", |strategy, venue| {
            deleverage::manual_release_want(venue, &strategy.loop_context(), amount)
        })
    }

    pub fn manual_claim_and_sell_rewards<V: Venue>(&mut self, venue: &mut V, caller: Address) -> StrategyResult<Amount> {
        self.roles.only_vault_managers(caller, "claim and sell rewards")?;
        self.transact(venue, "claim and sell rewards", |strategy, venue| {
            rewards::claim_and_sell(venue, strategy.address, strategy.want, &strategy.settings.rewards)
        })
    }

    /// Stop re-levering, revoke the vault allocation and unwind on every
    /// subsequent cycle. Irreversible.
    pub fn set_emergency_exit<V: Venue>(&mut self, venue: &mut V, caller: Address) -> StrategyResult<()> {
        self.roles.only_emergency_authorized(caller, "set emergency exit")?;
        self.transact(venue, "emergency exit", |strategy, venue| {
            strategy.settings.emergency_exit = true;
            venue.revoke_strategy(strategy.address)?;
            warn!(strategy = %strategy.address, "emergency exit enabled");
            Ok(())
        })
    }

    /// Send the strategy's whole balance of `token` to governance. Want and
    /// the vault share token are protected.
    pub fn sweep<V: Venue>(&mut self, venue: &mut V, caller: Address, token: Address) -> StrategyResult<Amount> {
        self.roles.only_governance(caller, "sweep")?;
        if token == self.want {
            return Err(StrategyError::AssetMismatch { token, label: "want" });
        }
        if token == self.share_token {
            return Err(StrategyError::AssetMismatch { token, label: "shares" });
        }
        self.transact(venue, "sweep", |strategy, venue| {
            let amount = venue.balance_of(token, strategy.address);
            if !amount.is_zero() {
                venue.transfer(token, strategy.address, strategy.roles.governance, amount)?;
            }
            info!(token = %token, amount = %amount, "swept");
            Ok(amount)
        })
    }

    /// Free up to `amount_needed` and hand it to the vault.
    pub fn withdraw<V: Venue>(&mut self, venue: &mut V, caller: Address, amount_needed: Amount) -> StrategyResult<Liquidation> {
        self.roles.only_vault(caller, "withdraw")?;
        self.transact(venue, "withdraw", |strategy, venue| {
            let liquidation = accounting::liquidate_position(venue, &strategy.loop_context(), amount_needed)?;
            if !liquidation.liquidated.is_zero() {
                venue.transfer(strategy.want, strategy.address, strategy.roles.vault, liquidation.liquidated)?;
            }
            venue.settle_withdrawal(strategy.address, liquidation.liquidated, liquidation.loss)?;
            info!(
                needed = %amount_needed,
                liquidated = %liquidation.liquidated,
                loss = %liquidation.loss,
                "vault withdrawal"
            );
            Ok(liquidation)
        })
    }

    /// Hand idle want and rewards to `new_strategy`. The position must
    /// already be unwound to dust.
    pub fn migrate<V: Venue>(&mut self, venue: &mut V, caller: Address, new_strategy: Address) -> StrategyResult<()> {
        self.roles.only_vault(caller, "migrate")?;
        let remaining = self.current_position(venue).net_supply();
        let min_want = self.settings.loop_policy.min_want;
        if remaining >= min_want {
            return Err(StrategyError::MigrationBlocked { remaining, min_want });
        }
        self.transact(venue, "migrate", |strategy, venue| {
            venue.migrate_strategy(strategy.address, new_strategy)?;
            for token in [strategy.want, strategy.reward_token] {
                let balance = venue.balance_of(token, strategy.address);
                if !balance.is_zero() {
                    venue.transfer(token, strategy.address, new_strategy, balance)?;
                }
            }
            info!(from = %strategy.address, to = %new_strategy, "strategy migrated");
            Ok(())
        })
    }
}
