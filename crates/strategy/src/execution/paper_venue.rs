//! In-memory venue for paper runs and tests.
//!
//! Simulates every collaborator the controller talks to:
//! - Token ledger with per-owner balances
//! - Single-asset lending market with LTV / liquidation threshold enforcement
//!   and simple-interest accrual on deposits and borrows
//! - Flash lender with a flat + bps fee and a nested-loan guard
//! - Vault with debt-ratio based credit lines and harvest accounting
//! - Reward emissions on market activity and fixed-price swap routers
//!
//! The whole venue is `Clone`, which makes checkpointing a plain copy.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use tracing::{debug, info};

use crate::constants::{MAX_BPS, SECONDS_PER_YEAR, WAD};
use crate::errors::MarketError;
use crate::execution::interfaces::{
    AccountData, Checkpoint, Clock, FlashLender, FlashLoan, LendingMarket, ReserveConfig,
    RewardsController, StrategyParams, SwapRouter, TokenLedger, Vault,
};
use crate::types::{Amount, HarvestReport, SwapRouterKind, Wad};

// ═══════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════

/// Parameters of a paper venue.
#[derive(Debug, Clone)]
pub struct PaperVenueConfig {
    pub want: Address,
    pub reward_token: Address,
    pub vault: Address,
    pub market: Address,
    pub flash_lender: Address,
    pub router: Address,

    pub ltv_bps: u64,
    pub liquidation_threshold_bps: u64,

    /// Simple yearly interest paid on deposits / charged on borrows.
    pub supply_apr_bps: u64,
    pub borrow_apr_bps: u64,

    /// Reward units emitted per year per 10_000 units of deposits + borrows.
    pub reward_emission_bps: u64,
    /// Want received per reward unit, per router.
    pub reward_prices: HashMap<SwapRouterKind, Wad>,

    pub flash_fee_flat: Amount,
    pub flash_fee_bps: u64,
    pub flash_liquidity: Amount,

    /// Want cash the market starts with, available to borrowers.
    pub market_liquidity: Amount,

    pub start_time: u64,
}

impl Default for PaperVenueConfig {
    fn default() -> Self {
        let reward_prices = HashMap::from([
            (SwapRouterKind::UniswapV2, Wad::from_bps(20_000)),
            (SwapRouterKind::SushiSwap, Wad::from_bps(19_800)),
            (SwapRouterKind::UniswapV3, Wad::from_bps(20_100)),
        ]);
        Self {
            want: Address::repeat_byte(0x01),
            reward_token: Address::repeat_byte(0x02),
            vault: Address::repeat_byte(0x0a),
            market: Address::repeat_byte(0x0b),
            flash_lender: Address::repeat_byte(0x0c),
            router: Address::repeat_byte(0x0d),
            ltv_bps: 7_500,
            liquidation_threshold_bps: 8_000,
            supply_apr_bps: 0,
            borrow_apr_bps: 0,
            reward_emission_bps: 0,
            reward_prices,
            flash_fee_flat: U256::from(2u64),
            flash_fee_bps: 0,
            flash_liquidity: U256::from(10u64).pow(U256::from(30u64)),
            market_liquidity: U256::from(10u64).pow(U256::from(30u64)),
            start_time: 1_700_000_000,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Venue State
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
struct MarketAccount {
    deposits: Amount,
    borrows: Amount,
}

/// Simulated venue. See the module docs for what is modelled.
#[derive(Debug, Clone)]
pub struct PaperVenue {
    config: PaperVenueConfig,
    now: u64,
    balances: HashMap<(Address, Address), Amount>,
    accounts: HashMap<Address, MarketAccount>,
    pending_rewards: HashMap<Address, Amount>,
    active_flash_loan: bool,
    strategies: HashMap<Address, StrategyParams>,
    vault_total_debt: Amount,
    vault_debt_ratio: u64,
}

impl PaperVenue {
    pub fn new(config: PaperVenueConfig) -> Self {
        let mut venue = Self {
            now: config.start_time,
            balances: HashMap::new(),
            accounts: HashMap::new(),
            pending_rewards: HashMap::new(),
            active_flash_loan: false,
            strategies: HashMap::new(),
            vault_total_debt: Amount::ZERO,
            vault_debt_ratio: 0,
            config,
        };
        let (want, market, lender) = (venue.config.want, venue.config.market, venue.config.flash_lender);
        venue.mint(want, market, venue.config.market_liquidity);
        venue.mint(want, lender, venue.config.flash_liquidity);
        venue
    }

    pub fn config(&self) -> &PaperVenueConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Test / simulation hooks
    // -----------------------------------------------------------------------

    pub fn mint(&mut self, token: Address, to: Address, amount: Amount) {
        *self.balances.entry((token, to)).or_default() += amount;
    }

    /// Move time forward, accruing interest and reward emissions.
    pub fn advance(&mut self, seconds: u64) {
        let elapsed = U256::from(seconds);
        let year_bps = U256::from(SECONDS_PER_YEAR) * U256::from(MAX_BPS);
        let supply_rate = U256::from(self.config.supply_apr_bps) * elapsed;
        let borrow_rate = U256::from(self.config.borrow_apr_bps) * elapsed;
        let emission_rate = U256::from(self.config.reward_emission_bps) * elapsed;

        let mut supply_interest = Amount::ZERO;
        let mut borrow_interest = Amount::ZERO;
        for (owner, account) in self.accounts.iter_mut() {
            let earned = account.deposits * supply_rate / year_bps;
            let owed = account.borrows * borrow_rate / year_bps;
            account.deposits += earned;
            account.borrows += owed;
            supply_interest += earned;
            borrow_interest += owed;

            let emitted = (account.deposits + account.borrows) * emission_rate / year_bps;
            if !emitted.is_zero() {
                *self.pending_rewards.entry(*owner).or_default() += emitted;
            }
        }
        // Reserve covers the supply/borrow spread so withdrawals stay liquid.
        let (want, market) = (self.config.want, self.config.market);
        self.mint(want, market, supply_interest.saturating_sub(borrow_interest));
        self.now += seconds;

        debug!(
            seconds,
            supply_interest = %supply_interest,
            borrow_interest = %borrow_interest,
            "paper venue advanced"
        );
    }

    /// Write down an account's deposits, simulating a market-side loss.
    pub fn slash_deposits(&mut self, account: Address, amount: Amount) {
        let entry = self.accounts.entry(account).or_default();
        entry.deposits = entry.deposits.saturating_sub(amount);
    }

    pub fn set_reward_price(&mut self, router: SwapRouterKind, price: Wad) {
        self.config.reward_prices.insert(router, price);
    }

    pub fn set_flash_liquidity(&mut self, amount: Amount) {
        let (want, lender) = (self.config.want, self.config.flash_lender);
        self.balances.insert((want, lender), amount);
    }

    pub fn set_market_liquidity(&mut self, amount: Amount) {
        let (want, market) = (self.config.want, self.config.market);
        self.balances.insert((want, market), amount);
    }

    // -----------------------------------------------------------------------
    // Vault administration
    // -----------------------------------------------------------------------

    pub fn add_strategy(&mut self, strategy: Address, debt_ratio: u64) -> Result<(), MarketError> {
        if self.vault_debt_ratio + debt_ratio > MAX_BPS {
            return Err(MarketError::InsufficientLiquidity {
                available: U256::from(MAX_BPS - self.vault_debt_ratio),
                requested: U256::from(debt_ratio),
            });
        }
        self.strategies.insert(
            strategy,
            StrategyParams {
                activation: self.now,
                debt_ratio,
                last_report: self.now,
                ..Default::default()
            },
        );
        self.vault_debt_ratio += debt_ratio;
        info!(strategy = %strategy, debt_ratio, "strategy added to vault");
        Ok(())
    }

    pub fn update_debt_ratio(&mut self, strategy: Address, debt_ratio: u64) -> Result<(), MarketError> {
        let params = self
            .strategies
            .get_mut(&strategy)
            .ok_or(MarketError::UnknownStrategy(strategy))?;
        let others = self.vault_debt_ratio - params.debt_ratio;
        if others + debt_ratio > MAX_BPS {
            return Err(MarketError::InsufficientLiquidity {
                available: U256::from(MAX_BPS - others),
                requested: U256::from(debt_ratio),
            });
        }
        self.vault_debt_ratio = others + debt_ratio;
        params.debt_ratio = debt_ratio;
        Ok(())
    }

    /// User deposit into the vault. Mints shares 1:1 on an empty vault,
    /// pro rata to total assets otherwise.
    pub fn deposit(&mut self, user: Address, amount: Amount) -> Result<Amount, MarketError> {
        let (want, vault) = (self.config.want, self.config.vault);
        let supply = self.total_shares();
        let total_assets = self.total_assets();
        let shares = if supply.is_zero() || total_assets.is_zero() {
            amount
        } else {
            amount * supply / total_assets
        };
        self.transfer(want, user, vault, amount)?;
        self.mint(vault, user, shares);
        Ok(shares)
    }

    /// Idle want plus debt lent to strategies.
    pub fn total_assets(&self) -> Amount {
        self.balance_of(self.config.want, self.config.vault) + self.vault_total_debt
    }

    pub fn total_shares(&self) -> Amount {
        let share = self.config.vault;
        self.balances
            .iter()
            .filter(|((token, _), _)| *token == share)
            .fold(Amount::ZERO, |acc, (_, bal)| acc + *bal)
    }

    fn debt_limit(&self, params: &StrategyParams) -> Amount {
        self.total_assets() * U256::from(params.debt_ratio) / U256::from(MAX_BPS)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Token Ledger
// ═══════════════════════════════════════════════════════════════════════════

impl TokenLedger for PaperVenue {
    fn balance_of(&self, token: Address, owner: Address) -> Amount {
        self.balances.get(&(token, owner)).copied().unwrap_or_default()
    }

    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: Amount) -> Result<(), MarketError> {
        if amount.is_zero() {
            return Ok(());
        }
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(MarketError::InsufficientBalance {
                token,
                available,
                requested: amount,
            });
        }
        self.balances.insert((token, from), available - amount);
        *self.balances.entry((token, to)).or_default() += amount;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Lending Market
// ═══════════════════════════════════════════════════════════════════════════

impl PaperVenue {
    fn check_asset(&self, asset: Address) -> Result<(), MarketError> {
        if asset == self.config.want {
            Ok(())
        } else {
            Err(MarketError::UnsupportedAsset(asset))
        }
    }

    fn market_cash(&self) -> Amount {
        self.balance_of(self.config.want, self.config.market)
    }

    fn ensure_cash(&self, requested: Amount) -> Result<(), MarketError> {
        let available = self.market_cash();
        if available < requested {
            return Err(MarketError::InsufficientLiquidity { available, requested });
        }
        Ok(())
    }
}

impl LendingMarket for PaperVenue {
    fn supply(&mut self, account: Address, asset: Address, amount: Amount) -> Result<(), MarketError> {
        self.check_asset(asset)?;
        self.transfer(asset, account, self.config.market, amount)?;
        self.accounts.entry(account).or_default().deposits += amount;
        Ok(())
    }

    fn borrow(&mut self, account: Address, asset: Address, amount: Amount) -> Result<(), MarketError> {
        self.check_asset(asset)?;
        let state = self.accounts.get(&account).copied().unwrap_or_default();
        let cap = state.deposits * U256::from(self.config.ltv_bps) / U256::from(MAX_BPS);
        if state.borrows + amount > cap {
            return Err(MarketError::BorrowCapExceeded {
                available: cap.saturating_sub(state.borrows),
                requested: amount,
            });
        }
        self.ensure_cash(amount)?;
        self.transfer(asset, self.config.market, account, amount)?;
        self.accounts.entry(account).or_default().borrows += amount;
        Ok(())
    }

    fn repay(&mut self, account: Address, asset: Address, amount: Amount) -> Result<Amount, MarketError> {
        self.check_asset(asset)?;
        let owed = self.accounts.get(&account).map(|a| a.borrows).unwrap_or_default();
        let repaid = amount.min(owed);
        self.transfer(asset, account, self.config.market, repaid)?;
        self.accounts.entry(account).or_default().borrows -= repaid;
        Ok(repaid)
    }

    fn withdraw(&mut self, account: Address, asset: Address, amount: Amount) -> Result<Amount, MarketError> {
        self.check_asset(asset)?;
        let state = self.accounts.get(&account).copied().unwrap_or_default();
        let withdrawn = amount.min(state.deposits);
        let remaining = state.deposits - withdrawn;
        let threshold = U256::from(self.config.liquidation_threshold_bps);
        if state.borrows * U256::from(MAX_BPS) > remaining * threshold {
            return Err(MarketError::HealthFactorTooLow { requested: amount });
        }
        self.ensure_cash(withdrawn)?;
        self.transfer(asset, self.config.market, account, withdrawn)?;
        self.accounts.entry(account).or_default().deposits = remaining;
        Ok(withdrawn)
    }

    fn account_data(&self, account: Address, asset: Address) -> AccountData {
        let state = if asset == self.config.want {
            self.accounts.get(&account).copied().unwrap_or_default()
        } else {
            MarketAccount::default()
        };
        AccountData {
            deposits: state.deposits,
            borrows: state.borrows,
            liquidation_threshold: Wad::from_bps(self.config.liquidation_threshold_bps),
            ltv: Wad::from_bps(self.config.ltv_bps),
        }
    }

    fn reserve_config(&self, asset: Address) -> Result<ReserveConfig, MarketError> {
        self.check_asset(asset)?;
        Ok(ReserveConfig {
            ltv: Wad::from_bps(self.config.ltv_bps),
            liquidation_threshold: Wad::from_bps(self.config.liquidation_threshold_bps),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Flash Lender
// ═══════════════════════════════════════════════════════════════════════════

impl FlashLender for PaperVenue {
    fn max_flash_loan(&self, asset: Address) -> Amount {
        if asset != self.config.want {
            return Amount::ZERO;
        }
        self.balance_of(asset, self.config.flash_lender)
    }

    fn flash_fee(&self, _asset: Address, amount: Amount) -> Amount {
        self.config.flash_fee_flat + amount * U256::from(self.config.flash_fee_bps) / U256::from(MAX_BPS)
    }

    fn flash_borrow(&mut self, borrower: Address, asset: Address, amount: Amount) -> Result<FlashLoan, MarketError> {
        self.check_asset(asset)?;
        if self.active_flash_loan {
            return Err(MarketError::NestedFlashLoan);
        }
        let available = self.max_flash_loan(asset);
        if amount > available {
            return Err(MarketError::InsufficientLiquidity {
                available,
                requested: amount,
            });
        }
        let fee = self.flash_fee(asset, amount);
        self.transfer(asset, self.config.flash_lender, borrower, amount)?;
        self.active_flash_loan = true;
        debug!(borrower = %borrower, principal = %amount, fee = %fee, "flash loan issued");
        Ok(FlashLoan::new(borrower, asset, amount, fee))
    }

    fn flash_repay(&mut self, loan: FlashLoan) -> Result<(), MarketError> {
        let owed = loan.owed();
        let balance = self.balance_of(loan.asset, loan.borrower);
        if balance < owed {
            return Err(MarketError::FlashLoanNotRepaid { owed, balance });
        }
        self.transfer(loan.asset, loan.borrower, self.config.flash_lender, owed)?;
        self.active_flash_loan = false;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Vault
// ═══════════════════════════════════════════════════════════════════════════

impl Vault for PaperVenue {
    fn vault_address(&self) -> Address {
        self.config.vault
    }

    fn want(&self) -> Address {
        self.config.want
    }

    fn strategy_params(&self, strategy: Address) -> Result<StrategyParams, MarketError> {
        self.strategies
            .get(&strategy)
            .copied()
            .ok_or(MarketError::UnknownStrategy(strategy))
    }

    fn debt_outstanding(&self, strategy: Address) -> Amount {
        let Some(params) = self.strategies.get(&strategy) else {
            return Amount::ZERO;
        };
        if params.debt_ratio == 0 {
            return params.total_debt;
        }
        params.total_debt.saturating_sub(self.debt_limit(params))
    }

    fn credit_available(&self, strategy: Address) -> Amount {
        let Some(params) = self.strategies.get(&strategy) else {
            return Amount::ZERO;
        };
        let limit = self.debt_limit(params);
        if params.total_debt >= limit {
            return Amount::ZERO;
        }
        let vault_limit = self.total_assets() * U256::from(self.vault_debt_ratio) / U256::from(MAX_BPS);
        let vault_room = vault_limit.saturating_sub(self.vault_total_debt);
        let idle = self.balance_of(self.config.want, self.config.vault);
        (limit - params.total_debt).min(vault_room).min(idle)
    }

    fn report_harvest(&mut self, strategy: Address, report: HarvestReport) -> Result<Amount, MarketError> {
        let mut params = self.strategy_params(strategy)?;
        let (want, vault) = (self.config.want, self.config.vault);

        if !report.loss.is_zero() {
            let loss = report.loss.min(params.total_debt);
            params.total_loss += loss;
            params.total_debt -= loss;
            self.vault_total_debt -= loss;
        }
        params.total_gain += report.profit;
        self.strategies.insert(strategy, params);

        let debt = self.debt_outstanding(strategy);
        let debt_payment = report.debt_payment.min(debt);
        self.transfer(want, strategy, vault, report.profit + debt_payment)?;
        params.total_debt -= debt_payment;
        self.vault_total_debt -= debt_payment;
        self.strategies.insert(strategy, params);

        let credit = self.credit_available(strategy);
        self.transfer(want, vault, strategy, credit)?;
        params.total_debt += credit;
        params.last_report = self.now;
        self.vault_total_debt += credit;
        self.strategies.insert(strategy, params);

        let outstanding = self.debt_outstanding(strategy);
        debug!(
            strategy = %strategy,
            profit = %report.profit,
            loss = %report.loss,
            debt_payment = %debt_payment,
            credit = %credit,
            total_debt = %params.total_debt,
            "vault processed report"
        );
        Ok(outstanding)
    }

    fn settle_withdrawal(&mut self, strategy: Address, withdrawn: Amount, loss: Amount) -> Result<(), MarketError> {
        let mut params = self.strategy_params(strategy)?;
        let reduction = (withdrawn + loss).min(params.total_debt);
        params.total_debt -= reduction;
        params.total_loss += loss;
        self.vault_total_debt -= reduction;
        self.strategies.insert(strategy, params);
        Ok(())
    }

    fn revoke_strategy(&mut self, strategy: Address) -> Result<(), MarketError> {
        self.update_debt_ratio(strategy, 0)
    }

    fn migrate_strategy(&mut self, old: Address, new: Address) -> Result<(), MarketError> {
        let params = self
            .strategies
            .remove(&old)
            .ok_or(MarketError::UnknownStrategy(old))?;
        self.strategies.insert(
            new,
            StrategyParams {
                activation: self.now,
                ..params
            },
        );
        info!(old = %old, new = %new, total_debt = %params.total_debt, "strategy migrated");
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Rewards
// ═══════════════════════════════════════════════════════════════════════════

impl RewardsController for PaperVenue {
    fn reward_token(&self) -> Address {
        self.config.reward_token
    }

    fn pending_rewards(&self, account: Address) -> Amount {
        self.pending_rewards.get(&account).copied().unwrap_or_default()
    }

    fn claim_rewards(&mut self, account: Address) -> Result<Amount, MarketError> {
        let claimed = self.pending_rewards.remove(&account).unwrap_or_default();
        let token = self.config.reward_token;
        self.mint(token, account, claimed);
        Ok(claimed)
    }
}

impl SwapRouter for PaperVenue {
    fn quote(&self, router: SwapRouterKind, from: Address, to: Address, amount: Amount) -> Amount {
        if from != self.config.reward_token || to != self.config.want {
            return Amount::ZERO;
        }
        let price = self.config.reward_prices.get(&router).copied().unwrap_or_default();
        amount * price.raw() / WAD
    }

    fn sell(
        &mut self,
        router: SwapRouterKind,
        account: Address,
        from: Address,
        to: Address,
        amount: Amount,
        min_out: Amount,
    ) -> Result<Amount, MarketError> {
        let received = self.quote(router, from, to, amount);
        if received < min_out {
            return Err(MarketError::SlippageExceeded { received, min_out });
        }
        self.transfer(from, account, self.config.router, amount)?;
        self.mint(to, account, received);
        Ok(received)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Time & Atomicity
// ═══════════════════════════════════════════════════════════════════════════

impl Clock for PaperVenue {
    fn now(&self) -> u64 {
        self.now
    }
}

impl Checkpoint for PaperVenue {
    type Snapshot = PaperVenue;

    fn checkpoint(&self) -> Self::Snapshot {
        self.clone()
    }

    fn revert_to(&mut self, snapshot: Self::Snapshot) {
        *self = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(v: u64) -> U256 {
        U256::from(v)
    }

    const USER: Address = Address::repeat_byte(0x77);
    const STRAT: Address = Address::repeat_byte(0x55);

    fn venue() -> PaperVenue {
        PaperVenue::new(PaperVenueConfig::default())
    }

    #[test]
    fn test_borrow_respects_ltv() {
        let mut v = venue();
        let want = v.config().want;
        v.mint(want, STRAT, amt(1_000));
        v.supply(STRAT, want, amt(1_000)).unwrap();
        v.borrow(STRAT, want, amt(750)).unwrap();
        let err = v.borrow(STRAT, want, amt(1)).unwrap_err();
        assert!(matches!(err, MarketError::BorrowCapExceeded { .. }));
    }

    #[test]
    fn test_withdraw_respects_liquidation_threshold() {
        let mut v = venue();
        let want = v.config().want;
        v.mint(want, STRAT, amt(1_000));
        v.supply(STRAT, want, amt(1_000)).unwrap();
        v.borrow(STRAT, want, amt(600)).unwrap();
        // 600 / 750 = 0.8 is exactly the threshold.
        assert_eq!(v.withdraw(STRAT, want, amt(250)).unwrap(), amt(250));
        let err = v.withdraw(STRAT, want, amt(1)).unwrap_err();
        assert!(matches!(err, MarketError::HealthFactorTooLow { .. }));
    }

    #[test]
    fn test_repay_caps_at_debt() {
        let mut v = venue();
        let want = v.config().want;
        v.mint(want, STRAT, amt(1_000));
        v.supply(STRAT, want, amt(500)).unwrap();
        v.borrow(STRAT, want, amt(100)).unwrap();
        assert_eq!(v.repay(STRAT, want, amt(400)).unwrap(), amt(100));
        assert!(v.account_data(STRAT, want).borrows.is_zero());
    }

    #[test]
    fn test_unsupported_asset() {
        let mut v = venue();
        let other = Address::repeat_byte(0x99);
        assert!(matches!(
            v.supply(STRAT, other, amt(1)),
            Err(MarketError::UnsupportedAsset(_))
        ));
        assert!(v.reserve_config(other).is_err());
    }

    #[test]
    fn test_flash_loan_roundtrip_and_nesting() {
        let mut v = venue();
        let want = v.config().want;
        v.mint(want, STRAT, amt(10));
        let loan = v.flash_borrow(STRAT, want, amt(1_000)).unwrap();
        assert_eq!(loan.fee, amt(2));
        assert_eq!(v.flash_borrow(STRAT, want, amt(1)), Err(MarketError::NestedFlashLoan));
        v.flash_repay(loan).unwrap();
        assert_eq!(v.balance_of(want, STRAT), amt(8));
    }

    #[test]
    fn test_flash_repay_short_balance() {
        let mut v = venue();
        let want = v.config().want;
        let loan = v.flash_borrow(STRAT, want, amt(1_000)).unwrap();
        let err = v.flash_repay(loan).unwrap_err();
        assert!(matches!(err, MarketError::FlashLoanNotRepaid { .. }));
    }

    #[test]
    fn test_vault_credit_and_report() {
        let mut v = venue();
        let want = v.config().want;
        v.mint(want, USER, amt(1_000_000));
        v.deposit(USER, amt(1_000_000)).unwrap();
        v.add_strategy(STRAT, 10_000).unwrap();

        assert_eq!(v.credit_available(STRAT), amt(1_000_000));
        let outstanding = v.report_harvest(STRAT, HarvestReport::default()).unwrap();
        assert!(outstanding.is_zero());
        assert_eq!(v.balance_of(want, STRAT), amt(1_000_000));
        assert_eq!(v.strategy_params(STRAT).unwrap().total_debt, amt(1_000_000));

        v.update_debt_ratio(STRAT, 5_000).unwrap();
        assert_eq!(v.debt_outstanding(STRAT), amt(500_000));
        assert!(v.request_debt_change(STRAT).is_negative());

        let outstanding = v
            .report_harvest(
                STRAT,
                HarvestReport {
                    debt_payment: amt(500_000),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(outstanding.is_zero());
        assert_eq!(v.total_assets(), amt(1_000_000));
    }

    #[test]
    fn test_debt_ratio_update_capped_vault_wide() {
        let mut v = venue();
        let other = Address::repeat_byte(0x56);
        v.add_strategy(STRAT, 6_000).unwrap();
        v.add_strategy(other, 3_000).unwrap();

        let err = v.update_debt_ratio(STRAT, 7_500).unwrap_err();
        assert!(matches!(err, MarketError::InsufficientLiquidity { .. }));
        assert_eq!(v.strategy_params(STRAT).unwrap().debt_ratio, 6_000);

        v.update_debt_ratio(STRAT, 7_000).unwrap();
        assert_eq!(v.strategy_params(STRAT).unwrap().debt_ratio, 7_000);
    }

    #[test]
    fn test_revoked_strategy_owes_everything() {
        let mut v = venue();
        let want = v.config().want;
        v.mint(want, USER, amt(1_000));
        v.deposit(USER, amt(1_000)).unwrap();
        v.add_strategy(STRAT, 10_000).unwrap();
        v.report_harvest(STRAT, HarvestReport::default()).unwrap();
        v.revoke_strategy(STRAT).unwrap();
        assert_eq!(v.debt_outstanding(STRAT), amt(1_000));
        assert!(v.credit_available(STRAT).is_zero());
    }

    #[test]
    fn test_advance_accrues_interest_and_rewards() {
        let mut v = PaperVenue::new(PaperVenueConfig {
            supply_apr_bps: 500,
            borrow_apr_bps: 1_000,
            reward_emission_bps: 100,
            ..Default::default()
        });
        let want = v.config().want;
        v.mint(want, STRAT, amt(1_000_000));
        v.supply(STRAT, want, amt(1_000_000)).unwrap();
        v.borrow(STRAT, want, amt(500_000)).unwrap();
        v.advance(SECONDS_PER_YEAR);

        let data = v.account_data(STRAT, want);
        assert_eq!(data.deposits, amt(1_050_000));
        assert_eq!(data.borrows, amt(550_000));
        assert!(!v.pending_rewards(STRAT).is_zero());
    }

    #[test]
    fn test_sell_rewards_at_router_price() {
        let mut v = venue();
        let (want, reward) = (v.config().want, v.config().reward_token);
        v.mint(reward, STRAT, amt(100));
        assert_eq!(v.quote(SwapRouterKind::UniswapV2, reward, want, amt(100)), amt(200));
        let err = v
            .sell(SwapRouterKind::SushiSwap, STRAT, reward, want, amt(100), amt(200))
            .unwrap_err();
        assert!(matches!(err, MarketError::SlippageExceeded { .. }));
        let out = v
            .sell(SwapRouterKind::UniswapV2, STRAT, reward, want, amt(100), amt(200))
            .unwrap();
        assert_eq!(out, amt(200));
        assert!(v.balance_of(reward, STRAT).is_zero());
    }

    #[test]
    fn test_checkpoint_restores_everything() {
        let mut v = venue();
        let want = v.config().want;
        let snap = v.checkpoint();
        v.mint(want, STRAT, amt(5));
        v.supply(STRAT, want, amt(5)).unwrap();
        v.revert_to(snap);
        assert!(v.balance_of(want, STRAT).is_zero());
        assert!(v.account_data(STRAT, want).deposits.is_zero());
    }
}
