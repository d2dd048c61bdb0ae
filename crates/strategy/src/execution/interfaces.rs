//! Collaborator contracts consumed by the controller.
//!
//! The vault, lending market, flash lender, reward router and rewards
//! controller are black boxes; the controller only relies on the pre/post
//! conditions documented here. A concrete backend implements every trait and
//! gets [`Venue`] for free.

use alloy_primitives::{Address, I256};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::MarketError;
use crate::types::{Amount, HarvestReport, SwapRouterKind, Wad};

// ---------------------------------------------------------------------------
// Lending market
// ---------------------------------------------------------------------------

/// Aggregate account state for one asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountData {
    pub deposits: Amount,
    pub borrows: Amount,
    pub liquidation_threshold: Wad,
    pub ltv: Wad,
}

/// Risk parameters of a reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveConfig {
    /// Max borrow / deposit when opening new debt.
    pub ltv: Wad,
    /// Borrow / deposit at which the account becomes liquidatable.
    pub liquidation_threshold: Wad,
}

/// Money-market primitives. Supply and repay pull from the account's token
/// balance; borrow and withdraw credit it.
pub trait LendingMarket {
    fn supply(&mut self, account: Address, asset: Address, amount: Amount) -> Result<(), MarketError>;

    /// Fails with `BorrowCapExceeded` if borrows would exceed `deposits * ltv`.
    fn borrow(&mut self, account: Address, asset: Address, amount: Amount) -> Result<(), MarketError>;

    /// Repays up to `amount`; returns the amount actually repaid.
    fn repay(&mut self, account: Address, asset: Address, amount: Amount) -> Result<Amount, MarketError>;

    /// Withdraws up to `amount`; returns the amount actually withdrawn. Fails
    /// if the account would end above its liquidation threshold.
    fn withdraw(&mut self, account: Address, asset: Address, amount: Amount) -> Result<Amount, MarketError>;

    fn account_data(&self, account: Address, asset: Address) -> AccountData;

    fn reserve_config(&self, asset: Address) -> Result<ReserveConfig, MarketError>;
}

// ---------------------------------------------------------------------------
// Flash loans
// ---------------------------------------------------------------------------

/// Outstanding flash loan. Must be handed back to [`FlashLender::flash_repay`]
/// before the enclosing operation ends.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a flash loan must be repaid within the same operation"]
pub struct FlashLoan {
    pub borrower: Address,
    pub asset: Address,
    pub principal: Amount,
    pub fee: Amount,
}

impl FlashLoan {
    pub fn new(borrower: Address, asset: Address, principal: Amount, fee: Amount) -> Self {
        Self {
            borrower,
            asset,
            principal,
            fee,
        }
    }

    /// Principal plus fee.
    pub fn owed(&self) -> Amount {
        self.principal + self.fee
    }
}

pub trait FlashLender {
    /// Largest principal the provider can lend right now.
    fn max_flash_loan(&self, asset: Address) -> Amount;

    fn flash_fee(&self, asset: Address, amount: Amount) -> Amount;

    /// Credits `amount` to `borrower` and returns the repayment ticket.
    fn flash_borrow(&mut self, borrower: Address, asset: Address, amount: Amount) -> Result<FlashLoan, MarketError>;

    /// Pulls principal + fee from the borrower. Fails with
    /// `FlashLoanNotRepaid` if the balance is short.
    fn flash_repay(&mut self, loan: FlashLoan) -> Result<(), MarketError>;
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// Vault-side accounting for one strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyParams {
    /// Timestamp the strategy was added; zero when unknown.
    pub activation: u64,
    /// Share of vault assets allocated to the strategy, in bps.
    pub debt_ratio: u64,
    pub last_report: u64,
    pub total_debt: Amount,
    pub total_gain: Amount,
    pub total_loss: Amount,
}

pub trait Vault {
    /// Address funds are returned to. Also the vault share token.
    fn vault_address(&self) -> Address;

    fn want(&self) -> Address;

    fn share_token(&self) -> Address {
        self.vault_address()
    }

    fn strategy_params(&self, strategy: Address) -> Result<StrategyParams, MarketError>;

    /// Amount the vault wants back from the strategy.
    fn debt_outstanding(&self, strategy: Address) -> Amount;

    /// Amount the vault is willing to lend the strategy on next report.
    fn credit_available(&self, strategy: Address) -> Amount;

    /// Signed debt delta: positive = funds to deploy, negative = funds to return.
    fn request_debt_change(&self, strategy: Address) -> I256 {
        let credit = I256::try_from(self.credit_available(strategy)).unwrap_or(I256::MAX);
        let outstanding = I256::try_from(self.debt_outstanding(strategy)).unwrap_or(I256::MAX);
        credit.saturating_sub(outstanding)
    }

    /// Current allocation in bps; zero means the allocation was revoked.
    fn current_debt_ratio(&self, strategy: Address) -> u64 {
        self.strategy_params(strategy)
            .map(|p| p.debt_ratio)
            .unwrap_or_default()
    }

    /// Records the harvest, pulls `profit + debt_payment` from the strategy,
    /// sends new credit, and returns the debt still outstanding.
    fn report_harvest(&mut self, strategy: Address, report: HarvestReport) -> Result<Amount, MarketError>;

    /// Book-keeping after a vault-initiated withdrawal.
    fn settle_withdrawal(&mut self, strategy: Address, withdrawn: Amount, loss: Amount) -> Result<(), MarketError>;

    fn revoke_strategy(&mut self, strategy: Address) -> Result<(), MarketError>;

    fn migrate_strategy(&mut self, old: Address, new: Address) -> Result<(), MarketError>;
}

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

pub trait RewardsController {
    fn reward_token(&self) -> Address;

    /// Rewards accrued to `account` but not yet claimed.
    fn pending_rewards(&self, account: Address) -> Amount;

    /// Transfers pending rewards to `account`; returns the amount claimed.
    fn claim_rewards(&mut self, account: Address) -> Result<Amount, MarketError>;
}

pub trait SwapRouter {
    /// Expected output of selling `amount` of `from` for `to`.
    fn quote(&self, router: SwapRouterKind, from: Address, to: Address, amount: Amount) -> Amount;

    /// Sells from `account`'s balance; returns the amount received.
    fn sell(
        &mut self,
        router: SwapRouterKind,
        account: Address,
        from: Address,
        to: Address,
        amount: Amount,
        min_out: Amount,
    ) -> Result<Amount, MarketError>;
}

// ---------------------------------------------------------------------------
// Tokens, time, atomicity
// ---------------------------------------------------------------------------

pub trait TokenLedger {
    fn balance_of(&self, token: Address, owner: Address) -> Amount;

    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: Amount) -> Result<(), MarketError>;
}

pub trait Clock {
    /// Seconds since the UNIX epoch.
    fn now(&self) -> u64;
}

/// Snapshot/restore of all collaborator state. Every mutating controller
/// operation runs between a checkpoint and either a commit or a revert.
pub trait Checkpoint {
    type Snapshot;

    fn checkpoint(&self) -> Self::Snapshot;

    fn revert_to(&mut self, snapshot: Self::Snapshot);
}

/// Everything a controller operation touches.
pub trait Venue:
    TokenLedger + LendingMarket + FlashLender + Vault + SwapRouter + RewardsController + Clock + Checkpoint
{
}

impl<T> Venue for T where
    T: TokenLedger + LendingMarket + FlashLender + Vault + SwapRouter + RewardsController + Clock + Checkpoint
{
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// External sanity bound on a harvest report.
pub trait HealthCheck: Debug + Send + Sync {
    fn check(&self, report: &HarvestReport, debt_outstanding: Amount, total_debt: Amount) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    struct FixedVault {
        credit: Amount,
        outstanding: Amount,
    }

    impl Vault for FixedVault {
        fn vault_address(&self) -> Address {
            Address::repeat_byte(0xaa)
        }
        fn want(&self) -> Address {
            Address::repeat_byte(0x01)
        }
        fn strategy_params(&self, _strategy: Address) -> Result<StrategyParams, MarketError> {
            Ok(StrategyParams {
                debt_ratio: 5_000,
                ..Default::default()
            })
        }
        fn debt_outstanding(&self, _strategy: Address) -> Amount {
            self.outstanding
        }
        fn credit_available(&self, _strategy: Address) -> Amount {
            self.credit
        }
        fn report_harvest(&mut self, _s: Address, _r: HarvestReport) -> Result<Amount, MarketError> {
            Ok(self.outstanding)
        }
        fn settle_withdrawal(&mut self, _s: Address, _w: Amount, _l: Amount) -> Result<(), MarketError> {
            Ok(())
        }
        fn revoke_strategy(&mut self, _s: Address) -> Result<(), MarketError> {
            Ok(())
        }
        fn migrate_strategy(&mut self, _o: Address, _n: Address) -> Result<(), MarketError> {
            Ok(())
        }
    }

    #[test]
    fn test_request_debt_change_sign() {
        let s = Address::ZERO;
        let v = FixedVault {
            credit: U256::from(100u64),
            outstanding: U256::ZERO,
        };
        assert!(v.request_debt_change(s).is_positive());

        let v = FixedVault {
            credit: U256::ZERO,
            outstanding: U256::from(40u64),
        };
        let delta = v.request_debt_change(s);
        assert!(delta.is_negative());
        assert_eq!(delta.unsigned_abs(), U256::from(40u64));
    }

    #[test]
    fn test_default_share_token_is_vault() {
        let v = FixedVault {
            credit: U256::ZERO,
            outstanding: U256::ZERO,
        };
        assert_eq!(v.share_token(), v.vault_address());
        assert_eq!(v.current_debt_ratio(Address::ZERO), 5_000);
    }

    #[test]
    fn test_flash_loan_owed() {
        let loan = FlashLoan::new(Address::ZERO, Address::ZERO, U256::from(1_000u64), U256::from(2u64));
        assert_eq!(loan.owed(), U256::from(1_002u64));
        let FlashLoan { .. } = loan;
    }
}
