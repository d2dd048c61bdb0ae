use alloy_primitives::Address;
use thiserror::Error;

use crate::types::{Amount, Wad};

/// Result alias for controller operations.
pub type StrategyResult<T> = Result<T, StrategyError>;

/// Typed error hierarchy for the leverage controller.
///
/// Every mutating operation reports its error synchronously and leaves the
/// position untouched. Nothing is retried internally; the keeper retries on
/// its next scheduled call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    // -- Configuration ------------------------------------------------------
    #[error("invalid collateral target: {reason}")]
    InvalidTarget { reason: String },

    #[error("invalid parameter {param}: {reason}")]
    InvalidParameter { param: &'static str, reason: String },

    // -- Loops --------------------------------------------------------------
    #[error("flash loan of {principal} + fee {fee} cannot be repaid from loop proceeds ({available})")]
    InsufficientLoopLiquidity {
        principal: Amount,
        fee: Amount,
        available: Amount,
    },

    #[error("withdrawing {requested} would push collateral ratio to {resulting_ratio} (max {max_ratio})")]
    ExceedsAvailableCollateral {
        requested: Amount,
        resulting_ratio: Wad,
        max_ratio: Wad,
    },

    // -- Harvest ------------------------------------------------------------
    #[error("health check rejected report: profit {profit}, loss {loss}, debt payment {debt_payment}")]
    HealthCheckFailed {
        profit: Amount,
        loss: Amount,
        debt_payment: Amount,
    },

    // -- Funds protection ---------------------------------------------------
    #[error("sweep of protected token {token} rejected ({label})")]
    AssetMismatch { token: Address, label: &'static str },

    #[error("migration blocked: {remaining} of position still open (dust limit {min_want})")]
    MigrationBlocked { remaining: Amount, min_want: Amount },

    // -- Access ---------------------------------------------------------------
    #[error("caller {caller} is not authorized to {action}")]
    Unauthorized {
        caller: Address,
        action: &'static str,
    },

    // -- Math -----------------------------------------------------------------
    #[error("arithmetic overflow in {context}")]
    MathOverflow { context: &'static str },

    // -- Forwarded ------------------------------------------------------------
    #[error(transparent)]
    Market(#[from] MarketError),
}

impl StrategyError {
    /// Stable code for structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTarget { .. } => "INVALID_TARGET",
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::InsufficientLoopLiquidity { .. } => "INSUFFICIENT_LOOP_LIQUIDITY",
            Self::ExceedsAvailableCollateral { .. } => "EXCEEDS_AVAILABLE_COLLATERAL",
            Self::HealthCheckFailed { .. } => "HEALTH_CHECK_FAILED",
            Self::AssetMismatch { .. } => "ASSET_MISMATCH",
            Self::MigrationBlocked { .. } => "MIGRATION_BLOCKED",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::MathOverflow { .. } => "MATH_OVERFLOW",
            Self::Market(e) => e.code(),
        }
    }

    pub(crate) fn invalid_target(reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            reason: reason.into(),
        }
    }
}

/// Errors raised by the external collaborators (market, flash lender, vault,
/// router, token ledger).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("insufficient {token} balance: available {available}, requested {requested}")]
    InsufficientBalance {
        token: Address,
        available: Amount,
        requested: Amount,
    },

    #[error("market liquidity exhausted: available {available}, requested {requested}")]
    InsufficientLiquidity { available: Amount, requested: Amount },

    #[error("borrow of {requested} exceeds borrowing power {available}")]
    BorrowCapExceeded { available: Amount, requested: Amount },

    #[error("withdrawal of {requested} would leave the account undercollateralized")]
    HealthFactorTooLow { requested: Amount },

    #[error("flash loan not repaid: owed {owed}, balance {balance}")]
    FlashLoanNotRepaid { owed: Amount, balance: Amount },

    #[error("nested flash loan not allowed")]
    NestedFlashLoan,

    #[error("unsupported asset {0}")]
    UnsupportedAsset(Address),

    #[error("strategy {0} is not registered with the vault")]
    UnknownStrategy(Address),

    #[error("swap returned {received}, below minimum {min_out}")]
    SlippageExceeded { received: Amount, min_out: Amount },
}

impl MarketError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientBalance { .. } => "MARKET_INSUFFICIENT_BALANCE",
            Self::InsufficientLiquidity { .. } => "MARKET_INSUFFICIENT_LIQUIDITY",
            Self::BorrowCapExceeded { .. } => "MARKET_BORROW_CAP",
            Self::HealthFactorTooLow { .. } => "MARKET_HEALTH_FACTOR",
            Self::FlashLoanNotRepaid { .. } => "FLASH_NOT_REPAID",
            Self::NestedFlashLoan => "FLASH_NESTED",
            Self::UnsupportedAsset(_) => "MARKET_UNSUPPORTED_ASSET",
            Self::UnknownStrategy(_) => "VAULT_UNKNOWN_STRATEGY",
            Self::SlippageExceeded { .. } => "ROUTER_SLIPPAGE",
        }
    }
}
