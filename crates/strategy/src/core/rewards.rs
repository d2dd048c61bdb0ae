//! Reward claiming and liquidation into want.

use alloy_primitives::Address;
use tracing::{debug, info};

use crate::errors::StrategyResult;
use crate::execution::Venue;
use crate::types::{Amount, RewardBehavior, SwapRouterKind};

/// Claim pending rewards and sell the full reward balance through the
/// configured router, provided the quote reaches `min_reward_to_sell`.
/// Returns the want received.
pub fn claim_and_sell<V: Venue>(
    venue: &mut V,
    account: Address,
    want: Address,
    behavior: &RewardBehavior,
) -> StrategyResult<Amount> {
    if !venue.pending_rewards(account).is_zero() {
        let claimed = venue.claim_rewards(account)?;
        debug!(claimed = %claimed, "rewards claimed");
    }

    let token = venue.reward_token();
    let balance = venue.balance_of(token, account);
    if balance.is_zero() {
        return Ok(Amount::ZERO);
    }

    let quoted = venue.quote(behavior.router, token, want, balance);
    if quoted < behavior.min_reward_to_sell {
        debug!(
            quoted = %quoted,
            min_reward_to_sell = %behavior.min_reward_to_sell,
            "rewards below sell threshold"
        );
        return Ok(Amount::ZERO);
    }

    let received = venue.sell(behavior.router, account, token, want, balance, quoted)?;
    info!(
        router = behavior.router.as_str(),
        sold = %balance,
        received = %received,
        "rewards sold"
    );
    Ok(received)
}

/// Want-denominated value of held plus pending rewards at `router`'s quote.
pub fn estimated_rewards_in_want<V: Venue>(
    venue: &V,
    account: Address,
    want: Address,
    router: SwapRouterKind,
) -> Amount {
    let token = venue.reward_token();
    let held = venue.balance_of(token, account) + venue.pending_rewards(account);
    if held.is_zero() {
        return Amount::ZERO;
    }
    venue.quote(router, token, want, held)
}
