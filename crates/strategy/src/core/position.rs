//! Position reader.

use alloy_primitives::Address;

use crate::execution::{LendingMarket, TokenLedger};
use crate::types::{Amount, Position};

/// Current deposits and borrows of `account` in the `want` reserve.
pub fn read_position<M: LendingMarket + ?Sized>(market: &M, account: Address, want: Address) -> Position {
    let data = market.account_data(account, want);
    Position::new(data.deposits, data.borrows)
}

/// Want held by the strategy outside the market.
pub fn idle_want<L: TokenLedger + ?Sized>(ledger: &L, account: Address, want: Address) -> Amount {
    ledger.balance_of(want, account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{PaperVenue, PaperVenueConfig};
    use alloy_primitives::U256;

    #[test]
    fn test_read_position_reflects_market() {
        let mut venue = PaperVenue::new(PaperVenueConfig::default());
        let want = venue.config().want;
        let account = Address::repeat_byte(0x42);
        assert!(read_position(&venue, account, want).is_empty());

        venue.mint(want, account, U256::from(1_000u64));
        venue.supply(account, want, U256::from(800u64)).unwrap();
        venue.borrow(account, want, U256::from(300u64)).unwrap();

        let position = read_position(&venue, account, want);
        assert_eq!(position, Position::new(U256::from(800u64), U256::from(300u64)));
        assert_eq!(idle_want(&venue, account, want), U256::from(500u64));
    }
}
