use serde::{Deserialize, Serialize};

use super::position::Amount;

/// Swap venue used to liquidate reward tokens into want.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapRouterKind {
    #[default]
    UniswapV2,
    SushiSwap,
    UniswapV3,
}

impl SwapRouterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UniswapV2 => "uniswap_v2",
            Self::SushiSwap => "sushiswap",
            Self::UniswapV3 => "uniswap_v3",
        }
    }

    /// Index used by management calls that pass the router as a number.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::UniswapV2),
            1 => Some(Self::SushiSwap),
            2 => Some(Self::UniswapV3),
            _ => None,
        }
    }
}

/// Governs whether accrued reward tokens are sold during harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBehavior {
    pub router: SwapRouterKind,
    /// Rewards are only sold once their want-denominated value reaches this.
    pub min_reward_to_sell: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_index() {
        assert_eq!(SwapRouterKind::from_index(0), Some(SwapRouterKind::UniswapV2));
        assert_eq!(SwapRouterKind::from_index(2), Some(SwapRouterKind::UniswapV3));
        assert_eq!(SwapRouterKind::from_index(3), None);
    }

    #[test]
    fn test_router_serde_snake_case() {
        let json = serde_json::to_string(&SwapRouterKind::SushiSwap).unwrap();
        assert_eq!(json, "\"sushi_swap\"");
    }
}
