pub mod position;
pub mod report;
pub mod rewards;
pub mod wad;

pub use position::*;
pub use report::*;
pub use rewards::*;
pub use wad::{amount_to_decimal, Wad, WAD_U256};
