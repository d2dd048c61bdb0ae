pub mod access;
pub mod accounting;
pub mod deleverage;
pub mod health_check;
pub mod leverage;
pub mod position;
pub mod ratio;
pub mod rewards;
pub mod settings;
pub mod strategy;
pub mod triggers;

pub use access::Roles;
pub use health_check::CommonHealthCheck;
pub use settings::{LoopContext, LoopPolicy, ReportSettings, StrategySettings};
pub use strategy::{LeveragedStrategy, StrategyBuilder};
