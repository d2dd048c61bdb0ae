//! Leveraged lending strategy controller.
//!
//! Keeps a single-asset position on a lending market at a target
//! borrow / deposit ratio by looping supply and borrow (optionally through a
//! flash loan), harvests reward tokens into the asset, and reports profit,
//! loss and debt repayment to the vault that funds it.

pub mod config;
pub mod constants;
pub mod core;
pub mod errors;
pub mod execution;
pub mod keeper;
pub mod logging;
pub mod types;
