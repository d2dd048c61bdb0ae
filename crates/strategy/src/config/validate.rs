use anyhow::{bail, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::AppSettings;
use crate::constants::{MAX_BPS, MAX_ITERATIONS_CAP};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate invariants across the merged config that serde alone cannot enforce.
///
/// Every problem is collected before failing so one run reports them all.
/// Called automatically by [`super::load_config`]. Checks that need the
/// market's reserve parameters happen again when the strategy is built.
pub fn validate_config(config: &AppSettings) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    validate_app_config(config, &mut errors);
    validate_strategy_config(config, &mut errors);
    validate_keeper_config(config, &mut errors);
    validate_paper_config(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = format!(
            "Configuration validation failed ({} error{}):\n  - {}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            errors.join("\n  - ")
        );
        bail!("{msg}");
    }
}

fn validate_app_config(config: &AppSettings, errors: &mut Vec<String>) {
    if config.app.logging.log_dir.trim().is_empty() {
        errors.push("app.logging: log_dir is empty".into());
    }
    if !LOG_LEVELS.contains(&config.app.logging.level.as_str()) {
        errors.push(format!(
            "app.logging: level '{}' is not one of {}",
            config.app.logging.level,
            LOG_LEVELS.join("/")
        ));
    }
}

// ---------------------------------------------------------------------------
// Strategy config
// ---------------------------------------------------------------------------

fn validate_strategy_config(config: &AppSettings, errors: &mut Vec<String>) {
    let strategy = &config.strategy;

    if let Some(targets) = &strategy.targets {
        for (name, value) in [
            ("target_ratio", targets.target_ratio),
            ("max_ratio", targets.max_ratio),
            ("max_borrow_ratio", targets.max_borrow_ratio),
        ] {
            if let Err(e) = validate_fraction(value) {
                errors.push(format!("strategy.targets.{name}: {e}"));
            }
        }
        if targets.target_ratio.is_zero() {
            errors.push("strategy.targets: target_ratio must be > 0".into());
        }
        if targets.target_ratio >= targets.max_ratio {
            errors.push(format!(
                "strategy.targets: target_ratio ({}) must be < max_ratio ({})",
                targets.target_ratio, targets.max_ratio
            ));
        }
        if targets.max_ratio > targets.max_borrow_ratio {
            errors.push(format!(
                "strategy.targets: max_ratio ({}) must be <= max_borrow_ratio ({})",
                targets.max_ratio, targets.max_borrow_ratio
            ));
        }
    }

    let policy = &strategy.loop_policy;
    if policy.max_iterations == 0 || policy.max_iterations > MAX_ITERATIONS_CAP {
        errors.push(format!(
            "strategy.loop_policy: max_iterations ({}) must be in 1..={MAX_ITERATIONS_CAP}",
            policy.max_iterations
        ));
    }
    if let Err(e) = validate_fraction(policy.min_ratio) {
        errors.push(format!("strategy.loop_policy.min_ratio: {e}"));
    }
    if let Some(targets) = &strategy.targets {
        if policy.min_ratio >= targets.max_borrow_ratio {
            errors.push(format!(
                "strategy.loop_policy: min_ratio ({}) must be < max_borrow_ratio ({})",
                policy.min_ratio, targets.max_borrow_ratio
            ));
        }
    }

    let report = &strategy.report;
    if report.min_report_delay_seconds > report.max_report_delay_seconds {
        errors.push(format!(
            "strategy.report: min_report_delay_seconds ({}) must be <= max_report_delay_seconds ({})",
            report.min_report_delay_seconds, report.max_report_delay_seconds
        ));
    }

    let health = &strategy.health_check;
    if health.enabled {
        for (name, bps) in [
            ("profit_limit_bps", health.profit_limit_bps),
            ("loss_limit_bps", health.loss_limit_bps),
        ] {
            if bps > MAX_BPS {
                errors.push(format!("strategy.health_check.{name}: {bps} exceeds {MAX_BPS}"));
            }
        }
    }
}

/// Ratios are fractions in `[0, 1)`.
fn validate_fraction(value: Decimal) -> Result<(), String> {
    if value.is_sign_negative() {
        return Err(format!("{value} is negative"));
    }
    if value >= dec!(1) {
        return Err(format!("{value} must be < 1"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Keeper / paper config
// ---------------------------------------------------------------------------

fn validate_keeper_config(config: &AppSettings, errors: &mut Vec<String>) {
    let keeper = &config.keeper;
    if keeper.interval_seconds == 0 {
        errors.push("keeper: interval_seconds must be > 0".into());
    }
    if keeper.max_ticks == Some(0) {
        errors.push("keeper: max_ticks must be > 0 when set".into());
    }
}

fn validate_paper_config(config: &AppSettings, errors: &mut Vec<String>) {
    let paper = &config.paper;
    if paper.ltv_bps == 0 || paper.ltv_bps > paper.liquidation_threshold_bps {
        errors.push(format!(
            "paper: ltv_bps ({}) must be in 1..=liquidation_threshold_bps ({})",
            paper.ltv_bps, paper.liquidation_threshold_bps
        ));
    }
    if paper.liquidation_threshold_bps >= MAX_BPS {
        errors.push(format!(
            "paper: liquidation_threshold_bps ({}) must be < {MAX_BPS}",
            paper.liquidation_threshold_bps
        ));
    }
    if paper.debt_ratio_bps > MAX_BPS {
        errors.push(format!("paper: debt_ratio_bps ({}) exceeds {MAX_BPS}", paper.debt_ratio_bps));
    }
    if paper.initial_deposit == 0 {
        errors.push("paper: initial_deposit must be > 0".into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_fraction_bounds() {
        assert!(validate_fraction(dec!(0)).is_ok());
        assert!(validate_fraction(dec!(0.745)).is_ok());
        assert!(validate_fraction(dec!(1)).unwrap_err().contains("must be < 1"));
        assert!(validate_fraction(dec!(-0.1)).unwrap_err().contains("negative"));
    }
}
