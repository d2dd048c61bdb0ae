pub mod types;
pub mod validate;

pub use types::*;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Load and merge all config JSON files into a single [`AppSettings`],
/// then apply environment variable overrides and validate.
///
/// Expected directory layout:
/// ```text
/// config/
///   app.json
///   strategy.json
///   keeper.json
///   paper.json
/// ```
///
/// # Environment variable overrides
///
/// | Env Var                   | Config Field                            |
/// |---------------------------|-----------------------------------------|
/// | `FLASH_LOANS_ACTIVE`      | `strategy.loop_policy.flash_loans_active` |
/// | `TARGET_COLLAT_RATIO`     | `strategy.targets.target_ratio`         |
/// | `MAX_ITERATIONS`          | `strategy.loop_policy.max_iterations`   |
/// | `KEEPER_INTERVAL_SECONDS` | `keeper.interval_seconds`               |
/// | `KEEPER_CALL_COST`        | `keeper.call_cost`                      |
pub fn load_config(config_dir: &Path) -> Result<AppSettings> {
    let read = |name: &str| -> Result<String> {
        let path = config_dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))
    };

    let app: AppConfig = serde_json::from_str(&read("app.json")?).context("parsing app.json")?;

    let strategy: StrategyConfig =
        serde_json::from_str(&read("strategy.json")?).context("parsing strategy.json")?;

    let keeper: KeeperConfig = serde_json::from_str(&read("keeper.json")?).context("parsing keeper.json")?;

    let paper: PaperConfig = serde_json::from_str(&read("paper.json")?).context("parsing paper.json")?;

    let mut config = AppSettings {
        app,
        strategy,
        keeper,
        paper,
    };

    apply_env_overrides(&mut config);
    validate::validate_config(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides to the loaded config.
///
/// Only non-empty env vars take effect. Parse failures are skipped and the
/// JSON value remains.
fn apply_env_overrides(config: &mut AppSettings) {
    // -- Strategy ------------------------------------------------------------
    if let Some(val) = env_bool("FLASH_LOANS_ACTIVE") {
        info!(flash_loans_active = val, "env override: FLASH_LOANS_ACTIVE");
        config.strategy.loop_policy.flash_loans_active = val;
    }

    if let Some(val) = env_decimal("TARGET_COLLAT_RATIO") {
        // Without explicit targets the reserve defaults apply; there is
        // nothing to override.
        if let Some(targets) = config.strategy.targets.as_mut() {
            info!(%val, "env override: TARGET_COLLAT_RATIO");
            targets.target_ratio = val;
        }
    }

    if let Some(val) = env_parse::<u8>("MAX_ITERATIONS") {
        info!(val, "env override: MAX_ITERATIONS");
        config.strategy.loop_policy.max_iterations = val;
    }

    // -- Keeper --------------------------------------------------------------
    if let Some(val) = env_parse::<u64>("KEEPER_INTERVAL_SECONDS") {
        info!(val, "env override: KEEPER_INTERVAL_SECONDS");
        config.keeper.interval_seconds = val;
    }

    if let Some(val) = env_parse::<u64>("KEEPER_CALL_COST") {
        info!(val, "env override: KEEPER_CALL_COST");
        config.keeper.call_cost = val;
    }
}

/// Read a non-empty env var as a `String`.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read a non-empty env var as a bool (`true`, `1`, `yes` → true).
fn env_bool(key: &str) -> Option<bool> {
    env_string(key).map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

/// Read a non-empty env var and parse it as `T`.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

/// Read a non-empty env var and parse it as `Decimal`.
fn env_decimal(key: &str) -> Option<Decimal> {
    env_string(key).and_then(|v| Decimal::from_str(&v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SwapRouterKind;
    use rust_decimal_macros::dec;
    use serial_test::serial;
    use std::path::PathBuf;

    fn project_config_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
    }

    // -----------------------------------------------------------------------
    // Helper: write a minimal set of config JSON files to a temp dir.
    // -----------------------------------------------------------------------

    fn write_test_configs(dir: &Path) {
        std::fs::write(dir.join("app.json"), r#"{ "logging": { "log_dir": "logs" } }"#).unwrap();

        std::fs::write(
            dir.join("strategy.json"),
            r#"{
                "targets": { "target_ratio": "0.6", "max_ratio": "0.7", "max_borrow_ratio": "0.745" },
                "loop_policy": { "min_want": 100, "min_ratio": "0.005", "max_iterations": 6, "flash_loans_active": true },
                "rewards": { "router": "sushi_swap", "min_reward_to_sell": 1000 },
                "report": { "min_report_delay_seconds": 0, "max_report_delay_seconds": 86400, "profit_factor": 100, "debt_threshold": 0 },
                "health_check": { "enabled": true, "profit_limit_bps": 100, "loss_limit_bps": 1 }
            }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("keeper.json"),
            r#"{ "interval_seconds": 10, "call_cost": 500 }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("paper.json"),
            r#"{
                "ltv_bps": 7500,
                "liquidation_threshold_bps": 8000,
                "supply_apr_bps": 0,
                "borrow_apr_bps": 0,
                "reward_emission_bps": 0,
                "flash_fee_flat": 0,
                "flash_fee_bps": 0,
                "initial_deposit": 1000000,
                "debt_ratio_bps": 10000,
                "seconds_per_tick": 3600
            }"#,
        )
        .unwrap();
    }

    /// Remove all override env vars so tests don't interfere with each other.
    fn clean_env() {
        for key in [
            "FLASH_LOANS_ACTIVE",
            "TARGET_COLLAT_RATIO",
            "MAX_ITERATIONS",
            "KEEPER_INTERVAL_SECONDS",
            "KEEPER_CALL_COST",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_load_real_configs() {
        clean_env();
        let dir = project_config_dir();
        if !dir.exists() {
            eprintln!("skipping: config dir not found at {}", dir.display());
            return;
        }
        let config = load_config(&dir).expect("config should load and validate");
        assert!(config.strategy.targets.is_some());
        assert!(config.strategy.health_check.enabled);
        assert!(config.keeper.interval_seconds > 0);
    }

    #[test]
    #[serial]
    fn test_load_test_configs() {
        clean_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        let config = load_config(tmp.path()).expect("test config should load");

        assert_eq!(config.strategy.rewards.router, SwapRouterKind::SushiSwap);
        assert_eq!(config.keeper.max_ticks, None);
        let targets = config.strategy.targets.unwrap().to_targets().unwrap();
        assert_eq!(targets.target_ratio.to_decimal(), dec!(0.6));
        let policy = config.strategy.loop_policy.to_policy().unwrap();
        assert_eq!(policy.max_iterations, 6);
        assert!(config.strategy.health_check.to_health_check().is_some());
    }

    #[test]
    #[serial]
    fn test_missing_config_file_errors() {
        clean_env();
        let tmp = tempfile::tempdir().unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(
            err.to_string().contains("failed to read config file"),
            "expected file-not-found error, got: {err}"
        );
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clean_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("FLASH_LOANS_ACTIVE", "false");
        std::env::set_var("TARGET_COLLAT_RATIO", "0.55");
        std::env::set_var("MAX_ITERATIONS", "9");
        std::env::set_var("KEEPER_INTERVAL_SECONDS", "60");
        std::env::set_var("KEEPER_CALL_COST", "42");

        let config = load_config(tmp.path()).unwrap();
        assert!(!config.strategy.loop_policy.flash_loans_active);
        assert_eq!(config.strategy.targets.unwrap().target_ratio, dec!(0.55));
        assert_eq!(config.strategy.loop_policy.max_iterations, 9);
        assert_eq!(config.keeper.interval_seconds, 60);
        assert_eq!(config.keeper.call_cost, 42);
        clean_env();
    }

    #[test]
    #[serial]
    fn test_env_override_empty_or_invalid_ignored() {
        clean_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("KEEPER_CALL_COST", "");
        std::env::set_var("MAX_ITERATIONS", "lots");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.keeper.call_cost, 500);
        assert_eq!(config.strategy.loop_policy.max_iterations, 6);
        clean_env();
    }

    #[test]
    #[serial]
    fn test_validation_collects_all_errors() {
        clean_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        // Target above max and too many iterations.
        std::env::set_var("TARGET_COLLAT_RATIO", "0.72");
        std::env::set_var("MAX_ITERATIONS", "40");
        let err = load_config(tmp.path()).unwrap_err().to_string();
        assert!(err.contains("2 errors"), "got: {err}");
        assert!(err.contains("target_ratio"));
        assert!(err.contains("max_iterations"));
        clean_env();
    }
}
