use crate::config::{EngineConfig, LogConfig};
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Replay a journal of transfers and fraud decisions against an in-memory bank
#[derive(Parser, Debug)]
#[command(name = "transfer-engine")]
#[command(about = "Replay transfers and fraud decisions, print final account balances", long_about = None)]
pub struct CliArgs {
    /// Command journal CSV
    #[arg(value_name = "INPUT", help = "Path to the command journal CSV file")]
    pub input_file: PathBuf,

    /// User roster CSV
    #[arg(long = "users", value_name = "USERS", help = "Path to the users CSV file")]
    pub users_file: PathBuf,

    /// Replay strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Replay strategy: 'sync' for in-order or 'async' for batched concurrent replay"
    )]
    pub strategy: StrategyType,

    /// Number of commands per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// YAML engine configuration
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Overrides `starter_balance` from the configuration
    #[arg(long = "starter-balance", value_name = "AMOUNT")]
    pub starter_balance: Option<Decimal>,

    /// Overrides `fraud_threshold` from the configuration
    #[arg(long = "fraud-threshold", value_name = "AMOUNT")]
    pub fraud_threshold: Option<Decimal>,

    /// Write the ledger CSV here
    #[arg(long = "ledger-out", value_name = "FILE")]
    pub ledger_out: Option<PathBuf>,

    /// Write the audit CSV here
    #[arg(long = "audit-out", value_name = "FILE")]
    pub audit_out: Option<PathBuf>,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long = "log-json")]
    pub log_json: bool,
}

/// Available replay strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Falls back to defaults for anything not given; zero values are
    /// replaced by `BatchConfig::new`.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Build the engine configuration
    ///
    /// Starts from the YAML file when `--config` is given, else the defaults,
    /// then applies the flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed.
    pub fn to_engine_config(&self) -> Result<EngineConfig, String> {
        let mut config = match &self.config_file {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };

        if let Some(starter_balance) = self.starter_balance {
            config.starter_balance = starter_balance;
        }
        if let Some(fraud_threshold) = self.fraud_threshold {
            config.fraud_threshold = fraud_threshold;
        }

        Ok(config)
    }

    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            json: self.log_json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[rstest]
    #[case::default_strategy(&["program", "--users", "u.csv", "input.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "--users", "u.csv", "input.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "--users", "u.csv", "input.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
    }

    #[rstest]
    #[case::all_defaults(&["program", "--users", "u.csv", "input.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(&["program", "--users", "u.csv", "--batch-size", "2000", "input.csv"], 2000, num_cpus::get())]
    #[case::custom_max_concurrent(&["program", "--users", "u.csv", "--max-concurrent", "8", "input.csv"], 1000, 8)]
    #[case::zero_batch_size(&["program", "--users", "u.csv", "--batch-size", "0", "input.csv"], 1000, num_cpus::get())]
    #[case::zero_max_concurrent(&["program", "--users", "u.csv", "--max-concurrent", "0", "input.csv"], 1000, num_cpus::get())]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        let config = parsed.to_batch_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_max_concurrent);
    }

    #[test]
    fn test_engine_config_defaults_and_overrides() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--users",
            "u.csv",
            "--fraud-threshold",
            "750.50",
            "input.csv",
        ])
        .unwrap();

        let config = parsed.to_engine_config().unwrap();

        assert_eq!(config.fraud_threshold, Decimal::new(75050, 2));
        assert_eq!(config.starter_balance, Decimal::new(10_000, 0));
    }

    #[test]
    fn test_engine_config_file_then_flags() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"starter_balance: 250\nbank_name: TestBank\n")
            .unwrap();
        file.flush().unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let parsed = CliArgs::try_parse_from([
            "program",
            "--users",
            "u.csv",
            "--config",
            path.as_str(),
            "--starter-balance",
            "500",
            "input.csv",
        ])
        .unwrap();
        let config = parsed.to_engine_config().unwrap();

        assert_eq!(config.bank_name, "TestBank");
        assert_eq!(config.starter_balance, Decimal::new(500, 0));
    }

    #[test]
    fn test_log_config() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--users",
            "u.csv",
            "--log-level",
            "debug",
            "--log-json",
            "input.csv",
        ])
        .unwrap();

        assert_eq!(
            parsed.to_log_config(),
            LogConfig {
                level: "debug".to_string(),
                json: true
            }
        );
        assert_eq!(parsed.ledger_out, None);
    }

    #[rstest]
    #[case::missing_input(&["program", "--users", "u.csv"])]
    #[case::missing_users(&["program", "input.csv"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "--users", "u.csv", "input.csv"])]
    #[case::invalid_threshold(&["program", "--users", "u.csv", "--fraud-threshold", "lots", "input.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        let result = CliArgs::try_parse_from(args);
        assert!(result.is_err());
    }
}
