//! Rust Transfer Engine CLI
//!
//! Replays a command journal against an in-memory bank and prints the final
//! accounts.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --users users.csv commands.csv > accounts.csv
//! cargo run -- --strategy sync --users users.csv commands.csv > accounts.csv
//! cargo run -- --users users.csv --ledger-out ledger.csv --audit-out audit.csv commands.csv
//! cargo run -- --users users.csv --config engine.yaml --fraud-threshold 2500 commands.csv
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, unreadable files, invalid roster, etc.)

use rust_transfer_engine::cli::{self, CliArgs};
use rust_transfer_engine::core::{BankCore, LedgerStore};
use rust_transfer_engine::io::{read_users, write_audit_csv, write_ledger_csv};
use rust_transfer_engine::logging::init_logging;
use rust_transfer_engine::strategy;
use std::fs::File;
use std::io::BufWriter;
use std::process;
use tracing::info;

fn run(args: &CliArgs) -> Result<(), String> {
    let config = args.to_engine_config()?;
    let users = read_users(&args.users_file)?;
    info!(users = users.len(), "roster loaded");

    let bank = BankCore::new(config, users).map_err(|e| format!("Invalid roster: {}", e))?;

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), config)
    };

    let mut output = std::io::stdout();
    strategy.process(&bank, &args.input_file, &mut output)?;

    if let Some(path) = &args.ledger_out {
        let file = File::create(path)
            .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
        write_ledger_csv(&bank.ledger().all(), &mut BufWriter::new(file))?;
    }

    if let Some(path) = &args.audit_out {
        let file = File::create(path)
            .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
        write_audit_csv(&bank.audit().entries(), &mut BufWriter::new(file))?;
    }

    Ok(())
}

fn main() {
    let args = cli::parse_args();
    init_logging(&args.to_log_config());

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
