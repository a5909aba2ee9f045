//! CLI entry point for the driftguard rebalancer.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use driftguard_engine::PolicyError;
use driftguard_rebalancer::config::Config;
use driftguard_rebalancer::error::Error;
use driftguard_rebalancer::execution::{self, HOLDING_KEY_ENV, RunOptions};
use driftguard_rebalancer::holding::HoldingFile;

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Allocation-drift rebalancer for driftguard holdings")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign the policy setup with the holding key and store the proof
    Sign {
        /// Path to holding.json
        holding: PathBuf,

        /// Print the proof without writing it into the file
        #[arg(long)]
        print_only: bool,
    },

    /// Show the drift report for a holding
    Status {
        /// Path to holding.json
        holding: PathBuf,
    },

    /// Plan, confirm, and execute capped rebalancing trades
    Run {
        /// Path to holding.json
        holding: PathBuf,

        /// Show the plan without executing
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt (for automation/cron)
        #[arg(long)]
        force: bool,

        /// Save resulting balances into the holding file
        #[arg(long)]
        write_back: bool,
    },
}

fn load_holding(path: &Path) -> HoldingFile {
    match HoldingFile::load(path) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error loading holding: {e}");
            process::exit(1);
        }
    }
}

fn load_config(path: &Path) -> Config {
    match Config::load(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Sign {
            holding,
            print_only,
        } => {
            let mut file = load_holding(&holding);
            let key = match std::env::var(HOLDING_KEY_ENV) {
                Ok(k) => k,
                Err(_) => {
                    eprintln!("Error: {HOLDING_KEY_ENV} is not set");
                    process::exit(1);
                }
            };
            execution::sign(&file, &key).and_then(|proof| {
                println!("{proof}");
                if print_only {
                    return Ok(());
                }
                file.proof = Some(proof);
                file.save(&holding)
            })
        }
        Command::Status { holding } => {
            let config = load_config(&cli.config);
            let file = load_holding(&holding);
            execution::status(&config, &file).map(|_| ())
        }
        Command::Run {
            holding,
            dry_run,
            force,
            write_back,
        } => {
            let config = load_config(&cli.config);
            let mut file = load_holding(&holding);
            let opts = RunOptions {
                dry_run,
                force,
                write_back,
                holding_file: holding,
            };
            execution::run(&config, &mut file, &opts).map(|_| ())
        }
    };

    if let Err(e) = result {
        match &e {
            Error::Policy(
                err @ (PolicyError::Unauthorized { .. }
                | PolicyError::AuthorizationFailure(_)
                | PolicyError::TradeTooLarge { .. }),
            ) => {
                eprintln!("\nRefused: {err}");
                process::exit(2);
            }
            Error::Aborted(msg) => {
                eprintln!("{msg}");
                process::exit(0);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}
