//! Execution orchestrator: setup -> report -> plan -> confirm -> trade.
//!
//! This is the main workflow that ties together all components. Runs
//! happen against a paper host built from the holding file.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use driftguard::signature::{address_of, sign_setup, signing_key_from_hex};
use driftguard_engine::{CallContext, DriftReport, PolicyEngine};
use driftguard_ports::local::LocalHost;
use log::{error, info, warn};

use crate::audit::{self, AuditLog};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::holding::HoldingFile;
use crate::planner::{self, PlannedTrade};

/// Environment variable holding the holding's hex private key.
pub const HOLDING_KEY_ENV: &str = "DRIFTGUARD_HOLDING_KEY";

/// Options for a rebalance run.
pub struct RunOptions {
    pub dry_run: bool,
    pub force: bool,
    /// Save resulting balances back into the holding file.
    pub write_back: bool,
    pub holding_file: PathBuf,
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub trades: usize,
    pub balanced: bool,
}

/// Sign the setup for `holding` with `key_hex` and return the proof as
/// `0x`-prefixed hex. The key must control the holding identity.
pub fn sign(holding: &HoldingFile, key_hex: &str) -> Result<String> {
    let key = signing_key_from_hex(key_hex)?;
    let signer = address_of(key.verifying_key());
    if signer != holding.holding {
        return Err(Error::Key(format!(
            "key controls {signer}, not holding {}",
            holding.holding
        )));
    }
    let proof = sign_setup(&key, &holding.policy, &holding.holding)?;
    Ok(format!("0x{}", hex::encode(proof.to_bytes())))
}

/// Set up an engine from a signed holding file, plus its paper host.
pub fn open_engine(config: &Config, holding: &HoldingFile) -> Result<(PolicyEngine, LocalHost)> {
    let proof = holding.proof_bytes()?.ok_or_else(|| {
        Error::Holding("holding file has no proof; run `rebalancer sign` first".into())
    })?;
    let mut engine = PolicyEngine::new(holding.holding).with_strictness(config.strictness);
    engine.setup(holding.policy.clone(), &proof)?;
    Ok((engine, holding.paper_host()))
}

/// Print the drift report for a holding.
pub fn status(config: &Config, holding: &HoldingFile) -> Result<DriftReport> {
    let (engine, host) = open_engine(config, holding)?;
    let report = engine.drift_report(&host)?;
    print!("{report}");
    Ok(report)
}

/// Execute a full rebalance run.
pub fn run(config: &Config, holding: &mut HoldingFile, opts: &RunOptions) -> Result<RunSummary> {
    // 1. Engine and paper host
    let (mut engine, mut host) = open_engine(config, holding)?;
    let agent = CallContext::new(config.agent.address);

    // 2. Open audit log
    let mut audit = AuditLog::open(&config.audit_path())?;
    audit::log_run_started(
        &mut audit,
        &opts.holding_file.display().to_string(),
        &holding.holding,
        &config.agent.address,
    )?;

    // 3. Current drift
    let mut report = engine.drift_report(&host)?;
    audit::log_drift(&mut audit, &report)?;
    print!("{report}");

    let max_fraction = engine.configuration()?.max_trade_fraction_bps();
    let Some(first) = planner::plan_step(&report, max_fraction)? else {
        let balanced = !report.is_disbalanced();
        if balanced {
            println!("\nNo rebalancing needed: holding is within tolerance.");
            audit.log_simple("no_rebalance_needed")?;
        } else {
            println!("\nHolding is out of tolerance but no tradable amount fits the cap.");
            warn!("{} is disbalanced with no tradable amount", holding.holding);
            audit.log_simple("no_tradable_amount")?;
        }
        return Ok(RunSummary { trades: 0, balanced });
    };

    // 4. Display the first step
    display_plan(&first, config.execution.max_steps);
    audit::log_plan(&mut audit, 1, &first)?;

    // 5. Dry run stops here
    if opts.dry_run {
        println!("\n[DRY RUN] No trades executed.");
        return Ok(RunSummary {
            trades: 0,
            balanced: false,
        });
    }

    // 6. Confirm execution
    if !opts.force {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Execute?")
            .default(false)
            .interact()
            .map_err(|e| Error::Aborted(format!("confirmation prompt failed: {e}")))?;

        if !confirmed {
            println!("Aborted.");
            audit.log("user_confirmed", serde_json::json!({"approved": false}))?;
            return Ok(RunSummary {
                trades: 0,
                balanced: false,
            });
        }

        audit.log("user_confirmed", serde_json::json!({"approved": true}))?;
    }

    // 7. Trade until balanced, out of steps, or a trade fails
    let mut trades = 0;
    let mut failure = None;
    let mut next = Some(first);
    while let Some(trade) = next {
        if trades == config.execution.max_steps {
            warn!(
                "stopped after {trades} trades with {} still disbalanced",
                holding.holding
            );
            break;
        }
        if trades > 0 {
            audit::log_plan(&mut audit, trades + 1, &trade)?;
            if config.execution.step_interval_ms > 0 {
                thread::sleep(Duration::from_millis(config.execution.step_interval_ms));
            }
        }

        print!("[{}] {trade} ... ", trades + 1);
        match engine.execute_rebalance(&agent, &mut host, &trade.path(), trade.amount_in) {
            Ok(receipt) => {
                trades += 1;
                println!(
                    "OK {} out",
                    driftguard_engine::report::format_units(receipt.amount_out)
                );
                audit::log_trade(&mut audit, trades, &receipt)?;
            }
            Err(e) => {
                println!("ERROR: {e}");
                error!("trade {} for {} failed: {e}", trades + 1, holding.holding);
                audit::log_trade_failed(&mut audit, trades + 1, &trade, &e)?;
                failure = Some(e);
                break;
            }
        }

        report = engine.drift_report(&host)?;
        next = planner::plan_step(&report, max_fraction)?;
    }

    // 8. Log completion
    let balanced = !report.is_disbalanced();
    audit::log_drift(&mut audit, &report)?;
    audit::log_policy_events(&mut audit, &engine.take_events())?;
    audit::log_run_completed(&mut audit, trades, failure.is_some(), balanced)?;
    print!("\n{report}");
    println!(
        "{trades} trades{}, {}. Audit logged to {}",
        if failure.is_some() { ", 1 failed" } else { "" },
        if balanced { "balanced" } else { "still disbalanced" },
        config.audit_path().display()
    );

    // 9. Write back
    if opts.write_back {
        holding.absorb_balances(&host)?;
        holding.save(&opts.holding_file)?;
        info!("wrote balances back to {}", opts.holding_file.display());
    }

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(RunSummary { trades, balanced }),
    }
}

fn display_plan(trade: &PlannedTrade, max_steps: usize) {
    println!("\nNEXT TRADE (up to {max_steps} steps this run):");
    println!("  {trade}");
}
