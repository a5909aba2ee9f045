//! Integration tests for the sign/status/run workflow against paper hosts.

use std::path::{Path, PathBuf};

use driftguard::{Address, U256};
use driftguard_engine::PolicyError;
use driftguard_rebalancer::config::Config;
use driftguard_rebalancer::error::Error;
use driftguard_rebalancer::execution::{self, RunOptions};
use driftguard_rebalancer::holding::HoldingFile;

const HOLDING_KEY: &str = "0x4646464646464646464646464646464646464646464646464646464646464646";
const HOLDING: &str = "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f";

fn addr(byte: &str) -> String {
    format!("0x{}", byte.repeat(20))
}

fn dai() -> Address {
    Address::repeat_byte(0xd1)
}

fn e18(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

/// 7000 DAI at $1 and 1.5 ETH at $2000 against a 50/50 target, 5%
/// tolerance, 10% trade cap. The venue holds 10 ETH.
fn holding_json() -> String {
    holding_json_with("7000000000000000000000", "1500000000000000000", "10000000000000000000")
}

fn holding_json_with(dai_balance: &str, eth_balance: &str, eth_reserve: &str) -> String {
    format!(
        r#"{{
        "holding": "{HOLDING}",
        "policy": {{
            "assets": [
                {{ "asset": "{dai}", "target_share_bps": 5000 }},
                {{ "asset": "{eth}", "target_share_bps": 5000 }}
            ],
            "imbalance_tolerance_bps": 500,
            "max_trade_fraction_bps": 1000,
            "venue": "{venue}",
            "price_source": "{oracle}",
            "agent": "{agent}",
            "administrator": "{admin}"
        }},
        "prices": [
            {{ "asset": "{dai}", "amount": "1000000000000000000" }},
            {{ "asset": "{eth}", "amount": "2000000000000000000000" }}
        ],
        "balances": [
            {{ "asset": "{dai}", "amount": "{dai_balance}" }},
            {{ "asset": "{eth}", "amount": "{eth_balance}" }}
        ],
        "venue_reserves": [
            {{ "asset": "{dai}", "amount": "10000000000000000000000" }},
            {{ "asset": "{eth}", "amount": "{eth_reserve}" }}
        ]
    }}"#,
        dai = addr("d1"),
        eth = addr("e7"),
        venue = addr("0e"),
        oracle = addr("0a"),
        agent = addr("a9"),
        admin = addr("ad"),
    )
}

fn config_in(dir: &Path, agent: &str) -> Config {
    let toml = format!(
        r#"
[agent]
address = "{agent}"

[logging]
dir = "{}"
audit_file = "audit.jsonl"
"#,
        dir.display()
    );
    Config::from_toml(&toml).unwrap()
}

fn signed_holding(dir: &Path) -> (HoldingFile, PathBuf) {
    signed_holding_from(dir, &holding_json())
}

fn signed_holding_from(dir: &Path, json: &str) -> (HoldingFile, PathBuf) {
    let mut file = HoldingFile::from_json(json).unwrap();
    file.proof = Some(execution::sign(&file, HOLDING_KEY).unwrap());
    let path = dir.join("holding.json");
    file.save(&path).unwrap();
    (file, path)
}

fn forced(path: PathBuf, write_back: bool) -> RunOptions {
    RunOptions {
        dry_run: false,
        force: true,
        write_back,
        holding_file: path,
    }
}

#[test]
fn sign_produces_65_byte_proof() {
    let file = HoldingFile::from_json(&holding_json()).unwrap();
    let proof = execution::sign(&file, HOLDING_KEY).unwrap();
    assert!(proof.starts_with("0x"));
    assert_eq!(proof.len(), 2 + 65 * 2);
}

#[test]
fn sign_with_foreign_key_is_refused() {
    let file = HoldingFile::from_json(&holding_json()).unwrap();
    let other = format!("0x{}", "11".repeat(32));
    assert!(matches!(
        execution::sign(&file, &other),
        Err(Error::Key(_))
    ));
}

#[test]
fn unsigned_holding_cannot_open() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), &addr("a9"));
    let file = HoldingFile::from_json(&holding_json()).unwrap();
    assert!(matches!(
        execution::open_engine(&config, &file),
        Err(Error::Holding(_))
    ));
}

#[test]
fn status_reports_disbalance() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), &addr("a9"));
    let (file, _) = signed_holding(dir.path());
    let report = execution::status(&config, &file).unwrap();
    assert!(report.is_disbalanced());
    assert_eq!(report.total_value, e18(10_000));
    assert_eq!(report.most_overweight().unwrap().asset(), dai());
}

#[test]
fn forced_run_restores_balance_and_audits() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), &addr("a9"));
    let (mut file, path) = signed_holding(dir.path());

    let summary = execution::run(&config, &mut file, &forced(path, false)).unwrap();
    // 700, 630, 567 DAI sold: 7000 -> 5103
    assert_eq!(summary.trades, 3);
    assert!(summary.balanced);

    let audit = std::fs::read_to_string(config.audit_path()).unwrap();
    let events: Vec<serde_json::Value> = audit
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(events.first().unwrap()["event"], "run_started");
    assert_eq!(events.last().unwrap()["event"], "run_completed");
    assert_eq!(events.last().unwrap()["trades"], 3);
    assert_eq!(events.last().unwrap()["failed"], false);
    let executed = events
        .iter()
        .filter(|e| e["event"] == "trade_executed")
        .count();
    assert_eq!(executed, 3);
    let journaled = events
        .iter()
        .filter(|e| e["event"] == "policy_event")
        .count();
    assert_eq!(journaled, 4); // setup + three rebalances
}

#[test]
fn write_back_persists_new_balances() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), &addr("a9"));
    let (mut file, path) = signed_holding(dir.path());

    execution::run(&config, &mut file, &forced(path.clone(), true)).unwrap();

    let back = HoldingFile::load(&path).unwrap();
    let dai_balance = back
        .balances
        .iter()
        .find(|b| b.asset == dai())
        .unwrap()
        .amount;
    assert_eq!(dai_balance, e18(5103));
    assert!(back.timestamp.is_some());
    assert!(back.proof.is_some());

    // A second run finds nothing to do
    let mut again = back;
    let summary = execution::run(&config, &mut again, &forced(path, false)).unwrap();
    assert_eq!(summary.trades, 0);
    assert!(summary.balanced);
}

#[test]
fn dry_run_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), &addr("a9"));
    let (mut file, path) = signed_holding(dir.path());
    let before = std::fs::read_to_string(&path).unwrap();

    let opts = RunOptions {
        dry_run: true,
        force: false,
        write_back: true,
        holding_file: path.clone(),
    };
    let summary = execution::run(&config, &mut file, &opts).unwrap();
    assert_eq!(summary.trades, 0);
    assert!(!summary.balanced);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn wrong_agent_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), &addr("bb"));
    let (mut file, path) = signed_holding(dir.path());

    let err = execution::run(&config, &mut file, &forced(path, false)).unwrap_err();
    assert!(matches!(
        err,
        Error::Policy(PolicyError::Unauthorized { .. })
    ));
}

#[test]
fn tampered_policy_fails_setup() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), &addr("a9"));
    let (mut file, _) = signed_holding(dir.path());
    file.policy.imbalance_tolerance_bps = 900;

    assert!(matches!(
        execution::open_engine(&config, &file),
        Err(Error::Policy(PolicyError::AuthorizationFailure(_)))
    ));
}

#[test]
fn step_limit_stops_early() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path(), &addr("a9"));
    config.execution.max_steps = 2;
    let (mut file, path) = signed_holding(dir.path());

    let summary = execution::run(&config, &mut file, &forced(path, false)).unwrap();
    assert_eq!(summary.trades, 2);
    assert!(!summary.balanced);
}

fn audit_events(config: &Config) -> Vec<serde_json::Value> {
    std::fs::read_to_string(config.audit_path())
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn failed_trade_is_audited_and_fills_are_written_back() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), &addr("a9"));
    // 0.5 ETH of reserves: 700 DAI buys 0.35 ETH, then 630 DAI needs 0.315
    let json = holding_json_with(
        "7000000000000000000000",
        "1500000000000000000",
        "500000000000000000",
    );
    let (mut file, path) = signed_holding_from(dir.path(), &json);

    let err = execution::run(&config, &mut file, &forced(path.clone(), true)).unwrap_err();
    assert!(matches!(
        err,
        Error::Policy(PolicyError::TransferFailure(_))
    ));

    let events = audit_events(&config);
    let names: Vec<&str> = events.iter().map(|e| e["event"].as_str().unwrap()).collect();
    assert_eq!(names.iter().filter(|n| **n == "trade_executed").count(), 1);
    let failed = events.iter().find(|e| e["event"] == "trade_failed").unwrap();
    assert_eq!(failed["step"], 2);
    assert!(failed["error"].as_str().unwrap().starts_with("transfer failed"));
    let done = events.last().unwrap();
    assert_eq!(done["event"], "run_completed");
    assert_eq!(done["trades"], 1);
    assert_eq!(done["failed"], true);
    assert_eq!(done["balanced"], false);

    // The one fill reached the holding file
    let back = HoldingFile::load(&path).unwrap();
    let dai_balance = back
        .balances
        .iter()
        .find(|b| b.asset == dai())
        .unwrap()
        .amount;
    assert_eq!(dai_balance, e18(6300));
}

#[test]
fn out_of_band_without_tradable_amount_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), &addr("a9"));
    // 9 smallest DAI units, no ETH: 10% of 9 rounds to zero
    let json = holding_json_with("9", "0", "10000000000000000000");
    let (mut file, path) = signed_holding_from(dir.path(), &json);

    let summary = execution::run(&config, &mut file, &forced(path, false)).unwrap();
    assert_eq!(summary.trades, 0);
    assert!(!summary.balanced);

    let events = audit_events(&config);
    assert_eq!(events.last().unwrap()["event"], "no_tradable_amount");
    assert!(!events.iter().any(|e| e["event"] == "no_rebalance_needed"));
}
