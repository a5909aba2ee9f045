//! JSONL audit trail logging.
//!
//! Each rebalancer run appends events to an audit.jsonl file,
//! one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use driftguard::Address;
use driftguard_engine::{DriftReport, PolicyError, PolicyEvent, TradeReceipt};
use serde::Serialize;

use crate::error::Result;
use crate::planner::PlannedTrade;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, serde_json::json!({}))
    }
}

/// Convenience: log a run start event.
pub fn log_run_started(
    audit: &mut AuditLog,
    holding_file: &str,
    holding: &Address,
    agent: &Address,
) -> Result<()> {
    audit.log(
        "run_started",
        serde_json::json!({
            "holding_file": holding_file,
            "holding": holding,
            "agent": agent,
        }),
    )
}

/// Convenience: log a drift snapshot.
pub fn log_drift(audit: &mut AuditLog, report: &DriftReport) -> Result<()> {
    audit.log(
        "drift_snapshot",
        serde_json::json!({
            "disbalanced": report.is_disbalanced(),
            "report": report,
        }),
    )
}

/// Convenience: log a planned trade.
pub fn log_plan(audit: &mut AuditLog, step: usize, trade: &PlannedTrade) -> Result<()> {
    audit.log(
        "trade_planned",
        serde_json::json!({
            "step": step,
            "trade": trade,
        }),
    )
}

/// Convenience: log an executed trade.
pub fn log_trade(audit: &mut AuditLog, step: usize, receipt: &TradeReceipt) -> Result<()> {
    audit.log(
        "trade_executed",
        serde_json::json!({
            "step": step,
            "receipt": receipt,
        }),
    )
}

/// Convenience: log a trade the engine refused or the venue failed.
pub fn log_trade_failed(
    audit: &mut AuditLog,
    step: usize,
    trade: &PlannedTrade,
    error: &PolicyError,
) -> Result<()> {
    audit.log(
        "trade_failed",
        serde_json::json!({
            "step": step,
            "trade": trade,
            "error": error.to_string(),
        }),
    )
}

/// Convenience: log everything the engine journaled.
pub fn log_policy_events(audit: &mut AuditLog, events: &[PolicyEvent]) -> Result<()> {
    for event in events {
        audit.log("policy_event", serde_json::json!({ "detail": event }))?;
    }
    Ok(())
}

/// Convenience: log run completion.
pub fn log_run_completed(
    audit: &mut AuditLog,
    trades: usize,
    failed: bool,
    balanced: bool,
) -> Result<()> {
    audit.log(
        "run_completed",
        serde_json::json!({
            "trades": trades,
            "failed": failed,
            "balanced": balanced,
        }),
    )
}
