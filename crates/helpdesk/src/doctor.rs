// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `helpdesk doctor` command implementation.
//!
//! Runs each adapter's health check and a few file-level probes, then prints
//! one line per check.

use std::time::{Duration, Instant};

use helpdesk_attachments::LocalBlobStore;
use helpdesk_auth_directory::DirectoryIdentity;
use helpdesk_config::HelpdeskConfig;
use helpdesk_core::{HealthStatus, HelpdeskError, PluginAdapter};
use helpdesk_storage::SqliteTicketStore;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }

    fn from_health(name: &str, health: Result<HealthStatus, HelpdeskError>, start: Instant) -> Self {
        match health {
            Ok(HealthStatus::Healthy) => Self::new(name, CheckStatus::Pass, "healthy", start),
            Ok(HealthStatus::Degraded(reason)) => Self::new(name, CheckStatus::Warn, reason, start),
            Ok(HealthStatus::Unhealthy(reason)) => Self::new(name, CheckStatus::Fail, reason, start),
            Err(e) => Self::new(name, CheckStatus::Fail, e.to_string(), start),
        }
    }
}

/// Run the `helpdesk doctor` command. Returns an error when any check fails.
pub async fn run_doctor(config: &HelpdeskConfig, color: bool) -> Result<(), HelpdeskError> {
    let results = vec![
        check_database_file(&config.storage.database_path).await,
        check_ticket_store(config).await,
        check_blob_store(config).await,
        check_identity(config).await,
    ];

    println!();
    println!("  helpdesk doctor");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", format_result(result, color));
    }
    println!();

    let fail_count = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    let warn_count = results
        .iter()
        .filter(|r| r.status == CheckStatus::Warn)
        .count();
    let issues = fail_count + warn_count;
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    if fail_count > 0 {
        return Err(HelpdeskError::HealthCheckFailed {
            name: "doctor".to_string(),
            source: format!("{fail_count} check(s) failed").into(),
        });
    }
    Ok(())
}

fn format_result(result: &CheckResult, color: bool) -> String {
    use colored::Colorize;

    let duration_ms = result.duration.as_millis();
    let (symbol, message) = match (&result.status, color) {
        (CheckStatus::Pass, true) => ("✓".green().to_string(), result.message.normal()),
        (CheckStatus::Warn, true) => ("!".yellow().to_string(), result.message.yellow()),
        (CheckStatus::Fail, true) => ("✗".red().to_string(), result.message.red()),
        (CheckStatus::Pass, false) => ("[OK]  ".to_string(), result.message.normal()),
        (CheckStatus::Warn, false) => ("[WARN]".to_string(), result.message.normal()),
        (CheckStatus::Fail, false) => ("[FAIL]".to_string(), result.message.normal()),
    };
    if color {
        format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
    } else {
        format!(
            "    {symbol} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// Existence and raw readability of the database file, without migrating it.
async fn check_database_file(db_path: &str) -> CheckResult {
    let start = Instant::now();
    const NAME: &str = "Database file";

    if !std::path::Path::new(db_path).exists() {
        return CheckResult::new(
            NAME,
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first use)"),
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => return CheckResult::new(NAME, CheckStatus::Fail, format!("open failed: {e}"), start),
    };
    let integrity = conn
        .call(|conn| -> Result<String, rusqlite::Error> {
            conn.query_row("PRAGMA quick_check", [], |row| row.get(0))
        })
        .await;
    match integrity {
        Ok(result) if result == "ok" => CheckResult::new(NAME, CheckStatus::Pass, "ok", start),
        Ok(result) => CheckResult::new(NAME, CheckStatus::Fail, result, start),
        Err(e) => CheckResult::new(NAME, CheckStatus::Fail, format!("query failed: {e}"), start),
    }
}

async fn check_ticket_store(config: &HelpdeskConfig) -> CheckResult {
    let start = Instant::now();
    const NAME: &str = "Ticket store";
    match SqliteTicketStore::open(config.storage.clone()).await {
        Ok(store) => {
            let result = CheckResult::from_health(NAME, store.health_check().await, start);
            let _ = store.shutdown().await;
            result
        }
        Err(e) => CheckResult::new(NAME, CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_blob_store(config: &HelpdeskConfig) -> CheckResult {
    let start = Instant::now();
    let blobs = LocalBlobStore::new(&config.attachments);
    CheckResult::from_health("Attachment store", blobs.health_check().await, start)
}

async fn check_identity(config: &HelpdeskConfig) -> CheckResult {
    let start = Instant::now();
    let identity = DirectoryIdentity::new(&config.principals);
    CheckResult::from_health("Identity directory", identity.health_check().await, start)
}
