//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `vectal_core` linkage with a ping/version check.
//! - Expose the pure recurrence and preview helpers for quick local checks.
//! - Open the configured database and report its schema version.
//!
//! # Invariants
//! - Output is deterministic for a given input.
//! - Bad arguments print usage to stderr and exit with status 2.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use std::process::ExitCode;
use vectal_core::db::migrations::schema_version;
use vectal_core::{extract_highlights, generate_occurrences, generate_preview, CoreConfig};

const USAGE: &str = "usage:
  vectal_cli
  vectal_cli occurrences <anchor> <rule> <n>
  vectal_cli preview <text> [query]
  vectal_cli db

anchor: RFC 3339 (2024-01-31T09:00:00+02:00) or naive (2024-01-31T09:00:00)
rule:   FREQ=<DAILY|WEEKLY|MONTHLY|YEARLY>;INTERVAL=<n>";

fn main() -> ExitCode {
    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };
    if let Err(err) = config.init_logging() {
        eprintln!("{err}");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args, &config) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}\n\n{USAGE}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &[String], config: &CoreConfig) -> Result<Vec<String>, String> {
    match args {
        [] => Ok(vec![
            format!("vectal_core ping={}", vectal_core::ping()),
            format!("vectal_core version={}", vectal_core::core_version()),
        ]),
        [command, anchor, rule, n] if command == "occurrences" => {
            let n: u32 = n
                .parse()
                .map_err(|err| format!("invalid occurrence count `{n}`: {err}"))?;
            occurrences(anchor, rule, n)
        }
        [command] if command == "db" => db_status(config),
        [command, text] if command == "preview" => Ok(preview(text, "", config)),
        [command, text, query] if command == "preview" => Ok(preview(text, query, config)),
        _ => Err("unrecognized arguments".to_string()),
    }
}

fn occurrences(anchor: &str, rule: &str, n: u32) -> Result<Vec<String>, String> {
    if let Ok(anchor) = DateTime::<FixedOffset>::parse_from_rfc3339(anchor) {
        return Ok(generate_occurrences(&anchor, rule, n)
            .iter()
            .map(DateTime::to_rfc3339)
            .collect());
    }
    let anchor = NaiveDateTime::parse_from_str(anchor, "%Y-%m-%dT%H:%M:%S")
        .map_err(|err| format!("invalid anchor `{anchor}`: {err}"))?;
    Ok(generate_occurrences(&anchor, rule, n)
        .iter()
        .map(|at| at.format("%Y-%m-%dT%H:%M:%S").to_string())
        .collect())
}

fn db_status(config: &CoreConfig) -> Result<Vec<String>, String> {
    let conn = config
        .open_db()
        .map_err(|err| format!("database open failed: {err}"))?;
    let version = schema_version(&conn).map_err(|err| format!("schema read failed: {err}"))?;
    let location = config
        .db_path
        .as_ref()
        .map_or_else(|| "memory".to_string(), |path| path.display().to_string());
    Ok(vec![format!("db={location} schema_version={version}")])
}

fn preview(text: &str, query: &str, config: &CoreConfig) -> Vec<String> {
    let mut lines = vec![format!(
        "preview={}",
        generate_preview(text, query, config.preview_max_length)
    )];
    if !query.is_empty() {
        lines.extend(
            extract_highlights(text, query, config.max_highlights)
                .into_iter()
                .map(|highlight| format!("highlight={highlight}")),
        );
    }
    lines
}
