//! Output formatting helpers for the `quest` CLI.
//!
//! JSON output, plain tables, and the parsers shared by command handlers
//! for enum and date arguments.

use std::io::{self, Write};

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Output a value as pretty-printed JSON to stdout.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error serializing JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Output a simple table with headers and rows.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    // Calculate column widths
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<width$}", h, width = widths[i]))
        .collect();
    let _ = writeln!(handle, "{}", header_line.join("  "));

    let sep_line: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(handle, "{}", sep_line.join("  "));

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:<width$}", c, width = w)
            })
            .collect();
        let _ = writeln!(handle, "{}", cells.join("  ").trim_end());
    }
}

/// Parses a built-in enum variant, naming the flag in the error.
pub fn parse_variant<T>(
    value: &str,
    flag: &str,
    parse: impl Fn(&str) -> Option<T>,
    allowed: &[T],
) -> Result<T>
where
    T: std::fmt::Display,
{
    match parse(value) {
        Some(v) => Ok(v),
        None => {
            let names: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
            bail!(
                "invalid {} '{}' (expected one of: {})",
                flag,
                value,
                names.join(", ")
            )
        }
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        Ok(d) => Ok(d),
        Err(_) => bail!("invalid date '{}' (expected YYYY-MM-DD)", value),
    }
}

/// Parses an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value.trim()) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => bail!(
            "invalid timestamp '{}' (expected RFC 3339, e.g. 2026-03-01T18:00:00Z)",
            value
        ),
    }
}

/// Formats a timestamp for tables.
pub fn short_time(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Truncates `s` to `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::enums::TaskPriority;

    #[test]
    fn parse_variant_accepts_lowercase() {
        let p = parse_variant(
            "high",
            "priority",
            TaskPriority::parse_builtin,
            TaskPriority::BUILTIN,
        )
        .unwrap();
        assert_eq!(p, TaskPriority::High);
    }

    #[test]
    fn parse_variant_lists_choices() {
        let err = parse_variant(
            "urgent",
            "priority",
            TaskPriority::parse_builtin,
            TaskPriority::BUILTIN,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid priority 'urgent' (expected one of: LOW, MEDIUM, HIGH)"
        );
    }

    #[test]
    fn dates_and_timestamps() {
        assert_eq!(
            parse_date("2026-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert!(parse_date("03/01/2026").is_err());

        let at = parse_timestamp("2026-03-01T20:00:00+02:00").unwrap();
        assert_eq!(short_time(&at), "2026-03-01 18:00");
        assert!(parse_timestamp("tomorrow").is_err());
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a rather long title", 10), "a rathe...");
    }
}
