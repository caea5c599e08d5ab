//! Color helpers for human-readable output.
//!
//! Truecolor via `owo_colors`, dropped whenever stdout is not a terminal or
//! `NO_COLOR` / `CLICOLOR=0` / `TERM=dumb` ask for plain text.

use std::io::IsTerminal;

use owo_colors::OwoColorize;

use quest_core::enums::{SessionStatus, TaskStatus};

const GAIN: (u8, u8, u8) = (0xc2, 0xd9, 0x4c);
const WARN: (u8, u8, u8) = (0xff, 0xb4, 0x54);
const FAIL: (u8, u8, u8) = (0xf0, 0x71, 0x78);
const MUTED: (u8, u8, u8) = (0x6c, 0x76, 0x80);
const ACCENT: (u8, u8, u8) = (0x59, 0xc2, 0xff);
const GOLD: (u8, u8, u8) = (0xe6, 0xb4, 0x50);

/// Returns `true` if stdout should receive ANSI colors.
pub fn supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var("CLICOLOR").is_ok_and(|v| v == "0") {
        return false;
    }
    if std::env::var("TERM").is_ok_and(|v| v == "dumb") {
        return false;
    }
    if std::env::var("CLICOLOR_FORCE").is_ok_and(|v| !v.is_empty() && v != "0") {
        return true;
    }
    std::io::stdout().is_terminal()
}

fn color_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).to_string()
    } else {
        s.to_string()
    }
}

fn color_bold_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).bold().to_string()
    } else {
        s.to_string()
    }
}

/// XP amounts, signed: `+20 XP`.
pub fn render_xp(xp: i64) -> String {
    let text = if xp >= 0 {
        format!("+{xp} XP")
    } else {
        format!("{xp} XP")
    };
    color_str(&text, GAIN)
}

/// Level-up and headline numbers.
pub fn render_accent(s: &str) -> String {
    color_bold_str(s, ACCENT)
}

/// Badge names.
pub fn render_badge(s: &str) -> String {
    color_bold_str(s, GOLD)
}

pub fn render_warn(s: &str) -> String {
    color_str(s, WARN)
}

pub fn render_muted(s: &str) -> String {
    color_str(s, MUTED)
}

pub fn render_bold(s: &str) -> String {
    if supports_color() {
        s.bold().to_string()
    } else {
        s.to_string()
    }
}

/// Task status, colored by how it affects the user.
pub fn render_task_status(status: &TaskStatus) -> String {
    match status {
        TaskStatus::Completed => color_str(status.as_str(), GAIN),
        TaskStatus::Overdue => color_str(status.as_str(), FAIL),
        TaskStatus::InProgress => color_str(status.as_str(), ACCENT),
        TaskStatus::Cancelled => color_str(status.as_str(), MUTED),
        _ => status.as_str().to_string(),
    }
}

pub fn render_session_status(status: &SessionStatus) -> String {
    match status {
        SessionStatus::Completed => color_str(status.as_str(), GAIN),
        SessionStatus::Missed => color_str(status.as_str(), FAIL),
        SessionStatus::InProgress => color_str(status.as_str(), ACCENT),
        SessionStatus::Cancelled => color_str(status.as_str(), MUTED),
        _ => status.as_str().to_string(),
    }
}

/// A `[#####.....]` progress bar of `width` cells.
pub fn render_progress_bar(progress: i64, target: i64, width: usize) -> String {
    let ratio = if target <= 0 {
        1.0
    } else {
        (progress.max(0) as f64 / target as f64).min(1.0)
    };
    let filled = (ratio * width as f64).round() as usize;
    let bar = format!("{}{}", "#".repeat(filled), ".".repeat(width - filled));
    if filled == width {
        format!("[{}]", color_str(&bar, GAIN))
    } else {
        format!("[{bar}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_fills_proportionally() {
        // SAFETY: no other test in this binary reads or writes the environment.
        unsafe { std::env::set_var("NO_COLOR", "1") };
        assert_eq!(render_progress_bar(0, 10, 10), "[..........]");
        assert_eq!(render_progress_bar(5, 10, 10), "[#####.....]");
        assert_eq!(render_progress_bar(25, 10, 10), "[##########]");
        assert_eq!(render_progress_bar(3, 0, 4), "[####]");
        assert_eq!(render_xp(20), "+20 XP");
    }
}
