//! Console messages for the rollout commands

use colored::{ColoredString, Colorize};

/// Width of the key column in `field` lines
const KEY_WIDTH: usize = 14;

/// Disable colors, e.g. for JSON output
pub fn disable_colors() {
    colored::control::set_override(false);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Info,
    Success,
    Warn,
    Error,
}

impl Tone {
    fn mark(self) -> ColoredString {
        match self {
            Self::Info => "ℹ".blue(),
            Self::Success => "✓".green(),
            Self::Warn => "⚠".yellow(),
            Self::Error => "✗".red(),
        }
    }
}

fn line(tone: Tone, msg: &str) -> String {
    format!("{} {msg}", tone.mark())
}

pub fn info(msg: &str) {
    println!("{}", line(Tone::Info, msg));
}

pub fn success(msg: &str) {
    println!("{}", line(Tone::Success, msg));
}

pub fn warn(msg: &str) {
    println!("{}", line(Tone::Warn, msg));
}

/// Errors go to stderr so they survive a redirected stdout
pub fn error(msg: &str) {
    eprintln!("{}", line(Tone::Error, msg));
}

/// Bold title underlined to its own width
pub fn header(title: &str) {
    println!("\n{}\n{}", title.bold(), "─".repeat(title.chars().count()).dimmed());
}

/// Aligned `key: value` line
pub fn field(key: &str, value: &str) {
    println!("{}", field_line(key, value));
}

fn field_line(key: &str, value: &str) -> String {
    let key = format!("{key}:");
    format!("  {} {value}", format!("{key:<width$}", width = KEY_WIDTH).dimmed())
}

/// Join vertex labels for a one-line listing
pub fn label_list(labels: &[String]) -> String {
    if labels.is_empty() {
        "none".to_string()
    } else {
        labels.join(", ")
    }
}
