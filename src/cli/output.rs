//! Shared CLI output helpers.
//!
//! Color scheme (respects NO_COLOR):
//! - Green: success
//! - Red: errors
//! - Yellow: warnings
//! - Cyan: paths, keys, hints
//! - Dimmed: secondary info

use std::fmt::Display;

use console::style;

const RULE_WIDTH: usize = 56;

/// Disable styling when NO_COLOR is set. Called once from `main`.
pub fn init() {
    if std::env::var_os("NO_COLOR").is_some() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
}

/// `✓ msg`
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green(), msg);
}

/// `✗ msg` on stderr.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red(), msg);
}

/// `⚠ msg` on stderr.
pub fn warn(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow(), msg);
}

/// `→ msg` on stderr.
pub fn hint(msg: &str) {
    eprintln!("{} {}", style("→").cyan(), style(msg).cyan());
}

pub fn header(title: &str) {
    println!("{}", style(title).bold());
}

/// Label dimmed, value bold.
pub fn kv(label: &str, value: impl Display) {
    println!("  {}  {}", style(label).dim(), style(value).bold());
}

pub fn list_item(item: &str) {
    println!("  • {}", item);
}

pub fn rule() {
    println!("{}", style("─".repeat(RULE_WIDTH)).dim());
}

pub fn dimmed(msg: &str) {
    println!("{}", style(msg).dim());
}

/// Raw data for piping, no decoration.
pub fn data(msg: &str) {
    println!("{}", msg);
}

pub fn path(p: impl Display) -> String {
    style(p).cyan().to_string()
}

pub fn key(k: &str) -> String {
    style(k).cyan().to_string()
}

pub fn cmd(c: &str) -> String {
    style(c).green().to_string()
}

/// Title followed by a rule.
pub fn section(title: &str) {
    println!();
    header(title);
    rule();
}
