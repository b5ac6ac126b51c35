//! CLI output formatting.
//!
//! Status lines, diff change markers and the route and key/value listings
//! printed by `list`.

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const ADD: &str = "+";
  pub const MODIFY: &str = "~";
  pub const REMOVE: &str = "-";
}

/// How a resource or output differs from the previous assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
  Add,
  Modify,
  Remove,
}

impl Change {
  pub fn symbol(self) -> &'static str {
    match self {
      Change::Add => symbols::ADD,
      Change::Modify => symbols::MODIFY,
      Change::Remove => symbols::REMOVE,
    }
  }
}

/// Template hashes are long; twelve characters identify one at a glance.
pub fn truncate_hash(hash: &str) -> &str {
  let len = hash.len().min(12);
  &hash[..len]
}

/// `GET /items → api_lambda`, without color.
pub fn format_route(method: &str, path: &str, function: &str) -> String {
  format!("{} {} {} {}", method, path, symbols::ARROW, function)
}

/// `KEY = value` for a listing entry. Strings print bare, intrinsics as JSON.
pub fn format_entry(key: &str, value: &serde_json::Value) -> String {
  match value {
    serde_json::Value::String(s) => format!("{} = {}", key, s),
    other => format!("{} = {}", key, other),
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// One diff line: colored marker, subject, then a dimmed detail if any.
pub fn print_change(change: Change, subject: &str, detail: Option<&str>) {
  let symbol = change.symbol();
  let symbol = match change {
    Change::Add => symbol.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
    Change::Modify => symbol.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string(),
    Change::Remove => symbol.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
  };
  match detail {
    Some(detail) => println!(
      "  {} {} {}",
      symbol,
      subject,
      detail.if_supports_color(Stream::Stdout, |s| s.dimmed())
    ),
    None => println!("  {} {}", symbol, subject),
  }
}

pub fn print_route(method: &str, path: &str, function: &str, integration: &str) {
  println!(
    "  {} {}",
    format_route(method, path, function),
    format!("({})", integration).if_supports_color(Stream::Stdout, |s| s.dimmed())
  );
}

/// Print every entry of a JSON object, or `(none)` when it is empty.
pub fn print_entries(value: &serde_json::Value) {
  match value.as_object() {
    Some(map) if !map.is_empty() => {
      for (key, value) in map {
        println!("  {}", format_entry(key, value));
      }
    }
    _ => println!("  (none)"),
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
