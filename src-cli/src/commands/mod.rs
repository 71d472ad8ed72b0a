//! Subcommand implementations

pub mod clean;
pub mod clear;
pub mod watch;

use std::io::BufRead;

/// Arguments if any were given, otherwise non-empty stdin lines
pub(crate) fn inputs_or_stdin(args: Vec<String>) -> anyhow::Result<Vec<String>> {
    if !args.is_empty() {
        return Ok(args);
    }

    let mut lines = Vec::new();
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}
