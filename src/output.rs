//! Output formatting for predictions and raw provider results.
//!
//! Results go to stdout as JSON; diagnostics stay on the tracing layers.

use std::fmt::Debug;
use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl Debug) {
    debug!("{:#?}", value);
}

/// Renders a value as compact or pretty JSON.
pub fn to_json(value: &impl Serialize, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

/// Writes a value as one JSON document followed by a newline.
pub fn write_json(out: &mut impl Write, value: &impl Serialize, pretty: bool) -> Result<()> {
    writeln!(out, "{}", to_json(value, pretty)?)?;
    out.flush()?;
    Ok(())
}

/// Writes a value as JSON to stdout.
pub fn print_json(value: &impl Serialize, pretty: bool) -> Result<()> {
    write_json(&mut std::io::stdout().lock(), value, pretty)
}
