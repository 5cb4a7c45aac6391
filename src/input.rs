//! Line input for the `run` command
//!
//! Each line is either a JSON array (`["/midi", 144, 90, 60]`) or whitespace
//! separated tokens (`/midi 144 90 60`).

use anyhow::{Context, Result};
use mrposc_filter::{OscArg, OscMessage};

/// Parse one input line; `None` for blank lines
pub fn parse_line(line: &str) -> Result<Option<OscMessage>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    if line.starts_with('[') {
        let msg: OscMessage =
            serde_json::from_str(line).with_context(|| format!("Invalid JSON message: {}", line))?;
        return Ok(Some(msg));
    }

    // The identifier is taken verbatim; only arguments are typed
    let mut tokens = line.split_whitespace();
    let address = tokens.next().unwrap_or_default();
    let args = tokens.map(parse_token).collect();
    Ok(Some(OscMessage::new(address, args)))
}

/// Parse a bare token as int, then finite float, then bool, falling back to a string
pub fn parse_token(token: &str) -> OscArg {
    if let Ok(v) = token.parse::<i64>() {
        return OscArg::Int(v);
    }
    if let Ok(v) = token.parse::<f64>() {
        if v.is_finite() {
            return OscArg::Float(v);
        }
    }
    match token {
        "true" => OscArg::Bool(true),
        "false" => OscArg::Bool(false),
        _ => OscArg::Str(token.to_string()),
    }
}
