//! Classification of single output lines.

use serde_json::Value;

pub const PROGRESS_PREFIX: &str = "PROGRESS:";
pub const RESULTS_PREFIX: &str = "RESULTS:";

/// One classified line of subprocess output.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolLine {
    /// Stage-local percentage, 0..=100.
    Progress(u32),
    /// Terminal JSON payload.
    Result(Value),
    /// Anything outside the contract.
    Log(String),
    /// A recognized prefix with an unusable body.
    Malformed { line: String, reason: String },
}

/// Classify a line of output.
///
/// Trailing whitespace (including `\r`) is ignored.
pub fn parse_line(line: &str) -> ProtocolLine {
    let line = line.trim_end();

    if let Some(body) = line.strip_prefix(PROGRESS_PREFIX) {
        return match body.trim().parse::<u32>() {
            Ok(pct) if pct <= 100 => ProtocolLine::Progress(pct),
            Ok(pct) => malformed(line, format!("progress {} out of range", pct)),
            Err(e) => malformed(line, format!("invalid progress value: {}", e)),
        };
    }

    if let Some(body) = line.strip_prefix(RESULTS_PREFIX) {
        return match serde_json::from_str::<Value>(body.trim()) {
            Ok(value) => ProtocolLine::Result(value),
            Err(e) => malformed(line, format!("invalid JSON payload: {}", e)),
        };
    }

    ProtocolLine::Log(line.to_string())
}

fn malformed(line: &str, reason: String) -> ProtocolLine {
    ProtocolLine::Malformed {
        line: line.to_string(),
        reason,
    }
}
