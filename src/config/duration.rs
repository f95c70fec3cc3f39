//! # Duration Parsing
//!
//! Parses Kubernetes-style duration strings used by `--iteration-interval`.

use crate::error::ConfigError;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<number>\d+)(?P<unit>ms|s|m|h|d)$")
        .expect("duration regex is a valid pattern")
});

/// Parse a duration string into [`Duration`]
///
/// Supports `<number><unit>` with units `ms`, `s`, `m`, `h` and `d`,
/// e.g. `"500ms"`, `"10s"`, `"1m"`. Zero durations are rejected.
pub fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    let trimmed = value.trim().to_lowercase();
    let invalid = |reason: String| ConfigError::Invalid {
        field: "iteration interval",
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("duration string cannot be empty".to_string()));
    }

    let captures = DURATION_REGEX.captures(&trimmed).ok_or_else(|| {
        invalid(format!(
            "'{value}' does not match <number><unit> (e.g. '10s', '1m', '500ms')"
        ))
    })?;

    let number: u64 = captures["number"]
        .parse()
        .map_err(|e| invalid(format!("'{value}': {e}")))?;

    if number == 0 {
        return Err(invalid(format!("'{value}' must be greater than zero")));
    }

    let duration = match &captures["unit"] {
        "ms" => Duration::from_millis(number),
        "s" => Duration::from_secs(number),
        "m" => Duration::from_secs(number.saturating_mul(60)),
        "h" => Duration::from_secs(number.saturating_mul(3600)),
        "d" => Duration::from_secs(number.saturating_mul(86_400)),
        unit => return Err(invalid(format!("unknown unit '{unit}' in '{value}'"))),
    };

    Ok(duration)
}
