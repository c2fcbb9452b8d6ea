//! Human duration parsing.
//!
//! A duration is a whitespace separated list of parts that are summed:
//!
//! - `<integer><unit>` where unit is one of `ns`, `ms`, `s`/`second(s)`,
//!   `m`/`minute(s)`, `h`/`hour(s)`, `d`/`day(s)`, `w`/`week(s)` (7 days),
//!   `y`/`year(s)` (365 days)
//! - `H:MM` or `H:MM:SS`
//!
//! ```
//! use std::time::Duration;
//! use cascade_options::parse_duration;
//!
//! let d = parse_duration("1week 3days 23:17:12").unwrap();
//! assert_eq!(d, Duration::from_secs(10 * 86_400 + 23 * 3_600 + 17 * 60 + 12));
//! ```

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

static UNIT_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)(ns|ms|s|seconds?|m|minutes?|h|hours?|d|days?|w|weeks?|y|years?)$")
        .expect("duration unit pattern compiles")
});

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Parse a duration expression. Errors carry a human readable reason.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let mut parts = raw.split_whitespace().peekable();
    if parts.peek().is_none() {
        return Err("empty duration".to_string());
    }

    let mut total = Duration::ZERO;
    for part in parts {
        let single = parse_part(&part.to_lowercase())?;
        total = total
            .checked_add(single)
            .ok_or_else(|| format!("duration overflows at '{part}'"))?;
    }
    Ok(total)
}

fn parse_part(part: &str) -> Result<Duration, String> {
    if part.contains(':') {
        return parse_clock(part);
    }

    let captures = UNIT_PART
        .captures(part)
        .ok_or_else(|| format!("could not convert part '{part}'"))?;
    let amount: u64 = captures[1]
        .parse()
        .map_err(|e| format!("bad amount in '{part}': {e}"))?;
    unit_duration(amount, &captures[2]).ok_or_else(|| format!("duration overflows at '{part}'"))
}

fn parse_clock(part: &str) -> Result<Duration, String> {
    let fields: Vec<&str> = part.split(':').collect();
    if fields.len() != 2 && fields.len() != 3 {
        return Err(format!("wrong number of parts: '{part}'"));
    }

    let mut numbers = Vec::with_capacity(fields.len());
    for field in &fields {
        let n: u64 = field
            .parse()
            .map_err(|_| format!("'{field}' is not a number in '{part}'"))?;
        numbers.push(n);
    }

    let seconds = numbers[0]
        .checked_mul(HOUR)
        .and_then(|s| numbers[1].checked_mul(MINUTE).and_then(|m| s.checked_add(m)))
        .and_then(|s| s.checked_add(numbers.get(2).copied().unwrap_or(0)))
        .ok_or_else(|| format!("duration overflows at '{part}'"))?;
    Ok(Duration::from_secs(seconds))
}

fn unit_duration(amount: u64, unit: &str) -> Option<Duration> {
    let secs = |factor: u64| amount.checked_mul(factor).map(Duration::from_secs);
    match unit {
        "ns" => Some(Duration::from_nanos(amount)),
        "ms" => Some(Duration::from_millis(amount)),
        "s" | "second" | "seconds" => secs(1),
        "m" | "minute" | "minutes" => secs(MINUTE),
        "h" | "hour" | "hours" => secs(HOUR),
        "d" | "day" | "days" => secs(DAY),
        "w" | "week" | "weeks" => secs(7 * DAY),
        "y" | "year" | "years" => secs(365 * DAY),
        _ => None,
    }
}
