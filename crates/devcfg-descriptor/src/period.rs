use std::time::Duration;

use crate::errors::{DescriptorError, Result};

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_DAY: u64 = 86_400;

/// Parses a compact period string: a positive integer with an optional
/// `s`/`m`/`h`/`d` suffix. A bare integer counts seconds.
pub fn parse_period(value: &str) -> Result<Duration> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DescriptorError::InvalidPeriod {
            value: value.to_string(),
            reason: "empty string".to_string(),
        });
    }

    let (digits, multiplier) = match trimmed.chars().last() {
        Some('s') => (&trimmed[..trimmed.len() - 1], 1),
        Some('m') => (&trimmed[..trimmed.len() - 1], SECONDS_PER_MINUTE),
        Some('h') => (&trimmed[..trimmed.len() - 1], SECONDS_PER_HOUR),
        Some('d') => (&trimmed[..trimmed.len() - 1], SECONDS_PER_DAY),
        Some(ch) if ch.is_ascii_digit() => (trimmed, 1),
        Some(ch) => {
            return Err(DescriptorError::InvalidPeriod {
                value: value.to_string(),
                reason: format!("unknown unit suffix '{ch}'"),
            })
        }
        None => unreachable!("emptiness checked above"),
    };

    if digits.is_empty() {
        return Err(DescriptorError::InvalidPeriod {
            value: value.to_string(),
            reason: "missing count before unit suffix".to_string(),
        });
    }

    let count: u64 = digits
        .parse()
        .map_err(|err| DescriptorError::InvalidPeriod {
            value: value.to_string(),
            reason: format!("invalid count '{digits}': {err}"),
        })?;

    let seconds = count
        .checked_mul(multiplier)
        .ok_or_else(|| DescriptorError::InvalidPeriod {
            value: value.to_string(),
            reason: "value overflows the representable range".to_string(),
        })?;

    Ok(Duration::from_secs(seconds))
}

/// Formats a duration back into the compact form, using the largest unit that
/// divides it exactly.
pub fn format_period(duration: Duration) -> String {
    let seconds = duration.as_secs();
    if seconds == 0 {
        return "0s".to_string();
    }
    if seconds % SECONDS_PER_DAY == 0 {
        return format!("{}d", seconds / SECONDS_PER_DAY);
    }
    if seconds % SECONDS_PER_HOUR == 0 {
        return format!("{}h", seconds / SECONDS_PER_HOUR);
    }
    if seconds % SECONDS_PER_MINUTE == 0 {
        return format!("{}m", seconds / SECONDS_PER_MINUTE);
    }
    format!("{seconds}s")
}
