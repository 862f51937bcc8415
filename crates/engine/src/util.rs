//! Internal helpers for parsing and normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation logic so the engine enforces consistent invariants.

use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parses a stored or user supplied id.
pub(crate) fn parse_id(value: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(value.to_string()))
}

/// Parses a signed decimal string into an integer scaled by `10^digits`.
///
/// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
/// Rejects more than `digits` fractional digits.
pub(crate) fn parse_fixed(s: &str, digits: u32) -> ResultEngine<i64> {
    let empty = || EngineError::InvalidAmount("empty amount".to_string());
    let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
    let overflow = || EngineError::InvalidAmount("amount too large".to_string());

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(empty());
    }

    let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (true, stripped)
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (false, stripped)
    } else {
        (false, trimmed)
    };

    let rest = rest.trim();
    if rest.is_empty() {
        return Err(empty());
    }

    let rest = rest.replace(',', ".");
    let mut parts = rest.split('.');
    let whole_str = parts.next().ok_or_else(invalid)?;
    let frac_str = parts.next();

    if parts.next().is_some() {
        return Err(invalid());
    }

    if whole_str.is_empty() || !whole_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: i64 = whole_str.parse().map_err(|_| invalid())?;
    let scale = 10i64.pow(digits);

    let frac: i64 = match frac_str {
        None | Some("") => 0,
        Some(frac) => {
            if !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            if frac.len() > digits as usize {
                return Err(EngineError::InvalidAmount("too many decimals".to_string()));
            }
            let padding = 10i64.pow(digits - frac.len() as u32);
            frac.parse::<i64>().map_err(|_| invalid())? * padding
        }
    };

    let total = whole
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac))
        .ok_or_else(overflow)?;

    if negative {
        total.checked_neg().ok_or_else(overflow)
    } else {
        Ok(total)
    }
}

/// Formats an integer scaled by `10^digits` as a plain decimal string.
pub(crate) fn format_fixed(value: i64, digits: u32) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let scale = 10u64.pow(digits);
    let width = digits as usize;
    format!("{sign}{}.{:0width$}", abs / scale, abs % scale)
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_roundtrips_through_display() {
        assert_eq!(format_fixed(parse_fixed("12.3", 3).unwrap(), 3), "12.300");
        assert_eq!(format_fixed(-5, 2), "-0.05");
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(normalize_required_name("   ", "station").is_err());
        assert_eq!(normalize_required_name(" Main ", "station").unwrap(), "Main");
    }
}
