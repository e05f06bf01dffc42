//! Small value validators shared by the configuration checks.
use std::ops::RangeInclusive;

/// Validates that a floating-point parameter is finite and strictly positive.
///
/// # Arguments
///
/// * `value` - The value to validate.
///
/// # Returns
///
/// * `Ok(())` if the value is finite and greater than zero.
/// * `Err(&'static str)` otherwise.
pub fn is_positive_finite(value: f64) -> Result<(), &'static str> {
    if !value.is_finite() {
        return Err("Value must be finite");
    }
    if value > 0.0 {
        Ok(())
    } else {
        Err("Value must be greater than 0")
    }
}

/// Validates that a floating-point parameter is finite and not negative.
///
/// Thresholds of exactly zero are allowed: a zero peak threshold accepts every
/// non-zero extremum.
pub fn is_non_negative_finite(value: f64) -> Result<(), &'static str> {
    if !value.is_finite() {
        return Err("Value must be finite");
    }
    if value >= 0.0 {
        Ok(())
    } else {
        Err("Value cannot be negative")
    }
}

/// Validates that a count is non-zero.
pub fn is_non_zero(value: usize) -> Result<(), &'static str> {
    if value > 0 {
        Ok(())
    } else {
        Err("Value must be greater than 0")
    }
}

/// Validates if a given value is within a specified numeric range.
///
/// # Arguments
///
/// * `value` - The value to validate.
/// * `range` - The inclusive range to validate against.
///
/// # Returns
///
/// * `Ok(())` if the value is within the range.
/// * `Err(&'static str)` if the value is outside the range.
pub fn is_in_range<T: PartialOrd>(value: T, range: RangeInclusive<T>) -> Result<(), &'static str> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err("Value is outside the specified range")
    }
}

/// Validates that a log level name is one `tracing` understands.
pub fn is_valid_log_level(level: &str) -> Result<(), &'static str> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err("Log level must be one of: trace, debug, info, warn, error"),
    }
}
