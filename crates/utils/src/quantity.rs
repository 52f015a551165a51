//! Kubernetes resource quantity parsing

use crate::ResolveError;

/// One mebibyte in bytes.
pub const MEBIBYTE: f64 = 1024.0 * 1024.0;

/// Parse a Kubernetes quantity string into its value in base units.
///
/// Supports the following suffixes:
/// - Binary: "Ki", "Mi", "Gi", "Ti", "Pi", "Ei"
/// - Decimal: "n", "u", "m", "k", "M", "G", "T", "P", "E"
/// - Exponent notation: "1e3", "1.5E-2"
/// - No suffix: plain number
///
/// # Errors
///
/// - [`ResolveError::InvalidQuantity`] if the value is empty, has an unknown
///   suffix, or the numeric part does not parse
pub fn parse_quantity(value: &str) -> Result<f64, ResolveError> {
    let value = value.trim();
    let invalid = || ResolveError::InvalidQuantity(value.to_string());

    if value.is_empty() {
        return Err(invalid());
    }

    // Handle plain numbers, including exponent notation
    if let Ok(number) = value.parse::<f64>() {
        return if number.is_finite() {
            Ok(number)
        } else {
            Err(invalid())
        };
    }

    let pos = value
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(invalid)?;
    let (numeric_part, unit) = value.split_at(pos);

    let multiplier = match unit {
        "Ki" => 1024_f64,
        "Mi" => 1024_f64.powi(2),
        "Gi" => 1024_f64.powi(3),
        "Ti" => 1024_f64.powi(4),
        "Pi" => 1024_f64.powi(5),
        "Ei" => 1024_f64.powi(6),
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        _ => return Err(invalid()),
    };

    let numeric_value = numeric_part.parse::<f64>().map_err(|_| invalid())?;

    Ok(numeric_value * multiplier)
}
