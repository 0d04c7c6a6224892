//! Monetary amounts cross the API as decimal major units but live inside the
//! core as integer cents, so share arithmetic stays exact.

use crate::constants::MAX_AMOUNT_CENTS;
use crate::core::errors::DivvyError;

/// Converts a major-unit decimal (e.g. `12.34`) into integer cents.
///
/// Rejects non-finite and negative values, values above the accepted maximum
/// and values carrying more than two decimal places.
pub fn to_cents(field: &str, amount: f64) -> Result<i64, DivvyError> {
    if !amount.is_finite() {
        return Err(DivvyError::invalid_input(field, "Amount must be a finite number"));
    }
    if amount < 0.0 {
        return Err(DivvyError::invalid_input(field, "Amount cannot be negative"));
    }
    let scaled = amount * 100.0;
    let cents = scaled.round();
    // f64 cannot represent most two-decimal values exactly, so compare the
    // rounded cents against the scaled input with a sub-cent tolerance.
    if (scaled - cents).abs() > 1e-6 {
        return Err(DivvyError::invalid_input(
            field,
            "Amount cannot have more than 2 decimal places",
        ));
    }
    let cents = cents as i64;
    if cents > MAX_AMOUNT_CENTS {
        return Err(DivvyError::invalid_input(field, "Amount too large"));
    }
    Ok(cents)
}

/// Converts integer cents back to a major-unit decimal for presentation.
pub fn to_major(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_two_decimal_amounts() {
        assert_eq!(to_cents("amount", 0.0).unwrap(), 0);
        assert_eq!(to_cents("amount", 10.55).unwrap(), 1055);
        assert_eq!(to_cents("amount", 100.0).unwrap(), 10000);
        assert_eq!(to_cents("amount", 0.01).unwrap(), 1);
    }

    #[test]
    fn rejects_sub_cent_precision() {
        assert!(to_cents("amount", 12.345).is_err());
        assert!(to_cents("amount", 0.001).is_err());
    }

    #[test]
    fn rejects_negative_and_non_finite() {
        assert!(to_cents("amount", -1.0).is_err());
        assert!(to_cents("amount", f64::NAN).is_err());
        assert!(to_cents("amount", f64::INFINITY).is_err());
    }

    #[test]
    fn round_trips_for_presentation() {
        assert_eq!(to_major(1055), 10.55);
        assert_eq!(to_major(0), 0.0);
    }
}
