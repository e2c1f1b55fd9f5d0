//! Amount type
//!
//! Domain primitive for monetary amounts with business rule validation.
//! Amounts are whole numbers of the smallest currency unit; every amount is
//! validated at construction time so invalid values cannot exist in the
//! system.

use std::fmt;

use serde::Serialize;

/// Maximum allowed amount in a single operation (1 trillion units)
const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Amount represents a validated monetary value.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - Value is integral (no fractional currency units)
/// - Value does not exceed `MAX_AMOUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Amount(i64);

/// Errors that can occur when validating an amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Invalid balance amount. Please enter a valid number.")]
    NotANumber,

    #[error("The balance amount must be greater than 0. Please enter a positive number.")]
    NonPositive,

    #[error("The balance amount must be a whole number with no decimals.")]
    Fractional,

    #[error("The balance amount exceeds the maximum supported value.")]
    TooLarge,
}

impl Amount {
    /// Validate a raw request value as an amount.
    ///
    /// Rules are applied in order; the first failing rule determines the
    /// error:
    /// 1. the value must be a JSON number
    /// 2. the value must be > 0
    /// 3. the value must have no fractional component
    ///
    /// Pure function of its input, no side effects.
    pub fn check(raw: &serde_json::Value) -> Result<Self, AmountError> {
        if !raw.is_number() {
            return Err(AmountError::NotANumber);
        }

        if let Some(value) = raw.as_i64() {
            return Self::new(value);
        }

        // Positive integers above i64::MAX deserialize as u64
        if raw.as_u64().is_some() {
            return Err(AmountError::TooLarge);
        }

        let value = raw.as_f64().ok_or(AmountError::NotANumber)?;
        if value <= 0.0 {
            return Err(AmountError::NonPositive);
        }
        if value.fract() != 0.0 {
            return Err(AmountError::Fractional);
        }
        if value > MAX_AMOUNT as f64 {
            return Err(AmountError::TooLarge);
        }

        Ok(Self(value as i64))
    }

    /// Create a new Amount from an integer with validation.
    pub fn new(value: i64) -> Result<Self, AmountError> {
        if value <= 0 {
            return Err(AmountError::NonPositive);
        }
        if value > MAX_AMOUNT {
            return Err(AmountError::TooLarge);
        }
        Ok(Self(value))
    }

    /// Get the underlying integer value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_amount_positive_integer() {
        let amount = Amount::check(&json!(500)).unwrap();
        assert_eq!(amount.value(), 500);
    }

    #[test]
    fn test_amount_integral_float_accepted() {
        // 100.0 arrives as a JSON float but has no fractional component
        let amount = Amount::check(&json!(100.0)).unwrap();
        assert_eq!(amount.value(), 100);
    }

    #[test]
    fn test_amount_string_rejected() {
        assert_eq!(Amount::check(&json!("100")), Err(AmountError::NotANumber));
    }

    #[test]
    fn test_amount_null_rejected() {
        assert_eq!(
            Amount::check(&serde_json::Value::Null),
            Err(AmountError::NotANumber)
        );
    }

    #[test]
    fn test_amount_zero_rejected() {
        assert_eq!(Amount::check(&json!(0)), Err(AmountError::NonPositive));
    }

    #[test]
    fn test_amount_negative_rejected() {
        assert_eq!(Amount::check(&json!(-50)), Err(AmountError::NonPositive));
    }

    #[test]
    fn test_amount_fractional_rejected() {
        assert_eq!(Amount::check(&json!(10.5)), Err(AmountError::Fractional));
    }

    #[test]
    fn test_negative_fraction_reports_non_positive() {
        // Rule order: positivity is checked before integrality
        assert_eq!(Amount::check(&json!(-0.5)), Err(AmountError::NonPositive));
    }

    #[test]
    fn test_amount_overflow() {
        assert_eq!(
            Amount::check(&json!(MAX_AMOUNT + 1)),
            Err(AmountError::TooLarge)
        );
        assert_eq!(Amount::check(&json!(u64::MAX)), Err(AmountError::TooLarge));
    }

    #[test]
    fn test_amount_max_value_ok() {
        assert!(Amount::check(&json!(MAX_AMOUNT)).is_ok());
    }

    #[test]
    fn test_amount_bool_rejected() {
        assert_eq!(Amount::check(&json!(true)), Err(AmountError::NotANumber));
    }
}
