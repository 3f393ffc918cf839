//! Monetary amount value object.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A positive monetary amount in the gateway's settlement currency.
///
/// Backed by a decimal so values like 9.90 survive untouched; immutable once
/// attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Creates an amount, rejecting zero and negative values.
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value <= Decimal::ZERO {
            return Err(ValidationError::not_positive("amount", value));
        }
        Ok(Self(value))
    }

    /// Returns the inner decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_zero_and_negative() {
        assert!(Amount::new(dec!(0)).is_err());
        assert!(Amount::new(dec!(-9.90)).is_err());
    }

    #[test]
    fn accepts_positive_values() {
        let amount = Amount::new(dec!(9.90)).unwrap();
        assert_eq!(amount.as_decimal(), dec!(9.90));
    }

    #[test]
    fn displays_with_two_decimal_places() {
        assert_eq!(Amount::new(dec!(9.9)).unwrap().to_string(), "9.90");
        assert_eq!(Amount::new(dec!(29.90)).unwrap().to_string(), "29.90");
    }
}
