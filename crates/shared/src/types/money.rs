//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (e.g. francs, dollars).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

/// ISO 4217 currencies supported by the cooperative ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Rwandan Franc
    #[default]
    Rwf,
    /// Ugandan Shilling
    Ugx,
    /// Kenyan Shilling
    Kes,
    /// US Dollar
    Usd,
    /// Euro
    Eur,
}

impl Currency {
    /// Number of decimal places of the smallest currency unit.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::Rwf | Self::Ugx => 0,
            Self::Kes | Self::Usd | Self::Eur => 2,
        }
    }

    /// The smallest representable amount (1 franc, 0.01 dollar).
    #[must_use]
    pub fn smallest_unit(self) -> Decimal {
        Decimal::new(1, self.minor_units())
    }
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Rounds half away from zero to the currency's minor units.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            amount: self.amount.round_dp_with_strategy(
                self.currency.minor_units(),
                RoundingStrategy::MidpointAwayFromZero,
            ),
            currency: self.currency,
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rounded = self.rounded();
        write!(
            f,
            "{} {:.prec$}",
            self.currency,
            rounded.amount,
            prec = self.currency.minor_units() as usize
        )
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rwf => write!(f, "RWF"),
            Self::Ugx => write!(f, "UGX"),
            Self::Kes => write!(f, "KES"),
            Self::Usd => write!(f, "USD"),
            Self::Eur => write!(f, "EUR"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RWF" => Ok(Self::Rwf),
            "UGX" => Ok(Self::Ugx),
            "KES" => Ok(Self::Kes),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_money_zero() {
        let money = Money::zero(Currency::Rwf);
        assert!(money.is_zero());
        assert!(!money.is_negative());
        assert_eq!(money.currency, Currency::Rwf);
    }

    #[test]
    fn test_money_is_negative() {
        assert!(Money::new(dec!(-10), Currency::Usd).is_negative());
        assert!(!Money::new(dec!(10), Currency::Usd).is_negative());
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(Currency::Rwf.minor_units(), 0);
        assert_eq!(Currency::Usd.minor_units(), 2);
        assert_eq!(Currency::Rwf.smallest_unit(), dec!(1));
        assert_eq!(Currency::Kes.smallest_unit(), dec!(0.01));
    }

    #[test]
    fn test_rounded_half_away_from_zero() {
        assert_eq!(Money::new(dec!(2.5), Currency::Rwf).rounded().amount, dec!(3));
        assert_eq!(Money::new(dec!(-2.5), Currency::Rwf).rounded().amount, dec!(-3));
        assert_eq!(Money::new(dec!(1.005), Currency::Usd).rounded().amount, dec!(1.01));
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(dec!(300000), Currency::Rwf).to_string(), "RWF 300000");
        assert_eq!(Money::new(dec!(12.5), Currency::Usd).to_string(), "USD 12.50");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("rwf").unwrap(), Currency::Rwf);
        assert_eq!(Currency::from_str("USD").unwrap(), Currency::Usd);
        assert!(Currency::from_str("XXX").is_err());
        assert_eq!(Currency::default(), Currency::Rwf);
    }
}
