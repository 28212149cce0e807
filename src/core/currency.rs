use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported currencies with their decimal precision rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(3)", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Bangladeshi Taka (2 decimal places)
    BDT,
    /// US Dollar (2 decimal places)
    USD,
}

impl Currency {
    /// Returns the decimal scale for this currency
    pub fn scale(&self) -> u32 {
        match self {
            Currency::BDT | Currency::USD => 2,
        }
    }

    /// Rounds a decimal value to the appropriate scale for this currency
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp(self.scale())
    }

    /// Validates that a decimal value has the correct scale for this currency
    pub fn validate_amount(&self, amount: Decimal) -> Result<(), String> {
        if amount.scale() > self.scale() {
            return Err(format!(
                "{} amounts must have at most {} decimal places, got {}",
                self,
                self.scale(),
                amount.scale()
            ));
        }

        if amount < Decimal::ZERO {
            return Err(format!("{} amount cannot be negative", self));
        }

        Ok(())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::BDT => write!(f, "BDT"),
            Currency::USD => write!(f, "USD"),
        }
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BDT" => Ok(Currency::BDT),
            "USD" => Ok(Currency::USD),
            _ => Err(format!("Unsupported currency: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_to_scale() {
        let amount = Decimal::new(104999, 3); // 104.999
        assert_eq!(Currency::BDT.round(amount), Decimal::new(10500, 2));
    }

    #[test]
    fn test_validate_rejects_over_scaled_amount() {
        let amount = Decimal::new(10001, 3); // 10.001
        assert!(Currency::BDT.validate_amount(amount).is_err());
        assert!(Currency::BDT
            .validate_amount(Decimal::new(1000, 2))
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_amount() {
        assert!(Currency::BDT
            .validate_amount(Decimal::new(-100, 2))
            .is_err());
    }

    #[test]
    fn test_round_trip_display_parse() {
        assert_eq!("BDT".parse::<Currency>().unwrap(), Currency::BDT);
        assert_eq!(Currency::USD.to_string(), "USD");
        assert!("EUR".parse::<Currency>().is_err());
    }
}
