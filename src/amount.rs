//! USDC amount parsing.
//!
//! Amounts are accepted in three notations and carried as fixed-point
//! [`Decimal`] values until the wire boundary:
//!
//! - `50¢` — cents, divided by 100
//! - `$0.50` — dollars with an explicit decimal point
//! - `0.5` — bare decimal dollars

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AmountError {
    #[error("invalid amount {input:?}: expected a number like \"0.50\", \"$0.50\" or \"50¢\"")]
    NotANumber { input: String },
    #[error(
        "ambiguous amount {input:?}: shells expand unquoted \"$N\"; write \"{bare}.00\" or \"${bare}.00\" instead"
    )]
    AmbiguousDollarInteger { input: String, bare: String },
    #[error("amount must be greater than zero, got {input:?}")]
    NotPositive { input: String },
}

/// A positive USDC amount in dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount(Decimal);

impl Amount {
    /// Dollar value for the JSON wire format. Float only here, never in
    /// arithmetic.
    pub fn as_dollars(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let not_a_number = || AmountError::NotANumber {
            input: input.to_string(),
        };

        let value = if let Some(cents) = trimmed.strip_suffix('¢') {
            let cents: Decimal = cents.parse().map_err(|_| not_a_number())?;
            cents / Decimal::from(100)
        } else if let Some(dollars) = trimmed.strip_prefix('$') {
            // "$5" that survives unquoted shell expansion was almost
            // certainly meant as "$5.00" and lost its tail, so require an
            // explicit decimal point after "$".
            if !dollars.contains('.') {
                return Err(AmountError::AmbiguousDollarInteger {
                    input: input.to_string(),
                    bare: dollars.to_string(),
                });
            }
            dollars.parse().map_err(|_| not_a_number())?
        } else {
            trimmed.parse().map_err(|_| not_a_number())?
        };

        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive {
                input: input.to_string(),
            });
        }
        Ok(Amount(value))
    }
}
