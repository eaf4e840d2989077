//! Fixed-point amounts of money.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::html::format_currency;

/// An amount of money with at most two decimal places.
///
/// Amounts are stored in the database as a whole number of cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(Decimal);

/// The reasons a string is not a valid amount.
///
/// The messages are shown to the user next to the amount field.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AmountError {
    /// The amount was left blank.
    #[error("This field is required.")]
    Empty,
    /// The string is not a decimal number.
    #[error("Enter a number.")]
    NotANumber,
    /// The number has more than [Amount::MAX_DIGITS] digits.
    #[error("Ensure that there are no more than 10 digits in total.")]
    TooManyDigits,
    /// The number has more than [Amount::DECIMAL_PLACES] decimal places.
    #[error("Ensure that there are no more than 2 decimal places.")]
    TooManyDecimalPlaces,
    /// The number has more than eight digits before the decimal point.
    #[error("Ensure that there are no more than 8 digits before the decimal point.")]
    TooManyWholeDigits,
    /// The number is smaller than [Amount::MIN_ENTRY].
    #[error("Ensure this value is greater than or equal to 0.01.")]
    TooSmall,
}

impl Amount {
    /// The most digits an amount may have.
    pub const MAX_DIGITS: u32 = 10;
    /// The most digits an amount may have after the decimal point.
    pub const DECIMAL_PLACES: u32 = 2;
    /// The smallest amount that can be entered in a form.
    pub const MIN_ENTRY: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

    /// Create an amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, Self::DECIMAL_PLACES))
    }

    /// The amount as a whole number of cents.
    pub fn as_cents(&self) -> i64 {
        let cents = (self.0 * Decimal::ONE_HUNDRED).trunc();

        cents.to_i64().unwrap_or(if cents.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        })
    }

    /// The amount as a decimal number.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// The size of the amount, ignoring its sign.
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Whether the amount is less than zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Parse an amount typed into a form.
    ///
    /// Only amounts of at least [Amount::MIN_ENTRY] are accepted. Whether the
    /// money came in or went out is given by the transaction type, not the sign.
    ///
    /// # Errors
    /// Returns an [AmountError] describing the first problem found.
    pub fn parse_entry(raw_amount: &str) -> Result<Self, AmountError> {
        let amount: Amount = raw_amount.parse()?;

        if amount.0 < Self::MIN_ENTRY {
            return Err(AmountError::TooSmall);
        }

        Ok(amount)
    }

    /// Format the amount without a currency symbol for a number input, e.g. "12.30".
    pub fn to_input_value(&self) -> String {
        format!("{:.2}", self.0)
    }
}

/// Count the digits of `mantissa`, treating zero as a single digit.
fn count_digits(mantissa: i128) -> u32 {
    mantissa.unsigned_abs().checked_ilog10().map_or(1, |log| log + 1)
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(raw_amount: &str) -> Result<Self, Self::Err> {
        let raw_amount = raw_amount.trim();

        if raw_amount.is_empty() {
            return Err(AmountError::Empty);
        }

        let number = Decimal::from_str_exact(raw_amount).map_err(|_| AmountError::NotANumber)?;

        let mantissa_digits = count_digits(number.mantissa());
        let decimal_places = number.scale();
        let digits = mantissa_digits.max(decimal_places);
        let whole_digits = digits - decimal_places;

        if digits > Self::MAX_DIGITS {
            Err(AmountError::TooManyDigits)
        } else if decimal_places > Self::DECIMAL_PLACES {
            Err(AmountError::TooManyDecimalPlaces)
        } else if whole_digits > Self::MAX_DIGITS - Self::DECIMAL_PLACES {
            Err(AmountError::TooManyWholeDigits)
        } else {
            Ok(Self(number))
        }
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value.round_dp(Self::DECIMAL_PLACES))
    }
}

impl std::ops::Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_currency(self.0))
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_cents()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(cents) => Ok(Self::from_cents(cents)),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{Amount, AmountError};

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!("50".parse::<Amount>().unwrap().as_decimal(), dec!(50));
        assert_eq!("12.3".parse::<Amount>().unwrap().as_decimal(), dec!(12.3));
        assert_eq!(" 0.05 ".parse::<Amount>().unwrap().as_decimal(), dec!(0.05));
    }

    #[test]
    fn rejects_blank_and_non_numbers() {
        assert_eq!("".parse::<Amount>(), Err(AmountError::Empty));
        assert_eq!("twelve".parse::<Amount>(), Err(AmountError::NotANumber));
        assert_eq!("1.2.3".parse::<Amount>(), Err(AmountError::NotANumber));
    }

    #[test]
    fn rejects_too_many_decimal_places() {
        assert_eq!(
            "1.234".parse::<Amount>(),
            Err(AmountError::TooManyDecimalPlaces)
        );
    }

    #[test]
    fn rejects_too_many_digits() {
        assert_eq!(
            "12345678901".parse::<Amount>(),
            Err(AmountError::TooManyDigits)
        );
        assert_eq!(
            "123456789.01".parse::<Amount>(),
            Err(AmountError::TooManyDigits)
        );
    }

    #[test]
    fn rejects_too_many_whole_digits() {
        assert_eq!(
            "123456789".parse::<Amount>(),
            Err(AmountError::TooManyWholeDigits)
        );
        assert!("12345678.99".parse::<Amount>().is_ok());
    }

    #[test]
    fn entries_must_be_at_least_one_cent() {
        assert_eq!(Amount::parse_entry("0"), Err(AmountError::TooSmall));
        assert_eq!(Amount::parse_entry("-5"), Err(AmountError::TooSmall));
        assert!(Amount::parse_entry("0.01").is_ok());
    }

    #[test]
    fn converts_to_and_from_cents() {
        let amount = Amount::from_cents(-1230);

        assert_eq!(amount.as_decimal(), dec!(-12.30));
        assert_eq!(amount.as_cents(), -1230);
        assert_eq!(Amount::from(dec!(0.07)).as_cents(), 7);
    }

    #[test]
    fn formats_input_value_with_two_decimal_places() {
        assert_eq!(Amount::from(dec!(12.3)).to_input_value(), "12.30");
        assert_eq!(Amount::from(dec!(50)).to_input_value(), "50.00");
    }

    #[test]
    fn displays_as_currency() {
        assert_eq!(Amount::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Amount::from_cents(-500).to_string(), "-$5.00");
    }
}
