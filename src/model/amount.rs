//! Amount type for handling Rupiah values as they are typed into an Indonesian spreadsheet.
//!
//! Sheet cells look like `Rp 1.234.567,89`: an optional currency prefix, `.` as the thousands
//! separator and `,` as the decimal separator. This module provides the `Amount` type which wraps
//! `Decimal`, parses that convention, and formats values for display.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;
use tracing::{debug, warn};

/// The currency prefix used both when parsing and when displaying.
const CURRENCY: &str = "Rp";

/// Cells above this (one quadrillion Rupiah) are treated as typing mistakes.
const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Represents a non-negative Rupiah amount.
///
/// # Examples
///
/// Parsing the Indonesian convention:
/// ```
/// # use sheet_insights::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("Rp 1.234.567,89").unwrap();
/// assert_eq!(amount.value().to_string(), "1234567.89");
/// assert_eq!(amount.to_string(), "Rp 1,234,568");
/// ```
///
/// Unparseable cells become zero when read leniently:
/// ```
/// # use sheet_insights::model::Amount;
/// assert!(Amount::from_cell("abc").is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    pub const ZERO: Amount = Amount {
        value: Decimal::ZERO,
    };

    /// Creates a new `Amount`. Callers are responsible for passing a non-negative value.
    pub const fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Reads a sheet cell. A cell that does not hold a valid non-negative number becomes zero.
    ///
    /// This leniency can under-report spend, so every coerced cell other than a blank one is
    /// reported with `warn!`.
    pub fn from_cell(cell: &str) -> Self {
        match Amount::from_str(cell) {
            Ok(amount) => amount,
            Err(AmountError::Empty) => Amount::ZERO,
            Err(e) => {
                warn!("Treating amount cell '{cell}' as zero: {e}");
                Amount::ZERO
            }
        }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// The short axis-label form: thousands with one fractional digit, rounded half away from
    /// zero, e.g. `Rp1.5k`.
    pub fn compact(&self) -> String {
        let mut thousands = (self.value / Decimal::ONE_THOUSAND)
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        thousands.rescale(1);
        format!("{CURRENCY}{thousands}k")
    }

    /// The value rounded to whole Rupiah, half away from zero.
    fn rounded(&self) -> Decimal {
        self.value
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// An error that can occur when parsing strings into `Amount` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// Nothing was left after removing the currency prefix and whitespace.
    Empty,
    /// The cleaned text is not a number.
    Invalid(String),
    /// The number is below zero.
    Negative(Decimal),
    /// The number is above `MAX_AMOUNT`.
    TooLarge(Decimal),
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Empty => write!(f, "the amount is empty"),
            AmountError::Invalid(cleaned) => write!(f, "'{cleaned}' is not a number"),
            AmountError::Negative(value) => write!(f, "{value} is negative"),
            AmountError::TooLarge(value) => write!(f, "{value} is larger than {MAX_AMOUNT}"),
        }
    }
}

impl std::error::Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = strip_currency_and_whitespace(s);
        if stripped.is_empty() {
            return Err(AmountError::Empty);
        }

        // `.` groups thousands and the first `,` is the decimal point
        let cleaned = stripped.replace('.', "").replacen(',', ".", 1);
        let (number, rest) =
            leading_number(&cleaned).ok_or_else(|| AmountError::Invalid(cleaned.clone()))?;
        if !rest.is_empty() {
            debug!("Ignoring '{rest}' after the amount in '{s}'");
        }
        let value =
            Decimal::from_str(&number).map_err(|_| AmountError::Invalid(cleaned.clone()))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative(value));
        }
        if value > MAX_AMOUNT {
            return Err(AmountError::TooLarge(value));
        }
        Ok(Amount::new(value.normalize()))
    }
}

/// The longest number at the start of `cleaned`: an optional `-`, digits, then at most one `.`
/// followed by more digits. Returns the number and the text after it, such as the `.-` in
/// `50000.-` or the `IDR` in `50000IDR`.
fn leading_number(cleaned: &str) -> Option<(String, &str)> {
    let bytes = cleaned.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };
    let sign = usize::from(bytes.first() == Some(&b'-'));
    let whole = digits_from(sign);
    let mut end = sign + whole;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits_from(end + 1);
        if fraction > 0 {
            end += 1 + fraction;
        }
    }
    if whole + fraction == 0 {
        return None;
    }
    let mut number = cleaned[..end].to_string();
    if whole == 0 {
        number.insert(sign, '0');
    }
    Some((number, &cleaned[end..]))
}

/// Removes every case-insensitive occurrence of the currency prefix and all whitespace.
fn strip_currency_and_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(c) = rest.chars().next() {
        if rest.len() >= CURRENCY.len()
            && rest.as_bytes()[..CURRENCY.len()].eq_ignore_ascii_case(CURRENCY.as_bytes())
        {
            rest = &rest[CURRENCY.len()..];
            continue;
        }
        if !c.is_whitespace() {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let whole = self.rounded().to_f64().unwrap_or_default();
        write!(f, "{CURRENCY} {}", format_num::format_num!(",.0f", whole))
    }
}

/// Amounts travel as plain JSON numbers, e.g. in the payload sent to the AI backend.
impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.value.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative number or a Rupiah string")
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::new(Decimal::from(v)))
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Amount, E> {
        if v < 0 {
            return Err(E::custom(AmountError::Negative(Decimal::from(v))));
        }
        Ok(Amount::new(Decimal::from(v)))
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Amount, E> {
        let value = Decimal::from_f64(v).ok_or_else(|| E::custom(format!("{v} is not finite")))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(E::custom(AmountError::Negative(value)));
        }
        Ok(Amount::new(value.normalize()))
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl Add for Amount {
    type Output = Amount;

    /// Saturates at `Decimal::MAX` instead of overflowing.
    fn add(self, rhs: Amount) -> Amount {
        Amount::new(self.value.saturating_add(rhs.value))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_indonesian_format() {
        let amount = Amount::from_str("Rp 1.234.567,89").unwrap();
        assert_eq!(amount.value(), dec("1234567.89"));
    }

    #[test]
    fn test_parse_plain_integer() {
        let amount = Amount::from_str("1500").unwrap();
        assert_eq!(amount.value(), dec("1500"));
    }

    #[test]
    fn test_parse_prefix_without_space() {
        let amount = Amount::from_str("Rp50.000").unwrap();
        assert_eq!(amount.value(), dec("50000"));
    }

    #[test]
    fn test_parse_prefix_any_case() {
        assert_eq!(Amount::from_str("RP 7.500").unwrap().value(), dec("7500"));
        assert_eq!(Amount::from_str("rp7.500").unwrap().value(), dec("7500"));
    }

    #[test]
    fn test_parse_inner_whitespace() {
        let amount = Amount::from_str("  Rp 12 500 ,5 ").unwrap();
        assert_eq!(amount.value(), dec("12500.5"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Amount::from_str(""), Err(AmountError::Empty));
        assert_eq!(Amount::from_str(" Rp "), Err(AmountError::Empty));
        assert!(matches!(
            Amount::from_str("abc"),
            Err(AmountError::Invalid(_))
        ));
        assert!(matches!(
            Amount::from_str("-5.000"),
            Err(AmountError::Negative(_))
        ));
    }

    #[test]
    fn test_from_cell_is_lenient() {
        assert_eq!(Amount::from_cell("abc"), Amount::ZERO);
        assert_eq!(Amount::from_cell(""), Amount::ZERO);
        assert_eq!(Amount::from_cell("-Rp 10.000"), Amount::ZERO);
        assert_eq!(Amount::from_cell("1500").value(), dec("1500"));
    }

    #[test]
    fn test_parse_reads_leading_number() {
        assert_eq!(Amount::from_cell("Rp 50.000,-").value(), dec("50000"));
        assert_eq!(Amount::from_cell("50.000 IDR").value(), dec("50000"));
        assert_eq!(Amount::from_cell("Rp 25.000,00-").value(), dec("25000"));
        assert_eq!(Amount::from_str("1,2,3").unwrap().value(), dec("1.2"));
        assert_eq!(Amount::from_str(",5").unwrap().value(), dec("0.5"));
        assert!(matches!(
            Amount::from_str("IDR 50.000"),
            Err(AmountError::Invalid(_))
        ));
        assert!(matches!(Amount::from_str("-"), Err(AmountError::Invalid(_))));
    }

    #[test]
    fn test_parse_too_large() {
        let cell = "79.228.162.514.264.337.593.543.950.335";
        assert!(matches!(
            Amount::from_str(cell),
            Err(AmountError::TooLarge(_))
        ));
        assert!(Amount::from_cell(cell).is_zero());
        assert_eq!(
            Amount::from_str("1.000.000.000.000.000").unwrap().value(),
            MAX_AMOUNT
        );
    }

    #[test]
    fn test_add_saturates() {
        let max = Amount::new(Decimal::MAX);
        assert_eq!((max + max).value(), Decimal::MAX);
        let total: Amount = [max, max, Amount::new(dec("1"))].iter().sum();
        assert_eq!(total.value(), Decimal::MAX);
    }

    #[test]
    fn test_display_rounds_and_groups() {
        let amount = Amount::new(dec("1234567.89"));
        assert_eq!(amount.to_string(), "Rp 1,234,568");
    }

    #[test]
    fn test_display_half_rounds_up() {
        assert_eq!(Amount::new(dec("2.5")).to_string(), "Rp 3");
        assert_eq!(Amount::new(dec("2.49")).to_string(), "Rp 2");
    }

    #[test]
    fn test_display_zero() {
        assert_eq!(Amount::ZERO.to_string(), "Rp 0");
    }

    #[test]
    fn test_compact() {
        assert_eq!(Amount::new(dec("1500")).compact(), "Rp1.5k");
        assert_eq!(Amount::new(dec("250000")).compact(), "Rp250.0k");
        assert_eq!(Amount::ZERO.compact(), "Rp0.0k");
        assert_eq!(Amount::new(dec("1250")).compact(), "Rp1.3k");
        assert_eq!(Amount::new(dec("1249")).compact(), "Rp1.2k");
    }

    #[test]
    fn test_serialize_as_number() {
        let amount = Amount::new(dec("50000"));
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "50000.0");
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let a: Amount = serde_json::from_str("50000").unwrap();
        let b: Amount = serde_json::from_str("\"Rp 50.000\"").unwrap();
        let c: Amount = serde_json::from_str("12.5").unwrap();
        assert_eq!(a, b);
        assert_eq!(c.value(), dec("12.5"));
        assert!(serde_json::from_str::<Amount>("-3").is_err());
    }

    #[test]
    fn test_sum() {
        let amounts = [
            Amount::new(dec("100")),
            Amount::new(dec("50.5")),
            Amount::ZERO,
        ];
        let total: Amount = amounts.iter().sum();
        assert_eq!(total.value(), dec("150.5"));
    }

    #[test]
    fn test_ordering() {
        assert!(Amount::new(dec("30")) < Amount::new(dec("50")));
    }
}
