use crate::CURRENCY_PRECISION;
use log::trace;
use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};
use std::str::FromStr;
use thiserror::Error;

/// Locale rules for turning typed amounts into canonical values and back.
///
/// The default matches the Chilean Spanish convention the tracker was built for:
/// `.` groups thousands and `,` separates decimals, so "1.234,50" is 1234.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    thousands_separator: char,
    decimal_separator: char,
    // Integers with fewer than `min_grouping_digits + 3` digits are not grouped.
    min_grouping_digits: u8,
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("no amount was entered")]
    Empty,
    #[error("'{0}' is not a valid amount")]
    Invalid(String),
    #[error("amount must be greater than zero (got {0})")]
    NotPositive(Decimal),
}

#[derive(Error, Debug, PartialEq)]
pub enum FormatError {
    #[error("thousands and decimal separators must be different")]
    AmbiguousSeparators,
    #[error("'{0}' cannot be used as a separator")]
    InvalidSeparator(char),
}

// A numeral split into its parts, after separators have been canonicalised.
struct Numeral<'a> {
    negative: bool,
    int: &'a str,
    frac: Option<&'a str>,
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat {
            thousands_separator: '.',
            decimal_separator: ',',
            min_grouping_digits: 1,
        }
    }
}

impl NumberFormat {
    pub fn new(thousands_separator: char, decimal_separator: char) -> Result<Self, FormatError> {
        for c in [thousands_separator, decimal_separator].iter() {
            if c.is_ascii_digit() || *c == '-' || *c == '+' {
                return Err(FormatError::InvalidSeparator(*c));
            }
        }

        if thousands_separator == decimal_separator {
            return Err(FormatError::AmbiguousSeparators);
        }

        Ok(NumberFormat {
            thousands_separator,
            decimal_separator,
            min_grouping_digits: 1,
        })
    }

    /// Only group integers with at least `digits + 3` digits. Some locales
    /// write "1234" but "12.345".
    pub fn with_min_grouping_digits(mut self, digits: u8) -> Self {
        self.min_grouping_digits = digits.max(1);
        self
    }

    pub fn thousands_separator(&self) -> char {
        self.thousands_separator
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    /// Parse user-entered text into a positive canonical amount.
    ///
    /// Every thousands separator is dropped and the decimal separator becomes a
    /// `.`, so "2.000,00" parses as 2000. Anything that is not a plain decimal
    /// number after that, or that is not greater than zero, is rejected.
    pub fn parse(&self, text: &str) -> Result<Decimal, ParseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ParseError::Empty);
        }

        let canonical = self.canonicalize(trimmed);
        trace!("parsing '{}' as '{}'", text, canonical);

        let value = split_numeral(&canonical)
            .and_then(|n| n.to_decimal())
            .ok_or_else(|| ParseError::Invalid(trimmed.to_string()))?;

        ensure_positive(value)
    }

    /// Format a canonical value for display: grouped, no symbol, at most
    /// two fractional digits and no trailing fractional zeros.
    pub fn format_amount(&self, value: Decimal) -> String {
        self.render(value, 0, CURRENCY_PRECISION)
    }

    /// Format a canonical value as a currency amount with exactly two
    /// fractional digits and no symbol.
    pub fn format_currency(&self, value: Decimal) -> String {
        self.render(value, CURRENCY_PRECISION, CURRENCY_PRECISION)
    }

    /// As `format_currency`, for values that may not be numbers at all. NaN and
    /// infinities display as zero. Finite values beyond `Decimal`'s range are
    /// clamped to `Decimal::MAX` or `Decimal::MIN`.
    pub fn format_currency_f64(&self, value: f64) -> String {
        let value = match Decimal::from_f64(value) {
            Some(v) => v,
            None if !value.is_finite() => Decimal::ZERO,
            None if value > 0.0 => Decimal::MAX,
            None => Decimal::MIN,
        };
        self.format_currency(value)
    }

    /// Re-format text the user is still typing.
    ///
    /// Blank or non-numeric text comes back unchanged. Numeric text is
    /// re-grouped, keeping a trailing decimal separator and up to two typed
    /// fractional digits so "12," or "12,0" survive the round trip.
    pub fn format_input(&self, text: &str) -> String {
        let canonical = self.canonicalize(text.trim());
        let numeral = match split_numeral(&canonical) {
            Some(n) => n,
            None => return text.to_string(),
        };

        let int = numeral.int.trim_start_matches('0');
        let int = if int.is_empty() { "0" } else { int };
        let frac = numeral
            .frac
            .map(|f| &f[..f.len().min(CURRENCY_PRECISION as usize)]);

        self.assemble(numeral.negative, int, frac)
    }

    fn canonicalize(&self, text: &str) -> String {
        text.chars()
            .filter(|c| *c != self.thousands_separator)
            .map(|c| if c == self.decimal_separator { '.' } else { c })
            .collect()
    }

    fn render(&self, value: Decimal, min_frac: u32, max_frac: u32) -> String {
        let rounded =
            value.round_dp_with_strategy(max_frac, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let digits = rounded.abs().to_string();

        let (int, frac) = match digits.find('.') {
            Some(i) => (&digits[..i], &digits[i + 1..]),
            None => (digits.as_str(), ""),
        };

        let mut frac = frac.trim_end_matches('0').to_string();
        while (frac.len() as u32) < min_frac {
            frac.push('0');
        }

        if frac.is_empty() {
            self.assemble(negative, int, None)
        } else {
            self.assemble(negative, int, Some(&frac))
        }
    }

    fn assemble(&self, negative: bool, int: &str, frac: Option<&str>) -> String {
        let mut out = String::with_capacity(int.len() + int.len() / 3 + 4);
        if negative {
            out.push('-');
        }
        out.push_str(&self.group(int));
        if let Some(f) = frac {
            out.push(self.decimal_separator);
            out.push_str(f);
        }
        out
    }

    // `int` must be ASCII digits only
    fn group(&self, int: &str) -> String {
        if int.len() < 3 + self.min_grouping_digits as usize {
            return int.to_string();
        }

        let mut out = String::with_capacity(int.len() + int.len() / 3);
        for (i, c) in int.chars().enumerate() {
            if i > 0 && (int.len() - i) % 3 == 0 {
                out.push(self.thousands_separator);
            }
            out.push(c);
        }
        out
    }
}

/// Reject amounts that are zero or negative.
pub fn ensure_positive(value: Decimal) -> Result<Decimal, ParseError> {
    if value > Decimal::ZERO {
        Ok(value)
    } else {
        Err(ParseError::NotPositive(value))
    }
}

fn split_numeral(canonical: &str) -> Option<Numeral<'_>> {
    let (negative, body) = match canonical.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, canonical.strip_prefix('+').unwrap_or(canonical)),
    };

    let (int, frac) = match body.find('.') {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(int) || !frac.map_or(true, all_digits) {
        return None;
    }

    // A lone sign or separator is not a number yet
    if int.is_empty() && frac.map_or(true, str::is_empty) {
        return None;
    }

    Some(Numeral {
        negative,
        int,
        frac,
    })
}

impl Numeral<'_> {
    fn to_decimal(&self) -> Option<Decimal> {
        let int = if self.int.is_empty() { "0" } else { self.int };
        let literal = match self.frac {
            Some(f) if !f.is_empty() => format!("{}.{}", int, f),
            _ => int.to_string(),
        };

        let value = Decimal::from_str(&literal).ok()?;
        Some(if self.negative { -value } else { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_thousands_and_decimal() {
        let format = NumberFormat::default();
        assert_eq!(format.parse("2.000,00"), Ok(dec!(2000)));
        assert_eq!(format.parse("12,50"), Ok(dec!(12.50)));
        assert_eq!(format.parse(" 1.234.567,8 "), Ok(dec!(1234567.8)));
        assert_eq!(format.parse(",5"), Ok(dec!(0.5)));
        assert_eq!(format.parse("7,"), Ok(dec!(7)));
    }

    #[test]
    fn parse_not_positive() {
        let format = NumberFormat::default();
        assert_eq!(format.parse("0"), Err(ParseError::NotPositive(dec!(0))));
        assert_eq!(format.parse("0,00"), Err(ParseError::NotPositive(dec!(0))));
        assert_eq!(format.parse("-5"), Err(ParseError::NotPositive(dec!(-5))));
    }

    #[test]
    fn parse_empty() {
        let format = NumberFormat::default();
        assert_eq!(format.parse(""), Err(ParseError::Empty));
        assert_eq!(format.parse("   "), Err(ParseError::Empty));
    }

    #[test]
    fn parse_invalid() {
        let format = NumberFormat::default();
        for text in &["abc", "12a", "1,2,3", ",", ".", "-", "1 000", "1e5", "NaN"] {
            assert_eq!(
                format.parse(text),
                Err(ParseError::Invalid(text.to_string())),
                "{}",
                text
            );
        }
    }

    #[test]
    fn parse_custom_separators() {
        let format = NumberFormat::new(',', '.').unwrap();
        assert_eq!(format.parse("1,234.50"), Ok(dec!(1234.5)));
    }

    #[test]
    fn number_format_bad_separators() {
        assert_eq!(
            NumberFormat::new(',', ','),
            Err(FormatError::AmbiguousSeparators)
        );
        assert_eq!(
            NumberFormat::new('1', ','),
            Err(FormatError::InvalidSeparator('1'))
        );
        assert_eq!(
            NumberFormat::new('.', '-'),
            Err(FormatError::InvalidSeparator('-'))
        );
    }

    #[test]
    fn format_amount_grouping() {
        let format = NumberFormat::default();
        assert_eq!(format.format_amount(dec!(999)), "999");
        assert_eq!(format.format_amount(dec!(1000)), "1.000");
        assert_eq!(format.format_amount(dec!(1000.00)), "1.000");
        assert_eq!(format.format_amount(dec!(1234.5)), "1.234,5");
        assert_eq!(format.format_amount(dec!(1234567.891)), "1.234.567,89");
        assert_eq!(format.format_amount(dec!(0.005)), "0,01");
    }

    #[test]
    fn format_amount_min_grouping() {
        let format = NumberFormat::default().with_min_grouping_digits(2);
        assert_eq!(format.format_amount(dec!(1234)), "1234");
        assert_eq!(format.format_amount(dec!(12345)), "12.345");
    }

    #[test]
    fn format_currency_fixed_precision() {
        let format = NumberFormat::default();
        assert_eq!(format.format_currency(dec!(535)), "535,00");
        assert_eq!(format.format_currency(dec!(1234.5)), "1.234,50");
        assert_eq!(format.format_currency(dec!(-25)), "-25,00");
        assert_eq!(format.format_currency(dec!(-0.001)), "0,00");
    }

    #[test]
    fn format_currency_f64_fallback() {
        let format = NumberFormat::default();
        assert_eq!(format.format_currency_f64(f64::NAN), "0,00");
        assert_eq!(format.format_currency_f64(f64::INFINITY), "0,00");
        assert_eq!(format.format_currency_f64(12.5), "12,50");
    }

    #[test]
    fn format_currency_f64_out_of_range() {
        let format = NumberFormat::default();
        assert_eq!(
            format.format_currency_f64(1e30),
            "79.228.162.514.264.337.593.543.950.335,00"
        );
        assert_eq!(
            format.format_currency_f64(-1e30),
            "-79.228.162.514.264.337.593.543.950.335,00"
        );
    }

    #[test]
    fn format_input_passthrough() {
        let format = NumberFormat::default();
        assert_eq!(format.format_input(""), "");
        assert_eq!(format.format_input(","), ",");
        assert_eq!(format.format_input("abc"), "abc");
        assert_eq!(format.format_input("12x"), "12x");
    }

    #[test]
    fn format_input_in_progress() {
        let format = NumberFormat::default();
        assert_eq!(format.format_input("1000"), "1.000");
        assert_eq!(format.format_input("1.0000"), "10.000");
        assert_eq!(format.format_input("1234,"), "1.234,");
        assert_eq!(format.format_input("12,0"), "12,0");
        assert_eq!(format.format_input("12,345"), "12,34");
        assert_eq!(format.format_input("007"), "7");
        assert_eq!(format.format_input(",5"), "0,5");
    }

    #[test]
    fn parse_format_amount_round_trip() {
        let format = NumberFormat::default();
        for value in &[dec!(0.01), dec!(12.5), dec!(1000), dec!(1234567.89), dec!(2000.10)] {
            assert_eq!(format.parse(&format.format_amount(*value)), Ok(*value));
        }
    }
}
