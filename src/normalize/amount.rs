use crate::models::movement::round_amount;
use rust_decimal::Decimal;
use rust_decimal::prelude::dec;
use std::str::FromStr;

/// Largest magnitude accepted for one amount cell. Keeps group and report
/// totals far from `Decimal`'s range.
const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// Parse a spreadsheet amount cell into an exact two-decimal value.
///
/// Blank cells and `nan` read as zero. Separators are resolved with the
/// heuristics upstream spreadsheets rely on:
/// - one `,` with one or more `.` is European (`1.234.567,89`);
/// - one `.` with one or more `,` is American (`1,234,567.89`);
/// - anything else treats every `,` as a decimal point.
///
/// Returns `None` when the cleaned text is still not a number, or when its
/// magnitude exceeds one quadrillion.
pub fn try_parse_amount(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Some(Decimal::ZERO);
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    let dots = cleaned.matches('.').count();
    let commas = cleaned.matches(',').count();

    let canonical = if commas == 1 && dots >= 1 {
        cleaned.replace('.', "").replace(',', ".")
    } else if dots == 1 && commas >= 1 {
        cleaned.replace(',', "")
    } else {
        cleaned.replace(',', ".")
    };

    Decimal::from_str(&canonical)
        .ok()
        .map(round_amount)
        .filter(|value| value.abs() <= MAX_AMOUNT)
}

/// Like [`try_parse_amount`], coercing unreadable input to zero.
pub fn parse_amount(text: &str) -> Decimal {
    try_parse_amount(text).unwrap_or(Decimal::ZERO)
}

/// Render an amount the way carry-forward files store it: two decimals,
/// comma as decimal separator, no grouping.
pub fn format_amount(value: Decimal) -> String {
    let mut rounded = round_amount(value);
    rounded.rescale(2);
    rounded.to_string().replace('.', ",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::prelude::dec;

    #[test]
    fn test_blank_and_nan() {
        assert_eq!(parse_amount(""), dec!(0.00));
        assert_eq!(parse_amount("   "), dec!(0.00));
        assert_eq!(parse_amount("nan"), dec!(0.00));
        assert_eq!(parse_amount("NaN"), dec!(0.00));
    }

    #[test]
    fn test_out_of_range_is_unreadable() {
        assert_eq!(try_parse_amount("79228162514264337593543950335"), None);
        assert_eq!(try_parse_amount("-79.228.162.514.264.337.593.543.950.335,00"), None);
        assert_eq!(try_parse_amount("1000000000000000,01"), None);
        assert_eq!(parse_amount("79228162514264337593543950335"), dec!(0.00));
        assert_eq!(
            try_parse_amount("1.000.000.000.000.000,00"),
            Some(dec!(1000000000000000))
        );
    }

    #[test]
    fn test_european_format() {
        assert_eq!(parse_amount("1.234.567,89"), dec!(1234567.89));
        assert_eq!(parse_amount("Bs. 3.500,00"), dec!(3500.00));
        assert_eq!(parse_amount("-1.000,5"), dec!(-1000.50));
    }

    #[test]
    fn test_american_format() {
        assert_eq!(parse_amount("1,234,567.89"), dec!(1234567.89));
        assert_eq!(parse_amount("$1,212,000.10"), dec!(1212000.10));
    }

    #[test]
    fn test_single_of_each_is_european() {
        // One comma and one dot: the European rule is checked first.
        assert_eq!(parse_amount("1,234.56"), dec!(1.23));
        assert_eq!(parse_amount("1.234,56"), dec!(1234.56));
    }

    #[test]
    fn test_plain_and_comma_decimal() {
        assert_eq!(parse_amount("100"), dec!(100.00));
        assert_eq!(parse_amount("100.25"), dec!(100.25));
        assert_eq!(parse_amount("100,25"), dec!(100.25));
        assert_eq!(parse_amount("-0,5"), dec!(-0.50));
    }

    #[test]
    fn test_rounds_once_half_away_from_zero() {
        assert_eq!(parse_amount("2,345"), dec!(2.35));
        assert_eq!(parse_amount("-2.345"), dec!(-2.35));
        assert_eq!(parse_amount("0.004"), dec!(0.00));
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(try_parse_amount("abc"), None);
        assert_eq!(try_parse_amount("1.2.3"), None);
        assert_eq!(try_parse_amount("12-"), None);
        assert_eq!(parse_amount("1.2.3"), dec!(0.00));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(1234.5)), "1234,50");
        assert_eq!(format_amount(dec!(-0.01)), "-0,01");
        assert_eq!(format_amount(dec!(0)), "0,00");
    }

    proptest! {
        #[test]
        fn prop_format_then_parse_is_identity(cents in -10_000_000_000i64..10_000_000_000i64) {
            let value = Decimal::new(cents, 2);
            prop_assert_eq!(parse_amount(&format_amount(value)), value);
        }
    }
}
