//! Row normalization
//!
//! Maps one raw [`CsvRecord`] to a [`NewProduct`] or a [`RowRejection`]. Pure;
//! no I/O and no state. A rejected row is skipped by the caller and never
//! fails the batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use sqlx::types::BigDecimal;
use std::str::FromStr;
use std::sync::LazyLock;

use super::record::CsvRecord;
use crate::models::NewProduct;

pub const NAME_FIELD: &str = "name";
pub const PRICE_FIELD: &str = "price";
pub const EXPIRATION_FIELD: &str = "expiration";

const NAME_POSITION: usize = 0;
const PRICE_POSITION: usize = 1;
const EXPIRATION_POSITION: usize = 2;

/// Shortest accepted product name after cleaning
pub const MIN_NAME_LEN: usize = 2;

/// Largest value a NUMERIC(10,2) column holds
const MAX_PRICE: f64 = 99_999_999.99;

const NAME_TAG_MARKER: &str = "#(";
const CURRENCY_SYMBOLS: [char; 3] = ['$', '£', '€'];

static MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("month/day/year pattern is valid")
});

/// Date layouts tried when the strict month/day/year form does not match
const FALLBACK_DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y%m%d",
];

const FALLBACK_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Why a row was skipped
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowRejection {
    #[error("missing {0} field")]
    MissingField(&'static str),

    #[error("name '{0}' is shorter than 2 characters after cleaning")]
    NameTooShort(String),

    #[error("price '{0}' is not a positive number")]
    InvalidPrice(String),

    #[error("price '{0}' is outside the storable range")]
    PriceOutOfRange(String),

    #[error("expiration '{0}' is not a recognizable date")]
    InvalidDate(String),
}

/// Normalize one record into a product tuple
pub fn normalize_record(record: &CsvRecord) -> Result<NewProduct, RowRejection> {
    let raw_name = record
        .get(NAME_FIELD, NAME_POSITION)
        .ok_or(RowRejection::MissingField(NAME_FIELD))?;
    let raw_price = record
        .get(PRICE_FIELD, PRICE_POSITION)
        .ok_or(RowRejection::MissingField(PRICE_FIELD))?;
    let raw_expiration = record
        .get(EXPIRATION_FIELD, EXPIRATION_POSITION)
        .ok_or(RowRejection::MissingField(EXPIRATION_FIELD))?;

    let name = clean_name(raw_name)?;
    let price = parse_price(raw_price)?;
    let expiration = parse_expiration(raw_expiration)
        .ok_or_else(|| RowRejection::InvalidDate(raw_expiration.to_string()))?;

    Ok(NewProduct {
        name,
        price,
        expiration,
    })
}

/// Drop a trailing `#(...)` tag, keep printable ASCII, trim
///
/// A name that starts with `#(` has no leading text to keep and is left whole.
pub fn clean_name(raw: &str) -> Result<String, RowRejection> {
    let untagged = match raw.find(NAME_TAG_MARKER) {
        Some(index) if index > 0 => &raw[..index],
        _ => raw,
    };

    let cleaned: String = untagged
        .chars()
        .filter(|c| (' '..='~').contains(c))
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.len() < MIN_NAME_LEN {
        return Err(RowRejection::NameTooShort(cleaned.to_string()));
    }
    Ok(cleaned.to_string())
}

/// Parse a price, treating a comma as the decimal separator
pub fn parse_price(raw: &str) -> Result<BigDecimal, RowRejection> {
    let stripped: String = raw
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && !c.is_whitespace())
        .collect();
    let normalized = stripped.replacen(',', ".", 1);

    let value: f64 = normalized
        .parse()
        .map_err(|_| RowRejection::InvalidPrice(raw.to_string()))?;
    if value.is_nan() || value <= 0.0 {
        return Err(RowRejection::InvalidPrice(raw.to_string()));
    }

    let formatted = format!("{:.2}", value);
    let rounded: f64 = formatted
        .parse()
        .map_err(|_| RowRejection::InvalidPrice(raw.to_string()))?;
    if rounded <= 0.0 || rounded > MAX_PRICE {
        return Err(RowRejection::PriceOutOfRange(raw.to_string()));
    }

    BigDecimal::from_str(&formatted).map_err(|_| RowRejection::InvalidPrice(raw.to_string()))
}

/// Strict `M/D/YYYY` first, then a set of common layouts
pub fn parse_expiration(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    parse_month_day_year(raw).or_else(|| parse_general_date(raw))
}

fn parse_month_day_year(raw: &str) -> Option<NaiveDate> {
    let captures = MONTH_DAY_YEAR.captures(raw)?;
    let month: u32 = captures[1].parse().ok()?;
    let day: u32 = captures[2].parse().ok()?;
    let year: i32 = captures[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_general_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.date_naive());
    }

    FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            FALLBACK_DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(values: &[&str]) -> CsvRecord {
        CsvRecord::new(values.iter().map(|v| v.to_string()).collect())
    }

    fn decimal(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_clean_name_strips_tag() {
        assert_eq!(clean_name("Widget #(lot 42)").unwrap(), "Widget");
        assert_eq!(clean_name("  Gadget Pro  ").unwrap(), "Gadget Pro");
    }

    #[test]
    fn test_clean_name_drops_non_printable() {
        assert_eq!(clean_name("Caf\u{e9}\tLatte\u{7f}").unwrap(), "CafLatte");
        assert_eq!(clean_name("Wid\u{fffd}get").unwrap(), "Widget");
    }

    #[test]
    fn test_clean_name_rejects_short() {
        assert!(matches!(clean_name("A"), Err(RowRejection::NameTooShort(_))));
        assert!(matches!(clean_name(" \u{e9}x "), Err(RowRejection::NameTooShort(_))));
        assert!(matches!(clean_name(" #(tag)"), Err(RowRejection::NameTooShort(_))));
    }

    #[test]
    fn test_clean_name_keeps_leading_tag() {
        assert_eq!(clean_name("#(lot 42) Widget").unwrap(), "#(lot 42) Widget");
        assert_eq!(clean_name("#(only a tag)").unwrap(), "#(only a tag)");
    }

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price("12,50").unwrap(), decimal("12.50"));
        assert_eq!(parse_price("$ 9.99").unwrap(), decimal("9.99"));
        assert_eq!(parse_price("£3").unwrap(), decimal("3.00"));
        assert_eq!(parse_price("4,5 €").unwrap(), decimal("4.50"));
        assert_eq!(parse_price("1.999").unwrap(), decimal("2.00"));
    }

    #[test]
    fn test_parse_price_rejections() {
        for bad in ["-5", "0", "abc", "", "NaN", "1.234,56"] {
            assert!(
                matches!(parse_price(bad), Err(RowRejection::InvalidPrice(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(matches!(parse_price("0.001"), Err(RowRejection::PriceOutOfRange(_))));
        assert!(matches!(parse_price("100000000"), Err(RowRejection::PriceOutOfRange(_))));
        assert!(matches!(parse_price("inf"), Err(RowRejection::PriceOutOfRange(_))));
    }

    #[test]
    fn test_parse_expiration_month_first() {
        assert_eq!(
            parse_expiration("3/4/2024"),
            NaiveDate::from_ymd_opt(2024, 3, 4)
        );
        assert_eq!(
            parse_expiration("12/31/2025"),
            NaiveDate::from_ymd_opt(2025, 12, 31)
        );
        assert_eq!(parse_expiration("13/1/2024"), None);
        assert_eq!(parse_expiration("2/30/2024"), None);
    }

    #[test]
    fn test_parse_expiration_fallbacks() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 4);
        assert_eq!(parse_expiration("2024-03-04"), expected);
        assert_eq!(parse_expiration("2024/03/04"), expected);
        assert_eq!(parse_expiration("March 4, 2024"), expected);
        assert_eq!(parse_expiration("4 Mar 2024"), expected);
        assert_eq!(parse_expiration("2024-03-04T10:00:00Z"), expected);
        assert_eq!(parse_expiration("2024-03-04T10:00:00"), expected);
        assert_eq!(parse_expiration("soon"), None);
    }

    #[test]
    fn test_normalize_record() {
        let product =
            normalize_record(&record(&["Widget #(lot 42)", "12,50", "3/4/2024"])).unwrap();
        assert_eq!(product.name, "Widget");
        assert_eq!(product.price, decimal("12.50"));
        assert_eq!(product.expiration, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[test]
    fn test_normalize_record_rejections() {
        assert_eq!(
            normalize_record(&record(&["Widget", "9.99"])),
            Err(RowRejection::MissingField(EXPIRATION_FIELD))
        );
        assert!(matches!(
            normalize_record(&record(&["Widget", "-5", "3/4/2024"])),
            Err(RowRejection::InvalidPrice(_))
        ));
        assert!(matches!(
            normalize_record(&record(&["Widget", "5", "tomorrow"])),
            Err(RowRejection::InvalidDate(_))
        ));
    }
}
