use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Candidate values pulled out of recognized text. Each set is deduplicated;
/// iteration order is lexical and carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredFields {
    pub amounts: BTreeSet<String>,
    pub dates: BTreeSet<String>,
    pub emails: BTreeSet<String>,
    pub phone_numbers: BTreeSet<String>,
    pub invoice_numbers: BTreeSet<String>,
}

impl StructuredFields {
    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    pub fn total_len(&self) -> usize {
        self.amounts.len()
            + self.dates.len()
            + self.emails.len()
            + self.phone_numbers.len()
            + self.invoice_numbers.len()
    }

    /// Numeric value of every amount that parses, with currency markers and
    /// thousands separators removed.
    pub fn amount_values(&self) -> Vec<Decimal> {
        self.amounts
            .iter()
            .filter_map(|a| parse_amount(a))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Calendar dates for every date string that names a real day.
    pub fn parsed_dates(&self) -> Vec<NaiveDate> {
        self.dates
            .iter()
            .filter_map(|d| parse_date(d))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// `$1,234.56`, `12.00 USD`, `USD 7` → decimal value.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let clean: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let clean = clean.trim_end_matches('.');
    if clean.is_empty() {
        return None;
    }
    Decimal::from_str(clean).ok()
}

/// Accepts `MM/DD/YYYY`, `MM-DD-YY`, `YYYY/MM/DD`, `YYYY-MM-DD` and `DD Mon YYYY`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let parts: Vec<&str> = s.split(['/', '-']).collect();
    if parts.len() == 3 {
        let nums: Vec<i32> = parts.iter().map(|p| p.parse().ok()).collect::<Option<_>>()?;
        return if parts[0].len() == 4 {
            NaiveDate::from_ymd_opt(nums[0], nums[1] as u32, nums[2] as u32)
        } else {
            // US ordering.
            NaiveDate::from_ymd_opt(expand_year(nums[2]), nums[0] as u32, nums[1] as u32)
        };
    }

    let words: Vec<&str> = s.split_whitespace().collect();
    if let [day, month, year] = words.as_slice() {
        let day: u32 = day.parse().ok()?;
        let month = abbr_month_to_num(month)?;
        let year: i32 = year.parse().ok()?;
        return NaiveDate::from_ymd_opt(expand_year(year), month, day);
    }
    None
}

fn expand_year(y: i32) -> i32 {
    if y < 100 { 2000 + y } else { y }
}

fn abbr_month_to_num(name: &str) -> Option<u32> {
    match name.get(..3)?.to_lowercase().as_str() {
        "jan" => Some(1), "feb" => Some(2), "mar" => Some(3), "apr" => Some(4),
        "may" => Some(5), "jun" => Some(6), "jul" => Some(7), "aug" => Some(8),
        "sep" => Some(9), "oct" => Some(10), "nov" => Some(11), "dec" => Some(12),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_fields() {
        let f = StructuredFields::default();
        assert!(f.is_empty());
        assert_eq!(f.total_len(), 0);
    }

    #[test]
    fn amount_values_strip_markers_and_dedup() {
        let f = StructuredFields {
            amounts: set(&["$123.45", "123.45 USD", "USD 7", "1,234.50", "$"]),
            ..Default::default()
        };
        assert_eq!(
            f.amount_values(),
            vec![
                Decimal::from_str("7").unwrap(),
                Decimal::from_str("123.45").unwrap(),
                Decimal::from_str("1234.50").unwrap(),
            ]
        );
    }

    #[test]
    fn parse_amount_trailing_dot() {
        assert_eq!(parse_amount("$12."), Some(Decimal::from(12)));
        assert_eq!(parse_amount("USD"), None);
    }

    #[test]
    fn parsed_dates_all_formats() {
        let f = StructuredFields {
            dates: set(&["03/15/2024", "2024-03-15", "15 Mar 2024", "12-31-23", "13/45/2024"]),
            ..Default::default()
        };
        assert_eq!(
            f.parsed_dates(),
            vec![
                NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            ]
        );
    }

    #[test]
    fn parse_date_month_name_case_insensitive() {
        assert_eq!(parse_date("1 JAN 2025"), NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(parse_date("1 Foo 2025"), None);
    }
}
