use std::collections::BTreeSet;
use std::sync::OnceLock;

use docscan_core::StructuredFields;
use regex::{Match, Regex};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_amount_dollar,
    r"\$\s*(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?");
re!(re_amount_usd_suffix,
    r"(?i)\d+\.\d{2}\s*USD\b");
re!(re_amount_usd_prefix,
    r"(?i)\bUSD\s*\d+(?:\.\d+)?");
re!(re_amount_grouped,
    r"\b\d{1,3}(?:,\d{3})+(?:\.\d+)?\b");
re!(re_amount_decimal,
    r"\b(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2}\b");

re!(re_date_month_first,
    r"\b\d{1,2}[/-]\d{1,2}[/-](?:\d{4}|\d{2})\b");
re!(re_date_year_first,
    r"\b\d{4}[/-]\d{1,2}[/-]\d{1,2}\b");
re!(re_date_abbr_month,
    r"(?i)\b\d{1,2}\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)\s+(?:\d{4}|\d{2})\b");

re!(re_email,
    r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b");

re!(re_phone_dashed,
    r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b");
re!(re_phone_paren,
    r"\(\d{3}\)\s*\d{3}[-.]?\d{4}");

re!(re_invoice_labeled,
    r"(?i)\b(?:invoice|inv|receipt|rcp)[\s#:]*([A-Z0-9-]+)");
re!(re_invoice_hash,
    r"(?i)#\s*([A-Z0-9-]{3,})");

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Pull candidate amounts, dates, emails, phone numbers and invoice numbers
    /// out of recognized text. Pure; empty input gives empty sets.
    pub fn extract(text: &str) -> StructuredFields {
        if text.is_empty() {
            return StructuredFields::default();
        }
        StructuredFields {
            amounts: amounts(text),
            dates: matches(text, &[re_date_month_first(), re_date_year_first(), re_date_abbr_month()]),
            emails: matches(text, &[re_email()]),
            phone_numbers: matches(text, &[re_phone_dashed(), re_phone_paren()]),
            invoice_numbers: captures(text, &[re_invoice_labeled(), re_invoice_hash()]),
        }
    }
}

/// Currency-marked amounts, plus bare numbers with thousands separators or
/// two decimals that do not sit inside a marked one.
fn amounts(text: &str) -> BTreeSet<String> {
    let marked: Vec<Match> = [re_amount_dollar(), re_amount_usd_suffix(), re_amount_usd_prefix()]
        .iter()
        .flat_map(|re| re.find_iter(text))
        .collect();
    let bare = [re_amount_grouped(), re_amount_decimal()]
        .into_iter()
        .flat_map(|re| re.find_iter(text))
        .filter(|m| !marked.iter().any(|c| c.start() < m.end() && m.start() < c.end()));
    marked.iter().copied().chain(bare).map(|m| m.as_str().to_string()).collect()
}

/// Union of whole matches across patterns.
fn matches(text: &str, patterns: &[&Regex]) -> BTreeSet<String> {
    patterns
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| m.as_str().to_string()))
        .collect()
}

/// Union of the first capture group across patterns.
fn captures(text: &str, patterns: &[&Regex]) -> BTreeSet<String> {
    patterns
        .iter()
        .flat_map(|re| re.captures_iter(text).filter_map(|c| Some(c.get(1)?.as_str().to_string())))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
