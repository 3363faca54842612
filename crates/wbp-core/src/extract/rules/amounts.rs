//! Amount normalization for EUR figures in converted report text.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::trace;

use super::patterns::{AMOUNT_STRICT, AMOUNT_TOKEN};
use super::{ExtractionMatch, FieldExtractor};

/// Amount field extractor.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        AMOUNT_TOKEN
            .find_iter(text)
            .filter_map(|m| {
                try_parse_amount(m.as_str()).map(|amount| {
                    ExtractionMatch::new(amount, m.as_str()).with_position(m.start(), m.end())
                })
            })
            .collect()
    }
}

/// Parse an amount such as `151,674.75`, `151 674.75` or `1000`.
///
/// Thousands may be grouped with spaces (including non-breaking ones) or
/// commas; the decimal separator is a period followed by exactly two digits.
/// The result always carries two fractional digits.
pub fn try_parse_amount(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if !AMOUNT_STRICT.is_match(trimmed) {
        return None;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut amount = Decimal::from_str(&cleaned).ok()?;
    amount.rescale(2);
    Some(amount)
}

/// Parse an amount, yielding `0.00` for anything malformed.
pub fn parse_amount(s: &str) -> Decimal {
    try_parse_amount(s).unwrap_or_else(|| {
        trace!("Unparseable amount {:?}, using 0.00", s);
        Decimal::new(0, 2)
    })
}

/// Format an amount with comma thousands separators (e.g. `12,345.67`).
pub fn format_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.round_dp(2));
    let (sign, unsigned) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };

    let Some((integer_part, decimal_part)) = unsigned.split_once('.') else {
        return s;
    };

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::with_capacity(chars.len() + chars.len() / 3);

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }

    format!("{}{}.{}", sign, formatted, decimal_part)
}
