//! Date extraction for report text (`DD/MM/YYYY` and ISO `YYYY-MM-DD`).

use chrono::NaiveDate;
use tracing::trace;

use super::patterns::{DATE_DMY, DATE_ISO};
use super::{ExtractionMatch, FieldExtractor};

/// Date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for caps in DATE_DMY.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let year: i32 = caps[3].parse().unwrap_or(0);

            if let (Some(date), Some(m)) = (NaiveDate::from_ymd_opt(year, month, day), caps.get(0)) {
                results.push(ExtractionMatch::new(date, m.as_str()).with_position(m.start(), m.end()));
            }
        }

        for caps in DATE_ISO.captures_iter(text) {
            let year: i32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let day: u32 = caps[3].parse().unwrap_or(0);

            if let (Some(date), Some(m)) = (NaiveDate::from_ymd_opt(year, month, day), caps.get(0)) {
                results.push(ExtractionMatch::new(date, m.as_str()).with_position(m.start(), m.end()));
            }
        }

        // Report order, not pattern order.
        results.sort_by_key(|m| m.position.map(|(start, _)| start).unwrap_or(usize::MAX));
        results
    }
}

/// Parse the first valid date in `text`.
///
/// Returns `None` when no `DD/MM/YYYY` or `YYYY-MM-DD` token forms a real
/// calendar date; callers treat that as an incomplete record.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let date = DateExtractor::new().extract(text).map(|m| m.value);
    if date.is_none() {
        trace!("No date found in {:?}", text);
    }
    date
}
