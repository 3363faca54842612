//! Final financial report parser: meeting expenditure and virtual mobility
//! grants.

use regex::Captures;
use tracing::{debug, info, warn};

use crate::models::ffr::{FfrMeetingCost, FfrResult, VmGrant};
use crate::source::SourceDocument;

use super::rules::patterns::{
    FFR_MEETINGS_END, FFR_MEETINGS_START, FFR_MEETING_ROW, FFR_PAGE_FOOTER, FFR_VM_ROW, FFR_VM_SECTION,
    FFR_YRI_ROW,
};
use super::rules::sections::floor_char_boundary;
use super::rules::{parse_amount, parse_date};
use super::ReportParser;

/// Parser for final financial report text.
#[derive(Debug, Clone)]
pub struct FfrParser {
    /// Length of the meetings overview when no end marker follows it.
    overview_span: usize,
}

impl Default for FfrParser {
    fn default() -> Self {
        Self { overview_span: 3_000 }
    }
}

impl FfrParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overview_span(mut self, span: usize) -> Self {
        self.overview_span = span;
        self
    }

    /// Rows of the meetings expenditure overview table.
    fn meeting_costs(&self, text: &str, grant_period: u8) -> Vec<FfrMeetingCost> {
        let Some(start) = FFR_MEETINGS_START.find(text) else {
            debug!("GP{}: no meetings expenditure section", grant_period);
            return Vec::new();
        };

        let end = FFR_MEETINGS_END
            .find(&text[start.end()..])
            .map(|m| start.end() + m.start())
            .unwrap_or_else(|| floor_char_boundary(text, (start.start() + self.overview_span).min(text.len())));
        let overview = &text[start.start()..end.max(start.end())];

        overview
            .lines()
            .filter_map(|line| FFR_MEETING_ROW.captures(line.trim()))
            .filter_map(|caps| {
                Some(FfrMeetingCost {
                    meeting_number: caps[1].parse().ok()?,
                    location: caps[2].trim().to_string(),
                    country: caps[3].trim().to_string(),
                    meeting_types: caps[4].trim().trim_end_matches(',').trim().to_string(),
                    actuals: parse_amount(&caps[5]),
                    accruals: parse_amount(&caps[6]),
                    total: parse_amount(&caps[7]),
                    grant_period,
                })
            })
            .collect()
    }

    /// Entries of the "List of paid Virtual Mobility" table.
    fn vm_grants(&self, text: &str, grant_period: u8, warnings: &mut Vec<String>) -> Vec<VmGrant> {
        let Some(section) = FFR_VM_SECTION.captures(text).and_then(|caps| caps.get(1)) else {
            debug!("GP{}: no virtual mobility section", grant_period);
            return Vec::new();
        };

        let mut grants = Vec::new();
        for line in section.as_str().lines().map(str::trim) {
            if line.is_empty() || FFR_PAGE_FOOTER.is_match(line) {
                continue;
            }

            // Rows with a YES/NO young researcher column come first; the
            // plain VM layout would otherwise swallow them.
            let grant = if let Some(caps) = FFR_YRI_ROW.captures(line) {
                vm_grant(&caps, grant_period, caps[3].eq_ignore_ascii_case("YES"), 4)
            } else if let Some(caps) = FFR_VM_ROW.captures(line) {
                vm_grant(&caps, grant_period, false, 3)
            } else {
                continue;
            };

            match grant {
                Some(grant) => grants.push(grant),
                None => {
                    let warning = format!("Skipped virtual mobility row with invalid dates: {:?}", line);
                    warn!("GP{}: {}", grant_period, warning);
                    warnings.push(warning);
                }
            }
        }

        grants
    }
}

/// Build a grant from a row match whose country code sits in group
/// `country`, followed by start date, end date and amount.
fn vm_grant(caps: &Captures<'_>, grant_period: u8, yri: bool, country: usize) -> Option<VmGrant> {
    let entry_number: u32 = caps[1].parse().ok()?;
    Some(VmGrant {
        id: format!("GP{}_VM{}", grant_period, entry_number),
        grant_period,
        entry_number,
        name: caps[2].trim().to_string(),
        yri,
        country: caps[country].to_string(),
        start_date: parse_date(&caps[country + 1])?,
        end_date: parse_date(&caps[country + 2])?,
        amount: parse_amount(&caps[country + 3]),
    })
}

impl ReportParser for FfrParser {
    type Output = FfrResult;

    fn parse(&self, document: &SourceDocument) -> FfrResult {
        let text = document.text();
        let grant_period = document.grant_period();
        let mut warnings = Vec::new();

        let meetings = self.meeting_costs(text, grant_period);
        let vm_grants = self.vm_grants(text, grant_period, &mut warnings);

        let result = FfrResult {
            grant_period,
            meetings,
            vm_grants,
            warnings,
            source_file: document.file_name().to_string(),
        };

        info!(
            "GP{} FFR: {} meetings ({} EUR), {} virtual mobility grants ({} EUR)",
            grant_period,
            result.meetings.len(),
            result.meetings_total(),
            result.vm_grants.len(),
            result.vm_total()
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DocumentKind;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn parse(gp: u8, text: &str) -> FfrResult {
        let doc = SourceDocument::new(gp, DocumentKind::Ffr, text, "FFR.txt").unwrap();
        FfrParser::new().parse(&doc)
    }

    #[test]
    fn test_meetings_overview() {
        let text = "\
Meetings Expenditure
No Location / Country Meeting type Actuals Accruals Total
1 Berlin / Germany Workshop/Conference, Working Group, 3 927.98 0.00 3 927.98
2 Istanbul / Türkiye Management Committee, 12,100.50 250.00 12,350.50
Meeting 1
3 Not / Counted Core Group, 1.00 0.00 1.00
";
        let result = parse(2, text);
        assert_eq!(result.meetings.len(), 2);

        let berlin = &result.meetings[0];
        assert_eq!(berlin.location, "Berlin");
        assert_eq!(berlin.country, "Germany");
        assert_eq!(berlin.meeting_types, "Workshop/Conference, Working Group");
        assert_eq!(berlin.total, Decimal::new(392798, 2));

        assert_eq!(result.meetings[1].country, "Türkiye");
        assert_eq!(result.meetings_total(), Decimal::new(1627848, 2));
    }

    #[test]
    fn test_vm_grants_both_layouts() {
        let text = "\
List of paid Virtual Mobility
No Grantee name Type Country Start End Amount
1 Alessandra Tanda VM IT 15/07/2022 15/09/2022 1 310.00
2 Maria Iannario NO Explainable AI IT 01/02/2024 01/07/2024 1 500.00
3 Paweł Kowalski YES Credit scoring PL 01/03/2024 01/06/2024 1 000.00
Page 4 of 20
Sub-total actual amounts 3 810.00
";
        let result = parse(5, text);
        assert_eq!(result.vm_grants.len(), 3);

        let first = &result.vm_grants[0];
        assert_eq!(first.id, "GP5_VM1");
        assert_eq!(first.name, "Alessandra Tanda");
        assert!(!first.yri);
        assert_eq!(first.start_date, NaiveDate::from_ymd_opt(2022, 7, 15).unwrap());
        assert_eq!(first.amount, Decimal::new(131000, 2));

        assert_eq!(result.vm_grants[1].name, "Maria Iannario");
        assert!(!result.vm_grants[1].yri);
        assert!(result.vm_grants[2].yri);
        assert_eq!(result.vm_grants[2].country, "PL");
        assert_eq!(result.vm_total(), Decimal::new(381000, 2));
    }

    #[test]
    fn test_report_without_sections() {
        let result = parse(1, "Nothing to see");
        assert!(result.meetings.is_empty());
        assert!(result.vm_grants.is_empty());
    }
}
