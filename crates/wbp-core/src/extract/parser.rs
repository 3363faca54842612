//! Work and budget plan parser.

use std::ops::Range;
use std::time::Instant;

use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::models::report::{BudgetSummary, ExtractionResult, LineAmount, MeetingRecord, TrainingSchoolRecord};
use crate::source::SourceDocument;

use super::records::{parse_meeting_block, parse_training_block, BlockRejection, ParsedBlock};
use super::rules::patterns::{MEETING_BLOCK, TRAINING_BLOCK};
use super::rules::{locate_section, try_parse_amount, ReportFormat, Section, SectionSpans};
use super::ReportParser;

/// Rule-based parser for work and budget plan text.
#[derive(Debug, Clone, Default)]
pub struct WbpParser {
    spans: SectionSpans,
}

impl WbpParser {
    /// Create a parser with default section spans.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback section lengths.
    pub fn with_section_spans(mut self, spans: SectionSpans) -> Self {
        self.spans = spans;
        self
    }

    /// Read every budget line of `format` from the budget section.
    fn extract_budget(&self, section: &str, format: ReportFormat, warnings: &mut Vec<String>) -> BudgetSummary {
        let mut summary = BudgetSummary::empty(format);

        for line in format.budget_lines() {
            let Some(caps) = line.regex.captures(section) else {
                debug!("Budget line {} not found", line.category.key());
                continue;
            };

            let amount = match try_parse_amount(&caps[1]) {
                Some(amount) => amount,
                None => {
                    let warning = format!(
                        "Malformed amount {:?} for {}, using 0.00",
                        &caps[1],
                        line.category.key()
                    );
                    warn!("{}", warning);
                    warnings.push(warning);
                    Decimal::new(0, 2)
                }
            };
            summary.set(line.category, LineAmount::Found(amount));
        }

        summary
    }

    fn extract_meetings(&self, section: &str, grant_period: u8, warnings: &mut Vec<String>) -> Vec<MeetingRecord> {
        collect_blocks(section, &MEETING_BLOCK, "meeting", grant_period, warnings, parse_meeting_block)
    }

    fn extract_training_schools(
        &self,
        section: &str,
        grant_period: u8,
        warnings: &mut Vec<String>,
    ) -> Vec<TrainingSchoolRecord> {
        collect_blocks(section, &TRAINING_BLOCK, "training school", grant_period, warnings, parse_training_block)
    }

    fn locate(&self, text: &str, section: Section, from: usize) -> Option<Range<usize>> {
        locate_section(text, section, from, &self.spans)
    }
}

impl ReportParser for WbpParser {
    type Output = ExtractionResult;

    fn parse(&self, document: &SourceDocument) -> ExtractionResult {
        let start = Instant::now();
        let text = document.text();
        let grant_period = document.grant_period();
        let format = ReportFormat::for_grant_period(grant_period);

        info!("Parsing GP{} plan {} ({:?} template)", grant_period, document.file_name(), format);

        let mut result = ExtractionResult::empty(grant_period, document.file_name());
        let mut warnings = Vec::new();

        let budget = self.locate(text, Section::Budget, 0).unwrap_or(0..text.len());
        result.budget_summary = self.extract_budget(&text[budget.clone()], format, &mut warnings);
        for category in result.budget_summary.missing() {
            warnings.push(format!("Budget line {} not found", category.key()));
        }

        let mut cursor = budget.end;

        match self.locate(text, Section::Meetings, cursor) {
            Some(range) => {
                cursor = range.end;
                result.meetings = self.extract_meetings(&text[range], grant_period, &mut warnings);
            }
            None => warnings.push("Meetings section not found".to_string()),
        }

        match self.locate(text, Section::TrainingSchools, cursor) {
            Some(range) => {
                result.training_schools =
                    self.extract_training_schools(&text[range], grant_period, &mut warnings);
            }
            None => debug!("GP{} has no training schools section", grant_period),
        }

        warnings.extend(result.validate());
        result.warnings = warnings;

        info!(
            "GP{}: {} meetings, {} training schools, total grant {} ({} warnings, {} ms)",
            grant_period,
            result.meetings.len(),
            result.training_schools.len(),
            result.budget_summary.total_grant(),
            result.warnings.len(),
            start.elapsed().as_millis()
        );

        result
    }
}

/// Split `section` on `header` and parse each block. Blocks without a start
/// date are dropped; kept records are numbered 1..n in order of discovery.
fn collect_blocks<T>(
    section: &str,
    header: &Regex,
    kind: &str,
    grant_period: u8,
    warnings: &mut Vec<String>,
    parse: fn(u32, &str, u8) -> Result<ParsedBlock<T>, BlockRejection>,
) -> Vec<T> {
    let mut records = Vec::new();

    for block in header.split(section).skip(1) {
        let number = records.len() as u32 + 1;
        match parse(number, block, grant_period) {
            Ok(parsed) => {
                warnings.extend(parsed.warnings);
                records.push(parsed.record);
            }
            Err(BlockRejection::MissingStartDate) => {
                let title = block.lines().next().unwrap_or("").trim();
                let warning = format!("Skipped {} block {:?}: no start date", kind, title);
                warn!("GP{}: {}", grant_period, warning);
                warnings.push(warning);
            }
        }
    }

    records
}
