//! JSON artifact writer.
//!
//! Output is fully determined by the inputs and the extraction date passed
//! in, so repeated runs over the same sources produce identical files.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::ExportError;
use crate::models::config::OutputConfig;
use crate::models::ffr::{FfrMeetingCost, FfrResult, VmGrant};
use crate::models::report::{Category, ExtractionResult};
use crate::models::summary::{AggregateSummary, VerificationReport};
use crate::models::Float;

/// Version stamped into `_metadata`.
pub const PARSER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const SUMMARY_FILE: &str = "wbp_summary.json";
pub const VERIFICATION_FILE: &str = "verification_report.json";

pub fn period_file_name(grant_period: u8) -> String {
    format!("wbp_gp{}.json", grant_period)
}

pub fn ffr_file_name(grant_period: u8) -> String {
    format!("ffr_gp{}.json", grant_period)
}

#[derive(Debug, Serialize)]
struct Metadata<'a> {
    source_file: &'a str,
    extraction_date: &'a str,
    parser_version: &'static str,
}

#[derive(Serialize)]
struct PeriodDocument<'a> {
    #[serde(flatten)]
    result: &'a ExtractionResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing_categories: Vec<Category>,
    #[serde(rename = "_metadata", skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata<'a>>,
}

#[derive(Serialize)]
struct FfrDocument<'a> {
    grant_period: u8,
    meetings_total: Float,
    vm_total: Float,
    meetings: &'a [FfrMeetingCost],
    vm_grants: &'a [VmGrant],
    #[serde(rename = "_metadata", skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata<'a>>,
}

/// Writes pipeline artifacts into one output directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    pretty: bool,
    include_metadata: bool,
    extraction_date: String,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>, extraction_date: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            pretty: true,
            include_metadata: true,
            extraction_date: extraction_date.into(),
        }
    }

    pub fn from_config(config: &OutputConfig, extraction_date: impl Into<String>) -> Self {
        Self::new(config.output_dir.clone(), extraction_date)
            .with_pretty(config.pretty)
            .with_metadata(config.include_metadata)
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn metadata<'a>(&'a self, source_file: &'a str) -> Option<Metadata<'a>> {
        self.include_metadata.then_some(Metadata {
            source_file,
            extraction_date: &self.extraction_date,
            parser_version: PARSER_VERSION,
        })
    }

    /// Render one grant period as JSON text.
    pub fn period_json(&self, result: &ExtractionResult) -> Result<String, ExportError> {
        let document = PeriodDocument {
            result,
            missing_categories: result.budget_summary.missing(),
            metadata: self.metadata(&result.source_file),
        };
        self.render(&document, &period_file_name(result.grant_period))
    }

    pub fn write_period(&self, result: &ExtractionResult) -> Result<PathBuf, ExportError> {
        let json = self.period_json(result)?;
        self.write(&period_file_name(result.grant_period), &json)
    }

    pub fn write_summary(&self, summary: &AggregateSummary) -> Result<PathBuf, ExportError> {
        let json = self.render(summary, SUMMARY_FILE)?;
        self.write(SUMMARY_FILE, &json)
    }

    pub fn write_verification(&self, report: &VerificationReport) -> Result<PathBuf, ExportError> {
        let json = self.render(report, VERIFICATION_FILE)?;
        self.write(VERIFICATION_FILE, &json)
    }

    pub fn write_ffr(&self, result: &FfrResult) -> Result<PathBuf, ExportError> {
        let document = FfrDocument {
            grant_period: result.grant_period,
            meetings_total: Float(result.meetings_total()),
            vm_total: Float(result.vm_total()),
            meetings: &result.meetings,
            vm_grants: &result.vm_grants,
            metadata: self.metadata(&result.source_file),
        };
        let name = ffr_file_name(result.grant_period);
        let json = self.render(&document, &name)?;
        self.write(&name, &json)
    }

    /// Serialize with a trailing newline.
    pub fn render<T: Serialize + ?Sized>(&self, value: &T, artifact: &str) -> Result<String, ExportError> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        let mut json = rendered.map_err(|source| ExportError::Serialize {
            artifact: artifact.to_string(),
            source,
        })?;
        json.push('\n');
        Ok(json)
    }

    fn write(&self, name: &str, contents: &str) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| ExportError::Write {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.output_dir.join(name);
        std::fs::write(&path, contents).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;

        info!("Wrote {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::extract::rules::ReportFormat;
    use crate::models::report::{BudgetSummary, LineAmount, MeetingRecord, MeetingType};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn sample() -> ExtractionResult {
        let mut result = ExtractionResult::empty(4, "WBP-CA19130-4_ID3001.txt");
        let mut budget = BudgetSummary::empty(ReportFormat::Merged);
        budget.set(Category::Meetings, LineAmount::Found(Decimal::new(15167475, 2)));
        budget.set(Category::TotalGrant, LineAmount::Found(Decimal::new(25792591, 2)));
        result.budget_summary = budget;
        result.meetings.push(MeetingRecord {
            meeting_number: 1,
            title: "Kick-off".to_string(),
            meeting_type: MeetingType::CoreGroup,
            start_date: NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2023, 11, 2).unwrap(),
            location: "Lisbon".to_string(),
            country: "Portugal".to_string(),
            itc_country: true,
            planned_cost: Decimal::new(1234567, 2),
            expected_participants: 20,
            expected_reimbursed: 15,
            grant_period: 4,
            description: None,
            expected_outputs: None,
        });
        result
    }

    #[test]
    fn test_period_json_round_trip() {
        let exporter = Exporter::new("unused", "2026-01-15");
        let result = sample();
        let value: Value = serde_json::from_str(&exporter.period_json(&result).unwrap()).unwrap();

        assert_eq!(value["grant_period"], json!(4));
        assert_eq!(value["budget_summary"]["meetings"], json!(151674.75));
        assert_eq!(value["budget_summary"]["total_grant"], json!(257925.91));
        assert_eq!(value["meetings"][0]["planned_cost"], json!(12345.67));
        assert_eq!(value["meetings"][0]["start_date"], json!("2023-11-01"));
        assert_eq!(value["meetings"][0]["meeting_type"], json!("Core Group"));
        assert_eq!(value["_metadata"]["source_file"], json!("WBP-CA19130-4_ID3001.txt"));
        assert_eq!(value["_metadata"]["extraction_date"], json!("2026-01-15"));
        assert!(value["missing_categories"].as_array().unwrap().contains(&json!("fsac")));
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn test_metadata_can_be_disabled() {
        let exporter = Exporter::new("unused", "2026-01-15").with_metadata(false);
        let json = exporter.period_json(&sample()).unwrap();
        assert!(!json.contains("_metadata"));
        assert!(json.ends_with("}\n"));
    }

    #[test]
    fn test_export_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let exporter = Exporter::new(dir.path(), "2026-01-15");
        let result = sample();
        let summary = aggregate(std::slice::from_ref(&result), &[4]);

        let period = exporter.write_period(&result).unwrap();
        let summary_path = exporter.write_summary(&summary).unwrap();
        let first = (
            std::fs::read(&period).unwrap(),
            std::fs::read(&summary_path).unwrap(),
        );

        exporter.write_period(&result).unwrap();
        exporter.write_summary(&summary).unwrap();
        let second = (
            std::fs::read(&period).unwrap(),
            std::fs::read(&summary_path).unwrap(),
        );

        assert_eq!(first, second);
        assert_eq!(period.file_name().unwrap(), "wbp_gp4.json");
    }

    #[test]
    fn test_summary_shape() {
        let exporter = Exporter::new("unused", "2026-01-15");
        let summary = aggregate(&[sample()], &[4, 5]);
        let value: Value = serde_json::from_str(&exporter.render(&summary, SUMMARY_FILE).unwrap()).unwrap();

        assert_eq!(value["total_meetings_planned"], json!(1));
        assert_eq!(value["budgets_by_gp"]["GP4"]["total_grant"], json!(257925.91));
        assert_eq!(value["totals"]["meetings"], json!(151674.75));
        assert_eq!(value["missing_grant_periods"], json!([5]));
    }
}
