//! Per-grant-period extraction result: budget summary, meetings and
//! training schools.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::Float;
use crate::extract::rules::ReportFormat;

/// Budget lines of a work and budget plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// (1) Meetings.
    Meetings,
    /// (2) Training Schools.
    TrainingSchools,
    /// (3) Short-Term Scientific Missions, grant periods 1-3.
    Stsm,
    /// (4) ITC Conference Grants, grant periods 1-3.
    ItcGrants,
    /// (3) Mobility (STSM and virtual mobility), grant periods 4-5.
    Mobility,
    /// (4) Conference Presentations, grant periods 4-5.
    ConferencePresentations,
    /// (5) Dissemination and Communication Products.
    Dissemination,
    /// (6) Other Expenses Related to Scientific Activities.
    Oersa,
    /// B. Total Science Expenditure.
    TotalScience,
    /// C. Financial and Scientific Administration and Coordination.
    Fsac,
    /// Total Grant (B+C).
    TotalGrant,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Meetings,
        Category::TrainingSchools,
        Category::Stsm,
        Category::ItcGrants,
        Category::Mobility,
        Category::ConferencePresentations,
        Category::Dissemination,
        Category::Oersa,
        Category::TotalScience,
        Category::Fsac,
        Category::TotalGrant,
    ];

    /// JSON key of the category.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Meetings => "meetings",
            Category::TrainingSchools => "training_schools",
            Category::Stsm => "stsm",
            Category::ItcGrants => "itc_grants",
            Category::Mobility => "mobility",
            Category::ConferencePresentations => "conference_presentations",
            Category::Dissemination => "dissemination",
            Category::Oersa => "oersa",
            Category::TotalScience => "total_science",
            Category::Fsac => "fsac",
            Category::TotalGrant => "total_grant",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Lines (1) to (6), which add up to the total science expenditure.
    pub fn is_science_line(&self) -> bool {
        !matches!(self, Category::TotalScience | Category::Fsac | Category::TotalGrant)
    }
}

/// Amount read from a budget line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAmount {
    /// The line was present; the amount may legitimately be zero.
    Found(Decimal),
    /// The anchor label did not occur in the budget section.
    NotFound,
}

impl LineAmount {
    /// Numeric value, with absent lines counting as zero.
    pub fn value(&self) -> Decimal {
        match self {
            LineAmount::Found(amount) => *amount,
            LineAmount::NotFound => Decimal::new(0, 2),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, LineAmount::Found(_))
    }
}

/// One expenditure category of a grant period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetCategory {
    pub category: Category,
    pub amount: LineAmount,
}

/// Budget summary of one grant period.
///
/// Holds exactly the categories of its report format, so a legacy summary
/// never carries `mobility` and a merged one never carries `stsm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSummary {
    pub format: ReportFormat,
    pub categories: Vec<BudgetCategory>,
}

impl BudgetSummary {
    /// A summary with every line of `format` marked as not found.
    pub fn empty(format: ReportFormat) -> Self {
        Self {
            format,
            categories: format
                .categories()
                .into_iter()
                .map(|category| BudgetCategory {
                    category,
                    amount: LineAmount::NotFound,
                })
                .collect(),
        }
    }

    /// The line for `category`, or `None` if this format does not report it.
    pub fn get(&self, category: Category) -> Option<LineAmount> {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.amount)
    }

    /// Amount of `category`, zero when absent.
    pub fn amount(&self, category: Category) -> Decimal {
        self.get(category).map(|a| a.value()).unwrap_or(Decimal::new(0, 2))
    }

    pub fn total_grant(&self) -> Decimal {
        self.amount(Category::TotalGrant)
    }

    /// Mobility funding regardless of template: the STSM line for legacy
    /// plans, the merged Mobility line otherwise.
    pub fn mobility_equivalent(&self) -> LineAmount {
        let category = match self.format {
            ReportFormat::Legacy => Category::Stsm,
            ReportFormat::Merged => Category::Mobility,
        };
        self.get(category).unwrap_or(LineAmount::NotFound)
    }

    /// Categories whose anchor label was not found.
    pub fn missing(&self) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|c| !c.amount.is_found())
            .map(|c| c.category)
            .collect()
    }

    pub(crate) fn set(&mut self, category: Category, amount: LineAmount) {
        if let Some(line) = self.categories.iter_mut().find(|c| c.category == category) {
            line.amount = amount;
        }
    }

    /// Consistency checks between the lines and their totals.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let tolerance = Decimal::new(1, 2);

        let science = self.get(Category::TotalScience);
        if let Some(LineAmount::Found(total_science)) = science {
            let lines: Decimal = self
                .categories
                .iter()
                .filter(|c| c.category.is_science_line())
                .map(|c| c.amount.value())
                .sum();
            if (lines - total_science).abs() > tolerance {
                issues.push(format!(
                    "Budget lines (1)-(6) sum to {} but total science expenditure is {}",
                    lines, total_science
                ));
            }
        }

        if let (Some(LineAmount::Found(science)), Some(LineAmount::Found(fsac)), Some(LineAmount::Found(grant))) = (
            science,
            self.get(Category::Fsac),
            self.get(Category::TotalGrant),
        ) {
            if (science + fsac - grant).abs() > tolerance {
                issues.push(format!(
                    "Science expenditure {} plus FSAC {} differs from total grant {}",
                    science, fsac, grant
                ));
            }
        }

        issues
    }
}

impl Serialize for BudgetSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for line in &self.categories {
            map.serialize_entry(line.category.key(), &Float(line.amount.value()))?;
        }
        map.end()
    }
}

/// Kind of a planned meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeetingType {
    #[serde(rename = "Core Group")]
    CoreGroup,
    #[serde(rename = "Working Group")]
    WorkingGroup,
    #[serde(rename = "Management Committee")]
    ManagementCommittee,
    #[serde(rename = "Workshop/Conference")]
    WorkshopConference,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl MeetingType {
    /// Classify a "Meeting Type(s)" value; the first listed type wins.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        [
            ("core group", MeetingType::CoreGroup),
            ("working group", MeetingType::WorkingGroup),
            ("management committee", MeetingType::ManagementCommittee),
            ("workshop", MeetingType::WorkshopConference),
            ("conference", MeetingType::WorkshopConference),
        ]
        .into_iter()
        .filter_map(|(needle, kind)| lower.find(needle).map(|pos| (pos, kind)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, kind)| kind)
        .unwrap_or(MeetingType::Unknown)
    }
}

/// One planned meeting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingRecord {
    /// 1-based position within the grant period, in order of discovery.
    pub meeting_number: u32,
    pub title: String,
    pub meeting_type: MeetingType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// City.
    pub location: String,
    pub country: String,
    /// Host country is an Inclusiveness Target Country.
    pub itc_country: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub planned_cost: Decimal,
    pub expected_participants: u32,
    pub expected_reimbursed: u32,
    pub grant_period: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_outputs: Option<String>,
}

/// One planned training school.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSchoolRecord {
    pub school_number: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    pub location: String,
    pub country: String,
    pub itc_country: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub planned_cost: Decimal,
    pub expected_trainers: u32,
    pub expected_trainees: u32,
    pub grant_period: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<String>,
}

/// Everything extracted from one grant period's document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub grant_period: u8,
    pub budget_summary: BudgetSummary,
    pub meetings: Vec<MeetingRecord>,
    pub training_schools: Vec<TrainingSchoolRecord>,
    /// Issues met while parsing; reported, never fatal.
    #[serde(skip)]
    pub warnings: Vec<String>,
    /// File the text was read from.
    #[serde(skip)]
    pub source_file: String,
}

impl ExtractionResult {
    /// Result for a document nothing could be read from.
    pub fn empty(grant_period: u8, source_file: impl Into<String>) -> Self {
        Self {
            grant_period,
            budget_summary: BudgetSummary::empty(ReportFormat::for_grant_period(grant_period)),
            meetings: Vec::new(),
            training_schools: Vec::new(),
            warnings: Vec::new(),
            source_file: source_file.into(),
        }
    }

    /// Check record invariants and budget consistency.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.budget_summary.validate();

        for m in &self.meetings {
            if m.start_date > m.end_date {
                issues.push(format!("Meeting {} ends before it starts", m.meeting_number));
            }
            if m.planned_cost.is_sign_negative() {
                issues.push(format!("Meeting {} has a negative cost", m.meeting_number));
            }
        }

        for s in &self.training_schools {
            if s.start_date > s.end_date {
                issues.push(format!("Training school {} ends before it starts", s.school_number));
            }
            if s.planned_cost.is_sign_negative() {
                issues.push(format!("Training school {} has a negative cost", s.school_number));
            }
        }

        let meetings_cost: Decimal = self.meetings.iter().map(|m| m.planned_cost).sum();
        if let Some(LineAmount::Found(budget)) = self.budget_summary.get(Category::Meetings) {
            if !self.meetings.is_empty() && meetings_cost > budget + Decimal::new(1, 2) {
                issues.push(format!(
                    "Meeting costs ({}) exceed the meetings budget ({})",
                    meetings_cost, budget
                ));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_category_keys_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_key(category.key()), Some(category));
        }
        assert_eq!(Category::from_key("travel"), None);
    }

    #[test]
    fn test_meeting_type_first_listed_wins() {
        assert_eq!(
            MeetingType::from_label("Workshop/Conference, Working Group"),
            MeetingType::WorkshopConference
        );
        assert_eq!(
            MeetingType::from_label("Management Committee, Core Group"),
            MeetingType::ManagementCommittee
        );
        assert_eq!(MeetingType::from_label("Core Group"), MeetingType::CoreGroup);
        assert_eq!(MeetingType::from_label("Excursion"), MeetingType::Unknown);
    }

    #[test]
    fn test_empty_summary_has_format_categories() {
        let legacy = BudgetSummary::empty(ReportFormat::Legacy);
        assert_eq!(legacy.get(Category::Stsm), Some(LineAmount::NotFound));
        assert_eq!(legacy.get(Category::Mobility), None);
        assert_eq!(legacy.amount(Category::Mobility), Decimal::ZERO);
    }

    #[test]
    fn test_summary_serializes_in_report_order() {
        let mut summary = BudgetSummary::empty(ReportFormat::Merged);
        summary.set(Category::Meetings, LineAmount::Found(dec("151674.75")));
        summary.set(Category::TotalGrant, LineAmount::Found(dec("270315.26")));

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.starts_with(r#"{"meetings":151674.75,"training_schools":0.0,"mobility":0.0"#));
        assert!(json.ends_with(r#""total_grant":270315.26}"#));
        assert!(!json.contains("stsm"));
    }

    #[test]
    fn test_budget_validation() {
        let mut summary = BudgetSummary::empty(ReportFormat::Merged);
        summary.set(Category::Meetings, LineAmount::Found(dec("100.00")));
        summary.set(Category::Mobility, LineAmount::Found(dec("50.00")));
        summary.set(Category::TotalScience, LineAmount::Found(dec("150.00")));
        summary.set(Category::Fsac, LineAmount::Found(dec("22.50")));
        summary.set(Category::TotalGrant, LineAmount::Found(dec("172.50")));
        assert!(summary.validate().is_empty());

        summary.set(Category::TotalGrant, LineAmount::Found(dec("180.00")));
        assert_eq!(summary.validate().len(), 1);
    }
}
