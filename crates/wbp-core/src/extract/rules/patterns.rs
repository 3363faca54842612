//! Regex patterns for work and budget plan (WBP) and final financial report
//! (FFR) text, plus the per-template budget line sets.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::models::report::Category;

/// Trailing amount token on a labelled line. Validated by the normalizer.
const TRAILING_AMOUNT: &str = r"(\d(?:[\d ,.\u{00a0}]*\d)?)[ \t\r]*$";

/// Budget template generation of a work and budget plan.
///
/// The template changed after grant period 3: earlier plans list STSM and
/// ITC Conference Grants separately, later plans merge them into Mobility
/// and Conference Presentations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Grant periods 1-3.
    Legacy,
    /// Grant periods 4 and later.
    Merged,
}

impl ReportFormat {
    /// Select the template for a grant period.
    pub fn for_grant_period(grant_period: u8) -> Self {
        if grant_period <= 3 {
            ReportFormat::Legacy
        } else {
            ReportFormat::Merged
        }
    }

    /// Budget line patterns valid for this template, in report order.
    pub fn budget_lines(self) -> &'static [BudgetLinePattern] {
        match self {
            ReportFormat::Legacy => &LEGACY_BUDGET_LINES,
            ReportFormat::Merged => &MERGED_BUDGET_LINES,
        }
    }

    /// Categories this template reports.
    pub fn categories(self) -> Vec<Category> {
        self.budget_lines().iter().map(|line| line.category).collect()
    }
}

/// Anchor pattern for one budget line. Capture group 1 is the amount token.
#[derive(Debug)]
pub struct BudgetLinePattern {
    pub category: Category,
    pub regex: Regex,
}

fn budget_line(category: Category, anchor: &str) -> BudgetLinePattern {
    let regex = Regex::new(&format!(r"(?im){}.*?{}", anchor, TRAILING_AMOUNT))
        .expect("budget line pattern is valid");
    BudgetLinePattern { category, regex }
}

const MEETINGS_ANCHOR: &str = r"\(1\)\s*Meetings?\b";
const TRAINING_ANCHOR: &str = r"\(2\)\s*Training\s+Schools?\b";
const STSM_ANCHOR: &str = r"\(3\)\s*Short[\s\-]?Term";
const ITC_ANCHOR: &str = r"\(4\)\s*ITC\s+Conference";
const MOBILITY_ANCHOR: &str = r"\(3\)\s*Mobility";
const CONFERENCE_ANCHOR: &str = r"\(4\)\s*(?:Presentation\s+at\s+Conferences|Conference)";
const DISSEMINATION_ANCHOR: &str = r"\(5\)\s*Dissemination";
const OERSA_ANCHOR: &str = r"\(6\)\s*(?:Other\s+Expenses|OERSA)";
const TOTAL_SCIENCE_ANCHOR: &str = r"Total\s+Science\s+Expenditure";
const FSAC_ANCHOR: &str = r"Financial\s+and\s+Scientific\s+Administration";
const TOTAL_GRANT_ANCHOR: &str = r"Total\s+Grant";

lazy_static! {
    static ref LEGACY_BUDGET_LINES: Vec<BudgetLinePattern> = vec![
        budget_line(Category::Meetings, MEETINGS_ANCHOR),
        budget_line(Category::TrainingSchools, TRAINING_ANCHOR),
        budget_line(Category::Stsm, STSM_ANCHOR),
        budget_line(Category::ItcGrants, ITC_ANCHOR),
        budget_line(Category::Dissemination, DISSEMINATION_ANCHOR),
        budget_line(Category::Oersa, OERSA_ANCHOR),
        budget_line(Category::TotalScience, TOTAL_SCIENCE_ANCHOR),
        budget_line(Category::Fsac, FSAC_ANCHOR),
        budget_line(Category::TotalGrant, TOTAL_GRANT_ANCHOR),
    ];

    static ref MERGED_BUDGET_LINES: Vec<BudgetLinePattern> = vec![
        budget_line(Category::Meetings, MEETINGS_ANCHOR),
        budget_line(Category::TrainingSchools, TRAINING_ANCHOR),
        budget_line(Category::Mobility, MOBILITY_ANCHOR),
        budget_line(Category::ConferencePresentations, CONFERENCE_ANCHOR),
        budget_line(Category::Dissemination, DISSEMINATION_ANCHOR),
        budget_line(Category::Oersa, OERSA_ANCHOR),
        budget_line(Category::TotalScience, TOTAL_SCIENCE_ANCHOR),
        budget_line(Category::Fsac, FSAC_ANCHOR),
        budget_line(Category::TotalGrant, TOTAL_GRANT_ANCHOR),
    ];

    // Amounts: "151,674.75", "151 674.75", "151674.75", "1,000"
    pub static ref AMOUNT_STRICT: Regex = Regex::new(
        r"^(?:\d{1,3}(?:[ ,\u{00a0}]\d{3})+|\d+)(?:\.\d{2})?$"
    ).unwrap();

    pub static ref AMOUNT_TOKEN: Regex = Regex::new(
        r"\b(?:\d{1,3}(?:[ ,\u{00a0}]\d{3})+(?:\.\d{2})?|\d+\.\d{2})\b"
    ).unwrap();

    // Dates
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b"
    ).unwrap();

    pub static ref DATE_ISO: Regex = Regex::new(
        r"\b(\d{4})-(\d{2})-(\d{2})\b"
    ).unwrap();

    // Section boundaries
    pub static ref BUDGET_START: Vec<Regex> = vec![
        Regex::new(r"A\.\s*COST\s+Networking\s+Tools").unwrap(),
        Regex::new(r"(?i)Work\s+and\s+Budget\s+Plan\s+Summary").unwrap(),
        Regex::new(r"(?i)\(1\)\s*Meetings?\b").unwrap(),
    ];

    pub static ref SECTION_MEETINGS: Regex = Regex::new(
        r"(?m)^[ \t]*Meetings[ \t\r]*$"
    ).unwrap();

    pub static ref SECTION_TRAINING: Regex = Regex::new(
        r"(?m)^[ \t]*Training\s+Schools?[ \t\r]*$"
    ).unwrap();

    // Standalone, case-sensitive header lines only: wrapped description
    // text such as "dissemination of results" must not end a section.
    pub static ref SECTION_MOBILITY: Regex = Regex::new(
        r"(?m)^[ \t]*(?:Short[ \-]?Term Scientific Missions?(?: \(STSMs?\))?|Mobility|STSMs?)[ \t\r]*$"
    ).unwrap();

    pub static ref SECTION_DISSEMINATION: Regex = Regex::new(
        r"(?m)^[ \t]*Dissemination(?: and Communication Products)?[ \t\r]*$"
    ).unwrap();

    pub static ref PAGE_EIGHT: Regex = Regex::new(
        r"(?im)^[ \t\-=]*PAGE\s+8\b"
    ).unwrap();

    // Record block headers
    pub static ref MEETING_BLOCK: Regex = Regex::new(
        r"Title\s+of\s+the\s+Meeting\s+"
    ).unwrap();

    pub static ref TRAINING_BLOCK: Regex = Regex::new(
        r"Title\s+of\s+the\s+Training\s+"
    ).unwrap();

    // Record fields
    pub static ref MEETING_TYPE_FIELD: Regex = Regex::new(
        r"(?i)Meeting\s+Type\(s\)[ \t]+([^\r\n]+)"
    ).unwrap();

    pub static ref LOCATION_ITC: Regex = Regex::new(
        r"(?i)Location[ \t]+([^\r\n]+?)[ \t]+ITC[ \t]+(Yes|No)\b"
    ).unwrap();

    pub static ref CITY_COUNTRY_PAREN: Regex = Regex::new(
        r"^(.+?)\s*\(([^)]+)\)"
    ).unwrap();

    pub static ref START_DATE_FIELD: Regex = Regex::new(
        r"(?i)Start\s+Date[ \t:]+(\S+)"
    ).unwrap();

    pub static ref END_DATE_FIELD: Regex = Regex::new(
        r"(?i)End\s+Date[ \t:]+(\S+)"
    ).unwrap();

    pub static ref EXPECTED_PARTICIPANTS: Regex = Regex::new(
        r"Total\s+number\s+of\s+expected\s+(\d+)"
    ).unwrap();

    pub static ref EXPECTED_REIMBURSED: Regex = Regex::new(
        r"(?s)Number\s+of\s+participants\s+expected.*?(\d+)"
    ).unwrap();

    pub static ref TRAINERS_TRAINEES: Regex = Regex::new(
        r"Total\s+number\s+of\s+expected\s+trainers/trainees\s+(\d+)\s+(\d+)"
    ).unwrap();

    pub static ref TRAINERS_SINGLE: Regex = Regex::new(
        r"(?i)(?:expected|number\s+of)\s*trainers?\s*[:\-]?\s*(\d+)"
    ).unwrap();

    pub static ref TRAINEES_SINGLE: Regex = Regex::new(
        r"(?i)(?:expected|number\s+of)\s*trainees?\s*[:\-]?\s*(\d+)"
    ).unwrap();

    pub static ref MEETING_COST: Regex = Regex::new(
        r"(?i)Total\s+cost\s+of\s+the\s+meeting\s*\(EUR\)[ \t]*(\d[\d ,.\u{00a0}]*)"
    ).unwrap();

    pub static ref TRAINING_COST: Regex = Regex::new(
        r"(?i)Total\s+cost\s+of\s+the\s+Training\s*School\s*\(EUR\)[ \t]*(\d[\d ,.\u{00a0}]*)"
    ).unwrap();

    pub static ref TOTAL_COST_FIELD: Regex = Regex::new(
        r"(?i)Total\s+Cost[^\d\r\n]*(\d[\d ,.\u{00a0}]*)"
    ).unwrap();

    pub static ref LOCATION_LINE: Regex = Regex::new(
        r"(?im)^[ \t]*(?:Meeting\s+|Training\s+School\s+)?Location[ \t:]+([^\r\n]+)"
    ).unwrap();

    pub static ref INSTITUTION_FIELD: Regex = Regex::new(
        r"(?im)^[ \t]*(?:Host\s+)?Institution[ \t:]+([^\r\n]+)"
    ).unwrap();

    pub static ref TOPICS_LABEL: Regex = Regex::new(
        r"(?im)^[ \t]*(?:Main\s+)?Topics(?:\s+covered)?[ \t]*:?\s+"
    ).unwrap();

    pub static ref DESCRIPTION_LABEL: Regex = Regex::new(
        r"(?i)Description\s+"
    ).unwrap();

    pub static ref OUTPUTS_LABEL: Regex = Regex::new(
        r"(?i)Output\(s\)\s+"
    ).unwrap();

    pub static ref LOCATION_LABEL: Regex = Regex::new(
        r"(?i)\bLocation\b"
    ).unwrap();

    // FFR: meetings expenditure overview
    pub static ref FFR_MEETINGS_START: Regex = Regex::new(
        r"Meetings\s+Expenditure"
    ).unwrap();

    pub static ref FFR_MEETINGS_END: Regex = Regex::new(
        r"(?i)Meeting\s+1\b|Meeting\s+details"
    ).unwrap();

    // "1 Berlin / Germany Workshop/Conference, Working Group, 3 927.98 0.00 3 927.98"
    pub static ref FFR_MEETING_ROW: Regex = Regex::new(
        r"^(\d+)\s+([^/]+?)\s*/\s*(.+?)\s+([^0-9]*?)\s*(\d[\d, ]*\.\d{2})\s+(\d[\d, ]*\.\d{2})\s+(\d[\d, ]*\.\d{2})$"
    ).unwrap();

    // FFR: paid virtual mobility grants
    pub static ref FFR_VM_SECTION: Regex = Regex::new(
        r"(?is)List\s+of\s+paid\s+Virtual\s+Mobility\s*(.*?)(?:Sub-total\s+actual\s+amounts|No\s+Virtual\s+Mobility\s+still\s+to\s+be\s+reimbursed|Virtual\s+Networking\s+Support|Dissemination|OERSA|\z)"
    ).unwrap();

    // "1 Alessandra Tanda VM IT 15/07/2022 15/09/2022 1 310.00"
    pub static ref FFR_VM_ROW: Regex = Regex::new(
        r"^(\d+)\s+(\p{L}[\p{L} \-']+?)\s+VM\s+.*?([A-Z]{2})\s+(\d{2}/\d{2}/\d{4})\s+(\d{2}/\d{2}/\d{4})\s+(\d[\d ]*\.\d{2})"
    ).unwrap();

    // "1 Maria Iannario NO Explainable AI IT 01/02/2024 01/07/2024 1 500.00"
    pub static ref FFR_YRI_ROW: Regex = Regex::new(
        r"^(\d+)\s+(\p{L}[\p{L} \-']+?)\s+(YES|NO)\s+.*?([A-Z]{2})\s+(\d{2}/\d{2}/\d{4})\s+(\d{2}/\d{2}/\d{4})\s+(\d[\d ]*\.\d{2})"
    ).unwrap();

    pub static ref FFR_PAGE_FOOTER: Regex = Regex::new(
        r"^(?:Page\b.*|\d+\s+of\s+\d+|.*Grantee\s+name.*)$"
    ).unwrap();

    // Text dumps produced by pdf-to-text
    pub static ref PAGE_MARKER: Regex = Regex::new(
        r"(?m)^--- Page (\d+) ---$"
    ).unwrap();
}
