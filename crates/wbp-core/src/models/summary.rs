//! Cross-period summary and verification report.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use super::report::Category;
use super::{serialize_float_map, Float};

/// Headline budget figures of one grant period (or of all periods).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PeriodBudget {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_grant: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub meetings: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub training_schools: Decimal,
    /// STSM for grant periods 1-3, Mobility afterwards.
    #[serde(with = "rust_decimal::serde::float")]
    pub mobility: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub fsac: Decimal,
}

impl PeriodBudget {
    pub fn field(&self, name: &str) -> Option<Decimal> {
        match name {
            "total_grant" => Some(self.total_grant),
            "meetings" => Some(self.meetings),
            "training_schools" => Some(self.training_schools),
            "mobility" => Some(self.mobility),
            "fsac" => Some(self.fsac),
            _ => None,
        }
    }
}

impl std::ops::AddAssign for PeriodBudget {
    fn add_assign(&mut self, other: Self) {
        self.total_grant += other.total_grant;
        self.meetings += other.meetings;
        self.training_schools += other.training_schools;
        self.mobility += other.mobility;
        self.fsac += other.fsac;
    }
}

/// Summary across all extracted grant periods.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AggregateSummary {
    pub total_meetings_planned: usize,
    pub total_training_schools_planned: usize,
    #[serde(serialize_with = "serialize_by_gp")]
    pub budgets_by_gp: BTreeMap<u8, PeriodBudget>,
    pub totals: PeriodBudget,
    /// Sum of every budget category over the periods that report it.
    /// `mobility` includes the STSM line of legacy periods, like `totals`.
    #[serde(serialize_with = "serialize_float_map")]
    pub category_totals: BTreeMap<Category, Decimal>,
    /// Grant periods with no extraction result.
    pub missing_grant_periods: Vec<u8>,
    /// Per-period amounts of every category, for `GP<n>.<category>` lookups.
    #[serde(skip)]
    pub period_categories: BTreeMap<u8, BTreeMap<Category, Decimal>>,
    /// Fields whose budget line was not found in the source text.
    #[serde(skip)]
    pub not_found: BTreeSet<String>,
}

impl AggregateSummary {
    /// Resolve a dotted field name such as `GP2.total_grant`,
    /// `totals.meetings` or `total_meetings_planned`.
    pub fn lookup(&self, field: &str) -> Option<Decimal> {
        match field {
            "total_meetings_planned" => return Some(Decimal::from(self.total_meetings_planned)),
            "total_training_schools_planned" => {
                return Some(Decimal::from(self.total_training_schools_planned));
            }
            _ => {}
        }

        let (scope, name) = field.split_once('.')?;
        if scope == "totals" {
            return self
                .totals
                .field(name)
                .or_else(|| Category::from_key(name).and_then(|c| self.category_totals.get(&c).copied()));
        }

        let gp: u8 = scope.strip_prefix("GP")?.parse().ok()?;
        if let Some(budget) = self.budgets_by_gp.get(&gp).and_then(|b| b.field(name)) {
            return Some(budget);
        }
        let category = Category::from_key(name)?;
        self.period_categories.get(&gp)?.get(&category).copied()
    }
}

fn serialize_by_gp<S: Serializer>(map: &BTreeMap<u8, PeriodBudget>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(map.iter().map(|(gp, budget)| (format!("GP{}", gp), budget)))
}

/// One reference figure that disagrees with the extracted summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationEntry {
    pub field: String,
    #[serde(serialize_with = "serialize_float")]
    pub expected: Decimal,
    #[serde(serialize_with = "serialize_float")]
    pub actual: Decimal,
    /// `actual - expected`.
    #[serde(serialize_with = "serialize_float")]
    pub diff: Decimal,
    /// The field is absent from the summary altogether.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub missing: bool,
    /// The budget line backing the field was not found in the source text.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub not_found_in_source: bool,
}

fn serialize_float<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    Float(*value).serialize(serializer)
}

/// Mismatches found by the verifier. Empty means a clean run.
///
/// Serializes as the bare list of mismatches; the tolerance and the number
/// of compared figures are only shown on the console.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    pub tolerance: Decimal,
    /// Number of reference figures compared.
    pub checked: usize,
    pub mismatches: Vec<VerificationEntry>,
}

impl Serialize for VerificationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.mismatches.serialize(serializer)
    }
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mismatches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mismatches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup_paths() {
        let mut summary = AggregateSummary {
            total_meetings_planned: 12,
            ..Default::default()
        };
        summary.budgets_by_gp.insert(
            2,
            PeriodBudget {
                total_grant: Decimal::new(20260700, 2),
                ..Default::default()
            },
        );
        summary
            .period_categories
            .entry(2)
            .or_default()
            .insert(Category::Dissemination, Decimal::new(500000, 2));
        summary.totals.total_grant = Decimal::new(20260700, 2);

        assert_eq!(summary.lookup("GP2.total_grant"), Some(Decimal::new(20260700, 2)));
        assert_eq!(summary.lookup("GP2.dissemination"), Some(Decimal::new(500000, 2)));
        assert_eq!(summary.lookup("totals.total_grant"), Some(Decimal::new(20260700, 2)));
        assert_eq!(summary.lookup("total_meetings_planned"), Some(Decimal::from(12)));
        assert_eq!(summary.lookup("GP3.total_grant"), None);
        assert_eq!(summary.lookup("GPx.total_grant"), None);
        assert_eq!(summary.lookup("nonsense"), None);
    }

    #[test]
    fn test_budgets_by_gp_keys() {
        let mut summary = AggregateSummary::default();
        summary.budgets_by_gp.insert(1, PeriodBudget::default());
        summary.budgets_by_gp.insert(4, PeriodBudget::default());

        let json = serde_json::to_value(&summary).unwrap();
        let keys: Vec<_> = json["budgets_by_gp"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["GP1".to_string(), "GP4".to_string()]);
        assert!(json.get("period_categories").is_none());
    }

    #[test]
    fn test_entry_flags_skipped_when_false() {
        let entry = VerificationEntry {
            field: "GP1.total_grant".into(),
            expected: Decimal::new(10000, 2),
            actual: Decimal::new(10002, 2),
            diff: Decimal::new(2, 2),
            missing: false,
            not_found_in_source: false,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"field":"GP1.total_grant","expected":100.0,"actual":100.02,"diff":0.02}"#
        );
    }

    #[test]
    fn test_report_serializes_as_mismatch_list() {
        let clean = VerificationReport {
            tolerance: Decimal::new(1, 2),
            checked: 6,
            mismatches: Vec::new(),
        };
        assert_eq!(serde_json::to_string(&clean).unwrap(), "[]");

        let report = VerificationReport {
            mismatches: vec![VerificationEntry {
                field: "GP5.total_grant".into(),
                expected: Decimal::new(10000, 2),
                actual: Decimal::ZERO,
                diff: Decimal::new(-10000, 2),
                missing: true,
                not_found_in_source: false,
            }],
            ..clean
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(1));
        assert_eq!(json[0]["field"], serde_json::json!("GP5.total_grant"));
        assert_eq!(json[0]["missing"], serde_json::json!(true));
    }
}
