//! Verification of the aggregate summary against reference totals.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::models::config::VerificationConfig;
use crate::models::summary::{AggregateSummary, VerificationEntry, VerificationReport};

/// Default accepted difference: one cent.
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Verified total grants per grant period and overall.
pub fn reference_totals() -> BTreeMap<String, Decimal> {
    [
        ("GP1.total_grant", Decimal::new(6_298_550, 2)),
        ("GP2.total_grant", Decimal::new(20_260_700, 2)),
        ("GP3.total_grant", Decimal::new(16_982_050, 2)),
        ("GP4.total_grant", Decimal::new(25_792_591, 2)),
        ("GP5.total_grant", Decimal::new(27_031_526, 2)),
        ("totals.total_grant", Decimal::new(96_365_417, 2)),
    ]
    .into_iter()
    .map(|(field, amount)| (field.to_string(), amount))
    .collect()
}

/// Compares an aggregate summary with expected values.
#[derive(Debug, Clone)]
pub struct Verifier {
    reference: BTreeMap<String, Decimal>,
    tolerance: Decimal,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(reference_totals())
    }
}

impl Verifier {
    pub fn new(reference: BTreeMap<String, Decimal>) -> Self {
        Self {
            reference,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn from_config(config: &VerificationConfig) -> Self {
        Self::new(config.reference.clone()).with_tolerance(config.tolerance)
    }

    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance.abs();
        self
    }

    /// Keep only reference fields accepted by `filter`.
    pub fn retain(mut self, filter: impl Fn(&str) -> bool) -> Self {
        self.reference.retain(|field, _| filter(field));
        self
    }

    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// Compare every reference field. A field absent from the summary is a
    /// mismatch with an actual value of zero.
    pub fn verify(&self, summary: &AggregateSummary) -> VerificationReport {
        let mut mismatches = Vec::new();

        for (field, expected) in &self.reference {
            let found = summary.lookup(field);
            let actual = found.unwrap_or(Decimal::new(0, 2));
            let diff = actual - expected;

            if found.is_some() && diff.abs() <= self.tolerance {
                debug!("{}: {} matches", field, actual);
                continue;
            }

            let entry = VerificationEntry {
                field: field.clone(),
                expected: *expected,
                actual,
                diff,
                missing: found.is_none(),
                not_found_in_source: summary.not_found.contains(field),
            };
            warn!(
                "{}: expected {}, got {} (diff {}){}",
                entry.field,
                entry.expected,
                entry.actual,
                entry.diff,
                if entry.missing { ", missing" } else { "" }
            );
            mismatches.push(entry);
        }

        info!(
            "Verified {} fields: {} mismatches",
            self.reference.len(),
            mismatches.len()
        );

        VerificationReport {
            tolerance: self.tolerance,
            checked: self.reference.len(),
            mismatches,
        }
    }
}
