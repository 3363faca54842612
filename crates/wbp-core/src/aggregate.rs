//! Cross-period aggregation of extraction results.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::extract::rules::ReportFormat;
use crate::models::report::{Category, ExtractionResult};
use crate::models::summary::{AggregateSummary, PeriodBudget};

/// Combine per-period results into one summary.
///
/// `expected` lists the grant periods that should be present; those without
/// a result are reported in `missing_grant_periods`. Results are only read.
pub fn aggregate(results: &[ExtractionResult], expected: &[u8]) -> AggregateSummary {
    let mut summary = AggregateSummary::default();

    let mut ordered: Vec<&ExtractionResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.grant_period);

    for result in ordered {
        let gp = result.grant_period;
        let budget = &result.budget_summary;

        if summary.budgets_by_gp.contains_key(&gp) {
            warn!("Duplicate result for GP{}, ignoring", gp);
            continue;
        }

        summary.total_meetings_planned += result.meetings.len();
        summary.total_training_schools_planned += result.training_schools.len();

        let mobility = budget.mobility_equivalent();
        let period = PeriodBudget {
            total_grant: budget.total_grant(),
            meetings: budget.amount(Category::Meetings),
            training_schools: budget.amount(Category::TrainingSchools),
            mobility: mobility.value(),
            fsac: budget.amount(Category::Fsac),
        };
        summary.totals += period;
        summary.budgets_by_gp.insert(gp, period);

        let mut categories = BTreeMap::new();
        for line in &budget.categories {
            let amount = line.amount.value();
            *summary.category_totals.entry(line.category).or_insert(Decimal::new(0, 2)) += amount;
            categories.insert(line.category, amount);

            if !line.amount.is_found() {
                summary.not_found.insert(format!("GP{}.{}", gp, line.category.key()));
            }
        }
        // Legacy STSM counts as mobility, in the category view as well.
        if budget.format == ReportFormat::Legacy {
            *summary.category_totals.entry(Category::Mobility).or_insert(Decimal::new(0, 2)) += period.mobility;
            categories.insert(Category::Mobility, period.mobility);
        }
        if !mobility.is_found() {
            summary.not_found.insert(format!("GP{}.mobility", gp));
        }
        summary.period_categories.insert(gp, categories);

        debug!("Aggregated GP{}: total grant {}", gp, period.total_grant);
    }

    summary.missing_grant_periods = expected
        .iter()
        .copied()
        .filter(|gp| !summary.budgets_by_gp.contains_key(gp))
        .collect();
    summary.missing_grant_periods.sort_unstable();
    summary.missing_grant_periods.dedup();

    summary
}
