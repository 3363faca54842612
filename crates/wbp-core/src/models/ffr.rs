//! Actual expenditure read from a final financial report (FFR).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// A row of the FFR meetings expenditure overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FfrMeetingCost {
    pub meeting_number: u32,
    pub location: String,
    pub country: String,
    /// Meeting type column as printed, possibly empty.
    pub meeting_types: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub actuals: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub accruals: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub grant_period: u8,
}

/// A paid virtual mobility grant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VmGrant {
    /// `GP<n>_VM<entry>`.
    pub id: String,
    pub grant_period: u8,
    pub entry_number: u32,
    pub name: String,
    /// Young researcher or innovator; only reported from grant period 5.
    pub yri: bool,
    /// ISO 3166 alpha-2 code.
    pub country: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Everything extracted from one grant period's FFR.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FfrResult {
    pub grant_period: u8,
    pub meetings: Vec<FfrMeetingCost>,
    pub vm_grants: Vec<VmGrant>,
    #[serde(skip)]
    pub warnings: Vec<String>,
    #[serde(skip)]
    pub source_file: String,
}

impl FfrResult {
    pub fn meetings_total(&self) -> Decimal {
        self.meetings.iter().map(|m| m.total).sum()
    }

    pub fn vm_total(&self) -> Decimal {
        self.vm_grants.iter().map(|g| g.amount).sum()
    }
}
