//! Core library for COST Action report extraction.
//!
//! This crate provides:
//! - Amount and date normalization for converted report text
//! - Work and Budget Plan (WBP) parsing for both budget templates
//! - Final Financial Report (FFR) meeting and virtual mobility extraction
//! - Cross-period aggregation and verification against reference totals
//! - Deterministic JSON export
//! - PDF to text conversion

pub mod aggregate;
pub mod error;
pub mod export;
pub mod extract;
pub mod models;
pub mod pdf;
pub mod source;
pub mod verify;

pub use aggregate::aggregate;
pub use error::{Result, WbpError};
pub use export::Exporter;
pub use extract::rules::{format_amount, parse_amount, parse_date, ReportFormat};
pub use extract::{FfrParser, ReportParser, WbpParser};
pub use models::config::PipelineConfig;
pub use models::ffr::{FfrMeetingCost, FfrResult, VmGrant};
pub use models::report::{
    BudgetCategory, BudgetSummary, Category, ExtractionResult, LineAmount, MeetingRecord, MeetingType,
    TrainingSchoolRecord,
};
pub use models::summary::{AggregateSummary, PeriodBudget, VerificationEntry, VerificationReport};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use source::{DocumentKind, SourceDocument, SourceLocator};
pub use verify::Verifier;
