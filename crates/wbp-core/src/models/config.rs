//! Configuration structures for the extraction pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WbpError};
use crate::extract::rules::SectionSpans;
use crate::verify;

/// Main configuration for the wbp pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Where source text files are found.
    pub sources: SourceConfig,

    /// Where and how artifacts are written.
    pub output: OutputConfig,

    /// Reference totals and tolerance.
    pub verification: VerificationConfig,

    /// Fallback section lengths.
    pub sections: SectionSpans,
}

/// Source discovery configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory holding the extracted text of each report.
    pub source_dir: PathBuf,

    /// File name glob of the work and budget plan; `{gp}` is replaced by the
    /// grant period number.
    pub wbp_pattern: String,

    /// File name glob of the final financial report.
    pub ffr_pattern: String,

    /// Grant periods processed when none is given explicitly.
    pub grant_periods: Vec<u8>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("extracted_text"),
            wbp_pattern: "WBP-*-{gp}_*.txt".to_string(),
            ffr_pattern: "*-{gp}-FFR_*.txt".to_string(),
            grant_periods: vec![1, 2, 3, 4, 5],
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_dir: PathBuf,

    /// Indent JSON artifacts.
    pub pretty: bool,

    /// Add the `_metadata` block to per-period files.
    pub include_metadata: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data/wbp"),
            pretty: true,
            include_metadata: true,
        }
    }
}

/// Verification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Largest accepted absolute difference in EUR.
    #[serde(with = "rust_decimal::serde::float")]
    pub tolerance: Decimal,

    /// Expected values keyed by field name, e.g. `GP1.total_grant`.
    #[serde(serialize_with = "super::serialize_float_map")]
    pub reference: BTreeMap<String, Decimal>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            tolerance: verify::DEFAULT_TOLERANCE,
            reference: verify::reference_totals(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| WbpError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| WbpError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
