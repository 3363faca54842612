//! Source documents: the extracted text of one report for one grant period.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::SourceError;
use crate::models::config::SourceConfig;

/// Highest grant period an Action can have.
pub const MAX_GRANT_PERIOD: u8 = 5;

/// Report type of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Work and Budget Plan: planned amounts.
    Wbp,
    /// Final Financial Report: actual amounts.
    Ffr,
}

/// Read-only text of one report.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    grant_period: u8,
    kind: DocumentKind,
    text: String,
    file_name: String,
}

impl SourceDocument {
    pub fn new(
        grant_period: u8,
        kind: DocumentKind,
        text: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Result<Self, SourceError> {
        validate_grant_period(grant_period)?;
        Ok(Self {
            grant_period,
            kind,
            text: text.into(),
            file_name: file_name.into(),
        })
    }

    /// Read a UTF-8 text file.
    pub fn load(grant_period: u8, kind: DocumentKind, path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Loaded {} ({} bytes)", file_name, text.len());
        Self::new(grant_period, kind, text, file_name)
    }

    pub fn grant_period(&self) -> u8 {
        self.grant_period
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

pub fn validate_grant_period(grant_period: u8) -> Result<(), SourceError> {
    if (1..=MAX_GRANT_PERIOD).contains(&grant_period) {
        Ok(())
    } else {
        Err(SourceError::InvalidGrantPeriod(grant_period))
    }
}

/// Finds source files by grant period.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    source_dir: PathBuf,
    wbp_pattern: String,
    ffr_pattern: String,
}

impl SourceLocator {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            source_dir: config.source_dir.clone(),
            wbp_pattern: config.wbp_pattern.clone(),
            ffr_pattern: config.ffr_pattern.clone(),
        }
    }

    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = dir.into();
        self
    }

    /// Path of the report for `grant_period`. With several matches the
    /// lexicographically first wins.
    pub fn resolve(&self, grant_period: u8, kind: DocumentKind) -> Result<PathBuf, SourceError> {
        validate_grant_period(grant_period)?;

        let file_pattern = match kind {
            DocumentKind::Wbp => &self.wbp_pattern,
            DocumentKind::Ffr => &self.ffr_pattern,
        }
        .replace("{gp}", &grant_period.to_string());

        let dir = glob::Pattern::escape(&self.source_dir.to_string_lossy());
        let pattern = format!("{}/{}", dir, file_pattern);

        let paths = glob::glob(&pattern).map_err(|e| SourceError::Pattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;

        let mut matches: Vec<PathBuf> = paths.filter_map(|p| p.ok()).filter(|p| p.is_file()).collect();
        matches.sort();

        matches.into_iter().next().ok_or(SourceError::NotFound {
            grant_period,
            pattern,
        })
    }

    pub fn load(&self, grant_period: u8, kind: DocumentKind) -> Result<SourceDocument, SourceError> {
        let path = self.resolve(grant_period, kind)?;
        SourceDocument::load(grant_period, kind, &path)
    }
}
