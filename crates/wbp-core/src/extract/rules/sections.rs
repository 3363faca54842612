//! Section boundary heuristics.
//!
//! A section starts at the first start marker found (markers are tried in
//! priority order) and ends at the earliest following section header. When no
//! header follows, the section is cut at a fixed span so extraction always
//! makes forward progress.

use std::ops::Range;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::patterns::{
    BUDGET_START, MEETING_BLOCK, PAGE_EIGHT, SECTION_DISSEMINATION, SECTION_MEETINGS,
    SECTION_MOBILITY, SECTION_TRAINING, TRAINING_BLOCK,
};

/// Report sections the parser reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Budget,
    Meetings,
    TrainingSchools,
}

/// Fallback lengths (in bytes) used when a section has no following header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionSpans {
    pub budget: usize,
    pub meetings: usize,
    pub training_schools: usize,
}

impl Default for SectionSpans {
    fn default() -> Self {
        Self {
            budget: 3_000,
            meetings: 60_000,
            training_schools: 15_000,
        }
    }
}

impl SectionSpans {
    fn span(&self, section: Section) -> usize {
        match section {
            Section::Budget => self.budget,
            Section::Meetings => self.meetings,
            Section::TrainingSchools => self.training_schools,
        }
    }
}

impl Section {
    fn start_markers(self) -> Vec<&'static Regex> {
        match self {
            Section::Budget => BUDGET_START.iter().collect(),
            Section::Meetings => vec![&*SECTION_MEETINGS, &*MEETING_BLOCK],
            Section::TrainingSchools => vec![&*SECTION_TRAINING, &*TRAINING_BLOCK],
        }
    }

    fn end_markers(self) -> Vec<&'static Regex> {
        match self {
            Section::Budget => vec![&*PAGE_EIGHT, &*SECTION_MEETINGS, &*MEETING_BLOCK, &*SECTION_TRAINING],
            Section::Meetings => vec![&*SECTION_TRAINING, &*TRAINING_BLOCK],
            Section::TrainingSchools => vec![&*SECTION_MOBILITY, &*SECTION_DISSEMINATION],
        }
    }

    /// Whether a budget is still searched when none of its markers occur.
    fn required(self) -> bool {
        !matches!(self, Section::Budget)
    }
}

/// Locate `section` in `text`, searching from byte offset `from`.
///
/// Returns `None` only when the section has no start marker at all; the
/// budget section falls back to starting at `from`.
pub fn locate_section(text: &str, section: Section, from: usize, spans: &SectionSpans) -> Option<Range<usize>> {
    let from = floor_char_boundary(text, from.min(text.len()));
    let haystack = &text[from..];

    let start_match = section
        .start_markers()
        .into_iter()
        .find_map(|marker| marker.find(haystack));

    let (start, body_start) = match start_match {
        Some(m) => (from + m.start(), from + m.end()),
        None if section.required() => {
            debug!("Section {:?} not found after offset {}", section, from);
            return None;
        }
        None => (from, from),
    };

    let end = section
        .end_markers()
        .into_iter()
        .filter_map(|marker| marker.find(&text[body_start..]).map(|m| body_start + m.start()))
        .min()
        .unwrap_or_else(|| floor_char_boundary(text, (start + spans.span(section)).min(text.len())));

    debug!("Section {:?} spans {}..{}", section, start, end);
    Some(start..end.max(body_start))
}

pub(crate) fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
