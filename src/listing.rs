// src/listing.rs
//! Canonical listing entity shared across the pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The fixed set of career sites this tracker knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    KiDoktorand,
    KiVarbi,
    AcademicPositions,
}

impl Source {
    pub const ALL: [Source; 3] = [
        Source::KiDoktorand,
        Source::KiVarbi,
        Source::AcademicPositions,
    ];

    /// Stable key used as the id prefix and in persisted state.
    pub fn key(self) -> &'static str {
        match self {
            Source::KiDoktorand => "ki_doktorand",
            Source::KiVarbi => "ki_varbi",
            Source::AcademicPositions => "academic_positions",
        }
    }

    /// Human-readable name for notifications and the dashboard.
    pub fn display_name(self) -> &'static str {
        match self {
            Source::KiDoktorand => "KI Doctoral Positions",
            Source::KiVarbi => "KI Staff Positions",
            Source::AcademicPositions => "Academic Positions",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One scraped job posting, canonicalized across sources.
///
/// Created fresh each run by normalization and discarded after the run;
/// only the id survives in persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// `<source key>:<source-local key>`, stable across runs.
    pub id: String,
    pub source: Source,
    pub title: String,
    pub url: String,
    /// Deadline as scraped, for display.
    pub deadline: Option<String>,
    /// Parsed deadline, when the raw string was understood.
    pub closing_date: Option<NaiveDate>,
    /// Normalized title + description, the keyword-matching haystack.
    pub raw_text: String,
}
