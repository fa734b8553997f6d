use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Current US immigration status of the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisaStatus {
    #[serde(rename = "F1")]
    F1,
    #[serde(rename = "F1-OPT", alias = "F1 - OPT")]
    F1Opt,
    #[serde(rename = "STEM-OPT", alias = "STEM OPT")]
    StemOpt,
    #[serde(rename = "H1B")]
    H1b,
}

impl VisaStatus {
    pub const ALL: [VisaStatus; 4] = [
        VisaStatus::F1,
        VisaStatus::F1Opt,
        VisaStatus::StemOpt,
        VisaStatus::H1b,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisaStatus::F1 => "F1",
            VisaStatus::F1Opt => "F1-OPT",
            VisaStatus::StemOpt => "STEM-OPT",
            VisaStatus::H1b => "H1B",
        }
    }

    /// F1 without employment authorization carries no validity window.
    pub fn has_validity_window(&self) -> bool {
        !matches!(self, VisaStatus::F1)
    }
}

impl fmt::Display for VisaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown visa status '{0}' (expected one of F1, F1-OPT, STEM-OPT, H1B)")]
pub struct UnknownVisaStatus(pub String);

impl FromStr for VisaStatus {
    type Err = UnknownVisaStatus;

    /// Accepts the canonical names plus the labels used by the intake form
    /// ("F1 - OPT", "STEM OPT"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_uppercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == '_' { '-' } else { c })
            .collect();

        match normalized.as_str() {
            "F1" => Ok(VisaStatus::F1),
            "F1-OPT" | "OPT" => Ok(VisaStatus::F1Opt),
            "STEM-OPT" | "STEMOPT" => Ok(VisaStatus::StemOpt),
            "H1B" | "H-1B" => Ok(VisaStatus::H1b),
            _ => Err(UnknownVisaStatus(s.to_string())),
        }
    }
}

/// Start/end of the current status. Absent for plain F1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ValidityWindow {
    /// Returns `None` when the window is inverted.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriminalHistory {
    pub has_history: bool,
    pub details: Option<String>,
}

/// Everything the visa step of the wizard collects besides the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisaDetails {
    pub status: VisaStatus,
    pub window: Option<ValidityWindow>,
    pub is_stem_degree: bool,
    pub criminal_history: CriminalHistory,
}
