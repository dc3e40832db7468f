use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::ParseEnumError;

/// First reporting cycle.
pub const FIRST_CYCLE: u8 = 1;
/// The post-first-patch regression cycle. Derived defects at or after this
/// cycle gate security/performance testing.
pub const REGRESSION_CYCLE: u8 = 3;
/// The final reporting cycle. Any defect here forces the final phase.
pub const FINAL_CYCLE: u8 = 4;

/// Defect severity, for triage and the certification report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    #[default]
    Major,
    Minor,
    Cosmetic,
}

impl Severity {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Cosmetic => "cosmetic",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "cosmetic" => Ok(Self::Cosmetic),
            _ => Err(ParseEnumError {
                expected: "severity",
                got: s.to_string(),
            }),
        }
    }
}

/// An observed problem, recorded once and never mutated.
///
/// `report_cycle` identifies the reporting round (1–2 initial discovery,
/// 3 post-first-patch regression, 4 final). `derived` marks a defect found
/// as a side effect of an earlier fix rather than an originally-intended
/// finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defect {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub severity: Severity,
    pub report_cycle: u8,
    pub derived: bool,
    pub created_at_us: i64,
}

/// Validate a report cycle number against the closed 1–4 range.
///
/// # Errors
///
/// Returns the offending value when it falls outside the range.
pub const fn validate_cycle(cycle: u8) -> Result<u8, u8> {
    if cycle >= FIRST_CYCLE && cycle <= FINAL_CYCLE {
        Ok(cycle)
    } else {
        Err(cycle)
    }
}
