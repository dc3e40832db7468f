use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::ParseEnumError;

/// The tester's current judgement on one checklist item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Not yet reviewed. Items absent from the store carry this status.
    #[default]
    None,
    /// Pass.
    Verified,
    /// Explicit fail.
    CannotVerify,
    /// Parked; blocks phase progression the same way `None` does.
    Hold,
}

impl ReviewStatus {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Verified => "verified",
            Self::CannotVerify => "cannot_verify",
            Self::Hold => "hold",
        }
    }

    /// Whether this judgement is terminal.
    ///
    /// Both pass and explicit fail count: a failed regression is recorded,
    /// not a blocker — the derived-defect rule is what actually gates
    /// security/performance work afterwards.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Verified | Self::CannotVerify)
    }

    /// Lenient parse for values read back from storage: unknown strings
    /// normalize to [`ReviewStatus::None`] instead of failing.
    #[must_use]
    pub fn parse_lossy(s: &str) -> Self {
        Self::from_str(s).unwrap_or(Self::None)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "verified" => Ok(Self::Verified),
            "cannot_verify" | "cannot-verify" => Ok(Self::CannotVerify),
            "hold" => Ok(Self::Hold),
            _ => Err(ParseEnumError {
                expected: "review status",
                got: s.to_string(),
            }),
        }
    }
}

/// A review judgement as stored, keyed by checklist item id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub status: ReviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub updated_at_us: i64,
}

impl ReviewEntry {
    #[must_use]
    pub const fn new(status: ReviewStatus, updated_at_us: i64) -> Self {
        Self {
            status,
            note: None,
            updated_at_us,
        }
    }
}
