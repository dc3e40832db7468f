use std::fmt;

use thiserror::Error;

/// Machine-readable error codes for script-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    ItemNotFound,
    InvalidReviewStatus,
    CycleOutOfRange,
    AlreadyFinalized,
    ItemGated,
    StoreOpenFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::ItemNotFound => "E2001",
            Self::InvalidReviewStatus => "E2002",
            Self::CycleOutOfRange => "E2003",
            Self::AlreadyFinalized => "E2004",
            Self::ItemGated => "E2005",
            Self::StoreOpenFailed => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::ItemNotFound => "Checklist item not found",
            Self::InvalidReviewStatus => "Invalid review status value",
            Self::CycleOutOfRange => "Report cycle out of range",
            Self::AlreadyFinalized => "Execution already finalized",
            Self::ItemGated => "Checklist item is gated",
            Self::StoreOpenFailed => "Store open failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `ct init` to initialize this project."),
            Self::ConfigParseError => Some("Fix syntax in .certo/config.toml and retry."),
            Self::ItemNotFound => Some("Run `ct checklist` to list valid item ids."),
            Self::InvalidReviewStatus => {
                Some("Use one of: verified, cannot-verify, hold, clear.")
            }
            Self::CycleOutOfRange => Some("Report cycles run from 1 to 4."),
            Self::AlreadyFinalized => None,
            Self::ItemGated => Some("Run `ct status` to see what is blocking this item."),
            Self::StoreOpenFailed => Some("Check permissions on .certo/certo.db."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

/// Top-level error type for certo-core operations.
#[derive(Debug, Error)]
pub enum CertoError {
    #[error("project not initialized (no .certo/ directory)")]
    NotInitialized,

    #[error("checklist item not found: {item_id}")]
    ItemNotFound { item_id: String },

    #[error("invalid review status: '{value}'")]
    InvalidReviewStatus { value: String },

    #[error("report cycle {cycle} is out of range (1-4)")]
    CycleOutOfRange { cycle: u8 },

    #[error("execution results are already finalized")]
    AlreadyFinalized,

    #[error("item {item_id} is gated: {reason}")]
    ItemGated { item_id: String, reason: String },
}

impl CertoError {
    /// The stable machine code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::ItemNotFound { .. } => ErrorCode::ItemNotFound,
            Self::InvalidReviewStatus { .. } => ErrorCode::InvalidReviewStatus,
            Self::CycleOutOfRange { .. } => ErrorCode::CycleOutOfRange,
            Self::AlreadyFinalized => ErrorCode::AlreadyFinalized,
            Self::ItemGated { .. } => ErrorCode::ItemGated,
        }
    }

    /// Remediation hint, falling back to the generic code message.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.error_code();
        code.hint().unwrap_or(code.message()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{CertoError, ErrorCode};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::NotInitialized,
            ErrorCode::ConfigParseError,
            ErrorCode::ItemNotFound,
            ErrorCode::InvalidReviewStatus,
            ErrorCode::CycleOutOfRange,
            ErrorCode::AlreadyFinalized,
            ErrorCode::ItemGated,
            ErrorCode::StoreOpenFailed,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::ItemGated.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn certo_error_maps_to_codes() {
        let err = CertoError::ItemNotFound {
            item_id: "exec-foo".to_string(),
        };
        assert_eq!(err.error_code(), ErrorCode::ItemNotFound);
        assert!(err.to_string().contains("exec-foo"));
        assert!(err.suggestion().contains("ct checklist"));
    }

    #[test]
    fn finalized_error_falls_back_to_code_message() {
        let err = CertoError::AlreadyFinalized;
        assert_eq!(err.suggestion(), "Execution already finalized");
    }
}
