// Structured rejections for submission normalization
// Every invalid submission maps to exactly one of these kinds before any
// record is constructed; normalization is all-or-nothing.

use serde::Serialize;

// ============================================================================
// ERROR TYPE
// ============================================================================

/// Validation rejection for a single submission.
///
/// Carries the offending field (where one exists) and a human-readable
/// message. The boundary layer maps these to client-visible responses; none
/// of them are retried, since they represent invalid input rather than
/// transient failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum LedgerError {
    /// Malformed or non-positive monetary text.
    InvalidAmount { message: String },

    /// A conditionally-required field is absent.
    MissingField { field: &'static str, message: String },

    /// A value outside its governing enumeration (processor submethod,
    /// vehicle name/motive, category).
    InvalidChoice { field: &'static str, message: String },

    /// Account or semester outside the configured sets.
    InvalidAccountOrPeriod { field: &'static str, message: String },
}

impl LedgerError {
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        LedgerError::InvalidAmount {
            message: message.into(),
        }
    }

    pub fn missing_field(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::MissingField {
            field,
            message: message.into(),
        }
    }

    pub fn invalid_choice(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::InvalidChoice {
            field,
            message: message.into(),
        }
    }

    pub fn invalid_account_or_period(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::InvalidAccountOrPeriod {
            field,
            message: message.into(),
        }
    }

    /// Stable kind name (for logs and API payloads).
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount { .. } => "InvalidAmount",
            LedgerError::MissingField { .. } => "MissingField",
            LedgerError::InvalidChoice { .. } => "InvalidChoice",
            LedgerError::InvalidAccountOrPeriod { .. } => "InvalidAccountOrPeriod",
        }
    }

    /// Field the rejection refers to, when there is a specific one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            LedgerError::InvalidAmount { .. } => Some("amount"),
            LedgerError::MissingField { field, .. }
            | LedgerError::InvalidChoice { field, .. }
            | LedgerError::InvalidAccountOrPeriod { field, .. } => Some(field),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            LedgerError::InvalidAmount { message }
            | LedgerError::MissingField { message, .. }
            | LedgerError::InvalidChoice { message, .. }
            | LedgerError::InvalidAccountOrPeriod { message, .. } => message,
        }
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.field() {
            Some(field) => write!(f, "[{}] {}: {}", self.kind(), field, self.message()),
            None => write!(f, "[{}] {}", self.kind(), self.message()),
        }
    }
}

impl std::error::Error for LedgerError {}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_field() {
        let err = LedgerError::missing_field("month", "MONTH is required for this category");
        assert_eq!(
            err.to_string(),
            "[MissingField] month: MONTH is required for this category"
        );
    }

    #[test]
    fn test_kind_names_are_stable() {
        assert_eq!(LedgerError::invalid_amount("x").kind(), "InvalidAmount");
        assert_eq!(LedgerError::missing_field("f", "x").kind(), "MissingField");
        assert_eq!(LedgerError::invalid_choice("f", "x").kind(), "InvalidChoice");
        assert_eq!(
            LedgerError::invalid_account_or_period("f", "x").kind(),
            "InvalidAccountOrPeriod"
        );
    }

    #[test]
    fn test_amount_errors_point_at_amount_field() {
        let err = LedgerError::invalid_amount("amount must be positive");
        assert_eq!(err.field(), Some("amount"));
    }
}
