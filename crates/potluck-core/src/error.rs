//! # Error Types
//!
//! Domain-specific error types for potluck-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  potluck-core errors (this file)                                       │
//! │  ├── CoreError          - Everything a core call can return            │
//! │  ├── ValidationError    - Malformed input (missing field, bad range)   │
//! │  └── ConsistencyError   - Numbers that do not add up                   │
//! │                                                                         │
//! │  potluck-cli errors (separate crate)                                   │
//! │  └── CliError           - What the terminal sees (serialized)          │
//! │                                                                         │
//! │  Flow: ValidationError ─┐                                              │
//! │                          ├─► CoreError ─► CliError ─► stderr           │
//! │        ConsistencyError ─┘                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation
//! Every core operation is a pure function over an in-memory snapshot, so a
//! failure is always local and final: there is nothing to retry and nothing
//! partially applied to roll back. The core only classifies the failure
//! ([`ErrorKind`]); choosing a status code or message is up to the caller.

use thiserror::Error;

use crate::money::Money;
use crate::types::{ExpenseId, MemberId};

// =============================================================================
// Core Error
// =============================================================================

/// Errors returned by ledger operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A share or payment references a member that is not in the snapshot.
    ///
    /// ## When This Occurs
    /// - The caller handed over a snapshot assembled from a partial read
    /// - A statement was requested for a member of another group
    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    /// The requested expense is not in the snapshot.
    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    /// Input validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Accounting consistency error (wraps ConsistencyError).
    #[error("Consistency error: {0}")]
    Consistency(#[from] ConsistencyError),
}

/// Coarse classification of a [`CoreError`].
///
/// ## Usage
/// The surrounding service maps this to its own user-visible behavior,
/// e.g. `Validation` → 400, `NotFound` → 404, `Consistency` → 422.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Consistency,
    NotFound,
}

impl CoreError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::MemberNotFound(_) | CoreError::ExpenseNotFound(_) => ErrorKind::NotFound,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Consistency(_) => ErrorKind::Consistency,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a request or snapshot is malformed. They are raised at
/// the edge (while converting wire input into domain types) so the
/// computations themselves only ever see well-formed values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// A share rule is missing the field its kind requires.
    ///
    /// ## When This Occurs
    /// - `kind: "fixed"` without `amount`
    /// - `kind: "percentage"` without `percentage_bps`
    #[error("{kind} share for member {member_id} requires {field}")]
    MissingRuleField {
        member_id: MemberId,
        kind: String,
        field: String,
    },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., the same member listed twice in a split).
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Consistency Error
// =============================================================================

/// Accounting consistency errors.
///
/// These are never silently corrected: a mismatch means some upstream step
/// recorded numbers that cannot all be true at once.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsistencyError {
    /// Payments recorded for an expense do not add up to its amount.
    #[error("Payments total {paid} but the expense amount is {expected}")]
    PaymentTotalMismatch { expected: Money, paid: Money },

    /// Resolved shares do not add up to the expense amount.
    ///
    /// ## When This Occurs
    /// - Fixed shares that over- or under-cover the expense
    /// - Percentages that do not total 100%
    /// - Mixing Equal with other rules (Equal divides the full amount)
    #[error("Shares total {allocated} but the expense amount is {expected}")]
    ShareTotalMismatch { expected: Money, allocated: Money },

    /// Net balances handed to the settlement planner do not sum to zero.
    #[error("Net balances sum to {residual} instead of zero")]
    UnbalancedLedger { residual: Money },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConsistencyError::PaymentTotalMismatch {
            expected: Money::from_cents(50000),
            paid: Money::from_cents(45000),
        };
        assert_eq!(
            err.to_string(),
            "Payments total 450.00 but the expense amount is 500.00"
        );

        let err = CoreError::MemberNotFound(MemberId::new(7));
        assert_eq!(err.to_string(), "Member not found: 7");
    }

    #[test]
    fn test_missing_rule_field_message() {
        let err = ValidationError::MissingRuleField {
            member_id: MemberId::new(3),
            kind: "percentage".to_string(),
            field: "percentage_bps".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "percentage share for member 3 requires percentage_bps"
        );
    }

    #[test]
    fn test_error_kind_classification() {
        let validation: CoreError = ValidationError::Required {
            field: "shares".to_string(),
        }
        .into();
        assert_eq!(validation.kind(), ErrorKind::Validation);

        let consistency: CoreError = ConsistencyError::UnbalancedLedger {
            residual: Money::from_cents(1),
        }
        .into();
        assert_eq!(consistency.kind(), ErrorKind::Consistency);

        assert_eq!(
            CoreError::ExpenseNotFound(ExpenseId::new(9)).kind(),
            ErrorKind::NotFound
        );
    }
}
