//! # Validation Module
//!
//! Input and snapshot validation for Potluck.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  ├── Shape and types of the JSON                                       │
//! │  └── Percentage range (Percentage: TryFrom<u32>)                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Field rules (description, amounts within bounds)                  │
//! │  ├── Duplicates (one share per member per expense)                     │
//! │  ├── Referential checks (every member_id is in the snapshot)           │
//! │  └── Per-expense totals (payments and shares cover the amount)         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Computations (allocation, settlement)                        │
//! │  └── Accounting consistency (resolved shares, group-wide zero sum)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use potluck_core::money::Money;
//! use potluck_core::validation::{validate_description, validate_expense_amount};
//!
//! assert_eq!(validate_description("  Groceries ").unwrap(), "Groceries");
//! assert!(validate_description("").is_err());
//! assert!(validate_expense_amount(Money::zero()).is_err());
//! ```

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

use crate::error::{ConsistencyError, CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::GroupSnapshot;
use crate::{MAX_AMOUNT_CENTS, MAX_DESCRIPTION_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an expense description.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_DESCRIPTION_LEN`] characters
///
/// ## Returns
/// The trimmed description.
pub fn validate_description(description: &str) -> ValidationResult<String> {
    let description = description.trim();

    if description.is_empty() {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        });
    }

    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(description.to_string())
}

/// Validates an expense amount (> 0, at most [`MAX_AMOUNT_CENTS`]).
pub fn validate_expense_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    validate_max_amount("amount", amount, 1)
}

/// Validates a payment amount (> 0, at most [`MAX_AMOUNT_CENTS`]).
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    validate_max_amount("payment amount", amount, 1)
}

/// Validates a resolved share amount (>= 0, at most [`MAX_AMOUNT_CENTS`]).
pub fn validate_share_amount(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: "share amount".to_string(),
        });
    }
    validate_max_amount("share amount", amount, 0)
}

fn validate_max_amount(field: &str, amount: Money, min: i64) -> ValidationResult<()> {
    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

/// Sums `amounts`, failing with `OutOfRange` instead of overflowing.
pub fn checked_total<I>(field: &str, amounts: I) -> ValidationResult<Money>
where
    I: IntoIterator<Item = Money>,
{
    Money::checked_sum(amounts).ok_or_else(|| ValidationError::OutOfRange {
        field: field.to_string(),
        min: i64::MIN,
        max: i64::MAX,
    })
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Fails on the first value that appears twice.
///
/// ## Example
/// ```rust
/// use potluck_core::validation::validate_unique;
///
/// assert!(validate_unique("member_id", [1, 2, 3]).is_ok());
/// assert!(validate_unique("member_id", [1, 2, 1]).is_err());
/// ```
pub fn validate_unique<T, I>(field: &str, values: I) -> ValidationResult<()>
where
    T: Eq + Hash + Display,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    for value in values {
        if seen.contains(&value) {
            return Err(ValidationError::Duplicate {
                field: field.to_string(),
                value: value.to_string(),
            });
        }
        seen.insert(value);
    }
    Ok(())
}

// =============================================================================
// Snapshot Validation
// =============================================================================

/// Checks a group snapshot before any computation runs.
///
/// ## Rules
/// - Member ids and expense ids are unique
/// - Every expense amount is positive
/// - Each expense has at most one share per member
/// - Share amounts are non-negative, payment amounts positive
/// - Every share and payment references a member of the snapshot
///   (otherwise [`CoreError::MemberNotFound`])
/// - Each expense's payments and shares both add up to its amount
///   (otherwise [`ConsistencyError::PaymentTotalMismatch`] or
///   [`ConsistencyError::ShareTotalMismatch`])
/// - The group total fits in an `i64`
///
/// Totals are checked per expense: an overpaid expense and an underpaid one
/// cancel out group-wide.
pub fn validate_snapshot(snapshot: &GroupSnapshot) -> CoreResult<()> {
    validate_unique("member_id", snapshot.members.iter().map(|m| m.id))?;
    validate_unique("expense_id", snapshot.expenses.iter().map(|e| e.expense.id))?;

    let members: HashSet<_> = snapshot.members.iter().map(|m| m.id).collect();

    for expense in &snapshot.expenses {
        validate_expense_amount(expense.expense.amount)?;
        validate_unique("share member_id", expense.shares.iter().map(|s| s.member_id))?;

        for share in &expense.shares {
            if !members.contains(&share.member_id) {
                return Err(CoreError::MemberNotFound(share.member_id));
            }
            validate_share_amount(share.amount)?;
        }

        for payment in &expense.payments {
            if !members.contains(&payment.member_id) {
                return Err(CoreError::MemberNotFound(payment.member_id));
            }
            validate_payment_amount(payment.amount)?;
        }

        let amount = expense.expense.amount;

        let paid = checked_total("payments total", expense.payments.iter().map(|p| p.amount))?;
        if paid != amount {
            return Err(ConsistencyError::PaymentTotalMismatch {
                expected: amount,
                paid,
            }
            .into());
        }

        let allocated = checked_total("shares total", expense.shares.iter().map(|s| s.amount))?;
        if allocated != amount {
            return Err(ConsistencyError::ShareTotalMismatch {
                expected: amount,
                allocated,
            }
            .into());
        }
    }

    // Every per-member sum is bounded by this one
    checked_total("total_expenses", snapshot.expenses.iter().map(|e| e.expense.amount))?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
