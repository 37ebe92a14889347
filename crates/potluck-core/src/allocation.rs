//! # Share Allocation
//!
//! Turns the declared share intents of one expense into concrete amounts.
//!
//! ## Resolution Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Rule                 Amount                                            │
//! │  ───────────────────  ─────────────────────────────────────────────     │
//! │  Equal                expense / number of shares                        │
//! │                       leftover units → Equal members, lowest id first   │
//! │                                                                         │
//! │  Fixed { amount }     amount, verbatim                                  │
//! │                                                                         │
//! │  Percentage { bps }   expense × bps / 10000, half to even               │
//! │                       block total reconciled to                         │
//! │                       expense × Σbps / 10000, lowest id first           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example: Leftover Units
//! ```text
//! 10.00 split equally between members #7, #2, #5
//!
//!   10.00 / 3 = 3.33 each, 0.01 left over
//!   lowest id first → #2 gets 3.34
//!
//!   #7: 3.33   #2: 3.34   #5: 3.33   (Σ = 10.00)
//! ```
//!
//! ## Checks
//! Before anything is resolved the payments must cover the expense exactly.
//! After resolution the shares must cover it exactly too. Neither mismatch is
//! ever corrected silently.

use tracing::debug;

use crate::error::{ConsistencyError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Expense, PaymentRecord, ResolvedShare, ShareIntent, ShareRule};
use crate::validation::{checked_total, validate_unique};

/// Resolves every intent of `expense` to a concrete amount.
///
/// ## Errors
/// - `ValidationError::Required` when `intents` is empty
/// - `ValidationError::Duplicate` when a member appears twice
/// - `ConsistencyError::PaymentTotalMismatch` when Σ payments ≠ amount
/// - `ConsistencyError::ShareTotalMismatch` when Σ shares ≠ amount
/// - `ValidationError::OutOfRange` when either sum overflows
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use potluck_core::allocation::allocate;
/// use potluck_core::money::Money;
/// use potluck_core::types::*;
///
/// let expense = Expense {
///     id: ExpenseId::new(1),
///     group_id: GroupId::new(1),
///     description: "Groceries".to_string(),
///     amount: Money::from_major(500),
///     category: ExpenseCategory::Food,
///     created_at: Utc::now(),
/// };
/// let intents: Vec<_> = (1..=4).map(|id| ShareIntent::equal(MemberId::new(id))).collect();
/// let payments = [PaymentRecord {
///     member_id: MemberId::new(1),
///     amount: Money::from_major(500),
///     paid_at: Utc::now(),
/// }];
///
/// let shares = allocate(&expense, &intents, &payments).unwrap();
/// assert!(shares.iter().all(|s| s.amount == Money::from_major(125)));
/// ```
pub fn allocate(
    expense: &Expense,
    intents: &[ShareIntent],
    payments: &[PaymentRecord],
) -> CoreResult<Vec<ResolvedShare>> {
    if intents.is_empty() {
        return Err(ValidationError::Required {
            field: "shares".to_string(),
        }
        .into());
    }
    validate_unique("share member_id", intents.iter().map(|i| i.member_id))?;

    let paid = checked_total("payments total", payments.iter().map(|p| p.amount))?;
    if paid != expense.amount {
        return Err(ConsistencyError::PaymentTotalMismatch {
            expected: expense.amount,
            paid,
        }
        .into());
    }

    debug!(
        expense_id = %expense.id,
        amount = %expense.amount,
        shares = intents.len(),
        "Allocating expense shares"
    );

    let (equal_part, leftover) = expense.amount.split_evenly(intents.len());

    let mut amounts: Vec<Money> = intents
        .iter()
        .map(|intent| match intent.rule {
            ShareRule::Equal => equal_part,
            ShareRule::Fixed { amount } => amount,
            ShareRule::Percentage { percentage_bps } => expense.amount.percentage_of(percentage_bps),
        })
        .collect();

    // Leftover from the equal division, one unit each, lowest member id first
    let equal_order = order_by_member(intents, |rule| matches!(rule, ShareRule::Equal));
    nudge(&mut amounts, &equal_order, leftover);

    // Percentage block must total the rounded percentage of the whole
    let pct_order = order_by_member(intents, |rule| rule.percentage().is_some());
    if !pct_order.is_empty() {
        let total_bps: i64 = intents
            .iter()
            .filter_map(|i| i.rule.percentage())
            .map(|p| p.bps() as i64)
            .sum();
        let target = Money::from_basis_points(expense.amount.cents(), total_bps);
        let rounded: Money = pct_order.iter().map(|&idx| amounts[idx]).sum();
        nudge(&mut amounts, &pct_order, (target - rounded).cents());
    }

    let allocated = checked_total("shares total", amounts.iter().copied())?;
    if allocated != expense.amount {
        return Err(ConsistencyError::ShareTotalMismatch {
            expected: expense.amount,
            allocated,
        }
        .into());
    }

    Ok(intents
        .iter()
        .zip(amounts)
        .map(|(intent, amount)| ResolvedShare {
            member_id: intent.member_id,
            rule: intent.rule,
            amount,
        })
        .collect())
}

/// Indices of the intents matching `select`, ordered by member id.
fn order_by_member(intents: &[ShareIntent], select: impl Fn(&ShareRule) -> bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..intents.len())
        .filter(|&idx| select(&intents[idx].rule))
        .collect();
    order.sort_by_key(|&idx| intents[idx].member_id);
    order
}

/// Moves `units` minor units onto (or, when negative, off) the amounts at
/// `order`, one unit per member per pass. Never takes a share below zero.
fn nudge(amounts: &mut [Money], order: &[usize], mut units: i64) {
    let step = units.signum();

    while units != 0 {
        let mut moved = false;

        for &idx in order {
            if units == 0 {
                break;
            }
            if step < 0 && !amounts[idx].is_positive() {
                continue;
            }
            amounts[idx] += Money::from_cents(step);
            units -= step;
            moved = true;
        }

        if !moved {
            break;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
