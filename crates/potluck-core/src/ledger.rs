//! # Ledger Operations
//!
//! Report-level entry points. Each one takes a [`GroupSnapshot`] by
//! reference and returns a serializable report; nothing is stored between
//! calls.
//!
//! ## Operation Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation            Pipeline                          Output          │
//! │  ───────────────────  ───────────────────────────────  ─────────────── │
//! │  record_expense       validate → allocate              ExpenseSnapshot │
//! │  balance_sheet        validate → aggregate → plan      GroupBalanceSheet│
//! │  settlement_plan      balance_sheet().settlements      [Transfer]      │
//! │  member_statement     validate → aggregate + detail    MemberStatement │
//! │  expense_summaries    newest first                     [ExpenseSummary]│
//! │  expense_details      lookup + member names            ExpenseDetails  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The balance sheet and its settlement plan always come from the same
//! aggregation over the same snapshot, so the two can never disagree.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::allocation::allocate;
use crate::balance::{aggregate, detail, MemberBalance, MemberTransaction};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::settlement::{plan, SettlementTransfer};
use crate::types::{
    Expense, ExpenseCategory, ExpenseId, ExpenseSnapshot, GroupId, GroupSnapshot, MemberId,
    NewExpense, PaymentRecord, ShareIntent, ShareRule,
};
use crate::validation::{
    validate_description, validate_expense_amount, validate_payment_amount, validate_snapshot,
};

// =============================================================================
// Report Types
// =============================================================================

/// Balances of every member plus the plan that settles them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GroupBalanceSheet {
    pub group_id: GroupId,
    pub group_name: String,
    pub total_expenses: Money,
    /// In group member order.
    pub member_balances: Vec<MemberBalance>,
    pub settlements: Vec<SettlementTransfer>,
}

/// One member's balance with their full history, newest expense first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MemberStatement {
    pub balance: MemberBalance,
    pub transactions: Vec<MemberTransaction>,
}

/// A row of the expense list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseSummary {
    pub id: ExpenseId,
    pub description: String,
    pub amount: Money,
    pub category: ExpenseCategory,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Distinct members who paid.
    pub payers_count: usize,
    pub shares_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShareDetail {
    pub member_id: MemberId,
    pub member_name: String,
    pub rule: ShareRule,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentDetail {
    pub member_id: MemberId,
    pub member_name: String,
    pub amount: Money,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
}

/// A single expense with member names resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseDetails {
    pub id: ExpenseId,
    pub description: String,
    pub amount: Money,
    pub category: ExpenseCategory,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub shares: Vec<ShareDetail>,
    pub payments: Vec<PaymentDetail>,
}

// =============================================================================
// Recording
// =============================================================================

/// Validates a submitted expense and resolves its shares.
///
/// Payments are stamped with `created_at`. The returned snapshot is what the
/// caller persists; the input snapshot is not modified.
///
/// ## Errors
/// - [`ValidationError`] for a bad description, amount, share rule,
///   duplicate member or an `expense_id` already in the snapshot
/// - [`CoreError::MemberNotFound`] for a share or payment outside the group
/// - [`crate::ConsistencyError`] when payments or shares miss the amount
pub fn record_expense(
    snapshot: &GroupSnapshot,
    expense_id: ExpenseId,
    new: NewExpense,
    created_at: DateTime<Utc>,
) -> CoreResult<ExpenseSnapshot> {
    if snapshot.expense(expense_id).is_some() {
        return Err(ValidationError::Duplicate {
            field: "expense_id".to_string(),
            value: expense_id.to_string(),
        }
        .into());
    }

    let description = validate_description(&new.description)?;
    validate_expense_amount(new.amount)?;

    let intents = new
        .shares
        .into_iter()
        .map(ShareIntent::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let members: HashSet<MemberId> = snapshot.members.iter().map(|m| m.id).collect();
    let referenced = intents
        .iter()
        .map(|i| i.member_id)
        .chain(new.payments.iter().map(|p| p.member_id));
    for member_id in referenced {
        if !members.contains(&member_id) {
            return Err(CoreError::MemberNotFound(member_id));
        }
    }

    let payments = new
        .payments
        .iter()
        .map(|p| {
            validate_payment_amount(p.amount)?;
            Ok(PaymentRecord {
                member_id: p.member_id,
                amount: p.amount,
                paid_at: created_at,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let expense = Expense {
        id: expense_id,
        group_id: snapshot.group_id,
        description,
        amount: new.amount,
        category: new.category,
        created_at,
    };

    let shares = allocate(&expense, &intents, &payments)?;

    info!(
        group_id = %snapshot.group_id,
        expense_id = %expense_id,
        amount = %expense.amount,
        shares = shares.len(),
        payments = payments.len(),
        "Expense recorded"
    );

    Ok(ExpenseSnapshot {
        expense,
        shares,
        payments,
    })
}

// =============================================================================
// Balances & Settlement
// =============================================================================

/// Balances of every member and the transfers that settle them.
///
/// ## Example
/// ```rust
/// use potluck_core::ledger::balance_sheet;
/// use potluck_core::types::{GroupId, GroupSnapshot, Member};
///
/// let snapshot = GroupSnapshot {
///     group_id: GroupId::new(1),
///     group_name: "Flat 4B".to_string(),
///     members: vec![Member::new(1, "Ana"), Member::new(2, "Ben")],
///     expenses: vec![],
/// };
///
/// let sheet = balance_sheet(&snapshot).unwrap();
/// assert_eq!(sheet.member_balances.len(), 2);
/// assert!(sheet.settlements.is_empty());
/// ```
pub fn balance_sheet(snapshot: &GroupSnapshot) -> CoreResult<GroupBalanceSheet> {
    validate_snapshot(snapshot)?;

    let mut balances = aggregate(&snapshot.members, &snapshot.expenses)?;

    let settlements = plan(snapshot.members.iter().map(|member| {
        let net = balances.get(&member.id).map(|b| b.net).unwrap_or_default();
        (member, net)
    }))?;

    let member_balances: Vec<MemberBalance> = snapshot
        .members
        .iter()
        .filter_map(|member| balances.remove(&member.id))
        .collect();

    debug!(
        group_id = %snapshot.group_id,
        members = member_balances.len(),
        settlements = settlements.len(),
        "Built balance sheet"
    );

    Ok(GroupBalanceSheet {
        group_id: snapshot.group_id,
        group_name: snapshot.group_name.clone(),
        total_expenses: snapshot.total_expenses(),
        member_balances,
        settlements,
    })
}

/// The settlement plan alone. Same result as `balance_sheet(..).settlements`.
pub fn settlement_plan(snapshot: &GroupSnapshot) -> CoreResult<Vec<SettlementTransfer>> {
    Ok(balance_sheet(snapshot)?.settlements)
}

/// Balance and history of one member, newest expense first.
pub fn member_statement(snapshot: &GroupSnapshot, member_id: MemberId) -> CoreResult<MemberStatement> {
    validate_snapshot(snapshot)?;

    if snapshot.member(member_id).is_none() {
        return Err(CoreError::MemberNotFound(member_id));
    }

    let newest_first = newest_first(&snapshot.expenses);
    let mut balances = aggregate(&snapshot.members, &newest_first)?;
    let balance = balances
        .remove(&member_id)
        .ok_or(CoreError::MemberNotFound(member_id))?;
    let transactions = detail(member_id, &snapshot.members, &newest_first)?;

    Ok(MemberStatement {
        balance,
        transactions,
    })
}

// =============================================================================
// Expense Views
// =============================================================================

/// One summary row per expense, newest first.
pub fn expense_summaries(snapshot: &GroupSnapshot) -> Vec<ExpenseSummary> {
    newest_first(&snapshot.expenses)
        .iter()
        .map(|e| ExpenseSummary {
            id: e.expense.id,
            description: e.expense.description.clone(),
            amount: e.expense.amount,
            category: e.expense.category,
            created_at: e.expense.created_at,
            payers_count: e
                .payments
                .iter()
                .map(|p| p.member_id)
                .collect::<BTreeSet<_>>()
                .len(),
            shares_count: e.shares.len(),
        })
        .collect()
}

/// A single expense with the names of everyone involved.
pub fn expense_details(snapshot: &GroupSnapshot, expense_id: ExpenseId) -> CoreResult<ExpenseDetails> {
    let found = snapshot
        .expense(expense_id)
        .ok_or(CoreError::ExpenseNotFound(expense_id))?;

    let name_of = |id: MemberId| -> CoreResult<String> {
        snapshot
            .member(id)
            .map(|m| m.display_name.clone())
            .ok_or(CoreError::MemberNotFound(id))
    };

    let shares = found
        .shares
        .iter()
        .map(|s| {
            Ok(ShareDetail {
                member_id: s.member_id,
                member_name: name_of(s.member_id)?,
                rule: s.rule,
                amount: s.amount,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let payments = found
        .payments
        .iter()
        .map(|p| {
            Ok(PaymentDetail {
                member_id: p.member_id,
                member_name: name_of(p.member_id)?,
                amount: p.amount,
                paid_at: p.paid_at,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(ExpenseDetails {
        id: found.expense.id,
        description: found.expense.description.clone(),
        amount: found.expense.amount,
        category: found.expense.category,
        created_at: found.expense.created_at,
        shares,
        payments,
    })
}

/// Expenses ordered by creation time descending, then id descending.
fn newest_first(expenses: &[ExpenseSnapshot]) -> Vec<ExpenseSnapshot> {
    let mut sorted = expenses.to_vec();
    sorted.sort_by_key(|e| Reverse((e.expense.created_at, e.expense.id)));
    sorted
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsistencyError;
    use crate::types::{Member, NewPayment, ShareIntentInput, ShareKind};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 10, 18, 0, 0).unwrap()
    }

    fn empty_group() -> GroupSnapshot {
        GroupSnapshot {
            group_id: GroupId::new(1),
            group_name: "Student Housing".to_string(),
            members: vec![
                Member::new(1, "Azzam"),
                Member::new(2, "Mohammed"),
                Member::new(3, "Ahmed"),
                Member::new(4, "Khalid"),
            ],
            expenses: vec![],
        }
    }

    fn equal_shares() -> Vec<ShareIntentInput> {
        (1..=4)
            .map(|id| ShareIntentInput {
                member_id: MemberId::new(id),
                kind: ShareKind::Equal,
                amount: None,
                percentage_bps: None,
            })
            .collect()
    }

    fn pays(pairs: &[(i64, i64)]) -> Vec<NewPayment> {
        pairs
            .iter()
            .map(|&(id, major)| NewPayment {
                member_id: MemberId::new(id),
                amount: Money::from_major(major),
            })
            .collect()
    }

    fn record(group: &mut GroupSnapshot, id: i64, new: NewExpense, days_ago: i64) {
        let created = now() - Duration::days(days_ago);
        let expense = record_expense(group, ExpenseId::new(id), new, created).unwrap();
        group.expenses.push(expense);
    }

    /// Three expenses: groceries (equal, one payer), electricity (equal, two
    /// payers) and dinner (percentages, one payer).
    fn seeded_group() -> GroupSnapshot {
        let mut group = empty_group();
        record(
            &mut group,
            1,
            NewExpense {
                description: "Weekly groceries".to_string(),
                amount: Money::from_major(500),
                category: ExpenseCategory::Food,
                shares: equal_shares(),
                payments: pays(&[(1, 500)]),
            },
            5,
        );
        record(
            &mut group,
            2,
            NewExpense {
                description: "Electricity bill".to_string(),
                amount: Money::from_major(200),
                category: ExpenseCategory::Utilities,
                shares: equal_shares(),
                payments: pays(&[(2, 100), (3, 100)]),
            },
            3,
        );
        let pct = [(1, 3000), (2, 2000), (3, 2500), (4, 2500)]
            .into_iter()
            .map(|(id, bps)| ShareIntentInput {
                member_id: MemberId::new(id),
                kind: ShareKind::Percentage,
                amount: None,
                percentage_bps: Some(bps),
            })
            .collect();
        record(
            &mut group,
            3,
            NewExpense {
                description: "Restaurant dinner".to_string(),
                amount: Money::from_major(300),
                category: ExpenseCategory::Food,
                shares: pct,
                payments: pays(&[(4, 300)]),
            },
            1,
        );
        group
    }

    #[test]
    fn test_seeded_balance_sheet() {
        let sheet = balance_sheet(&seeded_group()).unwrap();

        assert_eq!(sheet.total_expenses, Money::from_major(1000));
        let nets: Vec<(i64, i64)> = sheet
            .member_balances
            .iter()
            .map(|b| (b.member_id.get(), b.net.cents()))
            .collect();
        assert_eq!(nets, vec![(1, 23500), (2, -13500), (3, -15000), (4, 5000)]);

        let transfers: Vec<(i64, i64, i64)> = sheet
            .settlements
            .iter()
            .map(|t| (t.from_member_id.get(), t.to_member_id.get(), t.amount.cents()))
            .collect();
        assert_eq!(transfers, vec![(3, 1, 15000), (2, 1, 8500), (2, 4, 5000)]);
    }

    #[test]
    fn test_settlement_plan_matches_sheet() {
        let group = seeded_group();
        assert_eq!(
            settlement_plan(&group).unwrap(),
            balance_sheet(&group).unwrap().settlements
        );
    }

    #[test]
    fn test_member_statement_newest_first() {
        let statement = member_statement(&seeded_group(), MemberId::new(2)).unwrap();

        assert_eq!(statement.balance.net, Money::from_major(-135));
        let entries: Vec<(i64, bool)> = statement
            .transactions
            .iter()
            .map(|t| (t.expense_id.get(), matches!(t.kind, crate::balance::TransactionKind::Payment)))
            .collect();
        assert_eq!(entries, vec![(3, false), (2, true), (2, false), (1, false)]);
        assert_eq!(statement.balance.breakdown[0].expense_id, ExpenseId::new(3));
    }

    #[test]
    fn test_member_statement_unknown_member() {
        assert_eq!(
            member_statement(&seeded_group(), MemberId::new(99)),
            Err(CoreError::MemberNotFound(MemberId::new(99)))
        );
    }

    #[test]
    fn test_expense_summaries() {
        let rows = expense_summaries(&seeded_group());
        let ids: Vec<i64> = rows.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(rows[1].payers_count, 2);
        assert_eq!(rows[1].shares_count, 4);
        assert_eq!(rows[0].category, ExpenseCategory::Food);
    }

    #[test]
    fn test_expense_details() {
        let details = expense_details(&seeded_group(), ExpenseId::new(2)).unwrap();
        assert_eq!(details.payments.len(), 2);
        assert_eq!(details.payments[0].member_name, "Mohammed");
        assert_eq!(details.shares[3].member_name, "Khalid");
        assert_eq!(details.shares[3].amount, Money::from_major(50));

        assert_eq!(
            expense_details(&seeded_group(), ExpenseId::new(7)),
            Err(CoreError::ExpenseNotFound(ExpenseId::new(7)))
        );
    }

    #[test]
    fn test_record_rejects_bad_input() {
        let group = seeded_group();
        let base = NewExpense {
            description: "Taxi".to_string(),
            amount: Money::from_major(40),
            category: ExpenseCategory::Transportation,
            shares: equal_shares(),
            payments: pays(&[(1, 40)]),
        };

        let err = record_expense(&group, ExpenseId::new(1), base.clone(), now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Duplicate { .. })));

        let blank = NewExpense {
            description: "  ".to_string(),
            ..base.clone()
        };
        let err = record_expense(&group, ExpenseId::new(9), blank, now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Required { .. })));

        let stranger = NewExpense {
            payments: pays(&[(8, 40)]),
            ..base.clone()
        };
        assert_eq!(
            record_expense(&group, ExpenseId::new(9), stranger, now()),
            Err(CoreError::MemberNotFound(MemberId::new(8)))
        );

        let underpaid = NewExpense {
            payments: pays(&[(1, 30)]),
            ..base
        };
        let err = record_expense(&group, ExpenseId::new(9), underpaid, now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Consistency(ConsistencyError::PaymentTotalMismatch { .. })
        ));
    }

    #[test]
    fn test_inconsistent_snapshot_cannot_be_settled() {
        let mut group = seeded_group();
        group.expenses[0].shares[0].amount = Money::from_major(100);

        let err = balance_sheet(&group).unwrap_err();
        assert_eq!(
            err,
            CoreError::Consistency(ConsistencyError::ShareTotalMismatch {
                expected: Money::from_major(500),
                allocated: Money::from_major(475),
            })
        );
    }

    #[test]
    fn test_offsetting_payment_errors_are_not_settled() {
        // Groceries overpaid by 10.00, dinner underpaid by 10.00: the group
        // still nets to zero, but neither expense is consistent
        let mut group = seeded_group();
        group.expenses[0].payments[0].amount = Money::from_major(510);
        group.expenses[2].payments[0].amount = Money::from_major(290);

        let expected = || {
            CoreError::Consistency(ConsistencyError::PaymentTotalMismatch {
                expected: Money::from_major(500),
                paid: Money::from_major(510),
            })
        };
        assert_eq!(balance_sheet(&group).unwrap_err(), expected());
        assert_eq!(settlement_plan(&group).unwrap_err(), expected());
        assert_eq!(
            member_statement(&group, MemberId::new(1)).unwrap_err(),
            expected()
        );
    }

    #[test]
    fn test_oversized_expenses_rejected() {
        let mut group = seeded_group();
        let huge = Money::from_cents(i64::MAX / 2 + 2);
        for expense in group.expenses.iter_mut().take(2) {
            expense.expense.amount = huge;
            expense.payments.truncate(1);
            expense.payments[0].amount = huge;
            expense.shares.truncate(1);
            expense.shares[0].amount = huge;
        }

        let err = balance_sheet(&group).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
    }
}
