//! # Demo Group
//!
//! A ready-made snapshot for trying the CLI out.
//!
//! ## Usage
//! ```bash
//! # Expenses dated relative to now
//! potluck seed > group.json
//!
//! # Reproducible dates
//! potluck seed --as-of 2024-09-10T18:00:00Z > group.json
//! ```
//!
//! ## Contents
//! Four flatmates and three expenses:
//! - Weekly groceries, 500.00, paid by Azzam, split equally (5 days ago)
//! - Electricity bill, 200.00, paid half each by Mohammed and Ahmed,
//!   split equally (3 days ago)
//! - Shared dinner, 300.00, paid by Khalid, split 30/20/25/25 % (1 day ago)
//!
//! Every expense goes through `record_expense`, so shares are allocated by
//! the same code path real input takes.

use chrono::{DateTime, Duration, Utc};
use potluck_core::ledger::record_expense;
use potluck_core::{
    CoreResult, ExpenseCategory, ExpenseId, GroupId, GroupSnapshot, Member, MemberId, Money,
    NewExpense, NewPayment, ShareIntentInput, ShareKind,
};
use tracing::debug;

const MEMBERS: &[(i64, &str)] = &[(1, "Azzam"), (2, "Mohammed"), (3, "Ahmed"), (4, "Khalid")];

/// (description, amount, category, days ago, payments, percentage split)
type SeedExpense = (
    &'static str,
    i64,
    ExpenseCategory,
    i64,
    &'static [(i64, i64)],
    Option<&'static [(i64, u32)]>,
);

const EXPENSES: &[SeedExpense] = &[
    ("Weekly groceries", 500, ExpenseCategory::Food, 5, &[(1, 500)], None),
    (
        "Electricity bill",
        200,
        ExpenseCategory::Utilities,
        3,
        &[(2, 100), (3, 100)],
        None,
    ),
    (
        "Shared dinner",
        300,
        ExpenseCategory::Food,
        1,
        &[(4, 300)],
        Some(&[(1, 3000), (2, 2000), (3, 2500), (4, 2500)]),
    ),
];

/// Builds the demo group with expenses dated relative to `as_of`.
pub fn demo_group(as_of: DateTime<Utc>) -> CoreResult<GroupSnapshot> {
    let mut group = GroupSnapshot {
        group_id: GroupId::new(1),
        group_name: "Student Housing".to_string(),
        members: MEMBERS.iter().map(|&(id, name)| Member::new(id, name)).collect(),
        expenses: Vec::new(),
    };

    for (idx, &(description, major, category, days_ago, payments, split)) in
        EXPENSES.iter().enumerate()
    {
        let shares = match split {
            Some(split) => split
                .iter()
                .map(|&(id, bps)| ShareIntentInput {
                    member_id: MemberId::new(id),
                    kind: ShareKind::Percentage,
                    amount: None,
                    percentage_bps: Some(bps),
                })
                .collect(),
            None => MEMBERS
                .iter()
                .map(|&(id, _)| ShareIntentInput {
                    member_id: MemberId::new(id),
                    kind: ShareKind::Equal,
                    amount: None,
                    percentage_bps: None,
                })
                .collect(),
        };

        let new = NewExpense {
            description: description.to_string(),
            amount: Money::from_major(major),
            category,
            shares,
            payments: payments
                .iter()
                .map(|&(id, major)| NewPayment {
                    member_id: MemberId::new(id),
                    amount: Money::from_major(major),
                })
                .collect(),
        };

        let expense = record_expense(
            &group,
            ExpenseId::new(idx as i64 + 1),
            new,
            as_of - Duration::days(days_ago),
        )?;
        group.expenses.push(expense);
    }

    debug!(expenses = group.expenses.len(), "Demo group seeded");
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use potluck_core::ledger::balance_sheet;

    #[test]
    fn test_demo_group_is_consistent() {
        let as_of = Utc.with_ymd_and_hms(2024, 9, 10, 18, 0, 0).unwrap();
        let group = demo_group(as_of).unwrap();

        assert_eq!(group.expenses.len(), 3);
        assert_eq!(group.total_expenses(), Money::from_major(1000));
        assert_eq!(
            group.expenses[2].shares.iter().map(|s| s.amount.cents()).collect::<Vec<_>>(),
            vec![9000, 6000, 7500, 7500]
        );
        assert_eq!(group.expenses[0].expense.created_at, as_of - Duration::days(5));

        let sheet = balance_sheet(&group).unwrap();
        assert_eq!(sheet.settlements.len(), 3);
    }
}
