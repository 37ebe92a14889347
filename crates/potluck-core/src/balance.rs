//! # Balance Aggregation
//!
//! Folds every expense of a snapshot into per-member totals.
//!
//! ## What a Balance Means
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   total_paid   = Σ payments made by the member                         │
//! │   total_share  = Σ shares allocated to the member                      │
//! │   net          = total_paid − total_share                              │
//! │                                                                         │
//! │   net > 0   the group owes the member         (creditor)               │
//! │   net < 0   the member owes the group         (debtor)                 │
//! │   net = 0   settled                                                     │
//! │                                                                         │
//! │   Every expense pays out exactly what it shares out, so across the     │
//! │   whole group Σ net = 0.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two views are produced here:
//! - [`aggregate`]: one [`MemberBalance`] per member, with a per-expense
//!   breakdown
//! - [`detail`]: one member's history as a list of [`MemberTransaction`]s

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{ExpenseCategory, ExpenseId, ExpenseSnapshot, Member, MemberId, ShareRule};

// =============================================================================
// Output Types
// =============================================================================

/// One member's involvement in one expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseBreakdown {
    pub expense_id: ExpenseId,
    pub description: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub total_amount: Money,
    /// What this member paid toward the expense (zero if nothing).
    pub paid_amount: Money,
    /// This member's share (zero if none).
    pub share_amount: Money,
    /// The share rule, `None` when the member only paid.
    pub rule: Option<ShareRule>,
}

/// Where one member stands across the whole group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MemberBalance {
    pub member_id: MemberId,
    pub display_name: String,
    pub total_paid: Money,
    pub total_share: Money,
    /// `total_paid − total_share`
    pub net: Money,
    pub breakdown: Vec<ExpenseBreakdown>,
}

impl MemberBalance {
    fn empty(member: &Member) -> Self {
        MemberBalance {
            member_id: member.id,
            display_name: member.display_name.clone(),
            total_paid: Money::zero(),
            total_share: Money::zero(),
            net: Money::zero(),
            breakdown: Vec::new(),
        }
    }
}

/// Whether a history entry records money paid or a share owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionKind {
    Payment,
    Share { rule: ShareRule },
}

/// One line of a member's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MemberTransaction {
    pub expense_id: ExpenseId,
    pub description: String,
    pub category: ExpenseCategory,
    /// Payment time for payments, expense creation time for shares.
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub kind: TransactionKind,
    /// Other payers (for a payment) or other share holders (for a share).
    pub other_participants: Vec<String>,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Computes the balance of every member in `members`.
///
/// Members without any activity are present with zero totals and an empty
/// breakdown. Breakdown entries follow the order of `expenses`.
///
/// ## Errors
/// [`CoreError::MemberNotFound`] if a share or payment references a member
/// that is not in `members`.
pub fn aggregate(
    members: &[Member],
    expenses: &[ExpenseSnapshot],
) -> CoreResult<BTreeMap<MemberId, MemberBalance>> {
    let mut balances: BTreeMap<MemberId, MemberBalance> = members
        .iter()
        .map(|m| (m.id, MemberBalance::empty(m)))
        .collect();

    for snapshot in expenses {
        let expense = &snapshot.expense;
        let mut involved = BTreeSet::new();

        for payment in &snapshot.payments {
            let balance = balances
                .get_mut(&payment.member_id)
                .ok_or(CoreError::MemberNotFound(payment.member_id))?;
            balance.total_paid += payment.amount;
            involved.insert(payment.member_id);
        }

        for share in &snapshot.shares {
            let balance = balances
                .get_mut(&share.member_id)
                .ok_or(CoreError::MemberNotFound(share.member_id))?;
            balance.total_share += share.amount;
            involved.insert(share.member_id);
        }

        for member_id in involved {
            let share = snapshot.share_of(member_id);
            let entry = ExpenseBreakdown {
                expense_id: expense.id,
                description: expense.description.clone(),
                date: expense.created_at,
                total_amount: expense.amount,
                paid_amount: snapshot.paid_by(member_id),
                share_amount: share.map(|s| s.amount).unwrap_or_default(),
                rule: share.map(|s| s.rule),
            };
            // Presence checked above while summing
            if let Some(balance) = balances.get_mut(&member_id) {
                balance.breakdown.push(entry);
            }
        }

        trace!(expense_id = %expense.id, "Expense folded into balances");
    }

    for balance in balances.values_mut() {
        balance.net = balance.total_paid - balance.total_share;
    }

    debug!(
        members = balances.len(),
        expenses = expenses.len(),
        "Aggregated member balances"
    );

    Ok(balances)
}

// =============================================================================
// Member History
// =============================================================================

/// Lists every payment and share of one member, in the order of `expenses`.
///
/// For each expense the member took part in, a payment entry (if they paid)
/// comes before the share entry (if they hold one). Several payments by the
/// same member on one expense are reported as a single entry dated at the
/// earliest of them.
///
/// ## Errors
/// [`CoreError::MemberNotFound`] if `member_id` is not in `members`, or if an
/// expense the member took part in references an unknown member.
pub fn detail(
    member_id: MemberId,
    members: &[Member],
    expenses: &[ExpenseSnapshot],
) -> CoreResult<Vec<MemberTransaction>> {
    let names: HashMap<MemberId, &str> = members
        .iter()
        .map(|m| (m.id, m.display_name.as_str()))
        .collect();

    if !names.contains_key(&member_id) {
        return Err(CoreError::MemberNotFound(member_id));
    }

    let name_of = |id: MemberId| -> CoreResult<String> {
        names
            .get(&id)
            .map(|name| name.to_string())
            .ok_or(CoreError::MemberNotFound(id))
    };

    let mut transactions = Vec::new();

    for snapshot in expenses.iter().filter(|e| e.involves(member_id)) {
        let expense = &snapshot.expense;

        let own_payments: Vec<_> = snapshot
            .payments
            .iter()
            .filter(|p| p.member_id == member_id)
            .collect();

        if let Some(first_paid) = own_payments.iter().map(|p| p.paid_at).min() {
            let others = distinct_others(snapshot.payments.iter().map(|p| p.member_id), member_id)
                .into_iter()
                .map(&name_of)
                .collect::<CoreResult<Vec<_>>>()?;

            transactions.push(MemberTransaction {
                expense_id: expense.id,
                description: expense.description.clone(),
                category: expense.category,
                date: first_paid,
                amount: own_payments.iter().map(|p| p.amount).sum(),
                kind: TransactionKind::Payment,
                other_participants: others,
            });
        }

        if let Some(share) = snapshot.share_of(member_id) {
            let others = distinct_others(snapshot.shares.iter().map(|s| s.member_id), member_id)
                .into_iter()
                .map(&name_of)
                .collect::<CoreResult<Vec<_>>>()?;

            transactions.push(MemberTransaction {
                expense_id: expense.id,
                description: expense.description.clone(),
                category: expense.category,
                date: expense.created_at,
                amount: share.amount,
                kind: TransactionKind::Share { rule: share.rule },
                other_participants: others,
            });
        }
    }

    debug!(
        member_id = %member_id,
        transactions = transactions.len(),
        "Built member history"
    );

    Ok(transactions)
}

/// Ids other than `me`, first occurrence order, no repeats.
fn distinct_others(ids: impl Iterator<Item = MemberId>, me: MemberId) -> Vec<MemberId> {
    let mut seen = BTreeSet::new();
    ids.filter(|&id| id != me && seen.insert(id)).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::allocate;
    use crate::types::{Expense, GroupId, PaymentRecord, Percentage, ResolvedShare, ShareIntent};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap()
    }

    fn members() -> Vec<Member> {
        vec![
            Member::new(1, "Azzam"),
            Member::new(2, "Mohammed"),
            Member::new(3, "Ahmed"),
            Member::new(4, "Khalid"),
        ]
    }

    fn expense_with(
        id: i64,
        cents: i64,
        intents: &[ShareIntent],
        payments: &[(i64, i64)],
        day: u32,
    ) -> ExpenseSnapshot {
        let expense = Expense {
            id: ExpenseId::new(id),
            group_id: GroupId::new(1),
            description: format!("Expense {id}"),
            amount: Money::from_cents(cents),
            category: ExpenseCategory::Food,
            created_at: at(day),
        };
        let payments: Vec<PaymentRecord> = payments
            .iter()
            .map(|&(member, cents)| PaymentRecord {
                member_id: MemberId::new(member),
                amount: Money::from_cents(cents),
                paid_at: at(day),
            })
            .collect();
        let shares = allocate(&expense, intents, &payments).unwrap();
        ExpenseSnapshot {
            expense,
            shares,
            payments,
        }
    }

    fn equal_all() -> Vec<ShareIntent> {
        (1..=4).map(|id| ShareIntent::equal(MemberId::new(id))).collect()
    }

    /// Scenario A: 500.00 paid by member 1, split equally among four.
    fn scenario_a() -> ExpenseSnapshot {
        expense_with(1, 50000, &equal_all(), &[(1, 50000)], 1)
    }

    #[test]
    fn test_equal_split_balances() {
        let balances = aggregate(&members(), &[scenario_a()]).unwrap();

        assert_eq!(balances[&MemberId::new(1)].net, Money::from_major(375));
        for id in 2..=4 {
            let b = &balances[&MemberId::new(id)];
            assert_eq!(b.total_paid, Money::zero());
            assert_eq!(b.total_share, Money::from_major(125));
            assert_eq!(b.net, Money::from_major(-125));
        }
    }

    #[test]
    fn test_percentage_split_balances() {
        let intents = vec![
            ShareIntent::percentage(MemberId::new(1), Percentage::from_whole(30)),
            ShareIntent::percentage(MemberId::new(2), Percentage::from_whole(20)),
            ShareIntent::percentage(MemberId::new(3), Percentage::from_whole(25)),
            ShareIntent::percentage(MemberId::new(4), Percentage::from_whole(25)),
        ];
        let expense = expense_with(2, 30000, &intents, &[(4, 30000)], 2);
        let balances = aggregate(&members(), &[expense]).unwrap();

        let nets: Vec<i64> = balances.values().map(|b| b.net.cents()).collect();
        assert_eq!(nets, vec![-9000, -6000, -7500, 22500]);
    }

    #[test]
    fn test_breakdown_entries() {
        // Member 2 pays half of a two-person expense they do not share in
        let intents = vec![
            ShareIntent::equal(MemberId::new(1)),
            ShareIntent::equal(MemberId::new(3)),
        ];
        let paid_only = expense_with(2, 20000, &intents, &[(2, 10000), (3, 10000)], 3);
        let balances = aggregate(&members(), &[scenario_a(), paid_only]).unwrap();

        let two = &balances[&MemberId::new(2)];
        assert_eq!(two.breakdown.len(), 2);
        assert_eq!(two.breakdown[0].expense_id, ExpenseId::new(1));
        assert_eq!(two.breakdown[0].rule, Some(ShareRule::Equal));
        assert_eq!(two.breakdown[1].paid_amount, Money::from_major(100));
        assert_eq!(two.breakdown[1].share_amount, Money::zero());
        assert_eq!(two.breakdown[1].rule, None);

        let four = &balances[&MemberId::new(4)];
        assert_eq!(four.breakdown.len(), 1);
    }

    #[test]
    fn test_inactive_member_has_zero_balance() {
        let mut group = members();
        group.push(Member::new(5, "Visitor"));
        let balances = aggregate(&group, &[scenario_a()]).unwrap();

        let visitor = &balances[&MemberId::new(5)];
        assert!(visitor.net.is_zero());
        assert!(visitor.breakdown.is_empty());
    }

    #[test]
    fn test_unknown_member_is_reported() {
        let mut expense = scenario_a();
        expense.shares.push(ResolvedShare {
            member_id: MemberId::new(42),
            rule: ShareRule::Equal,
            amount: Money::zero(),
        });
        assert_eq!(
            aggregate(&members(), &[expense]),
            Err(CoreError::MemberNotFound(MemberId::new(42)))
        );
    }

    #[test]
    fn test_detail_payment_before_share() {
        let history = detail(MemberId::new(1), &members(), &[scenario_a()]).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, TransactionKind::Payment);
        assert_eq!(history[0].amount, Money::from_major(500));
        assert!(history[0].other_participants.is_empty());

        assert_eq!(
            history[1].kind,
            TransactionKind::Share {
                rule: ShareRule::Equal
            }
        );
        assert_eq!(history[1].amount, Money::from_major(125));
        assert_eq!(
            history[1].other_participants,
            vec!["Mohammed", "Ahmed", "Khalid"]
        );
    }

    #[test]
    fn test_detail_merges_repeat_payments() {
        let mut expense = expense_with(3, 20000, &equal_all(), &[(2, 5000), (3, 15000)], 5);
        expense.payments.insert(
            0,
            PaymentRecord {
                member_id: MemberId::new(2),
                amount: Money::zero(),
                paid_at: at(5) - Duration::hours(1),
            },
        );

        let history = detail(MemberId::new(2), &members(), &[expense]).unwrap();
        assert_eq!(history[0].amount, Money::from_major(50));
        assert_eq!(history[0].date, at(5) - Duration::hours(1));
        assert_eq!(history[0].other_participants, vec!["Ahmed"]);
    }

    #[test]
    fn test_detail_skips_uninvolved_expenses() {
        let intents = vec![ShareIntent::equal(MemberId::new(2))];
        let other = expense_with(4, 1000, &intents, &[(2, 1000)], 6);

        let history = detail(MemberId::new(4), &members(), &[other]).unwrap();
        assert!(history.is_empty());

        assert_eq!(
            detail(MemberId::new(9), &members(), &[]),
            Err(CoreError::MemberNotFound(MemberId::new(9)))
        );
    }

    #[test]
    fn test_transaction_wire_format() {
        let history = detail(MemberId::new(3), &members(), &[scenario_a()]).unwrap();
        let json = serde_json::to_value(&history[0]).unwrap();
        assert_eq!(json["kind"]["type"], "share");
        assert_eq!(json["kind"]["rule"]["kind"], "equal");
        assert_eq!(json["category"], "food");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: with balanced expenses, nets always sum to zero.
        #[test]
        fn nets_sum_to_zero(
            expenses in prop::collection::vec((1i64..1_000_000, 1i64..=4, 1usize..=4), 0..20)
        ) {
            let snapshots: Vec<ExpenseSnapshot> = expenses
                .iter()
                .enumerate()
                .map(|(idx, &(cents, payer, sharers))| {
                    let intents: Vec<ShareIntent> = (1..=sharers as i64)
                        .map(|id| ShareIntent::equal(MemberId::new(id)))
                        .collect();
                    expense_with(idx as i64 + 1, cents, &intents, &[(payer, cents)], 1)
                })
                .collect();

            let balances = aggregate(&members(), &snapshots).unwrap();
            let total: Money = balances.values().map(|b| b.net).sum();
            prop_assert!(total.is_zero());

            let paid: Money = balances.values().map(|b| b.total_paid).sum();
            let owed: Money = balances.values().map(|b| b.total_share).sum();
            prop_assert_eq!(paid, owed);
        }
    }
}
