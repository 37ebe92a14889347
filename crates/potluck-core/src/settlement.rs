//! # Settlement Planning
//!
//! Turns net balances into a list of "X pays Y" transfers.
//!
//! ## Greedy Matching
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Debtors   (net < 0)  sorted ascending   (largest debt first)          │
//! │  Creditors (net > 0)  sorted descending  (largest credit first)        │
//! │  Ties                 lower member id first                            │
//! │                                                                         │
//! │  for each debtor:                                                       │
//! │      while debt remains:                                                │
//! │          pay min(debt, creditor's remaining credit) to the creditor    │
//! │          creditor exhausted → move cursor to the next creditor         │
//! │                                                                         │
//! │  Members at zero never appear in a transfer.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```text
//! Nets:  A +100   B +50   C −120   D −30
//!
//!   C → A  100.00      (A exhausted)
//!   C → B   20.00      (C settled)
//!   D → B   30.00      (D settled, B exhausted)
//! ```
//!
//! The plan is deterministic and never needs more than
//! `debtors + creditors − 1` transfers, but it is not guaranteed to be the
//! smallest possible set of transfers.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{ConsistencyError, CoreResult};
use crate::money::Money;
use crate::types::{Member, MemberId};

/// One instruction of a settlement plan: `from` pays `to` the `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettlementTransfer {
    pub from_member_id: MemberId,
    pub from_name: String,
    pub to_member_id: MemberId,
    pub to_name: String,
    /// Always positive.
    pub amount: Money,
}

impl SettlementTransfer {
    fn new(from: &Member, to: &Member, amount: Money) -> Self {
        SettlementTransfer {
            from_member_id: from.id,
            from_name: from.display_name.clone(),
            to_member_id: to.id,
            to_name: to.display_name.clone(),
            amount,
        }
    }
}

/// Accumulator threaded through the debtor fold.
struct PlanState {
    /// Credit still open, parallel to the sorted creditor list.
    remaining: Vec<Money>,
    /// First creditor with credit left.
    cursor: usize,
    transfers: Vec<SettlementTransfer>,
}

/// Plans the transfers that bring every balance to zero.
///
/// ## Errors
/// [`ConsistencyError::UnbalancedLedger`] if the nets do not sum to zero.
///
/// ## Example
/// ```rust
/// use potluck_core::money::Money;
/// use potluck_core::settlement::plan;
/// use potluck_core::types::Member;
///
/// let ana = Member::new(1, "Ana");
/// let ben = Member::new(2, "Ben");
/// let transfers = plan([(&ana, Money::from_major(40)), (&ben, Money::from_major(-40))]).unwrap();
///
/// assert_eq!(transfers.len(), 1);
/// assert_eq!(transfers[0].from_name, "Ben");
/// assert_eq!(transfers[0].amount, Money::from_major(40));
/// ```
pub fn plan<'a, I>(balances: I) -> CoreResult<Vec<SettlementTransfer>>
where
    I: IntoIterator<Item = (&'a Member, Money)>,
{
    let balances: Vec<(&Member, Money)> = balances.into_iter().collect();

    let residual: Money = balances.iter().map(|(_, net)| *net).sum();
    if !residual.is_zero() {
        return Err(ConsistencyError::UnbalancedLedger { residual }.into());
    }

    let mut debtors: Vec<(&Member, Money)> = balances
        .iter()
        .copied()
        .filter(|(_, net)| net.is_negative())
        .collect();
    debtors.sort_by_key(|(member, net)| (*net, member.id));

    let mut creditors: Vec<(&Member, Money)> = balances
        .iter()
        .copied()
        .filter(|(_, net)| net.is_positive())
        .collect();
    creditors.sort_by_key(|(member, net)| (Reverse(*net), member.id));

    let initial = PlanState {
        remaining: creditors.iter().map(|(_, net)| *net).collect(),
        cursor: 0,
        transfers: Vec::with_capacity(debtors.len() + creditors.len()),
    };

    let settled = debtors.iter().fold(initial, |mut state, &(debtor, net)| {
        let mut owed = -net;

        while owed.is_positive() && state.cursor < creditors.len() {
            let (creditor, _) = creditors[state.cursor];
            let amount = owed.min(state.remaining[state.cursor]);

            state
                .transfers
                .push(SettlementTransfer::new(debtor, creditor, amount));
            owed -= amount;
            state.remaining[state.cursor] -= amount;

            if state.remaining[state.cursor].is_zero() {
                state.cursor += 1;
            }
        }

        state
    });

    debug!(
        debtors = debtors.len(),
        creditors = creditors.len(),
        transfers = settled.transfers.len(),
        "Planned settlement"
    );

    Ok(settled.transfers)
}

/// Applies a plan to a set of nets: the payer's net rises, the payee's falls.
///
/// A correct plan leaves every value at zero.
pub fn apply_transfers(
    balances: &BTreeMap<MemberId, Money>,
    transfers: &[SettlementTransfer],
) -> BTreeMap<MemberId, Money> {
    let mut after = balances.clone();
    for transfer in transfers {
        *after.entry(transfer.from_member_id).or_default() += transfer.amount;
        *after.entry(transfer.to_member_id).or_default() -= transfer.amount;
    }
    after
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use proptest::prelude::*;

    fn group(n: i64) -> Vec<Member> {
        (1..=n).map(|id| Member::new(id, format!("M{id}"))).collect()
    }

    fn nets(members: &[Member], cents: &[i64]) -> Vec<(Member, Money)> {
        members
            .iter()
            .cloned()
            .zip(cents.iter().map(|&c| Money::from_cents(c)))
            .collect()
    }

    fn run(pairs: &[(Member, Money)]) -> CoreResult<Vec<SettlementTransfer>> {
        plan(pairs.iter().map(|(m, net)| (m, *net)))
    }

    fn summary(transfers: &[SettlementTransfer]) -> Vec<(i64, i64, i64)> {
        transfers
            .iter()
            .map(|t| (t.from_member_id.get(), t.to_member_id.get(), t.amount.cents()))
            .collect()
    }

    #[test]
    fn test_single_payer_equal_split() {
        let pairs = nets(&group(4), &[37500, -12500, -12500, -12500]);
        let transfers = run(&pairs).unwrap();
        assert_eq!(
            summary(&transfers),
            vec![(2, 1, 12500), (3, 1, 12500), (4, 1, 12500)]
        );
        assert_eq!(transfers[0].to_name, "M1");
    }

    #[test]
    fn test_single_payer_percentage_split() {
        let pairs = nets(&group(4), &[-9000, -6000, -7500, 22500]);
        let transfers = run(&pairs).unwrap();
        assert_eq!(
            summary(&transfers),
            vec![(1, 4, 9000), (3, 4, 7500), (2, 4, 6000)]
        );
    }

    #[test]
    fn test_debtor_spans_creditors() {
        let pairs = nets(&group(4), &[10000, 5000, -12000, -3000]);
        let transfers = run(&pairs).unwrap();
        assert_eq!(
            summary(&transfers),
            vec![(3, 1, 10000), (3, 2, 2000), (4, 2, 3000)]
        );
    }

    #[test]
    fn test_ties_broken_by_member_id() {
        let reversed: Vec<Member> = (1..=5)
            .rev()
            .map(|id| Member::new(id, format!("M{id}")))
            .collect();
        let pairs = nets(&reversed, &[50000, -12500, -12500, -12500, -12500]);
        let transfers = run(&pairs).unwrap();
        assert_eq!(
            summary(&transfers),
            vec![(1, 5, 12500), (2, 5, 12500), (3, 5, 12500), (4, 5, 12500)]
        );

        let creditors_reversed: Vec<Member> = group(3).into_iter().rev().collect();
        let pairs = nets(&creditors_reversed, &[5000, 5000, -10000]);
        assert_eq!(
            summary(&run(&pairs).unwrap()),
            vec![(1, 2, 5000), (1, 3, 5000)]
        );
    }

    #[test]
    fn test_zero_net_member_never_transfers() {
        let pairs = nets(&group(3), &[5000, 0, -5000]);
        let transfers = run(&pairs).unwrap();
        assert_eq!(summary(&transfers), vec![(3, 1, 5000)]);

        let everyone_even = nets(&group(3), &[0, 0, 0]);
        assert!(run(&everyone_even).unwrap().is_empty());
    }

    #[test]
    fn test_unbalanced_input_rejected() {
        let pairs = nets(&group(2), &[5000, -4999]);
        assert_eq!(
            run(&pairs),
            Err(CoreError::Consistency(ConsistencyError::UnbalancedLedger {
                residual: Money::from_cents(1)
            }))
        );
    }

    #[test]
    fn test_apply_transfers_zeroes_balances() {
        let pairs = nets(&group(4), &[10000, 5000, -12000, -3000]);
        let transfers = run(&pairs).unwrap();
        let before: BTreeMap<MemberId, Money> = pairs.iter().map(|(m, n)| (m.id, *n)).collect();

        let after = apply_transfers(&before, &transfers);
        assert!(after.values().all(Money::is_zero));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: any balanced set of nets is settled exactly, each debtor
        /// pays precisely their debt, and the plan is reproducible.
        #[test]
        fn plan_settles_every_balance(raw in prop::collection::vec(-1_000_000i64..1_000_000, 1..12)) {
            let members = group(raw.len() as i64 + 1);
            let mut cents = raw.clone();
            cents.push(-raw.iter().sum::<i64>());
            let pairs = nets(&members, &cents);

            let transfers = run(&pairs).unwrap();
            prop_assert!(transfers.iter().all(|t| t.amount.is_positive()));

            let before: BTreeMap<MemberId, Money> = pairs.iter().map(|(m, n)| (m.id, *n)).collect();
            let after = apply_transfers(&before, &transfers);
            prop_assert!(after.values().all(Money::is_zero));

            for (member, net) in pairs.iter().filter(|(_, n)| n.is_negative()) {
                let paid: Money = transfers
                    .iter()
                    .filter(|t| t.from_member_id == member.id)
                    .map(|t| t.amount)
                    .sum();
                prop_assert_eq!(paid, -*net);
            }

            let active = pairs.iter().filter(|(_, n)| !n.is_zero()).count();
            prop_assert!(transfers.len() <= active.saturating_sub(1));

            prop_assert_eq!(run(&pairs).unwrap(), transfers);
        }
    }
}
