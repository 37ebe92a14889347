//! # Domain Types
//!
//! Core domain types used throughout Potluck.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         GroupSnapshot                                   │
//! │   group_id, group_name                                                  │
//! │   ┌─────────────────┐   ┌───────────────────────────────────────────┐  │
//! │   │    Member[]     │   │             ExpenseSnapshot[]             │  │
//! │   │  ─────────────  │   │  ───────────────────────────────────────  │  │
//! │   │  id             │◄──┤  Expense (id, amount, category, ...)      │  │
//! │   │  display_name   │   │  ResolvedShare[] (member_id, rule, amt)   │  │
//! │   └─────────────────┘◄──┤  PaymentRecord[] (member_id, amt, time)   │  │
//! │                         └───────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshots, Not Object Graphs
//! Shares and payments refer to members by [`MemberId`] only. Nothing holds a
//! back-reference; everything is a plain value that the caller assembled from
//! one consistent read and passes in by reference.
//!
//! ## Wire Input vs Domain Types
//! Requests arrive in a loose shape ([`ShareIntentInput`], kind tag plus
//! optional fields). They are converted once, with `TryFrom`, into the closed
//! [`ShareRule`] enum where a percentage share without a percentage cannot be
//! expressed at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_AMOUNT_CENTS;

// =============================================================================
// Identifiers
// =============================================================================

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
        )]
        #[serde(transparent)]
        #[ts(export)]
        pub struct $name(i64);

        impl $name {
            #[inline]
            pub const fn new(id: i64) -> Self {
                $name(id)
            }

            #[inline]
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Group-scoped member identity (not the underlying account).
    MemberId
);
id_type!(ExpenseId);
id_type!(GroupId);

// =============================================================================
// Percentage
// =============================================================================

/// Share percentage in basis points.
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 3333 bps = 33.33%, so thirds are expressible without floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "u32", into = "u32")]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    /// 100% in basis points.
    pub const FULL_BPS: u32 = 10_000;

    /// Creates a validated percentage (1..=10000 bps).
    pub fn new(bps: u32) -> Result<Self, ValidationError> {
        if bps == 0 || bps > Self::FULL_BPS {
            return Err(ValidationError::OutOfRange {
                field: "percentage_bps".to_string(),
                min: 1,
                max: Self::FULL_BPS as i64,
            });
        }
        Ok(Percentage(bps))
    }

    /// Creates a percentage from basis points without range checks.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Creates a percentage from a whole number (30 → 30%).
    #[inline]
    pub const fn from_whole(pct: u32) -> Self {
        Percentage(pct * 100)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Percentage {
    type Error = ValidationError;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        Percentage::new(bps)
    }
}

impl From<Percentage> for u32 {
    fn from(pct: Percentage) -> Self {
        pct.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Member
// =============================================================================

/// A participant in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Member {
    pub id: MemberId,
    /// Name used in reports and settlement instructions.
    pub display_name: String,
}

impl Member {
    pub fn new(id: i64, display_name: impl Into<String>) -> Self {
        Member {
            id: MemberId::new(id),
            display_name: display_name.into(),
        }
    }
}

// =============================================================================
// Expense Category
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    #[serde(alias = "Food")]
    Food,
    #[serde(alias = "Utilities")]
    Utilities,
    #[serde(alias = "Entertainment")]
    Entertainment,
    #[serde(alias = "Transportation")]
    Transportation,
    #[serde(alias = "Shopping")]
    Shopping,
    #[default]
    #[serde(alias = "Other")]
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 6] = [
        ExpenseCategory::Food,
        ExpenseCategory::Utilities,
        ExpenseCategory::Entertainment,
        ExpenseCategory::Transportation,
        ExpenseCategory::Shopping,
        ExpenseCategory::Other,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Food => "food",
            ExpenseCategory::Utilities => "utilities",
            ExpenseCategory::Entertainment => "entertainment",
            ExpenseCategory::Transportation => "transportation",
            ExpenseCategory::Shopping => "shopping",
            ExpenseCategory::Other => "other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ExpenseCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: ExpenseCategory::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Share Rules
// =============================================================================

/// Tag of a share rule, as it appears in loose wire input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShareKind {
    #[serde(alias = "Equal")]
    Equal,
    #[serde(alias = "Fixed")]
    Fixed,
    #[serde(alias = "Percentage")]
    Percentage,
}

impl fmt::Display for ShareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShareKind::Equal => "equal",
            ShareKind::Fixed => "fixed",
            ShareKind::Percentage => "percentage",
        })
    }
}

/// How a member's portion of an expense is determined.
///
/// ## Variants
/// ```text
/// Equal                         amount / number of shares
/// Fixed { amount }              amount verbatim
/// Percentage { percentage_bps } amount × bps / 10000 (half to even)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShareRule {
    Equal,
    Fixed { amount: Money },
    Percentage { percentage_bps: Percentage },
}

impl ShareRule {
    pub const fn kind(&self) -> ShareKind {
        match self {
            ShareRule::Equal => ShareKind::Equal,
            ShareRule::Fixed { .. } => ShareKind::Fixed,
            ShareRule::Percentage { .. } => ShareKind::Percentage,
        }
    }

    /// The declared percentage, if this is a percentage rule.
    pub const fn percentage(&self) -> Option<Percentage> {
        match self {
            ShareRule::Percentage { percentage_bps } => Some(*percentage_bps),
            _ => None,
        }
    }
}

/// A member's declared share of an expense, before amounts are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShareIntent {
    pub member_id: MemberId,
    pub rule: ShareRule,
}

impl ShareIntent {
    pub const fn equal(member_id: MemberId) -> Self {
        ShareIntent {
            member_id,
            rule: ShareRule::Equal,
        }
    }

    pub const fn fixed(member_id: MemberId, amount: Money) -> Self {
        ShareIntent {
            member_id,
            rule: ShareRule::Fixed { amount },
        }
    }

    pub const fn percentage(member_id: MemberId, pct: Percentage) -> Self {
        ShareIntent {
            member_id,
            rule: ShareRule::Percentage {
                percentage_bps: pct,
            },
        }
    }
}

/// Loose wire form of a share intent.
///
/// ## Example
/// ```json
/// { "member_id": 3, "kind": "percentage", "percentage_bps": 2500 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShareIntentInput {
    pub member_id: MemberId,
    pub kind: ShareKind,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub percentage_bps: Option<u32>,
}

impl TryFrom<ShareIntentInput> for ShareIntent {
    type Error = ValidationError;

    fn try_from(input: ShareIntentInput) -> Result<Self, Self::Error> {
        let missing = |field: &str| ValidationError::MissingRuleField {
            member_id: input.member_id,
            kind: input.kind.to_string(),
            field: field.to_string(),
        };

        let rule = match input.kind {
            ShareKind::Equal => ShareRule::Equal,
            ShareKind::Fixed => {
                let amount = input.amount.ok_or_else(|| missing("amount"))?;
                if amount.is_negative() {
                    return Err(ValidationError::Negative {
                        field: "amount".to_string(),
                    });
                }
                if amount.cents() > MAX_AMOUNT_CENTS {
                    return Err(ValidationError::OutOfRange {
                        field: "amount".to_string(),
                        min: 0,
                        max: MAX_AMOUNT_CENTS,
                    });
                }
                ShareRule::Fixed { amount }
            }
            ShareKind::Percentage => {
                let bps = input.percentage_bps.ok_or_else(|| missing("percentage_bps"))?;
                ShareRule::Percentage {
                    percentage_bps: Percentage::new(bps)?,
                }
            }
        };

        Ok(ShareIntent {
            member_id: input.member_id,
            rule,
        })
    }
}

/// A share with its concrete amount filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolvedShare {
    pub member_id: MemberId,
    pub rule: ShareRule,
    pub amount: Money,
}

// =============================================================================
// Payments
// =============================================================================

/// A member's actual contribution toward an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRecord {
    pub member_id: MemberId,
    pub amount: Money,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
}

/// Payment as submitted with a new expense (timestamped on record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPayment {
    pub member_id: MemberId,
    pub amount: Money,
}

// =============================================================================
// Expense
// =============================================================================

/// Expense header. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Expense {
    pub id: ExpenseId,
    pub group_id: GroupId,
    pub description: String,
    pub amount: Money,
    #[serde(default)]
    pub category: ExpenseCategory,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An expense together with its resolved shares and payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseSnapshot {
    #[serde(flatten)]
    pub expense: Expense,
    pub shares: Vec<ResolvedShare>,
    pub payments: Vec<PaymentRecord>,
}

impl ExpenseSnapshot {
    /// Total this member paid toward the expense.
    pub fn paid_by(&self, member_id: MemberId) -> Money {
        self.payments
            .iter()
            .filter(|p| p.member_id == member_id)
            .map(|p| p.amount)
            .sum()
    }

    /// The member's share, if they have one.
    pub fn share_of(&self, member_id: MemberId) -> Option<&ResolvedShare> {
        self.shares.iter().find(|s| s.member_id == member_id)
    }

    pub fn involves(&self, member_id: MemberId) -> bool {
        self.share_of(member_id).is_some() || self.payments.iter().any(|p| p.member_id == member_id)
    }
}

/// A new expense as submitted by a member, before allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewExpense {
    pub description: String,
    pub amount: Money,
    #[serde(default)]
    pub category: ExpenseCategory,
    pub shares: Vec<ShareIntentInput>,
    pub payments: Vec<NewPayment>,
}

// =============================================================================
// Group Snapshot
// =============================================================================

/// One consistent read of a group: the only input the ledger needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GroupSnapshot {
    pub group_id: GroupId,
    pub group_name: String,
    pub members: Vec<Member>,
    #[serde(default)]
    pub expenses: Vec<ExpenseSnapshot>,
}

impl GroupSnapshot {
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn expense(&self, id: ExpenseId) -> Option<&ExpenseSnapshot> {
        self.expenses.iter().find(|e| e.expense.id == id)
    }

    /// Sum of all expense amounts.
    pub fn total_expenses(&self) -> Money {
        self.expenses.iter().map(|e| e.expense.amount).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
