//! # potluck-core: Shared-Expense Ledger Engine
//!
//! This crate is the accounting core of Potluck. It takes a snapshot of a
//! group (members, expenses, shares, payments) and answers three questions:
//! who owes what on an expense, where does everyone stand, and who should pay
//! whom to square up.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Potluck Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        Surrounding service (HTTP API, CLI, storage, auth)      │   │
//! │  │   loads ONE consistent GroupSnapshot, renders the results       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ &GroupSnapshot                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ potluck-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────┐   ┌────────────┐   ┌────────────┐             │   │
//! │  │   │ allocation │   │  balance   │   │ settlement │             │   │
//! │  │   │  intents → │──►│  payments  │──►│  debtors → │             │   │
//! │  │   │  amounts   │   │  − shares  │   │  creditors │             │   │
//! │  │   └────────────┘   └────────────┘   └────────────┘             │   │
//! │  │          ▲                ▲                ▲                    │   │
//! │  │          └──────── ledger (facade) ────────┘                    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Member, Expense, ShareRule, GroupSnapshot, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input and snapshot validation
//! - [`allocation`] - Share intents → concrete amounts
//! - [`balance`] - Per-member totals, breakdowns and transaction history
//! - [`settlement`] - Greedy debtor/creditor transfer plan
//! - [`ledger`] - Report-level operations over a whole snapshot
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same snapshot in, same report out
//! 2. **No I/O**: persistence and transport belong to the caller
//! 3. **Integer Money**: amounts are minor units (i64), rounding is half to even
//! 4. **Explicit Errors**: inconsistencies are reported, never patched over
//!
//! ## Example Usage
//!
//! ```rust
//! use potluck_core::money::Money;
//! use potluck_core::types::Percentage;
//!
//! let dinner = Money::from_major(300);
//! assert_eq!(dinner.percentage_of(Percentage::from_whole(30)), Money::from_major(90));
//!
//! let (each, leftover) = Money::from_major(500).split_evenly(4);
//! assert_eq!(each, Money::from_major(125));
//! assert_eq!(leftover, 0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod balance;
pub mod error;
pub mod ledger;
pub mod money;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use potluck_core::Money` instead of
// `use potluck_core::money::Money`

pub use error::{ConsistencyError, CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of an expense description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Largest single amount accepted (expense, payment or share), in minor
/// units: 10,000,000,000.00.
///
/// ## Business Reason
/// Keeps a single entry far from the `i64` range. Group-wide sums are still
/// accumulated with overflow checks, so a snapshot with enormous numbers of
/// entries is rejected instead of wrapping.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;
