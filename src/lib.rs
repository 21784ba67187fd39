//! In-memory core of a personal finance tracker.
//!
//! Expenses are recorded in an [`ExpenseLedger`] and savings goals in a
//! [`GoalTracker`], both held by a single [`FinanceState`]. Amounts typed by the
//! user pass through a [`NumberFormat`] on the way in and out; everything
//! stored is a canonical [`Decimal`](rust_decimal::Decimal).

mod goal;
mod ids;
mod ledger;
mod normalize;
mod state;

pub use goal::{
    DepositForm, DepositReceipt, GoalError, GoalSeed, GoalTracker, Progress, SavingsGoal,
};
pub use ids::{ExpenseId, GoalId};
pub use ledger::{Expense, ExpenseLedger, ExpenseSeed, LedgerError, Totals};
pub use normalize::{FormatError, NumberFormat, ParseError};
pub use state::{FinanceState, InitialState, StateError};

// This represents the number of decimal places that a currency can validly express.
// @todo Support the full range of currency precisions specified in ISO 4217.
const CURRENCY_PRECISION: u32 = 2;

#[cfg(test)]
pub(crate) fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
