use crate::{
    goal::{
        DepositForm, DepositReceipt, GoalError, GoalSeed, GoalTracker, Progress, SavingsGoal,
    },
    ids::{ExpenseId, GoalId},
    ledger::{Expense, ExpenseLedger, ExpenseSeed, LedgerError, Totals},
    normalize::NumberFormat,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

/// The data a `FinanceState` starts with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialState {
    pub expenses: Vec<ExpenseSeed>,
    pub goals: Vec<GoalSeed>,
}

#[derive(Error, Debug, PartialEq)]
pub enum StateError {
    #[error("invalid seed expense")]
    Ledger(#[from] LedgerError),
    #[error("invalid seed goal")]
    Goal(#[from] GoalError),
}

/// Everything the tracker knows: the expense ledger, the savings goals and the
/// number format used to read and display amounts.
///
/// State lives only as long as this value. All changes go through `&mut self`,
/// one intent at a time, and every derived figure is computed when asked for.
#[derive(Debug)]
pub struct FinanceState {
    ledger: ExpenseLedger,
    goals: GoalTracker,
    format: NumberFormat,
}

impl InitialState {
    /// The example data shown on first load
    pub fn example() -> Self {
        InitialState {
            expenses: vec![
                ExpenseSeed::new("cafe", dec!(10.00), true),
                ExpenseSeed::new("Cine", dec!(25.00), false),
                ExpenseSeed::new("Alquiler", dec!(500.00), true),
            ],
            goals: vec![
                GoalSeed::new("Viaje de Graduación", dec!(2000.00), dec!(500.00)),
                GoalSeed::new("Laptop Nueva", dec!(800.00), dec!(100.00)),
            ],
        }
    }
}

impl FinanceState {
    pub fn new(initial: InitialState) -> Result<Self, StateError> {
        FinanceState::with_format(initial, NumberFormat::default())
    }

    pub fn with_format(initial: InitialState, format: NumberFormat) -> Result<Self, StateError> {
        Ok(FinanceState {
            ledger: ExpenseLedger::with_seeds(format, initial.expenses)?,
            goals: GoalTracker::with_seeds(format, initial.goals)?,
            format,
        })
    }

    pub fn ledger(&self) -> &ExpenseLedger {
        &self.ledger
    }

    pub fn goal_tracker(&self) -> &GoalTracker {
        &self.goals
    }

    pub fn number_format(&self) -> &NumberFormat {
        &self.format
    }

    // Queries

    pub fn totals(&self) -> Totals {
        self.ledger.totals()
    }

    pub fn expenses(&self) -> &[Expense] {
        self.ledger.expenses()
    }

    pub fn history(&self) -> impl Iterator<Item = &Expense> + '_ {
        self.ledger.history()
    }

    pub fn goals(&self) -> &[SavingsGoal] {
        self.goals.goals()
    }

    pub fn progress(&self, id: GoalId) -> Option<Progress> {
        self.goals.progress(id)
    }

    pub fn deposit_form(&self) -> &DepositForm {
        self.goals.deposit_form()
    }

    pub fn active_deposit_target(&self) -> Option<GoalId> {
        self.goals.active_deposit_target()
    }

    // Commands

    pub fn add_expense(
        &mut self,
        description: &str,
        raw_amount: &str,
        is_necessary: bool,
    ) -> Result<ExpenseId, LedgerError> {
        self.ledger
            .add(description, raw_amount, is_necessary)
            .map(Expense::id)
    }

    pub fn delete_expense(&mut self, id: ExpenseId) -> Option<Expense> {
        self.ledger.delete(id)
    }

    pub fn create_goal(&mut self, name: &str, raw_target: &str) -> Result<GoalId, GoalError> {
        self.goals.create(name, raw_target).map(SavingsGoal::id)
    }

    pub fn delete_goal(&mut self, id: GoalId) -> Option<SavingsGoal> {
        self.goals.delete(id)
    }

    pub fn deposit(
        &mut self,
        id: GoalId,
        raw_amount: &str,
    ) -> Result<Option<DepositReceipt>, GoalError> {
        self.goals.deposit(id, raw_amount)
    }

    pub fn set_active_deposit(&mut self, id: Option<GoalId>) -> bool {
        self.goals.set_active_deposit(id)
    }

    pub fn set_deposit_draft(&mut self, text: &str) {
        self.goals.set_deposit_draft(text)
    }

    pub fn submit_deposit(&mut self) -> Result<Option<DepositReceipt>, GoalError> {
        self.goals.submit_deposit()
    }

    pub fn cancel_deposit(&mut self) {
        self.goals.cancel_deposit()
    }

    // Formatting

    pub fn format_input(&self, text: &str) -> String {
        self.format.format_input(text)
    }

    pub fn format_amount(&self, value: Decimal) -> String {
        self.format.format_amount(value)
    }

    pub fn format_currency(&self, value: Decimal) -> String {
        self.format.format_currency(value)
    }

    pub fn format_currency_f64(&self, value: f64) -> String {
        self.format.format_currency_f64(value)
    }
}
