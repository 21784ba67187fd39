use crate::{
    ids::{ExpenseId, IdSequence},
    normalize::{ensure_positive, NumberFormat, ParseError},
};
use log::debug;
use rust_decimal::Decimal;
use thiserror::Error;

/// A single recorded expense. Expenses are never modified once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    id: ExpenseId,
    description: String,
    amount: Decimal,
    is_necessary: bool,
}

/// An expense used to seed a ledger
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseSeed {
    pub description: String,
    pub amount: Decimal,
    pub is_necessary: bool,
}

/// Spending totals, split by necessity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub total: Decimal,
    pub necessary: Decimal,
    pub unnecessary: Decimal,
}

#[derive(Error, Debug, PartialEq)]
pub enum LedgerError {
    #[error("expense description cannot be empty")]
    EmptyDescription,
    #[error("invalid expense amount")]
    Amount(#[from] ParseError),
    #[error("adding {0} would overflow the ledger total")]
    TotalOverflow(Decimal),
}

/// The ordered record of expenses, oldest first.
#[derive(Debug)]
pub struct ExpenseLedger {
    expenses: Vec<Expense>,
    format: NumberFormat,
    ids: IdSequence,
}

impl Expense {
    pub fn id(&self) -> ExpenseId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn is_necessary(&self) -> bool {
        self.is_necessary
    }
}

impl ExpenseSeed {
    pub fn new<S: Into<String>>(description: S, amount: Decimal, is_necessary: bool) -> Self {
        ExpenseSeed {
            description: description.into(),
            amount,
            is_necessary,
        }
    }
}

impl Totals {
    /// Necessary spending as a percentage of the total
    pub fn necessary_share(&self) -> Decimal {
        share(self.necessary, self.total)
    }

    /// Unnecessary spending as a percentage of the total
    pub fn unnecessary_share(&self) -> Decimal {
        share(self.unnecessary, self.total)
    }
}

impl ExpenseLedger {
    pub fn new(format: NumberFormat) -> Self {
        ExpenseLedger {
            expenses: Vec::new(),
            format,
            ids: IdSequence::default(),
        }
    }

    /// Create a ledger holding `seeds` in order. Seeds are validated the same
    /// way as user input.
    pub fn with_seeds<I>(format: NumberFormat, seeds: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = ExpenseSeed>,
    {
        let mut ledger = ExpenseLedger::new(format);
        for seed in seeds {
            ledger.insert(seed.description, seed.amount, seed.is_necessary)?;
        }
        Ok(ledger)
    }

    /// Record an expense from the raw text of the entry form.
    ///
    /// If the description is blank or the amount doesn't parse to a positive
    /// value, nothing is recorded and the caller should leave the form as the
    /// user typed it.
    pub fn add(
        &mut self,
        description: &str,
        raw_amount: &str,
        is_necessary: bool,
    ) -> Result<&Expense, LedgerError> {
        if description.trim().is_empty() {
            return Err(LedgerError::EmptyDescription);
        }

        let amount = self.format.parse(raw_amount)?;
        self.insert(description, amount, is_necessary)
    }

    /// Record an expense with an already canonical amount
    pub fn insert<S: Into<String>>(
        &mut self,
        description: S,
        amount: Decimal,
        is_necessary: bool,
    ) -> Result<&Expense, LedgerError> {
        let description = description.into();
        let description = description.trim();
        if description.is_empty() {
            return Err(LedgerError::EmptyDescription);
        }

        let amount = ensure_positive(amount)?;

        // Every other total is bounded by the grand total, so this keeps `totals` from overflowing
        if self.totals().total.checked_add(amount).is_none() {
            return Err(LedgerError::TotalOverflow(amount));
        }

        let expense = Expense {
            id: ExpenseId::from(self.ids.next_id()),
            description: description.to_string(),
            amount,
            is_necessary,
        };

        debug!(
            "recording expense {} '{}' of {} (necessary: {})",
            expense.id, expense.description, expense.amount, expense.is_necessary
        );

        self.expenses.push(expense);
        Ok(&self.expenses[self.expenses.len() - 1])
    }

    /// Remove an expense. Unknown ids are ignored.
    pub fn delete(&mut self, id: ExpenseId) -> Option<Expense> {
        let index = self.expenses.iter().position(|e| e.id == id)?;
        debug!("deleting expense {}", id);
        Some(self.expenses.remove(index))
    }

    pub fn get(&self, id: ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    /// All expenses in the order they were recorded
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    /// All expenses, most recent first
    pub fn history(&self) -> impl Iterator<Item = &Expense> + '_ {
        self.expenses.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    pub fn totals(&self) -> Totals {
        let (total, necessary) = self
            .expenses
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(total, necessary), e| {
                if e.is_necessary {
                    (total + e.amount, necessary + e.amount)
                } else {
                    (total + e.amount, necessary)
                }
            });

        Totals {
            total,
            necessary,
            unnecessary: total - necessary,
        }
    }
}

fn share(part: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        part / total * Decimal::ONE_HUNDRED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn seeded() -> ExpenseLedger {
        ExpenseLedger::with_seeds(
            NumberFormat::default(),
            vec![
                ExpenseSeed::new("cafe", dec!(10.00), true),
                ExpenseSeed::new("Cine", dec!(25.00), false),
                ExpenseSeed::new("Alquiler", dec!(500.00), true),
            ],
        )
        .unwrap()
    }

    #[test]
    fn totals_seeded() {
        crate::init_test_logging();

        let totals = seeded().totals();
        assert_eq!(
            totals,
            Totals {
                total: dec!(535.00),
                necessary: dec!(510.00),
                unnecessary: dec!(25.00),
            }
        );
    }

    #[test]
    fn totals_empty() {
        let ledger = ExpenseLedger::new(NumberFormat::default());
        let totals = ledger.totals();
        assert_eq!(totals.total, Decimal::ZERO);
        assert_eq!(totals.necessary_share(), Decimal::ZERO);
        assert_eq!(totals.unnecessary_share(), Decimal::ZERO);
    }

    #[test]
    fn totals_shares() {
        let mut ledger = ExpenseLedger::new(NumberFormat::default());
        ledger.insert("Rent", dec!(75), true).unwrap();
        ledger.insert("Games", dec!(25), false).unwrap();

        let totals = ledger.totals();
        assert_eq!(totals.necessary_share(), dec!(75));
        assert_eq!(totals.unnecessary_share(), dec!(25));
    }

    #[test]
    fn add_locale_amount() {
        crate::init_test_logging();

        let mut ledger = seeded();
        let before = ledger.totals().total;

        let expense = ledger.add("Café", "12,50", false).unwrap().clone();
        assert_eq!(expense.amount(), dec!(12.50));
        assert_eq!(expense.description(), "Café");
        assert!(!expense.is_necessary());

        assert_eq!(ledger.len(), 4);
        assert_eq!(ledger.totals().total - before, dec!(12.50));
        assert_eq!(ledger.expenses().last(), Some(&expense));
    }

    #[test]
    fn add_zero_amount() {
        let mut ledger = seeded();
        assert_eq!(
            ledger.add("x", "0", true).err(),
            Some(LedgerError::Amount(ParseError::NotPositive(dec!(0))))
        );
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn add_non_numeric_amount() {
        let mut ledger = seeded();
        assert_eq!(
            ledger.add("x", "lots", true).err(),
            Some(LedgerError::Amount(ParseError::Invalid("lots".into())))
        );
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn add_blank_description() {
        let mut ledger = seeded();
        assert_eq!(
            ledger.add("   ", "10", true).err(),
            Some(LedgerError::EmptyDescription)
        );
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn add_sum_matches_total() {
        let mut ledger = ExpenseLedger::new(NumberFormat::default());
        let amounts = ["0,01", "1.000", "33,33", "12,5", "7"];
        for (i, amount) in amounts.iter().enumerate() {
            ledger.add("item", amount, i % 2 == 0).unwrap();
        }

        let totals = ledger.totals();
        assert_eq!(totals.total, dec!(1052.84));
        assert_eq!(totals.necessary + totals.unnecessary, totals.total);
    }

    #[test]
    fn add_unique_ids() {
        let mut ledger = ExpenseLedger::new(NumberFormat::default());
        let a = ledger.add("a", "1", true).unwrap().id();
        let b = ledger.add("b", "1", true).unwrap().id();
        assert!(a < b);
    }

    #[test]
    fn delete_existing() {
        let mut ledger = seeded();
        let id = ledger.expenses()[1].id();

        let removed = ledger.delete(id).unwrap();
        assert_eq!(removed.description(), "Cine");
        assert_eq!(ledger.get(id), None);
        assert_eq!(ledger.totals().unnecessary, Decimal::ZERO);
    }

    #[test]
    fn delete_missing() {
        let mut ledger = seeded();
        let id = ledger.expenses()[0].id();
        ledger.delete(id);

        assert_eq!(ledger.delete(id), None);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn history_newest_first() {
        let ledger = seeded();
        let names: Vec<&str> = ledger.history().map(|e| e.description()).collect();
        assert_eq!(names, vec!["Alquiler", "Cine", "cafe"]);
    }

    #[test]
    fn add_total_overflow() {
        let mut ledger = seeded();
        let raw = "79.228.162.514.264.337.593.543.950.335";

        assert_eq!(
            ledger.add("a", raw, true).err(),
            Some(LedgerError::TotalOverflow(Decimal::MAX))
        );
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.totals().total, dec!(535.00));
    }

    #[test]
    fn insert_up_to_largest_total() {
        let mut ledger = ExpenseLedger::new(NumberFormat::default());
        ledger.insert("a", Decimal::MAX - dec!(1), true).unwrap();
        ledger.insert("b", dec!(1), false).unwrap();

        assert_eq!(
            ledger.insert("c", dec!(1), false).err(),
            Some(LedgerError::TotalOverflow(dec!(1)))
        );

        let totals = ledger.totals();
        assert_eq!(totals.total, Decimal::MAX);
        assert_eq!(totals.unnecessary, dec!(1));
    }

    #[test]
    fn with_seeds_invalid() {
        let result = ExpenseLedger::with_seeds(
            NumberFormat::default(),
            vec![ExpenseSeed::new("refund", dec!(-4), false)],
        );
        assert_eq!(
            result.err(),
            Some(LedgerError::Amount(ParseError::NotPositive(dec!(-4))))
        );
    }
}
