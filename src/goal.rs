use crate::{
    ids::{GoalId, IdSequence},
    normalize::{ensure_positive, NumberFormat, ParseError},
};
use log::{debug, warn};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use thiserror::Error;

/// A named savings target.
///
/// `saved` only ever grows, and never past `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsGoal {
    id: GoalId,
    name: String,
    target: Decimal,
    saved: Decimal,
}

/// A goal used to seed a tracker
#[derive(Debug, Clone, PartialEq)]
pub struct GoalSeed {
    pub name: String,
    pub target: Decimal,
    pub saved: Decimal,
}

/// How far a goal is towards its target, as a percentage in `0..=100`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Progress(Decimal);

/// The outcome of a deposit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepositReceipt {
    pub goal: GoalId,
    /// The amount actually added to the goal
    pub credited: Decimal,
    /// The part of the deposit beyond the goal's target, which is discarded
    pub excess: Decimal,
    pub saved: Decimal,
}

/// The deposit entry form. At most one goal can have it open.
#[derive(Debug, Clone, PartialEq)]
pub enum DepositForm {
    Closed,
    Editing { goal: GoalId, draft: String },
}

#[derive(Error, Debug, PartialEq)]
pub enum GoalError {
    #[error("goal name cannot be empty")]
    EmptyName,
    #[error("invalid goal target")]
    Target(#[source] ParseError),
    #[error("invalid deposit amount")]
    Deposit(#[source] ParseError),
    #[error("saved amount {saved} is outside the range 0 - {target}")]
    SavedOutOfRange { saved: Decimal, target: Decimal },
}

/// Owns the savings goals and the deposit form.
#[derive(Debug)]
pub struct GoalTracker {
    goals: Vec<SavingsGoal>,
    form: DepositForm,
    format: NumberFormat,
    ids: IdSequence,
}

impl SavingsGoal {
    pub fn id(&self) -> GoalId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> Decimal {
        self.target
    }

    pub fn saved(&self) -> Decimal {
        self.saved
    }

    /// The amount still needed to reach the target
    pub fn remaining(&self) -> Decimal {
        self.target - self.saved
    }

    pub fn progress(&self) -> Progress {
        Progress::of(self.saved, self.target)
    }

    pub fn is_complete(&self) -> bool {
        self.progress().is_complete()
    }

    // Anything beyond the remaining gap is dropped rather than carried over,
    // including amounts too large to add at all.
    fn credit(&mut self, amount: Decimal) -> DepositReceipt {
        let saved = self
            .saved
            .checked_add(amount)
            .map_or(self.target, |s| s.min(self.target));
        let credited = saved - self.saved;
        self.saved = saved;

        DepositReceipt {
            goal: self.id,
            credited,
            excess: amount - credited,
            saved,
        }
    }
}

impl GoalSeed {
    pub fn new<S: Into<String>>(name: S, target: Decimal, saved: Decimal) -> Self {
        GoalSeed {
            name: name.into(),
            target,
            saved,
        }
    }
}

impl Progress {
    // `target` must be positive
    fn of(saved: Decimal, target: Decimal) -> Self {
        let percent = saved / target * Decimal::ONE_HUNDRED;
        Progress(percent.min(Decimal::ONE_HUNDRED))
    }

    pub fn percent(&self) -> Decimal {
        self.0
    }

    /// The percentage rounded to a whole number, for labels
    pub fn rounded(&self) -> Decimal {
        self.0.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn is_complete(&self) -> bool {
        self.0 >= Decimal::ONE_HUNDRED
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.rounded())
    }
}

impl DepositForm {
    /// The goal the form is open for, if any
    pub fn target(&self) -> Option<GoalId> {
        match self {
            DepositForm::Closed => None,
            DepositForm::Editing { goal, .. } => Some(*goal),
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match self {
            DepositForm::Closed => None,
            DepositForm::Editing { draft, .. } => Some(draft),
        }
    }
}

impl Default for DepositForm {
    fn default() -> Self {
        DepositForm::Closed
    }
}

impl GoalTracker {
    pub fn new(format: NumberFormat) -> Self {
        GoalTracker {
            goals: Vec::new(),
            form: DepositForm::Closed,
            format,
            ids: IdSequence::default(),
        }
    }

    /// Create a tracker holding `seeds` in order. Seeds may already be partly
    /// funded, but must respect `0 <= saved <= target`.
    pub fn with_seeds<I>(format: NumberFormat, seeds: I) -> Result<Self, GoalError>
    where
        I: IntoIterator<Item = GoalSeed>,
    {
        let mut tracker = GoalTracker::new(format);
        for seed in seeds {
            tracker.insert(seed.name, seed.target, seed.saved)?;
        }
        Ok(tracker)
    }

    /// Create an empty goal from the raw text of the goal form
    pub fn create(&mut self, name: &str, raw_target: &str) -> Result<&SavingsGoal, GoalError> {
        if name.trim().is_empty() {
            return Err(GoalError::EmptyName);
        }

        let target = self.format.parse(raw_target).map_err(GoalError::Target)?;
        self.insert(name, target, Decimal::ZERO)
    }

    /// Add a goal with canonical values
    pub fn insert<S: Into<String>>(
        &mut self,
        name: S,
        target: Decimal,
        saved: Decimal,
    ) -> Result<&SavingsGoal, GoalError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(GoalError::EmptyName);
        }

        let target = ensure_positive(target).map_err(GoalError::Target)?;
        if saved < Decimal::ZERO || saved > target {
            return Err(GoalError::SavedOutOfRange { saved, target });
        }

        let goal = SavingsGoal {
            id: GoalId::from(self.ids.next_id()),
            name: name.to_string(),
            target,
            saved,
        };

        debug!(
            "creating goal {} '{}' with {} of {} saved",
            goal.id, goal.name, goal.saved, goal.target
        );

        self.goals.push(goal);
        Ok(&self.goals[self.goals.len() - 1])
    }

    /// Remove a goal, closing the deposit form if it was open for it.
    /// Unknown ids are ignored.
    pub fn delete(&mut self, id: GoalId) -> Option<SavingsGoal> {
        let index = self.goals.iter().position(|g| g.id == id)?;

        if self.form.target() == Some(id) {
            debug!("closing deposit form for deleted goal {}", id);
            self.form = DepositForm::Closed;
        }

        debug!("deleting goal {}", id);
        Some(self.goals.remove(index))
    }

    /// Deposit the amount in `raw_amount` into a goal.
    ///
    /// Returns `Ok(None)` without looking at the amount if the goal no longer
    /// exists. A rejected amount leaves both the goal and the form untouched.
    /// A successful deposit closes the form if it was open for this goal.
    pub fn deposit(
        &mut self,
        id: GoalId,
        raw_amount: &str,
    ) -> Result<Option<DepositReceipt>, GoalError> {
        let format = self.format;
        let goal = match self.goals.iter_mut().find(|g| g.id == id) {
            Some(goal) => goal,
            None => {
                debug!("ignoring deposit for missing goal {}", id);
                return Ok(None);
            }
        };

        let amount = format.parse(raw_amount).map_err(GoalError::Deposit)?;
        let receipt = goal.credit(amount);

        debug!(
            "deposited {} into goal {} ({} saved)",
            receipt.credited, id, receipt.saved
        );
        if receipt.excess > Decimal::ZERO {
            warn!(
                "goal {} reached its target; discarding {} of the deposit",
                id, receipt.excess
            );
        }

        if self.form.target() == Some(id) {
            self.form = DepositForm::Closed;
        }

        Ok(Some(receipt))
    }

    /// Open the deposit form for a goal, or close it with `None`.
    ///
    /// Opening a goal closes the form for any other goal and starts with an
    /// empty draft. Goals that are missing or already complete can't be
    /// opened; the form is closed instead and `false` returned.
    pub fn set_active_deposit(&mut self, id: Option<GoalId>) -> bool {
        let open = match id.and_then(|id| self.get(id)) {
            Some(goal) if !goal.is_complete() => Some(goal.id),
            _ => None,
        };

        self.form = match open {
            Some(goal) => DepositForm::Editing {
                goal,
                draft: String::new(),
            },
            None => DepositForm::Closed,
        };

        open.is_some()
    }

    /// Replace the text in the open deposit form
    pub fn set_deposit_draft(&mut self, text: &str) {
        if let DepositForm::Editing { draft, .. } = &mut self.form {
            *draft = text.to_string();
        }
    }

    /// Deposit the draft of the open form
    pub fn submit_deposit(&mut self) -> Result<Option<DepositReceipt>, GoalError> {
        match &self.form {
            DepositForm::Editing { goal, draft } => {
                let (goal, draft) = (*goal, draft.clone());
                self.deposit(goal, &draft)
            }
            DepositForm::Closed => Ok(None),
        }
    }

    pub fn cancel_deposit(&mut self) {
        self.form = DepositForm::Closed;
    }

    pub fn deposit_form(&self) -> &DepositForm {
        &self.form
    }

    pub fn active_deposit_target(&self) -> Option<GoalId> {
        self.form.target()
    }

    pub fn progress(&self, id: GoalId) -> Option<Progress> {
        self.get(id).map(SavingsGoal::progress)
    }

    pub fn get(&self, id: GoalId) -> Option<&SavingsGoal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn goals(&self) -> &[SavingsGoal] {
        &self.goals
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}
