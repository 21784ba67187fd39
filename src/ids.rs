use chrono::Utc;
use std::{convert::TryFrom, fmt};

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Returns the raw identifier value
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                $name(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

define_id!(ExpenseId, "exp-");
define_id!(GoalId, "goal-");

/// Hands out time-derived identifiers.
///
/// Ids are the current Unix time in milliseconds, so they read as creation
/// stamps. Two records created within the same millisecond (or after the clock
/// steps backwards) would collide, so each id is bumped to at least one past
/// the previous one.
#[derive(Debug, Default)]
pub(crate) struct IdSequence {
    last: u64,
}

impl IdSequence {
    pub fn next_id(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let id = now.max(self.last.saturating_add(1));
        self.last = id;
        id
    }
}
