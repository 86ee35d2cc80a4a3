use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::habit::HabitId;

/// Stable identifier for an entry.
pub type EntryId = Uuid;

fn default_completed() -> bool {
    true
}

/// Marks a habit as completed on one calendar day.
///
/// Entries behave as a set of `(habit_id, date)` pairs: existence means
/// completed, removal means not completed. The `completed` flag is kept
/// for storage compatibility and is true on every live record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    pub habit_id: HabitId,
    /// Day key, serialized as `YYYY-MM-DD`. Comparisons never involve a
    /// time component.
    pub date: NaiveDate,
    #[serde(default = "default_completed")]
    pub completed: bool,
}

impl Entry {
    pub fn new(habit_id: HabitId, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            habit_id,
            date,
            completed: true,
        }
    }
}
