use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc, Weekday};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{
    entry::Entry,
    habit::{clamp_icon, Habit, HabitDraft, HabitId, HabitPatch},
    stats::{
        self, HabitMonthProgress, HabitYearStat, MonthStat, MonthSummary, WeekOverview,
        WeekSummary,
    },
    store::HabitStore,
};

/// Theme applied when the store has none persisted.
pub const DEFAULT_THEME: &str = "floral";

struct Collections {
    habits: Vec<Habit>,
    entries: Vec<Entry>,
}

/// Application state: the two record collections plus the persistence
/// handle.
///
/// Both collections live behind one lock so cascading mutations are
/// observed atomically, and every mutation rewrites the affected
/// collection through the store before the lock is released.
pub struct HabitService {
    store: HabitStore,
    collections: RwLock<Collections>,
    theme: RwLock<String>,
}

pub struct HabitServiceBuilder {
    data_dir: Option<PathBuf>,
}

impl HabitServiceBuilder {
    pub fn new() -> Self {
        Self { data_dir: None }
    }

    pub fn data_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> Result<HabitService> {
        let Some(data_dir) = self.data_dir else {
            bail!("data directory not configured");
        };
        let store = HabitStore::open(&data_dir)
            .with_context(|| format!("opening habit store at {}", data_dir.display()))?;
        let (habits, entries) = store.load()?;
        let theme = store
            .load_theme()?
            .unwrap_or_else(|| DEFAULT_THEME.to_string());
        debug!(
            habits = habits.len(),
            entries = entries.len(),
            "loaded tracker state"
        );
        Ok(HabitService {
            store,
            collections: RwLock::new(Collections { habits, entries }),
            theme: RwLock::new(theme),
        })
    }
}

impl Default for HabitServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitService {
    pub fn builder() -> HabitServiceBuilder {
        HabitServiceBuilder::new()
    }

    pub fn habits(&self) -> Vec<Habit> {
        self.collections.read().habits.clone()
    }

    pub fn active_habits(&self) -> Vec<Habit> {
        self.collections
            .read()
            .habits
            .iter()
            .filter(|h| h.active)
            .cloned()
            .collect()
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.collections.read().entries.clone()
    }

    /// Creates a habit from the draft. The name is trimmed and must be
    /// non-empty; the active flag is forced on regardless of the draft.
    pub fn add_habit(&self, draft: HabitDraft) -> Result<Habit> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            bail!("habit name must not be empty");
        }
        let habit = Habit {
            id: HabitId::new_v4(),
            name,
            category: draft.category,
            icon: clamp_icon(&draft.icon),
            active: true,
            created_at: Utc::now(),
        };
        let mut cols = self.collections.write();
        cols.habits.push(habit.clone());
        self.store.save_habits(&cols.habits)?;
        info!(habit = %habit.name, "habit added");
        Ok(habit)
    }

    /// Merges the patch into the matching habit. An unknown id is a
    /// silent no-op.
    pub fn update_habit(&self, id: HabitId, patch: HabitPatch) -> Result<()> {
        let mut cols = self.collections.write();
        let Some(habit) = cols.habits.iter_mut().find(|h| h.id == id) else {
            debug!(%id, "ignoring update for unknown habit");
            return Ok(());
        };
        patch.apply(habit);
        self.store.save_habits(&cols.habits)?;
        Ok(())
    }

    /// Removes the habit and every entry referencing it. An unknown id is
    /// a silent no-op with no writes.
    pub fn delete_habit(&self, id: HabitId) -> Result<()> {
        let mut cols = self.collections.write();
        let before = cols.habits.len();
        cols.habits.retain(|h| h.id != id);
        if cols.habits.len() == before {
            debug!(%id, "ignoring delete for unknown habit");
            return Ok(());
        }
        cols.entries.retain(|e| e.habit_id != id);
        self.store.save_habits(&cols.habits)?;
        self.store.save_entries(&cols.entries)?;
        info!(%id, "habit deleted with its entries");
        Ok(())
    }

    /// Flips completion for `(habit_id, day)`: removes the entry if one
    /// exists, inserts one otherwise. Applying it twice restores the
    /// original state.
    pub fn toggle_entry(&self, habit_id: HabitId, day: NaiveDate) -> Result<()> {
        let mut cols = self.collections.write();
        match cols
            .entries
            .iter()
            .position(|e| e.habit_id == habit_id && e.date == day)
        {
            Some(idx) => {
                cols.entries.remove(idx);
            }
            None => cols.entries.push(Entry::new(habit_id, day)),
        }
        self.store.save_entries(&cols.entries)?;
        Ok(())
    }

    pub fn is_completed(&self, habit_id: HabitId, day: NaiveDate) -> bool {
        self.collections
            .read()
            .entries
            .iter()
            .any(|e| e.habit_id == habit_id && e.date == day)
    }

    pub fn theme(&self) -> String {
        self.theme.read().clone()
    }

    /// Pass-through display setting; core never interprets the name.
    pub fn set_theme(&self, name: &str) -> Result<()> {
        self.store.save_theme(name)?;
        *self.theme.write() = name.to_string();
        Ok(())
    }
}

/// Read-side aggregation views consumed by the presentation layer.
impl HabitService {
    pub fn monthly_overview(&self, year: i32) -> Vec<MonthStat> {
        let cols = self.collections.read();
        stats::monthly_overview(&cols.habits, &cols.entries, year)
    }

    pub fn month_summary(&self, year: i32, month: u32) -> MonthSummary {
        let cols = self.collections.read();
        stats::month_summary(&cols.habits, &cols.entries, year, month)
    }

    pub fn yearly_habit_stats(&self, year: i32) -> Vec<HabitYearStat> {
        let cols = self.collections.read();
        stats::yearly_habit_stats(&cols.habits, &cols.entries, year)
    }

    pub fn performance_highlights(&self, year: i32) -> (Option<MonthStat>, Option<MonthStat>) {
        let cols = self.collections.read();
        let months = stats::monthly_overview(&cols.habits, &cols.entries, year);
        let (best, worst) = stats::best_and_worst(&months);
        (best.cloned(), worst.cloned())
    }

    pub fn current_streak(&self, habit_id: HabitId, today: NaiveDate) -> u32 {
        let cols = self.collections.read();
        stats::current_streak(&cols.entries, habit_id, today)
    }

    pub fn week_overview(&self, reference: NaiveDate, week_start: Weekday) -> WeekOverview {
        let cols = self.collections.read();
        stats::week_overview(&cols.habits, &cols.entries, reference, week_start)
    }

    pub fn week_summaries(&self, year: i32, month: u32) -> Vec<WeekSummary> {
        let cols = self.collections.read();
        stats::week_summaries(&cols.habits, &cols.entries, year, month)
    }

    pub fn habit_month_progress(&self, year: i32, month: u32) -> Vec<HabitMonthProgress> {
        let cols = self.collections.read();
        stats::habit_month_progress(&cols.habits, &cols.entries, year, month)
    }
}
