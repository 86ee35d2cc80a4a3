use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a habit, assigned once at creation.
pub type HabitId = Uuid;

/// Upper bound on icon length; icons are otherwise opaque display text.
pub const MAX_ICON_CHARS: usize = 4;

/// Fixed set of categories a habit can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Health,
    Learning,
    Finance,
    Social,
    Work,
    Fitness,
    Mindfulness,
    Hobby,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Health,
        Category::Learning,
        Category::Finance,
        Category::Social,
        Category::Work,
        Category::Fitness,
        Category::Mindfulness,
        Category::Hobby,
        Category::Other,
    ];
}

impl Default for Category {
    fn default() -> Self {
        Category::Health
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Health => "Health",
            Category::Learning => "Learning",
            Category::Finance => "Finance",
            Category::Social => "Social",
            Category::Work => "Work",
            Category::Fitness => "Fitness",
            Category::Mindfulness => "Mindfulness",
            Category::Hobby => "Hobby",
            Category::Other => "Other",
        };
        f.write_str(name)
    }
}

fn default_active() -> bool {
    true
}

/// A user-defined recurring activity tracked per calendar day.
///
/// Field names are serialized in camelCase to match the stored schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub category: Category,
    pub icon: String,
    /// Records written before archiving existed carry no flag; absence
    /// means active.
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// Calendar day the habit came into existence. Months ending before
    /// this day never count the habit toward their totals.
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// Input for creating a habit; identity, timestamps and the active flag
/// are assigned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitDraft {
    pub name: String,
    pub category: Category,
    pub icon: String,
}

impl HabitDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: Category::default(),
            icon: "✅".to_string(),
        }
    }
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub icon: Option<String>,
    pub active: Option<bool>,
}

impl HabitPatch {
    pub fn archive() -> Self {
        Self {
            active: Some(false),
            ..Self::default()
        }
    }

    pub fn activate() -> Self {
        Self {
            active: Some(true),
            ..Self::default()
        }
    }

    /// Merges the set fields into `habit`. An empty patched name is
    /// ignored so the non-empty invariant survives any merge.
    pub fn apply(self, habit: &mut Habit) {
        if let Some(name) = self.name {
            let name = name.trim().to_string();
            if !name.is_empty() {
                habit.name = name;
            }
        }
        if let Some(category) = self.category {
            habit.category = category;
        }
        if let Some(icon) = self.icon {
            habit.icon = clamp_icon(&icon);
        }
        if let Some(active) = self.active {
            habit.active = active;
        }
    }
}

/// Truncates an icon to the display bound, keeping whole characters.
pub fn clamp_icon(icon: &str) -> String {
    icon.chars().take(MAX_ICON_CHARS).collect()
}
