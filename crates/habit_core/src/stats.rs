//! Date-bucketed aggregation over the habit and entry collections.
//!
//! Everything here is a pure function from `(&[Habit], &[Entry], period)`
//! to derived statistics, recomputed in full on every call. Division by
//! zero is always guarded and substituted with 0; invalid calendar input
//! yields empty output rather than an error.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::{
    entry::Entry,
    habit::{Habit, HabitId},
};

/// Streaks are never reported above this many days.
pub const STREAK_CAP: u32 = 365;

/// One month of the yearly overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthStat {
    /// 1-based month number.
    pub month: u32,
    /// Short label, e.g. "Jan".
    pub label: String,
    /// Full label, e.g. "January 2026".
    pub full_label: String,
    /// Habits that existed by the end of the month, archived or not.
    pub habits: usize,
    pub completed: usize,
    pub total_possible: usize,
    /// Percent complete, two decimals; 0 when nothing was possible.
    pub percentage: f64,
}

/// Current-month roll-up over active habits only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthSummary {
    pub active_habits: usize,
    pub completed: usize,
    pub not_completed: usize,
    pub total_possible: usize,
    /// Percent complete, one decimal; 0 when nothing was possible.
    pub completion_rate: f64,
}

/// Yearly completion count for a single habit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitYearStat {
    pub habit_id: HabitId,
    pub completed_days: usize,
    /// Always against a fixed 365-day denominator, one decimal.
    pub percentage: f64,
}

/// Completion rate for one day of a week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayStat {
    pub date: NaiveDate,
    /// Weekday label, e.g. "Mon".
    pub label: String,
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
}

/// A full week around a reference day, with per-day rates and the week
/// aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekOverview {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<DayStat>,
    pub completed: usize,
    pub total_possible: usize,
    pub percentage: f64,
}

/// Aggregate for one Monday-start week of a month grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSummary {
    /// 1-based position within the month.
    pub index: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub completed: usize,
    pub total_possible: usize,
    pub percentage: f64,
}

/// Month-to-date completion for one active habit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitMonthProgress {
    pub habit_id: HabitId,
    pub completed_days: usize,
    pub total_days: usize,
    pub percentage: f64,
}

/// Twelve `MonthStat` rows for the given calendar year, January first.
///
/// Eligibility intentionally ignores the current `active` flag: a habit
/// archived today still counts for the months it lived through. The
/// completed count covers every entry in the month's range without
/// filtering by the eligible set, matching the reference behavior.
pub fn monthly_overview(habits: &[Habit], entries: &[Entry], year: i32) -> Vec<MonthStat> {
    (1..=12)
        .filter_map(|month| month_stat(habits, entries, year, month))
        .collect()
}

fn month_stat(habits: &[Habit], entries: &[Entry], year: i32, month: u32) -> Option<MonthStat> {
    let (first, last) = month_bounds(year, month)?;
    let days = last.day() as usize;
    let eligible = habits.iter().filter(|h| h.created_on() <= last).count();
    let completed = entries
        .iter()
        .filter(|e| e.date >= first && e.date <= last)
        .count();
    let total_possible = eligible * days;
    Some(MonthStat {
        month,
        label: first.format("%b").to_string(),
        full_label: first.format("%B %Y").to_string(),
        habits: eligible,
        completed,
        total_possible,
        percentage: percentage_of(completed, total_possible, round2),
    })
}

/// Roll-up of the given month restricted to active habits; both the
/// denominator and the entry count exclude archived habits.
pub fn month_summary(habits: &[Habit], entries: &[Entry], year: i32, month: u32) -> MonthSummary {
    let Some((first, last)) = month_bounds(year, month) else {
        return MonthSummary::default();
    };
    let active = active_ids(habits);
    let total_possible = active.len() * last.day() as usize;
    let completed = entries
        .iter()
        .filter(|e| active.contains(&e.habit_id) && e.date >= first && e.date <= last)
        .count();
    MonthSummary {
        active_habits: active.len(),
        completed,
        not_completed: total_possible.saturating_sub(completed),
        total_possible,
        completion_rate: percentage_of(completed, total_possible, round1),
    }
}

/// Per-habit completion counts for the calendar year, every habit included
/// whether archived or not, ranked by completed days descending. The sort
/// is stable, so equal counts keep their original order.
pub fn yearly_habit_stats(habits: &[Habit], entries: &[Entry], year: i32) -> Vec<HabitYearStat> {
    let mut rows: Vec<HabitYearStat> = habits
        .iter()
        .map(|habit| {
            let completed_days = entries
                .iter()
                .filter(|e| e.habit_id == habit.id && e.date.year() == year)
                .count();
            HabitYearStat {
                habit_id: habit.id,
                completed_days,
                percentage: round1(completed_days as f64 / 365.0 * 100.0),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.completed_days.cmp(&a.completed_days));
    rows
}

/// Best and worst months by percentage among those with any possible
/// completions. Ties resolve to the earliest month because the reduction
/// runs January to December with strict comparisons. Both are `None` when
/// no month qualifies.
pub fn best_and_worst(months: &[MonthStat]) -> (Option<&MonthStat>, Option<&MonthStat>) {
    let mut best: Option<&MonthStat> = None;
    let mut worst: Option<&MonthStat> = None;
    for stat in months.iter().filter(|m| m.total_possible > 0) {
        best = Some(match best {
            Some(current) if stat.percentage > current.percentage => stat,
            Some(current) => current,
            None => stat,
        });
        worst = Some(match worst {
            Some(current) if stat.percentage < current.percentage => stat,
            Some(current) => current,
            None => stat,
        });
    }
    (best, worst)
}

/// Consecutive completed days ending at `today`, capped at [`STREAK_CAP`].
/// A missing entry for today means a streak of 0.
pub fn current_streak(entries: &[Entry], habit_id: HabitId, today: NaiveDate) -> u32 {
    let days: HashSet<NaiveDate> = entries
        .iter()
        .filter(|e| e.habit_id == habit_id)
        .map(|e| e.date)
        .collect();
    let mut streak = 0;
    let mut day = today;
    while days.contains(&day) {
        streak += 1;
        if streak == STREAK_CAP {
            break;
        }
        let Some(prev) = day.pred_opt() else { break };
        day = prev;
    }
    streak
}

/// The week containing `reference` for the given week start, with per-day
/// completion rates over active habits and the week aggregate.
///
/// The start is a parameter because the two consuming views intentionally
/// differ: the dashboard follows the configured default while the tracker
/// grid is always Monday-start.
pub fn week_overview(
    habits: &[Habit],
    entries: &[Entry],
    reference: NaiveDate,
    week_start: Weekday,
) -> WeekOverview {
    let week = reference.week(week_start);
    let start = week.first_day();
    let end = week.last_day();
    let active = active_ids(habits);

    let mut days = Vec::with_capacity(7);
    let mut completed_total = 0;
    for date in start.iter_days().take(7) {
        let completed = entries
            .iter()
            .filter(|e| e.date == date && active.contains(&e.habit_id))
            .count();
        completed_total += completed;
        days.push(DayStat {
            date,
            label: date.format("%a").to_string(),
            completed,
            total: active.len(),
            percentage: percentage_of(completed, active.len(), round1),
        });
    }

    let total_possible = active.len() * days.len();
    WeekOverview {
        start,
        end,
        days,
        completed: completed_total,
        total_possible,
        percentage: percentage_of(completed_total, total_possible, round1),
    }
}

/// Monday-start weeks of the month, clipped to days inside the month, in
/// order. Partial first and last weeks keep only their in-month days.
pub fn month_weeks(year: i32, month: u32) -> Vec<Vec<NaiveDate>> {
    let Some((first, last)) = month_bounds(year, month) else {
        return Vec::new();
    };
    let mut weeks = Vec::new();
    let mut cursor = first;
    while cursor <= last {
        let week_end = cursor.week(Weekday::Mon).last_day().min(last);
        let days: Vec<NaiveDate> = cursor.iter_days().take_while(|d| *d <= week_end).collect();
        weeks.push(days);
        let Some(next) = week_end.succ_opt() else { break };
        cursor = next;
    }
    weeks
}

/// Per-week aggregates over the month grid, active habits only.
pub fn week_summaries(
    habits: &[Habit],
    entries: &[Entry],
    year: i32,
    month: u32,
) -> Vec<WeekSummary> {
    let active = active_ids(habits);
    let done: HashSet<(HabitId, NaiveDate)> = entries
        .iter()
        .filter(|e| active.contains(&e.habit_id))
        .map(|e| (e.habit_id, e.date))
        .collect();

    month_weeks(year, month)
        .into_iter()
        .enumerate()
        .filter_map(|(idx, days)| {
            let (start, end) = match (days.first(), days.last()) {
                (Some(start), Some(end)) => (*start, *end),
                _ => return None,
            };
            let completed = days
                .iter()
                .map(|day| {
                    active
                        .iter()
                        .filter(|id| done.contains(&(**id, *day)))
                        .count()
                })
                .sum();
            let total_possible = active.len() * days.len();
            Some(WeekSummary {
                index: idx + 1,
                start,
                end,
                completed,
                total_possible,
                percentage: percentage_of(completed, total_possible, round1),
            })
        })
        .collect()
}

/// Month completion per active habit, ranked by percentage descending.
pub fn habit_month_progress(
    habits: &[Habit],
    entries: &[Entry],
    year: i32,
    month: u32,
) -> Vec<HabitMonthProgress> {
    let Some((first, last)) = month_bounds(year, month) else {
        return Vec::new();
    };
    let total_days = last.day() as usize;
    let mut rows: Vec<HabitMonthProgress> = habits
        .iter()
        .filter(|h| h.active)
        .map(|habit| {
            let completed_days = entries
                .iter()
                .filter(|e| e.habit_id == habit.id && e.date >= first && e.date <= last)
                .count();
            HabitMonthProgress {
                habit_id: habit.id,
                completed_days,
                total_days,
                percentage: percentage_of(completed_days, total_days, round1),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    rows
}

fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }?;
    Some((first, next.pred_opt()?))
}

fn active_ids(habits: &[Habit]) -> HashSet<HabitId> {
    habits
        .iter()
        .filter(|h| h.active)
        .map(|h| h.id)
        .collect()
}

fn percentage_of(completed: usize, possible: usize, round: fn(f64) -> f64) -> f64 {
    if possible == 0 {
        return 0.0;
    }
    round(completed as f64 / possible as f64 * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::Category;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit_from(name: &str, created: NaiveDate, active: bool) -> Habit {
        Habit {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: Category::Health,
            icon: "✅".to_string(),
            active,
            created_at: Utc.from_utc_datetime(&created.and_hms_opt(8, 0, 0).unwrap()),
        }
    }

    fn entries_for(habit: &Habit, days: &[NaiveDate]) -> Vec<Entry> {
        days.iter().map(|d| Entry::new(habit.id, *d)).collect()
    }

    #[test]
    fn empty_year_has_no_rankable_months() {
        let months = monthly_overview(&[], &[], 2024);
        assert_eq!(months.len(), 12);
        assert!(months.iter().all(|m| m.total_possible == 0));
        assert!(months.iter().all(|m| m.percentage == 0.0));

        let (best, worst) = best_and_worst(&months);
        assert!(best.is_none());
        assert!(worst.is_none());
    }

    #[test]
    fn eligibility_follows_the_creation_month() {
        let habit = habit_from("Read", day(2024, 3, 10), true);
        let months = monthly_overview(&[habit], &[], 2024);

        assert_eq!(months[0].habits, 0, "January predates the habit");
        assert_eq!(months[1].total_possible, 0);
        assert_eq!(months[2].habits, 1, "created mid-March still counts");
        assert_eq!(months[2].total_possible, 31);
        assert_eq!(months[11].total_possible, 31, "later months keep it");
    }

    #[test]
    fn archived_habits_still_count_for_historical_months() {
        let habit = habit_from("Read", day(2024, 1, 1), false);
        let months = monthly_overview(&[habit], &[], 2024);
        assert_eq!(months[0].habits, 1);
        assert_eq!(months[0].total_possible, 31);
    }

    #[test]
    fn stray_entries_count_toward_the_loose_monthly_total() {
        // The per-month completed count is not filtered by eligibility;
        // an entry predating its habit's creation still lands in January.
        let habit = habit_from("Read", day(2024, 3, 10), true);
        let entries = entries_for(&habit, &[day(2024, 1, 5)]);
        let months = monthly_overview(&[habit], &entries, 2024);

        assert_eq!(months[0].habits, 0);
        assert_eq!(months[0].completed, 1);
        assert_eq!(months[0].total_possible, 0);
        assert_eq!(months[0].percentage, 0.0, "zero possible still guards");
    }

    #[test]
    fn monthly_percentage_rounds_to_two_decimals() {
        let habit = habit_from("Read", day(2023, 12, 1), true);
        let entries = entries_for(
            &habit,
            &[
                day(2024, 1, 1),
                day(2024, 1, 2),
                day(2024, 1, 3),
                day(2024, 1, 4),
                day(2024, 1, 5),
            ],
        );
        let months = monthly_overview(&[habit], &entries, 2024);
        assert_eq!(months[0].completed, 5);
        assert_eq!(months[0].total_possible, 31);
        assert_eq!(months[0].percentage, 16.13);
        assert!(months[0].percentage >= 0.0 && months[0].percentage <= 100.0);
    }

    #[test]
    fn month_summary_counts_only_active_habits() {
        let active = habit_from("Run", day(2024, 1, 1), true);
        let archived = habit_from("Knit", day(2024, 1, 1), false);
        let mut entries = entries_for(
            &active,
            &[day(2024, 6, 1), day(2024, 6, 2), day(2024, 6, 3)],
        );
        entries.extend(entries_for(
            &archived,
            &[day(2024, 6, 1), day(2024, 6, 2), day(2024, 6, 3), day(2024, 6, 4)],
        ));

        let summary = month_summary(&[active, archived], &entries, 2024, 6);
        assert_eq!(summary.active_habits, 1);
        assert_eq!(summary.total_possible, 30, "one habit across 30 June days");
        assert_eq!(summary.completed, 3, "archived entries are excluded");
        assert_eq!(summary.not_completed, 27);
        assert_eq!(summary.completion_rate, 10.0);
    }

    #[test]
    fn month_summary_of_nothing_is_zeroed() {
        let summary = month_summary(&[], &[], 2024, 6);
        assert_eq!(summary, MonthSummary::default());
    }

    #[test]
    fn yearly_stats_match_the_read_scenario() {
        let habit = habit_from("Read", day(2024, 1, 10), true);
        let entries = entries_for(&habit, &[day(2024, 1, 10), day(2024, 1, 11)]);
        let stats = yearly_habit_stats(&[habit], &entries, 2024);

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].completed_days, 2);
        assert_eq!(stats[0].percentage, 0.5);
    }

    #[test]
    fn yearly_ranking_is_descending_and_stable_on_ties() {
        let a = habit_from("A", day(2024, 1, 1), true);
        let b = habit_from("B", day(2024, 1, 1), true);
        let c = habit_from("C", day(2024, 1, 1), false);
        let mut entries = entries_for(&a, &[day(2024, 2, 1)]);
        entries.extend(entries_for(&b, &[day(2024, 2, 1), day(2024, 2, 2)]));
        entries.extend(entries_for(&c, &[day(2024, 2, 3)]));
        // An entry outside the year must not count.
        entries.extend(entries_for(&b, &[day(2023, 12, 31)]));

        let stats = yearly_habit_stats(&[a.clone(), b.clone(), c.clone()], &entries, 2024);
        assert_eq!(stats[0].habit_id, b.id);
        assert_eq!(stats[0].completed_days, 2);
        assert_eq!(
            (stats[1].habit_id, stats[2].habit_id),
            (a.id, c.id),
            "equal counts keep input order, archived habits included"
        );
    }

    #[test]
    fn best_and_worst_resolve_ties_to_the_earliest_month() {
        let habit = habit_from("Read", day(2024, 1, 1), true);
        // January and February fully tied, March weaker.
        let mut entries = entries_for(&habit, &[day(2024, 3, 1)]);
        for d in 1..=31 {
            entries.push(Entry::new(habit.id, day(2024, 1, d)));
        }
        for d in 1..=29 {
            entries.push(Entry::new(habit.id, day(2024, 2, d)));
        }

        let months = monthly_overview(&[habit], &entries, 2024);
        assert_eq!(months[0].percentage, 100.0);
        assert_eq!(months[1].percentage, 100.0);

        let (best, worst) = best_and_worst(&months);
        assert_eq!(best.map(|m| m.month), Some(1), "best tie goes to January");
        assert_eq!(
            worst.map(|m| m.month),
            Some(4),
            "worst tie goes to the earliest of the empty months"
        );
    }

    #[test]
    fn streak_counts_back_from_today() {
        let habit = habit_from("Run", day(2024, 1, 1), true);
        let entries = entries_for(
            &habit,
            &[day(2024, 6, 8), day(2024, 6, 9), day(2024, 6, 10), day(2024, 6, 5)],
        );
        assert_eq!(current_streak(&entries, habit.id, day(2024, 6, 10)), 3);
        assert_eq!(
            current_streak(&entries, habit.id, day(2024, 6, 11)),
            0,
            "no entry today means no streak"
        );
    }

    #[test]
    fn streak_is_capped_at_a_year() {
        let habit = habit_from("Run", day(2020, 1, 1), true);
        let mut entries = Vec::new();
        let mut date = day(2024, 6, 10);
        for _ in 0..400 {
            entries.push(Entry::new(habit.id, date));
            date = date.pred_opt().unwrap();
        }
        assert_eq!(current_streak(&entries, habit.id, day(2024, 6, 10)), STREAK_CAP);
    }

    #[test]
    fn week_overview_depends_on_the_week_start() {
        let habit = habit_from("Read", day(2024, 1, 1), true);
        // 2024-06-09 is a Sunday, 2024-06-12 a Wednesday.
        let entries = entries_for(&habit, &[day(2024, 6, 9)]);

        let sunday_week = week_overview(&[habit.clone()], &entries, day(2024, 6, 12), Weekday::Sun);
        assert_eq!(sunday_week.start, day(2024, 6, 9));
        assert_eq!(sunday_week.completed, 1);
        assert_eq!(sunday_week.days[0].percentage, 100.0);
        assert_eq!(sunday_week.percentage, 14.3, "1 of 7 possible");

        let monday_week = week_overview(&[habit], &entries, day(2024, 6, 12), Weekday::Mon);
        assert_eq!(monday_week.start, day(2024, 6, 10));
        assert_eq!(monday_week.completed, 0, "the Sunday entry falls outside");
        assert_eq!(monday_week.percentage, 0.0);
    }

    #[test]
    fn week_overview_with_no_active_habits_is_all_zero() {
        let archived = habit_from("Knit", day(2024, 1, 1), false);
        let overview = week_overview(&[archived], &[], day(2024, 6, 12), Weekday::Sun);
        assert_eq!(overview.total_possible, 0);
        assert_eq!(overview.percentage, 0.0);
        assert!(overview.days.iter().all(|d| d.percentage == 0.0));
    }

    #[test]
    fn month_weeks_clip_to_the_month() {
        // June 2024 starts on a Saturday.
        let weeks = month_weeks(2024, 6);
        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[0], vec![day(2024, 6, 1), day(2024, 6, 2)]);
        assert_eq!(weeks[4].last(), Some(&day(2024, 6, 30)));
        let total_days: usize = weeks.iter().map(|w| w.len()).sum();
        assert_eq!(total_days, 30, "every June day appears exactly once");
    }

    #[test]
    fn week_summaries_use_active_habits_and_clipped_weeks() {
        let habit = habit_from("Read", day(2024, 1, 1), true);
        let entries = entries_for(&habit, &[day(2024, 6, 1)]);
        let summaries = week_summaries(&[habit], &entries, 2024, 6);

        assert_eq!(summaries.len(), 5);
        assert_eq!(summaries[0].index, 1);
        assert_eq!(summaries[0].total_possible, 2, "first week holds two June days");
        assert_eq!(summaries[0].completed, 1);
        assert_eq!(summaries[0].percentage, 50.0);
        assert_eq!(summaries[1].total_possible, 7);
        assert_eq!(summaries[1].completed, 0);
    }

    #[test]
    fn habit_month_progress_ranks_by_percentage() {
        let reader = habit_from("Read", day(2024, 1, 1), true);
        let runner = habit_from("Run", day(2024, 1, 1), true);
        let archived = habit_from("Knit", day(2024, 1, 1), false);
        let mut entries = entries_for(&reader, &[day(2024, 6, 1)]);
        entries.extend(entries_for(&runner, &[day(2024, 6, 1), day(2024, 6, 2)]));

        let rows = habit_month_progress(
            &[reader.clone(), runner.clone(), archived],
            &entries,
            2024,
            6,
        );
        assert_eq!(rows.len(), 2, "archived habits are excluded");
        assert_eq!(rows[0].habit_id, runner.id);
        assert_eq!(rows[0].completed_days, 2);
        assert_eq!(rows[0].total_days, 30);
        assert_eq!(rows[0].percentage, 6.7);
        assert_eq!(rows[1].habit_id, reader.id);
    }
}
