use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate, Weekday};
use habit_core::habit::{Habit, HabitId};
use habit_core::HabitService;
use tracing::info;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) data_dir: PathBuf,
    pub(crate) week_start: Weekday,
    pub(crate) year: Option<i32>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(home) = std::env::var("HABIT_HOME") {
            if !home.trim().is_empty() {
                config.data_dir = PathBuf::from(home);
            }
        }
        if let Ok(start) = std::env::var("HABIT_WEEK_START") {
            if let Ok(value) = start.trim().parse::<Weekday>() {
                config.week_start = value;
            }
        }
        if let Ok(year) = std::env::var("HABIT_YEAR") {
            if let Ok(value) = year.trim().parse::<i32>() {
                config.year = Some(value);
            }
        }
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".habits"),
            week_start: Weekday::Sun,
            year: None,
        }
    }
}

/// Loads the tracker and prints the dashboard and analytics views. The
/// report is read-only; mutations belong to the interactive surface this
/// shell stands in for.
pub fn run(config: AppConfig) -> Result<()> {
    info!(data_dir = %config.data_dir.display(), "starting habit tracker");
    let service = HabitService::builder()
        .data_dir(&config.data_dir)
        .build()?;

    let today = Local::now().date_naive();
    let year = config.year.unwrap_or_else(|| today.year());
    render_report(&service, today, year, config.week_start);
    Ok(())
}

fn render_report(service: &HabitService, today: NaiveDate, year: i32, week_start: Weekday) {
    let habits = service.habits();
    let by_id: HashMap<HabitId, &Habit> = habits.iter().map(|h| (h.id, h)).collect();

    println!(
        "Habit Tracker — {} (theme: {})",
        today.format("%A, %B %-d %Y"),
        service.theme()
    );

    if habits.is_empty() {
        println!("\nNo habits yet. Start tracking to see insights!");
        return;
    }

    let summary = service.month_summary(today.year(), today.month());
    println!("\nThis Month");
    println!("  active habits    {}", summary.active_habits);
    println!("  completed        {}", summary.completed);
    println!("  not completed    {}", summary.not_completed);
    println!("  completion rate  {:.1}%", summary.completion_rate);

    println!("\nHabit Progress (this month)");
    let progress = service.habit_month_progress(today.year(), today.month());
    if progress.is_empty() {
        println!("  no active habits");
    }
    for row in &progress {
        let Some(habit) = by_id.get(&row.habit_id) else {
            continue;
        };
        let streak = service.current_streak(row.habit_id, today);
        let streak_note = if streak > 0 {
            format!("  🔥 {streak}-day streak")
        } else {
            String::new()
        };
        println!(
            "  {} {:<20} {:>3}/{} days  {:>5.1}%{}",
            habit.icon, habit.name, row.completed_days, row.total_days, row.percentage,
            streak_note
        );
    }

    println!("\nThis Week");
    let week = service.week_overview(today, week_start);
    for day in &week.days {
        println!(
            "  {} {}  {:>2}/{}  {:>5.1}%",
            day.label,
            day.date.format("%m-%d"),
            day.completed,
            day.total,
            day.percentage
        );
    }
    println!(
        "  week total {}/{} ({:.1}%)",
        week.completed, week.total_possible, week.percentage
    );

    println!("\nWeekly Summary ({})", today.format("%B"));
    for summary in service.week_summaries(today.year(), today.month()) {
        println!(
            "  week {}  {} – {}  {:>2}/{}  {:>5.1}%",
            summary.index,
            summary.start.format("%b %-d"),
            summary.end.format("%b %-d"),
            summary.completed,
            summary.total_possible,
            summary.percentage
        );
    }

    println!("\nYearly Analytics — {year}");
    for month in service.monthly_overview(year) {
        println!(
            "  {}  {:>2} habit(s)  {:>3}/{:<4}  {:>6.2}%",
            month.label, month.habits, month.completed, month.total_possible, month.percentage
        );
    }

    let (best, worst) = service.performance_highlights(year);
    match (best, worst) {
        (Some(best), Some(worst)) => {
            println!("  best month   {} ({:.2}%)", best.full_label, best.percentage);
            println!("  worst month  {} ({:.2}%)", worst.full_label, worst.percentage);
        }
        _ => println!("  no tracked months yet"),
    }

    println!("\nHabit Performance (yearly)");
    for row in service.yearly_habit_stats(year) {
        let Some(habit) = by_id.get(&row.habit_id) else {
            continue;
        };
        let status = if habit.active { "" } else { "  (archived)" };
        println!(
            "  {} {:<20} {:>3} days  {:>5.1}%  [{}]{}",
            habit.icon, habit.name, row.completed_days, row.percentage, habit.category, status
        );
    }
}
