//! Habit commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use questlog_core::streak::{calculate_streak_from_log, StreakBreak, StreakSummary};
use questlog_core::HabitFrequency;
use serde::Serialize;

use super::{open_tracker, print_json};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Create {
        /// Habit title
        title: String,
        /// daily, weekly, or custom:<days> with Sunday = 0 (e.g. custom:1,3,5)
        #[arg(long, default_value = "daily")]
        frequency: String,
        /// Habit description
        #[arg(long)]
        description: Option<String>,
    },
    /// List habits
    List {
        /// Include archived habits
        #[arg(long)]
        all: bool,
    },
    /// Record a completion for today
    Complete {
        /// Habit ID
        id: String,
        /// Optional note stored with the log entry
        #[arg(long)]
        notes: Option<String>,
    },
    /// Archive a habit
    Archive {
        /// Habit ID
        id: String,
    },
    /// Show the completion log
    Log {
        /// Habit ID
        id: String,
    },
    /// Streak status and values derived from the log
    Status {
        /// Habit ID
        id: String,
    },
    /// Rebuild cached streak values from the log
    Reconcile {
        /// Habit ID
        id: String,
    },
}

#[derive(Serialize)]
struct HabitStatus {
    id: String,
    title: String,
    cached: StreakSummary,
    from_log: StreakSummary,
    streak: StreakBreak,
}

pub fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let (tracker, _config) = open_tracker()?;
    let now = Utc::now();

    match action {
        HabitAction::Create {
            title,
            frequency,
            description,
        } => {
            let frequency = HabitFrequency::parse(&frequency)?;
            let created = tracker.create_habit(&title, frequency, description, now)?;
            eprintln!("Habit created: {}", created.habit.id);
            print_json(&created)?;
        }
        HabitAction::List { all } => {
            print_json(&tracker.habits(all)?)?;
        }
        HabitAction::Complete { id, notes } => {
            print_json(&tracker.complete_habit(&id, now, notes)?)?;
        }
        HabitAction::Archive { id } => {
            print_json(&tracker.archive_habit(&id)?)?;
        }
        HabitAction::Log { id } => {
            print_json(&tracker.habit_logs(&id)?)?;
        }
        HabitAction::Status { id } => {
            let today = now.date_naive();
            let habit = tracker.habit(&id)?;
            let logs = tracker.habit_logs(&id)?;
            let status = HabitStatus {
                cached: StreakSummary {
                    current_streak: habit.current_streak,
                    longest_streak: habit.longest_streak,
                    last_completed_date: habit.last_completed_date,
                },
                from_log: calculate_streak_from_log(&logs, today),
                streak: tracker.streak_status(&id, today)?,
                id: habit.id,
                title: habit.title,
            };
            print_json(&status)?;
        }
        HabitAction::Reconcile { id } => {
            print_json(&tracker.reconcile_habit(&id, now)?)?;
        }
    }
    Ok(())
}
