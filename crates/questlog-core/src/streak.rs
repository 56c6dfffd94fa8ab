//! Day-granular habit streaks.
//!
//! The completion log is the source of truth. The `current_streak`,
//! `longest_streak` and `last_completed_date` fields on [`Habit`] are a
//! cached projection: [`complete`] advances it incrementally, and
//! [`reconcile`] rebuilds it from the log when the two may have diverged
//! (out-of-order writes, concurrent completions, external edits).
//!
//! Transition on completion, with `d` = days since the last completed date:
//!
//! | Prior state        | Result                    |
//! |--------------------|---------------------------|
//! | never completed    | current = 1               |
//! | d == 0             | current unchanged         |
//! | d == 1             | current + 1               |
//! | d > 1              | current = 1               |
//! | d < 0 (late write) | unchanged, needs reconcile|
//!
//! `longest = max(longest, current)` after every transition.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::habit::{Habit, HabitFrequency, HabitLog};

/// What a completion did to the cached streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreakTransition {
    /// First completion ever
    Started,
    /// Already completed today
    SameDay,
    /// Completed the day after the last completion
    Extended,
    /// Gap of more than one day
    Reset { gap_days: i64 },
    /// Completion dated before the last completed date; projection left as is
    OutOfOrder { days_before: i64 },
}

/// Result of [`complete`]: the updated habit and the log entry to append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub habit: Habit,
    pub log: HabitLog,
    pub transition: StreakTransition,
}

/// Apply a completion on calendar day `today` to the cached projection.
pub fn apply(habit: &mut Habit, today: NaiveDate) -> StreakTransition {
    let transition = match habit.last_completed_date {
        None => StreakTransition::Started,
        Some(last) => match (today - last).num_days() {
            0 => StreakTransition::SameDay,
            1 => StreakTransition::Extended,
            d if d > 1 => StreakTransition::Reset { gap_days: d },
            d => StreakTransition::OutOfOrder { days_before: -d },
        },
    };

    match transition {
        StreakTransition::Started | StreakTransition::Reset { .. } => habit.current_streak = 1,
        StreakTransition::Extended => habit.current_streak += 1,
        StreakTransition::SameDay => {}
        StreakTransition::OutOfOrder { days_before } => {
            tracing::warn!(
                habit_id = %habit.id,
                days_before,
                "completion predates last completed date; reconcile from log"
            );
            return transition;
        }
    }

    habit.longest_streak = habit.longest_streak.max(habit.current_streak);
    habit.last_completed_date = Some(today);
    transition
}

/// Complete `habit` at `now`.
///
/// The returned log entry is produced unconditionally, including for a
/// same-day re-completion: the log is an audit trail, not a dedup set.
pub fn complete(habit: &Habit, now: DateTime<Utc>, notes: Option<String>) -> Completion {
    let mut updated = habit.clone();
    let transition = apply(&mut updated, now.date_naive());
    Completion {
        log: HabitLog::new(habit, now, notes),
        habit: updated,
        transition,
    }
}

/// Streak values derived from the log alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakSummary {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_completed_date: Option<NaiveDate>,
}

/// Rebuild streak values from the completion log.
///
/// Entries collapse to unique calendar dates. The current streak counts back
/// from today, or from yesterday when today has no completion yet (one-day
/// grace). The longest streak is the longest consecutive run anywhere.
pub fn calculate_streak_from_log(logs: &[HabitLog], today: NaiveDate) -> StreakSummary {
    calculate_streak_from_dates(logs.iter().map(HabitLog::date), today)
}

/// [`calculate_streak_from_log`] over bare dates.
pub fn calculate_streak_from_dates<I>(dates: I, today: NaiveDate) -> StreakSummary
where
    I: IntoIterator<Item = NaiveDate>,
{
    let unique: BTreeSet<NaiveDate> = dates.into_iter().collect();
    let Some(&last) = unique.iter().next_back() else {
        return StreakSummary::default();
    };

    let yesterday = today - Duration::days(1);
    let anchor = if unique.contains(&today) {
        Some(today)
    } else if unique.contains(&yesterday) {
        Some(yesterday)
    } else {
        None
    };

    let mut current = 0u32;
    if let Some(mut day) = anchor {
        while unique.contains(&day) {
            current += 1;
            day = day - Duration::days(1);
        }
    }

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for &date in &unique {
        run = match prev {
            Some(p) if (date - p).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(date);
    }

    StreakSummary {
        current_streak: current,
        longest_streak: longest,
        last_completed_date: Some(last),
    }
}

/// Outcome of rebuilding the cached projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub before: StreakSummary,
    pub after: StreakSummary,
}

impl Reconciliation {
    pub fn drifted(&self) -> bool {
        self.before != self.after
    }
}

/// Overwrite the habit's cached streak fields with values derived from `logs`.
///
/// Only entries belonging to `habit` are considered.
pub fn reconcile(habit: &mut Habit, logs: &[HabitLog], today: NaiveDate) -> Reconciliation {
    let before = StreakSummary {
        current_streak: habit.current_streak,
        longest_streak: habit.longest_streak,
        last_completed_date: habit.last_completed_date,
    };
    let after = calculate_streak_from_dates(
        logs.iter()
            .filter(|l| l.habit_id == habit.id)
            .map(HabitLog::date),
        today,
    );

    habit.current_streak = after.current_streak;
    habit.longest_streak = after.longest_streak;
    habit.last_completed_date = after.last_completed_date;

    let result = Reconciliation { before, after };
    if result.drifted() {
        tracing::info!(
            habit_id = %habit.id,
            cached_current = before.current_streak,
            cached_longest = before.longest_streak,
            current = after.current_streak,
            longest = after.longest_streak,
            "streak projection rebuilt from log"
        );
    }
    result
}

/// Whether a habit's streak has lapsed as of `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StreakBreak {
    Intact,
    Broken { days_since: i64 },
    /// Custom schedules have no break rule yet
    NotEvaluated,
}

/// Check for a lapsed streak: daily after more than 1 day, weekly after more than 7.
pub fn check_streak_break(habit: &Habit, today: NaiveDate) -> StreakBreak {
    let Some(last) = habit.last_completed_date else {
        return StreakBreak::Intact;
    };
    let days_since = (today - last).num_days();
    let limit = match habit.frequency {
        HabitFrequency::Daily => 1,
        HabitFrequency::Weekly => 7,
        HabitFrequency::Custom { .. } => {
            tracing::debug!(habit_id = %habit.id, "streak break not evaluated for custom schedule");
            return StreakBreak::NotEvaluated;
        }
    };
    if days_since > limit {
        StreakBreak::Broken { days_since }
    } else {
        StreakBreak::Intact
    }
}
