//! Per-day productivity snapshots and their rolling summary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::habit::Habit;
use crate::task::{Task, TaskStatus};

/// Weight of the task completion rate in the productivity score.
const TASK_WEIGHT: f64 = 0.6;
/// Weight of the habit completion rate in the productivity score.
const HABIT_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    /// Tasks whose completion falls on `date`
    pub tasks_completed: usize,
    /// Non-archived tasks
    pub tasks_total: usize,
    /// Active habits last completed on `date`
    pub habits_completed: usize,
    /// Non-archived habits
    pub habits_total: usize,
    /// 0-100
    pub productivity_score: u32,
}

impl DailySnapshot {
    /// Capture the state of `tasks` and `habits` for `date`.
    pub fn capture(tasks: &[Task], habits: &[Habit], date: NaiveDate) -> Self {
        let tasks_completed = tasks
            .iter()
            .filter(|t| t.completed_at.is_some_and(|at| at.date_naive() == date))
            .count();
        let tasks_total = tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Archived)
            .count();
        let all_completed = tasks.iter().filter(|t| t.is_completed()).count();

        let active: Vec<&Habit> = habits.iter().filter(|h| !h.archived).collect();
        let habits_completed = active
            .iter()
            .filter(|h| h.last_completed_date == Some(date))
            .count();

        let task_rate = percent(all_completed, tasks_total);
        let habit_rate = percent(habits_completed, active.len());
        let productivity_score = (task_rate * TASK_WEIGHT + habit_rate * HABIT_WEIGHT).round() as u32;

        Self {
            date,
            tasks_completed,
            tasks_total,
            habits_completed,
            habits_total: active.len(),
            productivity_score,
        }
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub tasks: usize,
    pub habits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestDay {
    pub date: NaiveDate,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub total_tasks_completed: usize,
    pub total_habits_completed: usize,
    pub average_productivity_score: u32,
    pub best_day: Option<BestDay>,
    pub completion_trend: Vec<TrendPoint>,
}

/// Summarize snapshots in the given order. The first highest score is the best day.
pub fn summarize(snapshots: &[DailySnapshot]) -> SnapshotSummary {
    let total_tasks_completed = snapshots.iter().map(|s| s.tasks_completed).sum();
    let total_habits_completed = snapshots.iter().map(|s| s.habits_completed).sum();
    let average_productivity_score = if snapshots.is_empty() {
        0
    } else {
        let sum: u32 = snapshots.iter().map(|s| s.productivity_score).sum();
        (sum as f64 / snapshots.len() as f64).round() as u32
    };

    let mut best_day: Option<BestDay> = None;
    for s in snapshots {
        if best_day.as_ref().map_or(true, |b| s.productivity_score > b.score) {
            best_day = Some(BestDay {
                date: s.date,
                score: s.productivity_score,
            });
        }
    }

    SnapshotSummary {
        total_tasks_completed,
        total_habits_completed,
        average_productivity_score,
        best_day,
        completion_trend: snapshots
            .iter()
            .map(|s| TrendPoint {
                date: s.date,
                tasks: s.tasks_completed,
                habits: s.habits_completed,
            })
            .collect(),
    }
}
