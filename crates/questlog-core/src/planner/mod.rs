//! Suggested task order for the day and the week.
//!
//! Open tasks are stable-sorted by urgency score and dropped into
//! morning/afternoon/evening buckets by their own score, never by rank.

mod weekly;

pub use weekly::{DayFocus, DayPlan, WeeklyPlan};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scoring;
use crate::task::Task;

/// Coarse time-of-day grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Planner thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Minimum score for the morning bucket
    #[serde(default = "default_morning_threshold")]
    pub morning_threshold: i64,
    /// Minimum score for the afternoon bucket
    #[serde(default = "default_afternoon_threshold")]
    pub afternoon_threshold: i64,
    /// Cap on tasks per day in the weekly plan
    #[serde(default = "default_max_tasks_per_day")]
    pub max_tasks_per_day: usize,
}

fn default_morning_threshold() -> i64 {
    150
}
fn default_afternoon_threshold() -> i64 {
    80
}
fn default_max_tasks_per_day() -> usize {
    5
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            morning_threshold: default_morning_threshold(),
            afternoon_threshold: default_afternoon_threshold(),
            max_tasks_per_day: default_max_tasks_per_day(),
        }
    }
}

/// A task paired with the score it was planned under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTask {
    pub score: i64,
    pub task: Task,
}

/// Three score-ordered sequences. Together they partition the open input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyPlan {
    pub morning: Vec<ScoredTask>,
    pub afternoon: Vec<ScoredTask>,
    pub evening: Vec<ScoredTask>,
}

impl DailyPlan {
    pub fn len(&self) -> usize {
        self.morning.len() + self.afternoon.len() + self.evening.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bucket(&self, slot: TimeOfDay) -> &[ScoredTask] {
        match slot {
            TimeOfDay::Morning => &self.morning,
            TimeOfDay::Afternoon => &self.afternoon,
            TimeOfDay::Evening => &self.evening,
        }
    }
}

/// Day and week planner.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    /// Create a planner with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom thresholds
    pub fn with_config(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Bucket for a single score.
    pub fn bucket_for(&self, score: i64) -> TimeOfDay {
        if score >= self.config.morning_threshold {
            TimeOfDay::Morning
        } else if score >= self.config.afternoon_threshold {
            TimeOfDay::Afternoon
        } else {
            TimeOfDay::Evening
        }
    }

    /// Split pending and in-progress tasks into time-of-day buckets.
    pub fn suggested_order(&self, tasks: &[Task], now: DateTime<Utc>) -> DailyPlan {
        let open = tasks.iter().filter(|t| t.status.is_open());
        let mut plan = DailyPlan::default();
        for (score, task) in scoring::sort_by_priority(open, now) {
            let entry = ScoredTask {
                score,
                task: task.clone(),
            };
            match self.bucket_for(score) {
                TimeOfDay::Morning => plan.morning.push(entry),
                TimeOfDay::Afternoon => plan.afternoon.push(entry),
                TimeOfDay::Evening => plan.evening.push(entry),
            }
        }
        plan
    }

    /// Spread pending tasks over the Sunday-starting week containing `now`.
    pub fn weekly_plan(&self, tasks: &[Task], now: DateTime<Utc>) -> WeeklyPlan {
        weekly::build(tasks, now, self.config.max_tasks_per_day)
    }
}

/// [`Planner::suggested_order`] with default thresholds.
pub fn suggested_order(tasks: &[Task], now: DateTime<Utc>) -> DailyPlan {
    Planner::new().suggested_order(tasks, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskPriority, TaskStatus};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 10, 0, 0).unwrap()
    }

    fn task(priority: TaskPriority, status: TaskStatus, due_in_days: Option<i64>) -> Task {
        let mut t = Task::new("u1", "task", priority, now()).unwrap();
        t.status = status;
        t.due_date = due_in_days.map(|d| now() + Duration::days(d));
        t
    }

    #[test]
    fn test_empty_input_yields_empty_buckets() {
        let plan = suggested_order(&[], now());
        assert!(plan.morning.is_empty());
        assert!(plan.afternoon.is_empty());
        assert!(plan.evening.is_empty());
    }

    #[test]
    fn test_bucket_thresholds() {
        let planner = Planner::new();
        assert_eq!(planner.bucket_for(150), TimeOfDay::Morning);
        assert_eq!(planner.bucket_for(149), TimeOfDay::Afternoon);
        assert_eq!(planner.bucket_for(80), TimeOfDay::Afternoon);
        assert_eq!(planner.bucket_for(79), TimeOfDay::Evening);
        assert_eq!(planner.bucket_for(-900), TimeOfDay::Evening);
    }

    #[test]
    fn test_completed_and_archived_are_filtered() {
        let tasks = vec![
            task(TaskPriority::High, TaskStatus::Completed, Some(0)),
            task(TaskPriority::High, TaskStatus::Archived, Some(0)),
            task(TaskPriority::Low, TaskStatus::Pending, None),
        ];
        let plan = suggested_order(&tasks, now());
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.evening[0].task.id, tasks[2].id);
    }

    #[test]
    fn test_buckets_are_score_ordered() {
        let tasks = vec![
            task(TaskPriority::Low, TaskStatus::Pending, None),       // 10
            task(TaskPriority::High, TaskStatus::Pending, Some(-1)),  // 300
            task(TaskPriority::Medium, TaskStatus::InProgress, Some(3)), // 140
            task(TaskPriority::High, TaskStatus::Pending, Some(0)),   // 250
            task(TaskPriority::Medium, TaskStatus::Pending, Some(2)), // 130
        ];
        let plan = suggested_order(&tasks, now());
        let scores = |b: &[ScoredTask]| b.iter().map(|s| s.score).collect::<Vec<_>>();
        assert_eq!(scores(&plan.morning), vec![300, 250]);
        assert_eq!(scores(&plan.afternoon), vec![140, 130]);
        assert_eq!(scores(&plan.evening), vec![10]);
    }

    #[test]
    fn test_custom_thresholds() {
        let planner = Planner::with_config(PlannerConfig {
            morning_threshold: 40,
            afternoon_threshold: 20,
            ..Default::default()
        });
        let tasks = vec![task(TaskPriority::Medium, TaskStatus::Pending, None)];
        let plan = planner.suggested_order(&tasks, now());
        assert_eq!(plan.bucket(TimeOfDay::Morning).len(), 1);
    }
}
