//! Task and habit operations over the store.
//!
//! Each mutating call persists the record first, then evaluates badges
//! against the stored history, stores what was newly earned and only then
//! announces it on the event sink.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::events::{publish_or_warn, Event, EventSink, NullSink};
use crate::gamification::{AwardEvent, Badge, BadgeLedger, GamificationEngine};
use crate::habit::{Habit, HabitFrequency, HabitLog};
use crate::planner::{DailyPlan, Planner, WeeklyPlan};
use crate::stats::{DailySnapshot, Insights, InsightsAnalyzer};
use crate::storage::{Config, Database};
use crate::streak::{self, Reconciliation, StreakBreak, StreakTransition};
use crate::task::{Task, TaskPriority, TaskStatus};

/// Fields for a new task.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub priority: TaskPriority,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub task: Task,
    /// Badges stored by this completion
    pub badges: Vec<Badge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitCompletion {
    pub habit: Habit,
    pub log: HabitLog,
    pub transition: StreakTransition,
    pub badges: Vec<Badge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitCreation {
    pub habit: Habit,
    pub badges: Vec<Badge>,
}

pub struct Tracker {
    db: Database,
    owner_id: String,
    engine: GamificationEngine,
    planner: Planner,
    analyzer: InsightsAnalyzer,
}

impl Tracker {
    /// Tracker with default thresholds and no event sink.
    pub fn new(db: Database, owner_id: impl Into<String>) -> Self {
        Self {
            db,
            owner_id: owner_id.into(),
            engine: GamificationEngine::new(Arc::new(NullSink)),
            planner: Planner::new(),
            analyzer: InsightsAnalyzer::new(),
        }
    }

    pub fn from_config(db: Database, config: &Config, sink: Arc<dyn EventSink>) -> Self {
        Self {
            db,
            owner_id: config.owner_id.clone(),
            engine: GamificationEngine::new(sink),
            planner: Planner::with_config(config.planner.clone()),
            analyzer: InsightsAnalyzer::with_config(config.insights.clone()),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.engine = GamificationEngine::new(sink);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    // =========================================================================
    // tasks
    // =========================================================================

    pub fn create_task(&self, draft: TaskDraft, now: DateTime<Utc>) -> Result<Task> {
        let mut task = Task::new(&self.owner_id, draft.title, draft.priority, now)?;
        task.description = draft.description.filter(|d| !d.trim().is_empty());
        task.due_date = draft.due_date;
        task.tags = draft.tags;
        self.db.insert_task(&task)?;
        tracing::debug!(task = %task.id, "task created");
        Ok(task)
    }

    pub fn task(&self, id: &str) -> Result<Task> {
        self.db.get_task(&self.owner_id, id)
    }

    pub fn tasks(&self) -> Result<Vec<Task>> {
        self.db.list_tasks(&self.owner_id)
    }

    pub fn start_task(&self, id: &str, now: DateTime<Utc>) -> Result<Task> {
        self.transition_task(id, TaskStatus::InProgress, now, Task::start)
    }

    pub fn archive_task(&self, id: &str, now: DateTime<Utc>) -> Result<Task> {
        self.transition_task(id, TaskStatus::Archived, now, Task::archive)
    }

    /// Complete a task and award any badges it earns.
    ///
    /// # Errors
    /// `NotFound` for an unknown id, `Validation` if the task is already
    /// completed or archived.
    pub fn complete_task(&self, id: &str, now: DateTime<Utc>) -> Result<TaskCompletion> {
        let task = self.transition_task(id, TaskStatus::Completed, now, Task::complete)?;
        publish_or_warn(
            self.engine.sink(),
            &Event::TaskCompleted {
                task_id: task.id.clone(),
                title: task.title.clone(),
                at: now,
            },
        );

        let badges = match self.tasks() {
            Ok(tasks) => {
                let completed: Vec<Task> = tasks.into_iter().filter(Task::is_completed).collect();
                self.award(
                    AwardEvent::TaskCompleted {
                        task: &task,
                        completed_tasks: &completed,
                    },
                    now,
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, task = %task.id, "skipping badges: cannot read task history");
                Vec::new()
            }
        };
        Ok(TaskCompletion { task, badges })
    }

    fn transition_task(
        &self,
        id: &str,
        to: TaskStatus,
        now: DateTime<Utc>,
        apply: fn(&mut Task, DateTime<Utc>) -> bool,
    ) -> Result<Task> {
        let mut task = self.task(id)?;
        let from = task.status;
        if !apply(&mut task, now) {
            return Err(ValidationError::InvalidValue {
                field: "status",
                message: format!("cannot move task from {from} to {to}"),
            }
            .into());
        }
        self.db.update_task(&task)?;
        Ok(task)
    }

    // =========================================================================
    // habits
    // =========================================================================

    pub fn create_habit(
        &self,
        title: &str,
        frequency: HabitFrequency,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<HabitCreation> {
        let mut habit = Habit::new(&self.owner_id, title, frequency, now)?;
        habit.description = description.filter(|d| !d.trim().is_empty());
        self.db.insert_habit(&habit)?;

        let badges = match self.db.count_habits(&self.owner_id) {
            Ok(habit_count) => self.award(AwardEvent::HabitCreated { habit_count }, now),
            Err(e) => {
                tracing::warn!(error = %e, habit = %habit.id, "skipping badges: cannot count habits");
                Vec::new()
            }
        };
        Ok(HabitCreation { habit, badges })
    }

    pub fn habit(&self, id: &str) -> Result<Habit> {
        self.db.get_habit(&self.owner_id, id)
    }

    pub fn habits(&self, include_archived: bool) -> Result<Vec<Habit>> {
        self.db.list_habits(&self.owner_id, include_archived)
    }

    pub fn habit_logs(&self, id: &str) -> Result<Vec<HabitLog>> {
        self.db.habit_logs(&self.owner_id, id)
    }

    /// Append a completion, advance the streak and award streak badges.
    ///
    /// # Errors
    /// `NotFound` for an unknown id, `Validation` for an archived habit.
    pub fn complete_habit(
        &self,
        id: &str,
        now: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<HabitCompletion> {
        let habit = self.habit(id)?;
        if habit.archived {
            return Err(ValidationError::InvalidValue {
                field: "habit",
                message: format!("habit '{}' is archived", habit.title),
            }
            .into());
        }

        let completion = streak::complete(&habit, now, notes);
        self.db
            .record_habit_completion(&completion.habit, &completion.log)?;
        publish_or_warn(
            self.engine.sink(),
            &Event::HabitCompleted {
                habit_id: completion.habit.id.clone(),
                title: completion.habit.title.clone(),
                transition: completion.transition,
                current_streak: completion.habit.current_streak,
                at: now,
            },
        );

        let badges = self.award(
            AwardEvent::HabitCompleted {
                habit: &completion.habit,
            },
            now,
        );
        Ok(HabitCompletion {
            habit: completion.habit,
            log: completion.log,
            transition: completion.transition,
            badges,
        })
    }

    pub fn archive_habit(&self, id: &str) -> Result<Habit> {
        let mut habit = self.habit(id)?;
        habit.archived = true;
        self.db.update_habit(&habit)?;
        Ok(habit)
    }

    /// Rebuild the cached streak fields from the log.
    pub fn reconcile_habit(&self, id: &str, now: DateTime<Utc>) -> Result<Reconciliation> {
        let mut habit = self.habit(id)?;
        let logs = self.habit_logs(id)?;
        let result = streak::reconcile(&mut habit, &logs, now.date_naive());
        if result.drifted() {
            self.db.update_habit(&habit)?;
            publish_or_warn(
                self.engine.sink(),
                &Event::StreakReconciled {
                    habit_id: habit.id.clone(),
                    before: result.before,
                    after: result.after,
                    at: now,
                },
            );
        }
        Ok(result)
    }

    pub fn streak_status(&self, id: &str, today: NaiveDate) -> Result<StreakBreak> {
        Ok(streak::check_streak_break(&self.habit(id)?, today))
    }

    // =========================================================================
    // read models
    // =========================================================================

    pub fn daily_plan(&self, now: DateTime<Utc>) -> Result<DailyPlan> {
        Ok(self.planner.suggested_order(&self.tasks()?, now))
    }

    pub fn weekly_plan(&self, now: DateTime<Utc>) -> Result<WeeklyPlan> {
        Ok(self.planner.weekly_plan(&self.tasks()?, now))
    }

    pub fn insights(&self, now: DateTime<Utc>) -> Result<Insights> {
        let tasks = self.tasks()?;
        let pending = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .count();
        Ok(self.analyzer.analyze_tasks(&tasks, pending, now))
    }

    pub fn snapshot(&self, date: NaiveDate) -> Result<DailySnapshot> {
        Ok(DailySnapshot::capture(
            &self.tasks()?,
            &self.habits(true)?,
            date,
        ))
    }

    pub fn badges(&self) -> Result<BadgeLedger> {
        Ok(BadgeLedger::new(
            self.owner_id.clone(),
            self.db.list_badges(&self.owner_id)?,
        ))
    }

    /// Evaluate, store and announce badges for a change that is already
    /// persisted. Storage failures are logged and never undo that change;
    /// missed milestones are picked up by the next qualifying event.
    fn award(&self, event: AwardEvent<'_>, now: DateTime<Utc>) -> Vec<Badge> {
        let mut ledger = match self.badges() {
            Ok(ledger) => ledger,
            Err(e) => {
                tracing::warn!(error = %e, "skipping badges: cannot read earned badges");
                return Vec::new();
            }
        };
        let mut stored = Vec::new();
        for badge in self.engine.evaluate(&mut ledger, event, now) {
            match self.db.insert_badge(&badge) {
                Ok(true) => stored.push(badge),
                Ok(false) => tracing::debug!(badge = %badge.badge_type, "badge already stored"),
                Err(e) => {
                    tracing::warn!(error = %e, badge = %badge.badge_type, "badge not stored")
                }
            }
        }
        self.engine.announce(&stored);
        stored
    }
}
