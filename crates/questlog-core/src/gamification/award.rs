//! Badge awarding.
//!
//! The engine decides which badges an event earns against a snapshot of what
//! the owner already holds. Persisting the result and announcing it are
//! separate steps so a front end only ever hears about stored badges.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::badges::{BadgeDefinition, BadgeType, MetadataFamily};
use super::level::{calculate_level, LevelProgress};
use crate::events::{publish_or_warn, Event, EventSink, NullSink};
use crate::habit::Habit;
use crate::task::Task;

const TASK_MILESTONES: [(usize, BadgeType); 4] = [
    (1, BadgeType::FirstTask),
    (10, BadgeType::TaskMaster10),
    (50, BadgeType::TaskMaster50),
    (100, BadgeType::TaskMaster100),
];

const STREAK_MILESTONES: [(u32, BadgeType); 3] = [
    (7, BadgeType::StreakMaster7),
    (30, BadgeType::StreakMaster30),
    (100, BadgeType::StreakMaster100),
];

const WARRIOR_MILESTONES: [(u32, BadgeType); 3] = [
    (7, BadgeType::HabitWarrior7),
    (30, BadgeType::HabitWarrior30),
    (100, BadgeType::HabitWarrior100),
];

const EARLY_HOUR: u32 = 9;
const LATE_HOUR: u32 = 21;
const TIME_OF_DAY_COUNT: usize = 5;
const SAME_DAY_COUNT: usize = 10;

/// Extra data recorded with a badge. The shape is fixed by the badge type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BadgeMetadata {
    None,
    Task {
        task_id: String,
    },
    Habit {
        habit_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        streak: Option<u32>,
    },
    Date {
        date: NaiveDate,
    },
}

impl BadgeMetadata {
    pub fn family(&self) -> MetadataFamily {
        match self {
            BadgeMetadata::None => MetadataFamily::None,
            BadgeMetadata::Task { .. } => MetadataFamily::Task,
            BadgeMetadata::Habit { .. } => MetadataFamily::Habit,
            BadgeMetadata::Date { .. } => MetadataFamily::Date,
        }
    }
}

/// Uniqueness key: one per task for `task_completed`, one per owner otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BadgeKey {
    OneTime(BadgeType),
    PerTask(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub owner_id: String,
    pub badge_type: BadgeType,
    pub earned_at: DateTime<Utc>,
    pub metadata: BadgeMetadata,
}

impl Badge {
    pub fn new(
        owner_id: impl Into<String>,
        badge_type: BadgeType,
        metadata: BadgeMetadata,
        earned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            badge_type,
            earned_at,
            metadata,
        }
    }

    pub fn key(&self) -> BadgeKey {
        match (&self.metadata, self.badge_type.is_per_task()) {
            (BadgeMetadata::Task { task_id }, true) => BadgeKey::PerTask(task_id.clone()),
            _ => BadgeKey::OneTime(self.badge_type),
        }
    }

    pub fn definition(&self) -> &'static BadgeDefinition {
        self.badge_type.definition()
    }

    /// The task id for per-task badges.
    pub fn task_key(&self) -> Option<&str> {
        match (&self.metadata, self.badge_type.is_per_task()) {
            (BadgeMetadata::Task { task_id }, true) => Some(task_id),
            _ => None,
        }
    }
}

/// Badges an owner already holds.
#[derive(Debug, Clone, Default)]
pub struct BadgeLedger {
    owner_id: String,
    badges: Vec<Badge>,
    keys: HashSet<BadgeKey>,
}

impl BadgeLedger {
    pub fn new(owner_id: impl Into<String>, badges: Vec<Badge>) -> Self {
        let keys = badges.iter().map(Badge::key).collect();
        Self {
            owner_id: owner_id.into(),
            badges,
            keys,
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    pub fn contains(&self, key: &BadgeKey) -> bool {
        self.keys.contains(key)
    }

    /// Returns false when the key is already held.
    pub fn insert(&mut self, badge: Badge) -> bool {
        if !self.keys.insert(badge.key()) {
            return false;
        }
        self.badges.push(badge);
        true
    }

    pub fn total_points(&self) -> u64 {
        self.badges
            .iter()
            .map(|b| u64::from(b.badge_type.points()))
            .sum()
    }

    pub fn level(&self) -> LevelProgress {
        calculate_level(self.total_points())
    }
}

/// What just happened, with the state needed to judge it.
#[derive(Debug, Clone, Copy)]
pub enum AwardEvent<'a> {
    /// `completed_tasks` is the owner's completion history; the task itself
    /// is counted whether or not it appears there.
    TaskCompleted {
        task: &'a Task,
        completed_tasks: &'a [Task],
    },
    /// `habit` carries the streak values after the completion was applied.
    HabitCompleted { habit: &'a Habit },
    HabitCreated { habit_count: usize },
}

pub struct GamificationEngine {
    sink: Arc<dyn EventSink>,
}

impl Default for GamificationEngine {
    fn default() -> Self {
        Self::new(Arc::new(NullSink))
    }
}

impl std::fmt::Debug for GamificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamificationEngine").finish_non_exhaustive()
    }
}

impl GamificationEngine {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &dyn EventSink {
        self.sink.as_ref()
    }

    /// Award `badge_type` unless the ledger already holds its key.
    ///
    /// Metadata of the wrong shape for the badge type is refused.
    pub fn award_if_eligible(
        &self,
        ledger: &mut BadgeLedger,
        badge_type: BadgeType,
        metadata: BadgeMetadata,
        now: DateTime<Utc>,
    ) -> Option<Badge> {
        if metadata.family() != badge_type.metadata_family() {
            tracing::error!(badge = %badge_type, ?metadata, "metadata does not fit badge type");
            return None;
        }
        let badge = Badge::new(ledger.owner_id().to_string(), badge_type, metadata, now);
        if !ledger.insert(badge.clone()) {
            tracing::debug!(badge = %badge_type, "badge already held");
            return None;
        }
        tracing::info!(badge = %badge_type, owner = %badge.owner_id, "badge awarded");
        Some(badge)
    }

    /// Badges newly earned by `event`. The ledger is updated in place.
    pub fn evaluate(
        &self,
        ledger: &mut BadgeLedger,
        event: AwardEvent<'_>,
        now: DateTime<Utc>,
    ) -> Vec<Badge> {
        let mut earned = Vec::new();
        let mut award = |badge_type: BadgeType, metadata: BadgeMetadata| {
            if let Some(b) = self.award_if_eligible(ledger, badge_type, metadata, now) {
                earned.push(b);
            }
        };

        match event {
            AwardEvent::TaskCompleted {
                task,
                completed_tasks,
            } => {
                let Some(completed_at) = task.completed_at else {
                    tracing::debug!(task = %task.id, "task has no completion time");
                    return Vec::new();
                };
                let history = completion_history(task, completed_tasks);
                let task_meta = || BadgeMetadata::Task {
                    task_id: task.id.clone(),
                };

                award(BadgeType::TaskCompleted, task_meta());

                for (threshold, badge_type) in TASK_MILESTONES {
                    if history.len() >= threshold {
                        award(badge_type, BadgeMetadata::None);
                    }
                }

                let elapsed = completed_at - task.created_at;
                if elapsed >= Duration::zero() && elapsed <= Duration::hours(1) {
                    award(BadgeType::SpeedDemon, task_meta());
                }

                if completed_at.hour() < EARLY_HOUR
                    && history.iter().filter(|at| at.hour() < EARLY_HOUR).count()
                        >= TIME_OF_DAY_COUNT
                {
                    award(BadgeType::EarlyBird, BadgeMetadata::None);
                }
                if completed_at.hour() >= LATE_HOUR
                    && history.iter().filter(|at| at.hour() >= LATE_HOUR).count()
                        >= TIME_OF_DAY_COUNT
                {
                    award(BadgeType::NightOwl, BadgeMetadata::None);
                }

                let day = completed_at.date_naive();
                if history.iter().filter(|at| at.date_naive() == day).count() >= SAME_DAY_COUNT {
                    award(BadgeType::Perfectionist, BadgeMetadata::Date { date: day });
                }
            }
            AwardEvent::HabitCompleted { habit } => {
                let streak = habit.current_streak.max(habit.longest_streak);
                for (threshold, badge_type) in STREAK_MILESTONES {
                    if streak >= threshold {
                        award(
                            badge_type,
                            BadgeMetadata::Habit {
                                habit_id: habit.id.clone(),
                                streak: Some(streak),
                            },
                        );
                    }
                }
                for (threshold, badge_type) in WARRIOR_MILESTONES {
                    if habit.longest_streak >= threshold {
                        award(
                            badge_type,
                            BadgeMetadata::Habit {
                                habit_id: habit.id.clone(),
                                streak: None,
                            },
                        );
                    }
                }
            }
            AwardEvent::HabitCreated { habit_count } => {
                if habit_count >= 1 {
                    award(BadgeType::FirstHabit, BadgeMetadata::None);
                }
            }
        }
        earned
    }

    /// Send one notification per badge. Sink failures are logged and dropped.
    pub fn announce(&self, badges: &[Badge]) {
        for badge in badges {
            publish_or_warn(self.sink.as_ref(), &Event::badge_earned(badge));
        }
    }

    /// Evaluate and announce in one step, for callers without storage.
    pub fn process(
        &self,
        ledger: &mut BadgeLedger,
        event: AwardEvent<'_>,
        now: DateTime<Utc>,
    ) -> Vec<Badge> {
        let earned = self.evaluate(ledger, event, now);
        self.announce(&earned);
        earned
    }
}

/// Completion times of every completed task, counting `task` exactly once.
fn completion_history(task: &Task, completed_tasks: &[Task]) -> Vec<DateTime<Utc>> {
    completed_tasks
        .iter()
        .filter(|t| t.id != task.id && t.is_completed())
        .filter_map(|t| t.completed_at)
        .chain(task.completed_at)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use crate::habit::HabitFrequency;
    use crate::task::TaskPriority;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn done(created: DateTime<Utc>, completed: DateTime<Utc>) -> Task {
        let mut t = Task::new("u1", "t", TaskPriority::Medium, created).unwrap();
        t.complete(completed);
        t
    }

    fn types(badges: &[Badge]) -> Vec<BadgeType> {
        badges.iter().map(|b| b.badge_type).collect()
    }

    #[test]
    fn first_completion_awards_base_and_first_task() {
        let engine = GamificationEngine::default();
        let mut ledger = BadgeLedger::new("u1", vec![]);
        let task = done(at(1, 10), at(2, 10));
        let earned = engine.evaluate(
            &mut ledger,
            AwardEvent::TaskCompleted {
                task: &task,
                completed_tasks: &[],
            },
            at(2, 10),
        );
        assert_eq!(types(&earned), vec![BadgeType::TaskCompleted, BadgeType::FirstTask]);
        assert_eq!(ledger.total_points(), 15);
    }

    #[test]
    fn repeat_evaluation_is_idempotent() {
        let engine = GamificationEngine::default();
        let mut ledger = BadgeLedger::new("u1", vec![]);
        let task = done(at(1, 10), at(2, 10));
        let event = AwardEvent::TaskCompleted {
            task: &task,
            completed_tasks: std::slice::from_ref(&task),
        };
        assert_eq!(engine.evaluate(&mut ledger, event, at(2, 10)).len(), 2);
        assert!(engine.evaluate(&mut ledger, event, at(2, 11)).is_empty());
    }

    #[test]
    fn task_completed_is_per_task() {
        let engine = GamificationEngine::default();
        let mut ledger = BadgeLedger::new("u1", vec![]);
        let a = done(at(1, 10), at(2, 10));
        let b = done(at(1, 10), at(2, 11));
        engine.evaluate(
            &mut ledger,
            AwardEvent::TaskCompleted { task: &a, completed_tasks: &[] },
            at(2, 10),
        );
        let earned = engine.evaluate(
            &mut ledger,
            AwardEvent::TaskCompleted {
                task: &b,
                completed_tasks: std::slice::from_ref(&a),
            },
            at(2, 11),
        );
        assert_eq!(types(&earned), vec![BadgeType::TaskCompleted]);
    }

    #[test]
    fn milestone_catches_up_past_threshold() {
        let engine = GamificationEngine::default();
        let mut ledger = BadgeLedger::new("u1", vec![]);
        let history: Vec<Task> = (0..11).map(|d| done(at(1, 10), at(2 + d, 10))).collect();
        let task = done(at(1, 10), at(20, 10));
        let earned = engine.evaluate(
            &mut ledger,
            AwardEvent::TaskCompleted { task: &task, completed_tasks: &history },
            at(20, 10),
        );
        assert!(types(&earned).contains(&BadgeType::TaskMaster10));
        assert!(!types(&earned).contains(&BadgeType::TaskMaster50));
    }

    #[test]
    fn speed_demon_within_the_hour() {
        let engine = GamificationEngine::default();
        let mut ledger = BadgeLedger::new("u1", vec![]);
        let created = at(5, 10);
        let task = done(created, created + Duration::minutes(60));
        let earned = engine.evaluate(
            &mut ledger,
            AwardEvent::TaskCompleted { task: &task, completed_tasks: &[] },
            created,
        );
        let speed = earned
            .iter()
            .find(|b| b.badge_type == BadgeType::SpeedDemon)
            .unwrap();
        assert_eq!(speed.metadata, BadgeMetadata::Task { task_id: task.id.clone() });

        let slow = done(created, created + Duration::minutes(61));
        let earned = engine.evaluate(
            &mut BadgeLedger::new("u1", vec![]),
            AwardEvent::TaskCompleted { task: &slow, completed_tasks: &[] },
            created,
        );
        assert!(!types(&earned).contains(&BadgeType::SpeedDemon));
    }

    #[test]
    fn early_bird_on_fifth_morning_completion() {
        let engine = GamificationEngine::default();
        let mut ledger = BadgeLedger::new("u1", vec![]);
        let history: Vec<Task> = (1..=4).map(|d| done(at(1, 0), at(d, 7))).collect();
        let task = done(at(1, 0), at(6, 8));
        let earned = engine.evaluate(
            &mut ledger,
            AwardEvent::TaskCompleted { task: &task, completed_tasks: &history },
            at(6, 8),
        );
        assert!(types(&earned).contains(&BadgeType::EarlyBird));
        assert!(!types(&earned).contains(&BadgeType::NightOwl));
    }

    #[test]
    fn night_owl_needs_a_late_completion_now() {
        let engine = GamificationEngine::default();
        let mut ledger = BadgeLedger::new("u1", vec![]);
        let history: Vec<Task> = (1..=5).map(|d| done(at(1, 0), at(d, 22))).collect();
        let afternoon = done(at(1, 0), at(7, 15));
        let earned = engine.evaluate(
            &mut ledger,
            AwardEvent::TaskCompleted { task: &afternoon, completed_tasks: &history },
            at(7, 15),
        );
        assert!(!types(&earned).contains(&BadgeType::NightOwl));

        let late = done(at(1, 0), at(8, 21));
        let earned = engine.evaluate(
            &mut ledger,
            AwardEvent::TaskCompleted { task: &late, completed_tasks: &history },
            at(8, 21),
        );
        assert!(types(&earned).contains(&BadgeType::NightOwl));
    }

    #[test]
    fn perfectionist_records_the_day() {
        let engine = GamificationEngine::default();
        let mut ledger = BadgeLedger::new("u1", vec![]);
        let history: Vec<Task> = (0..9).map(|_| done(at(1, 0), at(10, 12))).collect();
        let task = done(at(1, 0), at(10, 13));
        let earned = engine.evaluate(
            &mut ledger,
            AwardEvent::TaskCompleted { task: &task, completed_tasks: &history },
            at(10, 13),
        );
        let badge = earned
            .iter()
            .find(|b| b.badge_type == BadgeType::Perfectionist)
            .unwrap();
        assert_eq!(
            badge.metadata,
            BadgeMetadata::Date {
                date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
            }
        );
    }

    #[test]
    fn habit_streak_badges() {
        let engine = GamificationEngine::default();
        let mut ledger = BadgeLedger::new("u1", vec![]);
        let mut habit = Habit::new("u1", "run", HabitFrequency::Daily, at(1, 0)).unwrap();
        habit.current_streak = 3;
        habit.longest_streak = 31;
        let earned = engine.evaluate(&mut ledger, AwardEvent::HabitCompleted { habit: &habit }, at(2, 0));
        assert_eq!(
            types(&earned),
            vec![
                BadgeType::StreakMaster7,
                BadgeType::StreakMaster30,
                BadgeType::HabitWarrior7,
                BadgeType::HabitWarrior30,
            ]
        );
        assert_eq!(
            earned[0].metadata,
            BadgeMetadata::Habit { habit_id: habit.id.clone(), streak: Some(31) }
        );
    }

    #[test]
    fn first_habit_once() {
        let engine = GamificationEngine::default();
        let mut ledger = BadgeLedger::new("u1", vec![]);
        let first = engine.evaluate(&mut ledger, AwardEvent::HabitCreated { habit_count: 1 }, at(1, 0));
        assert_eq!(types(&first), vec![BadgeType::FirstHabit]);
        let second = engine.evaluate(&mut ledger, AwardEvent::HabitCreated { habit_count: 2 }, at(1, 0));
        assert!(second.is_empty());
    }

    #[test]
    fn wrong_metadata_is_refused() {
        let engine = GamificationEngine::default();
        let mut ledger = BadgeLedger::new("u1", vec![]);
        let badge = engine.award_if_eligible(&mut ledger, BadgeType::SpeedDemon, BadgeMetadata::None, at(1, 0));
        assert!(badge.is_none());
        assert!(ledger.badges().is_empty());
    }

    #[test]
    fn process_announces_new_badges() {
        let sink = RecordingSink::new();
        let engine = GamificationEngine::new(Arc::new(sink.clone()));
        let mut ledger = BadgeLedger::new("u1", vec![]);
        engine.process(&mut ledger, AwardEvent::HabitCreated { habit_count: 1 }, at(1, 0));
        engine.process(&mut ledger, AwardEvent::HabitCreated { habit_count: 1 }, at(1, 0));
        assert_eq!(sink.badges_earned(), vec![BadgeType::FirstHabit]);
    }

    #[test]
    fn metadata_serializes_with_kind() {
        let meta = BadgeMetadata::Habit { habit_id: "h1".into(), streak: None };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "habit", "habit_id": "h1"}));
    }
}
