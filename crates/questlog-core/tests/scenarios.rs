//! End-to-end scenarios over the public API and an in-memory store.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc, Weekday};

use questlog_core::gamification::{BadgeMetadata, GamificationEngine};
use questlog_core::streak::{self, StreakTransition};
use questlog_core::{
    explain, AwardEvent, BadgeLedger, BadgeType, Database, Event, Habit, HabitFrequency,
    InsightsAnalyzer, Planner, RecordingSink, StreakBreak, Task, TaskDraft, TaskPriority,
    TimeOfDay, Tracker,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_high_priority_due_in_two_days_scores_185_and_goes_to_morning() {
    let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
    let task = Task::new("u1", "Quarterly report", TaskPriority::High, now - Duration::days(10))
        .unwrap()
        .with_due_date(now + Duration::days(2));

    let breakdown = explain(&task, now);
    assert_eq!(breakdown.total, 185);
    assert_eq!(questlog_core::score(&task, now), 185);

    let plan = Planner::new().suggested_order(std::slice::from_ref(&task), now);
    assert_eq!(plan.bucket(TimeOfDay::Morning).len(), 1);
    assert!(plan.afternoon.is_empty() && plan.evening.is_empty());
}

#[test]
fn test_equal_scores_keep_insertion_order() {
    let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
    let tasks: Vec<Task> = ["first", "second", "third"]
        .iter()
        .map(|t| Task::new("u1", *t, TaskPriority::Medium, now).unwrap())
        .collect();
    let plan = Planner::new().suggested_order(&tasks, now);
    let titles: Vec<&str> = plan.evening.iter().map(|s| s.task.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
}

#[test]
fn test_streak_sequence_from_five_day_run() {
    let mut habit = Habit::new(
        "u1",
        "Meditate",
        HabitFrequency::Daily,
        Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap(),
    )
    .unwrap();
    habit.current_streak = 5;
    habit.longest_streak = 5;
    habit.last_completed_date = Some(date(2024, 1, 1));

    let jan2 = Utc.with_ymd_and_hms(2024, 1, 2, 7, 0, 0).unwrap();
    let first = streak::complete(&habit, jan2, None);
    assert_eq!(first.transition, StreakTransition::Extended);
    assert_eq!((first.habit.current_streak, first.habit.longest_streak), (6, 6));

    let again = streak::complete(&first.habit, jan2 + Duration::hours(5), None);
    assert_eq!(again.transition, StreakTransition::SameDay);
    assert_eq!((again.habit.current_streak, again.habit.longest_streak), (6, 6));
    assert_ne!(again.log.id, first.log.id);

    let jan10 = Utc.with_ymd_and_hms(2024, 1, 10, 7, 0, 0).unwrap();
    let reset = streak::complete(&again.habit, jan10, None);
    assert_eq!(reset.transition, StreakTransition::Reset { gap_days: 8 });
    assert_eq!((reset.habit.current_streak, reset.habit.longest_streak), (1, 6));
}

#[test]
fn test_empty_window_insights_use_defaults() {
    let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
    let insights = InsightsAnalyzer::new().analyze_tasks(&[], 0, now);
    assert_eq!(insights.best_completion_time, TimeOfDay::Morning);
    assert_eq!(insights.average_tasks_per_day, 0.0);
    assert_eq!(insights.most_productive_day, Weekday::Mon);
    assert!(insights.suggestions[0].contains("momentum"));
}

#[test]
fn test_custom_habit_break_is_not_evaluated() {
    let mut habit = Habit::new(
        "u1",
        "Gym",
        HabitFrequency::custom([1, 3, 5]).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
    .unwrap();
    habit.last_completed_date = Some(date(2024, 1, 1));
    assert_eq!(
        streak::check_streak_break(&habit, date(2024, 3, 1)),
        StreakBreak::NotEvaluated
    );
}

#[test]
fn test_one_time_badge_awarded_once_and_per_task_badge_per_task() {
    let engine = GamificationEngine::default();
    let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
    let mut ledger = BadgeLedger::new("u1", vec![]);

    assert!(engine
        .award_if_eligible(&mut ledger, BadgeType::EarlyBird, BadgeMetadata::None, now)
        .is_some());
    assert!(engine
        .award_if_eligible(&mut ledger, BadgeType::EarlyBird, BadgeMetadata::None, now)
        .is_none());

    let per_task = |id: &str| BadgeMetadata::Task { task_id: id.into() };
    assert!(engine
        .award_if_eligible(&mut ledger, BadgeType::TaskCompleted, per_task("a"), now)
        .is_some());
    assert!(engine
        .award_if_eligible(&mut ledger, BadgeType::TaskCompleted, per_task("b"), now)
        .is_some());
    assert!(engine
        .award_if_eligible(&mut ledger, BadgeType::TaskCompleted, per_task("a"), now)
        .is_none());
    assert_eq!(ledger.badges().len(), 3);
    assert_eq!(ledger.total_points(), 50 + 5 + 5);
}

#[test]
fn test_stale_ledgers_do_not_duplicate_stored_badges() {
    let db = Database::open_memory().unwrap();
    let engine = GamificationEngine::default();
    let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();

    // Two evaluations from the same stale snapshot both decide to award.
    let mut first = BadgeLedger::new("u1", vec![]);
    let mut second = BadgeLedger::new("u1", vec![]);
    let a = engine.evaluate(&mut first, AwardEvent::HabitCreated { habit_count: 1 }, now);
    let b = engine.evaluate(&mut second, AwardEvent::HabitCreated { habit_count: 1 }, now);

    assert!(db.insert_badge(&a[0]).unwrap());
    assert!(!db.insert_badge(&b[0]).unwrap());
    assert_eq!(db.list_badges("u1").unwrap().len(), 1);
}

#[test]
fn test_tracker_day_in_the_life() {
    let sink = RecordingSink::new();
    let tracker = Tracker::new(Database::open_memory().unwrap(), "u1").with_sink(Arc::new(sink.clone()));
    let morning = Utc.with_ymd_and_hms(2024, 5, 20, 7, 0, 0).unwrap();

    let report = tracker
        .create_task(
            TaskDraft {
                priority: TaskPriority::High,
                due_date: Some(morning + Duration::hours(10)),
                ..TaskDraft::new("Send report")
            },
            morning,
        )
        .unwrap();
    let habit = tracker
        .create_habit("Walk", HabitFrequency::Daily, None, morning)
        .unwrap()
        .habit;

    let plan = tracker.daily_plan(morning).unwrap();
    assert_eq!(plan.morning[0].task.id, report.id);

    let done = tracker
        .complete_task(&report.id, morning + Duration::minutes(45))
        .unwrap();
    assert!(done.badges.iter().any(|b| b.badge_type == BadgeType::SpeedDemon));
    tracker.complete_habit(&habit.id, morning, Some("park".into())).unwrap();

    let snapshot = tracker.snapshot(morning.date_naive()).unwrap();
    assert_eq!(snapshot.tasks_completed, 1);
    assert_eq!(snapshot.habits_completed, 1);
    assert_eq!(snapshot.productivity_score, 100);

    let kinds: Vec<&'static str> = sink
        .events()
        .iter()
        .map(|e| match e {
            Event::TaskCompleted { .. } => "task",
            Event::HabitCompleted { .. } => "habit",
            Event::BadgeEarned { .. } => "badge",
            Event::StreakReconciled { .. } => "reconcile",
        })
        .collect();
    assert_eq!(kinds.first(), Some(&"badge"));
    assert!(kinds.contains(&"task"));
    assert!(kinds.contains(&"habit"));

    let level = tracker.badges().unwrap().level();
    // first_habit 10 + task_completed 5 + first_task 10 + speed_demon 75
    assert_eq!(tracker.badges().unwrap().total_points(), 100);
    assert_eq!(level.level, 2);
    assert_eq!(level.points_to_next, 300);
}
