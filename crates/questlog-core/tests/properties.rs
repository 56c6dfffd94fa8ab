//! Property tests for the scoring, planning, streak and level engines.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use questlog_core::gamification::{calculate_level, level_for_points, points_for_level};
use questlog_core::planner::Planner;
use questlog_core::streak::{self, calculate_streak_from_log};
use questlog_core::{Habit, HabitFrequency, HabitLog, Task, TaskPriority, TaskStatus};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn priority() -> impl Strategy<Value = TaskPriority> {
    prop_oneof![
        Just(TaskPriority::Low),
        Just(TaskPriority::Medium),
        Just(TaskPriority::High),
    ]
}

fn status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Pending),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Completed),
        Just(TaskStatus::Archived),
    ]
}

prop_compose! {
    fn task()(
        priority in priority(),
        status in status(),
        age_hours in 0i64..24 * 60,
        due_hours in proptest::option::of(-24i64 * 30..24 * 30),
    ) -> Task {
        let now = base() + Duration::days(60);
        let mut t = Task::new("u1", "t", priority, now - Duration::hours(age_hours)).unwrap();
        t.status = status;
        if status == TaskStatus::Completed {
            t.completed_at = Some(now);
        }
        t.due_date = due_hours.map(|h| now + Duration::hours(h));
        t
    }
}

proptest! {
    #[test]
    fn planner_buckets_partition_open_tasks(tasks in proptest::collection::vec(task(), 0..40)) {
        let now = base() + Duration::days(60);
        let plan = Planner::new().suggested_order(&tasks, now);
        let open = tasks.iter().filter(|t| t.status.is_open()).count();
        prop_assert_eq!(plan.len(), open);

        let mut planned: Vec<&str> = plan
            .morning
            .iter()
            .chain(&plan.afternoon)
            .chain(&plan.evening)
            .map(|s| s.task.id.as_str())
            .collect();
        planned.sort_unstable();
        planned.dedup();
        prop_assert_eq!(planned.len(), open);
    }

    #[test]
    fn completed_tasks_sink_below_open_ones(a in task(), b in task()) {
        let now = base() + Duration::days(60);
        let (a_score, b_score) = (questlog_core::score(&a, now), questlog_core::score(&b, now));
        if a.status == TaskStatus::Completed && b.status.is_open() {
            prop_assert!(a_score < b_score);
        }
        prop_assert_eq!(a_score, questlog_core::score(&a, now));
    }

    #[test]
    fn longest_streak_never_decreases(offsets in proptest::collection::vec(0i64..4, 1..40)) {
        let mut habit = Habit::new("u1", "h", HabitFrequency::Daily, base()).unwrap();
        let mut day = base().date_naive();
        let mut longest = 0;
        for step in offsets {
            day = day + Duration::days(step);
            streak::apply(&mut habit, day);
            prop_assert!(habit.longest_streak >= longest);
            prop_assert!(habit.current_streak <= habit.longest_streak);
            prop_assert!(habit.current_streak >= 1);
            longest = habit.longest_streak;
        }
    }

    #[test]
    fn log_recomputation_matches_incremental_fold(
        steps in proptest::collection::vec((0i64..3, 0u32..24), 1..40)
    ) {
        let mut habit = Habit::new("u1", "h", HabitFrequency::Daily, base()).unwrap();
        let mut logs: Vec<HabitLog> = Vec::new();
        let mut at = base();
        for (days, hour) in steps {
            at = (at + Duration::days(days)).date_naive().and_hms_opt(hour, 0, 0).unwrap().and_utc();
            let completion = streak::complete(&habit, at, None);
            habit = completion.habit;
            logs.push(completion.log);
        }

        let rebuilt = calculate_streak_from_log(&logs, at.date_naive());
        prop_assert_eq!(rebuilt.current_streak, habit.current_streak);
        prop_assert_eq!(rebuilt.longest_streak, habit.longest_streak);
        prop_assert_eq!(rebuilt.last_completed_date, habit.last_completed_date);
    }

    #[test]
    fn level_is_monotonic(a in 0u64..5_000_000, b in 0u64..5_000_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(level_for_points(lo) <= level_for_points(hi));
        let p = calculate_level(lo);
        prop_assert!(points_for_level(p.level) <= lo);
        prop_assert!(lo < points_for_level(p.level + 1));
    }
}
