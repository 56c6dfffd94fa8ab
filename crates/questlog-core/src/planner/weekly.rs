//! Week-at-a-glance plan.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::scoring;
use crate::task::{Task, TaskPriority, TaskStatus};

/// Headline for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayFocus {
    HighPriorityFocus,
    ImportantTasks,
    Balanced,
    RestDay,
}

impl DayFocus {
    pub fn label(self) -> &'static str {
        match self {
            DayFocus::HighPriorityFocus => "High priority focus",
            DayFocus::ImportantTasks => "Important tasks",
            DayFocus::Balanced => "Balanced day",
            DayFocus::RestDay => "Rest day",
        }
    }

    fn for_tasks(tasks: &[Task]) -> Self {
        let high = tasks
            .iter()
            .filter(|t| t.priority == TaskPriority::High)
            .count();
        if high >= 3 {
            DayFocus::HighPriorityFocus
        } else if high >= 1 {
            DayFocus::ImportantTasks
        } else if tasks.is_empty() {
            DayFocus::RestDay
        } else {
            DayFocus::Balanced
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub weekday: Weekday,
    pub date: NaiveDate,
    pub tasks: Vec<Task>,
    pub focus: DayFocus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    /// Sunday that starts the week
    pub week_start: NaiveDate,
    pub focus_areas: Vec<String>,
    pub days: Vec<DayPlan>,
}

pub(super) fn build(tasks: &[Task], now: DateTime<Utc>, max_per_day: usize) -> WeeklyPlan {
    let today = now.date_naive();
    let week_start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);

    let pending = tasks.iter().filter(|t| t.status == TaskStatus::Pending);
    let sorted: Vec<&Task> = scoring::sort_by_priority(pending, now)
        .into_iter()
        .map(|(_, t)| t)
        .collect();

    let days = (0..7)
        .map(|offset| {
            let date = week_start + Duration::days(offset);
            // Undated tasks are candidates for every day
            let day_tasks: Vec<Task> = sorted
                .iter()
                .filter(|t| t.due_date.map_or(true, |due| due.date_naive() == date))
                .take(max_per_day)
                .map(|t| (*t).clone())
                .collect();
            DayPlan {
                weekday: date.weekday(),
                date,
                focus: DayFocus::for_tasks(&day_tasks),
                tasks: day_tasks,
            }
        })
        .collect();

    WeeklyPlan {
        week_start,
        focus_areas: focus_areas(&sorted),
        days,
    }
}

/// First word of the ten most urgent titles, de-duplicated, at most three.
fn focus_areas(sorted: &[&Task]) -> Vec<String> {
    let mut areas: Vec<String> = Vec::new();
    for task in sorted.iter().take(10) {
        let Some(word) = task.title.split_whitespace().next() else {
            continue;
        };
        if !areas.iter().any(|a| a == word) {
            areas.push(word.to_string());
        }
    }
    areas.truncate(3);
    areas
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        // Wednesday
        Utc.with_ymd_and_hms(2024, 5, 15, 10, 0, 0).unwrap()
    }

    fn task(title: &str, priority: TaskPriority, due: Option<DateTime<Utc>>) -> Task {
        let mut t = Task::new("u1", title, priority, now()).unwrap();
        t.due_date = due;
        t
    }

    #[test]
    fn week_starts_on_sunday() {
        let plan = build(&[], now(), 5);
        assert_eq!(plan.week_start, NaiveDate::from_ymd_opt(2024, 5, 12).unwrap());
        assert_eq!(plan.days.len(), 7);
        assert_eq!(plan.days[0].weekday, Weekday::Sun);
        assert!(plan.days.iter().all(|d| d.focus == DayFocus::RestDay));
    }

    #[test]
    fn dated_tasks_land_on_their_day_only() {
        let friday = Utc.with_ymd_and_hms(2024, 5, 17, 18, 0, 0).unwrap();
        let tasks = vec![task("Ship release", TaskPriority::High, Some(friday))];
        let plan = build(&tasks, now(), 5);
        for day in &plan.days {
            if day.weekday == Weekday::Fri {
                assert_eq!(day.tasks.len(), 1);
                assert_eq!(day.focus, DayFocus::ImportantTasks);
            } else {
                assert!(day.tasks.is_empty());
            }
        }
    }

    #[test]
    fn undated_tasks_fill_every_day_up_to_cap() {
        let tasks: Vec<Task> = (0..7)
            .map(|i| task(&format!("Chore {i}"), TaskPriority::Low, None))
            .collect();
        let plan = build(&tasks, now(), 5);
        assert!(plan.days.iter().all(|d| d.tasks.len() == 5));
        assert!(plan.days.iter().all(|d| d.focus == DayFocus::Balanced));
    }

    #[test]
    fn three_high_priority_tasks_set_high_focus() {
        let tasks: Vec<Task> = (0..3)
            .map(|i| task(&format!("Fix {i}"), TaskPriority::High, None))
            .collect();
        let plan = build(&tasks, now(), 5);
        assert_eq!(plan.days[3].focus, DayFocus::HighPriorityFocus);
    }

    #[test]
    fn focus_areas_are_first_words_deduplicated() {
        let tasks = vec![
            task("Write docs", TaskPriority::High, None),
            task("Write tests", TaskPriority::High, None),
            task("Review PR", TaskPriority::Medium, None),
            task("Plan sprint", TaskPriority::Low, None),
            task("Deploy", TaskPriority::Low, None),
        ];
        let plan = build(&tasks, now(), 5);
        assert_eq!(plan.focus_areas, vec!["Write", "Review", "Plan"]);
    }

    #[test]
    fn only_pending_tasks_are_planned() {
        let mut running = task("Running", TaskPriority::High, None);
        running.status = TaskStatus::InProgress;
        let plan = build(&[running], now(), 5);
        assert!(plan.days.iter().all(|d| d.tasks.is_empty()));
        assert!(plan.focus_areas.is_empty());
    }
}
