//! Behavioral insights mined from recent task completions.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::planner::TimeOfDay;
use crate::task::Task;

/// Insight thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsConfig {
    /// Look-back window in days
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Below this many tasks per day the momentum tip is emitted
    #[serde(default = "default_momentum_threshold")]
    pub momentum_threshold: f64,
    /// Above this many pending tasks the decomposition tip is emitted
    #[serde(default = "default_pending_task_threshold")]
    pub pending_task_threshold: usize,
}

fn default_window_days() -> u32 {
    30
}
fn default_momentum_threshold() -> f64 {
    2.0
}
fn default_pending_task_threshold() -> usize {
    10
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            momentum_threshold: default_momentum_threshold(),
            pending_task_threshold: default_pending_task_threshold(),
        }
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub best_completion_time: TimeOfDay,
    /// Completions per day over the window, one decimal place
    pub average_tasks_per_day: f64,
    #[serde(with = "weekday_serde")]
    pub most_productive_day: Weekday,
    /// In rule order, not priority order
    pub suggestions: Vec<String>,
}

/// Full English day name, Sunday first.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

mod weekday_serde {
    use chrono::Weekday;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(day: &Weekday, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(super::weekday_name(*day))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Weekday, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse::<Weekday>()
            .map_err(|_| serde::de::Error::custom(format!("unknown weekday '{raw}'")))
    }
}

const SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Completion-history analyzer.
#[derive(Debug, Clone, Default)]
pub struct InsightsAnalyzer {
    config: InsightsConfig,
}

impl InsightsAnalyzer {
    /// Create an analyzer with the default 30-day window
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom thresholds
    pub fn with_config(config: InsightsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    /// Completed tasks whose `completed_at` falls within the window ending at `now`.
    pub fn tasks_in_window<'a>(&self, tasks: &'a [Task], now: DateTime<Utc>) -> Vec<&'a Task> {
        let start = now - Duration::days(self.config.window_days as i64);
        tasks
            .iter()
            .filter(|t| t.is_completed())
            .filter(|t| t.completed_at.is_some_and(|at| at >= start && at <= now))
            .collect()
    }

    /// Analyze completions that are already restricted to the window.
    ///
    /// Empty input is not an error: it yields morning, 0.0 and Monday.
    pub fn analyze(&self, completed_in_window: &[&Task], pending_count: usize) -> Insights {
        let completion_times: Vec<DateTime<Utc>> = completed_in_window
            .iter()
            .filter_map(|t| t.completed_at)
            .collect();

        let best_completion_time = best_completion_time(&completion_times);
        let average_tasks_per_day = round_one_decimal(
            completed_in_window.len() as f64 / self.config.window_days.max(1) as f64,
        );
        let most_productive_day = most_productive_day(&completion_times);

        let mut suggestions = Vec::new();
        if average_tasks_per_day < self.config.momentum_threshold {
            suggestions
                .push("Try to complete at least 2-3 tasks per day to build momentum!".to_string());
        }
        match best_completion_time {
            TimeOfDay::Morning => suggestions.push(
                "You're most productive in the morning. Schedule important tasks early!"
                    .to_string(),
            ),
            TimeOfDay::Afternoon => suggestions.push(
                "Your peak productivity is in the afternoon. Plan accordingly!".to_string(),
            ),
            TimeOfDay::Evening => {}
        }
        suggestions.push(format!(
            "You're most productive on {}s. Use this day for important tasks!",
            weekday_name(most_productive_day)
        ));
        if pending_count > self.config.pending_task_threshold {
            suggestions.push(
                "You have many pending tasks. Consider breaking them into smaller tasks!"
                    .to_string(),
            );
        }

        Insights {
            best_completion_time,
            average_tasks_per_day,
            most_productive_day,
            suggestions,
        }
    }

    /// Filter `tasks` to the window ending at `now`, then analyze.
    pub fn analyze_tasks(&self, tasks: &[Task], pending_count: usize, now: DateTime<Utc>) -> Insights {
        let window = self.tasks_in_window(tasks, now);
        self.analyze(&window, pending_count)
    }
}

fn best_completion_time(times: &[DateTime<Utc>]) -> TimeOfDay {
    if times.is_empty() {
        return TimeOfDay::Morning;
    }
    let mean = times.iter().map(|t| t.hour() as f64).sum::<f64>() / times.len() as f64;
    if mean < 12.0 {
        TimeOfDay::Morning
    } else if mean < 17.0 {
        TimeOfDay::Afternoon
    } else {
        TimeOfDay::Evening
    }
}

/// Strictly-greater fold over Sunday..Saturday, so the earlier day wins ties.
fn most_productive_day(times: &[DateTime<Utc>]) -> Weekday {
    let mut counts = [0usize; 7];
    for t in times {
        counts[t.weekday().num_days_from_sunday() as usize] += 1;
    }
    let mut best = Weekday::Mon;
    let mut max = 0;
    for (idx, &count) in counts.iter().enumerate() {
        if count > max {
            max = count;
            best = SUNDAY_FIRST[idx];
        }
    }
    best
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskPriority, TaskStatus};
    use chrono::TimeZone;

    fn completed_at(at: DateTime<Utc>) -> Task {
        let mut t = Task::new("u1", "done", TaskPriority::Medium, at).unwrap();
        t.status = TaskStatus::Completed;
        t.completed_at = Some(at);
        t
    }

    #[test]
    fn test_empty_window_defaults() {
        let insights = InsightsAnalyzer::new().analyze(&[], 0);
        assert_eq!(insights.best_completion_time, TimeOfDay::Morning);
        assert_eq!(insights.average_tasks_per_day, 0.0);
        assert_eq!(insights.most_productive_day, Weekday::Mon);
        assert_eq!(insights.suggestions.len(), 3);
        assert!(insights.suggestions[0].contains("momentum"));
        assert!(insights.suggestions[1].contains("morning"));
        assert!(insights.suggestions[2].contains("Mondays"));
    }

    #[test]
    fn test_mean_hour_buckets() {
        let day = |h| Utc.with_ymd_and_hms(2024, 5, 14, h, 0, 0).unwrap();
        assert_eq!(best_completion_time(&[day(8), day(15)]), TimeOfDay::Morning);
        assert_eq!(best_completion_time(&[day(12)]), TimeOfDay::Afternoon);
        assert_eq!(best_completion_time(&[day(16), day(17)]), TimeOfDay::Afternoon);
        assert_eq!(best_completion_time(&[day(17)]), TimeOfDay::Evening);
    }

    #[test]
    fn test_evening_has_no_time_tip() {
        let tasks: Vec<Task> = (0..3)
            .map(|d| completed_at(Utc.with_ymd_and_hms(2024, 5, 14 + d, 20, 0, 0).unwrap()))
            .collect();
        let refs: Vec<&Task> = tasks.iter().collect();
        let insights = InsightsAnalyzer::new().analyze(&refs, 0);
        assert_eq!(insights.best_completion_time, TimeOfDay::Evening);
        assert_eq!(insights.suggestions.len(), 2);
        assert!(insights.suggestions.iter().all(|s| !s.contains("morning")));
    }

    #[test]
    fn test_weekday_tie_goes_to_earlier_day() {
        // 2024-05-12 is a Sunday, 2024-05-18 a Saturday
        let sat = Utc.with_ymd_and_hms(2024, 5, 18, 9, 0, 0).unwrap();
        let sun = Utc.with_ymd_and_hms(2024, 5, 12, 9, 0, 0).unwrap();
        assert_eq!(most_productive_day(&[sat, sun]), Weekday::Sun);
        assert_eq!(most_productive_day(&[sat, sat, sun]), Weekday::Sat);
    }

    #[test]
    fn test_average_is_rounded_to_one_decimal() {
        let base = Utc.with_ymd_and_hms(2024, 5, 14, 9, 0, 0).unwrap();
        let tasks: Vec<Task> = (0..7).map(|_| completed_at(base)).collect();
        let refs: Vec<&Task> = tasks.iter().collect();
        let insights = InsightsAnalyzer::new().analyze(&refs, 0);
        // 7 / 30 = 0.2333
        assert_eq!(insights.average_tasks_per_day, 0.2);
    }

    #[test]
    fn test_pending_tip_after_threshold() {
        let analyzer = InsightsAnalyzer::new();
        assert_eq!(analyzer.analyze(&[], 10).suggestions.len(), 3);
        let insights = analyzer.analyze(&[], 11);
        assert_eq!(insights.suggestions.len(), 4);
        assert!(insights.suggestions[3].contains("smaller tasks"));
    }

    #[test]
    fn test_window_filter() {
        let now = Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).unwrap();
        let recent = completed_at(now - Duration::days(3));
        let old = completed_at(now - Duration::days(45));
        let pending = Task::new("u1", "open", TaskPriority::Low, now).unwrap();
        let tasks = vec![recent.clone(), old, pending];
        let window = InsightsAnalyzer::new().tasks_in_window(&tasks, now);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id, recent.id);
    }

    #[test]
    fn test_weekday_serializes_full_name() {
        let insights = InsightsAnalyzer::new().analyze(&[], 0);
        let json = serde_json::to_value(&insights).unwrap();
        assert_eq!(json["most_productive_day"], "Monday");
        assert_eq!(json["best_completion_time"], "morning");
        let back: Insights = serde_json::from_value(json).unwrap();
        assert_eq!(back, insights);
    }
}
