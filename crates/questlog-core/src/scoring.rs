//! Task urgency scoring.
//!
//! A task's score is the sum of four independent terms:
//!
//! | Term     | Rule                                                        |
//! |----------|-------------------------------------------------------------|
//! | priority | high 100, medium 50, low 10                                 |
//! | due      | overdue 200, today 150, tomorrow 120, 2-3 days 100-10d,     |
//! |          | 4-7 days 50-5d, later or none 0                             |
//! | status   | in-progress +20, completed -1000, otherwise 0               |
//! | age      | +5 when not completed and created more than 7 days ago      |
//!
//! Higher is more urgent. The completed penalty outweighs every positive term
//! combined, so completed tasks always sink below open ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskStatus};

const MS_PER_DAY: i64 = 86_400_000;

/// Penalty applied to completed tasks.
pub const COMPLETED_PENALTY: i64 = -1000;

/// Mutually exclusive due-date bands, evaluated in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueBand {
    Overdue,
    Today,
    Tomorrow,
    /// Due in 2 or 3 days.
    Soon(i64),
    /// Due in 4 to 7 days.
    ThisWeek(i64),
    /// No due date, or more than a week away.
    Later,
}

impl DueBand {
    /// Classify a whole-day distance to the due date.
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d < 0 => DueBand::Overdue,
            0 => DueBand::Today,
            1 => DueBand::Tomorrow,
            2..=3 => DueBand::Soon(days),
            4..=7 => DueBand::ThisWeek(days),
            _ => DueBand::Later,
        }
    }

    pub fn points(self) -> i64 {
        match self {
            DueBand::Overdue => 200,
            DueBand::Today => 150,
            DueBand::Tomorrow => 120,
            DueBand::Soon(d) => 100 - 10 * d,
            DueBand::ThisWeek(d) => 50 - 5 * d,
            DueBand::Later => 0,
        }
    }
}

/// Whole calendar days until `due`, rounded up: `ceil((due - now) / 1 day)`.
///
/// Anything less than a full day in the past still counts as due today.
pub fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = due.signed_duration_since(now).num_milliseconds();
    -((-ms).div_euclid(MS_PER_DAY))
}

/// One named contribution to a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreTerm {
    pub name: &'static str,
    pub points: i64,
}

/// Per-term score explanation. `total` always equals [`score`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub terms: Vec<ScoreTerm>,
    pub due_band: DueBand,
    pub total: i64,
}

impl ScoreBreakdown {
    fn add_term(&mut self, name: &'static str, points: i64) {
        self.total += points;
        self.terms.push(ScoreTerm { name, points });
    }

    /// Term with the largest contribution, first one on ties.
    pub fn top_term(&self) -> Option<&ScoreTerm> {
        self.terms
            .iter()
            .reduce(|best, t| if t.points > best.points { t } else { best })
    }
}

/// Explain the score of `task` at `now`.
pub fn explain(task: &Task, now: DateTime<Utc>) -> ScoreBreakdown {
    let due_band = task
        .due_date
        .map(|due| DueBand::from_days(days_until(due, now)))
        .unwrap_or(DueBand::Later);

    let mut breakdown = ScoreBreakdown {
        terms: Vec::with_capacity(4),
        due_band,
        total: 0,
    };

    breakdown.add_term("priority", task.priority.weight());
    breakdown.add_term("due", due_band.points());
    breakdown.add_term(
        "status",
        match task.status {
            TaskStatus::InProgress => 20,
            TaskStatus::Completed => COMPLETED_PENALTY,
            TaskStatus::Pending | TaskStatus::Archived => 0,
        },
    );

    let age_bonus = if !task.is_completed() && task.age_days(now) > 7 {
        5
    } else {
        0
    };
    breakdown.add_term("age", age_bonus);

    breakdown
}

/// Urgency score of `task` at `now`. Higher is more urgent; may be negative.
pub fn score(task: &Task, now: DateTime<Utc>) -> i64 {
    explain(task, now).total
}

/// Stable sort by descending score. Equal scores keep their input order.
pub fn sort_by_priority<'a, I>(tasks: I, now: DateTime<Utc>) -> Vec<(i64, &'a Task)>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut scored: Vec<(i64, &Task)> = tasks.into_iter().map(|t| (score(t, now), t)).collect();
    // `sort_by` is stable
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
}
