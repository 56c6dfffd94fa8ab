//! Habit records and the append-only completion log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::ValidationError;

/// How often a habit is meant to be performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HabitFrequency {
    Daily,
    Weekly,
    /// Specific days of the week, Sunday = 0 through Saturday = 6.
    Custom { days_of_week: BTreeSet<u8> },
}

impl HabitFrequency {
    /// Build a custom schedule.
    ///
    /// # Errors
    /// Rejects an empty day set and any index above 6.
    pub fn custom(days: impl IntoIterator<Item = u8>) -> Result<Self, ValidationError> {
        let days_of_week: BTreeSet<u8> = days.into_iter().collect();
        if days_of_week.is_empty() {
            return Err(ValidationError::EmptySchedule);
        }
        if let Some(&bad) = days_of_week.iter().find(|d| **d > 6) {
            return Err(ValidationError::DayOutOfRange(bad));
        }
        Ok(HabitFrequency::Custom { days_of_week })
    }

    /// Parse `daily`, `weekly` or `custom:0,2,4`.
    ///
    /// # Errors
    /// Returns an error for unknown kinds or malformed day lists.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        match s {
            "daily" => Ok(HabitFrequency::Daily),
            "weekly" => Ok(HabitFrequency::Weekly),
            _ => {
                let days = s.strip_prefix("custom:").ok_or_else(|| {
                    ValidationError::InvalidValue {
                        field: "frequency",
                        message: format!("expected daily, weekly or custom:<days>, got '{s}'"),
                    }
                })?;
                let parsed = days
                    .split(',')
                    .filter(|d| !d.trim().is_empty())
                    .map(|d| {
                        d.trim().parse::<u8>().map_err(|_| ValidationError::InvalidValue {
                            field: "frequency",
                            message: format!("'{d}' is not a day index"),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Self::custom(parsed)
            }
        }
    }
}

impl fmt::Display for HabitFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HabitFrequency::Daily => f.write_str("daily"),
            HabitFrequency::Weekly => f.write_str("weekly"),
            HabitFrequency::Custom { days_of_week } => {
                let days: Vec<String> = days_of_week.iter().map(|d| d.to_string()).collect();
                write!(f, "custom:{}", days.join(","))
            }
        }
    }
}

/// A recurring behavior with cached streak state.
///
/// `current_streak`, `longest_streak` and `last_completed_date` are a
/// projection of the completion log. Only [`crate::streak`] writes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub frequency: HabitFrequency,
    pub current_streak: u32,
    pub longest_streak: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed_date: Option<NaiveDate>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// # Errors
    /// Returns an error if `title` is blank.
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        frequency: HabitFrequency,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            title,
            description: None,
            frequency,
            current_streak: 0,
            longest_streak: 0,
            last_completed_date: None,
            archived: false,
            created_at: now,
        })
    }
}

/// One write-once entry of the completion log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitLog {
    pub id: String,
    pub habit_id: String,
    pub owner_id: String,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl HabitLog {
    pub fn new(habit: &Habit, completed_at: DateTime<Utc>, notes: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            habit_id: habit.id.clone(),
            owner_id: habit.owner_id.clone(),
            completed_at,
            notes: notes.filter(|n| !n.trim().is_empty()),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.completed_at.date_naive()
    }
}
