//! Static badge catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Every known badge id.
///
/// Discriminants index [`CATALOG`]; keep both in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BadgeType {
    #[serde(rename = "task_completed")]
    TaskCompleted,
    #[serde(rename = "first_task")]
    FirstTask,
    #[serde(rename = "first_habit")]
    FirstHabit,
    #[serde(rename = "task_master_10")]
    TaskMaster10,
    #[serde(rename = "task_master_50")]
    TaskMaster50,
    #[serde(rename = "task_master_100")]
    TaskMaster100,
    #[serde(rename = "habit_warrior_7")]
    HabitWarrior7,
    #[serde(rename = "habit_warrior_30")]
    HabitWarrior30,
    #[serde(rename = "habit_warrior_100")]
    HabitWarrior100,
    #[serde(rename = "streak_master_7")]
    StreakMaster7,
    #[serde(rename = "streak_master_30")]
    StreakMaster30,
    #[serde(rename = "streak_master_100")]
    StreakMaster100,
    #[serde(rename = "early_bird")]
    EarlyBird,
    #[serde(rename = "night_owl")]
    NightOwl,
    #[serde(rename = "perfectionist")]
    Perfectionist,
    #[serde(rename = "speed_demon")]
    SpeedDemon,
    #[serde(rename = "dedicated")]
    Dedicated,
    #[serde(rename = "week_warrior")]
    WeekWarrior,
    #[serde(rename = "month_champion")]
    MonthChampion,
}

/// Which metadata shape a badge carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFamily {
    Task,
    Habit,
    Date,
    None,
}

impl BadgeType {
    pub const ALL: [BadgeType; 19] = [
        BadgeType::TaskCompleted,
        BadgeType::FirstTask,
        BadgeType::FirstHabit,
        BadgeType::TaskMaster10,
        BadgeType::TaskMaster50,
        BadgeType::TaskMaster100,
        BadgeType::HabitWarrior7,
        BadgeType::HabitWarrior30,
        BadgeType::HabitWarrior100,
        BadgeType::StreakMaster7,
        BadgeType::StreakMaster30,
        BadgeType::StreakMaster100,
        BadgeType::EarlyBird,
        BadgeType::NightOwl,
        BadgeType::Perfectionist,
        BadgeType::SpeedDemon,
        BadgeType::Dedicated,
        BadgeType::WeekWarrior,
        BadgeType::MonthChampion,
    ];

    pub fn definition(self) -> &'static BadgeDefinition {
        &CATALOG[self as usize]
    }

    pub fn points(self) -> u32 {
        self.definition().points
    }

    pub fn as_str(self) -> &'static str {
        self.definition().key
    }

    /// `task_completed` is earned once per task; every other badge once per owner.
    pub fn is_per_task(self) -> bool {
        self == BadgeType::TaskCompleted
    }

    pub fn metadata_family(self) -> MetadataFamily {
        match self {
            BadgeType::TaskCompleted | BadgeType::SpeedDemon => MetadataFamily::Task,
            BadgeType::StreakMaster7
            | BadgeType::StreakMaster30
            | BadgeType::StreakMaster100
            | BadgeType::HabitWarrior7
            | BadgeType::HabitWarrior30
            | BadgeType::HabitWarrior100 => MetadataFamily::Habit,
            BadgeType::Perfectionist => MetadataFamily::Date,
            _ => MetadataFamily::None,
        }
    }
}

impl fmt::Display for BadgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BadgeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BadgeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "badge_type",
                message: format!("unknown badge '{s}'"),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl FromStr for Rarity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "common" => Ok(Rarity::Common),
            "rare" => Ok(Rarity::Rare),
            "epic" => Ok(Rarity::Epic),
            "legendary" => Ok(Rarity::Legendary),
            other => Err(ValidationError::InvalidValue {
                field: "rarity",
                message: format!("unknown rarity '{other}'"),
            }),
        }
    }
}

/// Immutable description of a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeDefinition {
    pub id: BadgeType,
    #[serde(skip)]
    key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub emoji: &'static str,
    pub rarity: Rarity,
    pub points: u32,
}

const fn def(
    id: BadgeType,
    key: &'static str,
    name: &'static str,
    description: &'static str,
    emoji: &'static str,
    rarity: Rarity,
    points: u32,
) -> BadgeDefinition {
    BadgeDefinition {
        id,
        key,
        name,
        description,
        emoji,
        rarity,
        points,
    }
}

pub static CATALOG: [BadgeDefinition; 19] = [
    def(BadgeType::TaskCompleted, "task_completed", "Task Completed", "Completed a task", "✅", Rarity::Common, 5),
    def(BadgeType::FirstTask, "first_task", "First Step", "Completed your first task", "🎯", Rarity::Common, 10),
    def(BadgeType::FirstHabit, "first_habit", "Habit Starter", "Created your first habit", "🌱", Rarity::Common, 10),
    def(BadgeType::TaskMaster10, "task_master_10", "Task Apprentice", "Completed 10 tasks", "⭐", Rarity::Common, 25),
    def(BadgeType::TaskMaster50, "task_master_50", "Task Master", "Completed 50 tasks", "🏆", Rarity::Rare, 100),
    def(BadgeType::TaskMaster100, "task_master_100", "Task Legend", "Completed 100 tasks", "👑", Rarity::Epic, 250),
    def(BadgeType::HabitWarrior7, "habit_warrior_7", "Week Warrior", "Completed a habit 7 days in a row", "🔥", Rarity::Common, 30),
    def(BadgeType::HabitWarrior30, "habit_warrior_30", "Month Champion", "Completed a habit 30 days in a row", "💪", Rarity::Rare, 150),
    def(BadgeType::HabitWarrior100, "habit_warrior_100", "Century Club", "Completed a habit 100 days in a row", "🌟", Rarity::Legendary, 500),
    def(BadgeType::StreakMaster7, "streak_master_7", "Streak Starter", "Maintained a 7-day streak", "⚡", Rarity::Common, 25),
    def(BadgeType::StreakMaster30, "streak_master_30", "Streak Master", "Maintained a 30-day streak", "🔥", Rarity::Rare, 200),
    def(BadgeType::StreakMaster100, "streak_master_100", "Streak Legend", "Maintained a 100-day streak", "👑", Rarity::Legendary, 1000),
    def(BadgeType::EarlyBird, "early_bird", "Early Bird", "Completed 5 tasks before 9 AM", "🌅", Rarity::Rare, 50),
    def(BadgeType::NightOwl, "night_owl", "Night Owl", "Completed 5 tasks after 9 PM", "🦉", Rarity::Rare, 50),
    def(BadgeType::Perfectionist, "perfectionist", "Perfectionist", "Completed 10 tasks in a single day", "✨", Rarity::Epic, 150),
    def(BadgeType::SpeedDemon, "speed_demon", "Speed Demon", "Completed a task within 1 hour of creating it", "⚡", Rarity::Rare, 75),
    def(BadgeType::Dedicated, "dedicated", "Dedicated", "Logged in for 7 consecutive days", "💎", Rarity::Rare, 100),
    def(BadgeType::WeekWarrior, "week_warrior", "Week Warrior", "Completed all tasks for 7 days straight", "🗓️", Rarity::Epic, 200),
    def(BadgeType::MonthChampion, "month_champion", "Month Champion", "Completed all tasks for 30 days straight", "🏅", Rarity::Legendary, 500),
];

pub fn all_definitions() -> &'static [BadgeDefinition] {
    &CATALOG
}

pub fn definitions_by_rarity(rarity: Rarity) -> impl Iterator<Item = &'static BadgeDefinition> {
    CATALOG.iter().filter(move |d| d.rarity == rarity)
}
