//! # Questlog Core Library
//!
//! This library provides the core logic for Questlog, a personal productivity
//! tracker for tasks and habits with a gamification layer. All operations are
//! available through the standalone `questlog` CLI, which is a thin layer over
//! this crate.
//!
//! ## Architecture
//!
//! - **Scoring**: urgency score of a task from priority, due date, status and age
//! - **Planner**: morning/afternoon/evening buckets and a seven-day plan
//! - **Insights**: completion-time, weekday and throughput analysis
//! - **Streaks**: habit streak transitions over an append-only completion log
//! - **Gamification**: badge catalog, idempotent awarding, points and levels
//! - **Storage**: SQLite records and TOML-based configuration
//!
//! The engines are pure and never fail on well-typed input. [`Tracker`] wires
//! them to the [`Database`] and publishes [`Event`]s to an [`EventSink`].
//!
//! ## Key Components
//!
//! - [`Tracker`]: Task and habit operations with badge awarding
//! - [`Planner`]: Suggested order for the day and the week
//! - [`GamificationEngine`]: Badge rules over an owner's ledger
//! - [`Database`]: Record persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod gamification;
pub mod habit;
pub mod planner;
pub mod scoring;
pub mod stats;
pub mod storage;
pub mod streak;
pub mod task;
pub mod tracker;

pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use events::{Event, EventSink, NullSink, RecordingSink, SinkError};
pub use gamification::{
    AwardEvent, Badge, BadgeDefinition, BadgeLedger, BadgeMetadata, BadgeType,
    GamificationEngine, LevelProgress, Rarity,
};
pub use habit::{Habit, HabitFrequency, HabitLog};
pub use planner::{DailyPlan, Planner, PlannerConfig, ScoredTask, TimeOfDay, WeeklyPlan};
pub use scoring::{explain, score, sort_by_priority, ScoreBreakdown};
pub use stats::{DailySnapshot, Insights, InsightsAnalyzer, InsightsConfig, SnapshotSummary};
pub use storage::{Config, Database};
pub use streak::{Reconciliation, StreakBreak, StreakSummary, StreakTransition};
pub use task::{Task, TaskPriority, TaskStatus};
pub use tracker::{HabitCompletion, HabitCreation, TaskCompletion, TaskDraft, Tracker};
