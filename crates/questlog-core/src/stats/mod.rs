//! Statistics module for Questlog
//!
//! Behavioral insights over a completion window, and per-day productivity
//! snapshots with their rolling summary.

mod daily;
mod insights;

pub use daily::{summarize, BestDay, DailySnapshot, SnapshotSummary, TrendPoint};

pub use insights::{weekday_name, Insights, InsightsAnalyzer, InsightsConfig};
