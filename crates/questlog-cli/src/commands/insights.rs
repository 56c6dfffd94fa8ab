use chrono::Utc;
use clap::Args;
use questlog_core::{InsightsAnalyzer, InsightsConfig, TaskStatus};

use super::{open_tracker, print_json};

#[derive(Args)]
pub struct InsightsArgs {
    /// Look-back window in days (defaults to insights.window_days)
    #[arg(long)]
    pub days: Option<u32>,
}

pub fn run(args: InsightsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (tracker, config) = open_tracker()?;
    let now = Utc::now();

    let insights = match args.days {
        None => tracker.insights(now)?,
        Some(0) => return Err("--days must be at least 1".into()),
        Some(days) => {
            let analyzer = InsightsAnalyzer::with_config(InsightsConfig {
                window_days: days,
                ..config.insights
            });
            let tasks = tracker.tasks()?;
            let pending = tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Pending)
                .count();
            analyzer.analyze_tasks(&tasks, pending, now)
        }
    };
    print_json(&insights)
}
