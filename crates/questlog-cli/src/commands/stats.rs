use chrono::{Duration, Utc};
use clap::Subcommand;
use questlog_core::stats::summarize;

use super::{open_tracker, parse_date, print_json};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Snapshot for today
    Today,
    /// Snapshot for a given day
    Day {
        /// Date (YYYY-MM-DD)
        date: String,
    },
    /// Summary over the last N days, oldest first
    Summary {
        #[arg(long, default_value = "7")]
        days: u32,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let (tracker, _config) = open_tracker()?;
    let today = Utc::now().date_naive();

    match action {
        StatsAction::Today => print_json(&tracker.snapshot(today)?)?,
        StatsAction::Day { date } => print_json(&tracker.snapshot(parse_date(&date)?)?)?,
        StatsAction::Summary { days } => {
            let mut snapshots = Vec::with_capacity(days as usize);
            for offset in (0..i64::from(days)).rev() {
                snapshots.push(tracker.snapshot(today - Duration::days(offset))?);
            }
            print_json(&summarize(&snapshots))?;
        }
    }
    Ok(())
}
