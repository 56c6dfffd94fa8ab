use chrono::Utc;
use clap::Subcommand;

use super::{open_tracker, print_json};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Open tasks split into morning, afternoon and evening
    Today,
    /// Pending tasks spread over the current Sunday-to-Saturday week
    Week,
}

pub fn run(action: PlanAction) -> Result<(), Box<dyn std::error::Error>> {
    let (tracker, _config) = open_tracker()?;
    let now = Utc::now();

    match action {
        PlanAction::Today => print_json(&tracker.daily_plan(now)?)?,
        PlanAction::Week => print_json(&tracker.weekly_plan(now)?)?,
    }
    Ok(())
}
