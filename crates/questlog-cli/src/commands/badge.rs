//! Badge and level commands for CLI.

use clap::Subcommand;
use questlog_core::gamification::{all_definitions, definitions_by_rarity};
use questlog_core::{BadgeDefinition, BadgeMetadata, LevelProgress, Rarity};
use serde::Serialize;

use super::{open_tracker, print_json};

#[derive(Subcommand)]
pub enum BadgeAction {
    /// Badges earned so far
    List,
    /// Every badge that can be earned
    Catalog {
        /// Filter by rarity (common, rare, epic, legendary)
        #[arg(long)]
        rarity: Option<String>,
    },
    /// Total points and level progress
    Level,
}

#[derive(Serialize)]
struct EarnedBadge<'a> {
    badge_id: &'a str,
    #[serde(flatten)]
    definition: &'static BadgeDefinition,
    metadata: &'a BadgeMetadata,
    earned_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
struct Standing {
    total_points: u64,
    badges: usize,
    #[serde(flatten)]
    level: LevelProgress,
}

pub fn run(action: BadgeAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        BadgeAction::List => {
            let (tracker, _config) = open_tracker()?;
            let ledger = tracker.badges()?;
            let earned: Vec<EarnedBadge<'_>> = ledger
                .badges()
                .iter()
                .map(|b| EarnedBadge {
                    badge_id: &b.id,
                    definition: b.definition(),
                    metadata: &b.metadata,
                    earned_at: b.earned_at,
                })
                .collect();
            print_json(&earned)?;
        }
        BadgeAction::Catalog { rarity } => match rarity {
            Some(raw) => {
                let rarity: Rarity = raw.parse()?;
                let defs: Vec<&BadgeDefinition> = definitions_by_rarity(rarity).collect();
                print_json(&defs)?;
            }
            None => print_json(all_definitions())?,
        },
        BadgeAction::Level => {
            let (tracker, _config) = open_tracker()?;
            let ledger = tracker.badges()?;
            print_json(&Standing {
                total_points: ledger.total_points(),
                badges: ledger.badges().len(),
                level: ledger.level(),
            })?;
        }
    }
    Ok(())
}
