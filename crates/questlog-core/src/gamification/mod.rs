//! Badges, points and levels.

mod award;
mod badges;
mod level;

pub use award::{AwardEvent, Badge, BadgeKey, BadgeLedger, BadgeMetadata, GamificationEngine};
pub use badges::{
    all_definitions, definitions_by_rarity, BadgeDefinition, BadgeType, MetadataFamily, Rarity,
};
pub use level::{calculate_level, level_for_points, points_for_level, LevelProgress};
