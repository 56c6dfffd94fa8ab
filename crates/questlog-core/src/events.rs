use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gamification::{Badge, BadgeType, Rarity};
use crate::streak::{StreakSummary, StreakTransition};

/// Every observable state change produces an Event.
/// Front ends subscribe through an [`EventSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TaskCompleted {
        task_id: String,
        title: String,
        at: DateTime<Utc>,
    },
    HabitCompleted {
        habit_id: String,
        title: String,
        transition: StreakTransition,
        current_streak: u32,
        at: DateTime<Utc>,
    },
    /// A badge was persisted for the first time. Carries the stored record
    /// and the catalog fields needed to present it.
    BadgeEarned {
        badge: Badge,
        name: String,
        description: String,
        emoji: String,
        rarity: Rarity,
        points: u32,
    },
    StreakReconciled {
        habit_id: String,
        before: StreakSummary,
        after: StreakSummary,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn badge_earned(badge: &Badge) -> Self {
        let def = badge.definition();
        Event::BadgeEarned {
            badge: badge.clone(),
            name: def.name.to_string(),
            description: def.description.to_string(),
            emoji: def.emoji.to_string(),
            rarity: def.rarity,
            points: def.points,
        }
    }
}

#[derive(Error, Debug)]
#[error("event sink failed: {0}")]
pub struct SinkError(pub String);

/// Receiver for events. Failures never roll back the change that produced the event.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &Event) -> Result<(), SinkError>;
}

/// Publish and swallow the error with a warning.
pub fn publish_or_warn(sink: &dyn EventSink, event: &Event) {
    if let Err(e) = sink.publish(event) {
        tracing::warn!(error = %e, "dropping event after sink failure");
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: &Event) -> Result<(), SinkError> {
        Ok(())
    }
}

/// In-memory sink; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn badges_earned(&self) -> Vec<BadgeType> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::BadgeEarned { badge, .. } => Some(badge.badge_type),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: &Event) -> Result<(), SinkError> {
        self.events
            .lock()
            .map_err(|e| SinkError(e.to_string()))?
            .push(event.clone());
        Ok(())
    }
}
