//! Watch tracking type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rewards::GrantResult;

/// Which surface a watch event belongs to. The two contexts track state
/// independently: the same video id watched in both keeps two records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchContext {
    /// Video embedded in a course
    Curriculum,
    /// Freestanding discovery video
    Explore,
}

impl WatchContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchContext::Curriculum => "curriculum",
            WatchContext::Explore => "explore",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "curriculum" => Some(WatchContext::Curriculum),
            "explore" => Some(WatchContext::Explore),
            _ => None,
        }
    }
}

impl std::fmt::Display for WatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Watch state for one (child, video, context).
///
/// `watch_count` only ever grows in normal operation; the administrative
/// reset is the single exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchRecord {
    pub child_id: Uuid,
    pub content_item_id: Uuid,
    pub context: WatchContext,
    pub watch_count: u32,
    pub last_completion_percentage: f32,
    pub first_completed_at: Option<DateTime<Utc>>,
}

/// Read-only watch status for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchStatus {
    pub watch_count: u32,
    /// Any attempt counts as "seen", even before reward eligibility
    pub is_watched: bool,
    /// Stars confirmed by the ledger, never WatchTracker's own claim
    pub stars_awarded: u32,
}

/// Result of recording a watch event.
#[derive(Debug)]
pub struct WatchUpdate {
    pub record: WatchRecord,
    /// Whether this event crossed the completion threshold
    pub qualifying: bool,
    /// Explore reward outcome, when one was requested
    pub reward: Option<GrantResult>,
}

impl WatchUpdate {
    /// Whether this call granted a new reward.
    pub fn reward_granted(&self) -> bool {
        self.reward.as_ref().is_some_and(|r| r.granted)
    }
}
