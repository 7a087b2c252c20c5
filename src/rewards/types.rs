//! Reward ledger type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a ledger entry was granted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewardType {
    /// Stars for a single content item (explore videos)
    ItemStar,
    /// Stars for completing a course
    CourseStar,
    /// Badge for completing a course
    CourseBadge,
}

impl RewardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardType::ItemStar => "item-star",
            RewardType::CourseStar => "course-star",
            RewardType::CourseBadge => "course-badge",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "item-star" => Some(RewardType::ItemStar),
            "course-star" => Some(RewardType::CourseStar),
            "course-badge" => Some(RewardType::CourseBadge),
            _ => None,
        }
    }
}

impl std::fmt::Display for RewardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only grant record.
///
/// Existence of a row for (child, subject, reward type) is the sole source
/// of truth for "was this reward already given".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardLedgerEntry {
    pub id: i64,
    pub child_id: Uuid,
    /// Content item id or course id
    pub subject_id: Uuid,
    pub reward_type: RewardType,
    pub amount: u32,
    pub badge_id: Option<Uuid>,
    /// Subject category (explore video type) for per-category aggregation
    pub category: Option<String>,
    pub granted_at: DateTime<Utc>,
}

/// Outcome of a grant attempt.
///
/// `granted = false` with the existing entry is the normal "already
/// earned" path, not a failure.
#[derive(Debug, Clone)]
pub struct GrantResult {
    pub granted: bool,
    pub entry: RewardLedgerEntry,
}

/// Outcome of a course reward grant: stars and badge are two separately
/// idempotent grants, so a retry that already gave stars can still grant
/// the badge.
#[derive(Debug, Clone)]
pub struct CourseGrantResult {
    pub stars: GrantResult,
    pub badge: Option<GrantResult>,
}

impl CourseGrantResult {
    /// Whether anything new was granted by this call.
    pub fn granted_any(&self) -> bool {
        self.stars.granted || self.badge.as_ref().is_some_and(|b| b.granted)
    }
}

/// A stats mutation emitted once per successful grant (or revocation).
#[derive(Debug, Clone, PartialEq)]
pub struct StatsDelta {
    pub stars_delta: i64,
    pub badge_id: Option<Uuid>,
}

impl StatsDelta {
    pub fn stars(stars_delta: i64) -> Self {
        Self {
            stars_delta,
            badge_id: None,
        }
    }

    pub fn badge(badge_id: Uuid) -> Self {
        Self {
            stars_delta: 0,
            badge_id: Some(badge_id),
        }
    }
}

/// The derived per-child stats projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildStats {
    pub child_id: Uuid,
    pub total_stars: u64,
    pub badges: Vec<Uuid>,
}

impl ChildStats {
    pub fn empty(child_id: Uuid) -> Self {
        Self {
            child_id,
            total_stars: 0,
            badges: Vec::new(),
        }
    }
}
