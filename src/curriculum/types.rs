//! Curriculum type definitions: courses, content items, rewards.
//!
//! All of these are authored externally and read-only from the engine's
//! perspective; the engine never mutates them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four kinds of learning content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Interactive activity, complete on a single submitted signal
    Activity,
    /// Book, complete after a fixed number of distinct reading events
    Book,
    /// Video, complete when one watch crosses the percentage threshold
    Video,
    /// Audio recording assignment, complete only once moderation approves it
    AudioAssignment,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Activity => write!(f, "activity"),
            ContentKind::Book => write!(f, "book"),
            ContentKind::Video => write!(f, "video"),
            ContentKind::AudioAssignment => write!(f, "audio_assignment"),
        }
    }
}

/// Per-kind completion rule parameters attached to a content item.
///
/// `None` thresholds fall back to the engine configuration defaults, so
/// authors only override where a specific item needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompletionRule {
    Activity,
    Book {
        /// Distinct reading events required; None uses the config default
        required_readings: Option<u32>,
    },
    Video {
        /// Completion percentage threshold; None uses the config default
        completion_threshold: Option<f32>,
    },
    AudioAssignment,
}

impl CompletionRule {
    /// The content kind this rule applies to.
    pub fn kind(&self) -> ContentKind {
        match self {
            CompletionRule::Activity => ContentKind::Activity,
            CompletionRule::Book { .. } => ContentKind::Book,
            CompletionRule::Video { .. } => ContentKind::Video,
            CompletionRule::AudioAssignment => ContentKind::AudioAssignment,
        }
    }
}

/// A single unit of learning material required by a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Unique identifier
    pub id: Uuid,
    /// Kind-specific completion rule
    pub rule: CompletionRule,
}

impl ContentItem {
    pub fn activity(id: Uuid) -> Self {
        Self {
            id,
            rule: CompletionRule::Activity,
        }
    }

    pub fn book(id: Uuid, required_readings: Option<u32>) -> Self {
        Self {
            id,
            rule: CompletionRule::Book { required_readings },
        }
    }

    pub fn video(id: Uuid, completion_threshold: Option<f32>) -> Self {
        Self {
            id,
            rule: CompletionRule::Video {
                completion_threshold,
            },
        }
    }

    pub fn audio_assignment(id: Uuid) -> Self {
        Self {
            id,
            rule: CompletionRule::AudioAssignment,
        }
    }

    /// The content kind of this item.
    pub fn kind(&self) -> ContentKind {
        self.rule.kind()
    }
}

/// Reward issued when a course is completed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardSpec {
    /// Stars granted on completion
    pub stars: u32,
    /// Optional badge granted alongside the stars
    pub badge_id: Option<Uuid>,
}

impl RewardSpec {
    pub fn stars(stars: u32) -> Self {
        Self {
            stars,
            badge_id: None,
        }
    }

    pub fn with_badge(mut self, badge_id: Uuid) -> Self {
        self.badge_id = Some(badge_id);
        self
    }
}

/// An ordered curriculum unit.
///
/// `sequence_position` values are unique and strictly ordered but may have
/// gaps; unlocking uses the rank after sorting, never the raw value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Unique identifier
    pub id: Uuid,
    /// Authored ordering value (unique, gaps permitted)
    pub sequence_position: u32,
    /// Content items that must all be completed
    pub required_items: Vec<ContentItem>,
    /// Reward issued on completion
    pub reward: RewardSpec,
}

impl Course {
    pub fn new(sequence_position: u32, required_items: Vec<ContentItem>, reward: RewardSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence_position,
            required_items,
            reward,
        }
    }

    /// Look up a required item by id.
    pub fn required_item(&self, item_id: Uuid) -> Option<&ContentItem> {
        self.required_items.iter().find(|i| i.id == item_id)
    }

    /// Whether the given set of completed item ids covers every requirement.
    pub fn is_fully_covered_by(&self, completed: &std::collections::HashSet<Uuid>) -> bool {
        self.required_items.iter().all(|i| completed.contains(&i.id))
    }
}

/// A freestanding discovery video, outside any course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreVideo {
    /// Unique identifier
    pub id: Uuid,
    /// Authored video type tag, e.g. "cooking" or "replay"; drives the
    /// repeat-view threshold, star amount and replay exemption
    pub video_type: String,
}

impl ExploreVideo {
    pub fn new(id: Uuid, video_type: impl Into<String>) -> Self {
        Self {
            id,
            video_type: video_type.into(),
        }
    }
}
