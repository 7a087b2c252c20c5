//! Progress tracking type definitions.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rewards::CourseGrantResult;

/// Status of a course for one child.
///
/// The variant order is the monotonic transition order; a persisted status
/// never regresses, and `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Locked,
    NotStarted,
    InProgress,
    Completed,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Locked => "locked",
            CourseStatus::NotStarted => "not_started",
            CourseStatus::InProgress => "in_progress",
            CourseStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "locked" => Some(CourseStatus::Locked),
            "not_started" => Some(CourseStatus::NotStarted),
            "in_progress" => Some(CourseStatus::InProgress),
            "completed" => Some(CourseStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per (child, course) progress state.
///
/// `completed_item_ids` grows monotonically and never shrinks;
/// `completed_at` is stamped exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub child_id: Uuid,
    pub course_id: Uuid,
    pub status: CourseStatus,
    pub completed_item_ids: HashSet<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// A record for a course the child has not interacted with yet.
    /// Synthesized for read projections, never persisted.
    pub fn synthesized(child_id: Uuid, course_id: Uuid, status: CourseStatus) -> Self {
        Self {
            child_id,
            course_id,
            status,
            completed_item_ids: HashSet::new(),
            completed_at: None,
        }
    }
}

/// One row of a child's journey projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneyEntry {
    pub course_id: Uuid,
    pub sequence_position: u32,
    pub status: CourseStatus,
    pub completed_items: usize,
    pub required_items: usize,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Result of recording a content completion.
#[derive(Debug)]
pub struct CompletionUpdate {
    pub record: ProgressRecord,
    /// Whether this call added a new item to the completion set
    pub newly_completed_item: bool,
    /// Whether the course is now complete
    pub course_completed: bool,
    /// Course reward outcome, present whenever the course is complete
    pub reward: Option<CourseGrantResult>,
}

impl CompletionUpdate {
    /// Whether this call granted anything new, for one-time celebration UI.
    pub fn reward_granted(&self) -> bool {
        self.reward.as_ref().is_some_and(|r| r.granted_any())
    }
}
