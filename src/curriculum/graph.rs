//! Immutable, rank-ordered views of authored content.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use uuid::Uuid;

use super::types::{ContentItem, Course, ExploreVideo};

/// Errors raised while validating authored curriculum data.
#[derive(Debug, Error)]
pub enum CurriculumError {
    #[error("Duplicate course id: {0}")]
    DuplicateCourseId(Uuid),

    #[error("Duplicate sequence position: {0}")]
    DuplicateSequencePosition(u32),

    #[error("Content item {0} is required by more than one course")]
    DuplicateContentItem(Uuid),

    #[error("Duplicate explore video id: {0}")]
    DuplicateExploreVideo(Uuid),
}

/// The ordered sequence of courses, immutable at runtime.
///
/// Construction validates uniqueness of course ids, sequence positions and
/// required content items, then fixes the rank order once; every iteration
/// afterwards walks courses by ascending rank.
pub struct CurriculumGraph {
    /// Courses sorted by sequence position
    courses: Vec<Course>,
    /// course id -> rank (index into `courses`)
    ranks: HashMap<Uuid, usize>,
    /// content item id -> owning course id
    item_courses: HashMap<Uuid, Uuid>,
}

impl CurriculumGraph {
    /// Build a graph from authored courses.
    pub fn new(mut courses: Vec<Course>) -> Result<Self, CurriculumError> {
        courses.sort_by_key(|c| c.sequence_position);

        let mut ranks = HashMap::new();
        let mut positions = HashSet::new();
        let mut item_courses = HashMap::new();

        for (rank, course) in courses.iter().enumerate() {
            if ranks.insert(course.id, rank).is_some() {
                return Err(CurriculumError::DuplicateCourseId(course.id));
            }
            if !positions.insert(course.sequence_position) {
                return Err(CurriculumError::DuplicateSequencePosition(
                    course.sequence_position,
                ));
            }
            for item in &course.required_items {
                if item_courses.insert(item.id, course.id).is_some() {
                    return Err(CurriculumError::DuplicateContentItem(item.id));
                }
            }
        }

        Ok(Self {
            courses,
            ranks,
            item_courses,
        })
    }

    /// All courses in rank order.
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// Look up a course by id.
    pub fn course(&self, course_id: Uuid) -> Option<&Course> {
        self.ranks.get(&course_id).map(|&rank| &self.courses[rank])
    }

    /// The rank (0-based) of a course, by sorted sequence position.
    pub fn rank_of(&self, course_id: Uuid) -> Option<usize> {
        self.ranks.get(&course_id).copied()
    }

    /// The course that lists the given content item as required.
    pub fn course_containing(&self, item_id: Uuid) -> Option<&Course> {
        self.item_courses
            .get(&item_id)
            .and_then(|course_id| self.course(*course_id))
    }

    /// The required content item itself, wherever it lives.
    pub fn content_item(&self, item_id: Uuid) -> Option<&ContentItem> {
        self.course_containing(item_id)
            .and_then(|c| c.required_item(item_id))
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

/// Lookup table for freestanding explore videos.
pub struct ExploreCatalog {
    videos: HashMap<Uuid, ExploreVideo>,
}

impl ExploreCatalog {
    pub fn new(videos: Vec<ExploreVideo>) -> Result<Self, CurriculumError> {
        let mut map = HashMap::new();
        for video in videos {
            let id = video.id;
            if map.insert(id, video).is_some() {
                return Err(CurriculumError::DuplicateExploreVideo(id));
            }
        }
        Ok(Self { videos: map })
    }

    pub fn empty() -> Self {
        Self {
            videos: HashMap::new(),
        }
    }

    pub fn get(&self, video_id: Uuid) -> Option<&ExploreVideo> {
        self.videos.get(&video_id)
    }
}
