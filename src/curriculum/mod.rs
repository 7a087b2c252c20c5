//! Authored curriculum data: courses, content items and explore videos.

pub mod graph;
pub mod types;

pub use graph::{CurriculumError, CurriculumGraph, ExploreCatalog};
pub use types::{CompletionRule, ContentItem, ContentKind, Course, ExploreVideo, RewardSpec};
