//! Progress tracking: sequential unlocking and course completion.

pub mod store;
pub mod tracker;
pub mod types;

pub use store::ProgressStore;
pub use tracker::ProgressTracker;
pub use types::{CompletionUpdate, CourseStatus, JourneyEntry, ProgressRecord};
