//! Starsteps: curriculum progress and reward engine for a children's
//! learning platform.
//!
//! Courses unlock sequentially as a child completes them; each course
//! requires a set of content items (activities, books, videos, audio
//! assignments) with per-kind completion rules. Completing a course
//! grants its stars and optional badge exactly once, recorded in an
//! append-style reward ledger that a stats projection mirrors. A watch
//! tracker handles video viewing in both curriculum and explore
//! contexts, including repeat-view thresholds and the replay exemption.
//!
//! State lives in SQLite; every mutation is a single conditional
//! statement so concurrent request workers never double-grant or
//! regress progress.

pub mod completion;
pub mod curriculum;
pub mod engine;
pub mod error;
pub mod progress;
pub mod rewards;
pub mod storage;
pub mod watch;

pub use completion::{CompletionSignal, ContentCompletionPolicy, ModerationLookup};
pub use curriculum::{
    CompletionRule, ContentItem, ContentKind, Course, CurriculumError, CurriculumGraph,
    ExploreCatalog, ExploreVideo, RewardSpec,
};
pub use engine::{CompletionOutcome, EngineConfig, ProgressEngine, WatchOutcome};
pub use error::EngineError;
pub use progress::{CourseStatus, JourneyEntry, ProgressRecord, ProgressTracker};
pub use rewards::{ChildStats, RewardLedger, RewardType, StatsProjection};
pub use storage::{Database, DatabaseError};
pub use watch::{WatchContext, WatchStatus, WatchTracker};
