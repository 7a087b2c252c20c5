//! Engine facade: the operations the API layer calls.

pub mod config;

pub use config::{ConfigError, EngineConfig};

use uuid::Uuid;

use crate::completion::{CompletionSignal, ContentCompletionPolicy, ModerationLookup};
use crate::curriculum::{CurriculumGraph, ExploreCatalog};
use crate::error::EngineError;
use crate::progress::{CourseStatus, JourneyEntry, ProgressRecord, ProgressTracker};
use crate::rewards::{ChildStats, RewardLedger, StatsProjection};
use crate::storage::Database;
use crate::watch::{WatchContext, WatchRecord, WatchStatus, WatchTracker};

/// Outcome of submitting a completion event, shaped so the caller can show
/// a celebratory UI exactly once and never on replay.
#[derive(Debug)]
pub struct CompletionOutcome {
    pub record: ProgressRecord,
    /// Whether the signal completed the content item
    pub item_complete: bool,
    pub course_completed: bool,
    /// Whether this call granted a new reward
    pub reward_granted: bool,
}

/// Outcome of submitting a watch event.
#[derive(Debug)]
pub struct WatchOutcome {
    pub record: WatchRecord,
    pub reward_granted: bool,
}

/// The curriculum progress and reward engine.
///
/// Holds the authored read-only data and one database handle; each
/// operation wires the per-concern stores over the shared connection.
/// Safe to invoke from many request workers against the same database
/// file: every mutation underneath is a single conditional statement.
pub struct ProgressEngine {
    db: Database,
    graph: CurriculumGraph,
    explore: ExploreCatalog,
    config: EngineConfig,
    moderation: Box<dyn ModerationLookup>,
}

impl ProgressEngine {
    pub fn new(
        db: Database,
        graph: CurriculumGraph,
        explore: ExploreCatalog,
        config: EngineConfig,
        moderation: Box<dyn ModerationLookup>,
    ) -> Self {
        Self {
            db,
            graph,
            explore,
            config,
            moderation,
        }
    }

    /// Submit a content completion signal for a required course item.
    ///
    /// The signal is validated against the item's kind and evaluated by
    /// the completion policy first; an incomplete outcome (a book at 4 of
    /// 5 readings, an unapproved audio submission) mutates nothing.
    pub fn submit_content_completion(
        &self,
        child_id: Uuid,
        course_id: Uuid,
        content_item_id: Uuid,
        signal: &CompletionSignal,
    ) -> Result<CompletionOutcome, EngineError> {
        let course = self
            .graph
            .course(course_id)
            .ok_or_else(|| EngineError::not_applicable(format!("Unknown course {}", course_id)))?;

        let item = course.required_item(content_item_id).ok_or_else(|| {
            EngineError::not_applicable(format!(
                "Content item {} is not required by course {}",
                content_item_id, course_id
            ))
        })?;

        let policy = ContentCompletionPolicy::new(&self.config, self.moderation.as_ref());
        let complete = policy.evaluate(child_id, item, signal)?;

        let conn = self.db.connection();
        let stats = StatsProjection::new(conn);
        let ledger = RewardLedger::new(conn, &stats);
        let tracker = ProgressTracker::new(conn, &self.graph, &ledger);

        if !complete {
            let record = tracker.course_progress(child_id, course_id)?;
            return Ok(CompletionOutcome {
                course_completed: record.status == CourseStatus::Completed,
                record,
                item_complete: false,
                reward_granted: false,
            });
        }

        let update = tracker.record_content_completion(child_id, course_id, content_item_id)?;
        Ok(CompletionOutcome {
            reward_granted: update.reward_granted(),
            course_completed: update.course_completed,
            record: update.record,
            item_complete: true,
        })
    }

    /// Submit a watch event for a curriculum or explore video.
    pub fn submit_watch_event(
        &self,
        child_id: Uuid,
        video_id: Uuid,
        context: WatchContext,
        completion_percentage: f32,
    ) -> Result<WatchOutcome, EngineError> {
        let conn = self.db.connection();
        let stats = StatsProjection::new(conn);
        let ledger = RewardLedger::new(conn, &stats);
        let watch = WatchTracker::new(conn, &self.config, &ledger);

        match context {
            WatchContext::Curriculum => {
                let course = self.graph.course_containing(video_id).ok_or_else(|| {
                    EngineError::not_applicable(format!(
                        "Video {} is not part of any course",
                        video_id
                    ))
                })?;
                let item = course.required_item(video_id).ok_or_else(|| {
                    EngineError::not_applicable(format!(
                        "Video {} is not required by course {}",
                        video_id, course.id
                    ))
                })?;

                let tracker = ProgressTracker::new(conn, &self.graph, &ledger);

                // Fail fast before mutating: a watch for a still-locked
                // course is rejected outright.
                let unlocked = tracker
                    .evaluate_unlock_state(child_id)?
                    .into_iter()
                    .any(|(id, status)| id == course.id && status != CourseStatus::Locked);
                if !unlocked {
                    return Err(EngineError::not_applicable(format!(
                        "Course {} is still locked",
                        course.id
                    )));
                }

                let update =
                    watch.record_curriculum_watch(child_id, item, completion_percentage)?;

                let reward_granted = if update.qualifying {
                    tracker
                        .record_content_completion(child_id, course.id, video_id)?
                        .reward_granted()
                } else {
                    false
                };

                Ok(WatchOutcome {
                    record: update.record,
                    reward_granted,
                })
            }
            WatchContext::Explore => {
                let video = self.explore.get(video_id).ok_or_else(|| {
                    EngineError::not_applicable(format!("Unknown explore video {}", video_id))
                })?;

                let update = watch.record_explore_watch(child_id, video, completion_percentage)?;
                Ok(WatchOutcome {
                    reward_granted: update.reward_granted(),
                    record: update.record,
                })
            }
        }
    }

    /// The child's full journey: every course in rank order with status.
    pub fn journey(&self, child_id: Uuid) -> Result<Vec<JourneyEntry>, EngineError> {
        let conn = self.db.connection();
        let stats = StatsProjection::new(conn);
        let ledger = RewardLedger::new(conn, &stats);
        ProgressTracker::new(conn, &self.graph, &ledger).get_child_journey(child_id)
    }

    /// Progress for a single course.
    pub fn course_progress(
        &self,
        child_id: Uuid,
        course_id: Uuid,
    ) -> Result<ProgressRecord, EngineError> {
        let conn = self.db.connection();
        let stats = StatsProjection::new(conn);
        let ledger = RewardLedger::new(conn, &stats);
        ProgressTracker::new(conn, &self.graph, &ledger).course_progress(child_id, course_id)
    }

    /// Watch status for a single video in one context.
    pub fn watch_status(
        &self,
        child_id: Uuid,
        video_id: Uuid,
        context: WatchContext,
    ) -> Result<WatchStatus, EngineError> {
        let conn = self.db.connection();
        let stats = StatsProjection::new(conn);
        let ledger = RewardLedger::new(conn, &stats);
        WatchTracker::new(conn, &self.config, &ledger).get_watch_status(
            child_id,
            video_id,
            context,
        )
    }

    /// Total stars earned for one explore video type.
    pub fn stars_for_category(&self, child_id: Uuid, category: &str) -> Result<u64, EngineError> {
        let conn = self.db.connection();
        let stats = StatsProjection::new(conn);
        let ledger = RewardLedger::new(conn, &stats);
        Ok(ledger.stars_for_category(child_id, category)?)
    }

    /// The child's stats projection (total stars, badges).
    pub fn child_stats(&self, child_id: Uuid) -> Result<ChildStats, EngineError> {
        Ok(StatsProjection::new(self.db.connection()).get(child_id)?)
    }

    /// Administrative: reset a watch relationship so its reward can be
    /// re-earned.
    pub fn reset_watch(
        &self,
        child_id: Uuid,
        video_id: Uuid,
        context: WatchContext,
    ) -> Result<(), EngineError> {
        let conn = self.db.connection();
        let stats = StatsProjection::new(conn);
        let ledger = RewardLedger::new(conn, &stats);
        WatchTracker::new(conn, &self.config, &ledger).reset_watch(child_id, video_id, context)
    }
}
