//! Sequential unlocking and course completion tracking.

use uuid::Uuid;

use crate::curriculum::CurriculumGraph;
use crate::error::EngineError;
use crate::rewards::RewardLedger;

use super::store::ProgressStore;
use super::types::{CompletionUpdate, CourseStatus, JourneyEntry, ProgressRecord};

/// Tracks each child's advance through the ordered course sequence.
pub struct ProgressTracker<'a> {
    store: ProgressStore<'a>,
    graph: &'a CurriculumGraph,
    ledger: &'a RewardLedger<'a>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(
        conn: &'a rusqlite::Connection,
        graph: &'a CurriculumGraph,
        ledger: &'a RewardLedger<'a>,
    ) -> Self {
        Self {
            store: ProgressStore::new(conn),
            graph,
            ledger,
        }
    }

    /// Recompute the status of every course in rank order.
    ///
    /// The first course is always at least not-started; each later course
    /// stays locked until its predecessor completes. Persisted statuses
    /// are never downgraded by this walk.
    pub fn evaluate_unlock_state(
        &self,
        child_id: Uuid,
    ) -> Result<Vec<(Uuid, CourseStatus)>, EngineError> {
        let persisted = self.store.statuses_for_child(child_id)?;

        let mut result = Vec::with_capacity(self.graph.len());
        let mut prior_completed = true; // rank 0 is always reachable

        for course in self.graph.courses() {
            let derived = if prior_completed {
                CourseStatus::NotStarted
            } else {
                CourseStatus::Locked
            };

            let stored = persisted
                .get(&course.id)
                .map(|(status, _)| *status)
                .unwrap_or(CourseStatus::Locked);

            let effective = derived.max(stored);
            prior_completed = effective == CourseStatus::Completed;
            result.push((course.id, effective));
        }

        Ok(result)
    }

    /// Record that a child completed one required content item.
    ///
    /// Idempotent: re-recording an already-completed item is a no-op.
    /// When the completion set reaches the full required set, the course
    /// completes and the course reward is requested (the ledger makes
    /// duplicate requests harmless).
    pub fn record_content_completion(
        &self,
        child_id: Uuid,
        course_id: Uuid,
        content_item_id: Uuid,
    ) -> Result<CompletionUpdate, EngineError> {
        let course = self.graph.course(course_id).ok_or_else(|| {
            EngineError::not_applicable(format!("Unknown course {}", course_id))
        })?;

        if course.required_item(content_item_id).is_none() {
            return Err(EngineError::not_applicable(format!(
                "Content item {} is not required by course {}",
                content_item_id, course_id
            )));
        }

        let status = self
            .evaluate_unlock_state(child_id)?
            .into_iter()
            .find(|(id, _)| *id == course_id)
            .map(|(_, status)| status)
            .unwrap_or(CourseStatus::Locked);

        if status == CourseStatus::Locked {
            tracing::warn!(
                child = %child_id,
                course = %course_id,
                "Rejected completion signal for locked course"
            );
            return Err(EngineError::not_applicable(format!(
                "Course {} is still locked",
                course_id
            )));
        }

        self.store.ensure_record(child_id, course_id)?;
        let newly_completed_item =
            self.store
                .add_completed_item(child_id, course_id, content_item_id)?;
        self.store
            .raise_status(child_id, course_id, CourseStatus::InProgress)?;

        let completed = self.store.completed_items(child_id, course_id)?;
        let course_completed = course.is_fully_covered_by(&completed);

        let reward = if course_completed {
            let transitioned = self.store.mark_completed(child_id, course_id)?;
            if transitioned {
                tracing::info!(child = %child_id, course = %course_id, "Course completed");
            }
            // Requested on every call that observes the full set; the
            // ledger's uniqueness key keeps the grant at-most-once.
            Some(self.ledger.grant_course_reward(
                child_id,
                course_id,
                course.reward.stars,
                course.reward.badge_id,
            )?)
        } else {
            None
        };

        let record = self
            .store
            .get(child_id, course_id)?
            .unwrap_or_else(|| {
                ProgressRecord::synthesized(child_id, course_id, CourseStatus::NotStarted)
            });

        Ok(CompletionUpdate {
            record,
            newly_completed_item,
            course_completed,
            reward,
        })
    }

    /// Read-only projection of the child's full journey, in rank order.
    ///
    /// Courses with no persisted record appear as locked (or not-started
    /// when reachable) with an empty completion set; nothing is persisted
    /// by this call.
    pub fn get_child_journey(&self, child_id: Uuid) -> Result<Vec<JourneyEntry>, EngineError> {
        let statuses = self.evaluate_unlock_state(child_id)?;
        let persisted = self.store.statuses_for_child(child_id)?;

        let mut journey = Vec::with_capacity(statuses.len());
        for (course, (course_id, status)) in self.graph.courses().iter().zip(statuses) {
            debug_assert_eq!(course.id, course_id);

            let completed_items = if persisted.contains_key(&course_id) {
                self.store.completed_items(child_id, course_id)?.len()
            } else {
                0
            };

            journey.push(JourneyEntry {
                course_id,
                sequence_position: course.sequence_position,
                status,
                completed_items,
                required_items: course.required_items.len(),
                completed_at: persisted.get(&course_id).and_then(|(_, at)| *at),
            });
        }

        Ok(journey)
    }

    /// Progress for a single course, synthesized when no record exists.
    pub fn course_progress(
        &self,
        child_id: Uuid,
        course_id: Uuid,
    ) -> Result<ProgressRecord, EngineError> {
        if self.graph.course(course_id).is_none() {
            return Err(EngineError::not_applicable(format!(
                "Unknown course {}",
                course_id
            )));
        }

        if let Some(record) = self.store.get(child_id, course_id)? {
            return Ok(record);
        }

        let status = self
            .evaluate_unlock_state(child_id)?
            .into_iter()
            .find(|(id, _)| *id == course_id)
            .map(|(_, status)| status)
            .unwrap_or(CourseStatus::Locked);

        Ok(ProgressRecord::synthesized(child_id, course_id, status))
    }
}
