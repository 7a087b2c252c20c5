//! Per-kind content completion policy.
//!
//! A completion signal arrives from the delivery layer; the policy decides,
//! from the item's rule and the child's recorded interaction state, whether
//! the item now counts as complete. Dispatch is a tagged-variant match, one
//! arm per content kind.

use uuid::Uuid;

use crate::curriculum::{CompletionRule, ContentItem, ContentKind};
use crate::engine::config::EngineConfig;
use crate::error::EngineError;

/// A kind-specific completion signal from the delivery subsystem.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionSignal {
    /// The activity was submitted or auto-completed
    Activity,
    /// A reading event was recorded; carries the running distinct count
    Book { reading_count: u32 },
    /// A watch event finished at the given completion percentage
    Video { completion_percentage: f32 },
    /// The audio submission was (re)evaluated by moderation
    AudioAssignment,
}

impl CompletionSignal {
    /// The content kind this signal pertains to.
    pub fn kind(&self) -> ContentKind {
        match self {
            CompletionSignal::Activity => ContentKind::Activity,
            CompletionSignal::Book { .. } => ContentKind::Book,
            CompletionSignal::Video { .. } => ContentKind::Video,
            CompletionSignal::AudioAssignment => ContentKind::AudioAssignment,
        }
    }
}

/// Read-only moderation seam for audio assignments.
///
/// "Submitted but not yet reviewed" must answer `false`; only an approved
/// submission completes the item.
pub trait ModerationLookup {
    fn is_submission_approved(
        &self,
        child_id: Uuid,
        content_item_id: Uuid,
    ) -> Result<bool, EngineError>;
}

/// Evaluates completion signals against content items.
pub struct ContentCompletionPolicy<'a> {
    config: &'a EngineConfig,
    moderation: &'a dyn ModerationLookup,
}

impl<'a> ContentCompletionPolicy<'a> {
    pub fn new(config: &'a EngineConfig, moderation: &'a dyn ModerationLookup) -> Self {
        Self { config, moderation }
    }

    /// Whether the item is now complete given this signal.
    ///
    /// A signal whose variant does not match the item's kind is rejected
    /// with a kind-mismatch error; it never silently succeeds.
    pub fn evaluate(
        &self,
        child_id: Uuid,
        item: &ContentItem,
        signal: &CompletionSignal,
    ) -> Result<bool, EngineError> {
        if signal.kind() != item.kind() {
            return Err(EngineError::KindMismatch {
                expected: item.kind(),
                got: signal.kind(),
            });
        }

        let complete = match (&item.rule, signal) {
            (CompletionRule::Activity, CompletionSignal::Activity) => true,
            (
                CompletionRule::Book { required_readings },
                CompletionSignal::Book { reading_count },
            ) => {
                let required = required_readings.unwrap_or(self.config.book_reading_threshold);
                *reading_count >= required
            }
            (
                CompletionRule::Video {
                    completion_threshold,
                },
                CompletionSignal::Video {
                    completion_percentage,
                },
            ) => {
                let threshold =
                    completion_threshold.unwrap_or(self.config.video_completion_threshold);
                EngineConfig::clamp_percentage(*completion_percentage) >= threshold
            }
            (CompletionRule::AudioAssignment, CompletionSignal::AudioAssignment) => self
                .moderation
                .is_submission_approved(child_id, item.id)?,
            // Variants already matched by kind above
            _ => unreachable!("signal kind checked against item kind"),
        };

        Ok(complete)
    }
}
