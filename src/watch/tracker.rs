//! Watch event tracking for curriculum and explore videos.

use uuid::Uuid;

use crate::curriculum::{CompletionRule, ContentItem, ContentKind, ExploreVideo};
use crate::engine::config::EngineConfig;
use crate::error::EngineError;
use crate::rewards::{RewardLedger, RewardType};

use super::store::WatchStore;
use super::types::{WatchContext, WatchStatus, WatchUpdate};

/// Records watch events and drives explore-video rewards.
///
/// Curriculum-context completions are reported back through
/// [`WatchUpdate::qualifying`]; the caller feeds those into the progress
/// tracker, which owns course-level effects.
pub struct WatchTracker<'a> {
    store: WatchStore<'a>,
    config: &'a EngineConfig,
    ledger: &'a RewardLedger<'a>,
}

impl<'a> WatchTracker<'a> {
    pub fn new(
        conn: &'a rusqlite::Connection,
        config: &'a EngineConfig,
        ledger: &'a RewardLedger<'a>,
    ) -> Self {
        Self {
            store: WatchStore::new(conn),
            config,
            ledger,
        }
    }

    /// Record a watch of a curriculum video.
    ///
    /// Never grants by itself; course rewards flow through the progress
    /// tracker once the qualifying completion is recorded there.
    pub fn record_curriculum_watch(
        &self,
        child_id: Uuid,
        item: &ContentItem,
        percentage: f32,
    ) -> Result<WatchUpdate, EngineError> {
        let threshold = match &item.rule {
            CompletionRule::Video {
                completion_threshold,
            } => completion_threshold.unwrap_or(self.config.video_completion_threshold),
            _ => {
                return Err(EngineError::KindMismatch {
                    expected: item.kind(),
                    got: ContentKind::Video,
                })
            }
        };

        let percentage = EngineConfig::clamp_percentage(percentage);
        let qualifying = percentage >= threshold;

        let record = self.store.record_watch(
            child_id,
            item.id,
            WatchContext::Curriculum,
            percentage,
            qualifying,
        )?;

        Ok(WatchUpdate {
            record,
            qualifying,
            reward: None,
        })
    }

    /// Record a watch of a freestanding explore video.
    ///
    /// Replay-tagged types never grant, whatever the percentage or count;
    /// other types grant once the completion threshold is crossed and the
    /// type's total-watch-count requirement is met.
    pub fn record_explore_watch(
        &self,
        child_id: Uuid,
        video: &ExploreVideo,
        percentage: f32,
    ) -> Result<WatchUpdate, EngineError> {
        let percentage = EngineConfig::clamp_percentage(percentage);
        let qualifying = percentage >= self.config.video_completion_threshold;

        let record = self.store.record_watch(
            child_id,
            video.id,
            WatchContext::Explore,
            percentage,
            qualifying,
        )?;

        if self.config.is_replay(&video.video_type) {
            tracing::debug!(
                child = %child_id,
                video = %video.id,
                "Replay video watched, no reward"
            );
            return Ok(WatchUpdate {
                record,
                qualifying,
                reward: None,
            });
        }

        let eligible =
            qualifying && record.watch_count >= self.config.watch_threshold(&video.video_type);

        let reward = if eligible {
            let amount = self.config.explore_star_amount(&video.video_type);
            Some(self.ledger.grant_item_reward(
                child_id,
                video.id,
                amount,
                Some(video.video_type.as_str()),
            )?)
        } else {
            None
        };

        Ok(WatchUpdate {
            record,
            qualifying,
            reward,
        })
    }

    /// Read-only watch status; star state comes from the ledger.
    pub fn get_watch_status(
        &self,
        child_id: Uuid,
        content_item_id: Uuid,
        context: WatchContext,
    ) -> Result<WatchStatus, EngineError> {
        let watch_count = self
            .store
            .get(child_id, content_item_id, context)?
            .map(|r| r.watch_count)
            .unwrap_or(0);

        let stars_awarded = self.ledger.stars_awarded_for(child_id, content_item_id)?;

        Ok(WatchStatus {
            watch_count,
            is_watched: watch_count > 0,
            stars_awarded,
        })
    }

    /// Administrative reset: zero the watch state and remove the item-star
    /// entry tied to this watch relationship, so the reward can be
    /// re-earned. Course-level rewards granted through other paths are
    /// untouched.
    pub fn reset_watch(
        &self,
        child_id: Uuid,
        content_item_id: Uuid,
        context: WatchContext,
    ) -> Result<(), EngineError> {
        self.store.reset(child_id, content_item_id, context)?;

        if context == WatchContext::Explore
            && self
                .ledger
                .has_granted(child_id, content_item_id, RewardType::ItemStar)?
        {
            self.ledger.revoke_item_reward(child_id, content_item_id)?;
        }

        tracing::info!(
            child = %child_id,
            item = %content_item_id,
            context = %context,
            "Watch state reset"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::StatsProjection;
    use crate::storage::Database;

    fn explore_video(video_type: &str) -> ExploreVideo {
        ExploreVideo::new(Uuid::new_v4(), video_type)
    }

    #[test]
    fn test_explore_watched_twice_grants_once() {
        let db = Database::open_in_memory().unwrap();
        let config = EngineConfig::default();
        let stats = StatsProjection::new(db.connection());
        let ledger = RewardLedger::new(db.connection(), &stats);
        let tracker = WatchTracker::new(db.connection(), &config, &ledger);

        let child = Uuid::new_v4();
        let video = explore_video("cooking");

        let first = tracker.record_explore_watch(child, &video, 100.0).unwrap();
        assert!(first.qualifying);
        assert!(first.reward_granted());

        let second = tracker.record_explore_watch(child, &video, 100.0).unwrap();
        assert_eq!(second.record.watch_count, 2);
        assert!(!second.reward_granted());

        let status = tracker
            .get_watch_status(child, video.id, WatchContext::Explore)
            .unwrap();
        assert_eq!(status.watch_count, 2);
        assert!(status.is_watched);
        assert_eq!(status.stars_awarded, 10);
    }

    #[test]
    fn test_is_watched_before_eligibility() {
        let db = Database::open_in_memory().unwrap();
        let config = EngineConfig::default();
        let stats = StatsProjection::new(db.connection());
        let ledger = RewardLedger::new(db.connection(), &stats);
        let tracker = WatchTracker::new(db.connection(), &config, &ledger);

        let child = Uuid::new_v4();
        let video = explore_video("cooking");

        // A 30% watch is "seen" but earns nothing
        let update = tracker.record_explore_watch(child, &video, 30.0).unwrap();
        assert!(!update.qualifying);
        assert!(update.reward.is_none());

        let status = tracker
            .get_watch_status(child, video.id, WatchContext::Explore)
            .unwrap();
        assert!(status.is_watched);
        assert_eq!(status.stars_awarded, 0);
    }

    #[test]
    fn test_replay_never_rewards() {
        let db = Database::open_in_memory().unwrap();
        let config = EngineConfig::default();
        let stats = StatsProjection::new(db.connection());
        let ledger = RewardLedger::new(db.connection(), &stats);
        let tracker = WatchTracker::new(db.connection(), &config, &ledger);

        let child = Uuid::new_v4();
        let video = explore_video("replay");

        for _ in 0..5 {
            let update = tracker.record_explore_watch(child, &video, 100.0).unwrap();
            assert!(update.reward.is_none());
        }

        // Watch state is still tracked for display
        let status = tracker
            .get_watch_status(child, video.id, WatchContext::Explore)
            .unwrap();
        assert_eq!(status.watch_count, 5);
        assert!(status.is_watched);
        assert_eq!(status.stars_awarded, 0);
        assert!(!ledger
            .has_granted(child, video.id, RewardType::ItemStar)
            .unwrap());
    }

    #[test]
    fn test_repeat_view_threshold() {
        let db = Database::open_in_memory().unwrap();
        let mut config = EngineConfig::default();
        config.explore_watch_thresholds.insert("song".into(), 3);
        let stats = StatsProjection::new(db.connection());
        let ledger = RewardLedger::new(db.connection(), &stats);
        let tracker = WatchTracker::new(db.connection(), &config, &ledger);

        let child = Uuid::new_v4();
        let video = explore_video("song");

        // Qualifying watches below the count requirement do not grant
        for expected_count in 1..3 {
            let update = tracker.record_explore_watch(child, &video, 95.0).unwrap();
            assert_eq!(update.record.watch_count, expected_count);
            assert!(update.reward.is_none());
        }

        let third = tracker.record_explore_watch(child, &video, 95.0).unwrap();
        assert!(third.reward_granted());
    }

    #[test]
    fn test_curriculum_watch_reports_qualifying() {
        let db = Database::open_in_memory().unwrap();
        let config = EngineConfig::default();
        let stats = StatsProjection::new(db.connection());
        let ledger = RewardLedger::new(db.connection(), &stats);
        let tracker = WatchTracker::new(db.connection(), &config, &ledger);

        let child = Uuid::new_v4();
        let item = ContentItem::video(Uuid::new_v4(), Some(90.0));

        let low = tracker.record_curriculum_watch(child, &item, 85.0).unwrap();
        assert!(!low.qualifying);
        assert!(low.reward.is_none());

        let high = tracker.record_curriculum_watch(child, &item, 92.0).unwrap();
        assert!(high.qualifying);
        // Curriculum watches never grant directly
        assert!(high.reward.is_none());
    }

    #[test]
    fn test_curriculum_watch_rejects_non_video() {
        let db = Database::open_in_memory().unwrap();
        let config = EngineConfig::default();
        let stats = StatsProjection::new(db.connection());
        let ledger = RewardLedger::new(db.connection(), &stats);
        let tracker = WatchTracker::new(db.connection(), &config, &ledger);

        let item = ContentItem::book(Uuid::new_v4(), None);
        let result = tracker.record_curriculum_watch(Uuid::new_v4(), &item, 100.0);
        assert!(matches!(result, Err(EngineError::KindMismatch { .. })));
    }

    #[test]
    fn test_reset_allows_exactly_one_regrant() {
        let db = Database::open_in_memory().unwrap();
        let config = EngineConfig::default();
        let stats = StatsProjection::new(db.connection());
        let ledger = RewardLedger::new(db.connection(), &stats);
        let tracker = WatchTracker::new(db.connection(), &config, &ledger);

        let child = Uuid::new_v4();
        let video = explore_video("cooking");
        let other = explore_video("cooking");

        tracker.record_explore_watch(child, &video, 100.0).unwrap();
        tracker.record_explore_watch(child, &other, 100.0).unwrap();
        assert_eq!(stats.get(child).unwrap().total_stars, 20);

        tracker
            .reset_watch(child, video.id, WatchContext::Explore)
            .unwrap();
        assert_eq!(stats.get(child).unwrap().total_stars, 10);

        let status = tracker
            .get_watch_status(child, video.id, WatchContext::Explore)
            .unwrap();
        assert_eq!(status.watch_count, 0);
        assert!(!status.is_watched);

        // Re-completion grants exactly once more; the unrelated entry
        // was never touched
        let regrant = tracker.record_explore_watch(child, &video, 100.0).unwrap();
        assert!(regrant.reward_granted());
        let again = tracker.record_explore_watch(child, &video, 100.0).unwrap();
        assert!(!again.reward_granted());
        assert_eq!(stats.get(child).unwrap().total_stars, 30);
        assert!(ledger
            .has_granted(child, other.id, RewardType::ItemStar)
            .unwrap());
    }
}
