//! End-to-end scenarios through the engine facade.
//!
//! Walks a child through a two-course curriculum and the explore
//! catalog the way the API layer would, one event per call.

use uuid::Uuid;

use starsteps::completion::CompletionSignal;
use starsteps::engine::EngineConfig;
use starsteps::{
    ContentItem, Course, CourseStatus, CurriculumGraph, Database, EngineError, ExploreCatalog,
    ExploreVideo, ModerationLookup, ProgressEngine, RewardSpec, WatchContext,
};

struct NoModeration;

impl ModerationLookup for NoModeration {
    fn is_submission_approved(&self, _: Uuid, _: Uuid) -> Result<bool, EngineError> {
        Ok(false)
    }
}

struct Fixture {
    engine: ProgressEngine,
    child_id: Uuid,
    course1_id: Uuid,
    course2_id: Uuid,
    activity_id: Uuid,
    video_id: Uuid,
    book_id: Uuid,
    badge_id: Uuid,
    cooking_id: Uuid,
    replay_id: Uuid,
}

/// Two courses with a gap in sequence positions, plus explore videos.
fn fixture() -> Fixture {
    let activity = ContentItem::activity(Uuid::new_v4());
    let video = ContentItem::video(Uuid::new_v4(), None);
    let book = ContentItem::book(Uuid::new_v4(), None);
    let badge_id = Uuid::new_v4();

    let activity_id = activity.id;
    let video_id = video.id;
    let book_id = book.id;

    let course1 = Course::new(10, vec![activity, video], RewardSpec::stars(50));
    let course2 = Course::new(30, vec![book], RewardSpec::stars(60).with_badge(badge_id));
    let course1_id = course1.id;
    let course2_id = course2.id;

    let cooking = ExploreVideo::new(Uuid::new_v4(), "cooking");
    let replay = ExploreVideo::new(Uuid::new_v4(), "replay");
    let cooking_id = cooking.id;
    let replay_id = replay.id;

    let engine = ProgressEngine::new(
        Database::open_in_memory().unwrap(),
        CurriculumGraph::new(vec![course1, course2]).unwrap(),
        ExploreCatalog::new(vec![cooking, replay]).unwrap(),
        EngineConfig::default(),
        Box::new(NoModeration),
    );

    Fixture {
        engine,
        child_id: Uuid::new_v4(),
        course1_id,
        course2_id,
        activity_id,
        video_id,
        book_id,
        badge_id,
        cooking_id,
        replay_id,
    }
}

#[test]
fn test_two_course_journey() {
    let f = fixture();

    // Fresh child: first course is available, second is locked
    let journey = f.engine.journey(f.child_id).unwrap();
    assert_eq!(journey.len(), 2);
    assert_eq!(journey[0].status, CourseStatus::NotStarted);
    assert_eq!(journey[1].status, CourseStatus::Locked);

    // A signal for the locked course is rejected and persists nothing
    let err = f
        .engine
        .submit_content_completion(
            f.child_id,
            f.course2_id,
            f.book_id,
            &CompletionSignal::Book { reading_count: 5 },
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::NotApplicable(_)));

    // Completing the activity starts course one
    let outcome = f
        .engine
        .submit_content_completion(
            f.child_id,
            f.course1_id,
            f.activity_id,
            &CompletionSignal::Activity,
        )
        .unwrap();
    assert!(outcome.item_complete);
    assert!(!outcome.course_completed);
    assert_eq!(outcome.record.status, CourseStatus::InProgress);

    // A qualifying watch finishes the video and with it the course
    let outcome = f
        .engine
        .submit_watch_event(f.child_id, f.video_id, WatchContext::Curriculum, 92.0)
        .unwrap();
    assert!(outcome.reward_granted);

    let journey = f.engine.journey(f.child_id).unwrap();
    assert_eq!(journey[0].status, CourseStatus::Completed);
    assert!(journey[0].completed_at.is_some());
    assert_eq!(journey[1].status, CourseStatus::NotStarted);
    assert_eq!(f.engine.child_stats(f.child_id).unwrap().total_stars, 50);

    // Replaying both signals grants nothing further
    let outcome = f
        .engine
        .submit_content_completion(
            f.child_id,
            f.course1_id,
            f.activity_id,
            &CompletionSignal::Activity,
        )
        .unwrap();
    assert!(!outcome.reward_granted);
    let outcome = f
        .engine
        .submit_watch_event(f.child_id, f.video_id, WatchContext::Curriculum, 100.0)
        .unwrap();
    assert!(!outcome.reward_granted);
    assert_eq!(f.engine.child_stats(f.child_id).unwrap().total_stars, 50);

    // Four readings leave the book incomplete
    for count in 1..5 {
        let outcome = f
            .engine
            .submit_content_completion(
                f.child_id,
                f.course2_id,
                f.book_id,
                &CompletionSignal::Book {
                    reading_count: count,
                },
            )
            .unwrap();
        assert!(!outcome.item_complete);
    }

    // The fifth completes course two with its badge
    let outcome = f
        .engine
        .submit_content_completion(
            f.child_id,
            f.course2_id,
            f.book_id,
            &CompletionSignal::Book { reading_count: 5 },
        )
        .unwrap();
    assert!(outcome.course_completed);
    assert!(outcome.reward_granted);

    let stats = f.engine.child_stats(f.child_id).unwrap();
    assert_eq!(stats.total_stars, 110);
    assert_eq!(stats.badges, vec![f.badge_id]);
}

#[test]
fn test_completion_order_does_not_matter() {
    let f = fixture();

    // Watch the video first, then the activity
    let outcome = f
        .engine
        .submit_watch_event(f.child_id, f.video_id, WatchContext::Curriculum, 95.0)
        .unwrap();
    assert!(!outcome.reward_granted);
    assert_eq!(
        f.engine
            .course_progress(f.child_id, f.course1_id)
            .unwrap()
            .status,
        CourseStatus::InProgress
    );

    let outcome = f
        .engine
        .submit_content_completion(
            f.child_id,
            f.course1_id,
            f.activity_id,
            &CompletionSignal::Activity,
        )
        .unwrap();
    assert!(outcome.course_completed);
    assert!(outcome.reward_granted);
}

#[test]
fn test_explore_rewards_and_replay_exemption() {
    let f = fixture();

    // A full cooking watch earns its stars once
    let outcome = f
        .engine
        .submit_watch_event(f.child_id, f.cooking_id, WatchContext::Explore, 100.0)
        .unwrap();
    assert!(outcome.reward_granted);
    let outcome = f
        .engine
        .submit_watch_event(f.child_id, f.cooking_id, WatchContext::Explore, 100.0)
        .unwrap();
    assert!(!outcome.reward_granted);
    assert_eq!(outcome.record.watch_count, 2);

    // Replay videos never reward, however often they are watched
    for _ in 0..3 {
        let outcome = f
            .engine
            .submit_watch_event(f.child_id, f.replay_id, WatchContext::Explore, 100.0)
            .unwrap();
        assert!(!outcome.reward_granted);
    }

    let status = f
        .engine
        .watch_status(f.child_id, f.replay_id, WatchContext::Explore)
        .unwrap();
    assert_eq!(status.watch_count, 3);
    assert!(status.is_watched);
    assert_eq!(status.stars_awarded, 0);

    assert_eq!(
        f.engine.stars_for_category(f.child_id, "cooking").unwrap(),
        10
    );
    assert_eq!(f.engine.child_stats(f.child_id).unwrap().total_stars, 10);
}

#[test]
fn test_reset_watch_allows_re_earning() {
    let f = fixture();

    f.engine
        .submit_watch_event(f.child_id, f.cooking_id, WatchContext::Explore, 100.0)
        .unwrap();
    assert_eq!(f.engine.child_stats(f.child_id).unwrap().total_stars, 10);

    f.engine
        .reset_watch(f.child_id, f.cooking_id, WatchContext::Explore)
        .unwrap();

    let status = f
        .engine
        .watch_status(f.child_id, f.cooking_id, WatchContext::Explore)
        .unwrap();
    assert_eq!(status.watch_count, 0);
    assert!(!status.is_watched);
    assert_eq!(f.engine.child_stats(f.child_id).unwrap().total_stars, 0);

    // The next qualifying watch earns the stars again, exactly once
    let outcome = f
        .engine
        .submit_watch_event(f.child_id, f.cooking_id, WatchContext::Explore, 100.0)
        .unwrap();
    assert!(outcome.reward_granted);
    assert_eq!(f.engine.child_stats(f.child_id).unwrap().total_stars, 10);
}

#[test]
fn test_partial_watch_starts_but_does_not_complete() {
    let f = fixture();

    f.engine
        .submit_content_completion(
            f.child_id,
            f.course1_id,
            f.activity_id,
            &CompletionSignal::Activity,
        )
        .unwrap();

    // Below the 80% threshold: counted but not completing
    let outcome = f
        .engine
        .submit_watch_event(f.child_id, f.video_id, WatchContext::Curriculum, 60.0)
        .unwrap();
    assert!(!outcome.reward_granted);
    assert_eq!(outcome.record.watch_count, 1);

    let record = f.engine.course_progress(f.child_id, f.course1_id).unwrap();
    assert_eq!(record.status, CourseStatus::InProgress);
    assert_eq!(record.completed_item_ids.len(), 1);
}
