//! QA: deck navigation, lazy image generation, and story requests
//! driven end-to-end through the session with mocked services.

use tales_core::testing::{placeholder_card, uploaded_card, MockAi, MockFetcher};
use tales_core::{
    run_image_job, run_story_job, CardDraft, DeckFile, Session, Severity, StoryCard,
};
use tempfile::TempDir;

fn deck_file(dir: &TempDir) -> DeckFile {
    DeckFile::new(dir.path().join("deck.json"))
}

fn three_card_deck() -> Vec<StoryCard> {
    vec![
        placeholder_card("1", "Whispering Shadows", "dark forest"),
        placeholder_card("2", "The Attic Door Creaks", "attic door"),
        placeholder_card("3", "Forgotten Lullaby", "music box"),
    ]
}

fn draft(phrase: &str, hint: &str, image: &str) -> CardDraft {
    CardDraft {
        phrase: phrase.to_string(),
        image_hint: hint.to_string(),
        image_data_uri: image.to_string(),
    }
}

// ============================================================================
// Lazy image generation
// ============================================================================

#[tokio::test]
async fn test_lazy_generation_targets_the_card_that_became_current() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());
    let ai = MockAi::new();
    ai.queue_image("data:image/png;base64,AAA");

    let job = session.advance().await.expect("card 2 needs an image");
    assert_eq!(job.card_id, "2");
    assert!(session.image_in_flight());

    let result = run_image_job(&job, &ai).await;
    session.complete_image(&job.card_id, result).await;

    assert!(!session.image_in_flight());
    assert_eq!(
        session.cards()[1].image.data_uri(),
        Some("data:image/png;base64,AAA")
    );
    assert!(session.cards()[0].image.is_placeholder());
    assert!(session.cards()[2].image.is_placeholder());
    assert_eq!(ai.image_requests(), vec!["attic door"]);
}

#[tokio::test]
async fn test_only_one_generation_in_flight_at_a_time() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());

    let first = session.advance().await;
    assert!(first.is_some());

    // Navigating onto other placeholder cards while the first job is
    // outstanding must not claim a second one.
    assert!(session.advance().await.is_none());
    assert!(session.advance().await.is_none());
    assert!(session.image_in_flight());
}

#[tokio::test]
async fn test_late_result_commits_to_the_original_card() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());

    let job = session.advance().await.expect("job for card 2");
    assert_eq!(job.card_id, "2");

    // User advances away before the result lands.
    session.advance().await;
    assert_eq!(session.current_card().unwrap().id, "3");

    session
        .complete_image(&job.card_id, Ok("data:image/png;base64,AAA".to_string()))
        .await;

    // Stale but correct: the image belongs to card 2, not to card 3.
    assert_eq!(
        session.cards()[1].image.data_uri(),
        Some("data:image/png;base64,AAA")
    );
    assert!(session.cards()[2].image.is_placeholder());
}

#[tokio::test]
async fn test_generation_failure_keeps_placeholder_and_notifies() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());
    let ai = MockAi::new();
    ai.queue_image_failure();

    let job = session.advance().await.expect("job for card 2");
    let result = run_image_job(&job, &ai).await;
    let follow_up = session.complete_image(&job.card_id, result).await;

    // The failed card is still current; it is not retried.
    assert!(follow_up.is_none());
    assert!(!session.image_in_flight());
    assert!(session.cards()[1].image.is_placeholder());

    let notices = session.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Card Image Error");
    assert_eq!(notices[0].severity, Severity::Error);
}

#[tokio::test]
async fn test_stale_completion_resumes_generation_for_the_current_card() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());

    let job = session.advance().await.expect("job for card 2");
    // Advance onto card 3 while card 2's job is outstanding; the claim
    // for card 3 is suppressed.
    assert!(session.advance().await.is_none());

    let follow_up = session
        .complete_image(&job.card_id, Ok("data:image/png;base64,AAA".to_string()))
        .await
        .expect("card 3 still needs an image");

    // Generation picks the current card back up without another
    // navigation intent.
    assert_eq!(follow_up.card_id, "3");
    assert!(session.image_in_flight());

    session
        .complete_image(
            &follow_up.card_id,
            Ok("data:image/png;base64,CCC".to_string()),
        )
        .await;
    assert_eq!(
        session.cards()[2].image.data_uri(),
        Some("data:image/png;base64,CCC")
    );
    assert!(!session.image_in_flight());
}

#[tokio::test]
async fn test_stale_failure_still_resumes_the_current_card() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());
    let ai = MockAi::new();
    ai.queue_image_failure();

    let job = session.advance().await.expect("job for card 2");
    assert!(session.advance().await.is_none());

    let result = run_image_job(&job, &ai).await;
    let follow_up = session.complete_image(&job.card_id, result).await;

    // The failure belongs to card 2; card 3 still gets its job.
    assert_eq!(follow_up.expect("job for card 3").card_id, "3");
    assert!(session.cards()[1].image.is_placeholder());
    assert_eq!(session.drain_notices()[0].title, "Card Image Error");
}

#[tokio::test]
async fn test_snapshot_names_the_card_being_generated() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());

    let job = session.advance().await.expect("job for card 2");
    session.advance().await;

    // The outstanding job belongs to card 2 even though card 3 is shown.
    let snapshot = session.snapshot();
    assert_eq!(snapshot.generating_card_id.as_deref(), Some("2"));
    assert_eq!(snapshot.current_card.unwrap().id, "3");

    session
        .complete_image(&job.card_id, Ok("data:image/png;base64,AAA".to_string()))
        .await;
    assert_eq!(session.snapshot().generating_card_id.as_deref(), Some("3"));
}

#[tokio::test]
async fn test_generated_card_claims_no_further_jobs() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());

    let job = session.advance().await.expect("job for card 2");
    session
        .complete_image(&job.card_id, Ok("data:image/png;base64,AAA".to_string()))
        .await;

    // A full lap back onto card 2 finds it materialized: the next
    // claims are for the cards still on placeholders.
    let ids: Vec<Option<String>> = [
        session.advance().await, // card 3
        session.advance().await, // card 1
        session.advance().await, // card 2, already generated
    ]
    .into_iter()
    .map(|j| j.map(|j| j.card_id))
    .collect();

    assert_eq!(ids[0].as_deref(), Some("3"));
    assert!(session.image_in_flight());
    session
        .complete_image("3", Ok("data:image/png;base64,CCC".to_string()))
        .await;
    assert_eq!(ids[1], None); // claimed while 3 was in flight
    assert_eq!(ids[2], None); // card 2 needs nothing
}

// ============================================================================
// Story requests
// ============================================================================

#[tokio::test]
async fn test_story_from_materialized_image_skips_the_fetch() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(
        deck_file(&dir),
        vec![uploaded_card("u1", "The walls whispered", "old walls")],
    );
    let ai = MockAi::new();
    let fetcher = MockFetcher::new();
    ai.queue_story("The first whisper came on a Tuesday.");

    let job = session.begin_story().expect("story job");
    assert!(session.story_in_flight());

    let result = run_story_job(&job, &ai, &fetcher).await;
    session.complete_story(result);

    assert!(!session.story_in_flight());
    assert_eq!(
        session.story_starter(),
        Some("The first whisper came on a Tuesday.")
    );
    assert!(fetcher.requests().is_empty());
    assert_eq!(
        ai.story_requests(),
        vec![(
            "data:image/png;base64,QkJC".to_string(),
            "The walls whispered".to_string()
        )]
    );
}

#[tokio::test]
async fn test_story_on_placeholder_card_fetches_and_inlines() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());
    let ai = MockAi::new();
    let fetcher = MockFetcher::new();
    fetcher.queue_ok("data:image/png;base64,RkZG");
    ai.queue_story("Nobody remembered planting the forest.");

    let job = session.begin_story().expect("story job");
    let result = run_story_job(&job, &ai, &fetcher).await;
    session.complete_story(result);

    assert_eq!(fetcher.requests().len(), 1);
    assert_eq!(
        session.story_starter(),
        Some("Nobody remembered planting the forest.")
    );
}

#[tokio::test]
async fn test_failed_fetch_aborts_story_with_one_notice() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());
    let ai = MockAi::new();
    let fetcher = MockFetcher::new();
    fetcher.queue_failure();

    let job = session.begin_story().expect("story job");
    let result = run_story_job(&job, &ai, &fetcher).await;
    session.complete_story(result);

    assert!(session.story_starter().is_none());
    assert!(!session.story_in_flight());
    assert!(ai.story_requests().is_empty());

    let notices = session.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Card Image Unavailable");
}

#[tokio::test]
async fn test_story_failure_leaves_deck_untouched() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());
    let ai = MockAi::new();
    let fetcher = MockFetcher::new();
    fetcher.queue_ok("data:image/png;base64,RkZG");
    ai.queue_story_failure();

    let before: Vec<String> = session.cards().iter().map(|c| c.id.clone()).collect();
    let index_before = session.current_index();

    let job = session.begin_story().expect("story job");
    let result = run_story_job(&job, &ai, &fetcher).await;
    session.complete_story(result);

    let after: Vec<String> = session.cards().iter().map(|c| c.id.clone()).collect();
    assert_eq!(before, after);
    assert_eq!(session.current_index(), index_before);
    assert!(session.story_starter().is_none());
    assert_eq!(session.drain_notices()[0].title, "AI Story Error");
}

#[tokio::test]
async fn test_story_blocked_while_image_generation_in_flight() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());

    let job = session.advance().await.expect("image job");
    assert!(session.begin_story().is_none());

    session
        .complete_image(&job.card_id, Ok("data:image/png;base64,AAA".to_string()))
        .await;
    assert!(session.begin_story().is_some());
}

#[tokio::test]
async fn test_story_blocked_on_empty_deck() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), Vec::new());
    assert!(session.begin_story().is_none());
}

#[tokio::test]
async fn test_second_story_request_blocked_while_one_outstanding() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());

    assert!(session.begin_story().is_some());
    assert!(session.begin_story().is_none());
}

// ============================================================================
// Navigation and add-card
// ============================================================================

#[tokio::test]
async fn test_advance_wraps_and_clears_the_story() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());

    let _job = session.begin_story().unwrap();
    session.complete_story(Ok("A story.".to_string()));
    assert!(session.story_starter().is_some());

    for _ in 0..3 {
        session.advance().await;
    }

    assert_eq!(session.current_index(), 0);
    assert!(session.story_starter().is_none());
}

#[tokio::test]
async fn test_advance_on_empty_deck_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), Vec::new());
    assert!(session.advance().await.is_none());
    assert_eq!(session.current_index(), 0);
}

#[tokio::test]
async fn test_shuffle_permutes_and_notifies() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());

    let mut before: Vec<String> = session.cards().iter().map(|c| c.id.clone()).collect();
    session.shuffle().await;
    let mut after: Vec<String> = session.cards().iter().map(|c| c.id.clone()).collect();

    before.sort();
    after.sort();
    assert_eq!(before, after);
    assert_eq!(session.current_index(), 0);

    let notices = session.drain_notices();
    assert!(notices
        .iter()
        .any(|n| n.title == "Deck Shuffled" && n.severity == Severity::Info));
}

#[tokio::test]
async fn test_added_card_becomes_current() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());

    let job = session
        .add_card(draft(
            "The well hums at midnight",
            "old well",
            "data:image/png;base64,QkJC",
        ))
        .await
        .expect("valid draft");

    // Uploaded images never need generation.
    assert!(job.is_none());
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.cards().len(), 4);

    let current = session.current_card().unwrap();
    assert_eq!(current.phrase, "The well hums at midnight");
    assert_eq!(current.id, session.cards()[0].id);

    let notices = session.drain_notices();
    assert!(notices.iter().any(|n| n.title == "Card Created!"));
}

#[tokio::test]
async fn test_invalid_card_is_rejected_without_mutation() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::with_cards(deck_file(&dir), three_card_deck());

    let result = session
        .add_card(draft("   ", "old well", "data:image/png;base64,QkJC"))
        .await;

    assert!(result.is_err());
    assert_eq!(session.cards().len(), 3);
    assert_eq!(session.current_index(), 0);

    let notices = session.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Missing Phrase");
    assert_eq!(notices[0].severity, Severity::Error);
}
