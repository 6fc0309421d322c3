mod support;

use std::sync::Arc;

use services::{
    ControllerError, NextOutcome, ScoreLedger, SessionController, SessionMachine, SessionPhase,
};
use storage::{KeyValueStore, LEADERBOARD_KEY, LeaderboardSlot};
use support::{CountingStore, RIGHT, ScriptedProvider, WRONG, batch, easy_batch};
use trivia_core::model::{BatchStatus, Difficulty, Leaderboard, PlayerName, ScoreEntry};
use trivia_core::time::{fixed_clock, fixed_now};

async fn controller_with(
    provider: Arc<ScriptedProvider>,
    store: CountingStore,
) -> SessionController {
    let ledger = ScoreLedger::load(Arc::new(store), fixed_clock()).await;
    SessionController::new(SessionMachine::new(provider), ledger)
}

/// Answer every question with `pick` and step through to the end.
async fn play_through(controller: &mut SessionController, pick: &str) -> NextOutcome {
    loop {
        controller.answer(pick).expect("playing");
        match controller.next().await.expect("playing") {
            NextOutcome::Scheduled => controller.settled().await,
            other => return other,
        }
    }
}

#[tokio::test]
async fn start_loads_batch_and_enters_playing() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(easy_batch(10))]));
    let mut controller = controller_with(Arc::clone(&provider), CountingStore::default()).await;

    assert_eq!(controller.phase(), SessionPhase::Welcome);
    assert_eq!(controller.start("  Hildegard ").await.unwrap(), BatchStatus::Success);

    assert_eq!(controller.phase(), SessionPhase::Playing);
    assert_eq!(controller.player().map(PlayerName::as_str), Some("Hildegard"));
    let snap = controller.snapshot();
    assert_eq!((snap.index, snap.score, snap.total), (0, 0, 10));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn blank_name_stays_on_welcome() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(easy_batch(3))]));
    let mut controller = controller_with(Arc::clone(&provider), CountingStore::default()).await;

    let err = controller.start("   ").await.unwrap_err();
    assert!(matches!(err, ControllerError::InvalidName(_)));
    assert_eq!(controller.phase(), SessionPhase::Welcome);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn long_names_are_truncated() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(easy_batch(1))]));
    let mut controller = controller_with(provider, CountingStore::default()).await;

    controller
        .start("Giovanni Pierluigi da Palestrina")
        .await
        .unwrap();
    assert_eq!(
        controller.player().map(PlayerName::as_str),
        Some("Giovanni Pierlu")
    );
}

#[tokio::test]
async fn failed_load_can_be_retried() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok(Vec::new()),
        Ok(easy_batch(4)),
    ]));
    let mut controller = controller_with(Arc::clone(&provider), CountingStore::default()).await;

    assert_eq!(controller.start("Perotin").await.unwrap(), BatchStatus::Error);
    assert_eq!(controller.phase(), SessionPhase::Playing);
    assert_eq!(controller.snapshot().total, 0);
    assert!(matches!(controller.next().await.unwrap(), NextOutcome::Ignored));

    assert_eq!(controller.retry().await.unwrap(), BatchStatus::Success);
    assert_eq!(controller.snapshot().total, 4);
    assert_eq!(provider.calls(), 2);

    assert!(matches!(
        controller.retry().await,
        Err(ControllerError::NothingToRetry)
    ));
}

#[tokio::test]
async fn full_game_records_one_result() {
    let tiers = [Difficulty::Easy, Difficulty::Hard, Difficulty::Extreme];
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(batch(&tiers))]));
    let store = CountingStore::default();
    let mut controller = controller_with(provider, store.clone()).await;

    controller.start("Machaut").await.unwrap();
    let NextOutcome::Finished(result) = play_through(&mut controller, RIGHT).await else {
        panic!("game should finish");
    };

    assert_eq!(controller.phase(), SessionPhase::GameOver);
    assert!(result.saved);
    assert_eq!(result.position, Some(0));
    assert_eq!(result.entry.name, "Machaut");
    assert_eq!(result.entry.score, 900);
    assert_eq!(result.entry.created_at, fixed_now());
    assert_eq!(controller.highlighted_entry(), Some(0));
    assert_eq!(store.puts(), 1);

    let persisted = LeaderboardSlot::new(Arc::new(store.clone())).load().await.unwrap();
    assert_eq!(persisted.entries(), controller.leaderboard().entries());

    // Only `restart` leaves GameOver.
    assert!(matches!(
        controller.next().await,
        Err(ControllerError::WrongPhase {
            expected: SessionPhase::Playing,
            actual: SessionPhase::GameOver
        })
    ));
    assert_eq!(store.puts(), 1);
}

#[tokio::test]
async fn new_result_ranks_among_existing_scores() {
    let store = CountingStore::default();
    let seeded = Leaderboard::new()
        .with_entry(ScoreEntry::new(&PlayerName::parse("A").unwrap(), 500, fixed_now()))
        .with_entry(ScoreEntry::new(&PlayerName::parse("B").unwrap(), 300, fixed_now()));
    store
        .put(LEADERBOARD_KEY, &serde_json::to_string(seeded.entries()).unwrap())
        .await
        .unwrap();

    let tiers = [Difficulty::Easy, Difficulty::Hard];
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(batch(&tiers))]));
    let mut controller = controller_with(provider, store.clone()).await;
    assert_eq!(controller.leaderboard().len(), 2);

    controller.start("C").await.unwrap();
    play_through(&mut controller, RIGHT).await;

    let names: Vec<_> = controller
        .leaderboard()
        .entries()
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(names, ["A", "C", "B"]);
    assert_eq!(controller.highlighted_entry(), Some(1));
}

#[tokio::test]
async fn low_score_on_full_board_is_not_highlighted() {
    let store = CountingStore::default();
    let mut seeded = Leaderboard::new();
    for (i, name) in ["A", "B", "C", "D", "E"].into_iter().enumerate() {
        let score = 1000 - u32::try_from(i).unwrap() * 100;
        let player = PlayerName::parse(name).unwrap();
        seeded = seeded.with_entry(ScoreEntry::new(&player, score, fixed_now()));
    }
    store
        .put(LEADERBOARD_KEY, &serde_json::to_string(seeded.entries()).unwrap())
        .await
        .unwrap();

    let provider = Arc::new(ScriptedProvider::new(vec![Ok(easy_batch(2))]));
    let mut controller = controller_with(provider, store).await;
    controller.start("Late").await.unwrap();
    let NextOutcome::Finished(result) = play_through(&mut controller, WRONG).await else {
        panic!("game should finish");
    };

    assert_eq!(result.entry.score, 0);
    assert_eq!(result.position, None);
    assert_eq!(controller.highlighted_entry(), None);
    assert_eq!(controller.leaderboard().len(), Leaderboard::CAPACITY);
}

#[tokio::test]
async fn failed_write_still_ends_the_game() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(easy_batch(1))]));
    let store = CountingStore::failing();
    let mut controller = controller_with(provider, store.clone()).await;

    controller.start("Dufay").await.unwrap();
    controller.answer(RIGHT).unwrap();
    let NextOutcome::Finished(result) = controller.next().await.unwrap() else {
        panic!("single question should finish");
    };

    assert!(!result.saved);
    assert_eq!(result.entry.score, 100);
    assert_eq!(controller.phase(), SessionPhase::GameOver);
    assert!(controller.leaderboard().is_empty());
    assert_eq!(controller.highlighted_entry(), None);
    assert_eq!(store.puts(), 1);
}

#[tokio::test]
async fn restart_keeps_leaderboard_and_clears_session() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok(easy_batch(1)),
        Ok(easy_batch(2)),
    ]));
    let mut controller = controller_with(provider, CountingStore::default()).await;

    controller.start("Byrd").await.unwrap();
    play_through(&mut controller, RIGHT).await;
    controller.restart();

    assert_eq!(controller.phase(), SessionPhase::Welcome);
    assert_eq!(controller.snapshot().status, BatchStatus::Idle);
    assert_eq!(controller.snapshot().score, 0);
    assert_eq!(controller.leaderboard().len(), 1);
    assert_eq!(controller.highlighted_entry(), None);

    assert_eq!(controller.start("Tallis").await.unwrap(), BatchStatus::Success);
    assert_eq!(controller.snapshot().total, 2);
}

#[tokio::test(start_paused = true)]
async fn restart_mid_game_abandons_without_saving() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(easy_batch(3))]));
    let store = CountingStore::default();
    let mut controller = controller_with(provider, store.clone()).await;

    controller.start("Gesualdo").await.unwrap();
    controller.answer(RIGHT).unwrap();
    assert!(matches!(controller.next().await.unwrap(), NextOutcome::Scheduled));
    controller.restart();
    controller.settled().await;
    tokio::time::sleep(services::SETTLE_DELAY * 2).await;

    assert_eq!(controller.phase(), SessionPhase::Welcome);
    let snap = controller.snapshot();
    assert_eq!((snap.status, snap.index, snap.score), (BatchStatus::Idle, 0, 0));
    assert!(!snap.transitioning);
    assert_eq!(store.puts(), 0);
}

#[tokio::test]
async fn actions_are_rejected_in_the_wrong_phase() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(easy_batch(1))]));
    let mut controller = controller_with(provider, CountingStore::default()).await;

    assert!(matches!(
        controller.answer(RIGHT),
        Err(ControllerError::WrongPhase { .. })
    ));
    assert!(matches!(
        controller.previous(),
        Err(ControllerError::WrongPhase { .. })
    ));
    assert!(matches!(
        controller.retry().await,
        Err(ControllerError::WrongPhase { .. })
    ));

    controller.start("Ockeghem").await.unwrap();
    assert!(matches!(
        controller.start("Again").await,
        Err(ControllerError::WrongPhase {
            expected: SessionPhase::Welcome,
            actual: SessionPhase::Playing
        })
    ));

    // Restart from Welcome is a no-op.
    controller.restart();
    controller.restart();
    assert_eq!(controller.phase(), SessionPhase::Welcome);
}

#[tokio::test(start_paused = true)]
async fn going_back_never_costs_points() {
    let tiers = [Difficulty::Medium, Difficulty::Easy];
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(batch(&tiers))]));
    let mut controller = controller_with(provider, CountingStore::default()).await;

    controller.start("Josquin").await.unwrap();
    controller.answer(RIGHT).unwrap();
    controller.next().await.unwrap();
    controller.settled().await;
    controller.previous().unwrap();
    controller.settled().await;

    assert_eq!(controller.snapshot().index, 0);
    assert_eq!(controller.snapshot().score, 200);
    controller.answer(RIGHT).unwrap();
    assert_eq!(controller.snapshot().score, 200);

    controller.next().await.unwrap();
    controller.settled().await;
    controller.answer(RIGHT).unwrap();
    let NextOutcome::Finished(result) = controller.next().await.unwrap() else {
        panic!("last question should finish");
    };
    assert_eq!(result.entry.score, 300);
}

#[tokio::test]
async fn question_count_is_configurable() {
    let provider = Arc::new(ScriptedProvider::new(Vec::new()));
    let controller = controller_with(provider, CountingStore::default())
        .await
        .with_question_count(0);
    assert_eq!(controller.question_count(), services::DEFAULT_QUESTION_COUNT);

    let controller = controller.with_question_count(3);
    assert_eq!(controller.question_count(), 3);
}
