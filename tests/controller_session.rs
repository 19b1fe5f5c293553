use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use nbak::config::{GameConfig, GameType};
use nbak::controller::{GameController, SessionResult};
use nbak::engine::{ClaimFeedback, DisplaySymbol, GameError};
use nbak::highscore::MemoryHighscoreStore;
use nbak::sequence::FixedSequenceSource;

fn config(size: usize, n_back: usize, interval_ms: u64) -> GameConfig {
    GameConfig {
        size,
        n_back,
        event_interval_ms: interval_ms,
        gap_ms: interval_ms.min(50),
        settle_ms: 0,
        ..GameConfig::default()
    }
}

fn controller_with(
    cfg: GameConfig,
    sequences: Vec<Vec<u8>>,
    store: &Arc<Mutex<MemoryHighscoreStore>>,
) -> GameController {
    GameController::new(
        cfg,
        Box::new(FixedSequenceSource::new(sequences)),
        Box::new(store.clone()),
    )
}

fn wait_for_result(controller: &mut GameController) -> SessionResult {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Some(result) = controller.poll_completion() {
            return result;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("session never completed");
}

fn wait_for_display(controller: &GameController, wanted: DisplaySymbol) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if controller.snapshot().display == wanted {
            return;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("display never became {wanted:?}");
}

#[test]
fn full_session_produces_exactly_one_result() {
    let store = Arc::new(Mutex::new(MemoryHighscoreStore::new()));
    let mut controller = controller_with(config(4, 2, 0), vec![vec![1, 2, 1, 4]], &store);

    controller.start_game().unwrap();
    let result = wait_for_result(&mut controller);

    assert_eq!(result.score, 0);
    assert_eq!(result.summary.unclaimed, 4);
    assert!(controller.poll_completion().is_none());
    assert_eq!(store.lock().unwrap().sessions.len(), 1);
}

#[test]
fn beaten_highscore_is_persisted_exactly_once() {
    let store = Arc::new(Mutex::new(MemoryHighscoreStore::with_highscore(-2)));
    let mut controller = controller_with(config(3, 1, 0), vec![vec![5, 5, 5]], &store);

    controller.start_game().unwrap();
    let result = wait_for_result(&mut controller);

    assert!(result.new_highscore);
    assert_eq!(result.previous_best.unwrap().score, -2);

    let guard = store.lock().unwrap();
    assert_eq!(guard.highscore_saves, 1);
    assert_eq!(guard.highscore.as_ref().unwrap().score, 0);
}

#[test]
fn claims_are_scored_while_the_session_runs() {
    let store = Arc::new(Mutex::new(MemoryHighscoreStore::new()));
    // Long stimulus parks the session on each position
    let mut controller =
        controller_with(config(4, 2, 60_000), vec![vec![8, 3, 8, 3]], &store);

    controller.start_game().unwrap();
    wait_for_display(&controller, DisplaySymbol::Active(8));

    // Position 0: empty window
    assert_eq!(controller.claim(), ClaimFeedback::Incorrect);
    assert_eq!(controller.claim(), ClaimFeedback::AlreadyClaimed);
    assert_eq!(controller.snapshot().score, -1);

    controller.cancel();
}

#[test]
fn restarting_mid_session_switches_to_the_new_sequence() {
    let store = Arc::new(Mutex::new(MemoryHighscoreStore::new()));
    let mut controller = controller_with(
        config(4, 2, 60_000),
        vec![vec![9, 9, 9, 9], vec![1, 2, 3, 4]],
        &store,
    );

    controller.start_game().unwrap();
    wait_for_display(&controller, DisplaySymbol::Active(9));
    controller.claim();
    assert_eq!(controller.snapshot().score, -1);

    controller.start_game().unwrap();
    wait_for_display(&controller, DisplaySymbol::Active(1));
    assert_eq!(controller.snapshot().score, 0);
    assert_eq!(controller.snapshot().index, 0);

    controller.cancel();
    // The abandoned sessions never reached the store
    assert!(store.lock().unwrap().sessions.is_empty());
}

#[test]
fn sequence_exhaustion_surfaces_as_unavailable() {
    let store = Arc::new(Mutex::new(MemoryHighscoreStore::new()));
    let mut controller = controller_with(config(3, 1, 0), vec![vec![5, 5, 5]], &store);

    controller.start_game().unwrap();
    let _ = wait_for_result(&mut controller);

    // The fixed source has nothing left for the second session
    match controller.start_game() {
        Err(GameError::SequenceUnavailable(_)) => {}
        other => panic!("expected SequenceUnavailable, got {other:?}"),
    }
    assert!(!controller.is_session_active());
}

#[test]
fn audio_visual_mode_is_refused() {
    let store = Arc::new(Mutex::new(MemoryHighscoreStore::new()));
    let mut controller = controller_with(config(4, 2, 0), vec![vec![1, 2, 3, 4]], &store);
    controller.set_game_type(GameType::AudioVisual);

    match controller.start_game() {
        Err(GameError::UnsupportedGameType(_)) => {}
        other => panic!("expected UnsupportedGameType, got {other:?}"),
    }

    // Switching back to a scorable channel works
    controller.set_game_type(GameType::Visual);
    controller.start_game().unwrap();
    let _ = wait_for_result(&mut controller);
}

#[test]
fn lag_wider_than_session_is_rejected() {
    let store = Arc::new(Mutex::new(MemoryHighscoreStore::new()));
    let mut controller = controller_with(config(4, 4, 0), vec![vec![1, 2, 3, 4]], &store);

    match controller.start_game() {
        Err(GameError::InvalidConfiguration(_)) => {}
        other => panic!("expected InvalidConfiguration, got {other:?}"),
    }
    assert!(!controller.is_session_active());
}
