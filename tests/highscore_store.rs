use chrono::Local;
use nbak::config::GameType;
use nbak::highscore::{Highscore, HighscoreStore, SessionRecord, SqliteHighscoreStore};

fn record(score: i32, game_type: GameType) -> SessionRecord {
    SessionRecord {
        score,
        game_type,
        n_back: 2,
        sequence_len: 10,
        correct: score.max(0) as usize,
        incorrect: 0,
        played_at: Local::now(),
    }
}

#[test]
fn highscore_survives_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.db");

    {
        let mut store = SqliteHighscoreStore::open(&path).unwrap();
        store
            .save_highscore(&Highscore {
                score: 6,
                achieved_at: Local::now(),
            })
            .unwrap();
    }

    let store = SqliteHighscoreStore::open(&path).unwrap();
    assert_eq!(store.highscore().unwrap().unwrap().score, 6);
}

#[test]
fn session_history_accumulates_across_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.db");

    {
        let mut store = SqliteHighscoreStore::open(&path).unwrap();
        store.record_session(&record(2, GameType::Visual)).unwrap();
        store.record_session(&record(4, GameType::Audio)).unwrap();
    }

    let mut store = SqliteHighscoreStore::open(&path).unwrap();
    store.record_session(&record(-1, GameType::Visual)).unwrap();

    let recent = store.recent_sessions(10).unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].score, -1);
    assert_eq!(recent[1].score, 4);
    assert_eq!(recent[1].game_type, GameType::Audio);
    assert_eq!(recent[2].score, 2);
}

#[test]
fn recent_sessions_respects_the_limit() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SqliteHighscoreStore::open(dir.path().join("scores.db")).unwrap();

    for score in 0..8 {
        store.record_session(&record(score, GameType::Visual)).unwrap();
    }

    let recent = store.recent_sessions(3).unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].score, 7);
}

#[test]
fn negative_scores_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SqliteHighscoreStore::open(dir.path().join("scores.db")).unwrap();

    store
        .save_highscore(&Highscore {
            score: -4,
            achieved_at: Local::now(),
        })
        .unwrap();
    store.record_session(&record(-4, GameType::Visual)).unwrap();

    assert_eq!(store.highscore().unwrap().unwrap().score, -4);
    assert_eq!(store.recent_sessions(1).unwrap()[0].score, -4);
}
