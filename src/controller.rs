use crate::config::{GameConfig, GameType};
use crate::engine::{ClaimFeedback, Engine, GameError, Phase, Snapshot, Summary};
use crate::highscore::{Highscore, HighscoreStore, SessionRecord};
use crate::pacer::{FixedPacing, SessionPacer};
use crate::sequence::SequenceSource;
use chrono::Local;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Everything the results screen needs about a finished session.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub score: i32,
    pub summary: Summary,
    pub new_highscore: bool,
    pub previous_best: Option<Highscore>,
}

/// Owns one session at a time: acquires the sequence, starts the engine,
/// runs the pacer, and settles the score against the persisted best when
/// the session completes. Starting a new session always tears down the
/// previous one first.
pub struct GameController {
    config: GameConfig,
    engine: Arc<Mutex<Engine>>,
    pacer: Option<SessionPacer>,
    source: Box<dyn SequenceSource>,
    store: Box<dyn HighscoreStore>,
    best: Option<Highscore>,
    result_recorded: bool,
}

impl GameController {
    pub fn new(
        config: GameConfig,
        source: Box<dyn SequenceSource>,
        store: Box<dyn HighscoreStore>,
    ) -> Self {
        let best = store.highscore().unwrap_or_else(|e| {
            warn!(error = %e, "could not read persisted high score");
            None
        });

        Self {
            config,
            engine: Arc::new(Mutex::new(Engine::new())),
            pacer: None,
            source,
            store,
            best,
            result_recorded: true,
        }
    }

    fn engine(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn game_type(&self) -> GameType {
        self.config.game_type
    }

    /// Selects the stimulus channel. Pure configuration; never touches
    /// scoring or a session in flight.
    pub fn set_game_type(&mut self, game_type: GameType) {
        self.config.game_type = game_type;
    }

    pub fn best(&self) -> Option<&Highscore> {
        self.best.as_ref()
    }

    pub fn is_session_active(&self) -> bool {
        self.engine().is_running()
    }

    /// Cancels any in-flight session and starts a fresh one.
    pub fn start_game(&mut self) -> Result<(), GameError> {
        if self.config.game_type == GameType::AudioVisual {
            // Combined scoring has no defined rule; refuse rather than
            // run an unscorable session
            return Err(GameError::UnsupportedGameType(
                self.config.game_type.to_string(),
            ));
        }

        self.cancel();

        let sequence = self.source.generate(
            self.config.size,
            self.config.combinations,
            self.config.min_match_pct,
            self.config.n_back,
        )?;
        if sequence.len() != self.config.size {
            return Err(GameError::SequenceUnavailable(format!(
                "expected {} symbols, got {}",
                self.config.size,
                sequence.len()
            )));
        }
        if let Some(symbol) = sequence
            .iter()
            .find(|&&s| s == 0 || s > self.config.combinations)
        {
            return Err(GameError::SequenceUnavailable(format!(
                "symbol {} outside 1..={}",
                symbol, self.config.combinations
            )));
        }
        debug!(?sequence, "generated session sequence");

        self.engine().start(sequence, self.config.n_back)?;
        self.result_recorded = false;
        self.pacer = Some(SessionPacer::spawn(
            self.engine.clone(),
            FixedPacing::from_config(&self.config),
        ));
        Ok(())
    }

    /// Stops the in-flight session, if any, and discards it unscored.
    /// Idempotent: cancelling an absent or finished session is a no-op.
    pub fn cancel(&mut self) {
        if let Some(pacer) = self.pacer.take() {
            pacer.stop();
        }
        self.engine().reset();
        self.result_recorded = true;
    }

    /// Scores a match claim against the position currently shown.
    pub fn claim(&mut self) -> ClaimFeedback {
        self.engine().claim()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine().snapshot()
    }

    /// Returns the result exactly once after the session reaches its
    /// terminal state. Persistence happens here, outside the engine
    /// lock; a store failure is logged and never rolls back the score.
    pub fn poll_completion(&mut self) -> Option<SessionResult> {
        if self.result_recorded {
            return None;
        }

        let (snap, summary) = {
            let engine = self.engine();
            (engine.snapshot(), engine.summary())
        };
        if snap.phase != Phase::Finished {
            return None;
        }

        self.result_recorded = true;
        if let Some(pacer) = self.pacer.take() {
            pacer.stop();
        }
        info!(score = snap.score, "session finished");

        let now = Local::now();
        let record = SessionRecord {
            score: snap.score,
            game_type: self.config.game_type,
            n_back: self.config.n_back,
            sequence_len: snap.total,
            correct: summary.correct,
            incorrect: summary.incorrect,
            played_at: now,
        };
        if let Err(e) = self.store.record_session(&record) {
            warn!(error = %e, "failed to record session history");
        }

        let previous_best = self.best.clone();
        let beaten = previous_best
            .as_ref()
            .map_or(snap.score > 0, |b| snap.score > b.score);
        if beaten {
            let entry = Highscore {
                score: snap.score,
                achieved_at: now,
            };
            if let Err(e) = self.store.save_highscore(&entry) {
                warn!(error = %e, "failed to persist new high score");
            }
            self.best = Some(entry);
        }

        Some(SessionResult {
            score: snap.score,
            summary,
            new_highscore: beaten,
            previous_best,
        })
    }

    pub fn recent_sessions(&self, limit: usize) -> Vec<SessionRecord> {
        self.store.recent_sessions(limit).unwrap_or_else(|e| {
            warn!(error = %e, "could not read session history");
            Vec::new()
        })
    }
}
