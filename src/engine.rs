use crate::matcher::is_lag_match;
use itertools::Itertools;

/// Stimulus code in `[1, combinations]`, naming one grid cell or letter.
pub type Symbol = u8;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid session configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("sequence source returned an unusable sequence: {0}")]
    SequenceUnavailable(String),
    #[error("no scoring rule for {0} sessions")]
    UnsupportedGameType(String),
}

/// What the player is shown right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplaySymbol {
    /// Inter-stimulus gap (or the settle delay before the first stimulus)
    NoStimulus,
    /// A stimulus is on screen
    Active(Symbol),
    /// The session is over; emitted exactly once per session
    Ended,
}

/// Scored result for one sequence position. Write-once: a position keeps
/// its first non-`Unclaimed` outcome for the rest of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClaimOutcome {
    Unclaimed,
    Correct,
    Incorrect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Finished,
}

/// Result of one timer-driven advancement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Continue,
    Finished,
}

/// What a claim call did, for UI feedback. Duplicate and out-of-session
/// claims are no-ops, not errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimFeedback {
    Correct,
    Incorrect,
    AlreadyClaimed,
    NotRunning,
}

/// Consistent read of the whole session state, taken under the engine
/// lock so observers never see a half-applied mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub index: usize,
    pub total: usize,
    pub display: DisplaySymbol,
    pub score: i32,
    pub phase: Phase,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub correct: usize,
    pub incorrect: usize,
    pub unclaimed: usize,
}

/// One n-back session: the stimulus sequence, the cursor driven by the
/// pacer, and the per-position scoring state.
#[derive(Debug)]
pub struct Engine {
    sequence: Vec<Symbol>,
    lag: usize,
    index: usize,
    display: DisplaySymbol,
    score: i32,
    outcomes: Vec<ClaimOutcome>,
    phase: Phase,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            sequence: Vec::new(),
            lag: 0,
            index: 0,
            display: DisplaySymbol::NoStimulus,
            score: 0,
            outcomes: Vec::new(),
            phase: Phase::Idle,
        }
    }

    /// Begins a new session over `sequence`. Legal from `Idle` or
    /// `Finished` only; a running session must be cancelled and `reset`
    /// first. On error nothing is mutated.
    pub fn start(&mut self, sequence: Vec<Symbol>, lag: usize) -> Result<(), GameError> {
        if self.phase == Phase::Running {
            return Err(GameError::InvalidConfiguration(
                "a session is already running",
            ));
        }
        if sequence.is_empty() {
            return Err(GameError::InvalidConfiguration("sequence is empty"));
        }
        if lag == 0 {
            return Err(GameError::InvalidConfiguration("lag must be positive"));
        }
        if lag >= sequence.len() {
            return Err(GameError::InvalidConfiguration(
                "lag must be shorter than the sequence",
            ));
        }

        self.outcomes = vec![ClaimOutcome::Unclaimed; sequence.len()];
        self.sequence = sequence;
        self.lag = lag;
        self.index = 0;
        self.display = DisplaySymbol::NoStimulus;
        self.score = 0;
        self.phase = Phase::Running;
        Ok(())
    }

    /// Discards the session and returns to `Idle`.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Puts the current position's stimulus on screen.
    pub fn present(&mut self) {
        if self.phase == Phase::Running {
            self.display = DisplaySymbol::Active(self.sequence[self.index]);
        }
    }

    /// Clears the stimulus for the inter-stimulus gap. The position stays
    /// current, so late claims during the gap still score against it.
    pub fn blank(&mut self) {
        if self.phase == Phase::Running {
            self.display = DisplaySymbol::NoStimulus;
        }
    }

    /// Commits the advance past the current position. Either presents the
    /// next stimulus or, after the last position, finishes the session.
    /// Advance and presentation are one mutation, so a concurrent claim
    /// always sees a consistent `(index, display)` pair.
    pub fn step(&mut self) -> Step {
        if self.phase != Phase::Running {
            return Step::Finished;
        }

        self.index += 1;
        if self.index == self.sequence.len() {
            self.phase = Phase::Finished;
            self.display = DisplaySymbol::Ended;
            return Step::Finished;
        }

        self.display = DisplaySymbol::Active(self.sequence[self.index]);
        Step::Continue
    }

    /// Scores a match claim against the current position. At most one
    /// claim per position ever takes effect.
    pub fn claim(&mut self) -> ClaimFeedback {
        if self.phase != Phase::Running {
            return ClaimFeedback::NotRunning;
        }
        if self.outcomes[self.index] != ClaimOutcome::Unclaimed {
            return ClaimFeedback::AlreadyClaimed;
        }

        if is_lag_match(&self.sequence, self.index, self.lag) {
            self.outcomes[self.index] = ClaimOutcome::Correct;
            self.score += 1;
            ClaimFeedback::Correct
        } else {
            self.outcomes[self.index] = ClaimOutcome::Incorrect;
            self.score -= 1;
            ClaimFeedback::Incorrect
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            index: self.index,
            total: self.sequence.len(),
            display: self.display,
            score: self.score,
            phase: self.phase,
        }
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn display(&self) -> DisplaySymbol {
        self.display
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn outcomes(&self) -> &[ClaimOutcome] {
        &self.outcomes
    }

    pub fn sequence(&self) -> &[Symbol] {
        &self.sequence
    }

    pub fn summary(&self) -> Summary {
        let counts = self.outcomes.iter().counts();
        Summary {
            correct: counts.get(&ClaimOutcome::Correct).copied().unwrap_or(0),
            incorrect: counts.get(&ClaimOutcome::Incorrect).copied().unwrap_or(0),
            unclaimed: counts.get(&ClaimOutcome::Unclaimed).copied().unwrap_or(0),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
