use crate::engine::{GameError, Symbol};
use rand::Rng;
use std::collections::VecDeque;

/// Supplies the stimulus sequence for one session.
///
/// Contract: the returned sequence has exactly `length` symbols, each in
/// `[1, combinations]`, and at least `min_match_pct` percent of the
/// positions repeat the symbol seen `lag` steps earlier. The caller
/// re-validates length and range before starting a session.
pub trait SequenceSource {
    fn generate(
        &mut self,
        length: usize,
        combinations: u8,
        min_match_pct: u8,
        lag: usize,
    ) -> Result<Vec<Symbol>, GameError>;
}

/// Default source: uniform random symbols with lag-`lag` repeats forced
/// in until the requested match density is reached, so every session has
/// a scorable number of true matches.
pub struct MatchedSequenceGenerator;

impl SequenceSource for MatchedSequenceGenerator {
    fn generate(
        &mut self,
        length: usize,
        combinations: u8,
        min_match_pct: u8,
        lag: usize,
    ) -> Result<Vec<Symbol>, GameError> {
        if length == 0 {
            return Err(GameError::SequenceUnavailable(
                "requested an empty sequence".into(),
            ));
        }
        if combinations == 0 {
            return Err(GameError::SequenceUnavailable(
                "no symbols to draw from".into(),
            ));
        }

        let mut rng = rand::thread_rng();
        let mut sequence: Vec<Symbol> = (0..length)
            .map(|_| rng.gen_range(1..=combinations))
            .collect();

        // Positions before `lag` can never hold an exact-lag repeat
        if lag > 0 && lag < length {
            let wanted = (length * min_match_pct as usize).div_ceil(100)
                .min(length - lag);
            let mut attempts = 0;
            while exact_lag_matches(&sequence, lag) < wanted && attempts < length * 8 {
                let i = rng.gen_range(lag..length);
                sequence[i] = sequence[i - lag];
                attempts += 1;
            }
        }

        Ok(sequence)
    }
}

fn exact_lag_matches(sequence: &[Symbol], lag: usize) -> usize {
    (lag..sequence.len())
        .filter(|&i| sequence[i] == sequence[i - lag])
        .count()
}

/// Test source that hands out queued sequences and fails once drained.
pub struct FixedSequenceSource {
    queued: VecDeque<Vec<Symbol>>,
}

impl FixedSequenceSource {
    pub fn new<I>(sequences: I) -> Self
    where
        I: IntoIterator<Item = Vec<Symbol>>,
    {
        Self {
            queued: sequences.into_iter().collect(),
        }
    }
}

impl SequenceSource for FixedSequenceSource {
    fn generate(
        &mut self,
        _length: usize,
        _combinations: u8,
        _min_match_pct: u8,
        _lag: usize,
    ) -> Result<Vec<Symbol>, GameError> {
        self.queued
            .pop_front()
            .ok_or_else(|| GameError::SequenceUnavailable("no sequences queued".into()))
    }
}
