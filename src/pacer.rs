use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::GameConfig;
use crate::engine::{Engine, Step};

/// Stimulus cadence for one session: settle delay before the first
/// stimulus, on-screen duration, and the blank gap between stimuli.
pub trait Pacing: Send + 'static {
    fn settle(&self) -> Duration;
    fn stimulus(&self) -> Duration;
    fn gap(&self) -> Duration;
}

/// Production pacing, taken from the game configuration
#[derive(Clone, Copy, Debug)]
pub struct FixedPacing {
    pub settle: Duration,
    pub stimulus: Duration,
    pub gap: Duration,
}

impl FixedPacing {
    pub fn from_config(cfg: &GameConfig) -> Self {
        Self {
            settle: Duration::from_millis(cfg.settle_ms),
            stimulus: Duration::from_millis(cfg.event_interval_ms),
            gap: Duration::from_millis(cfg.gap_ms),
        }
    }
}

impl Pacing for FixedPacing {
    fn settle(&self) -> Duration {
        self.settle
    }

    fn stimulus(&self) -> Duration {
        self.stimulus
    }

    fn gap(&self) -> Duration {
        self.gap
    }
}

/// Zero-delay pacing for headless tests
#[derive(Clone, Copy, Debug, Default)]
pub struct InstantPacing;

impl Pacing for InstantPacing {
    fn settle(&self) -> Duration {
        Duration::ZERO
    }

    fn stimulus(&self) -> Duration {
        Duration::ZERO
    }

    fn gap(&self) -> Duration {
        Duration::ZERO
    }
}

/// The advancement timer for one running session: a background thread
/// that walks the engine through stimulus and gap phases on the
/// configured cadence. Exactly one pacer exists per session; stopping it
/// blocks until the thread has exited, so no stale advance can touch a
/// fresh session afterwards.
pub struct SessionPacer {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl SessionPacer {
    pub fn spawn<P: Pacing>(engine: Arc<Mutex<Engine>>, pacing: P) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = std::thread::spawn(move || drive(engine, pacing, stop_rx));
        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signals the timer thread and waits for it to exit. Safe to call
    /// on an already-finished session.
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// True once the timer thread has run the session to completion (or
    /// was cancelled).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SessionPacer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Interruptible sleep: false means a stop was requested and the timer
/// must exit without touching the engine again.
fn pause(stop_rx: &Receiver<()>, duration: Duration) -> bool {
    match stop_rx.recv_timeout(duration) {
        Err(RecvTimeoutError::Timeout) => true,
        Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
    }
}

fn lock_engine(engine: &Arc<Mutex<Engine>>) -> std::sync::MutexGuard<'_, Engine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

fn drive<P: Pacing>(engine: Arc<Mutex<Engine>>, pacing: P, stop_rx: Receiver<()>) {
    if !pause(&stop_rx, pacing.settle()) {
        return;
    }
    lock_engine(&engine).present();

    loop {
        if !pause(&stop_rx, pacing.stimulus()) {
            return;
        }
        lock_engine(&engine).blank();

        if !pause(&stop_rx, pacing.gap()) {
            return;
        }
        if lock_engine(&engine).step() == Step::Finished {
            return;
        }
    }
}
