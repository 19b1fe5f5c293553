pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod engine;
pub mod highscore;
pub mod matcher;
pub mod pacer;
pub mod sequence;
pub mod ui;

use crate::app_dirs::AppDirs;
use crate::config::{ConfigStore, FileConfigStore, GameConfig, GameType};
use crate::controller::{GameController, SessionResult};
use crate::engine::ClaimFeedback;
use crate::highscore::{HighscoreStore, MemoryHighscoreStore, SessionRecord, SqliteHighscoreStore};
use crate::sequence::MatchedSequenceGenerator;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::mpsc,
    thread,
    time::Duration,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const TICK_RATE_MS: u64 = 100;

/// sleek n-back memory training tui
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A sleek n-back trainer: flag when the current grid position or letter repeats the one shown n steps earlier. Timed stimulus pacing, per-session scoring, and a persisted best."
)]
pub struct Cli {
    /// number of stimuli per session
    #[clap(short = 's', long)]
    size: Option<usize>,

    /// how many steps back a repeat must be to count as a match
    #[clap(short = 'n', long)]
    n_back: Option<usize>,

    /// number of distinct grid cells / letters
    #[clap(short = 'c', long)]
    combinations: Option<u8>,

    /// milliseconds each stimulus stays on screen
    #[clap(short = 'i', long)]
    interval_ms: Option<u64>,

    /// milliseconds of blank gap between stimuli
    #[clap(long)]
    gap_ms: Option<u64>,

    /// stimulus channel to present
    #[clap(short = 't', long, value_enum)]
    game_type: Option<GameType>,
}

impl Cli {
    /// Overlays the flags that were actually given on the stored config
    fn apply(&self, cfg: &mut GameConfig) {
        if let Some(size) = self.size {
            cfg.size = size;
        }
        if let Some(n_back) = self.n_back {
            cfg.n_back = n_back;
        }
        if let Some(combinations) = self.combinations {
            cfg.combinations = combinations;
        }
        if let Some(interval_ms) = self.interval_ms {
            cfg.event_interval_ms = interval_ms;
        }
        if let Some(gap_ms) = self.gap_ms {
            cfg.gap_ms = gap_ms;
        }
        if let Some(game_type) = self.game_type {
            cfg.game_type = game_type;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Home,
    Playing,
    Results,
}

pub struct App {
    pub controller: GameController,
    pub state: AppState,
    pub last_feedback: Option<ClaimFeedback>,
    pub last_result: Option<SessionResult>,
    pub recent: Vec<SessionRecord>,
    pub notice: Option<String>,
}

impl App {
    pub fn new(controller: GameController) -> Self {
        Self {
            controller,
            state: AppState::Home,
            last_feedback: None,
            last_result: None,
            recent: Vec::new(),
            notice: None,
        }
    }

    fn start_session(&mut self) {
        self.notice = None;
        self.last_feedback = None;
        self.last_result = None;
        match self.controller.start_game() {
            Ok(()) => self.state = AppState::Playing,
            Err(e) => {
                self.notice = Some(e.to_string());
                self.state = AppState::Home;
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    cli.apply(&mut config);

    let store: Box<dyn HighscoreStore> = match SqliteHighscoreStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(error = %e, "score store unavailable, this session will not persist");
            Box::new(MemoryHighscoreStore::new())
        }
    };
    let controller = GameController::new(config, Box::new(MatchedSequenceGenerator), store);
    let mut app = App::new(controller);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app, &config_store);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    res
}

/// Logs go to a file in the state dir; writing to the terminal would
/// fight the TUI for the screen.
fn init_tracing() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    else {
        return;
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::sync::Arc::new(file)).with_ansi(false))
        .with(EnvFilter::from_default_env())
        .init();
}

#[derive(Clone)]
enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

fn get_app_events() -> mpsc::Receiver<AppEvent> {
    let (tx, rx) = mpsc::channel();

    let tick_tx = tx.clone();
    thread::spawn(move || loop {
        if tick_tx.send(AppEvent::Tick).is_err() {
            break;
        }

        thread::sleep(Duration::from_millis(TICK_RATE_MS))
    });

    thread::spawn(move || loop {
        let evt = match event::read() {
            Ok(Event::Key(key)) => Some(AppEvent::Key(key)),
            Ok(Event::Resize(_, _)) => Some(AppEvent::Resize),
            Ok(_) => None,
            Err(_) => break,
        };

        if let Some(evt) = evt {
            if tx.send(evt).is_err() {
                break;
            }
        }
    });

    rx
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    config_store: &FileConfigStore,
) -> Result<(), Box<dyn Error>> {
    let events = get_app_events();

    terminal.draw(|f| ui(app, f))?;

    loop {
        match events.recv()? {
            AppEvent::Tick => {
                if app.state == AppState::Playing {
                    if let Some(result) = app.controller.poll_completion() {
                        app.recent = app.controller.recent_sessions(5);
                        app.last_result = Some(result);
                        app.last_feedback = None;
                        app.state = AppState::Results;
                    }
                    terminal.draw(|f| ui(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::Key(key) => {
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    break;
                }

                match app.state {
                    AppState::Home => match key.code {
                        KeyCode::Char('s') | KeyCode::Enter => app.start_session(),
                        KeyCode::Char('t') => {
                            let next = match app.controller.game_type() {
                                GameType::Visual => GameType::Audio,
                                GameType::Audio => GameType::AudioVisual,
                                GameType::AudioVisual => GameType::Visual,
                            };
                            app.controller.set_game_type(next);
                            if let Err(e) = config_store.save(app.controller.config()) {
                                tracing::warn!(error = %e, "could not save config");
                            }
                        }
                        KeyCode::Esc | KeyCode::Char('q') => break,
                        _ => {}
                    },
                    AppState::Playing => match key.code {
                        KeyCode::Char(' ') | KeyCode::Char('m') => {
                            app.last_feedback = Some(app.controller.claim());
                        }
                        KeyCode::Esc => {
                            app.controller.cancel();
                            app.last_feedback = None;
                            app.state = AppState::Home;
                        }
                        _ => {}
                    },
                    AppState::Results => match key.code {
                        KeyCode::Char('r') | KeyCode::Enter => app.start_session(),
                        KeyCode::Char('h') | KeyCode::Backspace => app.state = AppState::Home,
                        KeyCode::Esc | KeyCode::Char('q') => break,
                        _ => {}
                    },
                }
                terminal.draw(|f| ui(app, f))?;
            }
        }
    }

    app.controller.cancel();
    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}
