use crate::app_dirs::AppDirs;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which stimulus channel the UI presents. Configuration only: the
/// engine scores the same way regardless of channel.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
pub enum GameType {
    Visual,
    Audio,
    AudioVisual,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    /// Number of stimuli per session
    pub size: usize,
    /// Distinct symbol codes (grid cells / letters)
    pub combinations: u8,
    /// Match distance: flag when the stimulus repeats the one n steps back
    pub n_back: usize,
    /// How long each stimulus stays on screen
    pub event_interval_ms: u64,
    /// Blank gap between stimuli
    pub gap_ms: u64,
    /// Delay before the first stimulus, so the screen can settle
    pub settle_ms: u64,
    /// Minimum percentage of positions that are guaranteed lag-n repeats
    pub min_match_pct: u8,
    pub game_type: GameType,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            size: 10,
            combinations: 9,
            n_back: 2,
            event_interval_ms: 2500,
            gap_ms: 500,
            settle_ms: 600,
            min_match_pct: 30,
            game_type: GameType::Visual,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> GameConfig;
    fn save(&self, cfg: &GameConfig) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("nbak_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> GameConfig {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<GameConfig>(&bytes) {
                return cfg;
            }
        }
        GameConfig::default()
    }

    fn save(&self, cfg: &GameConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
