// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod engine;
pub mod highscore;
pub mod matcher;
pub mod pacer;
pub mod sequence;
