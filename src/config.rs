use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;

use crate::constants::*;

pub const ENV_ASSET_DIR: &str = "SPACE_DODGE_ASSETS";
pub const ENV_LOG_FILE: &str = "SPACE_DODGE_LOG";
pub const ENV_LOG_LEVEL: &str = "SPACE_DODGE_LOG_LEVEL";

/// Everything the screens and the simulation need to know about their
/// surroundings. Built once at startup and only ever borrowed.
#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub title: String,
    pub screen_width: f64,
    pub screen_height: f64,
    pub fps: u32,
    pub asset_dir: PathBuf,
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
    pub music_volume: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            title: GAME_TITLE.to_string(),
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            fps: FRAMES_PER_SECOND,
            asset_dir: PathBuf::from("./assets"),
            log_file: PathBuf::from("space-dodge.log"),
            log_level: LevelFilter::Info,
            music_volume: MUSIC_VOLUME,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Applies overrides found through `lookup` on top of the defaults.
    /// Blank or unparsable values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = GameConfig::default();
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(dir) = value(ENV_ASSET_DIR) {
            config.asset_dir = PathBuf::from(dir);
        }
        if let Some(file) = value(ENV_LOG_FILE) {
            config.log_file = PathBuf::from(file);
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            if let Ok(level) = LevelFilter::from_str(&level) {
                config.log_level = level;
            }
        }
        config
    }

    /// Logical size of one terminal cell on the reference grid.
    pub fn cell_size(&self) -> (f64, f64) {
        (
            self.screen_width / REFERENCE_COLUMNS as f64,
            self.screen_height / REFERENCE_ROWS as f64,
        )
    }

    pub fn frame_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }

    pub fn sprite_path(&self, file_name: &str) -> PathBuf {
        self.asset_dir.join("sprites").join(file_name)
    }

    pub fn font_path(&self) -> PathBuf {
        self.asset_dir.join("fonts").join("banner.txt")
    }

    pub fn sound_path(&self, file_name: &str) -> PathBuf {
        self.asset_dir.join("audio").join(file_name)
    }
}
