//! Session configuration, read once at start-up and never reloaded.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// 1-in-N odds, rolled once per tick, of each pickup appearing.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RandomEventOdds {
    pub broken_ship: u32,
    pub extra_life: u32,
    pub super_bullet_pickup: u32,
    pub unlimited_bullets_pickup: u32,
}

impl Default for RandomEventOdds {
    fn default() -> Self {
        RandomEventOdds {
            broken_ship: 2000,
            extra_life: 4000,
            super_bullet_pickup: 3500,
            unlimited_bullets_pickup: 3500,
        }
    }
}

/// Points gained and lost for the scored events of a session.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Scoring {
    pub asteroid_kill: u32,
    pub salvage_reward: u32,
    pub missed_asteroid_penalty: u32,
    pub missed_ship_penalty: u32,
    pub player_hit_penalty: u32,
    /// Score needed per level: level N is left once score >= N * this.
    pub points_per_level: u32,
}

impl Default for Scoring {
    fn default() -> Self {
        Scoring {
            asteroid_kill: 1,
            salvage_reward: 10,
            missed_asteroid_penalty: 1,
            missed_ship_penalty: 3,
            player_hit_penalty: 5,
            points_per_level: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    pub frame_rate: u32,
    pub starting_lives: u32,
    pub ship_speed: f32,

    pub bullets_allowed: u32,
    pub bullet_speed: f32,
    pub bullet_width: u32,
    pub bullet_height: u32,

    pub asteroid_speed_min: u32,
    pub asteroid_speed_max: u32,
    pub asteroid_speed_cap: u32,
    pub ignore_speed_cap: bool,
    pub asteroid_scale_min: f32,
    pub asteroid_scale_max: f32,

    pub unlimited_bullets_secs: u64,
    pub star_count: u32,

    pub odds: RandomEventOdds,
    pub scoring: Scoring,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            screen_width: 800,
            screen_height: 600,
            frame_rate: 60,
            starting_lives: 3,
            ship_speed: 5.0,
            bullets_allowed: 3,
            bullet_speed: 5.0,
            bullet_width: 5,
            bullet_height: 15,
            asteroid_speed_min: 1,
            asteroid_speed_max: 3,
            asteroid_speed_cap: 8,
            ignore_speed_cap: false,
            asteroid_scale_min: 0.03,
            asteroid_scale_max: 0.07,
            unlimited_bullets_secs: 10,
            star_count: 25,
            odds: RandomEventOdds::default(),
            scoring: Scoring::default(),
        }
    }
}

impl GameConfig {
    /// Parse a TOML document.  Missing keys keep their defaults.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load from `GALACTIC_SALVAGE_CONFIG` or `~/.galactic_salvage.toml`.
    /// An absent file is not an error; the defaults are used instead.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = config_path();
        if !path.is_file() {
            tracing::info!(path = %path.display(), "no config file; using defaults");
            return Ok(GameConfig::default());
        }
        tracing::info!(path = %path.display(), "loading config");
        Self::load(&path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return invalid("screen_width/screen_height", "must be non-zero");
        }
        if self.frame_rate == 0 {
            return invalid("frame_rate", "must be non-zero");
        }
        if self.bullets_allowed == 0 {
            return invalid("bullets_allowed", "must be at least 1");
        }
        if self.asteroid_speed_min > self.asteroid_speed_max {
            return invalid("asteroid_speed_min", "must not exceed asteroid_speed_max");
        }
        if self.asteroid_scale_min > self.asteroid_scale_max || self.asteroid_scale_min <= 0.0 {
            return invalid("asteroid_scale_min", "must be positive and <= asteroid_scale_max");
        }
        if self.scoring.points_per_level == 0 {
            return invalid("scoring.points_per_level", "must be non-zero");
        }
        Ok(())
    }

    pub fn width(&self) -> f32 {
        self.screen_width as f32
    }

    pub fn height(&self) -> f32 {
        self.screen_height as f32
    }
}

fn invalid(field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid { field, reason })
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
}

pub fn config_path() -> PathBuf {
    std::env::var_os("GALACTIC_SALVAGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".galactic_salvage.toml"))
}

pub fn leaderboard_path() -> PathBuf {
    std::env::var_os("GALACTIC_SALVAGE_LEADERBOARD")
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".galactic_salvage_leaderboard.db"))
}

pub fn log_path() -> PathBuf {
    std::env::var_os("GALACTIC_SALVAGE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".galactic_salvage.log"))
}
