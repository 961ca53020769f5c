//! Level progression and the asteroid speed table derived from it.

use crate::config::GameConfig;

/// Advance at most one level per call: `level + 1` once
/// `score >= level * points_per_level`, otherwise `level` unchanged.
pub fn check_level(score: u32, level: u32, points_per_level: u32) -> u32 {
    let level = level.max(1);
    if u64::from(score) >= u64::from(level) * u64::from(points_per_level) {
        level + 1
    } else {
        level
    }
}

/// Inclusive asteroid speed range for `level`.
///
/// `max = max(1, base_max * level / 2)`, then clamped to the configured cap
/// unless `ignore_speed_cap` is set.  The floor clamp is always applied:
/// `max` never drops below 1 and `min` never exceeds `max`.
pub fn asteroid_speed_range(level: u32, config: &GameConfig) -> (u32, u32) {
    let scaled = config.asteroid_speed_max.saturating_mul(level) / 2;
    let mut max = scaled.max(1);
    if !config.ignore_speed_cap {
        max = max.min(config.asteroid_speed_cap.max(1));
    }
    let min = config.asteroid_speed_min.clamp(1, max);
    (min, max)
}

/// Owns the level-up decision for a session.
#[derive(Clone, Debug)]
pub struct DifficultyController {
    points_per_level: u32,
}

impl DifficultyController {
    pub fn new(config: &GameConfig) -> Self {
        DifficultyController {
            points_per_level: config.scoring.points_per_level,
        }
    }

    /// Returns the new level if this check moved it.
    pub fn check(&self, score: u32, level: u32) -> Option<u32> {
        let next = check_level(score, level, self.points_per_level);
        (next != level).then_some(next)
    }
}
