//! Score, level and shooting accuracy for one session.

/// Points only ever change through `increase` / `decrease`; the level is
/// written back by the difficulty check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreEngine {
    points: u32,
    level: u32,
    shots_fired: u32,
    shots_hit: u32,
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreEngine {
    pub fn new() -> Self {
        ScoreEngine {
            points: 0,
            level: 1,
            shots_fired: 0,
            shots_hit: 0,
        }
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    pub fn shots_hit(&self) -> u32 {
        self.shots_hit
    }

    pub fn increase(&mut self, amount: u32) {
        self.points = self.points.saturating_add(amount);
    }

    /// Subtract, clamping at zero.  The excess is dropped, not carried.
    pub fn decrease(&mut self, amount: u32) {
        self.points = self.points.saturating_sub(amount);
    }

    pub fn record_shot_fired(&mut self) {
        self.shots_fired += 1;
    }

    pub fn record_shot_hit(&mut self) {
        self.shots_hit += 1;
    }

    pub(crate) fn set_level(&mut self, level: u32) {
        self.level = level.max(1);
    }

    /// Hit percentage rounded to two decimals; `None` before the first shot.
    pub fn accuracy(&self) -> Option<f64> {
        if self.shots_fired == 0 {
            return None;
        }
        let pct = f64::from(self.shots_hit) / f64::from(self.shots_fired) * 100.0;
        Some((pct * 100.0).round() / 100.0)
    }
}

/// Reward for one super-bullet pass: half the asteroids that were on the
/// field before the collision, for the whole group.
pub fn super_bullet_reward(asteroids_before_collision: usize) -> u32 {
    u32::try_from(asteroids_before_collision / 2).unwrap_or(u32::MAX)
}
