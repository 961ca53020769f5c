//! One play-through, from the first frame to the leaderboard write.
//!
//! `tick` drives a single frame: steer the ship, resolve ship collisions,
//! move everything, resolve bullet hits, refill the asteroid field, roll
//! random pickups, then check the level.  Rendering and audio playback
//! happen outside; this type only exposes state and queued sound cues.

use std::time::Duration;

use rand::Rng;

use crate::collision::{self, CollisionEvent};
use crate::config::GameConfig;
use crate::difficulty::{asteroid_speed_range, DifficultyController};
use crate::entities::{
    Capability, Category, Entity, InputFrame, Player, SessionStatus, SoundCue,
};
use crate::error::StorageError;
use crate::persistence::{LeaderboardStore, RowId, SessionResult};
use crate::powerup::PowerUps;
use crate::registry::{EntityRegistry, SpawnParams};
use crate::score::ScoreEngine;
use crate::sound::DeathSequence;

/// Whether the end-of-session write has happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlushState {
    Pending,
    Recorded(RowId),
    /// Nothing to record: the session ended on zero points.
    Skipped,
    /// The store refused or failed; the message is kept for display.
    Failed(String),
}

#[derive(Debug)]
pub enum FlushOutcome {
    Recorded(RowId),
    SkippedZeroScore,
    AlreadyFlushed,
    Failed(StorageError),
}

/// What changed during one `tick`.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub collisions: Vec<CollisionEvent>,
    pub exited: Vec<Entity>,
    pub level_up: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub score: u32,
    pub level: u32,
    pub lives: u32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub accuracy: Option<f64>,
    pub flush: FlushState,
}

pub struct GameSession {
    config: GameConfig,
    player: Player,
    registry: EntityRegistry,
    score: ScoreEngine,
    difficulty: DifficultyController,
    powerups: PowerUps,
    status: SessionStatus,
    elapsed: Duration,
    frame: u64,
    cues: Vec<SoundCue>,
    death: Option<DeathSequence>,
    flush: FlushState,
}

impl GameSession {
    /// Fresh session: full lives, score 0, level 1, a star field and a first
    /// asteroid batch.
    pub fn new(config: GameConfig, rng: &mut impl Rng) -> Self {
        let player = Player::new(config.starting_lives, config.width(), config.height());
        let mut registry = EntityRegistry::new(&config);
        for _ in 0..config.star_count {
            registry.spawn(Category::Star, SpawnParams::Falling, rng);
        }
        registry.replenish_asteroids(rng);

        let window = Duration::from_secs(config.unlimited_bullets_secs);
        tracing::info!(
            lives = config.starting_lives,
            width = config.screen_width,
            height = config.screen_height,
            "session started"
        );
        GameSession {
            difficulty: DifficultyController::new(&config),
            powerups: PowerUps::new(window),
            config,
            player,
            registry,
            score: ScoreEngine::new(),
            status: SessionStatus::Playing,
            elapsed: Duration::ZERO,
            frame: 0,
            cues: Vec::new(),
            death: None,
            flush: FlushState::Pending,
        }
    }

    // ── Accessors ──

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Direct access for scripted scenes and tests.
    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    pub fn score(&self) -> &ScoreEngine {
        &self.score
    }

    pub fn powerups(&self) -> &PowerUps {
        &self.powerups
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status == SessionStatus::Over
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn flush_state(&self) -> &FlushState {
        &self.flush
    }

    /// Hand queued sound cues to the audio collaborator.
    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.cues)
    }

    // ── Input ──

    /// Apply one frame of decoded input.  Mute and fullscreen belong to the
    /// front-end and are ignored here.
    pub fn apply_input(&mut self, input: &InputFrame) {
        if input.quit {
            self.quit();
            return;
        }
        self.player.moving_left = input.move_left;
        self.player.moving_right = input.move_right;
        if input.activate_super_bullet {
            self.activate(Capability::SuperBullet);
        }
        if input.activate_unlimited_bullets {
            self.activate(Capability::UnlimitedBullets);
        }
        if input.fire {
            self.fire();
        }
    }

    /// Try to fire.  Returns false when not playing or the bullet ceiling
    /// is reached.
    pub fn fire(&mut self) -> bool {
        if self.status != SessionStatus::Playing {
            return false;
        }
        let in_flight = self.registry.bullets_in_flight();
        let Some(plan) = self
            .powerups
            .plan_shot(self.elapsed, in_flight, self.config.bullets_allowed)
        else {
            return false;
        };
        self.registry.spawn_fired(plan.category, self.player.rect);
        self.score.record_shot_fired();
        self.cues.push(SoundCue::Blaster);
        if let Some(capability) = plan.consumed {
            tracing::info!(?capability, "capability spent");
        }
        true
    }

    /// Switch a held capability on.  No-op unless it is Held.
    pub fn activate(&mut self, capability: Capability) -> bool {
        if self.status != SessionStatus::Playing {
            return false;
        }
        let activated = self.powerups.activate(capability);
        if activated {
            self.cues.push(SoundCue::SavedBrokenShip);
            tracing::info!(?capability, "capability activated");
        }
        activated
    }

    /// End the session now, skipping the death sequence.
    pub fn quit(&mut self) {
        if self.status != SessionStatus::Over {
            tracing::info!(score = self.score.points(), "session quit");
        }
        self.status = SessionStatus::Over;
        self.death = None;
    }

    // ── Frame ──

    pub fn tick(&mut self, dt: Duration, rng: &mut impl Rng) -> TickReport {
        let mut report = TickReport::default();
        if self.status == SessionStatus::Over {
            return report;
        }
        self.elapsed += dt;
        self.frame += 1;

        if self.status == SessionStatus::Dying {
            self.advance_death();
            return report;
        }

        let frames = dt.as_secs_f32() * self.config.frame_rate as f32;
        self.player
            .steer(self.config.ship_speed * frames, self.config.width());

        self.resolve_ship_collisions(&mut report, rng);
        if self.status != SessionStatus::Playing {
            return report;
        }

        report.exited = self.registry.update(frames);
        for entity in &report.exited {
            self.on_exit(entity, rng);
        }

        self.resolve_bullet_hits(&mut report);
        self.registry.replenish_asteroids(rng);
        self.roll_random_events(rng);
        report.level_up = self.check_level();
        report
    }

    fn resolve_ship_collisions(&mut self, report: &mut TickReport, rng: &mut impl Rng) {
        let asteroids = self.registry.of(Category::Asteroid);
        let hit = collision::resolve_player_asteroid(&self.player.rect, &asteroids);

        let pickups: Vec<&Entity> = self
            .registry
            .iter()
            .filter(|e| e.category.is_pickup())
            .collect();
        let powerups = &self.powerups;
        let collected =
            collision::resolve_player_pickup(&self.player.rect, &pickups, |c| powerups.is_held(c));

        if let Some(event) = hit {
            self.on_player_hit(rng);
            report.collisions.push(event);
            if self.status != SessionStatus::Playing {
                return;
            }
        }

        for event in collected {
            for id in event.consumed() {
                self.registry.remove(id);
            }
            match &event {
                CollisionEvent::Salvaged { .. } => {
                    self.score.increase(self.config.scoring.salvage_reward);
                    self.cues.push(SoundCue::SavedBrokenShip);
                }
                CollisionEvent::ExtraLife { .. } => {
                    self.player.lives += 1;
                    self.cues.push(SoundCue::SavedBrokenShip);
                    tracing::info!(lives = self.player.lives, "extra life");
                }
                CollisionEvent::CapabilityPickup {
                    capability,
                    granted,
                    ..
                } => {
                    if *granted {
                        self.powerups.collect(*capability);
                    }
                    self.cues.push(SoundCue::SavedBrokenShip);
                }
                CollisionEvent::Hit { .. } | CollisionEvent::PlayerHit { .. } => {}
            }
            report.collisions.push(event);
        }
    }

    fn on_player_hit(&mut self, rng: &mut impl Rng) {
        self.score.decrease(self.config.scoring.player_hit_penalty);
        self.player.lives = self.player.lives.saturating_sub(1);
        self.registry.clear(Category::Asteroid);
        self.player
            .recenter(self.config.width(), self.config.height());
        tracing::info!(lives = self.player.lives, score = self.score.points(), "player hit");

        if self.player.lives == 0 {
            let (death, first) = DeathSequence::start(self.elapsed);
            self.cues.push(first);
            self.death = Some(death);
            self.status = SessionStatus::Dying;
            tracing::info!(score = self.score.points(), level = self.score.level(), "player destroyed");
        } else {
            self.cues.push(SoundCue::PlayerBoom);
            self.registry.replenish_asteroids(rng);
        }
    }

    fn advance_death(&mut self) {
        let Some(death) = self.death.as_mut() else {
            self.status = SessionStatus::Over;
            return;
        };
        if let Some(cue) = death.advance(self.elapsed) {
            self.cues.push(cue);
        }
        if death.is_finished() {
            self.death = None;
            self.status = SessionStatus::Over;
            tracing::info!("game over");
        }
    }

    fn on_exit(&mut self, entity: &Entity, rng: &mut impl Rng) {
        let scoring = &self.config.scoring;
        match entity.category {
            Category::Asteroid => {
                self.score.decrease(scoring.missed_asteroid_penalty);
                self.cues.push(SoundCue::MissedAsteroid);
            }
            Category::BrokenShip => {
                self.score.decrease(scoring.missed_ship_penalty);
                self.cues.push(SoundCue::MissedAsteroid);
            }
            Category::Star => {
                self.registry.spawn(Category::Star, SpawnParams::Falling, rng);
            }
            _ => {}
        }
    }

    fn resolve_bullet_hits(&mut self, report: &mut TickReport) {
        let bullets: Vec<&Entity> = self
            .registry
            .iter()
            .filter(|e| e.category.is_bullet())
            .collect();
        let asteroids = self.registry.of(Category::Asteroid);
        let hits = collision::resolve_bullet_asteroid(
            &bullets,
            &asteroids,
            self.config.scoring.asteroid_kill,
        );

        for event in hits {
            for id in event.consumed() {
                self.registry.remove(id);
            }
            if let CollisionEvent::Hit { reward, wide, .. } = &event {
                self.score.increase(*reward);
                self.score.record_shot_hit();
                if !wide {
                    self.cues.push(SoundCue::AsteroidBoom);
                }
            }
            report.collisions.push(event);
        }
    }

    fn roll_random_events(&mut self, rng: &mut impl Rng) {
        let odds = &self.config.odds;
        let table = [
            (Category::BrokenShip, odds.broken_ship),
            (Category::ExtraLife, odds.extra_life),
            (Category::SuperBulletPickup, odds.super_bullet_pickup),
            (Category::UnlimitedBulletsPickup, odds.unlimited_bullets_pickup),
        ];
        for (category, one_in) in table {
            if one_in > 0 && rng.gen_range(1..=one_in) == 1 {
                let id = self.registry.spawn(category, SpawnParams::Falling, rng);
                tracing::debug!(?category, %id, "pickup spawned");
            }
        }
    }

    fn check_level(&mut self) -> Option<u32> {
        let level = self
            .difficulty
            .check(self.score.points(), self.score.level())?;
        self.score.set_level(level);
        self.registry
            .set_asteroid_speed(asteroid_speed_range(level, &self.config));
        self.cues.push(SoundCue::LevelUp);
        tracing::info!(level, score = self.score.points(), "level up");
        Some(level)
    }

    // ── Session end ──

    pub fn result(&self) -> SessionResult {
        SessionResult {
            score: self.score.points(),
            level: self.score.level(),
            accuracy: self.score.accuracy(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            score: self.score.points(),
            level: self.score.level(),
            lives: self.player.lives,
            shots_fired: self.score.shots_fired(),
            shots_hit: self.score.shots_hit(),
            accuracy: self.score.accuracy(),
            flush: self.flush.clone(),
        }
    }

    /// End the session and write its result, at most once.  A zero score
    /// writes nothing; a store failure is reported, not raised, and still
    /// counts as the one attempt.
    pub fn finish(&mut self, store: &mut dyn LeaderboardStore, player_name: &str) -> FlushOutcome {
        self.quit();
        if self.flush != FlushState::Pending {
            tracing::warn!(state = ?self.flush, "session already flushed");
            return FlushOutcome::AlreadyFlushed;
        }

        let result = self.result();
        if result.score == 0 {
            self.flush = FlushState::Skipped;
            return FlushOutcome::SkippedZeroScore;
        }

        let written = match store.get_or_create_player_id(player_name) {
            Ok(player_id) => store.record_session(player_id, &result),
            Err(err) => Err(err),
        };
        match written {
            Ok(row) => {
                self.flush = FlushState::Recorded(row);
                FlushOutcome::Recorded(row)
            }
            Err(err) => {
                tracing::error!(error = %err, score = result.score, "leaderboard write failed");
                self.flush = FlushState::Failed(err.to_string());
                FlushOutcome::Failed(err)
            }
        }
    }
}
