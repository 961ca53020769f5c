//! Entity arena: spawn, per-tick movement and despawn.
//!
//! Entities live in a `BTreeMap` keyed by `EntityId`, so iteration order is
//! the spawn order and therefore reproducible under a seeded RNG.  Nothing
//! is removed while the map is being walked; `update` first collects the
//! ids that left the playfield and removes them afterwards.

use std::collections::BTreeMap;

use rand::Rng;

use crate::config::GameConfig;
use crate::entities::{Category, Entity, EntityId, Payload, Rect, Velocity};

/// Nominal edge length of the asteroid artwork; the configured scale range
/// is applied to this to get the footprint.
pub const ASTEROID_SPRITE_SIZE: f32 = 700.0;

/// Footprint of every pickup.
pub const PICKUP_SIZE: f32 = 32.0;

/// Star footprint (radius 1).
pub const STAR_SIZE: f32 = 2.0;

/// Asteroids added per replenish batch.
pub const ASTEROID_BATCH: std::ops::RangeInclusive<usize> = 1..=5;

const PICKUP_SPEED: std::ops::RangeInclusive<u32> = 1..=8;
const STAR_SPEED: std::ops::RangeInclusive<u32> = 1..=3;

/// Where a new entity appears.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpawnParams {
    /// Random column, one screen-height above the top edge.
    Falling,
    /// Centred on the top edge of `origin` (the player's ship).
    FiredFrom(Rect),
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct EntityRegistry {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
    width: f32,
    height: f32,
    asteroid_speed: (u32, u32),
    asteroid_scale: (f32, f32),
    bullet_size: (f32, f32),
    bullet_speed: f32,
}

impl EntityRegistry {
    pub fn new(config: &GameConfig) -> Self {
        EntityRegistry {
            entities: BTreeMap::new(),
            next_id: 1,
            width: config.width(),
            height: config.height(),
            asteroid_speed: crate::difficulty::asteroid_speed_range(1, config),
            asteroid_scale: (config.asteroid_scale_min, config.asteroid_scale_max),
            bullet_size: (config.bullet_width as f32, config.bullet_height as f32),
            bullet_speed: config.bullet_speed,
        }
    }

    // ── Queries ──

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn of(&self, category: Category) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|e| e.category == category)
            .collect()
    }

    pub fn count(&self, category: Category) -> usize {
        self.entities
            .values()
            .filter(|e| e.category == category)
            .count()
    }

    /// Standard and super bullets currently in flight.
    pub fn bullets_in_flight(&self) -> usize {
        self.entities
            .values()
            .filter(|e| e.category.is_bullet())
            .count()
    }

    pub fn asteroid_speed(&self) -> (u32, u32) {
        self.asteroid_speed
    }

    /// Used by the difficulty check; affects asteroids spawned from now on.
    pub fn set_asteroid_speed(&mut self, range: (u32, u32)) {
        let (min, max) = range;
        let max = max.max(1);
        self.asteroid_speed = (min.clamp(1, max), max);
    }

    // ── Spawning ──

    pub fn spawn(
        &mut self,
        category: Category,
        params: SpawnParams,
        rng: &mut impl Rng,
    ) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;

        let (rect, velocity, payload) = match category {
            Category::Asteroid => {
                let scale = if self.asteroid_scale.0 < self.asteroid_scale.1 {
                    rng.gen_range(self.asteroid_scale.0..=self.asteroid_scale.1)
                } else {
                    self.asteroid_scale.0
                };
                let size = (ASTEROID_SPRITE_SIZE * scale).max(1.0);
                let (min, max) = self.asteroid_speed;
                let speed = rng.gen_range(min..=max);
                let velocity = Velocity {
                    dy: speed as f32,
                    rotation: rng.gen_range(-1.0..=1.0),
                };
                let payload = Payload::Asteroid { angle: 0.0 };
                (self.place(params, size, size, rng), velocity, payload)
            }
            Category::Bullet | Category::SuperBullet => {
                let (w, h) = self.bullet_footprint(category);
                let velocity = Velocity::falling(-self.bullet_speed);
                let wide = category == Category::SuperBullet;
                (self.place(params, w, h, rng), velocity, Payload::Bullet { wide })
            }
            Category::BrokenShip
            | Category::ExtraLife
            | Category::SuperBulletPickup
            | Category::UnlimitedBulletsPickup => {
                let velocity = Velocity::falling(rng.gen_range(PICKUP_SPEED) as f32);
                let payload = Payload::Pickup {
                    caption: caption_for(category),
                };
                (
                    self.place(params, PICKUP_SIZE, PICKUP_SIZE, rng),
                    velocity,
                    payload,
                )
            }
            Category::Star => {
                let velocity = Velocity::falling(rng.gen_range(STAR_SPEED) as f32);
                let mut rect = self.place(params, STAR_SIZE, STAR_SIZE, rng);
                if params == SpawnParams::Falling {
                    rect.y = rng.gen_range(-self.height..0.0);
                }
                (rect, velocity, Payload::Star)
            }
        };

        self.entities.insert(
            id,
            Entity {
                id,
                category,
                rect,
                velocity,
                payload,
            },
        );
        id
    }

    /// Spawn a bullet from the top edge of `origin`.  Bullets are positioned
    /// from the ship, so no randomness is involved.
    pub fn spawn_fired(&mut self, category: Category, origin: Rect) -> EntityId {
        let (w, h) = self.bullet_footprint(category);
        let rect = fired_from(origin, w, h);
        self.insert_at(category, rect, Velocity::falling(-self.bullet_speed))
    }

    /// Super bullets span the playfield.
    fn bullet_footprint(&self, category: Category) -> (f32, f32) {
        let (w, h) = self.bullet_size;
        if category == Category::SuperBullet {
            (w * self.width, h)
        } else {
            (w, h)
        }
    }

    fn place(&self, params: SpawnParams, w: f32, h: f32, rng: &mut impl Rng) -> Rect {
        match params {
            SpawnParams::Falling => {
                let max_x = (self.width - w).max(0.0);
                let x = if max_x > 0.0 { rng.gen_range(0.0..=max_x) } else { 0.0 };
                Rect::new(x, -self.height - h, w, h)
            }
            SpawnParams::FiredFrom(origin) => fired_from(origin, w, h),
        }
    }

    /// Spawn a batch of 1–5 asteroids if none are left.  Returns how many
    /// were added.
    pub fn replenish_asteroids(&mut self, rng: &mut impl Rng) -> usize {
        if self.count(Category::Asteroid) > 0 {
            return 0;
        }
        let batch = rng.gen_range(ASTEROID_BATCH);
        for _ in 0..batch {
            self.spawn(Category::Asteroid, SpawnParams::Falling, rng);
        }
        tracing::debug!(batch, speed = ?self.asteroid_speed, "asteroid field replenished");
        batch
    }

    // ── Movement & removal ──

    /// Move everything by `frames` nominal frames of velocity and despawn
    /// whatever left the playfield.  The despawned entities are returned.
    pub fn update(&mut self, frames: f32) -> Vec<Entity> {
        let height = self.height;
        let mut exited = Vec::new();
        for entity in self.entities.values_mut() {
            entity.rect.y += entity.velocity.dy * frames;
            if let Payload::Asteroid { angle } = &mut entity.payload {
                *angle = (*angle + entity.velocity.rotation * frames) % 360.0;
            }
            if has_exited(entity, height) {
                exited.push(entity.id);
            }
        }
        exited.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Remove by id.  Removing an id that is already gone is a no-op.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Despawn every entity of `category`, returning how many went.
    pub fn clear(&mut self, category: Category) -> usize {
        let before = self.entities.len();
        self.entities.retain(|_, e| e.category != category);
        before - self.entities.len()
    }

    /// Place an entity verbatim.  Intended for tests and scripted scenes.
    pub fn insert_at(
        &mut self,
        category: Category,
        rect: Rect,
        velocity: Velocity,
    ) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        let payload = match category {
            Category::Asteroid => Payload::Asteroid { angle: 0.0 },
            Category::Bullet => Payload::Bullet { wide: false },
            Category::SuperBullet => Payload::Bullet { wide: true },
            Category::Star => Payload::Star,
            _ => Payload::Pickup {
                caption: caption_for(category),
            },
        };
        self.entities.insert(
            id,
            Entity {
                id,
                category,
                rect,
                velocity,
                payload,
            },
        );
        id
    }
}

fn fired_from(origin: Rect, w: f32, h: f32) -> Rect {
    Rect::new(origin.center_x() - w / 2.0, origin.y, w, h)
}

fn has_exited(entity: &Entity, height: f32) -> bool {
    if entity.category.is_bullet() {
        entity.rect.bottom() <= 0.0
    } else if entity.category == Category::Star {
        entity.rect.y >= height
    } else {
        entity.rect.bottom() >= height
    }
}

fn caption_for(category: Category) -> Option<&'static str> {
    match category {
        Category::BrokenShip => Some("Repair needed! Catch me!"),
        Category::SuperBulletPickup => Some("SUPER BULLET!"),
        Category::UnlimitedBulletsPickup => Some("UNLIMITED BULLETS!"),
        _ => None,
    }
}
