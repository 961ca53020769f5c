//! Pairwise AABB collision detection.
//!
//! Every function here reads borrowed entity slices and returns events; the
//! caller applies removals afterwards, so no collection is modified while
//! it is being scanned.

use std::collections::BTreeSet;

use crate::entities::{Capability, Category, Entity, EntityId, Rect};
use crate::score::super_bullet_reward;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollisionEvent {
    /// A bullet destroyed one or more asteroids.  `reward` is the score for
    /// the whole group.
    Hit {
        bullet: EntityId,
        asteroids: Vec<EntityId>,
        reward: u32,
        wide: bool,
    },
    /// The ship ran into an asteroid.
    PlayerHit { asteroid: EntityId },
    /// A broken ship was picked up.
    Salvaged { pickup: EntityId },
    ExtraLife { pickup: EntityId },
    /// A power-up pickup was touched.  `granted` is false when the
    /// capability was already held; the pickup is consumed either way.
    CapabilityPickup {
        pickup: EntityId,
        capability: Capability,
        granted: bool,
    },
}

impl CollisionEvent {
    /// Entities this event consumes.
    pub fn consumed(&self) -> Vec<EntityId> {
        match self {
            CollisionEvent::Hit {
                bullet, asteroids, ..
            } => std::iter::once(*bullet).chain(asteroids.iter().copied()).collect(),
            CollisionEvent::PlayerHit { asteroid } => vec![*asteroid],
            CollisionEvent::Salvaged { pickup }
            | CollisionEvent::ExtraLife { pickup }
            | CollisionEvent::CapabilityPickup { pickup, .. } => vec![*pickup],
        }
    }
}

/// Bullets against asteroids.
///
/// A bullet destroys every asteroid it overlaps, not only the nearest.  An
/// asteroid can only be destroyed once; the first bullet (in slice order)
/// to reach it takes it.  Standard bullets score `kill_reward` per asteroid;
/// a wide bullet scores `floor(asteroids_before / 2)` for the whole group,
/// where `asteroids_before` is the asteroid count before this pass.
pub fn resolve_bullet_asteroid(
    bullets: &[&Entity],
    asteroids: &[&Entity],
    kill_reward: u32,
) -> Vec<CollisionEvent> {
    let asteroids_before = asteroids.len();
    let mut destroyed: BTreeSet<EntityId> = BTreeSet::new();
    let mut events = Vec::new();

    for bullet in bullets.iter().filter(|b| b.category.is_bullet()) {
        let hit: Vec<EntityId> = asteroids
            .iter()
            .filter(|a| a.category == Category::Asteroid)
            .filter(|a| !destroyed.contains(&a.id))
            .filter(|a| bullet.rect.intersects(&a.rect))
            .map(|a| a.id)
            .collect();
        if hit.is_empty() {
            continue;
        }
        destroyed.extend(hit.iter().copied());

        let wide = bullet.category == Category::SuperBullet;
        let reward = if wide {
            super_bullet_reward(asteroids_before)
        } else {
            kill_reward.saturating_mul(hit.len() as u32)
        };
        events.push(CollisionEvent::Hit {
            bullet: bullet.id,
            asteroids: hit,
            reward,
            wide,
        });
    }
    events
}

/// The ship against asteroids.  One hit per tick is enough: the caller
/// clears the whole field in response.
pub fn resolve_player_asteroid(player: &Rect, asteroids: &[&Entity]) -> Option<CollisionEvent> {
    asteroids
        .iter()
        .find(|a| a.category == Category::Asteroid && player.intersects(&a.rect))
        .map(|a| CollisionEvent::PlayerHit { asteroid: a.id })
}

/// The ship against pickups.  `held` reports whether a capability is
/// already Held/Active, which turns a second pickup into a no-op collection.
pub fn resolve_player_pickup(
    player: &Rect,
    pickups: &[&Entity],
    held: impl Fn(Capability) -> bool,
) -> Vec<CollisionEvent> {
    let mut granted_now: Vec<Capability> = Vec::new();
    let mut events = Vec::new();

    for pickup in pickups.iter().filter(|p| player.intersects(&p.rect)) {
        let event = match pickup.category {
            Category::BrokenShip => CollisionEvent::Salvaged { pickup: pickup.id },
            Category::ExtraLife => CollisionEvent::ExtraLife { pickup: pickup.id },
            other => match other.grants() {
                Some(capability) => {
                    let granted = !held(capability) && !granted_now.contains(&capability);
                    if granted {
                        granted_now.push(capability);
                    }
                    CollisionEvent::CapabilityPickup {
                        pickup: pickup.id,
                        capability,
                        granted,
                    }
                }
                None => continue,
            },
        };
        events.push(event);
    }
    events
}
